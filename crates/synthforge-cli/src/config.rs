//! Options file and flag merging.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use synthforge_core::CompileOptions;

use crate::CliError;

/// Contents of a `--config` TOML file; every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OptionsFile {
    pub specification_path: Option<PathBuf>,
    pub target_namespace: Option<String>,
    pub output_base_path: Option<PathBuf>,
}

impl OptionsFile {
    /// Relative paths in the file are taken relative to the file itself.
    pub fn load(path: &Path) -> Result<Self, CliError> {
        let content = std::fs::read_to_string(path)?;
        let mut file: OptionsFile = toml::from_str(&content)?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        file.specification_path = file.specification_path.map(|p| base.join(p));
        file.output_base_path = file.output_base_path.map(|p| base.join(p));
        Ok(file)
    }
}

/// Values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct FlagOptions {
    pub spec: Option<PathBuf>,
    pub namespace: Option<String>,
    pub out: Option<PathBuf>,
}

/// Flags win over file values; every option must come from one of them.
pub fn merge(file: OptionsFile, flags: FlagOptions) -> Result<CompileOptions, CliError> {
    let specification_path = flags
        .spec
        .or(file.specification_path)
        .ok_or_else(|| missing("--spec", "specification_path"))?;
    let target_namespace = flags
        .namespace
        .or(file.target_namespace)
        .ok_or_else(|| missing("--namespace", "target_namespace"))?;
    let output_base_path = flags
        .out
        .or(file.output_base_path)
        .ok_or_else(|| missing("--out", "output_base_path"))?;
    Ok(CompileOptions {
        specification_path,
        target_namespace,
        output_base_path,
    })
}

fn missing(flag: &str, key: &str) -> CliError {
    CliError::Config(format!("{flag} is required (or set '{key}' in the options file)"))
}
