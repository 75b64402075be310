use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{CompileError, Result};

static NAMESPACE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_]\w*(::[A-Za-z_]\w*)*$").expect("NAMESPACE_RE: invalid regex pattern")
});

/// Options for one compile invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileOptions {
    /// Path of the XML prototype specification.
    pub specification_path: PathBuf,
    /// C++ namespace wrapping every generated declaration.
    pub target_namespace: String,
    /// Root directory of the generated source tree.
    pub output_base_path: PathBuf,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            specification_path: PathBuf::from("prototype.xml"),
            target_namespace: "Generated".to_string(),
            output_base_path: PathBuf::from("src/cpp"),
        }
    }
}

impl CompileOptions {
    /// Reject options the emitter cannot honor.
    pub fn validate(&self) -> Result<()> {
        if !NAMESPACE_RE.is_match(&self.target_namespace) {
            return Err(CompileError::Config(format!(
                "target namespace '{}' is not a valid C++ namespace",
                self.target_namespace
            )));
        }
        if self.output_base_path.as_os_str().is_empty() {
            return Err(CompileError::Config(
                "output base path must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_round_trip_through_toml() {
        let text = r#"
            specification_path = "specs/tpch.xml"
            target_namespace = "TPCH"
            output_base_path = "out/cpp"
        "#;
        let options: CompileOptions = toml::from_str(text).unwrap();
        assert_eq!(options.target_namespace, "TPCH");
        assert!(options.validate().is_ok());
    }

    #[test]
    fn rejects_invalid_namespaces() {
        let options = CompileOptions {
            target_namespace: "9lives".to_string(),
            ..CompileOptions::default()
        };
        assert!(matches!(options.validate(), Err(CompileError::Config(_))));

        let nested = CompileOptions {
            target_namespace: "Acme::Gen".to_string(),
            ..CompileOptions::default()
        };
        assert!(nested.validate().is_ok());
    }
}
