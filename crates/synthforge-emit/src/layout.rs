//! Fixed output layout.

use std::path::PathBuf;

use crate::naming::upper_camel;

/// Directories created under the output base path, parents first.
pub const OUTPUT_DIRECTORIES: [&str; 9] = [
    "config",
    "config/base",
    "generator",
    "generator/base",
    "io",
    "record",
    "record/base",
    "runtime/setter",
    "runtime/setter/base",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    Config,
    RecordMeta,
    Record,
    RecordUtil,
    SetterChain,
    Generator,
    Subsystem,
}

impl ArtifactKind {
    fn leaf_dir(self) -> &'static str {
        match self {
            ArtifactKind::Config => "config",
            ArtifactKind::RecordMeta | ArtifactKind::Record | ArtifactKind::RecordUtil => "record",
            ArtifactKind::SetterChain => "runtime/setter",
            ArtifactKind::Generator | ArtifactKind::Subsystem => "generator",
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            ArtifactKind::RecordMeta => "Meta",
            ArtifactKind::RecordUtil => "Util",
            ArtifactKind::SetterChain => "SetterChain",
            ArtifactKind::Generator => "Generator",
            ArtifactKind::Config | ArtifactKind::Record | ArtifactKind::Subsystem => "",
        }
    }
}

/// Base and leaf file of one artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub kind: ArtifactKind,
    /// Leaf class name, e.g. `OrderSetterChain`.
    pub class_name: String,
}

impl Artifact {
    /// Artifact of a record type keyed `record_key`.
    pub fn record(kind: ArtifactKind, record_key: &str) -> Self {
        Self {
            kind,
            class_name: format!("{}{}", upper_camel(record_key), kind.suffix()),
        }
    }

    pub fn config() -> Self {
        Self {
            kind: ArtifactKind::Config,
            class_name: "GeneratorConfig".to_string(),
        }
    }

    pub fn subsystem() -> Self {
        Self {
            kind: ArtifactKind::Subsystem,
            class_name: "GeneratorSubsystem".to_string(),
        }
    }

    pub fn base_class(&self) -> String {
        format!("Base{}", self.class_name)
    }

    pub fn base_path(&self) -> PathBuf {
        PathBuf::from(self.kind.leaf_dir())
            .join("base")
            .join(format!("{}.h", self.base_class()))
    }

    pub fn leaf_path(&self) -> PathBuf {
        PathBuf::from(self.kind.leaf_dir()).join(format!("{}.h", self.class_name))
    }

    /// Include path of the base header, relative to the output base path.
    pub fn base_include(&self) -> String {
        to_include(self.base_path())
    }

    pub fn leaf_include(&self) -> String {
        to_include(self.leaf_path())
    }
}

fn to_include(path: PathBuf) -> String {
    path.components()
        .map(|component| component.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_artifacts_follow_the_naming_scheme() {
        let chain = Artifact::record(ArtifactKind::SetterChain, "line_item");
        assert_eq!(chain.class_name, "LineItemSetterChain");
        assert_eq!(
            chain.base_include(),
            "runtime/setter/base/BaseLineItemSetterChain.h"
        );
        assert_eq!(chain.leaf_include(), "runtime/setter/LineItemSetterChain.h");

        let record = Artifact::record(ArtifactKind::Record, "order");
        assert_eq!(record.base_include(), "record/base/BaseOrder.h");
        assert_eq!(
            Artifact::record(ArtifactKind::RecordMeta, "order").leaf_include(),
            "record/OrderMeta.h"
        );
        assert_eq!(
            Artifact::config().base_include(),
            "config/base/BaseGeneratorConfig.h"
        );
        assert_eq!(
            Artifact::subsystem().leaf_include(),
            "generator/GeneratorSubsystem.h"
        );
    }
}
