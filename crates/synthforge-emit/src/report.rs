use serde::{Deserialize, Serialize};

/// Outcome of one emission run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmitReport {
    /// Base files written, relative to the output base path.
    pub base_written: Vec<String>,
    pub leaf_created: Vec<String>,
    /// Leaf files left untouched because they already existed.
    pub leaf_skipped: Vec<String>,
    pub skipped_sequences: Vec<SkippedSequence>,
    pub warnings: Vec<EmitWarning>,
}

impl EmitReport {
    pub fn warn(&mut self, code: &str, message: impl Into<String>, sequence: Option<&str>) {
        self.warnings.push(EmitWarning {
            code: code.to_string(),
            message: message.into(),
            sequence: sequence.map(str::to_string),
        });
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedSequence {
    pub key: String,
    pub kind: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmitWarning {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence: Option<String>,
}
