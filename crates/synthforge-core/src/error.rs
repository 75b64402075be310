use thiserror::Error;

/// Compiler error shared across synthforge crates.
///
/// Every variant is fatal to the current compile run.
#[derive(Debug, Error)]
pub enum CompileError {
    /// A required attribute or element is missing, empty or not well formed.
    #[error("malformed specification: {0}")]
    MalformedSpecification(String),
    /// A single-valued argument key matched more than one element.
    #[error("duplicate argument '{key}' in {container}")]
    DuplicateArgument { container: String, key: String },
    /// No candidate node kind matches a type string.
    #[error(
        "unsupported type '{type_string}' for {context}; expected one of: {}",
        expected.join(", ")
    )]
    UnsupportedType {
        type_string: String,
        context: String,
        expected: Vec<String>,
    },
    /// A record, field, reference, function or enum set name was not found.
    #[error("unresolved {kind} reference '{path}' in {container}: '{segment}' not found")]
    UnresolvedReference {
        kind: String,
        path: String,
        segment: String,
        container: String,
    },
    /// A field-setter reference points at a field that cannot provide one.
    #[error("setter target error for field '{field}' in {container}: {reason}")]
    SetterTarget {
        container: String,
        field: String,
        reason: String,
    },
    /// Filesystem failure while reading input or writing artifacts.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// The compile options are unusable.
    #[error("config error: {0}")]
    Config(String),
}

impl CompileError {
    pub fn malformed(message: impl Into<String>) -> Self {
        CompileError::MalformedSpecification(message.into())
    }

    pub fn unresolved(
        kind: impl Into<String>,
        path: impl Into<String>,
        segment: impl Into<String>,
        container: impl Into<String>,
    ) -> Self {
        CompileError::UnresolvedReference {
            kind: kind.into(),
            path: path.into(),
            segment: segment.into(),
            container: container.into(),
        }
    }
}

/// Convenience alias for results returned by synthforge crates.
pub type Result<T> = std::result::Result<T, CompileError>;
