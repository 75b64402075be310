//! Core contracts shared by the synthforge compiler crates.
//!
//! This crate defines the error taxonomy, the literal and field type grammar,
//! the type-string and reference-path grammar, and the compile options object.

pub mod error;
pub mod grammar;
pub mod options;
pub mod types;

pub use error::{CompileError, Result};
pub use grammar::{FieldPath, LiteralForm, ReferencePath, TypeString};
pub use options::CompileOptions;
pub use types::{FieldType, LiteralType};

/// Name of the implicit identifier field carried by every record type.
pub const GEN_ID_FIELD: &str = "gen_id";
