//! Whole-tree reference resolution.
//!
//! Turns the `Specification<Raw>` produced by the reader into a
//! `Specification<Resolved>` by running an ordered list of total passes.

pub mod collect;
pub mod paths;
pub mod resolver;

pub use collect::{ArgSlot, Collected, Pending, collect_unresolved};
pub use paths::{resolve_field_path, resolve_reference_path};
pub use resolver::{ResolveSummary, Resolver, resolve};
