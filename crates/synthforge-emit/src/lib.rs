//! C++ code emission for resolved prototype specifications.
//!
//! The [`Emitter`] walks a `Specification<Resolved>` and writes base
//! artifacts (always regenerated) and leaf artifacts (created once, never
//! overwritten) through an [`ArtifactSink`].

pub mod artifacts;
pub mod chain;
pub mod emitter;
pub mod layout;
pub mod naming;
pub mod pipeline;
pub mod report;
pub mod sink;
pub mod source;
pub mod transform;

pub use chain::{ChainNames, ComponentName};
pub use emitter::Emitter;
pub use layout::{Artifact, ArtifactKind, OUTPUT_DIRECTORIES};
pub use pipeline::{compile, compile_document, compile_with_sink};
pub use report::{EmitReport, EmitWarning, SkippedSequence};
pub use sink::{ArtifactSink, DiskSink, MemorySink};
pub use transform::{RenderEnv, render_literal};

/// Namespace of the generated runtime library.
pub const RUNTIME_NAMESPACE: &str = "Runtime";
