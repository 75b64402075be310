//! Read → resolve → emit.

use synthforge_ast::{parse_specification, read_specification};
use synthforge_core::{CompileOptions, Result};
use synthforge_resolve::resolve;
use tracing::info;

use crate::emitter::Emitter;
use crate::report::EmitReport;
use crate::sink::{ArtifactSink, DiskSink};

/// Compile the document at `options.specification_path` into
/// `options.output_base_path`.
pub fn compile(options: &CompileOptions) -> Result<EmitReport> {
    let mut sink = DiskSink::new(&options.output_base_path);
    compile_with_sink(options, &mut sink)
}

/// Like [`compile`], writing through `sink` instead of the output base path.
pub fn compile_with_sink<S: ArtifactSink + ?Sized>(
    options: &CompileOptions,
    sink: &mut S,
) -> Result<EmitReport> {
    options.validate()?;
    info!(
        event = "compile_started",
        spec = %options.specification_path.display(),
        namespace = %options.target_namespace,
        out = %options.output_base_path.display()
    );
    let raw = read_specification(&options.specification_path)?;
    let spec = resolve(raw)?;
    Emitter::new(&spec, &options.target_namespace, sink).run()
}

/// Compile an in-memory document; `namespace` is used as given.
pub fn compile_document<S: ArtifactSink + ?Sized>(
    text: &str,
    namespace: &str,
    sink: &mut S,
) -> Result<EmitReport> {
    let raw = parse_specification(text)?;
    let spec = resolve(raw)?;
    Emitter::new(&spec, namespace, sink).run()
}
