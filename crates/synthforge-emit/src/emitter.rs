use std::path::Path;

use synthforge_ast::{RecordSequence, Resolved, SequenceKind, Specification};
use synthforge_core::Result;
use tracing::{debug, info, warn};

use crate::artifacts::{
    Rendered, SequenceContext, config, generator, meta, record, setter_chain, subsystem, util,
};
use crate::chain::ChainNames;
use crate::layout::OUTPUT_DIRECTORIES;
use crate::report::{EmitReport, SkippedSequence};
use crate::sink::ArtifactSink;

/// Writes the artifacts of a resolved specification.
///
/// Base files are replaced on every run; a leaf file is written only when
/// the sink does not already hold it.
pub struct Emitter<'a, S: ArtifactSink + ?Sized> {
    spec: &'a Specification<Resolved>,
    namespace: &'a str,
    sink: &'a mut S,
    report: EmitReport,
}

impl<'a, S: ArtifactSink + ?Sized> Emitter<'a, S> {
    pub fn new(spec: &'a Specification<Resolved>, namespace: &'a str, sink: &'a mut S) -> Self {
        Self {
            spec,
            namespace,
            sink,
            report: EmitReport::default(),
        }
    }

    pub fn run(mut self) -> Result<EmitReport> {
        for dir in OUTPUT_DIRECTORIES {
            self.sink.ensure_dir(Path::new(dir))?;
        }

        let spec = self.spec;
        self.write(config::render(spec, self.namespace)?)?;
        for sequence in &spec.sequences {
            match &sequence.kind {
                SequenceKind::Random => self.emit_sequence(sequence)?,
                SequenceKind::Unsupported(tag) => {
                    warn!(
                        event = "sequence_skipped",
                        sequence = %sequence.key,
                        kind = %tag,
                        "unsupported record sequence kind"
                    );
                    self.report.skipped_sequences.push(SkippedSequence {
                        key: sequence.key.clone(),
                        kind: tag.clone(),
                        reason: format!("record sequence kind '{tag}' is not supported"),
                    });
                }
            }
        }
        self.write(subsystem::render(&spec.sequences, self.namespace))?;

        info!(
            event = "emission_finished",
            base_written = self.report.base_written.len(),
            leaf_created = self.report.leaf_created.len(),
            leaf_skipped = self.report.leaf_skipped.len(),
            sequences_skipped = self.report.skipped_sequences.len()
        );
        Ok(self.report)
    }

    fn emit_sequence(&mut self, sequence: &RecordSequence) -> Result<()> {
        let ctx = SequenceContext::new(self.spec, sequence, self.namespace);
        self.check_setters(&ctx);

        let names = ChainNames::assign(self.spec, sequence);
        let rendered = [
            meta::render(&ctx)?,
            record::render(&ctx)?,
            util::render(&ctx)?,
            setter_chain::render(&ctx, &names)?,
            generator::render(&ctx)?,
        ];
        for artifact in rendered {
            self.write(artifact)?;
        }
        debug!(event = "sequence_emitted", sequence = %sequence.key);
        Ok(())
    }

    /// Fields without a setter keep their default-constructed value.
    fn check_setters(&mut self, ctx: &SequenceContext<'_>) {
        for field in ctx.fields() {
            if field.implicit || field.derived || field.setter.is_some() {
                continue;
            }
            warn!(
                event = "field_without_setter",
                sequence = %ctx.sequence.key,
                field = %field.name
            );
            self.report.warn(
                "field_without_setter",
                format!(
                    "field '{}' has no setter and keeps its default value",
                    field.name
                ),
                Some(&ctx.sequence.key),
            );
        }
    }

    fn write(&mut self, rendered: Rendered) -> Result<()> {
        let artifact = rendered.artifact;
        self.sink.write(&artifact.base_path(), &rendered.base)?;
        debug!(event = "base_written", path = %artifact.base_include());
        self.report.base_written.push(artifact.base_include());

        let leaf_path = artifact.leaf_path();
        if self.sink.exists(&leaf_path) {
            debug!(event = "leaf_kept", path = %artifact.leaf_include());
            self.report.leaf_skipped.push(artifact.leaf_include());
        } else {
            self.sink.write(&leaf_path, &rendered.leaf)?;
            debug!(event = "leaf_created", path = %artifact.leaf_include());
            self.report.leaf_created.push(artifact.leaf_include());
        }
        Ok(())
    }
}
