//! Generator subsystem: registers one generator per record sequence.

use std::collections::BTreeSet;

use synthforge_ast::{RecordSequence, SequenceKind};

use super::{BASE_BANNER, Rendered, forwarding_leaf};
use crate::layout::{Artifact, ArtifactKind};
use crate::source::{HeaderFile, SourceWriter};
use crate::transform::quoted;

/// Only `Random` sequences get a generator.
pub fn render<'a>(
    sequences: impl IntoIterator<Item = &'a RecordSequence>,
    namespace: &str,
) -> Rendered {
    let artifact = Artifact::subsystem();
    let base_class = artifact.base_class();
    let include = artifact.base_include();
    let mut header = HeaderFile {
        include: &include,
        banner: BASE_BANNER,
        runtime_includes: BTreeSet::from(["generator/AbstractGeneratorSubsystem.h".to_string()]),
        local_includes: BTreeSet::from([Artifact::config().leaf_include()]),
        namespace,
    };

    let mut registrations = Vec::new();
    for sequence in sequences {
        if sequence.kind != SequenceKind::Random {
            continue;
        }
        let generator = Artifact::record(ArtifactKind::Generator, &sequence.key);
        header.local_includes.insert(generator.leaf_include());
        registrations.push(format!(
            "registerGenerator<{namespace}::{}>({});",
            generator.class_name,
            quoted(&sequence.key)
        ));
    }

    let mut out = SourceWriter::new();
    header.open(&mut out);
    out.line(format!(
        "class {base_class} : public AbstractGeneratorSubsystem<GeneratorConfig>"
    ));
    out.open("{");
    out.dedent().line("public:").indent();
    out.blank();
    out.line(format!("{base_class}(GeneratorConfig& config) :"));
    out.indent()
        .line("AbstractGeneratorSubsystem<GeneratorConfig>(config)")
        .dedent();
    out.open("{");
    out.close("}");
    out.blank();
    out.line(format!("virtual ~{base_class}()"));
    out.open("{");
    out.close("}");
    out.blank();
    out.dedent().line("protected:").indent();
    out.blank();
    out.line("virtual void registerGenerators()");
    out.open("{");
    for registration in &registrations {
        out.line(registration);
    }
    out.close("}");
    out.close("};");
    out.blank();
    header.close(&mut out);

    let leaf = forwarding_leaf(
        &artifact,
        namespace,
        &base_class,
        &[("GeneratorConfig&", "config")],
        |_| {},
    );
    Rendered {
        artifact,
        base: out.finish(),
        leaf,
    }
}
