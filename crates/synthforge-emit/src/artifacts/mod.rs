//! Renderers for every artifact kind.
//!
//! Each renderer returns the base and leaf text of one [`Artifact`]; the
//! emitter decides which of them reach the sink.

pub mod config;
pub mod generator;
pub mod meta;
pub mod output_format;
pub mod record;
pub mod setter_chain;
pub mod subsystem;
pub mod util;

use std::collections::BTreeSet;

use synthforge_ast::{Field, RecordSequence, Reference, Resolved, SequenceId, Specification};

use crate::layout::{Artifact, ArtifactKind};
use crate::naming::upper_camel;
use crate::source::{HeaderFile, SourceWriter};

pub const BASE_BANNER: &str = "Generated by synthforge; regenerated on every compile, do not edit.";
pub const LEAF_BANNER: &str = "Generated once by synthforge; edit freely.";

/// Base and leaf text of one artifact.
#[derive(Debug, Clone)]
pub struct Rendered {
    pub artifact: Artifact,
    pub base: String,
    pub leaf: String,
}

/// Everything a per-sequence renderer needs.
pub struct SequenceContext<'a> {
    pub spec: &'a Specification<Resolved>,
    pub sequence: &'a RecordSequence,
    pub namespace: &'a str,
    /// Record class, e.g. `LineItem`.
    pub record: String,
}

impl<'a> SequenceContext<'a> {
    pub fn new(
        spec: &'a Specification<Resolved>,
        sequence: &'a RecordSequence,
        namespace: &'a str,
    ) -> Self {
        Self {
            spec,
            sequence,
            namespace,
            record: upper_camel(&sequence.key),
        }
    }

    pub fn artifact(&self, kind: ArtifactKind) -> Artifact {
        Artifact::record(kind, &self.sequence.key)
    }

    /// Fields in order-key order, `gen_id` first.
    pub fn fields(&self) -> Vec<&'a Field> {
        let mut fields: Vec<&Field> = self
            .sequence
            .record_type
            .fields
            .iter()
            .map(|id| self.spec.field(*id))
            .collect();
        fields.sort_by_key(|field| field.order);
        fields
    }

    pub fn references(&self) -> Vec<&'a Reference<Resolved>> {
        let mut references: Vec<&Reference<Resolved>> = self
            .sequence
            .record_type
            .references
            .iter()
            .map(|id| self.spec.reference(*id))
            .collect();
        references.sort_by_key(|reference| reference.order);
        references
    }

    pub fn record_class(&self, id: SequenceId) -> String {
        upper_camel(&self.spec.sequence(id).key)
    }

    /// Header preamble for a file of this sequence.
    pub fn header<'h>(&'h self, include: &'h str, banner: &'h str) -> HeaderFile<'h> {
        HeaderFile {
            include,
            banner,
            runtime_includes: BTreeSet::new(),
            local_includes: BTreeSet::new(),
            namespace: self.namespace,
        }
    }
}

/// Leaf class deriving from the base with only forwarding constructors.
pub(crate) fn forwarding_leaf(
    artifact: &Artifact,
    namespace: &str,
    parent: &str,
    constructor_params: &[(&str, &str)],
    body: impl FnOnce(&mut SourceWriter),
) -> String {
    let include = artifact.leaf_include();
    let mut header = HeaderFile {
        include: &include,
        banner: LEAF_BANNER,
        runtime_includes: BTreeSet::new(),
        local_includes: BTreeSet::new(),
        namespace,
    };
    header.local_includes.insert(artifact.base_include());

    let class = &artifact.class_name;
    let params = constructor_params
        .iter()
        .map(|(ty, name)| format!("{ty} {name}"))
        .collect::<Vec<_>>()
        .join(", ");
    let forwarded = constructor_params
        .iter()
        .map(|(_, name)| *name)
        .collect::<Vec<_>>()
        .join(", ");

    let mut out = SourceWriter::new();
    header.open(&mut out);
    out.line(format!("class {class} : public {parent}"));
    out.open("{");
    out.dedent().line("public:").indent();
    out.blank();
    out.line(format!("{class}({params}) :"));
    out.indent().line(format!("{parent}({forwarded})")).dedent();
    out.open("{");
    out.close("}");
    out.blank();
    out.line(format!("virtual ~{class}()"));
    out.open("{");
    out.close("}");
    body(&mut out);
    out.close("};");
    out.blank();
    header.close(&mut out);
    out.finish()
}

/// Leaf that only pulls in its base header.
pub(crate) fn include_only_leaf(artifact: &Artifact, namespace: &str) -> String {
    let include = artifact.leaf_include();
    let mut header = HeaderFile {
        include: &include,
        banner: LEAF_BANNER,
        runtime_includes: BTreeSet::new(),
        local_includes: BTreeSet::new(),
        namespace,
    };
    header.local_includes.insert(artifact.base_include());
    let mut out = SourceWriter::new();
    header.open(&mut out);
    header.close(&mut out);
    out.finish()
}
