//! Record meta: enum value tables of `Enum` fields.

use synthforge_core::{CompileError, Result};

use super::{BASE_BANNER, Rendered, SequenceContext, forwarding_leaf};
use crate::layout::ArtifactKind;
use crate::naming::lower_camel;
use crate::source::SourceWriter;
use crate::transform::quoted;

pub fn render(ctx: &SequenceContext<'_>) -> Result<Rendered> {
    let artifact = ctx.artifact(ArtifactKind::RecordMeta);
    let base_class = artifact.base_class();
    let include = artifact.base_include();
    let mut header = ctx.header(&include, BASE_BANNER);
    header.runtime_includes.insert("config/EnumSet.h".to_string());

    let mut tables = Vec::new();
    for field in ctx.fields() {
        if !field.field_type.is_enum() {
            continue;
        }
        let enum_set = field.enum_set.as_deref().ok_or_else(|| {
            CompileError::malformed(format!(
                "enum field '{}' of record '{}' has no enum set",
                field.name, ctx.sequence.key
            ))
        })?;
        tables.push((lower_camel(&field.name), enum_set));
    }

    let mut out = SourceWriter::new();
    header.open(&mut out);
    out.line(format!("class {base_class}"));
    out.open("{");
    out.dedent().line("public:").indent();
    out.blank();
    if tables.is_empty() {
        out.line(format!("{base_class}(const EnumSetPool&)"));
    } else {
        out.line(format!("{base_class}(const EnumSetPool& enumSets) :"));
        out.indent();
        let last = tables.len() - 1;
        for (index, (name, enum_set)) in tables.iter().enumerate() {
            let separator = if index == last { "" } else { "," };
            out.line(format!(
                "{name}(enumSets.get({}).values()){separator}",
                quoted(enum_set)
            ));
        }
        out.dedent();
    }
    out.open("{");
    out.close("}");
    if !tables.is_empty() {
        out.blank();
        for (name, _) in &tables {
            out.line(format!("const vector<String>& {name};"));
        }
    }
    out.close("};");
    out.blank();
    header.close(&mut out);

    let leaf = forwarding_leaf(
        &artifact,
        ctx.namespace,
        &base_class,
        &[("const EnumSetPool&", "enumSets")],
        |_| {},
    );
    Ok(Rendered {
        artifact,
        base: out.finish(),
        leaf,
    })
}
