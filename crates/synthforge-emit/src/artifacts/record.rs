//! Record declaration: field and reference accessors.

use std::collections::BTreeSet;

use synthforge_core::Result;

use super::{BASE_BANNER, Rendered, SequenceContext, forwarding_leaf, output_format};
use crate::layout::ArtifactKind;
use crate::naming::{accessor, lower_camel, member};
use crate::source::SourceWriter;

pub fn render(ctx: &SequenceContext<'_>) -> Result<Rendered> {
    let artifact = ctx.artifact(ArtifactKind::Record);
    let base_class = artifact.base_class();
    let meta_class = ctx.artifact(ArtifactKind::RecordMeta).class_name;
    let include = artifact.base_include();
    let mut header = ctx.header(&include, BASE_BANNER);
    header.runtime_includes.insert("record/Record.h".to_string());
    header.runtime_includes.insert("io/OutputCollector.h".to_string());
    header
        .local_includes
        .insert(ctx.artifact(ArtifactKind::RecordMeta).leaf_include());

    let forward: BTreeSet<String> = ctx
        .references()
        .iter()
        .map(|reference| ctx.record_class(reference.target))
        .collect();

    let mut out = SourceWriter::new();
    header.open(&mut out);
    if !forward.is_empty() {
        for class in &forward {
            out.line(format!("class {class};"));
        }
        out.blank();
    }
    out.line(format!("class {base_class} : public Record"));
    out.open("{");
    out.dedent().line("public:").indent();
    out.blank();
    out.line(format!("{base_class}(const {meta_class}& meta) :"));
    out.indent().line("_meta(meta)").dedent();
    out.open("{");
    out.close("}");
    out.blank();
    out.line(format!("virtual ~{base_class}()"));
    out.open("{");
    out.close("}");

    let mut members = Vec::new();
    for field in ctx.fields() {
        if field.implicit {
            continue;
        }
        let cpp = field.field_type.cpp_type();
        let name = accessor(field);
        out.blank();
        let index = if field.derived {
            out.line(format!("virtual {cpp} {name}() const = 0;"));
            format!("{name}()")
        } else {
            let slot = member(&field.name);
            accessor_pair(&mut out, &cpp, &name, &slot);
            members.push((cpp, slot.clone()));
            slot
        };
        if field.field_type.is_enum() {
            out.blank();
            out.line(format!("const String& {name}EnumValue() const"));
            out.open("{");
            out.line(format!("return _meta.{name}[{index}];"));
            out.close("}");
        }
    }
    for reference in ctx.references() {
        let cpp = format!("AutoPtr<{}>", ctx.record_class(reference.target));
        let slot = member(&reference.name);
        out.blank();
        accessor_pair(&mut out, &cpp, &lower_camel(&reference.name), &slot);
        members.push((cpp, slot));
    }

    out.blank();
    output_format::render_writer(ctx, &mut out)?;

    out.blank();
    out.dedent().line("protected:").indent();
    out.blank();
    out.line(format!("const {meta_class}& _meta;"));
    for (cpp, slot) in &members {
        out.line(format!("{cpp} {slot};"));
    }
    out.close("};");
    out.blank();
    header.close(&mut out);

    let derived: Vec<(String, String)> = ctx
        .fields()
        .into_iter()
        .filter(|field| field.derived)
        .map(|field| (field.field_type.cpp_type(), accessor(field)))
        .collect();
    let meta_param = format!("const {meta_class}&");
    let leaf = forwarding_leaf(
        &artifact,
        ctx.namespace,
        &base_class,
        &[(meta_param.as_str(), "meta")],
        |out| {
            for (cpp, name) in &derived {
                out.blank();
                out.line(format!("virtual {cpp} {name}() const"));
                out.open("{");
                out.line(format!("return nullValue<{cpp}>();"));
                out.close("}");
            }
        },
    );
    Ok(Rendered {
        artifact,
        base: out.finish(),
        leaf,
    })
}

fn accessor_pair(out: &mut SourceWriter, cpp: &str, name: &str, slot: &str) {
    out.line(format!("void {name}(const {cpp}& v)"));
    out.open("{");
    out.line(format!("{slot} = v;"));
    out.close("}");
    out.blank();
    out.line(format!("const {cpp}& {name}() const"));
    out.open("{");
    out.line(format!("return {slot};"));
    out.close("}");
}
