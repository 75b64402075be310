//! Record traits: field enumeration and per-field getter/setter descriptors.

use synthforge_core::Result;

use super::{BASE_BANNER, Rendered, SequenceContext, include_only_leaf};
use crate::RUNTIME_NAMESPACE;
use crate::layout::ArtifactKind;
use crate::naming::{accessor, constant_name, lower_camel};
use crate::source::{SourceWriter, close_namespace, open_namespace};

pub fn render(ctx: &SequenceContext<'_>) -> Result<Rendered> {
    let artifact = ctx.artifact(ArtifactKind::RecordUtil);
    let include = artifact.base_include();
    let mut header = ctx.header(&include, BASE_BANNER);
    header.runtime_includes.insert("record/RecordTraits.h".to_string());
    header
        .local_includes
        .insert(ctx.artifact(ArtifactKind::Record).leaf_include());

    let ns = ctx.namespace;
    let record = format!("{ns}::{}", ctx.record);
    let generator = ctx.artifact(ArtifactKind::Generator).class_name;
    let chain = ctx.artifact(ArtifactKind::SetterChain).class_name;

    let mut out = SourceWriter::new();
    header.open(&mut out);
    out.line(format!("class {generator};"));
    out.line(format!("class {chain};"));
    out.blank();
    close_namespace(&mut out, ns);
    open_namespace(&mut out, RUNTIME_NAMESPACE);

    out.line("template<>");
    out.line(format!("struct RecordTraits<{record}>"));
    out.open("{");
    out.line(format!("typedef {ns}::{generator} GeneratorType;"));
    out.line(format!("typedef {ns}::{chain} SetterChainType;"));
    out.blank();
    out.line("enum Field");
    out.open("{");
    out.line("UNKNOWN,");
    for field in ctx.fields() {
        out.line(format!("{},", constant_name(&field.name)));
    }
    for reference in ctx.references() {
        out.line(format!("{},", constant_name(&reference.name)));
    }
    out.close("};");
    out.close("};");

    for field in ctx.fields() {
        let cpp = field.field_type.cpp_type();
        let name = accessor(field);
        out.blank();
        descriptor_head(&mut out, &record, &constant_name(&field.name), &cpp);
        if !field.derived {
            setter_fn(&mut out, &record, &cpp, &name);
        }
        out.blank();
        if field.derived {
            out.line(format!(
                "static inline {cpp} get(const AutoPtr<{record}>& record)"
            ));
        } else {
            out.line(format!(
                "static inline const {cpp}& get(const AutoPtr<{record}>& record)"
            ));
        }
        out.open("{");
        out.line(format!("return record->{name}();"));
        out.close("}");
        out.close("};");
    }
    for reference in ctx.references() {
        let cpp = format!("AutoPtr<{ns}::{}>", ctx.record_class(reference.target));
        let name = lower_camel(&reference.name);
        out.blank();
        descriptor_head(&mut out, &record, &constant_name(&reference.name), &cpp);
        setter_fn(&mut out, &record, &cpp, &name);
        out.blank();
        out.line(format!(
            "static inline const {cpp}& get(const AutoPtr<{record}>& record)"
        ));
        out.open("{");
        out.line(format!("return record->{name}();"));
        out.close("}");
        out.close("};");
    }
    out.blank();
    close_namespace(&mut out, RUNTIME_NAMESPACE);
    open_namespace(&mut out, ns);
    header.close(&mut out);

    let leaf = include_only_leaf(&artifact, ns);
    Ok(Rendered {
        artifact,
        base: out.finish(),
        leaf,
    })
}

fn descriptor_head(out: &mut SourceWriter, record: &str, constant: &str, cpp: &str) {
    out.line("template<>");
    out.line(format!(
        "struct RecordFieldTraits<{record}, RecordTraits<{record}>::{constant}>"
    ));
    out.open("{");
    out.line(format!("typedef {cpp} FieldType;"));
}

fn setter_fn(out: &mut SourceWriter, record: &str, cpp: &str, name: &str) {
    out.blank();
    out.line(format!(
        "static inline void set(AutoPtr<{record}>& record, const {cpp}& value)"
    ));
    out.open("{");
    out.line(format!("record->{name}(value);"));
    out.close("}");
}
