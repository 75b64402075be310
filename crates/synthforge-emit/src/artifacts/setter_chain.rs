//! Setter chain: typed member components and ordered setter application.

use std::collections::BTreeMap;

use synthforge_ast::{Argument, ComponentKind};
use synthforge_core::{CompileError, Result};

use super::{BASE_BANNER, Rendered, SequenceContext, forwarding_leaf};
use crate::chain::{ChainNames, ChainTypes};
use crate::layout::{Artifact, ArtifactKind};
use crate::source::SourceWriter;
use crate::transform::{DirectiveContext, RenderEnv, callback_name, quoted, value_type};

pub fn render(ctx: &SequenceContext<'_>, names: &ChainNames) -> Result<Rendered> {
    let artifact = ctx.artifact(ArtifactKind::SetterChain);
    let base_class = artifact.base_class();
    let record = ctx.record.as_str();
    let include = artifact.base_include();
    let mut header = ctx.header(&include, BASE_BANNER);
    header
        .runtime_includes
        .insert("runtime/setter/SetterChain.h".to_string());
    header.local_includes.insert(Artifact::config().leaf_include());
    header
        .local_includes
        .insert(ctx.artifact(ArtifactKind::RecordUtil).leaf_include());

    let types = ChainTypes {
        spec: ctx.spec,
        names,
        record,
        chain_base: &base_class,
    };
    let directives = DirectiveContext {
        spec: ctx.spec,
        env: RenderEnv { config: "config" },
        names: Some(names),
        chain_base: Some(&base_class),
    };

    let mut members = Vec::new();
    let mut callbacks: BTreeMap<String, String> = BTreeMap::new();
    for id in names.post_order() {
        let component = ctx.spec.component(*id);
        header
            .runtime_includes
            .insert(component.kind.spec().include.to_string());
        if let Some(reference) = component
            .arguments
            .get("reference")
            .and_then(Argument::as_reference_ref)
        {
            let target = &ctx.spec.sequence(ctx.spec.reference(reference.reference).target).key;
            for kind in [ArtifactKind::RecordUtil, ArtifactKind::Generator] {
                header
                    .local_includes
                    .insert(Artifact::record(kind, target).leaf_include());
            }
        }
        if component.kind == ComponentKind::CallbackValueProvider {
            let name = callback_name(component, "name")?;
            let cpp = value_type(component, "value_type")?;
            match callbacks.get(&name) {
                Some(existing) if *existing != cpp => {
                    return Err(CompileError::malformed(format!(
                        "callback '{name}' of record '{}' is declared as both {existing} and {cpp}",
                        ctx.sequence.key
                    )));
                }
                Some(_) => {}
                None => {
                    callbacks.insert(name, cpp);
                }
            }
        }
        let args = directives.constructor_args(component)?;
        members.push((
            types.type_expression(component)?,
            names.alias(*id)?,
            names.variable(*id)?,
            args,
        ));
    }

    let mut setters: Vec<_> = ctx
        .sequence
        .setter_chain
        .setters
        .iter()
        .map(|id| ctx.spec.component(*id))
        .collect();
    setters.sort_by_key(|setter| setter.order);

    let mut out = SourceWriter::new();
    header.open(&mut out);
    out.line(format!("class {base_class} : public SetterChain<{record}>"));
    out.open("{");
    out.dedent().line("public:").indent();
    out.blank();
    for (type_expression, alias, _, _) in &members {
        out.line(format!("typedef {type_expression} {alias};"));
    }
    if !members.is_empty() {
        out.blank();
    }

    out.line(format!("{base_class}(GeneratorConfig& config) :"));
    out.indent();
    out.line(format!(
        "_sequenceCardinality(config.cardinality({})){}",
        quoted(&ctx.sequence.key),
        if members.is_empty() { "" } else { "," }
    ));
    let last = members.len().saturating_sub(1);
    for (index, (_, _, variable, args)) in members.iter().enumerate() {
        let separator = if index == last { "" } else { "," };
        out.line(format!("{variable}({}){separator}", args.join(", ")));
    }
    out.dedent();
    out.open("{");
    out.close("}");
    out.blank();
    out.line(format!("virtual ~{base_class}()"));
    out.open("{");
    out.close("}");

    for (name, cpp) in &callbacks {
        out.blank();
        out.line(format!(
            "virtual {cpp} {name}(const AutoPtr<{record}>& cxt) const = 0;"
        ));
    }

    out.blank();
    out.line(format!("virtual void operator()(AutoPtr<{record}> recordPtr)"));
    out.open("{");
    for setter in &setters {
        out.line(format!("{}(recordPtr);", names.variable(setter.id)?));
    }
    out.close("}");

    out.blank();
    out.line(format!(
        "virtual Interval<I64u> filter(const AutoPtr<{record}>& predicate)"
    ));
    out.open("{");
    out.line("Interval<I64u> result(0, _sequenceCardinality);");
    for setter in setters
        .iter()
        .filter(|setter| setter.kind == ComponentKind::FieldSetter)
    {
        out.line(format!(
            "{}.filterRange(predicate, result);",
            names.variable(setter.id)?
        ));
    }
    out.line("return result;");
    out.close("}");

    out.blank();
    out.dedent().line("protected:").indent();
    out.blank();
    out.line("const I64u _sequenceCardinality;");
    for (_, alias, variable, _) in &members {
        out.line(format!("{alias} {variable};"));
    }
    out.close("};");
    out.blank();
    header.close(&mut out);

    let leaf = forwarding_leaf(
        &artifact,
        ctx.namespace,
        &base_class,
        &[("GeneratorConfig&", "config")],
        |out| {
            for (name, cpp) in &callbacks {
                out.blank();
                out.line(format!(
                    "virtual {cpp} {name}(const AutoPtr<{record}>& cxt) const"
                ));
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
