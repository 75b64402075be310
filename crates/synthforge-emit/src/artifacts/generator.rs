//! Record generator: setter chain, cardinality estimator and iterator task.

use synthforge_core::{CompileError, Result};

use super::{BASE_BANNER, Rendered, SequenceContext, forwarding_leaf};
use crate::layout::{Artifact, ArtifactKind};
use crate::source::SourceWriter;
use crate::transform::{DirectiveContext, RenderEnv};

pub fn render(ctx: &SequenceContext<'_>) -> Result<Rendered> {
    let artifact = ctx.artifact(ArtifactKind::Generator);
    let base_class = artifact.base_class();
    let record = ctx.record.as_str();
    let estimator = ctx
        .sequence
        .cardinality_estimator
        .map(|id| ctx.spec.component(id))
        .ok_or_else(|| {
            CompileError::malformed(format!(
                "sequence '{}' has no cardinality estimator",
                ctx.sequence.key
            ))
        })?;
    let iterator = ctx.sequence.sequence_iterator.map(|id| ctx.spec.component(id));

    let include = artifact.base_include();
    let mut header = ctx.header(&include, BASE_BANNER);
    header
        .runtime_includes
        .insert("generator/RandomSetGenerator.h".to_string());
    header
        .runtime_includes
        .insert(estimator.kind.spec().include.to_string());
    if let Some(iterator) = iterator {
        header
            .runtime_includes
            .insert(iterator.kind.spec().include.to_string());
    }
    header.local_includes.insert(Artifact::config().leaf_include());
    header
        .local_includes
        .insert(ctx.artifact(ArtifactKind::RecordUtil).leaf_include());
    header
        .local_includes
        .insert(ctx.artifact(ArtifactKind::SetterChain).leaf_include());

    let in_constructor = DirectiveContext {
        spec: ctx.spec,
        env: RenderEnv { config: "config" },
        names: None,
        chain_base: None,
    };
    let in_prepare = DirectiveContext {
        env: RenderEnv { config: "_config" },
        ..in_constructor
    };
    let estimator_class = estimator.kind.spec().class_name;
    let estimator_args = in_constructor.constructor_args(estimator)?.join(", ");

    let mut out = SourceWriter::new();
    header.open(&mut out);
    out.line(format!("class {base_class} : public RandomSetGenerator<{record}>"));
    out.open("{");
    out.dedent().line("public:").indent();
    out.blank();
    out.line(format!(
        "typedef RecordTraits<{record}>::SetterChainType SetterChainType;"
    ));
    out.blank();
    out.line(format!("{base_class}(const string& name, GeneratorConfig& config) :"));
    out.indent();
    out.line(format!("RandomSetGenerator<{record}>(name, config),"));
    out.line("_config(config),");
    out.line(format!("_cardinalityEstimator({estimator_args})"));
    out.dedent();
    out.open("{");
    out.close("}");
    out.blank();
    out.line(format!("virtual ~{base_class}()"));
    out.open("{");
    out.close("}");
    out.blank();
    out.line("virtual void prepare()");
    out.open("{");
    if let Some(iterator) = iterator {
        out.line(format!(
            "registerTask(new {}<{record}>({}));",
            iterator.kind.spec().class_name,
            in_prepare.constructor_args(iterator)?.join(", ")
        ));
    }
    out.close("}");
    out.blank();
    out.line("virtual I64u cardinality()");
    out.open("{");
    out.line("return _cardinalityEstimator.cardinality();");
    out.close("}");
    out.blank();
    out.line("SetterChainType setterChain()");
    out.open("{");
    out.line("return SetterChainType(_config);");
    out.close("}");
    out.blank();
    out.dedent().line("protected:").indent();
    out.blank();
    out.line("GeneratorConfig& _config;");
    out.line(format!("{estimator_class} _cardinalityEstimator;"));
    out.close("};");
    out.blank();
    header.close(&mut out);

    let leaf = forwarding_leaf(
        &artifact,
        ctx.namespace,
        &base_class,
        &[("const string&", "name"), ("GeneratorConfig&", "config")],
        |_| {},
    );
    Ok(Rendered {
        artifact,
        base: out.finish(),
        leaf,
    })
}
