//! Generator configuration: parameters, functions and enum sets.

use std::collections::BTreeSet;

use synthforge_ast::{Resolved, Specification};
use synthforge_core::Result;

use super::{BASE_BANNER, Rendered, forwarding_leaf};
use crate::layout::Artifact;
use crate::source::{HeaderFile, SourceWriter};
use crate::transform::{DirectiveContext, RenderEnv, function_class, quoted};

pub fn render(spec: &Specification<Resolved>, namespace: &str) -> Result<Rendered> {
    let artifact = Artifact::config();
    let base_class = artifact.base_class();
    let context = DirectiveContext {
        spec,
        env: RenderEnv { config: "(*this)" },
        names: None,
        chain_base: None,
    };

    let include = artifact.base_include();
    let mut header = HeaderFile {
        include: &include,
        banner: BASE_BANNER,
        runtime_includes: BTreeSet::from(["config/AbstractGeneratorConfig.h".to_string()]),
        local_includes: BTreeSet::new(),
        namespace,
    };
    for id in spec.functions.values().chain(spec.enum_sets.values()) {
        header
            .runtime_includes
            .insert(spec.component(*id).kind.spec().include.to_string());
    }

    let mut out = SourceWriter::new();
    header.open(&mut out);
    out.line(format!("class {base_class} : public AbstractGeneratorConfig"));
    out.open("{");
    out.dedent().line("public:").indent();
    out.blank();
    out.line(format!("{base_class}(const string& configPath) :"));
    out.indent().line("AbstractGeneratorConfig(configPath)").dedent();
    out.open("{");
    out.close("}");
    out.blank();
    out.line(format!("virtual ~{base_class}()"));
    out.open("{");
    out.close("}");
    out.blank();
    out.dedent().line("protected:").indent();
    out.blank();

    out.line("virtual void configureParameters()");
    out.open("{");
    for parameter in spec.parameters.values() {
        out.line(format!(
            "setDefault({}, {});",
            quoted(&parameter.key),
            quoted(&parameter.value)
        ));
    }
    out.close("}");
    out.blank();

    out.line("virtual void configureFunctions()");
    out.open("{");
    for id in spec.functions.values() {
        let function = spec.component(*id);
        let mut args = vec![quoted(&function.key)];
        args.extend(context.constructor_args(function)?);
        out.line(format!(
            "function(new {}({}));",
            function_class(function)?,
            args.join(", ")
        ));
    }
    out.close("}");
    out.blank();

    out.line("virtual void configureSets()");
    out.open("{");
    for id in spec.enum_sets.values() {
        let enum_set = spec.component(*id);
        let mut args = vec![quoted(&enum_set.key)];
        args.extend(context.constructor_args(enum_set)?);
        out.line(format!(
            "enumSet(new {}({}));",
            enum_set.kind.spec().class_name,
            args.join(", ")
        ));
    }
    out.close("}");
    out.close("};");
    out.blank();
    header.close(&mut out);

    let leaf = forwarding_leaf(
        &artifact,
        namespace,
        &base_class,
        &[("const string&", "configPath")],
        |_| {},
    );
    Ok(Rendered {
        artifact,
        base: out.finish(),
        leaf,
    })
}
