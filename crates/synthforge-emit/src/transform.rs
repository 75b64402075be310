//! Argument-transformer pipeline.
//!
//! Renders each constructor directive of a component to one or more C++
//! expressions.

use synthforge_ast::{
    Argument, Component, ComponentId, ComponentKind, Directive, Literal, Resolved, SequenceId,
    Specification, TypeParam,
};
use synthforge_core::grammar::expand_parameter_tokens;
use synthforge_core::{CompileError, LiteralForm, LiteralType, Result};

use crate::chain::ChainNames;
use crate::naming::{accessor, lower_camel, upper_camel};

/// Names bound by the enclosing artifact.
#[derive(Debug, Clone, Copy)]
pub struct RenderEnv<'a> {
    /// Expression designating the generator config.
    pub config: &'a str,
}

/// Render a literal argument as a C++ expression.
pub fn render_literal(literal: &Literal, env: &RenderEnv<'_>) -> String {
    let config = env.config;
    match &literal.form {
        LiteralForm::Parameter { name, cast } => {
            let target = cast.unwrap_or(literal.value_type);
            format!("{config}.parameter<{target}>(\"{name}\")")
        }
        LiteralForm::Expression(expression) => {
            let expanded = expand_parameter_tokens(expression, |token| {
                let target = token.cast.unwrap_or(literal.value_type);
                format!("{config}.parameter<{target}>(\"{}\")", token.name)
            });
            format!("static_cast<{}>({expanded})", literal.value_type)
        }
        LiteralForm::Null => format!("nullValue<{}>()", literal.value_type),
        LiteralForm::Plain { value, cast } => {
            render_constant(cast.unwrap_or(literal.value_type), value)
        }
    }
}

fn render_constant(target: LiteralType, value: &str) -> String {
    match target {
        LiteralType::String => quoted(value),
        LiteralType::Char => format!("'{}'", escape(value, '\'')),
        LiteralType::Date => format!("Date(\"{}\")", escape(value, '"')),
        LiteralType::Bool => match value {
            "true" | "1" => "true".to_string(),
            _ => "false".to_string(),
        },
        numeric => format!("static_cast<{numeric}>({value})"),
    }
}

/// C++ string literal.
pub fn quoted(value: &str) -> String {
    format!("\"{}\"", escape(value, '"'))
}

fn escape(value: &str, quote: char) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out
}

/// Context for rendering constructor directives.
pub struct DirectiveContext<'a> {
    pub spec: &'a Specification<Resolved>,
    pub env: RenderEnv<'a>,
    /// Names of the enclosing setter chain, if any.
    pub names: Option<&'a ChainNames>,
    /// Base setter-chain class declaring callback hooks.
    pub chain_base: Option<&'a str>,
}

impl DirectiveContext<'_> {
    /// Constructor arguments of `component`, in directive order.
    pub fn constructor_args(&self, component: &Component<Resolved>) -> Result<Vec<String>> {
        let mut out = Vec::new();
        for directive in component.kind.spec().directives {
            self.render(component, *directive, &mut out)?;
        }
        Ok(out)
    }

    fn render(
        &self,
        component: &Component<Resolved>,
        directive: Directive,
        out: &mut Vec<String>,
    ) -> Result<()> {
        match directive {
            Directive::Literal(key) => {
                let literal = argument(component, key)?.as_literal().ok_or_else(|| {
                    wrong_kind(component, key, "literal")
                })?;
                out.push(render_literal(literal, &self.env));
            }
            Directive::Verbatim(text) => out.push(text.to_string()),
            Directive::EnvVariable(_) => out.push(self.env.config.to_string()),
            Directive::FieldSetterRef(key) => {
                out.push(self.field_setter_ref(component, key)?);
            }
            Directive::SequenceInspector => {
                let target = reference_target(self.spec, component)?;
                out.push(format!(
                    "{}.generatorPool().get<{}Generator>().inspector()",
                    self.env.config,
                    upper_camel(&self.spec.sequence(target).key)
                ));
            }
            Directive::FunctionRef(key) => {
                let id = *argument(component, key)?
                    .as_function_ref()
                    .ok_or_else(|| wrong_kind(component, key, "function_ref"))?;
                let function = self.spec.component(id);
                out.push(format!(
                    "{}.function<{}>(\"{}\")",
                    self.env.config,
                    function_class(function)?,
                    function.key
                ));
            }
            Directive::RuntimeComponentRef(key) => {
                let names = self.names.ok_or_else(|| {
                    CompileError::malformed(format!(
                        "{} references nested components outside a setter chain",
                        component.describe()
                    ))
                })?;
                match argument(component, key)? {
                    Argument::Component(id) => out.push(names.variable(*id)?.to_string()),
                    Argument::Collection(collection) => {
                        for item in collection.iter() {
                            let id = item
                                .as_component()
                                .ok_or_else(|| wrong_kind(component, key, "component"))?;
                            out.push(names.variable(id)?.to_string());
                        }
                    }
                    _ => return Err(wrong_kind(component, key, "component")),
                }
            }
            Directive::CallbackRef(key) => {
                let chain_base = self.chain_base.ok_or_else(|| {
                    CompileError::malformed(format!(
                        "{} declares a callback outside a setter chain",
                        component.describe()
                    ))
                })?;
                out.push(format!("&{chain_base}::{}", callback_name(component, key)?));
            }
            Directive::FieldAccessor(key) => out.push(self.field_accessor(component, key)?),
        }
        Ok(())
    }

    fn field_setter_ref(&self, component: &Component<Resolved>, key: &str) -> Result<String> {
        let setter = bound_setter(self.spec, component, key)?;
        let names = self.names.ok_or_else(|| foreign_setter(component, key))?;
        names
            .variable(setter)
            .map(str::to_string)
            .map_err(|_| foreign_setter(component, key))
    }

    fn field_accessor(&self, component: &Component<Resolved>, key: &str) -> Result<String> {
        let field_ref = argument(component, key)?
            .as_field_ref()
            .ok_or_else(|| wrong_kind(component, key, "field_ref"))?;
        let root = upper_camel(&self.spec.sequence(field_ref.root).key);
        let mut chain = String::from("cxt");
        for reference in &field_ref.inner {
            chain.push_str(&format!("->{}()", lower_camel(&self.spec.reference(*reference).name)));
        }
        chain.push_str(&format!("->{}()", accessor(self.spec.field(field_ref.field))));
        Ok(format!(
            "[](const AutoPtr<{root}>& cxt) {{ return {chain}; }}"
        ))
    }
}

fn argument<'c>(component: &'c Component<Resolved>, key: &str) -> Result<&'c Argument<Resolved>> {
    component.arguments.get(key).ok_or_else(|| {
        CompileError::malformed(format!("{} has no argument '{key}'", component.describe()))
    })
}

fn wrong_kind(component: &Component<Resolved>, key: &str, expected: &str) -> CompileError {
    CompileError::malformed(format!(
        "argument '{key}' of {} is not a {expected}",
        component.describe()
    ))
}

/// Field setter bound to the directly attached field named by `key`.
pub fn bound_setter(
    spec: &Specification<Resolved>,
    component: &Component<Resolved>,
    key: &str,
) -> Result<ComponentId> {
    let field_ref = argument(component, key)?
        .as_field_ref()
        .ok_or_else(|| wrong_kind(component, key, "field_ref"))?;
    if !field_ref.is_direct() {
        return Err(CompileError::SetterTarget {
            container: component.describe(),
            field: field_ref.path.clone(),
            reason: "the field is reached through a reference".to_string(),
        });
    }
    spec.field(field_ref.field)
        .setter
        .ok_or_else(|| CompileError::SetterTarget {
            container: component.describe(),
            field: field_ref.path.clone(),
            reason: "no field setter is bound to the field".to_string(),
        })
}

/// The bound setter lives in another record's chain.
pub fn foreign_setter(component: &Component<Resolved>, key: &str) -> CompileError {
    let field = component
        .arguments
        .get(key)
        .and_then(Argument::as_field_ref)
        .map(|field_ref| field_ref.path.clone())
        .unwrap_or_else(|| key.to_string());
    CompileError::SetterTarget {
        container: component.describe(),
        field,
        reason: "the field setter belongs to another setter chain".to_string(),
    }
}

/// Name of the callback hook a callback value provider points at.
pub fn callback_name(component: &Component<Resolved>, key: &str) -> Result<String> {
    let literal = argument(component, key)?
        .as_literal()
        .ok_or_else(|| wrong_kind(component, key, "literal"))?;
    let name = match &literal.form {
        LiteralForm::Plain { value, .. } => value.trim(),
        _ => "",
    };
    let valid = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        return Err(CompileError::malformed(format!(
            "callback name '{}' of {} is not an identifier",
            literal.raw,
            component.describe()
        )));
    }
    Ok(name.to_string())
}

/// Captured literal type parameter, rendered as a C++ type.
pub fn value_type(component: &Component<Resolved>, param: &str) -> Result<String> {
    component
        .literal_param(param)
        .map(|kind| kind.to_string())
        .ok_or_else(|| {
            CompileError::malformed(format!(
                "{} lacks type parameter '{param}'",
                component.describe()
            ))
        })
}

/// Runtime class of a probability function, with template arguments.
pub fn function_class(function: &Component<Resolved>) -> Result<String> {
    let spec = function.kind.spec();
    let mut params = Vec::with_capacity(spec.params.len());
    for param in spec.params {
        match param {
            TypeParam::Literal(name) => params.push(value_type(function, name)?),
            TypeParam::Size(name) => params.push(
                function
                    .size_param(name)
                    .map(|size| size.to_string())
                    .unwrap_or_default(),
            ),
        }
    }
    if params.is_empty() {
        Ok(spec.class_name.to_string())
    } else {
        Ok(format!("{}<{}>", spec.class_name, params.join(", ")))
    }
}

/// Record sequence targeted by the reference setter enclosing `component`.
pub fn reference_target(
    spec: &Specification<Resolved>,
    component: &Component<Resolved>,
) -> Result<SequenceId> {
    let mut current = component;
    while let Some(parent) = current.parent {
        current = spec.component(parent);
    }
    if current.kind != ComponentKind::ReferenceSetter {
        return Err(CompileError::malformed(format!(
            "{} must be nested under a reference setter",
            component.describe()
        )));
    }
    let reference = current
        .arguments
        .get("reference")
        .and_then(Argument::as_reference_ref)
        .ok_or_else(|| wrong_kind(current, "reference", "reference_ref"))?;
    Ok(spec.reference(reference.reference).target)
}
