//! Type aliases, member names and template types of one setter chain.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::convert::Infallible;

use synthforge_ast::{
    Argument, Component, ComponentId, ComponentKind, RecordSequence, Resolved, Specification,
    Visitor, accept_sequence,
};
use synthforge_core::{CompileError, Result};

use crate::naming::{constant_name, lower_camel, member, upper_camel};
use crate::transform::{
    bound_setter, foreign_setter, function_class, reference_target, value_type,
};

/// Emitted names of one chain member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentName {
    /// Typedef, e.g. `ConstValueProviderType01`.
    pub alias: String,
    /// Member variable, e.g. `_constValueProvider01` or `_setStatus`.
    pub variable: String,
}

/// Names of every setter and nested component of a sequence, in post-order.
#[derive(Debug, Default)]
pub struct ChainNames {
    names: HashMap<ComponentId, ComponentName>,
    order: Vec<ComponentId>,
    counters: BTreeMap<&'static str, usize>,
    /// Setter variables, claimed before any nested member is named.
    reserved: HashSet<String>,
    taken: HashSet<String>,
}

impl ChainNames {
    pub fn assign(spec: &Specification<Resolved>, sequence: &RecordSequence) -> Self {
        let mut names = ChainNames::default();
        match accept_sequence(spec, sequence, &mut names) {
            Ok(()) => names,
            Err(never) => match never {},
        }
    }

    pub fn get(&self, id: ComponentId) -> Option<&ComponentName> {
        self.names.get(&id)
    }

    pub fn alias(&self, id: ComponentId) -> Result<&str> {
        self.lookup(id).map(|name| name.alias.as_str())
    }

    pub fn variable(&self, id: ComponentId) -> Result<&str> {
        self.lookup(id).map(|name| name.variable.as_str())
    }

    /// Children before parents, setters in order-key order.
    pub fn post_order(&self) -> &[ComponentId] {
        &self.order
    }

    fn lookup(&self, id: ComponentId) -> Result<&ComponentName> {
        self.names.get(&id).ok_or_else(|| {
            CompileError::malformed(format!("{id} is not part of the setter chain"))
        })
    }

    fn next_alias(&mut self, class_name: &'static str) -> (String, usize) {
        let counter = self.counters.entry(class_name).or_insert(0);
        *counter += 1;
        (format!("{class_name}Type{:02}", *counter), *counter)
    }

    /// Setter variable, suffixed when two keys share a lowerCamel form.
    fn setter_variable(&mut self, key: &str) -> String {
        let base = member(key);
        let mut variable = base.clone();
        let mut suffix = 1;
        while self.taken.contains(&variable)
            || (suffix > 1 && self.reserved.contains(&variable))
        {
            suffix += 1;
            variable = format!("{base}{suffix:02}");
        }
        self.taken.insert(variable.clone());
        variable
    }
}

impl Visitor<Resolved> for ChainNames {
    type Error = Infallible;

    fn pre_visit_sequence(
        &mut self,
        spec: &Specification<Resolved>,
        sequence: &RecordSequence,
    ) -> std::result::Result<(), Infallible> {
        for id in &sequence.setter_chain.setters {
            self.reserved.insert(member(&spec.component(*id).key));
        }
        Ok(())
    }

    fn post_visit_setter(
        &mut self,
        _spec: &Specification<Resolved>,
        setter: &Component<Resolved>,
    ) -> std::result::Result<(), Infallible> {
        let (alias, _) = self.next_alias(setter.kind.spec().class_name);
        let variable = self.setter_variable(&setter.key);
        self.names.insert(setter.id, ComponentName { alias, variable });
        self.order.push(setter.id);
        Ok(())
    }

    fn post_visit_component(
        &mut self,
        _spec: &Specification<Resolved>,
        component: &Component<Resolved>,
    ) -> std::result::Result<(), Infallible> {
        if component.parent.is_none() {
            return Ok(());
        }
        let class_name = component.kind.spec().class_name;
        let (alias, variable) = loop {
            let (alias, count) = self.next_alias(class_name);
            let variable = format!("_{}{count:02}", lower_camel(class_name));
            if !self.reserved.contains(&variable) && !self.taken.contains(&variable) {
                break (alias, variable);
            }
        };
        self.taken.insert(variable.clone());
        self.names.insert(component.id, ComponentName { alias, variable });
        self.order.push(component.id);
        Ok(())
    }
}

/// Renders the runtime template type of chain members.
pub struct ChainTypes<'a> {
    pub spec: &'a Specification<Resolved>,
    pub names: &'a ChainNames,
    /// Record class the chain populates.
    pub record: &'a str,
    pub chain_base: &'a str,
}

impl ChainTypes<'_> {
    pub fn type_expression(&self, component: &Component<Resolved>) -> Result<String> {
        let class = component.kind.spec().class_name;
        let cxt = self.record;
        let args = match component.kind {
            ComponentKind::FieldSetter => {
                let field = self.field_constant(component, "field")?;
                let value = self.child_alias(component, "value")?;
                format!("{cxt}, {field}, {value}")
            }
            ComponentKind::ReferenceSetter => {
                let reference = component
                    .arguments
                    .get("reference")
                    .and_then(Argument::as_reference_ref)
                    .ok_or_else(|| missing(component, "reference"))?;
                let name = &self.spec.reference(reference.reference).name;
                let value = self.child_alias(component, "value")?;
                format!("{cxt}, RecordTraits<{cxt}>::{}, {value}", constant_name(name))
            }
            ComponentKind::CallbackValueProvider => {
                format!("{}, {cxt}, {}", value_type(component, "value_type")?, self.chain_base)
            }
            ComponentKind::ClusteredValueProvider => format!(
                "{}, {cxt}, {}, {}",
                value_type(component, "value_type")?,
                self.function(component, "probability")?,
                self.child_alias(component, "cardinality")?
            ),
            ComponentKind::RandomValueProvider => format!(
                "{}, {cxt}, {}",
                value_type(component, "value_type")?,
                self.function(component, "probability")?
            ),
            ComponentKind::ElementWiseValueProvider => {
                let size = component.size_param("size").ok_or_else(|| {
                    CompileError::malformed(format!("{} lacks its size", component.describe()))
                })?;
                format!("{}, {cxt}, {size}", value_type(component, "value_type")?)
            }
            ComponentKind::ConstValueProvider
            | ComponentKind::ContextFieldValueProvider
            | ComponentKind::ConstRangeProvider => {
                format!("{}, {cxt}", value_type(component, "value_type")?)
            }
            ComponentKind::ContextFieldRangeProvider => {
                let setter = bound_setter(self.spec, component, "field")?;
                let alias = self
                    .names
                    .alias(setter)
                    .map_err(|_| foreign_setter(component, "field"))?;
                format!("{}, {cxt}, {alias}", value_type(component, "value_type")?)
            }
            ComponentKind::ClusteredReferenceProvider
            | ComponentKind::RandomReferenceProvider
            | ComponentKind::EqualityPredicateProvider => {
                let target = reference_target(self.spec, component)?;
                format!("{}, {cxt}", upper_camel(&self.spec.sequence(target).key))
            }
            ComponentKind::FieldBinder => {
                let field = self.field_constant(component, "field")?;
                let value = self.child_alias(component, "value")?;
                let target = reference_target(self.spec, component)?;
                format!("{}, {field}, {value}", upper_camel(&self.spec.sequence(target).key))
            }
            other => {
                return Err(CompileError::malformed(format!(
                    "{} cannot be part of a setter chain",
                    other.spec().name
                )));
            }
        };
        Ok(format!("{class}<{args}>"))
    }

    /// `RecordTraits<Owner>::FIELD` of a field argument.
    fn field_constant(&self, component: &Component<Resolved>, key: &str) -> Result<String> {
        let field_ref = component
            .arguments
            .get(key)
            .and_then(Argument::as_field_ref)
            .ok_or_else(|| missing(component, key))?;
        let field = self.spec.field(field_ref.field);
        let owner = upper_camel(&self.spec.sequence(field.owner).key);
        Ok(format!("RecordTraits<{owner}>::{}", constant_name(&field.name)))
    }

    fn child_alias(&self, component: &Component<Resolved>, key: &str) -> Result<String> {
        let id = component
            .arguments
            .get(key)
            .and_then(Argument::as_component)
            .ok_or_else(|| missing(component, key))?;
        self.names.alias(id).map(str::to_string)
    }

    fn function(&self, component: &Component<Resolved>, key: &str) -> Result<String> {
        let id = component
            .arguments
            .get(key)
            .and_then(Argument::as_function_ref)
            .ok_or_else(|| missing(component, key))?;
        function_class(self.spec.component(*id))
    }
}

fn missing(component: &Component<Resolved>, key: &str) -> CompileError {
    CompileError::malformed(format!(
        "{} has no usable argument '{key}'",
        component.describe()
    ))
}
