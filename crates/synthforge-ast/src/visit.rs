//! Double-dispatch traversal over a specification.
//!
//! Per-kind hooks default to the generic `pre_visit_node`/`post_visit_node`,
//! so a visitor only overrides the kinds it cares about.

use crate::ids::ComponentId;
use crate::node::{Component, Field, Parameter, RecordSequence, Reference, Specification};
use crate::phase::Phase;

/// Borrowed view of any visitable node.
#[derive(Debug)]
pub enum NodeRef<'a, P: Phase> {
    Specification(&'a Specification<P>),
    Parameter(&'a Parameter),
    Function(&'a Component<P>),
    EnumSet(&'a Component<P>),
    Sequence(&'a RecordSequence),
    Field(&'a Field),
    Reference(&'a Reference<P>),
    Setter(&'a Component<P>),
    /// Nested provider or binder, estimator, iterator or output format.
    Component(&'a Component<P>),
}

impl<P: Phase> Clone for NodeRef<'_, P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P: Phase> Copy for NodeRef<'_, P> {}

#[allow(unused_variables)]
pub trait Visitor<P: Phase> {
    type Error;

    fn pre_visit_node(
        &mut self,
        spec: &Specification<P>,
        node: NodeRef<'_, P>,
    ) -> Result<(), Self::Error> {
        Ok(())
    }

    fn post_visit_node(
        &mut self,
        spec: &Specification<P>,
        node: NodeRef<'_, P>,
    ) -> Result<(), Self::Error> {
        Ok(())
    }

    fn pre_visit_specification(&mut self, spec: &Specification<P>) -> Result<(), Self::Error> {
        self.pre_visit_node(spec, NodeRef::Specification(spec))
    }

    fn post_visit_specification(&mut self, spec: &Specification<P>) -> Result<(), Self::Error> {
        self.post_visit_node(spec, NodeRef::Specification(spec))
    }

    fn visit_parameter(
        &mut self,
        spec: &Specification<P>,
        parameter: &Parameter,
    ) -> Result<(), Self::Error> {
        self.pre_visit_node(spec, NodeRef::Parameter(parameter))?;
        self.post_visit_node(spec, NodeRef::Parameter(parameter))
    }

    fn visit_function(
        &mut self,
        spec: &Specification<P>,
        function: &Component<P>,
    ) -> Result<(), Self::Error> {
        self.pre_visit_node(spec, NodeRef::Function(function))?;
        self.post_visit_node(spec, NodeRef::Function(function))
    }

    fn visit_enum_set(
        &mut self,
        spec: &Specification<P>,
        enum_set: &Component<P>,
    ) -> Result<(), Self::Error> {
        self.pre_visit_node(spec, NodeRef::EnumSet(enum_set))?;
        self.post_visit_node(spec, NodeRef::EnumSet(enum_set))
    }

    fn pre_visit_sequence(
        &mut self,
        spec: &Specification<P>,
        sequence: &RecordSequence,
    ) -> Result<(), Self::Error> {
        self.pre_visit_node(spec, NodeRef::Sequence(sequence))
    }

    fn post_visit_sequence(
        &mut self,
        spec: &Specification<P>,
        sequence: &RecordSequence,
    ) -> Result<(), Self::Error> {
        self.post_visit_node(spec, NodeRef::Sequence(sequence))
    }

    fn visit_field(&mut self, spec: &Specification<P>, field: &Field) -> Result<(), Self::Error> {
        self.pre_visit_node(spec, NodeRef::Field(field))?;
        self.post_visit_node(spec, NodeRef::Field(field))
    }

    fn visit_reference(
        &mut self,
        spec: &Specification<P>,
        reference: &Reference<P>,
    ) -> Result<(), Self::Error> {
        self.pre_visit_node(spec, NodeRef::Reference(reference))?;
        self.post_visit_node(spec, NodeRef::Reference(reference))
    }

    fn pre_visit_setter(
        &mut self,
        spec: &Specification<P>,
        setter: &Component<P>,
    ) -> Result<(), Self::Error> {
        self.pre_visit_node(spec, NodeRef::Setter(setter))
    }

    fn post_visit_setter(
        &mut self,
        spec: &Specification<P>,
        setter: &Component<P>,
    ) -> Result<(), Self::Error> {
        self.post_visit_node(spec, NodeRef::Setter(setter))
    }

    fn pre_visit_component(
        &mut self,
        spec: &Specification<P>,
        component: &Component<P>,
    ) -> Result<(), Self::Error> {
        self.pre_visit_node(spec, NodeRef::Component(component))
    }

    fn post_visit_component(
        &mut self,
        spec: &Specification<P>,
        component: &Component<P>,
    ) -> Result<(), Self::Error> {
        self.post_visit_node(spec, NodeRef::Component(component))
    }
}

/// Walk the whole specification.
///
/// Parameters, functions and enum sets go in key order, sequences in
/// document order, fields, references and setters in order-key order. Nested
/// components are visited depth-first inside their setter, followed by the
/// estimator, iterator and output format of the sequence.
pub fn accept<P, V>(spec: &Specification<P>, visitor: &mut V) -> Result<(), V::Error>
where
    P: Phase,
    V: Visitor<P> + ?Sized,
{
    visitor.pre_visit_specification(spec)?;

    for parameter in spec.parameters.values() {
        visitor.visit_parameter(spec, parameter)?;
    }
    for id in spec.functions.values() {
        visitor.visit_function(spec, spec.component(*id))?;
    }
    for id in spec.enum_sets.values() {
        visitor.visit_enum_set(spec, spec.component(*id))?;
    }

    for sequence in &spec.sequences {
        accept_sequence(spec, sequence, visitor)?;
    }

    visitor.post_visit_specification(spec)
}

/// Walk one record sequence.
pub fn accept_sequence<P, V>(
    spec: &Specification<P>,
    sequence: &RecordSequence,
    visitor: &mut V,
) -> Result<(), V::Error>
where
    P: Phase,
    V: Visitor<P> + ?Sized,
{
    visitor.pre_visit_sequence(spec, sequence)?;

    let mut fields: Vec<&Field> = sequence
        .record_type
        .fields
        .iter()
        .map(|id| spec.field(*id))
        .collect();
    fields.sort_by_key(|field| field.order);
    for field in fields {
        visitor.visit_field(spec, field)?;
    }

    let mut references: Vec<&Reference<P>> = sequence
        .record_type
        .references
        .iter()
        .map(|id| spec.reference(*id))
        .collect();
    references.sort_by_key(|reference| reference.order);
    for reference in references {
        visitor.visit_reference(spec, reference)?;
    }

    let mut setters: Vec<&Component<P>> = sequence
        .setter_chain
        .setters
        .iter()
        .map(|id| spec.component(*id))
        .collect();
    setters.sort_by_key(|setter| setter.order);
    for setter in setters {
        visitor.pre_visit_setter(spec, setter)?;
        for child in setter.arguments.child_components() {
            accept_component(spec, child, visitor)?;
        }
        visitor.post_visit_setter(spec, setter)?;
    }

    for id in [
        sequence.cardinality_estimator,
        sequence.sequence_iterator,
        sequence.output_format,
    ]
    .into_iter()
    .flatten()
    {
        accept_component(spec, id, visitor)?;
    }

    visitor.post_visit_sequence(spec, sequence)
}

/// Walk a component subtree depth-first.
pub fn accept_component<P, V>(
    spec: &Specification<P>,
    id: ComponentId,
    visitor: &mut V,
) -> Result<(), V::Error>
where
    P: Phase,
    V: Visitor<P> + ?Sized,
{
    let component = spec.component(id);
    visitor.pre_visit_component(spec, component)?;
    for child in component.arguments.child_components() {
        accept_component(spec, child, visitor)?;
    }
    visitor.post_visit_component(spec, component)
}
