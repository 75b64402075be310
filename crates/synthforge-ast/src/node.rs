//! Node model of a prototype specification.

use std::collections::BTreeMap;

use synthforge_core::{FieldType, LiteralForm, LiteralType};

use crate::ids::{ComponentId, FieldId, ReferenceId, SequenceId};
use crate::kinds::{Category, ComponentKind};
use crate::phase::Phase;

/// Root aggregate: four namespaces plus the node arena.
#[derive(Debug, Clone)]
pub struct Specification<P: Phase> {
    pub parameters: BTreeMap<String, Parameter>,
    pub functions: BTreeMap<String, ComponentId>,
    pub enum_sets: BTreeMap<String, ComponentId>,
    /// Record sequences in document order; indexed by [`SequenceId`].
    pub sequences: Vec<RecordSequence>,
    pub fields: Vec<Field>,
    pub references: Vec<Reference<P>>,
    pub components: Vec<Component<P>>,
}

impl<P: Phase> Default for Specification<P> {
    fn default() -> Self {
        Self {
            parameters: BTreeMap::new(),
            functions: BTreeMap::new(),
            enum_sets: BTreeMap::new(),
            sequences: Vec::new(),
            fields: Vec::new(),
            references: Vec::new(),
            components: Vec::new(),
        }
    }
}

impl<P: Phase> Specification<P> {
    pub fn sequence(&self, id: SequenceId) -> &RecordSequence {
        &self.sequences[id.index()]
    }

    pub fn field(&self, id: FieldId) -> &Field {
        &self.fields[id.index()]
    }

    pub fn reference(&self, id: ReferenceId) -> &Reference<P> {
        &self.references[id.index()]
    }

    pub fn component(&self, id: ComponentId) -> &Component<P> {
        &self.components[id.index()]
    }

    pub fn sequence_by_key(&self, key: &str) -> Option<&RecordSequence> {
        self.sequences.iter().find(|sequence| sequence.key == key)
    }

    /// Field of a record type by name.
    pub fn find_field(&self, sequence: SequenceId, name: &str) -> Option<&Field> {
        self.sequence(sequence)
            .record_type
            .fields
            .iter()
            .map(|id| self.field(*id))
            .find(|field| field.name == name)
    }

    /// Reference of a record type by name.
    pub fn find_reference(&self, sequence: SequenceId, name: &str) -> Option<&Reference<P>> {
        self.sequence(sequence)
            .record_type
            .references
            .iter()
            .map(|id| self.reference(*id))
            .find(|reference| reference.name == name)
    }

    /// Components of a setter chain subtree, parents before children.
    pub fn subtree(&self, root: ComponentId) -> Vec<ComponentId> {
        let mut out = Vec::new();
        self.collect_subtree(root, &mut out);
        out
    }

    fn collect_subtree(&self, id: ComponentId, out: &mut Vec<ComponentId>) {
        out.push(id);
        for child in self.component(id).arguments.child_components() {
            self.collect_subtree(child, out);
        }
    }
}

/// Flat configuration parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub key: String,
    pub value: String,
}

/// Kind of record sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceKind {
    Random,
    /// Any other sequence element; kept so references to it resolve.
    Unsupported(String),
}

/// One record-generation pipeline.
#[derive(Debug, Clone)]
pub struct RecordSequence {
    pub id: SequenceId,
    pub key: String,
    pub kind: SequenceKind,
    pub record_type: RecordType,
    pub output_format: Option<ComponentId>,
    pub setter_chain: SetterChain,
    pub cardinality_estimator: Option<ComponentId>,
    pub sequence_iterator: Option<ComponentId>,
}

/// Record schema; both lists are kept in order-key order.
#[derive(Debug, Clone, Default)]
pub struct RecordType {
    pub fields: Vec<FieldId>,
    pub references: Vec<ReferenceId>,
}

/// Setters in order-key order.
#[derive(Debug, Clone, Default)]
pub struct SetterChain {
    pub setters: Vec<ComponentId>,
}

#[derive(Debug, Clone)]
pub struct Field {
    pub id: FieldId,
    pub owner: SequenceId,
    pub name: String,
    pub field_type: FieldType,
    pub order: usize,
    pub implicit: bool,
    pub derived: bool,
    /// Enum set backing an `Enum` field.
    pub enum_set: Option<String>,
    /// Field setter bound to this field; installed by the resolver.
    pub setter: Option<ComponentId>,
}

#[derive(Debug, Clone)]
pub struct Reference<P: Phase> {
    pub id: ReferenceId,
    pub owner: SequenceId,
    pub name: String,
    pub order: usize,
    pub target: P::RecordLink,
}

/// A typed runtime node selected by its type string.
#[derive(Debug, Clone)]
pub struct Component<P: Phase> {
    pub id: ComponentId,
    /// Setter key, function key, or the argument key under the parent.
    pub key: String,
    pub kind: ComponentKind,
    pub attributes: Attributes,
    pub arguments: Arguments<P>,
    pub parent: Option<ComponentId>,
    pub owner: Option<SequenceId>,
    /// Position within the owning setter chain; zero elsewhere.
    pub order: usize,
}

impl<P: Phase> Component<P> {
    pub fn category(&self) -> Category {
        self.kind.spec().category
    }

    /// Captured type parameter as a literal type.
    pub fn literal_param(&self, name: &str) -> Option<LiteralType> {
        self.attributes.text(name)?.parse().ok()
    }

    /// Captured size parameter.
    pub fn size_param(&self, name: &str) -> Option<usize> {
        match self.attributes.get(name)? {
            AttributeValue::Integer(value) => usize::try_from(*value).ok(),
            _ => None,
        }
    }

    /// Human-readable location used in error messages.
    pub fn describe(&self) -> String {
        format!("{} '{}'", self.kind.spec().name, self.key)
    }
}

/// Insertion-ordered attribute bag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes(Vec<(String, AttributeValue)>);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
    Text(String),
    Integer(i64),
    Flag(bool),
}

impl Attributes {
    pub fn set(&mut self, key: impl Into<String>, value: AttributeValue) {
        let key = key.into();
        match self.0.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, slot)) => *slot = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&AttributeValue> {
        self.0
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value)
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        match self.get(key)? {
            AttributeValue::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Ordered argument list of a component, in schema order.
#[derive(Debug, Clone)]
pub struct Arguments<P: Phase>(Vec<(String, Argument<P>)>);

impl<P: Phase> Default for Arguments<P> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<P: Phase> Arguments<P> {
    pub fn push(&mut self, key: impl Into<String>, argument: Argument<P>) {
        self.0.push((key.into(), argument));
    }

    pub fn get(&self, key: &str) -> Option<&Argument<P>> {
        self.0
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, argument)| argument)
    }

    pub fn entries(&self) -> &[(String, Argument<P>)] {
        &self.0
    }

    pub fn into_entries(self) -> Vec<(String, Argument<P>)> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Nested components in argument order, collections flattened.
    pub fn child_components(&self) -> Vec<ComponentId> {
        let mut out = Vec::new();
        for (_, argument) in &self.0 {
            match argument {
                Argument::Component(id) => out.push(*id),
                Argument::Collection(collection) => {
                    out.extend(collection.iter().filter_map(Argument::as_component));
                }
                _ => {}
            }
        }
        out
    }
}

impl<P: Phase> FromIterator<(String, Argument<P>)> for Arguments<P> {
    fn from_iter<I: IntoIterator<Item = (String, Argument<P>)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Argument value held by a component.
#[derive(Debug, Clone)]
pub enum Argument<P: Phase> {
    Literal(Literal),
    FieldRef(P::FieldLink),
    ReferenceRef(P::ReferenceLink),
    FunctionRef(P::FunctionLink),
    Component(ComponentId),
    Collection(ArgumentCollection<P>),
}

impl<P: Phase> Argument<P> {
    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Argument::Literal(literal) => Some(literal),
            _ => None,
        }
    }

    pub fn as_component(&self) -> Option<ComponentId> {
        match self {
            Argument::Component(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_field_ref(&self) -> Option<&P::FieldLink> {
        match self {
            Argument::FieldRef(link) => Some(link),
            _ => None,
        }
    }

    pub fn as_reference_ref(&self) -> Option<&P::ReferenceLink> {
        match self {
            Argument::ReferenceRef(link) => Some(link),
            _ => None,
        }
    }

    pub fn as_function_ref(&self) -> Option<&P::FunctionLink> {
        match self {
            Argument::FunctionRef(link) => Some(link),
            _ => None,
        }
    }
}

/// Sibling arguments sharing one key; position is document order.
#[derive(Debug, Clone)]
pub struct ArgumentCollection<P: Phase> {
    items: Vec<Argument<P>>,
}

impl<P: Phase> ArgumentCollection<P> {
    pub fn new(items: Vec<Argument<P>>) -> Self {
        Self { items }
    }

    pub fn get(&self, position: usize) -> Option<&Argument<P>> {
        self.items.get(position)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Argument<P>> {
        self.items.iter()
    }

    pub fn into_items(self) -> Vec<Argument<P>> {
        self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Typed scalar value as written in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Literal {
    pub value_type: LiteralType,
    pub raw: String,
    pub form: LiteralForm,
}
