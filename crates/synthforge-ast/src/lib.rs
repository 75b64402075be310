//! Abstract syntax tree of prototype specifications.
//!
//! The tree is an arena owned by [`Specification`]; nodes refer to each other
//! through typed handles. The [`Phase`] parameter separates the tree produced
//! by the reader ([`Raw`], names only) from the tree produced by the resolver
//! ([`Resolved`], bound handles only).

pub mod factory;
pub mod ids;
pub mod kinds;
pub mod node;
pub mod phase;
pub mod reader;
pub mod visit;
pub mod xml;

pub use factory::{KindMatch, create_kind};
pub use ids::{ComponentId, FieldId, ReferenceId, SequenceId};
pub use kinds::{
    ArgKind, ArgSpec, Category, ComponentKind, Directive, ElementKind, KindSpec, TypeParam,
};
pub use node::{
    Argument, ArgumentCollection, Arguments, AttributeValue, Attributes, Component, Field,
    Literal, Parameter, RecordSequence, RecordType, Reference, SequenceKind, SetterChain,
    Specification,
};
pub use phase::{Phase, Raw, Resolved, ResolvedFieldRef, ResolvedReferenceRef, UnresolvedRef};
pub use reader::{parse_specification, read_specification};
pub use visit::{NodeRef, Visitor, accept, accept_component, accept_sequence};
