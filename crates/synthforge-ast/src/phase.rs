use std::fmt;

use crate::ids::{ComponentId, FieldId, ReferenceId, SequenceId};

/// Compilation phase of a specification tree.
///
/// The phase fixes the type stored at every link-bearing position, so a
/// `Specification<Resolved>` cannot hold an unresolved name.
pub trait Phase: Sized + Clone + fmt::Debug + 'static {
    /// Target of a record reference.
    type RecordLink: Clone + fmt::Debug;
    /// Field-ref argument.
    type FieldLink: Clone + fmt::Debug;
    /// Reference-ref argument.
    type ReferenceLink: Clone + fmt::Debug;
    /// Function-ref argument.
    type FunctionLink: Clone + fmt::Debug;
}

/// Tree as built by the reader: every link is a bare name.
#[derive(Debug, Clone, Copy)]
pub enum Raw {}

/// Tree after reference resolution: every link is a handle.
#[derive(Debug, Clone, Copy)]
pub enum Resolved {}

impl Phase for Raw {
    type RecordLink = UnresolvedRef;
    type FieldLink = UnresolvedRef;
    type ReferenceLink = UnresolvedRef;
    type FunctionLink = UnresolvedRef;
}

impl Phase for Resolved {
    type RecordLink = SequenceId;
    type FieldLink = ResolvedFieldRef;
    type ReferenceLink = ResolvedReferenceRef;
    type FunctionLink = ComponentId;
}

/// A name that has not been bound yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedRef {
    pub name: String,
}

impl UnresolvedRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A field reached from a root record through zero or more references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFieldRef {
    /// Path as written in the document.
    pub path: String,
    pub root: SequenceId,
    /// References traversed from `root`, in order.
    pub inner: Vec<ReferenceId>,
    pub field: FieldId,
}

impl ResolvedFieldRef {
    /// True when the field belongs to the root record itself.
    pub fn is_direct(&self) -> bool {
        self.inner.is_empty()
    }
}

/// A reference declared on a record type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedReferenceRef {
    pub path: String,
    pub record: SequenceId,
    pub reference: ReferenceId,
}
