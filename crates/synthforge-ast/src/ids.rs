//! Stable handles into the specification arena.

use std::fmt;

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u32);

        impl $name {
            pub fn from_index(index: usize) -> Self {
                Self(index as u32)
            }

            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }
    };
}

arena_id!(
    /// Handle of a record sequence (and of the record type it owns).
    SequenceId,
    "sequence"
);
arena_id!(
    /// Handle of a record field.
    FieldId,
    "field"
);
arena_id!(
    /// Handle of a record reference.
    ReferenceId,
    "reference"
);
arena_id!(
    /// Handle of a component: function, enum set, setter or nested provider.
    ComponentId,
    "component"
);
