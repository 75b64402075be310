use std::convert::Infallible;

use synthforge_ast::{
    Argument, ComponentId, ComponentKind, NodeRef, Raw, SequenceId, Specification, Visitor,
    accept,
};

/// Position of an argument inside the arena.
///
/// `entry` indexes the component's argument list; `position` indexes the
/// collection held there, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArgSlot {
    pub component: ComponentId,
    pub entry: usize,
    pub position: Option<usize>,
}

/// One unresolved name found in the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pending {
    pub slot: ArgSlot,
    pub name: String,
    /// Sequence owning the referring component.
    pub owner: Option<SequenceId>,
    /// Location used in error messages.
    pub container: String,
}

/// Unresolved names grouped by kind, in depth-first order.
#[derive(Debug, Default)]
pub struct Collected {
    pub field_refs: Vec<Pending>,
    pub reference_refs: Vec<Pending>,
    pub function_refs: Vec<Pending>,
    /// Field setters in traversal order.
    pub field_setters: Vec<ComponentId>,
}

/// Gather every unresolved argument of the tree.
pub fn collect_unresolved(spec: &Specification<Raw>) -> Collected {
    let mut collector = Collector::default();
    match accept(spec, &mut collector) {
        Ok(()) => {}
        Err(never) => match never {},
    }
    collector.collected
}

#[derive(Default)]
struct Collector {
    collected: Collected,
}

impl Collector {
    fn scan(&mut self, spec: &Specification<Raw>, id: ComponentId) {
        let component = spec.component(id);
        let container = match component.owner {
            Some(owner) => format!(
                "{} of record sequence '{}'",
                component.describe(),
                spec.sequence(owner).key
            ),
            None => component.describe(),
        };
        for (entry, (_, argument)) in component.arguments.entries().iter().enumerate() {
            match argument {
                Argument::Collection(collection) => {
                    for (position, item) in collection.iter().enumerate() {
                        self.record(item, id, entry, Some(position), component.owner, &container);
                    }
                }
                other => self.record(other, id, entry, None, component.owner, &container),
            }
        }
    }

    fn record(
        &mut self,
        argument: &Argument<Raw>,
        component: ComponentId,
        entry: usize,
        position: Option<usize>,
        owner: Option<SequenceId>,
        container: &str,
    ) {
        let (bucket, link) = match argument {
            Argument::FieldRef(link) => (&mut self.collected.field_refs, link),
            Argument::ReferenceRef(link) => (&mut self.collected.reference_refs, link),
            Argument::FunctionRef(link) => (&mut self.collected.function_refs, link),
            _ => return,
        };
        bucket.push(Pending {
            slot: ArgSlot {
                component,
                entry,
                position,
            },
            name: link.name.clone(),
            owner,
            container: container.to_string(),
        });
    }
}

impl Visitor<Raw> for Collector {
    type Error = Infallible;

    fn pre_visit_node(
        &mut self,
        spec: &Specification<Raw>,
        node: NodeRef<'_, Raw>,
    ) -> Result<(), Self::Error> {
        match node {
            NodeRef::Function(component)
            | NodeRef::EnumSet(component)
            | NodeRef::Component(component) => self.scan(spec, component.id),
            NodeRef::Setter(setter) => {
                if setter.kind == ComponentKind::FieldSetter {
                    self.collected.field_setters.push(setter.id);
                }
                self.scan(spec, setter.id);
            }
            _ => {}
        }
        Ok(())
    }
}
