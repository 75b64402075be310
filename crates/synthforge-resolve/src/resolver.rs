use std::collections::HashMap;

use synthforge_ast::{
    Argument, ArgumentCollection, Arguments, Component, ComponentId, Raw, Reference, Resolved,
    ResolvedFieldRef, ResolvedReferenceRef, SequenceId, Specification,
};
use synthforge_core::{CompileError, GEN_ID_FIELD, Result};
use tracing::{debug, info, warn};

use crate::collect::{ArgSlot, Collected, Pending, collect_unresolved};
use crate::paths::{resolve_field_path, resolve_reference_path};

/// Number of links bound by each pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveSummary {
    pub record_references: usize,
    pub field_refs: usize,
    pub reference_refs: usize,
    pub function_refs: usize,
    pub setter_links: usize,
}

impl ResolveSummary {
    pub fn total(&self) -> usize {
        self.record_references
            + self.field_refs
            + self.reference_refs
            + self.function_refs
            + self.setter_links
    }
}

fn check_partition(
    sequence: &str,
    what: &str,
    orders: impl Iterator<Item = usize>,
) -> Result<()> {
    let mut orders: Vec<usize> = orders.collect();
    orders.sort_unstable();
    let complete = orders.iter().enumerate().all(|(index, order)| index == *order);
    if !complete {
        return Err(CompileError::malformed(format!(
            "{what} order keys of sequence '{sequence}' do not form 0..{}: {orders:?}",
            orders.len()
        )));
    }
    Ok(())
}

/// Resolve every link of `spec`.
pub fn resolve(spec: Specification<Raw>) -> Result<Specification<Resolved>> {
    Resolver::new(spec).run().map(|(resolved, _)| resolved)
}

/// Resolution context: the raw tree plus the bindings produced so far.
pub struct Resolver {
    spec: Specification<Raw>,
    targets: Vec<SequenceId>,
    fields: HashMap<ArgSlot, ResolvedFieldRef>,
    references: HashMap<ArgSlot, ResolvedReferenceRef>,
    functions: HashMap<ArgSlot, ComponentId>,
    summary: ResolveSummary,
}

impl Resolver {
    pub fn new(spec: Specification<Raw>) -> Self {
        Self {
            spec,
            targets: Vec::new(),
            fields: HashMap::new(),
            references: HashMap::new(),
            functions: HashMap::new(),
            summary: ResolveSummary::default(),
        }
    }

    /// Run all passes in order and build the resolved tree.
    pub fn run(mut self) -> Result<(Specification<Resolved>, ResolveSummary)> {
        let collected = collect_unresolved(&self.spec);

        self.resolve_record_references()?;
        debug!(
            pass = "record_references",
            bindings = self.summary.record_references,
            "resolver pass done"
        );
        self.resolve_field_refs(&collected.field_refs)?;
        debug!(
            pass = "field_refs",
            bindings = self.summary.field_refs,
            "resolver pass done"
        );
        self.resolve_reference_refs(&collected.reference_refs)?;
        debug!(
            pass = "reference_refs",
            bindings = self.summary.reference_refs,
            "resolver pass done"
        );
        self.resolve_function_refs(&collected.function_refs)?;
        debug!(
            pass = "function_refs",
            bindings = self.summary.function_refs,
            "resolver pass done"
        );
        self.link_setters(&collected)?;
        debug!(
            pass = "setter_links",
            bindings = self.summary.setter_links,
            "resolver pass done"
        );
        self.check_order_keys()?;
        debug!(
            pass = "order_keys",
            sequences = self.spec.sequences.len(),
            "resolver pass done"
        );

        let summary = self.summary;
        info!(bindings = summary.total(), "references resolved");
        Ok((self.into_resolved()?, summary))
    }

    fn resolve_record_references(&mut self) -> Result<()> {
        let mut targets = Vec::with_capacity(self.spec.references.len());
        for reference in &self.spec.references {
            let owner = &self.spec.sequence(reference.owner).key;
            let target = self
                .spec
                .sequence_by_key(&reference.target.name)
                .ok_or_else(|| {
                    CompileError::unresolved(
                        "record",
                        &reference.target.name,
                        &reference.target.name,
                        format!("reference '{}' of record type '{owner}'", reference.name),
                    )
                })?;
            targets.push(target.id);
        }
        self.summary.record_references = targets.len();
        self.targets = targets;
        Ok(())
    }

    fn resolve_field_refs(&mut self, pending: &[Pending]) -> Result<()> {
        for item in pending {
            let resolved = resolve_field_path(
                &self.spec,
                &self.targets,
                &item.name,
                item.owner,
                &item.container,
            )?;
            self.fields.insert(item.slot, resolved);
        }
        self.summary.field_refs = self.fields.len();
        Ok(())
    }

    fn resolve_reference_refs(&mut self, pending: &[Pending]) -> Result<()> {
        for item in pending {
            let resolved =
                resolve_reference_path(&self.spec, &item.name, item.owner, &item.container)?;
            self.references.insert(item.slot, resolved);
        }
        self.summary.reference_refs = self.references.len();
        Ok(())
    }

    fn resolve_function_refs(&mut self, pending: &[Pending]) -> Result<()> {
        for item in pending {
            let function = self.spec.functions.get(&item.name).copied().ok_or_else(|| {
                CompileError::unresolved("function", &item.name, &item.name, &item.container)
            })?;
            self.functions.insert(item.slot, function);
        }
        self.summary.function_refs = self.functions.len();
        Ok(())
    }

    /// Install every field setter on its target field; the last one wins.
    fn link_setters(&mut self, collected: &Collected) -> Result<()> {
        for &setter_id in &collected.field_setters {
            let setter = self.spec.component(setter_id);
            let container = setter.describe();
            let entry = setter
                .arguments
                .entries()
                .iter()
                .position(|(key, _)| key == "field")
                .ok_or_else(|| {
                    CompileError::malformed(format!("{container} has no field argument"))
                })?;
            let slot = ArgSlot {
                component: setter_id,
                entry,
                position: None,
            };
            let target = self.fields.get(&slot).ok_or_else(|| {
                CompileError::malformed(format!("field argument of {container} is unbound"))
            })?;

            let field = self.spec.field(target.field);
            if !target.is_direct() || Some(field.owner) != setter.owner {
                return Err(CompileError::SetterTarget {
                    container,
                    field: target.path.clone(),
                    reason: "a field setter must target a field of its own record type"
                        .to_string(),
                });
            }
            if field.implicit {
                return Err(CompileError::SetterTarget {
                    container,
                    field: target.path.clone(),
                    reason: "implicit fields are assigned by the runtime".to_string(),
                });
            }
            if field.derived {
                return Err(CompileError::SetterTarget {
                    container,
                    field: target.path.clone(),
                    reason: "derived fields have no stored value".to_string(),
                });
            }
            if let Some(previous) = field.setter {
                warn!(
                    event = "duplicate_field_setter",
                    field = %field.name,
                    previous = %self.spec.component(previous).key,
                    setter = %setter.key,
                    "field already has a setter; the later setter replaces it"
                );
            }

            let field_id = target.field;
            self.spec.fields[field_id.index()].setter = Some(setter_id);
            self.summary.setter_links += 1;
        }
        Ok(())
    }

    /// Fields, references and setters of each sequence are keyed `0..n`,
    /// with the implicit id field at 0.
    fn check_order_keys(&self) -> Result<()> {
        for sequence in &self.spec.sequences {
            let record_type = &sequence.record_type;
            let fields = record_type.fields.iter().map(|id| self.spec.field(*id).order);
            check_partition(&sequence.key, "field", fields)?;
            let references = record_type
                .references
                .iter()
                .map(|id| self.spec.reference(*id).order);
            check_partition(&sequence.key, "reference", references)?;
            let setters = sequence
                .setter_chain
                .setters
                .iter()
                .map(|id| self.spec.component(*id).order);
            check_partition(&sequence.key, "setter", setters)?;

            let first = record_type
                .fields
                .iter()
                .map(|id| self.spec.field(*id))
                .find(|field| field.order == 0);
            let gen_id_first =
                first.is_some_and(|field| field.implicit && field.name == GEN_ID_FIELD);
            if !gen_id_first {
                return Err(CompileError::malformed(format!(
                    "record type of sequence '{}' must start with '{GEN_ID_FIELD}'",
                    sequence.key
                )));
            }
        }
        Ok(())
    }

    fn into_resolved(self) -> Result<Specification<Resolved>> {
        let Resolver {
            spec,
            targets,
            fields,
            references,
            functions,
            ..
        } = self;
        let bindings = Bindings {
            fields,
            references,
            functions,
        };

        let resolved_references = spec
            .references
            .into_iter()
            .zip(targets)
            .map(|(reference, target)| Reference {
                id: reference.id,
                owner: reference.owner,
                name: reference.name,
                order: reference.order,
                target,
            })
            .collect();

        let components = spec
            .components
            .into_iter()
            .map(|component| bindings.component(component))
            .collect::<Result<Vec<_>>>()?;

        Ok(Specification {
            parameters: spec.parameters,
            functions: spec.functions,
            enum_sets: spec.enum_sets,
            sequences: spec.sequences,
            fields: spec.fields,
            references: resolved_references,
            components,
        })
    }
}

struct Bindings {
    fields: HashMap<ArgSlot, ResolvedFieldRef>,
    references: HashMap<ArgSlot, ResolvedReferenceRef>,
    functions: HashMap<ArgSlot, ComponentId>,
}

impl Bindings {
    fn component(&self, component: Component<Raw>) -> Result<Component<Resolved>> {
        let id = component.id;
        let container = component.describe();
        let arguments = component
            .arguments
            .into_entries()
            .into_iter()
            .enumerate()
            .map(|(entry, (key, argument))| {
                let argument = match argument {
                    Argument::Collection(collection) => {
                        let items = collection
                            .into_items()
                            .into_iter()
                            .enumerate()
                            .map(|(position, item)| {
                                let slot = ArgSlot {
                                    component: id,
                                    entry,
                                    position: Some(position),
                                };
                                self.argument(item, slot, &container)
                            })
                            .collect::<Result<Vec<_>>>()?;
                        Argument::Collection(ArgumentCollection::new(items))
                    }
                    other => {
                        let slot = ArgSlot {
                            component: id,
                            entry,
                            position: None,
                        };
                        self.argument(other, slot, &container)?
                    }
                };
                Ok((key, argument))
            })
            .collect::<Result<Arguments<Resolved>>>()?;

        Ok(Component {
            id,
            key: component.key,
            kind: component.kind,
            attributes: component.attributes,
            arguments,
            parent: component.parent,
            owner: component.owner,
            order: component.order,
        })
    }

    fn argument(
        &self,
        argument: Argument<Raw>,
        slot: ArgSlot,
        container: &str,
    ) -> Result<Argument<Resolved>> {
        let missing =
            |kind: &str, name: &str| CompileError::unresolved(kind, name, name, container);
        Ok(match argument {
            Argument::Literal(literal) => Argument::Literal(literal),
            Argument::Component(child) => Argument::Component(child),
            Argument::FieldRef(link) => Argument::FieldRef(
                self.fields
                    .get(&slot)
                    .cloned()
                    .ok_or_else(|| missing("field", &link.name))?,
            ),
            Argument::ReferenceRef(link) => Argument::ReferenceRef(
                self.references
                    .get(&slot)
                    .cloned()
                    .ok_or_else(|| missing("reference", &link.name))?,
            ),
            Argument::FunctionRef(link) => Argument::FunctionRef(
                self.functions
                    .get(&slot)
                    .copied()
                    .ok_or_else(|| missing("function", &link.name))?,
            ),
            Argument::Collection(_) => {
                return Err(CompileError::malformed(format!(
                    "nested argument collection in {container}"
                )));
            }
        })
    }
}
