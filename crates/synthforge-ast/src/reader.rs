//! Reads a prototype document into a `Specification<Raw>`.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use synthforge_core::{CompileError, FieldType, GEN_ID_FIELD, LiteralForm, LiteralType, Result};
use tracing::{debug, info};

use crate::factory::create_kind;
use crate::ids::{ComponentId, FieldId, ReferenceId, SequenceId};
use crate::kinds::{ArgKind, ArgSpec, Category, ElementKind, TypeParam};
use crate::node::{
    Argument, ArgumentCollection, Arguments, Component, Field, Literal, Parameter,
    RecordSequence, RecordType, Reference, SequenceKind, SetterChain, Specification,
};
use crate::phase::{Raw, UnresolvedRef};
use crate::xml::{Element, parse_document};

const ROOT_ELEMENT: &str = "generator_prototype";
const ARGUMENT_ELEMENT: &str = "argument";

/// Read and parse the document at `path`.
pub fn read_specification(path: &Path) -> Result<Specification<Raw>> {
    let text = fs::read_to_string(path)?;
    debug!(path = %path.display(), bytes = text.len(), "read prototype document");
    parse_specification(&text)
}

/// Parse a prototype document held in memory.
pub fn parse_specification(text: &str) -> Result<Specification<Raw>> {
    let root = parse_document(text)?;
    if root.name != ROOT_ELEMENT {
        return Err(CompileError::malformed(format!(
            "root element must be <{ROOT_ELEMENT}>, found <{}>",
            root.name
        )));
    }

    let mut reader = DocumentReader::default();
    if let Some(section) = root.child("parameters") {
        reader.read_parameters(section)?;
    }
    if let Some(section) = root.child("functions") {
        reader.read_functions(section)?;
    }
    if let Some(section) = root.child("enum_sets") {
        reader.read_enum_sets(section)?;
    }
    if let Some(section) = root.child("record_sequences") {
        reader.read_sequences(section)?;
    }

    let spec = reader.spec;
    info!(
        parameters = spec.parameters.len(),
        functions = spec.functions.len(),
        enum_sets = spec.enum_sets.len(),
        sequences = spec.sequences.len(),
        components = spec.components.len(),
        "prototype specification read"
    );
    Ok(spec)
}

/// Builder owning the arena while a document is read.
#[derive(Default)]
struct DocumentReader {
    spec: Specification<Raw>,
}

/// Where a component sits in the tree.
#[derive(Clone, Copy)]
struct Placement {
    parent: Option<ComponentId>,
    owner: Option<SequenceId>,
    order: usize,
}

impl DocumentReader {
    fn read_parameters(&mut self, section: &Element) -> Result<()> {
        for element in section.children_named("parameter") {
            let key = element.required_attr("key", "parameters")?.to_string();
            // An empty value is a valid string parameter; a missing one is not.
            let value = element
                .attr("value")
                .ok_or_else(|| {
                    CompileError::malformed(format!(
                        "missing attribute 'value' on parameter '{key}' in parameters"
                    ))
                })?
                .to_string();
            if self.spec.parameters.contains_key(&key) {
                return Err(duplicate_key("parameter", &key, "parameters"));
            }
            self.spec
                .parameters
                .insert(key.clone(), Parameter { key, value });
        }
        debug!(count = self.spec.parameters.len(), "parameters read");
        Ok(())
    }

    fn read_functions(&mut self, section: &Element) -> Result<()> {
        for element in section.children_named("function") {
            let key = element.required_attr("key", "functions")?.to_string();
            if self.spec.functions.contains_key(&key) {
                return Err(duplicate_key("function", &key, "functions"));
            }
            let type_string = element.required_attr("type", &format!("function '{key}'"))?;
            let id = self.read_component(
                element,
                Category::Function,
                type_string,
                key.clone(),
                Placement {
                    parent: None,
                    owner: None,
                    order: 0,
                },
            )?;
            self.spec.functions.insert(key, id);
        }
        debug!(count = self.spec.functions.len(), "functions read");
        Ok(())
    }

    fn read_enum_sets(&mut self, section: &Element) -> Result<()> {
        for element in section.children_named("enum_set") {
            let key = element.required_attr("key", "enum_sets")?.to_string();
            if self.spec.enum_sets.contains_key(&key) {
                return Err(duplicate_key("enum set", &key, "enum_sets"));
            }
            let id = self.read_component(
                element,
                Category::EnumSet,
                "enum_set",
                key.clone(),
                Placement {
                    parent: None,
                    owner: None,
                    order: 0,
                },
            )?;
            self.spec.enum_sets.insert(key, id);
        }
        debug!(count = self.spec.enum_sets.len(), "enum sets read");
        Ok(())
    }

    fn read_sequences(&mut self, section: &Element) -> Result<()> {
        for element in &section.children {
            let key = element
                .required_attr("key", "record_sequences")?
                .to_string();
            if self.spec.sequence_by_key(&key).is_some() {
                return Err(duplicate_key("record sequence", &key, "record_sequences"));
            }
            let kind = if element.name == "random_sequence" {
                SequenceKind::Random
            } else {
                SequenceKind::Unsupported(element.name.clone())
            };
            self.read_sequence(element, key, kind)?;
        }
        debug!(count = self.spec.sequences.len(), "record sequences read");
        Ok(())
    }

    fn read_sequence(&mut self, element: &Element, key: String, kind: SequenceKind) -> Result<()> {
        let id = SequenceId::from_index(self.spec.sequences.len());
        let container = format!("record sequence '{key}'");
        let supported = kind == SequenceKind::Random;
        self.spec.sequences.push(RecordSequence {
            id,
            key: key.clone(),
            kind,
            record_type: RecordType::default(),
            output_format: None,
            setter_chain: SetterChain::default(),
            cardinality_estimator: None,
            sequence_iterator: None,
        });

        let record_type = match element.child("record_type") {
            Some(record_type) => self.read_record_type(record_type, id, &key)?,
            None if supported => {
                return Err(CompileError::malformed(format!(
                    "missing <record_type> in {container}"
                )));
            }
            None => self.read_record_type(&Element::default(), id, &key)?,
        };
        self.spec.sequences[id.index()].record_type = record_type;

        if !supported {
            debug!(sequence = %key, "kept unsupported record sequence for reference lookup");
            return Ok(());
        }

        let owned = |order| Placement {
            parent: None,
            owner: Some(id),
            order,
        };

        let output_format = match element.child("output_format") {
            Some(format) => {
                let type_string = format.required_attr("type", &container)?;
                Some(self.read_component(
                    format,
                    Category::OutputFormat,
                    type_string,
                    "output_format".to_string(),
                    owned(0),
                )?)
            }
            None => None,
        };

        let mut setters = Vec::new();
        if let Some(chain) = element.child("setter_chain") {
            let mut keys = BTreeSet::new();
            for (order, setter) in chain.children_named("setter").enumerate() {
                let setter_key = setter.required_attr("key", &container)?.to_string();
                if !keys.insert(setter_key.clone()) {
                    return Err(duplicate_key("setter", &setter_key, &container));
                }
                let type_string = setter.required_attr("type", &container)?;
                setters.push(self.read_component(
                    setter,
                    Category::Setter,
                    type_string,
                    setter_key,
                    owned(order),
                )?);
            }
        }

        let estimator = element.child("cardinality_estimator").ok_or_else(|| {
            CompileError::malformed(format!("missing <cardinality_estimator> in {container}"))
        })?;
        let estimator_type = estimator.required_attr("type", &container)?;
        let cardinality_estimator = self.read_component(
            estimator,
            Category::CardinalityEstimator,
            estimator_type,
            "cardinality_estimator".to_string(),
            owned(0),
        )?;

        let sequence_iterator = match element.child("sequence_iterator") {
            Some(iterator) => {
                let type_string = iterator.required_attr("type", &container)?;
                Some(self.read_component(
                    iterator,
                    Category::SequenceIterator,
                    type_string,
                    "sequence_iterator".to_string(),
                    owned(0),
                )?)
            }
            None => None,
        };

        let sequence = &mut self.spec.sequences[id.index()];
        sequence.output_format = output_format;
        sequence.setter_chain = SetterChain { setters };
        sequence.cardinality_estimator = Some(cardinality_estimator);
        sequence.sequence_iterator = sequence_iterator;
        debug!(
            sequence = %key,
            fields = sequence.record_type.fields.len(),
            references = sequence.record_type.references.len(),
            setters = sequence.setter_chain.setters.len(),
            "record sequence read"
        );
        Ok(())
    }

    fn read_record_type(
        &mut self,
        element: &Element,
        owner: SequenceId,
        key: &str,
    ) -> Result<RecordType> {
        let container = format!("record type '{key}'");
        let mut names = BTreeSet::from([GEN_ID_FIELD.to_string()]);
        let mut record_type = RecordType::default();

        record_type.fields.push(self.push_field(Field {
            id: FieldId::from_index(0),
            owner,
            name: GEN_ID_FIELD.to_string(),
            field_type: FieldType::Scalar(LiteralType::I64u),
            order: 0,
            implicit: true,
            derived: false,
            enum_set: None,
            setter: None,
        }));

        for field in element.children_named("field") {
            let name = field.required_attr("name", &container)?.to_string();
            if !names.insert(name.clone()) {
                return Err(duplicate_key("field", &name, &container));
            }
            let field_type: FieldType = field.required_attr("type", &container)?.parse()?;
            let derived = match field.attr("derived").map(str::trim) {
                None | Some("false") | Some("0") => false,
                Some("true") | Some("1") => true,
                Some(other) => {
                    return Err(CompileError::malformed(format!(
                        "field '{name}' in {container} has invalid derived flag '{other}'"
                    )));
                }
            };
            let enum_set = if field_type.is_enum() {
                let enumref = field.required_attr("enumref", &container)?;
                if !self.spec.enum_sets.contains_key(enumref) {
                    return Err(CompileError::unresolved(
                        "enum set", enumref, enumref, &container,
                    ));
                }
                Some(enumref.to_string())
            } else {
                None
            };
            let order = record_type.fields.len();
            record_type.fields.push(self.push_field(Field {
                id: FieldId::from_index(0),
                owner,
                name,
                field_type,
                order,
                implicit: false,
                derived,
                enum_set,
                setter: None,
            }));
        }

        for reference in element.children_named("reference") {
            let name = reference.required_attr("name", &container)?.to_string();
            if !names.insert(name.clone()) {
                return Err(duplicate_key("reference", &name, &container));
            }
            let target = reference.required_attr("type", &container)?;
            let id = ReferenceId::from_index(self.spec.references.len());
            self.spec.references.push(Reference {
                id,
                owner,
                name,
                order: record_type.references.len(),
                target: UnresolvedRef::new(target),
            });
            record_type.references.push(id);
        }

        Ok(record_type)
    }

    fn push_field(&mut self, mut field: Field) -> FieldId {
        let id = FieldId::from_index(self.spec.fields.len());
        field.id = id;
        self.spec.fields.push(field);
        id
    }

    /// Dispatch `type_string`, allocate the component, then read its
    /// arguments. Ids are allocated in preorder.
    fn read_component(
        &mut self,
        element: &Element,
        category: Category,
        type_string: &str,
        key: String,
        placement: Placement,
    ) -> Result<ComponentId> {
        let found = create_kind(category, type_string)?;
        let id = ComponentId::from_index(self.spec.components.len());
        self.spec.components.push(Component {
            id,
            key: key.clone(),
            kind: found.kind,
            attributes: found.attributes,
            arguments: Arguments::default(),
            parent: placement.parent,
            owner: placement.owner,
            order: placement.order,
        });

        let container = format!("{} '{key}'", found.kind.spec().name);
        let arguments = self.read_arguments(
            element,
            found.kind.spec().args,
            &container,
            id,
            placement.owner,
        )?;
        check_sized_collections(&self.spec.components[id.index()], &arguments)?;
        self.spec.components[id.index()].arguments = arguments;
        Ok(id)
    }

    fn read_arguments(
        &mut self,
        element: &Element,
        schema: &'static [ArgSpec],
        container: &str,
        id: ComponentId,
        owner: Option<SequenceId>,
    ) -> Result<Arguments<Raw>> {
        let supplied: Vec<&Element> = element.children_named(ARGUMENT_ELEMENT).collect();
        for argument in &supplied {
            let key = argument.required_attr("key", container)?;
            if !schema.iter().any(|entry| entry.key == key) {
                return Err(CompileError::malformed(format!(
                    "unknown argument '{key}' in {container}"
                )));
            }
        }

        let mut arguments = Arguments::default();
        for entry in schema {
            let matches: Vec<&Element> = supplied
                .iter()
                .copied()
                .filter(|argument| argument.attr("key").map(str::trim) == Some(entry.key))
                .collect();

            match entry.kind {
                ArgKind::Single(element_kind) => match matches.as_slice() {
                    [] => {
                        if let Some((value_type, value)) = entry.default {
                            let literal = literal(value_type, value, entry.key, container)?;
                            arguments.push(entry.key, Argument::Literal(literal));
                        } else if !entry.optional {
                            return Err(CompileError::malformed(format!(
                                "missing required argument '{}' ({}) in {container}",
                                entry.key, entry.kind
                            )));
                        }
                    }
                    [single] => {
                        let value = self.read_argument(
                            single,
                            element_kind,
                            entry.key,
                            container,
                            id,
                            owner,
                        )?;
                        arguments.push(entry.key, value);
                    }
                    _ => {
                        return Err(CompileError::DuplicateArgument {
                            container: container.to_string(),
                            key: entry.key.to_string(),
                        });
                    }
                },
                ArgKind::Collection(element_kind) => {
                    if matches.is_empty() {
                        if entry.optional {
                            continue;
                        }
                        return Err(CompileError::malformed(format!(
                            "missing required argument '{}' ({}) in {container}",
                            entry.key, entry.kind
                        )));
                    }
                    let mut items = Vec::with_capacity(matches.len());
                    for member in matches {
                        items.push(self.read_argument(
                            member,
                            element_kind,
                            entry.key,
                            container,
                            id,
                            owner,
                        )?);
                    }
                    arguments.push(
                        entry.key,
                        Argument::Collection(ArgumentCollection::new(items)),
                    );
                }
            }
        }
        Ok(arguments)
    }

    fn read_argument(
        &mut self,
        element: &Element,
        kind: ElementKind,
        key: &str,
        container: &str,
        parent: ComponentId,
        owner: Option<SequenceId>,
    ) -> Result<Argument<Raw>> {
        match kind {
            ElementKind::Literal => {
                let value_type: LiteralType = element.required_attr("type", container)?.parse()?;
                let raw = element.attr("value").ok_or_else(|| {
                    CompileError::malformed(format!(
                        "literal argument '{key}' in {container} has no value"
                    ))
                })?;
                Ok(Argument::Literal(literal(value_type, raw, key, container)?))
            }
            ElementKind::FieldRef => Ok(Argument::FieldRef(unresolved(element, container)?)),
            ElementKind::ReferenceRef => {
                Ok(Argument::ReferenceRef(unresolved(element, container)?))
            }
            ElementKind::FunctionRef => Ok(Argument::FunctionRef(unresolved(element, container)?)),
            ElementKind::ValueProvider
            | ElementKind::RangeProvider
            | ElementKind::ReferenceProvider
            | ElementKind::PredicateProvider
            | ElementKind::Binder => {
                let category = kind.category().ok_or_else(|| {
                    CompileError::malformed(format!("argument '{key}' is not a component"))
                })?;
                let type_string = element.required_attr("type", container)?;
                let child = self.read_component(
                    element,
                    category,
                    type_string,
                    key.to_string(),
                    Placement {
                        parent: Some(parent),
                        owner,
                        order: 0,
                    },
                )?;
                Ok(Argument::Component(child))
            }
        }
    }
}

fn literal(value_type: LiteralType, raw: &str, key: &str, container: &str) -> Result<Literal> {
    let form = LiteralForm::parse(value_type, raw).map_err(|reason| {
        CompileError::malformed(format!("argument '{key}' in {container}: {reason}"))
    })?;
    Ok(Literal {
        value_type,
        raw: raw.to_string(),
        form,
    })
}

fn unresolved(element: &Element, container: &str) -> Result<UnresolvedRef> {
    Ok(UnresolvedRef::new(element.required_attr("ref", container)?))
}

fn duplicate_key(what: &str, key: &str, container: &str) -> CompileError {
    CompileError::malformed(format!("duplicate {what} key '{key}' in {container}"))
}

/// A `[T;N]` kind must receive exactly `N` items in each collection argument.
fn check_sized_collections(component: &Component<Raw>, arguments: &Arguments<Raw>) -> Result<()> {
    for param in component.kind.spec().params {
        let TypeParam::Size(name) = param else {
            continue;
        };
        let Some(size) = component.size_param(name) else {
            continue;
        };
        for (key, argument) in arguments.entries() {
            let Argument::Collection(items) = argument else {
                continue;
            };
            if items.len() != size {
                return Err(CompileError::malformed(format!(
                    "{} declares {name} {size} but argument '{key}' has {} items",
                    component.describe(),
                    items.len()
                )));
            }
        }
    }
    Ok(())
}
