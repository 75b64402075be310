//! Minimal element tree over `quick-xml` events.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use synthforge_core::{CompileError, Result};

/// An XML element with local names and unescaped attribute values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Element>,
}

impl Element {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Attribute that must be present and non-blank.
    pub fn required_attr(&self, name: &str, container: &str) -> Result<&str> {
        match self.attr(name) {
            Some(value) if !value.trim().is_empty() => Ok(value.trim()),
            Some(_) => Err(CompileError::malformed(format!(
                "attribute '{name}' of <{}> in {container} is empty",
                self.name
            ))),
            None => Err(CompileError::malformed(format!(
                "missing attribute '{name}' on <{}> in {container}",
                self.name
            ))),
        }
    }

    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|child| child.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter(move |child| child.name == name)
    }
}

/// Parse a document into its root element.
pub fn parse_document(text: &str) -> Result<Element> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) => stack.push(element_from(&start)?),
            Ok(Event::Empty(start)) => {
                let element = element_from(&start)?;
                attach(&mut stack, &mut root, element)?;
            }
            Ok(Event::End(_)) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| CompileError::malformed("unbalanced closing tag"))?;
                attach(&mut stack, &mut root, element)?;
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => {
                return Err(CompileError::malformed(format!(
                    "xml error at byte {}: {err}",
                    reader.buffer_position()
                )));
            }
        }
    }

    if !stack.is_empty() {
        return Err(CompileError::malformed("unexpected end of document"));
    }
    root.ok_or_else(|| CompileError::malformed("document has no root element"))
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => {
            return Err(CompileError::malformed(format!(
                "unexpected second root element <{}>",
                element.name
            )));
        }
    }
    Ok(())
}

fn element_from(start: &BytesStart<'_>) -> Result<Element> {
    let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|err| {
            CompileError::malformed(format!("bad attribute on <{name}>: {err}"))
        })?;
        if attr.key.as_ref().starts_with(b"xmlns") {
            continue;
        }
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|err| {
                CompileError::malformed(format!("bad value for '{key}' on <{name}>: {err}"))
            })?
            .into_owned();
        attributes.push((key, value));
    }
    Ok(Element {
        name,
        attributes,
        children: Vec::new(),
    })
}
