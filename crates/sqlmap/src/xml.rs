//! The element tree read from mapping markup.

use indexmap::IndexMap;
use quick_xml::{
    events::{BytesStart, Event},
    Reader,
};
use sqlmap_core::{
    parsing::{substitute_variables, DefaultValue},
    Error, Result,
};
use std::str::FromStr;

/// Variables substituted into attribute values and text while reading.
#[derive(Debug, Clone)]
pub struct Variables<'a> {
    pub values: &'a IndexMap<String, String>,
    pub default_value: DefaultValue<'a>,
}

impl Variables<'_> {
    pub fn substitute(&self, text: &str) -> String {
        substitute_variables(text, self.values, &self.default_value)
    }
}

/// One child of an element.
#[derive(Debug, Clone, PartialEq)]
pub enum XContent {
    Element(XNode),

    /// Character data, CDATA sections included.
    Text(String),
}

/// An element with its attributes and children.
#[derive(Debug, Clone, PartialEq)]
pub struct XNode {
    name: String,
    attributes: IndexMap<String, String>,
    children: Vec<XContent>,

    /// Path of element names from the root, each qualified by its `id`,
    /// `value` or `property` attribute, e.g.
    /// `mapper_resultMap[blog]_association[author]`.
    identifier: String,
}

impl XNode {
    /// Reads a document and returns its root element.
    pub fn parse(text: &str, variables: &Variables<'_>) -> Result<XNode> {
        let mut reader = Reader::from_str(text);
        reader.trim_text(false);

        let mut stack: Vec<XNode> = vec![];
        let mut root = None;

        loop {
            let event = reader.read_event().map_err(|err| {
                Error::parse(format!(
                    "malformed markup at position {}: {err}",
                    reader.buffer_position()
                ))
            })?;

            match event {
                Event::Start(start) => {
                    let node = XNode::open(&start, stack.last(), variables)?;
                    stack.push(node);
                }
                Event::Empty(start) => {
                    let node = XNode::open(&start, stack.last(), variables)?;
                    close(node, &mut stack, &mut root)?;
                }
                Event::End(_) => {
                    let Some(node) = stack.pop() else {
                        return Err(Error::parse("unexpected closing tag"));
                    };
                    close(node, &mut stack, &mut root)?;
                }
                Event::Text(text) => {
                    if let Some(parent) = stack.last_mut() {
                        let text = text
                            .unescape()
                            .map_err(|err| Error::parse(format!("malformed text: {err}")))?;
                        parent.children.push(XContent::Text(variables.substitute(&text)));
                    }
                }
                Event::CData(data) => {
                    if let Some(parent) = stack.last_mut() {
                        let text = String::from_utf8(data.into_inner().into_owned())
                            .map_err(|err| Error::parse(format!("malformed CDATA section: {err}")))?;
                        parent.children.push(XContent::Text(variables.substitute(&text)));
                    }
                }
                Event::Eof => break,
                // Declarations, comments, processing instructions, doctypes
                _ => {}
            }
        }

        if let Some(open) = stack.last() {
            return Err(Error::parse(format!("element <{}> is never closed", open.name)));
        }

        root.ok_or_else(|| Error::parse("the document has no root element"))
    }

    fn open(start: &BytesStart<'_>, parent: Option<&XNode>, variables: &Variables<'_>) -> Result<XNode> {
        let name = utf8(start.name().as_ref())?.to_string();

        let mut attributes = IndexMap::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|err| {
                Error::parse(format!("malformed attribute on <{name}>: {err}"))
            })?;
            let key = utf8(attr.key.as_ref())?.to_string();
            let value = attr.unescape_value().map_err(|err| {
                Error::parse(format!("malformed value for attribute '{key}' on <{name}>: {err}"))
            })?;
            attributes.insert(key, variables.substitute(&value));
        }

        let mut identifier = String::new();
        if let Some(parent) = parent {
            identifier.push_str(&parent.identifier);
            identifier.push('_');
        }
        identifier.push_str(&name);

        let qualifier = ["id", "value", "property"]
            .iter()
            .find_map(|key| attributes.get(*key));
        if let Some(qualifier) = qualifier {
            identifier.push('[');
            identifier.push_str(&qualifier.replace('.', "_"));
            identifier.push(']');
        }

        Ok(XNode {
            name,
            attributes,
            children: vec![],
            identifier,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Like [`attr`](Self::attr), but a missing attribute is an error.
    pub fn required(&self, name: &str) -> Result<&str> {
        self.attr(name).ok_or_else(|| {
            Error::invalid_mapping(format!(
                "<{}> requires a '{name}' attribute",
                self.name
            ))
        })
    }

    pub fn bool_attr(&self, name: &str) -> Result<Option<bool>> {
        self.parse_attr(name)
    }

    pub fn parse_attr<T: FromStr>(&self, name: &str) -> Result<Option<T>> {
        let Some(value) = self.attr(name) else {
            return Ok(None);
        };

        value.trim().parse().map(Some).map_err(|_| {
            Error::invalid_mapping(format!(
                "invalid value '{value}' for attribute '{name}' on <{}>",
                self.name
            ))
        })
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn children(&self) -> &[XContent] {
        &self.children
    }

    pub fn into_children(self) -> Vec<XContent> {
        self.children
    }

    /// Child elements, skipping text.
    pub fn elements(&self) -> impl Iterator<Item = &XNode> {
        self.children.iter().filter_map(|child| match child {
            XContent::Element(node) => Some(node),
            XContent::Text(_) => None,
        })
    }

    pub fn elements_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XNode> {
        self.elements().filter(move |node| node.name == name)
    }

    pub fn element(&self, name: &str) -> Option<&XNode> {
        self.elements().find(|node| node.name == name)
    }

    /// The concatenated text of the direct children.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|child| match child {
                XContent::Text(text) => Some(text.as_str()),
                XContent::Element(_) => None,
            })
            .collect()
    }

    pub fn value_based_identifier(&self) -> &str {
        &self.identifier
    }

    /// `name`/`value` pairs of the `<property>` children.
    pub fn children_as_properties(&self) -> Result<IndexMap<String, String>> {
        self.elements_named("property")
            .map(|node| Ok((node.required("name")?.to_string(), node.required("value")?.to_string())))
            .collect()
    }

    /// A copy with the same name and attributes and the given children.
    pub fn with_children(&self, children: Vec<XContent>) -> XNode {
        XNode {
            name: self.name.clone(),
            attributes: self.attributes.clone(),
            children,
            identifier: self.identifier.clone(),
        }
    }
}

fn close(node: XNode, stack: &mut [XNode], root: &mut Option<XNode>) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(XContent::Element(node)),
        None if root.is_none() => *root = Some(node),
        None => return Err(Error::parse("the document has more than one root element")),
    }
    Ok(())
}

fn utf8(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|err| Error::parse(format!("markup is not valid UTF-8: {err}")))
}
