//! Markup event model.
//!
//! Parsers in this crate work over a fully buffered list of owned
//! [`XmlEvent`]s rather than over a live XML reader, so that every structure
//! built from them can keep copies of the original markup after the stream is
//! consumed.

mod cursor;
pub mod names;
mod reader;
mod writer;

use std::fmt;

pub use cursor::EventCursor;
pub use reader::{decode_part, read_events};
pub use writer::{write_events, write_events_to};

/// The `xml` namespace, bound implicitly to the `xml` prefix.
pub const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// A qualified name with its resolved namespace.
///
/// Two names are the same element when their namespace and local name match;
/// the prefix only matters for serialisation.
#[derive(Debug, Clone, Eq)]
pub struct QName {
    pub prefix: Option<String>,
    pub local: String,
    pub namespace: Option<String>,
}

impl QName {
    pub fn new(prefix: Option<&str>, local: impl Into<String>, namespace: Option<&str>) -> Self {
        Self {
            prefix: prefix.map(str::to_string),
            local: local.into(),
            namespace: namespace.map(str::to_string),
        }
    }

    /// Unprefixed, namespace-less name (plain attributes).
    pub fn local(local: impl Into<String>) -> Self {
        Self {
            prefix: None,
            local: local.into(),
            namespace: None,
        }
    }

    /// Build a name in the same namespace and with the same prefix as `self`.
    pub fn sibling(&self, local: &str) -> Self {
        Self {
            prefix: self.prefix.clone(),
            local: local.to_string(),
            namespace: self.namespace.clone(),
        }
    }

    /// Check namespace and local name.
    pub fn is(&self, namespace: &str, local: &str) -> bool {
        self.local == local && self.namespace.as_deref() == Some(namespace)
    }

    pub fn in_namespace(&self, namespace: &str) -> bool {
        self.namespace.as_deref() == Some(namespace)
    }

    /// The name as written in markup (`w:t`).
    pub fn qualified(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{prefix}:{}", self.local),
            None => self.local.clone(),
        }
    }
}

impl PartialEq for QName {
    fn eq(&self, other: &Self) -> bool {
        self.local == other.local && self.namespace == other.namespace
    }
}

impl std::hash::Hash for QName {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.local.hash(state);
        self.namespace.hash(state);
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.prefix {
            Some(prefix) => write!(f, "{prefix}:{}", self.local),
            None => f.write_str(&self.local),
        }
    }
}

/// An attribute in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: QName,
    pub value: String,
}

impl Attribute {
    pub fn new(name: QName, value: impl Into<String>) -> Self {
        Self {
            name,
            value: value.into(),
        }
    }

    /// Namespace declarations (`xmlns`, `xmlns:w`) travel as attributes.
    pub fn is_namespace_declaration(&self) -> bool {
        self.name.prefix.as_deref() == Some("xmlns")
            || (self.name.prefix.is_none() && self.name.local == "xmlns")
    }
}

/// An element start tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartElement {
    pub name: QName,
    pub attributes: Vec<Attribute>,
}

impl StartElement {
    pub fn new(name: QName) -> Self {
        Self {
            name,
            attributes: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, name: QName, value: impl Into<String>) -> Self {
        self.attributes.push(Attribute::new(name, value));
        self
    }

    /// Look up an attribute by local name, in any namespace.
    pub fn attribute(&self, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name.local == local && !a.is_namespace_declaration())
            .map(|a| a.value.as_str())
    }

    pub fn attribute_ns(&self, namespace: &str, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name.is(namespace, local))
            .map(|a| a.value.as_str())
    }

    pub fn set_attribute(&mut self, name: QName, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|a| a.name == name) {
            Some(existing) => existing.value = value,
            None => self.attributes.push(Attribute::new(name, value)),
        }
    }

    pub fn remove_attribute(&mut self, local: &str) {
        self.attributes.retain(|a| a.name.local != local);
    }

    pub fn end(&self) -> EndElement {
        EndElement {
            name: self.name.clone(),
        }
    }
}

/// An element end tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndElement {
    pub name: QName,
}

/// One item of the markup event stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlEvent {
    Start(StartElement),
    End(EndElement),
    Characters(String),
    /// Declarations, comments and processing instructions, kept verbatim.
    Raw(String),
}

impl XmlEvent {
    pub fn start_name(&self) -> Option<&QName> {
        match self {
            XmlEvent::Start(start) => Some(&start.name),
            _ => None,
        }
    }

    pub fn end_name(&self) -> Option<&QName> {
        match self {
            XmlEvent::End(end) => Some(&end.name),
            _ => None,
        }
    }

    pub fn is_start_of(&self, namespace: &str, local: &str) -> bool {
        self.start_name().is_some_and(|n| n.is(namespace, local))
    }

    pub fn is_end_of(&self, namespace: &str, local: &str) -> bool {
        self.end_name().is_some_and(|n| n.is(namespace, local))
    }

    /// Character data consisting only of XML whitespace.
    pub fn is_whitespace(&self) -> bool {
        match self {
            XmlEvent::Characters(text) => text.chars().all(is_xml_whitespace),
            _ => false,
        }
    }
}

/// XML whitespace: space, tab, carriage return, line feed.
pub fn is_xml_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

/// Extract the concatenated character data of an event slice.
pub fn text_content(events: &[XmlEvent]) -> String {
    events
        .iter()
        .filter_map(|e| match e {
            XmlEvent::Characters(text) => Some(text.as_str()),
            _ => None,
        })
        .collect()
}
