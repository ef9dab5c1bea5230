//! Opaque structural markup.

use crate::xml::{EndElement, StartElement, XmlEvent};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkupComponent {
    Start(StartElement),
    End(EndElement),
    /// An element with no content, written as `<x/>`.
    Empty(StartElement),
    /// Passthrough events: whole subtrees, declarations, comments.
    General(Vec<XmlEvent>),
}

impl MarkupComponent {
    pub fn write_to(&self, out: &mut Vec<XmlEvent>) {
        match self {
            MarkupComponent::Start(start) => out.push(XmlEvent::Start(start.clone())),
            MarkupComponent::End(end) => out.push(XmlEvent::End(end.clone())),
            MarkupComponent::Empty(start) => {
                out.push(XmlEvent::Start(start.clone()));
                out.push(XmlEvent::End(start.end()));
            }
            MarkupComponent::General(events) => out.extend(events.iter().cloned()),
        }
    }
}

/// An ordered list of markup components.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Markup {
    components: Vec<MarkupComponent>,
}

impl Markup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_events(events: Vec<XmlEvent>) -> Self {
        let mut markup = Self::new();
        markup.push_events(events);
        markup
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn components(&self) -> &[MarkupComponent] {
        &self.components
    }

    pub fn push(&mut self, component: MarkupComponent) {
        self.components.push(component);
    }

    pub fn push_start(&mut self, start: StartElement) {
        self.components.push(MarkupComponent::Start(start));
    }

    pub fn push_end(&mut self, end: EndElement) {
        self.components.push(MarkupComponent::End(end));
    }

    /// Append a complete element subtree, collapsing childless elements.
    pub fn push_events(&mut self, events: Vec<XmlEvent>) {
        if events.is_empty() {
            return;
        }
        if let [XmlEvent::Start(start), XmlEvent::End(end)] = events.as_slice()
            && start.name == end.name
        {
            self.components.push(MarkupComponent::Empty(start.clone()));
            return;
        }
        match self.components.last_mut() {
            Some(MarkupComponent::General(existing)) => existing.extend(events),
            _ => self.components.push(MarkupComponent::General(events)),
        }
    }

    pub fn extend(&mut self, other: Markup) {
        for component in other.components {
            match component {
                MarkupComponent::General(events) => self.push_events(events),
                other => self.components.push(other),
            }
        }
    }

    pub fn write_to(&self, out: &mut Vec<XmlEvent>) {
        for component in &self.components {
            component.write_to(out);
        }
    }

    pub fn events(&self) -> Vec<XmlEvent> {
        let mut out = Vec::new();
        self.write_to(&mut out);
        out
    }

    /// The start tag of the first component, if it is one.
    pub fn first_start(&self) -> Option<&StartElement> {
        match self.components.first()? {
            MarkupComponent::Start(start) | MarkupComponent::Empty(start) => Some(start),
            MarkupComponent::General(events) => match events.first()? {
                XmlEvent::Start(start) => Some(start),
                _ => None,
            },
            MarkupComponent::End(_) => None,
        }
    }
}
