//! Run properties.
//!
//! A [`RunProperties`] is a set of [`RunProperty`] values keyed by element (or
//! attribute) name. Each variant defines its own equality: toggles compare
//! their boolean value, fonts compare their slots but not the categories
//! detected in the text, everything else compares its markup.

mod fonts;
mod toggle;

pub use fonts::{
    ContentCategories, ContentCategory, FontSlot, RunFonts, classify, detect_categories,
};
pub use toggle::{ToggleProperty, is_toggle, parse_on_off};

use crate::xml::names::{A_NS, W_NS, X_NS};
use crate::xml::{Attribute, QName, StartElement, XmlEvent};

/// Identity of a property within a set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PropertyKey {
    attribute: bool,
    namespace: Option<String>,
    local: String,
}

impl PropertyKey {
    pub fn element(namespace: Option<&str>, local: &str) -> Self {
        Self {
            attribute: false,
            namespace: namespace.map(str::to_string),
            local: local.to_string(),
        }
    }

    pub fn attribute(namespace: Option<&str>, local: &str) -> Self {
        Self {
            attribute: true,
            namespace: namespace.map(str::to_string),
            local: local.to_string(),
        }
    }
}

/// A property without special semantics, kept as its original markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenericProperty {
    pub name: QName,
    pub events: Vec<XmlEvent>,
}

impl GenericProperty {
    pub fn new(events: Vec<XmlEvent>) -> Option<Self> {
        let name = events.first()?.start_name()?.clone();
        Some(Self { name, events })
    }

    /// Convenience constructor for a valueless or `val`-only element.
    pub fn with_value(name: QName, value: Option<&str>) -> Self {
        let mut start = StartElement::new(name.clone());
        if let Some(value) = value {
            start.attributes.push(Attribute::new(name.sibling("val"), value));
        }
        let end = start.end();
        Self {
            name,
            events: vec![XmlEvent::Start(start), XmlEvent::End(end)],
        }
    }

    /// The `val` attribute of the property element.
    pub fn value(&self) -> Option<&str> {
        match self.events.first() {
            Some(XmlEvent::Start(start)) => start.attribute("val"),
            _ => None,
        }
    }
}

/// A reference to a character style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunStyleProperty {
    pub name: QName,
    pub style_id: String,
}

/// DrawingML `a:hlinkClick` / `a:hlinkMouseOver`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HyperlinkProperty {
    pub name: QName,
    pub events: Vec<XmlEvent>,
}

/// A property expressed as an attribute of the property element
/// (DrawingML `<a:rPr b="1" lang="en-US">`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeProperty {
    pub name: QName,
    pub value: String,
}

#[derive(Debug, Clone)]
pub enum RunProperty {
    Generic(GenericProperty),
    RunStyle(RunStyleProperty),
    Toggle(ToggleProperty),
    Fonts(RunFonts),
    Hyperlink(HyperlinkProperty),
    Attribute(AttributeProperty),
}

impl RunProperty {
    /// Classify a property element given its complete event range.
    pub fn from_events(events: Vec<XmlEvent>) -> Option<Self> {
        let start = match events.first()? {
            XmlEvent::Start(start) => start.clone(),
            _ => return None,
        };
        let name = &start.name;

        if name.is(W_NS, "rStyle") {
            return Some(RunProperty::RunStyle(RunStyleProperty {
                name: name.clone(),
                style_id: start.attribute("val").unwrap_or_default().to_string(),
            }));
        }
        if name.is(W_NS, "rFonts") {
            return Some(RunProperty::Fonts(RunFonts::from_start(&start)));
        }
        if is_toggle(name) {
            return Some(RunProperty::Toggle(ToggleProperty::from_start(&start)));
        }
        if name.is(A_NS, "hlinkClick") || name.is(A_NS, "hlinkMouseOver") {
            return Some(RunProperty::Hyperlink(HyperlinkProperty {
                name: name.clone(),
                events,
            }));
        }
        GenericProperty::new(events).map(RunProperty::Generic)
    }

    pub fn name(&self) -> &QName {
        match self {
            RunProperty::Generic(p) => &p.name,
            RunProperty::RunStyle(p) => &p.name,
            RunProperty::Toggle(p) => &p.name,
            RunProperty::Fonts(p) => &p.name,
            RunProperty::Hyperlink(p) => &p.name,
            RunProperty::Attribute(p) => &p.name,
        }
    }

    pub fn key(&self) -> PropertyKey {
        let name = self.name();
        match self {
            RunProperty::Attribute(_) => {
                PropertyKey::attribute(name.namespace.as_deref(), &name.local)
            }
            _ => PropertyKey::element(name.namespace.as_deref(), &name.local),
        }
    }

    pub fn is_attribute(&self) -> bool {
        matches!(self, RunProperty::Attribute(_))
    }

    /// Serialise an element property. Attribute properties have no events.
    pub fn to_events(&self) -> Vec<XmlEvent> {
        match self {
            RunProperty::Generic(p) => p.events.clone(),
            RunProperty::Hyperlink(p) => p.events.clone(),
            RunProperty::Toggle(p) => p.to_events(),
            RunProperty::Fonts(p) => p.to_events(),
            RunProperty::RunStyle(p) => {
                let start = StartElement::new(p.name.clone())
                    .with_attribute(p.name.sibling("val"), p.style_id.clone());
                let end = start.end();
                vec![XmlEvent::Start(start), XmlEvent::End(end)]
            }
            RunProperty::Attribute(_) => Vec::new(),
        }
    }
}

impl PartialEq for RunProperty {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (RunProperty::Generic(a), RunProperty::Generic(b)) => a == b,
            (RunProperty::RunStyle(a), RunProperty::RunStyle(b)) => a == b,
            (RunProperty::Toggle(a), RunProperty::Toggle(b)) => a == b,
            (RunProperty::Fonts(a), RunProperty::Fonts(b)) => a == b,
            (RunProperty::Hyperlink(a), RunProperty::Hyperlink(b)) => a == b,
            (RunProperty::Attribute(a), RunProperty::Attribute(b)) => a == b,
            _ => false,
        }
    }
}

/// A set of run properties, in output order.
#[derive(Debug, Clone, Default)]
pub struct RunProperties {
    name: Option<QName>,
    properties: Vec<RunProperty>,
}

impl RunProperties {
    pub fn new(name: QName) -> Self {
        Self {
            name: Some(name),
            properties: Vec::new(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Name of the property element (`w:rPr`, `a:rPr`, `a:endParaRPr`).
    pub fn name(&self) -> Option<&QName> {
        self.name.as_ref()
    }

    pub fn set_name(&mut self, name: QName) {
        self.name = Some(name);
    }

    pub fn with(mut self, property: RunProperty) -> Self {
        self.set(property);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RunProperty> {
        self.properties.iter()
    }

    /// Append without checking for an existing property of the same name.
    pub fn push(&mut self, property: RunProperty) {
        self.properties.push(property);
    }

    pub fn get(&self, key: &PropertyKey) -> Option<&RunProperty> {
        self.properties.iter().find(|p| &p.key() == key)
    }

    /// Find an element property by name.
    pub fn find(&self, namespace: &str, local: &str) -> Option<&RunProperty> {
        self.properties
            .iter()
            .find(|p| !p.is_attribute() && p.name().is(namespace, local))
    }

    /// Find an attribute property by unqualified name.
    pub fn find_attribute(&self, local: &str) -> Option<&str> {
        self.properties.iter().find_map(|p| match p {
            RunProperty::Attribute(a) if a.name.local == local => Some(a.value.as_str()),
            _ => None,
        })
    }

    /// Insert a property, replacing any property with the same key.
    pub fn set(&mut self, property: RunProperty) {
        let key = property.key();
        match self.properties.iter_mut().find(|p| p.key() == key) {
            Some(existing) => *existing = property,
            None => self.properties.push(property),
        }
    }

    pub fn remove(&mut self, key: &PropertyKey) -> Option<RunProperty> {
        let index = self.properties.iter().position(|p| &p.key() == key)?;
        Some(self.properties.remove(index))
    }

    pub fn retain(&mut self, f: impl FnMut(&RunProperty) -> bool) {
        self.properties.retain(f);
    }

    pub fn run_style(&self) -> Option<&str> {
        self.properties.iter().find_map(|p| match p {
            RunProperty::RunStyle(style) => Some(style.style_id.as_str()),
            _ => None,
        })
    }

    pub fn fonts(&self) -> Option<&RunFonts> {
        self.properties.iter().find_map(|p| match p {
            RunProperty::Fonts(fonts) => Some(fonts),
            _ => None,
        })
    }

    pub fn fonts_mut(&mut self) -> Option<&mut RunFonts> {
        self.properties.iter_mut().find_map(|p| match p {
            RunProperty::Fonts(fonts) => Some(fonts),
            _ => None,
        })
    }

    pub fn toggles(&self) -> impl Iterator<Item = &ToggleProperty> {
        self.properties.iter().filter_map(|p| match p {
            RunProperty::Toggle(toggle) => Some(toggle),
            _ => None,
        })
    }

    /// Value of a toggle, if present.
    pub fn toggle(&self, namespace: &str, local: &str) -> Option<bool> {
        self.toggles()
            .find(|t| t.name.is(namespace, local))
            .map(|t| t.value)
    }

    /// Check a valued on/off element such as `w:rtl`.
    pub fn is_on(&self, namespace: &str, local: &str) -> bool {
        match self.find(namespace, local) {
            Some(RunProperty::Toggle(t)) => t.value,
            Some(RunProperty::Generic(g)) => parse_on_off(g.value()),
            Some(_) => true,
            None => false,
        }
    }

    /// Text hidden through `w:vanish`.
    pub fn is_hidden(&self) -> bool {
        self.toggle(W_NS, "vanish").unwrap_or(false)
    }

    /// Text rendered entirely with the complex-script font.
    pub fn is_complex_script(&self) -> bool {
        self.is_on(W_NS, "rtl") || self.is_on(W_NS, "cs")
    }

    pub fn without_toggles(&self) -> Self {
        self.filtered(|p| !matches!(p, RunProperty::Toggle(_)))
    }

    pub fn without_run_style(&self) -> Self {
        self.filtered(|p| !matches!(p, RunProperty::RunStyle(_)))
    }

    pub fn without_fonts(&self) -> Self {
        self.filtered(|p| !matches!(p, RunProperty::Fonts(_)))
    }

    fn filtered(&self, f: impl Fn(&RunProperty) -> bool) -> Self {
        Self {
            name: self.name.clone(),
            properties: self.properties.iter().filter(|p| f(p)).cloned().collect(),
        }
    }

    /// Overlay `over` on `self`: properties with the same key are replaced,
    /// others are unioned in. Fonts merge slot by slot.
    pub fn distinct_combine(&self, over: &RunProperties) -> RunProperties {
        let mut combined = self.clone();
        if over.name.is_some() {
            combined.name = over.name.clone();
        }
        for property in &over.properties {
            combined.overlay(property);
        }
        combined.sort_by_schema();
        combined
    }

    /// Combine a parent style's properties with a child style's.
    ///
    /// Toggles present on both sides combine by exclusive-or; everything else
    /// behaves as [`RunProperties::distinct_combine`].
    pub fn vertical_combine(&self, child: &RunProperties) -> RunProperties {
        let mut combined = self.clone();
        if child.name.is_some() {
            combined.name = child.name.clone();
        }
        for property in &child.properties {
            let RunProperty::Toggle(toggle) = property else {
                combined.overlay(property);
                continue;
            };
            let key = property.key();
            let parent = match combined.get(&key) {
                Some(RunProperty::Toggle(parent)) => Some(parent.clone()),
                _ => None,
            };
            match ToggleProperty::combine_vertical(parent.as_ref(), Some(toggle)) {
                Some(result) => combined.set(RunProperty::Toggle(result)),
                None => {
                    combined.remove(&key);
                }
            }
        }
        combined.sort_by_schema();
        combined
    }

    /// OR the document-default toggles back into resolved properties.
    pub fn apply_default_toggles(&mut self, defaults: &RunProperties) {
        for default in defaults.toggles() {
            let key = PropertyKey::element(default.name.namespace.as_deref(), &default.name.local);
            let resolved = match self.get(&key) {
                Some(RunProperty::Toggle(t)) => Some(t.clone()),
                _ => None,
            };
            if let Some(result) =
                ToggleProperty::combine_document_default(Some(default), resolved.as_ref())
            {
                self.set(RunProperty::Toggle(result));
            }
        }
        self.sort_by_schema();
    }

    fn overlay(&mut self, property: &RunProperty) {
        if let RunProperty::Fonts(over) = property
            && let Some(base) = self.fonts_mut()
        {
            *base = base.combine(over);
            return;
        }
        self.set(property.clone());
    }

    /// Every property of `other` is present here with an equal value.
    pub fn is_superset_of(&self, other: &RunProperties) -> bool {
        other
            .properties
            .iter()
            .all(|p| self.get(&p.key()).is_some_and(|mine| mine == p))
    }

    /// Put element properties into the order the schemas require.
    pub fn sort_by_schema(&mut self) {
        self.properties.sort_by_key(|p| schema_rank(p.name()));
    }

    /// Serialise as a property element, or nothing when empty.
    pub fn to_events(&self, default_name: &QName) -> Vec<XmlEvent> {
        if self.properties.is_empty() {
            return Vec::new();
        }
        let mut start = StartElement::new(self.name.clone().unwrap_or_else(|| default_name.clone()));
        for property in &self.properties {
            if let RunProperty::Attribute(attr) = property {
                start
                    .attributes
                    .push(Attribute::new(attr.name.clone(), attr.value.clone()));
            }
        }
        let end = start.end();
        let mut events = vec![XmlEvent::Start(start)];
        for property in &self.properties {
            events.extend(property.to_events());
        }
        events.push(XmlEvent::End(end));
        events
    }
}

impl PartialEq for RunProperties {
    /// Set equality: same keys, equal values, order ignored.
    fn eq(&self, other: &Self) -> bool {
        self.properties.len() == other.properties.len() && self.is_superset_of(other)
    }
}

/// `w:rPr` children in CT_RPr sequence order.
const WORD_ORDER: &[&str] = &[
    "rStyle", "rFonts", "b", "bCs", "i", "iCs", "caps", "smallCaps", "strike", "dstrike",
    "outline", "shadow", "emboss", "imprint", "noProof", "snapToGrid", "vanish", "webHidden",
    "color", "spacing", "w", "kern", "position", "sz", "szCs", "highlight", "u", "effect",
    "bdr", "shd", "fitText", "vertAlign", "rtl", "cs", "em", "lang", "eastAsianLayout",
    "specVanish", "oMath",
];

/// `a:rPr` children in CT_TextCharacterProperties order.
const DRAWING_ORDER: &[&str] = &[
    "ln", "noFill", "solidFill", "gradFill", "blipFill", "pattFill", "grpFill", "effectLst",
    "effectDag", "highlight", "uLnTx", "uLn", "uFillTx", "uFill", "latin", "ea", "cs", "sym",
    "hlinkClick", "hlinkMouseOver", "rtl", "extLst",
];

/// SpreadsheetML `rPr` children in CT_RPrElt order.
const SHEET_ORDER: &[&str] = &[
    "rFont", "charset", "family", "b", "i", "strike", "outline", "shadow", "condense",
    "extend", "color", "sz", "u", "vertAlign", "scheme",
];

fn schema_rank(name: &QName) -> usize {
    let order = match name.namespace.as_deref() {
        Some(W_NS) => WORD_ORDER,
        Some(A_NS) => DRAWING_ORDER,
        Some(X_NS) => SHEET_ORDER,
        _ => return usize::MAX,
    };
    order
        .iter()
        .position(|local| *local == name.local)
        .unwrap_or(usize::MAX)
}
