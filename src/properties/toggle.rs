//! Toggle properties and their combination laws.

use crate::xml::names::{W_NS, X_NS};
use crate::xml::{QName, StartElement, XmlEvent};

/// WordprocessingML toggle properties (ECMA-376 §17.7.3).
const WORD_TOGGLES: &[&str] = &[
    "b", "bCs", "caps", "emboss", "i", "iCs", "imprint", "outline", "shadow", "smallCaps",
    "strike", "vanish",
];

/// SpreadsheetML boolean font properties.
const SHEET_TOGGLES: &[&str] = &["b", "i", "strike", "outline", "shadow", "condense", "extend"];

/// Check whether an element is a toggle property.
pub fn is_toggle(name: &QName) -> bool {
    match name.namespace.as_deref() {
        Some(W_NS) => WORD_TOGGLES.contains(&name.local.as_str()),
        Some(X_NS) => SHEET_TOGGLES.contains(&name.local.as_str()),
        _ => false,
    }
}

/// Parse an on/off attribute value. An absent value means on.
pub fn parse_on_off(value: Option<&str>) -> bool {
    !matches!(value, Some("0" | "false" | "off"))
}

/// A boolean property that defaults to true when present without a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleProperty {
    pub name: QName,
    pub value: bool,
}

impl ToggleProperty {
    pub fn new(name: QName, value: bool) -> Self {
        Self { name, value }
    }

    pub fn from_start(start: &StartElement) -> Self {
        Self::new(start.name.clone(), parse_on_off(start.attribute("val")))
    }

    /// Combine a parent style's value with a child style's value.
    ///
    /// Both present: the child toggles the parent (`p XOR c`); a false result
    /// drops the property back to the default. Otherwise whichever is present
    /// wins.
    pub fn combine_vertical(parent: Option<&Self>, child: Option<&Self>) -> Option<Self> {
        match (parent, child) {
            (Some(p), Some(c)) => {
                let value = p.value ^ c.value;
                value.then(|| Self::new(c.name.clone(), true))
            }
            (Some(p), None) => Some(p.clone()),
            (None, Some(c)) => Some(c.clone()),
            (None, None) => None,
        }
    }

    /// Fold a document-default value back into a resolved value (`p OR c`).
    pub fn combine_document_default(default: Option<&Self>, resolved: Option<&Self>) -> Option<Self> {
        match (default, resolved) {
            (Some(d), Some(r)) => Some(Self::new(r.name.clone(), d.value || r.value)),
            (Some(d), None) => Some(d.clone()),
            (None, Some(r)) => Some(r.clone()),
            (None, None) => None,
        }
    }

    pub fn to_events(&self) -> Vec<XmlEvent> {
        let mut start = StartElement::new(self.name.clone());
        if !self.value {
            start.attributes.push(crate::xml::Attribute::new(self.val_name(), "0"));
        }
        let end = start.end();
        vec![XmlEvent::Start(start), XmlEvent::End(end)]
    }

    /// `w:val` in WordprocessingML, a plain `val` elsewhere.
    fn val_name(&self) -> QName {
        if self.name.in_namespace(W_NS) {
            self.name.sibling("val")
        } else {
            QName::local("val")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn bold(value: bool) -> ToggleProperty {
        ToggleProperty::new(QName::new(Some("w"), "b", Some(W_NS)), value)
    }

    #[test]
    fn test_is_toggle() {
        assert!(is_toggle(&QName::new(Some("w"), "b", Some(W_NS))));
        assert!(is_toggle(&QName::new(None, "strike", Some(X_NS))));
        assert!(!is_toggle(&QName::new(Some("w"), "color", Some(W_NS))));
        assert!(!is_toggle(&QName::new(Some("w"), "rtl", Some(W_NS))));
    }

    #[test]
    fn test_parse_on_off() {
        assert!(parse_on_off(None));
        assert!(parse_on_off(Some("1")));
        assert!(parse_on_off(Some("true")));
        assert!(!parse_on_off(Some("0")));
        assert!(!parse_on_off(Some("off")));
    }

    #[test]
    fn test_false_value_serialises_val() {
        let events = bold(false).to_events();
        let XmlEvent::Start(start) = &events[0] else {
            panic!("expected start");
        };
        assert_eq!(start.attribute_ns(W_NS, "val"), Some("0"));
        assert!(bold(true).to_events().len() == 2);
    }

    proptest! {
        #[test]
        fn vertical_combination_is_xor(p in proptest::option::of(any::<bool>()), c in proptest::option::of(any::<bool>())) {
            let parent = p.map(bold);
            let child = c.map(bold);
            let combined = ToggleProperty::combine_vertical(parent.as_ref(), child.as_ref());
            let expected = match (p, c) {
                (Some(p), Some(c)) => Some(p ^ c),
                (Some(v), None) | (None, Some(v)) => Some(v),
                (None, None) => None,
            };
            match expected {
                Some(true) => prop_assert_eq!(combined.map(|t| t.value), Some(true)),
                // a false XOR result is dropped back to the default
                Some(false) if p.is_some() && c.is_some() => prop_assert!(combined.is_none()),
                Some(false) => prop_assert_eq!(combined.map(|t| t.value), Some(false)),
                None => prop_assert!(combined.is_none()),
            }
        }

        #[test]
        fn document_default_combination_is_or(p in any::<bool>(), c in any::<bool>()) {
            let combined = ToggleProperty::combine_document_default(Some(&bold(p)), Some(&bold(c)));
            prop_assert_eq!(combined.map(|t| t.value), Some(p || c));
        }
    }
}
