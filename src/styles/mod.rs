//! Style cascade.
//!
//! Effective run formatting is the result of layering, in order:
//!
//! 1. document-default run properties, minus toggles
//! 2. the paragraph style's `basedOn` chain
//! 3. the run style's chain, on top of its linked paragraph style's chain
//! 4. the document-default toggles, OR-ed back in
//! 5. the run's direct properties
//!
//! Each layer replaces properties of the same name and unions the rest.
//! Within a `basedOn` chain, toggles combine by exclusive-or instead.

mod parse;

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use log::debug;

use crate::error::{Error, Result};
use crate::properties::RunProperties;

/// Anything that can compute effective run properties.
pub trait StyleSource {
    fn combine(
        &self,
        paragraph_style: Option<&str>,
        run_style: Option<&str>,
        direct: &RunProperties,
    ) -> RunProperties;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StyleType {
    Paragraph,
    Character,
    Table,
    Numbering,
}

impl StyleType {
    pub fn from_attribute(value: &str) -> Option<Self> {
        match value {
            "paragraph" => Some(StyleType::Paragraph),
            "character" => Some(StyleType::Character),
            "table" => Some(StyleType::Table),
            "numbering" => Some(StyleType::Numbering),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StyleDefinition {
    pub id: String,
    pub style_type: StyleType,
    pub parent: Option<String>,
    pub linked: Option<String>,
    pub is_default: bool,
    pub run_properties: RunProperties,
}

impl StyleDefinition {
    pub fn new(id: impl Into<String>, style_type: StyleType) -> Self {
        Self {
            id: id.into(),
            style_type,
            parent: None,
            linked: None,
            is_default: false,
            run_properties: RunProperties::empty(),
        }
    }

    pub fn based_on(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn linked_to(mut self, linked: impl Into<String>) -> Self {
        self.linked = Some(linked.into());
        self
    }

    pub fn as_default(mut self) -> Self {
        self.is_default = true;
        self
    }

    pub fn with_properties(mut self, properties: RunProperties) -> Self {
        self.run_properties = properties;
        self
    }
}

type CacheKey = (Option<String>, Option<String>);

/// The style table of a WordprocessingML document.
///
/// Resolved style pairs are cached behind a [`RefCell`], so a table is not
/// `Sync` and must not be shared across threads.
#[derive(Debug, Clone, Default)]
pub struct StyleDefinitions {
    styles: HashMap<String, StyleDefinition>,
    defaults: HashMap<StyleType, String>,
    document_defaults: RunProperties,
    cache: RefCell<HashMap<CacheKey, RunProperties>>,
}

impl StyleDefinitions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, style: StyleDefinition) {
        if style.is_default {
            self.defaults.insert(style.style_type, style.id.clone());
        }
        self.styles.insert(style.id.clone(), style);
        self.cache.borrow_mut().clear();
    }

    pub fn set_document_defaults(&mut self, properties: RunProperties) {
        self.document_defaults = properties;
        self.cache.borrow_mut().clear();
    }

    pub fn document_defaults(&self) -> &RunProperties {
        &self.document_defaults
    }

    pub fn get(&self, id: &str) -> Option<&StyleDefinition> {
        self.styles.get(id)
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }

    /// Reject `basedOn` chains that loop back on themselves.
    pub fn validate(&self) -> Result<()> {
        for style in self.styles.values() {
            let mut seen = HashSet::from([style.id.as_str()]);
            let mut current = style;
            while let Some(parent_id) = current.parent.as_deref()
                && let Some(parent) = self.styles.get(parent_id)
            {
                if !seen.insert(parent.id.as_str()) {
                    return Err(Error::CyclicStyle(style.id.clone()));
                }
                current = parent;
            }
        }
        Ok(())
    }

    /// Look a style up, falling back to the default style of its type.
    fn lookup(&self, id: Option<&str>, style_type: StyleType) -> Option<&StyleDefinition> {
        if let Some(id) = id {
            if let Some(style) = self.styles.get(id) {
                return Some(style);
            }
            debug!("style {id:?} not defined, falling back to the default {style_type:?} style");
        }
        self.defaults
            .get(&style_type)
            .and_then(|default| self.styles.get(default))
    }

    /// Properties of a style and all its ancestors, toggles XOR-ed.
    fn chain_properties(&self, style: &StyleDefinition) -> RunProperties {
        let mut lineage = vec![style];
        let mut current = style;
        while let Some(parent_id) = current.parent.as_deref()
            && let Some(parent) = self.styles.get(parent_id)
            && lineage.len() <= self.styles.len()
        {
            lineage.push(parent);
            current = parent;
        }
        lineage
            .iter()
            .rev()
            .fold(RunProperties::empty(), |acc, s| acc.vertical_combine(&s.run_properties))
    }

    /// Steps 1 to 4 of the cascade, cached per style pair.
    fn style_properties(&self, paragraph_style: Option<&str>, run_style: Option<&str>) -> RunProperties {
        let key = (paragraph_style.map(str::to_string), run_style.map(str::to_string));
        if let Some(cached) = self.cache.borrow().get(&key) {
            return cached.clone();
        }

        let mut result = self.document_defaults.without_toggles();

        if let Some(style) = self.lookup(paragraph_style, StyleType::Paragraph) {
            result = result.distinct_combine(&self.chain_properties(style));
        }

        if let Some(style) = self.lookup(run_style, StyleType::Character) {
            let linked = style
                .linked
                .as_deref()
                .and_then(|id| self.styles.get(id))
                .map(|linked| self.chain_properties(linked))
                .unwrap_or_default();
            let run_chain = linked.distinct_combine(&self.chain_properties(style));
            result = result.distinct_combine(&run_chain);
        }

        result.apply_default_toggles(&self.document_defaults);

        self.cache.borrow_mut().insert(key, result.clone());
        result
    }
}

impl StyleSource for StyleDefinitions {
    fn combine(
        &self,
        paragraph_style: Option<&str>,
        run_style: Option<&str>,
        direct: &RunProperties,
    ) -> RunProperties {
        self.style_properties(paragraph_style, run_style)
            .distinct_combine(&direct.without_run_style())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::{GenericProperty, RunProperty, ToggleProperty};
    use crate::xml::QName;
    use crate::xml::names::W_NS;
    use proptest::prelude::*;

    fn w(local: &str) -> QName {
        QName::new(Some("w"), local, Some(W_NS))
    }

    fn props(list: &[(&str, Option<bool>)]) -> RunProperties {
        let mut props = RunProperties::new(w("rPr"));
        for (local, toggle) in list {
            let property = match toggle {
                Some(value) => RunProperty::Toggle(ToggleProperty::new(w(local), *value)),
                None => RunProperty::Generic(GenericProperty::with_value(w(local), Some("x"))),
            };
            props.set(property);
        }
        props
    }

    fn table() -> StyleDefinitions {
        let mut styles = StyleDefinitions::new();
        styles.set_document_defaults(props(&[("sz", None), ("i", Some(true))]));
        styles.insert(
            StyleDefinition::new("Normal", StyleType::Paragraph)
                .as_default()
                .with_properties(props(&[("color", None)])),
        );
        styles.insert(
            StyleDefinition::new("Heading1", StyleType::Paragraph)
                .based_on("Normal")
                .with_properties(props(&[("b", Some(true))])),
        );
        styles.insert(
            StyleDefinition::new("Heading1Char", StyleType::Character)
                .linked_to("Heading1")
                .with_properties(props(&[("caps", Some(true))])),
        );
        styles.insert(
            StyleDefinition::new("Strong", StyleType::Character)
                .based_on("Heading1Char")
                .with_properties(props(&[("b", Some(true))])),
        );
        styles
    }

    #[test]
    fn test_paragraph_chain_and_defaults() {
        let styles = table();
        let combined = styles.combine(Some("Heading1"), None, &RunProperties::empty());
        assert!(combined.find(W_NS, "sz").is_some());
        assert!(combined.find(W_NS, "color").is_some());
        assert_eq!(combined.toggle(W_NS, "b"), Some(true));
        // default toggle OR-ed back in
        assert_eq!(combined.toggle(W_NS, "i"), Some(true));
    }

    #[test]
    fn test_missing_style_falls_back_to_default() {
        let styles = table();
        let combined = styles.combine(Some("NoSuchStyle"), None, &RunProperties::empty());
        assert!(combined.find(W_NS, "color").is_some());
        assert_eq!(combined.toggle(W_NS, "b"), None);
    }

    #[test]
    fn test_run_style_chain() {
        let styles = table();
        let combined = styles.combine(None, Some("Strong"), &RunProperties::empty());
        assert_eq!(combined.toggle(W_NS, "caps"), Some(true));
        assert_eq!(combined.toggle(W_NS, "b"), Some(true));
    }

    #[test]
    fn test_linked_paragraph_chain() {
        let styles = table();
        let combined = styles.combine(None, Some("Heading1Char"), &RunProperties::empty());
        assert_eq!(combined.toggle(W_NS, "caps"), Some(true));
        assert_eq!(combined.toggle(W_NS, "b"), Some(true));
        assert!(combined.find(W_NS, "color").is_some());
    }

    #[test]
    fn test_based_on_toggles_cancel() {
        let mut styles = table();
        styles.insert(
            StyleDefinition::new("Plain", StyleType::Character)
                .based_on("Strong")
                .with_properties(props(&[("b", Some(true))])),
        );
        let combined = styles.combine(None, Some("Plain"), &RunProperties::empty());
        assert_eq!(combined.toggle(W_NS, "b"), None);
        assert_eq!(combined.toggle(W_NS, "caps"), Some(true));
    }

    #[test]
    fn test_direct_properties_win_and_drop_run_style() {
        let styles = table();
        let mut direct = props(&[("b", Some(false))]);
        direct.set(RunProperty::RunStyle(crate::properties::RunStyleProperty {
            name: w("rStyle"),
            style_id: "Strong".into(),
        }));
        let combined = styles.combine(Some("Heading1"), Some("Strong"), &direct);
        assert_eq!(combined.toggle(W_NS, "b"), Some(false));
        assert!(combined.run_style().is_none());
    }

    #[test]
    fn test_cycle_rejected() {
        let mut styles = StyleDefinitions::new();
        styles.insert(StyleDefinition::new("A", StyleType::Paragraph).based_on("B"));
        styles.insert(StyleDefinition::new("B", StyleType::Paragraph).based_on("A"));
        assert!(matches!(styles.validate(), Err(Error::CyclicStyle(_))));
        assert!(table().validate().is_ok());
    }

    fn toggle_set() -> impl Strategy<Value = Vec<(&'static str, Option<bool>)>> {
        proptest::collection::vec(
            (
                prop_oneof![Just("b"), Just("i"), Just("caps"), Just("color")],
                proptest::option::of(any::<bool>()),
            ),
            0..4,
        )
    }

    proptest! {
        #[test]
        fn cascade_is_deterministic(
            defaults in toggle_set(),
            parent in toggle_set(),
            child in toggle_set(),
            direct in toggle_set(),
        ) {
            let mut styles = StyleDefinitions::new();
            styles.set_document_defaults(props(&defaults));
            styles.insert(StyleDefinition::new("Base", StyleType::Paragraph).with_properties(props(&parent)));
            styles.insert(StyleDefinition::new("Child", StyleType::Paragraph).based_on("Base").with_properties(props(&child)));
            let direct = props(&direct);

            let first = styles.combine(Some("Child"), None, &direct);
            let second = styles.combine(Some("Child"), None, &direct);
            let uncached = styles.clone();
            uncached.cache.borrow_mut().clear();
            let third = uncached.combine(Some("Child"), None, &direct);
            prop_assert_eq!(&first, &second);
            prop_assert_eq!(&first, &third);
        }
    }
}
