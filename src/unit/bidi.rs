//! Right-to-left adjustments applied when writing for an RTL target locale.

use std::borrow::Cow;

use crate::config::Config;
use crate::model::{Dialect, RunTags};
use crate::properties::{GenericProperty, RunProperties, RunProperty};
use crate::xml::names::W_NS;
use crate::xml::{QName, StartElement, XmlEvent};

/// Word runs gain `w:rtl`.
pub(super) fn run_properties<'p>(
    properties: &'p RunProperties,
    tags: &RunTags,
    config: &Config,
) -> Cow<'p, RunProperties> {
    if !config.target_is_rtl()
        || tags.dialect != Dialect::Word
        || properties.find(W_NS, "rtl").is_some()
    {
        return Cow::Borrowed(properties);
    }
    let mut properties = properties.clone();
    if properties.name().is_none() {
        properties.set_name(tags.properties());
    }
    properties.set(RunProperty::Generic(GenericProperty::with_value(
        tags.name("rtl"),
        None,
    )));
    properties.sort_by_schema();
    Cow::Owned(properties)
}

/// DrawingML paragraphs gain `rtl="1"` on `a:pPr`, which is created right
/// after the paragraph start tag when missing.
pub(super) fn paragraph_prefix(prefix: &[XmlEvent], tags: &RunTags, config: &Config) -> Vec<XmlEvent> {
    let mut events = prefix.to_vec();
    if !config.target_is_rtl() || tags.dialect != Dialect::Drawing {
        return events;
    }

    let rtl = QName::new(None, "rtl", None);
    let namespace = tags.dialect.namespace();
    let existing = events.iter_mut().find_map(|event| match event {
        XmlEvent::Start(start) if start.name.is(namespace, "pPr") => Some(start),
        _ => None,
    });
    if let Some(start) = existing {
        start.set_attribute(rtl, "1");
        return events;
    }

    if let Some(position) = events.iter().position(|e| matches!(e, XmlEvent::Start(_))) {
        let start = StartElement::new(tags.paragraph_properties()).with_attribute(rtl, "1");
        let end = start.end();
        events.insert(position + 1, XmlEvent::Start(start));
        events.insert(position + 2, XmlEvent::End(end));
    }
    events
}
