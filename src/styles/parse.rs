//! Reading a WordprocessingML styles part.

use super::{StyleDefinition, StyleDefinitions, StyleType};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::parse::properties::parse_run_properties;
use crate::parse::skip::ElementSkipper;
use crate::properties::parse_on_off;
use crate::xml::names::W_NS;
use crate::xml::{EventCursor, StartElement, XmlEvent, read_events};

impl StyleDefinitions {
    /// Parse `word/styles.xml`. Cyclic `basedOn` chains are rejected.
    pub fn parse(xml: &str, config: &Config) -> Result<Self> {
        let events = read_events(xml)?;
        Self::from_events(&events, config)
    }

    pub fn from_events(events: &[XmlEvent], config: &Config) -> Result<Self> {
        let skipper = ElementSkipper::new(config);
        let mut styles = StyleDefinitions::new();
        let mut cursor = EventCursor::new(events);
        let mut in_run_defaults = false;

        while let Some(event) = cursor.next() {
            match event {
                XmlEvent::Start(start) if start.name.is(W_NS, "rPrDefault") => {
                    in_run_defaults = true;
                }
                XmlEvent::End(end) if end.name.is(W_NS, "rPrDefault") => {
                    in_run_defaults = false;
                }
                XmlEvent::Start(start) if in_run_defaults && start.name.is(W_NS, "rPr") => {
                    let defaults = parse_run_properties(&mut cursor, start, &skipper)?;
                    styles.set_document_defaults(defaults);
                }
                XmlEvent::Start(start) if start.name.is(W_NS, "style") => {
                    if let Some(style) = parse_style(&mut cursor, start, &skipper)? {
                        styles.insert(style);
                    }
                }
                _ => {}
            }
        }

        styles.validate()?;
        Ok(styles)
    }
}

/// Parse one `w:style`. Styles without an id or a known type are skipped.
fn parse_style(
    cursor: &mut EventCursor<'_>,
    start: &StartElement,
    skipper: &ElementSkipper<'_>,
) -> Result<Option<StyleDefinition>> {
    let id = start.attribute_ns(W_NS, "styleId").map(str::to_string);
    let style_type = start
        .attribute_ns(W_NS, "type")
        .map_or(Some(StyleType::Paragraph), StyleType::from_attribute);
    let is_default = start.attribute_ns(W_NS, "default").is_some_and(|v| parse_on_off(Some(v)));

    let mut parent = None;
    let mut linked = None;
    let mut run_properties = None;

    loop {
        let event = cursor
            .next()
            .ok_or_else(|| Error::UnterminatedElement(start.name.qualified()))?;
        match event {
            XmlEvent::Start(child) if child.name.is(W_NS, "basedOn") => {
                parent = child.attribute_ns(W_NS, "val").map(str::to_string);
                cursor.skip_element_rest(&child.name)?;
            }
            XmlEvent::Start(child) if child.name.is(W_NS, "link") => {
                linked = child.attribute_ns(W_NS, "val").map(str::to_string);
                cursor.skip_element_rest(&child.name)?;
            }
            XmlEvent::Start(child) if child.name.is(W_NS, "rPr") => {
                run_properties = Some(parse_run_properties(cursor, child, skipper)?);
            }
            XmlEvent::Start(child) => cursor.skip_element_rest(&child.name)?,
            XmlEvent::End(_) => break,
            _ => {}
        }
    }

    let (Some(id), Some(style_type)) = (id, style_type) else {
        return Ok(None);
    };
    Ok(Some(StyleDefinition {
        id,
        style_type,
        parent,
        linked,
        is_default,
        run_properties: run_properties.unwrap_or_default(),
    }))
}
