//! Run property element parsing.

use super::skip::{AttributeStripper, ElementSkipper, SkipAction, SkipContext};
use crate::error::{Error, Result};
use crate::properties::{AttributeProperty, RunProperties, RunProperty};
use crate::xml::{EventCursor, StartElement, XmlEvent};

/// Parse a run property element whose start tag was just consumed.
///
/// Attributes of the element become [`RunProperty::Attribute`]s (DrawingML
/// and SpreadsheetML style); child elements are classified by
/// [`RunProperty::from_events`]. Revision history inside is dropped.
/// Namespace declarations on the element and its children are not
/// formatting and are dropped too.
pub fn parse_run_properties(
    cursor: &mut EventCursor<'_>,
    start: &StartElement,
    skipper: &ElementSkipper<'_>,
) -> Result<RunProperties> {
    let mut element = start.clone();
    strip(&mut element);

    let mut properties = RunProperties::new(element.name.clone());
    for attr in element.attributes {
        properties.push(RunProperty::Attribute(AttributeProperty {
            name: attr.name,
            value: attr.value,
        }));
    }

    loop {
        let event = cursor
            .next()
            .ok_or_else(|| Error::UnterminatedElement(start.name.qualified()))?;
        match event {
            XmlEvent::Start(child) => match skipper.action(&child.name, SkipContext::RunProperties)? {
                SkipAction::Skip | SkipAction::Unwrap => cursor.skip_element_rest(&child.name)?,
                SkipAction::Keep => {
                    let mut child = child.clone();
                    strip(&mut child);
                    let name = child.name.clone();
                    let mut events = vec![XmlEvent::Start(child)];
                    events.extend(cursor.take_element_rest(&name)?);
                    if let Some(property) = RunProperty::from_events(events) {
                        properties.push(property);
                    }
                }
            },
            XmlEvent::End(_) => return Ok(properties),
            _ => {}
        }
    }
}

fn strip(element: &mut StartElement) {
    AttributeStripper.strip(element);
    element.attributes.retain(|attr| !attr.is_namespace_declaration());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::xml::names::{A_NS, W_NS};
    use crate::xml::read_events;

    fn parse(xml: &str, config: &Config) -> Result<RunProperties> {
        let events = read_events(xml).unwrap();
        let mut cursor = EventCursor::new(&events);
        let XmlEvent::Start(start) = cursor.next().unwrap() else {
            panic!("expected start");
        };
        parse_run_properties(&mut cursor, start, &ElementSkipper::new(config))
    }

    #[test]
    fn test_word_properties() {
        let xml = format!(
            r#"<w:rPr xmlns:w="{W_NS}"><w:b/><w:i w:val="0"/><w:sz w:val="24"/><w:rPrChange w:id="1"><w:rPr><w:b/></w:rPr></w:rPrChange></w:rPr>"#
        );
        let props = parse(&xml, &Config::default()).unwrap();
        assert_eq!(props.len(), 3);
        assert_eq!(props.toggle(W_NS, "b"), Some(true));
        assert_eq!(props.toggle(W_NS, "i"), Some(false));
    }

    #[test]
    fn test_namespace_declarations_are_not_properties() {
        let config = Config::default();
        let plain = parse(&format!(r#"<w:rPr xmlns:w="{W_NS}"><w:b/></w:rPr>"#), &config).unwrap();
        let redeclared = parse(
            &format!(r#"<w:rPr xmlns:w="{W_NS}" xmlns:w14="urn:w14"><w:b xmlns:w="{W_NS}"/></w:rPr>"#),
            &config,
        )
        .unwrap();
        assert_eq!(plain.len(), 1);
        assert_eq!(redeclared, plain);

        let props = parse(&format!(r#"<a:rPr xmlns:a="{A_NS}" lang="en-US"/>"#), &config).unwrap();
        assert_eq!(props.len(), 1);
        assert_eq!(props.find_attribute("lang"), Some("en-US"));
    }

    #[test]
    fn test_revision_history_rejected() {
        let xml = format!(
            r#"<w:rPr xmlns:w="{W_NS}"><w:rPrChange w:id="1"/></w:rPr>"#
        );
        let config = Config::default().with_accept_revisions(false);
        assert!(matches!(parse(&xml, &config), Err(Error::RevisionsPresent(_))));
    }

    #[test]
    fn test_drawing_attributes_become_properties() {
        let xml = format!(
            r#"<a:rPr xmlns:a="{A_NS}" lang="en-US" b="1" dirty="0"><a:solidFill><a:srgbClr val="FF0000"/></a:solidFill></a:rPr>"#
        );
        let props = parse(&xml, &Config::default()).unwrap();
        assert_eq!(props.find_attribute("b"), Some("1"));
        assert_eq!(props.find_attribute("dirty"), None);
        assert!(props.find(A_NS, "solidFill").is_some());
    }
}
