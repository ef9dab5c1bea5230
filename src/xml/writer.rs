//! Serialisation of [`XmlEvent`]s back to markup.

use quick_xml::escape::{escape, partial_escape};

use super::{StartElement, XmlEvent};

/// Serialise events to a string.
///
/// A start tag immediately followed by its own end tag is written as an
/// empty element.
pub fn write_events(events: &[XmlEvent]) -> String {
    let mut out = String::new();
    write_events_to(events, &mut out);
    out
}

/// Serialise events, appending to `out`.
pub fn write_events_to(events: &[XmlEvent], out: &mut String) {
    let mut i = 0;
    while i < events.len() {
        match &events[i] {
            XmlEvent::Start(start) => {
                let self_closing = matches!(
                    events.get(i + 1),
                    Some(XmlEvent::End(end)) if end.name == start.name
                );
                write_start(start, self_closing, out);
                if self_closing {
                    i += 1;
                }
            }
            XmlEvent::End(end) => {
                out.push_str("</");
                out.push_str(&end.name.qualified());
                out.push('>');
            }
            XmlEvent::Characters(text) => out.push_str(&partial_escape(text.as_str())),
            XmlEvent::Raw(raw) => out.push_str(raw),
        }
        i += 1;
    }
}

fn write_start(start: &StartElement, self_closing: bool, out: &mut String) {
    out.push('<');
    out.push_str(&start.name.qualified());
    for attr in &start.attributes {
        out.push(' ');
        out.push_str(&attr.name.qualified());
        out.push_str("=\"");
        out.push_str(&escape(attr.value.as_str()));
        out.push('"');
    }
    out.push_str(if self_closing { "/>" } else { ">" });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::read_events;

    #[test]
    fn test_write_reproduces_markup() {
        let xml = r#"<?xml version="1.0"?><a xmlns:w="urn:w"><w:b w:val="x &amp; &quot;y&quot;"/><c>1 &lt; 2</c><!-- note --></a>"#;
        let events = read_events(xml).unwrap();
        assert_eq!(write_events(&events), xml);
    }
}
