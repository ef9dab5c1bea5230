//! Adapter from `quick_xml::NsReader` to owned [`XmlEvent`]s.

use std::borrow::Cow;

use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{QName as RawName, ResolveResult};
use quick_xml::reader::NsReader;

use super::{Attribute, EndElement, QName, StartElement, XmlEvent};
use crate::error::{Error, Result};

/// Read a whole document part into a list of events.
///
/// Empty elements are reported as a start immediately followed by an end.
/// Adjacent text, entity and character references and CDATA sections are
/// coalesced into a single [`XmlEvent::Characters`]. Declarations, comments,
/// processing instructions and doctypes are kept verbatim as
/// [`XmlEvent::Raw`].
pub fn read_events(input: &str) -> Result<Vec<XmlEvent>> {
    let mut reader = NsReader::from_str(input);
    reader.config_mut().trim_text(false);

    let mut events = Vec::new();
    let mut text = String::new();

    loop {
        let start = reader.buffer_position() as usize;
        let event = reader.read_event()?;
        let end = reader.buffer_position() as usize;

        match &event {
            Event::Text(e) => {
                text.push_str(&String::from_utf8_lossy(e.as_ref()));
                continue;
            }
            Event::GeneralRef(e) => {
                let entity = String::from_utf8_lossy(e.as_ref());
                match resolve_entity(&entity) {
                    Some(resolved) => text.push(resolved),
                    None => {
                        return Err(Error::MalformedXml(format!(
                            "unknown entity reference &{entity};"
                        )));
                    }
                }
                continue;
            }
            Event::CData(_) => {
                let raw = &input[start..end];
                let content = raw
                    .strip_prefix("<![CDATA[")
                    .and_then(|s| s.strip_suffix("]]>"))
                    .unwrap_or(raw);
                text.push_str(content);
                continue;
            }
            _ => {}
        }

        if !text.is_empty() {
            events.push(XmlEvent::Characters(std::mem::take(&mut text)));
        }

        match event {
            Event::Start(e) => {
                events.push(XmlEvent::Start(convert_start(&reader, &e)?));
            }
            Event::Empty(e) => {
                let start = convert_start(&reader, &e)?;
                let end = start.end();
                events.push(XmlEvent::Start(start));
                events.push(XmlEvent::End(end));
            }
            Event::End(e) => {
                let (resolved, _) = reader.resolver().resolve_element(e.name());
                let name = convert_name(e.name(), resolved);
                events.push(XmlEvent::End(EndElement { name }));
            }
            Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_) => {
                events.push(XmlEvent::Raw(input[start..end].to_string()));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(events)
}

/// Decode part bytes to a string.
///
/// Honours a byte-order mark first, then tries UTF-8, then the encoding named
/// in the XML declaration, and finally falls back to Windows-1252.
pub fn decode_part(bytes: &[u8]) -> Cow<'_, str> {
    if let Some((encoding, _)) = encoding_rs::Encoding::for_bom(bytes) {
        let (result, _, _) = encoding.decode(bytes);
        return result;
    }

    let (result, _, malformed) = encoding_rs::UTF_8.decode(bytes);
    if !malformed {
        return result;
    }

    if let Some(label) = declared_encoding(bytes)
        && let Some(encoding) = encoding_rs::Encoding::for_label(label.as_bytes())
    {
        let (result, _, _) = encoding.decode(bytes);
        return result;
    }

    let (result, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
    result
}

/// Pull `encoding="..."` out of an XML declaration.
fn declared_encoding(bytes: &[u8]) -> Option<String> {
    let head = &bytes[..bytes.len().min(256)];
    let head = String::from_utf8_lossy(head);
    let decl_end = head.find("?>")?;
    let decl = &head[..decl_end];
    let rest = &decl[decl.find("encoding")? + "encoding".len()..];
    let rest = rest.trim_start().strip_prefix('=')?.trim_start();
    let quote = rest.chars().next().filter(|c| matches!(c, '"' | '\''))?;
    let value = rest[quote.len_utf8()..].split(quote).next()?;
    Some(value.to_string())
}

fn convert_start(reader: &NsReader<&[u8]>, e: &BytesStart<'_>) -> Result<StartElement> {
    let (resolved, _) = reader.resolver().resolve_element(e.name());
    let name = convert_name(e.name(), resolved);

    let mut attributes = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| Error::MalformedXml(err.to_string()))?;
        let raw_value = String::from_utf8_lossy(&attr.value);
        let value = unescape(&raw_value)
            .map_err(|err| Error::MalformedXml(err.to_string()))?
            .into_owned();
        // Declarations keep their raw spelling and no namespace.
        let name = if attr.key.as_namespace_binding().is_some() {
            convert_name(attr.key, ResolveResult::Unbound)
        } else {
            let (resolved, _) = reader.resolver().resolve_attribute(attr.key);
            convert_name(attr.key, resolved)
        };
        attributes.push(Attribute { name, value });
    }

    Ok(StartElement { name, attributes })
}

/// Unknown prefixes and unbound names get no namespace.
fn convert_name(raw: RawName<'_>, resolved: ResolveResult<'_>) -> QName {
    let prefix = raw
        .prefix()
        .map(|prefix| String::from_utf8_lossy(prefix.as_ref()).into_owned());
    let local = String::from_utf8_lossy(raw.local_name().as_ref()).into_owned();
    let namespace = match resolved {
        ResolveResult::Bound(namespace) => Some(String::from_utf8_lossy(namespace.as_ref()).into_owned()),
        ResolveResult::Unbound | ResolveResult::Unknown(_) => None,
    };
    QName::new(prefix.as_deref(), local, namespace.as_deref())
}

fn resolve_entity(entity: &str) -> Option<char> {
    match entity {
        "apos" => return Some('\''),
        "quot" => return Some('"'),
        "lt" => return Some('<'),
        "gt" => return Some('>'),
        "amp" => return Some('&'),
        _ => {}
    }

    if let Some(hex) = entity.strip_prefix("#x") {
        u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
    } else if let Some(dec) = entity.strip_prefix('#') {
        dec.parse::<u32>().ok().and_then(char::from_u32)
    } else {
        None
    }
}
