//! Forward-only cursor over a buffered event list.

use super::{QName, XmlEvent};
use crate::error::{Error, Result};

/// A forward-only position in an event list with one-token lookahead.
///
/// Nested parses borrow the same cursor mutably; only the innermost parse
/// frame advances it at any time.
#[derive(Debug)]
pub struct EventCursor<'e> {
    events: &'e [XmlEvent],
    pos: usize,
}

impl<'e> EventCursor<'e> {
    pub fn new(events: &'e [XmlEvent]) -> Self {
        Self { events, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.events.len()
    }

    /// Look at the next event without consuming it.
    pub fn peek(&self) -> Option<&'e XmlEvent> {
        self.events.get(self.pos)
    }

    /// Look at the next start or end tag, skipping whitespace-only text.
    ///
    /// Returns `None` if non-whitespace text or the end of the stream comes
    /// first.
    pub fn peek_tag(&self) -> Option<&'e XmlEvent> {
        self.events[self.pos.min(self.events.len())..]
            .iter()
            .find(|e| !e.is_whitespace())
            .filter(|e| matches!(e, XmlEvent::Start(_) | XmlEvent::End(_)))
    }

    /// Consume the next event.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<&'e XmlEvent> {
        let event = self.events.get(self.pos)?;
        self.pos += 1;
        Some(event)
    }

    /// Consume whitespace-only text events.
    pub fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(XmlEvent::is_whitespace) {
            self.pos += 1;
        }
    }

    /// Consume the remainder of an element whose start tag was just read,
    /// returning its content and end tag.
    pub fn take_element_rest(&mut self, name: &QName) -> Result<Vec<XmlEvent>> {
        let mut events = Vec::new();
        let mut depth = 0usize;
        loop {
            let event = self
                .next()
                .ok_or_else(|| Error::UnterminatedElement(name.qualified()))?;
            events.push(event.clone());
            match event {
                XmlEvent::Start(_) => depth += 1,
                XmlEvent::End(_) if depth == 0 => return Ok(events),
                XmlEvent::End(_) => depth -= 1,
                _ => {}
            }
        }
    }

    /// Consume the remainder of an element whose start tag was just read.
    pub fn skip_element_rest(&mut self, name: &QName) -> Result<()> {
        self.take_element_rest(name).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::read_events;

    #[test]
    fn test_peek_tag_skips_whitespace() {
        let events = read_events("<a>\n  <b/>\n</a>").unwrap();
        let mut cursor = EventCursor::new(&events);
        cursor.next();
        assert_eq!(cursor.peek_tag().and_then(XmlEvent::start_name).unwrap().local, "b");
        assert!(cursor.peek().unwrap().is_whitespace());
    }

    #[test]
    fn test_take_element_rest() {
        let events = read_events("<a><b><c/>x</b><d/></a>").unwrap();
        let mut cursor = EventCursor::new(&events);
        cursor.next();
        let b = cursor.next().unwrap().start_name().unwrap().clone();
        let rest = cursor.take_element_rest(&b).unwrap();
        assert_eq!(rest.len(), 4);
        assert!(cursor.peek().unwrap().start_name().is_some_and(|n| n.local == "d"));
    }

    #[test]
    fn test_unterminated_element() {
        let b = crate::xml::StartElement::new(QName::local("b"));
        let events = vec![XmlEvent::Start(b.clone()), XmlEvent::Characters("x".into())];
        let mut cursor = EventCursor::new(&events);
        cursor.next();
        assert!(matches!(
            cursor.take_element_rest(&b.name),
            Err(Error::UnterminatedElement(_))
        ));
    }
}
