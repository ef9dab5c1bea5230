//! Run-level event emission shared by block serialisation and the writer.

use super::dialect::{Dialect, RunTags};
use crate::config::{Config, NO_BREAK_HYPHEN};
use crate::properties::RunProperties;
use crate::xml::{QName, StartElement, XML_NS, XmlEvent};

/// Emits runs: start tag, properties, text spans and in-run markup.
///
/// Runs are opened lazily, on the first content written after
/// [`RunEmitter::begin_run`], so that a run whose only content turned into
/// block-level markup (a DrawingML `a:br`) leaves no empty run behind.
/// Characters produced from markup at parse time (tab, line separator,
/// no-break hyphen) are expanded back into their elements.
pub struct RunEmitter<'a> {
    tags: &'a RunTags,
    config: &'a Config,
    out: Vec<XmlEvent>,
    current: Option<CurrentRun>,
    open: bool,
}

struct CurrentRun {
    start: StartElement,
    properties: Vec<XmlEvent>,
    /// Text written directly into the block, without a run wrapper.
    bare: bool,
}

impl<'a> RunEmitter<'a> {
    pub fn new(tags: &'a RunTags, config: &'a Config) -> Self {
        Self {
            tags,
            config,
            out: Vec::new(),
            current: None,
            open: false,
        }
    }

    pub fn tags(&self) -> &RunTags {
        self.tags
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Start a new run. Closes the current one.
    pub fn begin_run(&mut self, start: StartElement, properties: &RunProperties, bare: bool) {
        self.end_run();
        let properties = properties.to_events(&self.tags.properties());
        self.current = Some(CurrentRun {
            start,
            properties,
            bare,
        });
    }

    /// Start a run with the dialect's default run tag.
    pub fn begin_default_run(&mut self, properties: &RunProperties, bare: bool) {
        self.begin_run(StartElement::new(self.tags.run()), properties, bare);
    }

    /// Write the start tag of the current run now, even with no content.
    pub fn open_now(&mut self) {
        if self.open {
            return;
        }
        if self.current.is_none() {
            self.current = Some(CurrentRun {
                start: StartElement::new(self.tags.run()),
                properties: Vec::new(),
                bare: false,
            });
        }
        if let Some(run) = &self.current
            && !run.bare
        {
            self.out.push(XmlEvent::Start(run.start.clone()));
            self.out.extend(run.properties.iter().cloned());
        }
        self.open = true;
    }

    pub fn end_run(&mut self) {
        if !self.open {
            return;
        }
        if let Some(run) = &self.current
            && !run.bare
        {
            self.out.push(XmlEvent::End(run.start.end()));
        }
        self.open = false;
    }

    /// Write text into the current run, expanding special characters.
    pub fn text(&mut self, text: &str) {
        let mut span = String::new();
        for c in text.chars() {
            match self.special(c) {
                Some(special) => {
                    self.flush_span(&mut span);
                    self.write_special(special);
                }
                None => span.push(c),
            }
        }
        self.flush_span(&mut span);
    }

    /// Markup that belongs inside the run body (`w:fldChar`, `w:drawing`).
    pub fn run_markup(&mut self, events: &[XmlEvent]) {
        self.open_now();
        self.out.extend(events.iter().cloned());
    }

    /// Markup that belongs at block level. Closes the current run.
    pub fn block_markup(&mut self, events: &[XmlEvent]) {
        self.end_run();
        self.out.extend(events.iter().cloned());
    }

    /// Take the events written so far. An open run stays open.
    pub fn take_events(&mut self) -> Vec<XmlEvent> {
        std::mem::take(&mut self.out)
    }

    pub fn finish(mut self) -> Vec<XmlEvent> {
        self.end_run();
        self.out
    }

    fn special(&self, c: char) -> Option<Special> {
        match self.tags.dialect {
            Dialect::Word => {
                if c == '\t' && self.config.add_tab_as_character {
                    Some(Special::Tab)
                } else if c == self.config.line_separator && self.config.add_line_separator_character
                {
                    Some(Special::Break)
                } else if c == NO_BREAK_HYPHEN && self.config.replace_no_break_hyphen {
                    Some(Special::NoBreakHyphen)
                } else {
                    None
                }
            }
            Dialect::Drawing => (c == self.config.line_separator
                && self.config.add_line_separator_character)
                .then_some(Special::Break),
            Dialect::Sheet | Dialect::Math => None,
        }
    }

    fn write_special(&mut self, special: Special) {
        match (self.tags.dialect, special) {
            (Dialect::Drawing, Special::Break) => {
                // a:br is a sibling of a:r and carries the run's properties
                self.end_run();
                let br = StartElement::new(self.tags.name("br"));
                let end = br.end();
                self.out.push(XmlEvent::Start(br));
                if let Some(run) = &self.current {
                    self.out.extend(run.properties.iter().cloned());
                }
                self.out.push(XmlEvent::End(end));
            }
            (_, special) => {
                self.open_now();
                let start = StartElement::new(self.tags.name(special.local_name()));
                let end = start.end();
                self.out.push(XmlEvent::Start(start));
                self.out.push(XmlEvent::End(end));
            }
        }
    }

    fn flush_span(&mut self, span: &mut String) {
        if span.is_empty() {
            return;
        }
        self.open_now();
        let mut start = StartElement::new(self.tags.text());
        if self.tags.preserves_space() && span.chars().any(char::is_whitespace) {
            start
                .attributes
                .push(crate::xml::Attribute::new(xml_space(), "preserve"));
        }
        let end = start.end();
        self.out.push(XmlEvent::Start(start));
        self.out.push(XmlEvent::Characters(std::mem::take(span)));
        self.out.push(XmlEvent::End(end));
    }
}

#[derive(Debug, Clone, Copy)]
enum Special {
    Tab,
    Break,
    NoBreakHyphen,
}

impl Special {
    fn local_name(self) -> &'static str {
        match self {
            Special::Tab => "tab",
            Special::Break => "br",
            Special::NoBreakHyphen => "noBreakHyphen",
        }
    }
}

pub fn xml_space() -> QName {
    QName::new(Some("xml"), "space", Some(XML_NS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::names::W_NS;
    use crate::xml::write_events;

    fn word() -> RunTags {
        RunTags::new(Dialect::Word, Some("w"))
    }

    #[test]
    fn test_whitespace_forces_preserve() {
        let tags = word();
        let config = Config::default();
        let mut emitter = RunEmitter::new(&tags, &config);
        emitter.begin_default_run(&RunProperties::empty(), false);
        emitter.text("a\u{a0}b");
        let xml = write_events(&emitter.finish());
        assert_eq!(xml, "<w:r><w:t xml:space=\"preserve\">a\u{a0}b</w:t></w:r>");
    }

    #[test]
    fn test_tab_expands_only_when_configured() {
        let tags = word();
        let config = Config::default().with_tab_as_character(true);
        let mut emitter = RunEmitter::new(&tags, &config);
        emitter.begin_default_run(&RunProperties::empty(), false);
        emitter.text("a\tb");
        let events = emitter.finish();
        assert!(events.iter().any(|e| e.is_start_of(W_NS, "tab")));
        assert_eq!(write_events(&events), "<w:r><w:t>a</w:t><w:tab/><w:t>b</w:t></w:r>");

        let config = Config::default();
        let mut emitter = RunEmitter::new(&tags, &config);
        emitter.begin_default_run(&RunProperties::empty(), false);
        emitter.text("a\tb");
        assert!(!emitter.finish().iter().any(|e| e.is_start_of(W_NS, "tab")));
    }

    #[test]
    fn test_drawing_break_leaves_the_run() {
        let tags = RunTags::new(Dialect::Drawing, Some("a"));
        let config = Config::default().with_line_separator_character(true);
        let mut emitter = RunEmitter::new(&tags, &config);
        emitter.begin_default_run(&RunProperties::empty(), false);
        emitter.text("one\u{2028}two");
        let xml = write_events(&emitter.finish());
        assert_eq!(xml, "<a:r><a:t>one</a:t></a:r><a:br/><a:r><a:t>two</a:t></a:r>");
    }

    #[test]
    fn test_bare_text_has_no_run_wrapper() {
        let tags = RunTags::new(Dialect::Sheet, None);
        let config = Config::default();
        let mut emitter = RunEmitter::new(&tags, &config);
        emitter.begin_default_run(&RunProperties::empty(), true);
        emitter.text("cell");
        assert_eq!(write_events(&emitter.finish()), "<t>cell</t>");
    }
}
