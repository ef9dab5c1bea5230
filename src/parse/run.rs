use super::block::BlockParser;
use super::field::FieldChar;
use super::properties::parse_run_properties;
use super::skip::{AttributeStripper, SkipAction, SkipContext};
use crate::config::NO_BREAK_HYPHEN;
use crate::error::{Error, Result};
use crate::model::{NestedItem, RunBuilder, graphic_metadata};
use crate::xml::names::{M_NS, MC_NS, W_NS, is_block_start, is_run_properties, is_text};
use crate::xml::{QName, StartElement, XmlEvent, text_content};

/// `w:br` without a type (or `textWrapping`) and `w:cr` are line breaks;
/// page and column breaks are not.
fn is_line_break(start: &StartElement) -> bool {
    match start.name.local.as_str() {
        "cr" => true,
        "br" => start
            .attribute_ns(W_NS, "type")
            .is_none_or(|kind| kind == "textWrapping"),
        _ => false,
    }
}

impl BlockParser<'_, '_, '_> {
    /// Parse a run whose start tag was just consumed.
    pub(super) fn parse_run(&mut self, start: &StartElement) -> Result<RunBuilder> {
        let mut tag = start.clone();
        AttributeStripper.strip(&mut tag);
        let mut run = RunBuilder::new(tag);
        let skipper = self.ctx.skipper();

        if let Some(XmlEvent::Start(first)) = self.cursor.peek_tag()
            && is_run_properties(first.name.namespace.as_deref(), &first.name.local)
        {
            self.cursor.skip_whitespace();
            self.cursor.next();
            run.properties = parse_run_properties(self.cursor, first, &skipper)?;
        }

        let mut unwrapped: Vec<QName> = Vec::new();
        loop {
            let event = self
                .cursor
                .next()
                .ok_or_else(|| Error::UnterminatedRun(start.name.qualified()))?;
            match event {
                XmlEvent::End(end) if unwrapped.last() == Some(&end.name) => {
                    unwrapped.pop();
                }
                XmlEvent::End(end) if end.name == start.name => break,
                XmlEvent::End(end) => {
                    return Err(Error::UnexpectedStructure(format!(
                        "unexpected end of {} in {}",
                        end.name, start.name
                    )));
                }
                XmlEvent::Characters(_) if event.is_whitespace() => {}
                XmlEvent::Characters(text) => {
                    return Err(Error::UnexpectedStructure(format!(
                        "text {text:?} directly inside {}",
                        start.name
                    )));
                }
                XmlEvent::Raw(_) => run.add_markup(vec![event.clone()]),
                XmlEvent::Start(child) => match skipper.action(&child.name, SkipContext::Run)? {
                    SkipAction::Skip => self.cursor.skip_element_rest(&child.name)?,
                    SkipAction::Unwrap => unwrapped.push(child.name.clone()),
                    SkipAction::Keep => self.parse_run_child(child, &mut run)?,
                },
            }
        }

        self.finish_run(&mut run);
        Ok(run)
    }

    fn parse_run_child(&mut self, child: &StartElement, run: &mut RunBuilder) -> Result<()> {
        let config = self.ctx.config;
        let name = &child.name;

        if is_text(name.namespace.as_deref(), &name.local) || name.is(M_NS, "t") {
            let content = self.cursor.take_element_rest(name)?;
            self.add_run_text(run, &text_content(&content));
            return Ok(());
        }

        if name.in_namespace(W_NS) {
            match name.local.as_str() {
                "instrText" => {
                    let events = self.take_element(child)?;
                    self.fields.instruction(&text_content(&events[1..]));
                    run.complex_codes = true;
                    run.add_markup(events);
                    return Ok(());
                }
                "fldChar" => {
                    if let Some(field_char) = child
                        .attribute_ns(W_NS, "fldCharType")
                        .and_then(FieldChar::from_attribute)
                    {
                        self.fields.apply(field_char, config);
                    }
                    let events = self.take_element(child)?;
                    run.complex_codes = true;
                    run.add_markup(events);
                    return Ok(());
                }
                "tab" if config.add_tab_as_character => {
                    self.cursor.skip_element_rest(name)?;
                    self.add_run_text(run, "\t");
                    return Ok(());
                }
                "br" | "cr" if config.add_line_separator_character && is_line_break(child) => {
                    self.cursor.skip_element_rest(name)?;
                    self.add_run_text(run, &config.line_separator.to_string());
                    return Ok(());
                }
                "noBreakHyphen" if config.replace_no_break_hyphen => {
                    self.cursor.skip_element_rest(name)?;
                    self.add_run_text(run, &NO_BREAK_HYPHEN.to_string());
                    return Ok(());
                }
                _ => {}
            }
        }

        self.parse_run_markup(child, run)
    }

    /// Text inside a field code or a non-persistent field result is not
    /// translatable; the run keeps it but is marked as carrying field codes.
    fn add_run_text(&self, run: &mut RunBuilder, text: &str) {
        if !self.fields.content_is_translatable() {
            run.complex_codes = true;
        }
        run.add_text(text);
    }

    /// Markup inside a run: drawings, objects, symbols, footnote references.
    ///
    /// Blocks nested inside (text box paragraphs) are parsed recursively.
    /// Those with visible content become nested blocks of the run, the rest
    /// are kept as markup.
    fn parse_run_markup(&mut self, start: &StartElement, run: &mut RunBuilder) -> Result<()> {
        let config = self.ctx.config;
        let mut tag = start.clone();
        AttributeStripper.strip(&mut tag);
        let mut buffer = vec![XmlEvent::Start(tag)];
        let mut depth = 1usize;

        while depth > 0 {
            let event = self
                .cursor
                .next()
                .ok_or_else(|| Error::UnterminatedElement(start.name.qualified()))?;
            match event {
                XmlEvent::Start(child) if child.name.is(MC_NS, "Fallback") => {
                    buffer.push(XmlEvent::Start(child.clone()));
                    buffer.extend(self.cursor.take_element_rest(&child.name)?);
                }
                XmlEvent::Start(child)
                    if is_block_start(child.name.namespace.as_deref(), &child.name.local) =>
                {
                    let block = BlockParser::new(&mut *self.cursor, &mut *self.ctx).parse(child)?;
                    if block.has_visible_content(self.ctx.arena()) {
                        self.push_run_markup(run, std::mem::take(&mut buffer));
                        let id = self.ctx.alloc(block);
                        run.add_nested_block(id);
                    } else {
                        buffer.extend(block.to_events(self.ctx.arena(), config));
                    }
                }
                XmlEvent::Start(child) => {
                    depth += 1;
                    let mut child = child.clone();
                    AttributeStripper.strip(&mut child);
                    buffer.push(XmlEvent::Start(child));
                }
                XmlEvent::End(end) => {
                    depth -= 1;
                    buffer.push(XmlEvent::End(end.clone()));
                }
                other => buffer.push(other.clone()),
            }
        }

        self.push_run_markup(run, buffer);
        Ok(())
    }

    fn push_run_markup(&self, run: &mut RunBuilder, events: Vec<XmlEvent>) {
        if events.is_empty() {
            return;
        }
        if !self.ctx.config.exclude_graphic_metadata {
            for (_, text) in graphic_metadata(&events) {
                run.add_nested_item(NestedItem::Attribute(text));
            }
        }
        run.add_markup(events);
    }
}
