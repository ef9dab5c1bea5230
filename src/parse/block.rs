//! Block parser.

use log::trace;

use super::ParseContext;
use super::field::ComplexFieldStack;
use super::merge::RunMerger;
use super::properties::parse_run_properties;
use super::skip::{AttributeStripper, SkipAction, SkipContext};
use crate::error::{Error, Result};
use crate::model::{
    Block, BlockBuilder, Chunk, ContainerKind, RunBuilder, RunContainerBuilder,
};
use crate::xml::names::{
    A_NS, W_NS, X_NS, is_block_start, is_paragraph_properties, is_run, is_run_properties,
    is_simple_field, is_text,
};
use crate::xml::{EndElement, EventCursor, QName, StartElement, XmlEvent, text_content};

/// Receives the chunks of a block or run container.
pub(super) trait ChunkSink {
    fn push_markup(&mut self, events: Vec<XmlEvent>);
    fn push_chunk(&mut self, chunk: Chunk);
}

impl ChunkSink for BlockBuilder {
    fn push_markup(&mut self, events: Vec<XmlEvent>) {
        self.add_markup(events);
    }

    fn push_chunk(&mut self, chunk: Chunk) {
        self.add_chunk(chunk);
    }
}

impl ChunkSink for RunContainerBuilder {
    fn push_markup(&mut self, events: Vec<XmlEvent>) {
        self.add_markup(events);
    }

    fn push_chunk(&mut self, chunk: Chunk) {
        self.add_chunk(chunk);
    }
}

/// Parses one block: `w:p`, `a:p`, `si` or `is`.
///
/// Holds the per-block state: the paragraph style every run resolves
/// against, and the complex fields open across runs.
pub struct BlockParser<'p, 'e, 'a> {
    pub(super) cursor: &'p mut EventCursor<'e>,
    pub(super) ctx: &'p mut ParseContext<'a>,
    pub(super) fields: ComplexFieldStack,
    pub(super) paragraph_style: Option<String>,
    pub(super) excluded: bool,
}

impl<'p, 'e, 'a> BlockParser<'p, 'e, 'a> {
    pub fn new(cursor: &'p mut EventCursor<'e>, ctx: &'p mut ParseContext<'a>) -> Self {
        Self {
            cursor,
            ctx,
            fields: ComplexFieldStack::new(),
            paragraph_style: None,
            excluded: false,
        }
    }

    /// Parse a block whose start tag was just consumed, up to and including
    /// its end tag.
    pub fn parse(mut self, start: &StartElement) -> Result<Block> {
        let mut tag = start.clone();
        AttributeStripper.strip(&mut tag);

        let mut builder = BlockBuilder::new(start.name.clone());
        builder.add_start_tag(tag);
        let end = self.parse_children(&start.name, &mut builder)?;
        builder.add_end_tag(end);
        builder.set_paragraph_style(self.paragraph_style.take(), self.excluded);

        let block = builder.build();
        trace!(
            "parsed {} with {} chunks: {:?}",
            block.name(),
            block.chunks().len(),
            block.text()
        );
        Ok(block)
    }

    /// Parse the children of a block or container up to the end of `parent`.
    pub(super) fn parse_children(
        &mut self,
        parent: &QName,
        sink: &mut dyn ChunkSink,
    ) -> Result<EndElement> {
        let mut pending: Vec<RunBuilder> = Vec::new();
        let mut unwrapped: Vec<QName> = Vec::new();

        loop {
            let Some(event) = self.cursor.next() else {
                return Err(Error::UnterminatedBlock(parent.qualified()));
            };
            match event {
                XmlEvent::Characters(_) if event.is_whitespace() => {}
                XmlEvent::Characters(text) => {
                    return Err(Error::UnexpectedStructure(format!(
                        "text {text:?} outside any run in {parent}"
                    )));
                }
                XmlEvent::Raw(_) => {
                    self.flush(&mut pending, sink);
                    sink.push_markup(vec![event.clone()]);
                }
                XmlEvent::End(end) if unwrapped.last() == Some(&end.name) => {
                    unwrapped.pop();
                }
                XmlEvent::End(end) if end.name == *parent => {
                    self.flush(&mut pending, sink);
                    return Ok(end.clone());
                }
                XmlEvent::End(end) => {
                    return Err(Error::UnexpectedStructure(format!(
                        "unexpected end of {} in {parent}",
                        end.name
                    )));
                }
                XmlEvent::Start(start) => {
                    self.parse_child(start, &mut pending, &mut unwrapped, sink)?;
                }
            }
        }
    }

    fn parse_child(
        &mut self,
        start: &'e StartElement,
        pending: &mut Vec<RunBuilder>,
        unwrapped: &mut Vec<QName>,
        sink: &mut dyn ChunkSink,
    ) -> Result<()> {
        let name = &start.name;
        let (ns, local) = (name.namespace.as_deref(), name.local.as_str());
        let config = self.ctx.config;

        if is_paragraph_properties(ns, local) {
            let events = self.take_element(start)?;
            self.read_paragraph_style(&events);
            self.flush(pending, sink);
            sink.push_markup(events);
        } else if is_run(ns, local) {
            let run = self.parse_run(start)?;
            pending.push(run);
        } else if is_text(ns, local) && name.in_namespace(X_NS) {
            let run = self.parse_bare_text(start)?;
            pending.push(run);
        } else if name.is(A_NS, "br") && config.add_line_separator_character {
            let run = self.parse_drawing_break(start)?;
            pending.push(run);
        } else if let Some(kind) = ContainerKind::of(name) {
            self.flush(pending, sink);
            let container = self.parse_container(kind, start)?;
            sink.push_chunk(Chunk::Container(container));
        } else if is_simple_field(ns, local) {
            let events = self.take_element(start)?;
            self.flush(pending, sink);
            sink.push_markup(events);
        } else {
            match self.ctx.skipper().action(name, SkipContext::Block)? {
                SkipAction::Skip => self.cursor.skip_element_rest(name)?,
                SkipAction::Unwrap => unwrapped.push(name.clone()),
                SkipAction::Keep if is_block_start(ns, local) => {
                    self.flush(pending, sink);
                    let block = BlockParser::new(&mut *self.cursor, &mut *self.ctx).parse(start)?;
                    let id = self.ctx.alloc(block);
                    sink.push_chunk(Chunk::Block(id));
                }
                SkipAction::Keep => {
                    let events = self.take_element(start)?;
                    self.flush(pending, sink);
                    sink.push_markup(events);
                }
            }
        }
        Ok(())
    }

    /// Merge the pending runs and hand them to the sink.
    pub(super) fn flush(&self, pending: &mut Vec<RunBuilder>, sink: &mut dyn ChunkSink) {
        if pending.is_empty() {
            return;
        }
        let config = self.ctx.config;
        let merger = RunMerger::new(config, self.ctx.styles, self.paragraph_style.as_deref());
        for run in merger.merge_all(std::mem::take(pending)) {
            sink.push_chunk(Chunk::Run(run.build(config)));
        }
    }

    /// Consume the rest of an element, returning all of its events with
    /// editing-history attributes removed.
    pub(super) fn take_element(&mut self, start: &StartElement) -> Result<Vec<XmlEvent>> {
        let mut events = vec![XmlEvent::Start(start.clone())];
        events.extend(self.cursor.take_element_rest(&start.name)?);
        for event in &mut events {
            if let XmlEvent::Start(start) = event {
                AttributeStripper.strip(start);
            }
        }
        Ok(events)
    }

    fn read_paragraph_style(&mut self, events: &[XmlEvent]) {
        let style = events.iter().find_map(|event| match event {
            XmlEvent::Start(start) if start.name.is(W_NS, "pStyle") => {
                start.attribute_ns(W_NS, "val").map(str::to_string)
            }
            _ => None,
        });
        self.excluded = style
            .as_deref()
            .is_some_and(|id| self.ctx.config.is_excluded_style(id));
        self.paragraph_style = style;
    }

    /// Resolve a finished run's effective properties and visibility.
    pub(super) fn finish_run(&self, run: &mut RunBuilder) {
        let config = self.ctx.config;
        run.combined = self.ctx.styles.combine(
            self.paragraph_style.as_deref(),
            run.properties.run_style(),
            &run.properties,
        );
        let style_excluded = run
            .properties
            .run_style()
            .is_some_and(|id| config.is_excluded_style(id));
        let vanished = run.combined.is_hidden() && !config.translate_hidden;
        run.hidden = run.hidden || self.excluded || style_excluded || vanished;
    }

    /// A SpreadsheetML string item holding plain `<t>` text.
    fn parse_bare_text(&mut self, start: &StartElement) -> Result<RunBuilder> {
        let content = self.cursor.take_element_rest(&start.name)?;
        let mut run = RunBuilder::new(StartElement::new(start.name.sibling("r")));
        run.bare = true;
        run.add_text(&text_content(&content));
        self.finish_run(&mut run);
        Ok(run)
    }

    /// A DrawingML `a:br`, exposed as a run holding the line separator.
    fn parse_drawing_break(&mut self, start: &StartElement) -> Result<RunBuilder> {
        let skipper = self.ctx.skipper();
        let mut run = RunBuilder::new(StartElement::new(start.name.sibling("r")));
        loop {
            let event = self
                .cursor
                .next()
                .ok_or_else(|| Error::UnterminatedElement(start.name.qualified()))?;
            match event {
                XmlEvent::Start(child)
                    if is_run_properties(child.name.namespace.as_deref(), &child.name.local) =>
                {
                    run.properties = parse_run_properties(self.cursor, child, &skipper)?;
                }
                XmlEvent::Start(child) => self.cursor.skip_element_rest(&child.name)?,
                XmlEvent::End(_) => break,
                _ => {}
            }
        }
        run.add_text(&self.ctx.config.line_separator.to_string());
        self.finish_run(&mut run);
        Ok(run)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::model::{BlockArena, RunChunk};
    use crate::parse::parse_block;
    use crate::styles::StyleDefinitions;
    use crate::xml::read_events;

    fn parse(xml: &str, config: &Config) -> Result<(Block, BlockArena)> {
        let styles = StyleDefinitions::new();
        let events = read_events(xml).unwrap();
        let mut cursor = EventCursor::new(&events);
        let mut ctx = ParseContext::new(config, &styles);
        let block = parse_block(&mut cursor, &mut ctx)?;
        Ok((block, ctx.into_arena()))
    }

    fn word(body: &str) -> String {
        format!(r#"<w:p xmlns:w="{W_NS}">{body}</w:p>"#)
    }

    #[test]
    fn test_paragraph_with_runs() {
        let xml = word(
            r#"<w:pPr><w:pStyle w:val="Heading1"/></w:pPr>
<w:r w:rsidR="00AB"><w:rPr><w:b/></w:rPr><w:t>Hello</w:t></w:r>
<w:proofErr w:type="spellStart"/>
<w:r><w:rPr><w:b/></w:rPr><w:t xml:space="preserve"> world</w:t></w:r>"#,
        );
        let (block, _) = parse(&xml, &Config::default()).unwrap();
        assert_eq!(block.paragraph_style(), Some("Heading1"));
        assert_eq!(block.chunks().len(), 3);
        assert_eq!(block.text(), "Hello world");
        let runs = block.runs();
        assert_eq!(runs.len(), 1);
        assert!(runs[0].start().attributes.is_empty());
    }

    #[test]
    fn test_revisions_are_accepted() {
        let xml = word(
            r#"<w:r><w:t>A</w:t></w:r><w:ins w:id="1"><w:r><w:t>B</w:t></w:r></w:ins><w:del w:id="2"><w:r><w:delText>C</w:delText></w:r></w:del>"#,
        );
        let (block, _) = parse(&xml, &Config::default()).unwrap();
        assert_eq!(block.text(), "AB");
        assert_eq!(block.runs().len(), 1);

        let config = Config::default().with_accept_revisions(false);
        assert!(matches!(parse(&xml, &config), Err(Error::RevisionsPresent(_))));
    }

    #[test]
    fn test_unexpected_text() {
        let xml = word("stray<w:r><w:t>A</w:t></w:r>");
        assert!(matches!(
            parse(&xml, &Config::default()),
            Err(Error::UnexpectedStructure(_))
        ));
    }

    #[test]
    fn test_unterminated_block() {
        let w = QName::new(Some("w"), "p", Some(W_NS));
        let events = vec![XmlEvent::Start(StartElement::new(w))];
        let config = Config::default();
        let styles = StyleDefinitions::new();
        let mut cursor = EventCursor::new(&events);
        let mut ctx = ParseContext::new(&config, &styles);
        assert!(matches!(
            parse_block(&mut cursor, &mut ctx),
            Err(Error::UnterminatedBlock(_))
        ));
    }

    #[test]
    fn test_hyperlink_container() {
        let xml = word(
            r#"<w:hyperlink r:id="rId4" xmlns:r="urn:r"><w:r><w:rPr><w:rStyle w:val="Hyperlink"/></w:rPr><w:t>link</w:t></w:r></w:hyperlink>"#,
        );
        let (block, _) = parse(&xml, &Config::default()).unwrap();
        let Chunk::Container(container) = &block.chunks()[1] else {
            panic!("expected container, got {:?}", block.chunks()[1]);
        };
        assert_eq!(container.kind(), ContainerKind::Hyperlink);
        assert_eq!(container.default_properties().run_style(), Some("Hyperlink"));
        assert_eq!(block.text(), "link");
    }

    #[test]
    fn test_content_control_prologue() {
        let xml = word(
            r#"<w:sdt><w:sdtPr><w:alias w:val="Name"/></w:sdtPr><w:sdtContent><w:r><w:t>Jane</w:t></w:r></w:sdtContent></w:sdt>"#,
        );
        let (block, _) = parse(&xml, &Config::default()).unwrap();
        let Chunk::Container(container) = &block.chunks()[1] else {
            panic!("expected container");
        };
        assert_eq!(container.kind(), ContainerKind::StructuredDocumentTag);
        assert_eq!(container.start_markup().events().len(), 6);
        assert_eq!(container.end_markup().events().len(), 2);
        assert_eq!(container.chunks().len(), 1);
    }

    #[test]
    fn test_excluded_paragraph_style_hides_runs() {
        let xml = word(r#"<w:pPr><w:pStyle w:val="Code"/></w:pPr><w:r><w:t>let x = 1;</w:t></w:r>"#);
        let config = Config::default().with_excluded_style("Code");
        let (block, arena) = parse(&xml, &config).unwrap();
        assert!(block.is_excluded());
        assert!(!block.has_visible_text(&arena));
    }

    #[test]
    fn test_sheet_bare_text() {
        let xml = format!(r#"<si xmlns="{X_NS}"><t xml:space="preserve"> total </t></si>"#);
        let (block, _) = parse(&xml, &Config::default()).unwrap();
        let runs = block.runs();
        assert_eq!(runs.len(), 1);
        assert!(runs[0].is_bare());
        assert_eq!(block.text(), " total ");
    }

    #[test]
    fn test_drawing_break_becomes_separator() {
        let xml = format!(
            r#"<a:p xmlns:a="{A_NS}"><a:r><a:rPr lang="en-US"/><a:t>one</a:t></a:r><a:br><a:rPr lang="en-US"/></a:br><a:r><a:rPr lang="en-US"/><a:t>two</a:t></a:r></a:p>"#
        );
        let config = Config::default().with_line_separator_character(true);
        let (block, _) = parse(&xml, &config).unwrap();
        assert_eq!(block.runs().len(), 1);
        assert_eq!(block.text(), "one\u{2028}two");

        let (block, _) = parse(&xml, &Config::default()).unwrap();
        assert_eq!(block.runs().len(), 2);
    }

    #[test]
    fn test_tab_as_character() {
        let xml = word(r#"<w:r><w:t>a</w:t><w:tab/><w:t>b</w:t></w:r>"#);
        let config = Config::default().with_tab_as_character(true);
        let (block, _) = parse(&xml, &config).unwrap();
        assert_eq!(block.runs()[0].body(), &[RunChunk::Text("a\tb".into())]);

        let (block, _) = parse(&xml, &Config::default()).unwrap();
        assert_eq!(block.runs()[0].body().len(), 3);
    }
}
