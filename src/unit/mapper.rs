//! Block linearization.

use log::trace;

use super::{
    AttributeSlot, Code, CodePayload, Fragment, IdGenerator, Placement, RunFormat, TagRole,
    TextUnit, UnitId, push_marker,
};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::{
    Block, BlockArena, BlockId, Chunk, Run, RunChunk, RunContainer, RunEmitter, RunTags,
    graphic_metadata,
};
use crate::properties::RunProperties;
use crate::xml::XmlEvent;

/// Turns parsed blocks into text units.
///
/// Holds no mutable state of its own; unit ids come from the generator the
/// caller passes in, and each unit scopes the ids of its secondary units
/// under its own.
pub struct TextUnitMapper<'a> {
    config: &'a Config,
    arena: &'a BlockArena,
}

impl<'a> TextUnitMapper<'a> {
    pub fn new(config: &'a Config, arena: &'a BlockArena) -> Self {
        Self { config, arena }
    }

    /// Map a top-level block.
    ///
    /// Returns the block's unit first, followed by its secondary units in
    /// document order. A block without text yields nothing unless it holds
    /// secondary units; it then yields a non-translatable anchor unit that
    /// references them.
    pub fn map(&self, block: &Block, ids: &mut IdGenerator) -> Result<Vec<TextUnit>> {
        self.map_with_id(block, ids.next_id(), false)
    }

    fn map_with_id(&self, block: &Block, id: UnitId, referent: bool) -> Result<Vec<TextUnit>> {
        let chunks = block.chunks();
        if chunks.len() <= 2 {
            return Ok(Vec::new());
        }
        let (Some(Chunk::Markup(first)), Some(Chunk::Markup(last))) = (chunks.first(), chunks.last())
        else {
            return Err(Error::UnexpectedChunk("block not delimited by markup"));
        };

        let tags = block.tags();
        let bare = block.runs().first().is_some_and(|run| run.is_bare());
        let base = RunFormat::plain(&tags, bare);
        let mut linearizer = Linearizer {
            mapper: self,
            tags: &tags,
            base: &base,
            text: String::new(),
            codes: Vec::new(),
            stack: Vec::new(),
            children: IdGenerator::scoped(&id),
            secondary: Vec::new(),
            has_text: false,
        };
        for chunk in &chunks[1..chunks.len() - 1] {
            linearizer.chunk(chunk)?;
        }
        linearizer.close_all();

        let Linearizer {
            text,
            codes,
            secondary,
            has_text,
            ..
        } = linearizer;
        if !has_text && secondary.is_empty() {
            trace!("block {id} has no text, no unit");
            return Ok(Vec::new());
        }

        trace!(
            "unit {id}: {} codes, {} secondary units, text {:?}",
            codes.len(),
            secondary.len(),
            super::plain_text(&text)
        );
        let unit = TextUnit {
            id,
            text,
            codes,
            prefix: first.events(),
            suffix: last.events(),
            tags: tags.clone(),
            base: base.clone(),
            translatable: has_text,
            referent,
        };
        let mut units = Vec::with_capacity(secondary.len() + 1);
        units.push(unit);
        units.extend(secondary);
        Ok(units)
    }
}

/// An open paired code.
struct Frame {
    code: usize,
    combined: RunProperties,
    container: bool,
}

/// Linearization state for one block.
struct Linearizer<'m, 'a> {
    mapper: &'m TextUnitMapper<'a>,
    tags: &'m RunTags,
    base: &'m RunFormat,
    text: String,
    codes: Vec<Code>,
    stack: Vec<Frame>,
    children: IdGenerator,
    secondary: Vec<TextUnit>,
    has_text: bool,
}

impl Linearizer<'_, '_> {
    fn add_code(&mut self, payload: CodePayload) -> usize {
        let id = self.codes.len();
        self.codes.push(Code { id, payload });
        id
    }

    fn isolated(&mut self, payload: CodePayload) {
        let index = self.add_code(payload);
        push_marker(&mut self.text, TagRole::Isolated, index);
    }

    fn open(&mut self, payload: CodePayload, combined: RunProperties, container: bool) {
        let code = self.add_code(payload);
        push_marker(&mut self.text, TagRole::Opening, code);
        self.stack.push(Frame {
            code,
            combined,
            container,
        });
    }

    fn close_top(&mut self) {
        if let Some(frame) = self.stack.pop() {
            push_marker(&mut self.text, TagRole::Closing, frame.code);
        }
    }

    fn close_all(&mut self) {
        while !self.stack.is_empty() {
            self.close_top();
        }
    }

    fn chunk(&mut self, chunk: &Chunk) -> Result<()> {
        let arena = self.mapper.arena;
        match chunk {
            Chunk::Markup(markup) => {
                let fragment = self.events_fragment(markup.events(), true);
                self.isolated(CodePayload::Markup {
                    fragments: vec![fragment],
                    placement: Placement::Block,
                });
            }
            Chunk::Run(run) if run.has_visible_text() => self.visible_run(run)?,
            Chunk::Run(run) => {
                let mut fragments = Vec::new();
                let mut emitter = RunEmitter::new(self.tags, self.mapper.config);
                self.run_fragments(run, &mut emitter, &mut fragments)?;
                let expose = !run.is_hidden() && !run.has_complex_codes();
                self.push_events(&mut fragments, emitter.finish(), expose);
                self.isolated(CodePayload::Markup {
                    fragments,
                    placement: Placement::Block,
                });
            }
            Chunk::Container(container) if container.has_visible_text(arena) => {
                self.container(container)?;
            }
            Chunk::Container(container) => {
                let mut fragments = Vec::new();
                let mut emitter = RunEmitter::new(self.tags, self.mapper.config);
                self.container_fragments(container, &mut emitter, &mut fragments)?;
                self.push_events(&mut fragments, emitter.finish(), true);
                self.isolated(CodePayload::Markup {
                    fragments,
                    placement: Placement::Block,
                });
            }
            Chunk::Block(id) => self.nested(*id, Placement::Block)?,
        }
        Ok(())
    }

    fn visible_run(&mut self, run: &Run) -> Result<()> {
        self.align(run);
        for chunk in run.body() {
            match chunk {
                RunChunk::Text(text) => {
                    self.text.push_str(text);
                    self.has_text = true;
                }
                RunChunk::Markup(markup) => {
                    let fragment = self.events_fragment(markup.events(), true);
                    self.isolated(CodePayload::Markup {
                        fragments: vec![fragment],
                        placement: Placement::Run,
                    });
                }
                RunChunk::Nested(id) => self.nested(*id, Placement::Run)?,
            }
        }
        Ok(())
    }

    /// Close open formatting this run does not carry, then open the run's
    /// own formatting unless it is already on top.
    fn align(&mut self, run: &Run) {
        let combined = run.combined_properties();
        while let Some(top) = self.stack.last()
            && !top.container
            && !combined.is_superset_of(&top.combined)
        {
            self.close_top();
        }

        let covered = match self.stack.last() {
            Some(top) => top.combined == *combined,
            None => combined.is_empty() && run.is_bare() == self.base.bare,
        };
        if covered {
            return;
        }
        let format = RunFormat {
            run: run.start().clone(),
            direct: run.properties().clone(),
            combined: combined.clone(),
            bare: run.is_bare(),
        };
        self.open(CodePayload::Properties(format), combined.clone(), false);
    }

    fn container(&mut self, container: &RunContainer) -> Result<()> {
        let defaults = RunFormat {
            run: crate::xml::StartElement::new(self.tags.run()),
            direct: container.default_properties().clone(),
            combined: container.default_combined_properties().clone(),
            bare: false,
        };
        let combined = defaults.combined.clone();
        let payload = CodePayload::Container {
            start: container.start_markup().clone(),
            end: container.end_markup().clone(),
            defaults,
        };
        self.open(payload, combined, true);
        let code = self.codes.len() - 1;

        for chunk in container.chunks() {
            self.chunk(chunk)?;
        }

        while let Some(frame) = self.stack.pop() {
            push_marker(&mut self.text, TagRole::Closing, frame.code);
            if frame.code == code {
                break;
            }
        }
        Ok(())
    }

    fn nested(&mut self, id: BlockId, placement: Placement) -> Result<()> {
        let arena = self.mapper.arena;
        let block = arena
            .get(id)
            .ok_or(Error::UnexpectedChunk("nested block missing from arena"))?;
        match self.nested_fragment(block)? {
            Fragment::Unit(unit) => self.isolated(CodePayload::Reference { unit, placement }),
            fragment => self.isolated(CodePayload::Markup {
                fragments: vec![fragment],
                placement,
            }),
        }
        Ok(())
    }

    /// A nested block as a secondary unit, or as plain markup when it
    /// yields none.
    fn nested_fragment(&mut self, block: &Block) -> Result<Fragment> {
        let child = self.children.next_id();
        let units = self.mapper.map_with_id(block, child.clone(), true)?;
        if units.first().is_some_and(|unit| unit.id == child) {
            self.secondary.extend(units);
            return Ok(Fragment::Unit(child));
        }
        let events = block.to_events(self.mapper.arena, self.mapper.config);
        Ok(self.events_fragment(events, true))
    }

    /// Literal events, with attribute-embedded text split out into
    /// secondary units when `expose` is set.
    fn events_fragment(&mut self, events: Vec<XmlEvent>, expose: bool) -> Fragment {
        let mut attributes = Vec::new();
        if expose && !self.mapper.config.exclude_graphic_metadata {
            for (event, found) in graphic_metadata(&events) {
                let unit = self.children.next_id();
                trace!("attribute unit {unit} from {}", found.element);
                self.secondary.push(TextUnit {
                    id: unit.clone(),
                    text: found.text,
                    codes: Vec::new(),
                    prefix: Vec::new(),
                    suffix: Vec::new(),
                    tags: self.tags.clone(),
                    base: RunFormat::plain(self.tags, false),
                    translatable: true,
                    referent: true,
                });
                attributes.push(AttributeSlot {
                    event,
                    attribute: found.attribute,
                    unit,
                });
            }
        }
        Fragment::Events { events, attributes }
    }

    fn push_events(&mut self, fragments: &mut Vec<Fragment>, events: Vec<XmlEvent>, expose: bool) {
        if !events.is_empty() {
            let fragment = self.events_fragment(events, expose);
            fragments.push(fragment);
        }
    }

    /// Serialise a run without visible text. Nested blocks of runs that are
    /// neither hidden nor field code still become secondary units.
    fn run_fragments(
        &mut self,
        run: &Run,
        emitter: &mut RunEmitter<'_>,
        fragments: &mut Vec<Fragment>,
    ) -> Result<()> {
        let arena = self.mapper.arena;
        let config = self.mapper.config;
        let expose = !run.is_hidden() && !run.has_complex_codes();

        emitter.begin_run(run.start().clone(), run.properties(), run.is_bare());
        if run.body().is_empty() {
            emitter.open_now();
        }
        for chunk in run.body() {
            match chunk {
                RunChunk::Text(text) => emitter.text(text),
                RunChunk::Markup(markup) => emitter.run_markup(&markup.events()),
                RunChunk::Nested(id) => {
                    let block = arena
                        .get(*id)
                        .ok_or(Error::UnexpectedChunk("nested block missing from arena"))?;
                    if expose {
                        emitter.open_now();
                        let before = emitter.take_events();
                        self.push_events(fragments, before, expose);
                        let fragment = self.nested_fragment(block)?;
                        fragments.push(fragment);
                    } else {
                        emitter.run_markup(&block.to_events(arena, config));
                    }
                }
            }
        }
        emitter.end_run();
        Ok(())
    }

    fn container_fragments(
        &mut self,
        container: &RunContainer,
        emitter: &mut RunEmitter<'_>,
        fragments: &mut Vec<Fragment>,
    ) -> Result<()> {
        let arena = self.mapper.arena;
        emitter.block_markup(&container.start_markup().events());
        for chunk in container.chunks() {
            match chunk {
                Chunk::Markup(markup) => emitter.block_markup(&markup.events()),
                Chunk::Run(run) => self.run_fragments(run, emitter, fragments)?,
                Chunk::Container(inner) => self.container_fragments(inner, emitter, fragments)?,
                Chunk::Block(id) => {
                    let block = arena
                        .get(*id)
                        .ok_or(Error::UnexpectedChunk("nested block missing from arena"))?;
                    let before = emitter.take_events();
                    self.push_events(fragments, before, true);
                    let fragment = self.nested_fragment(block)?;
                    fragments.push(fragment);
                }
            }
        }
        emitter.block_markup(&container.end_markup().events());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::{ParseContext, parse_block};
    use crate::styles::StyleDefinitions;
    use crate::unit::{Token, tokenize};
    use crate::xml::names::{W_NS, WP_NS};
    use crate::xml::{EventCursor, read_events};

    fn map(body: &str, config: &Config) -> Vec<TextUnit> {
        let xml = format!(r#"<w:p xmlns:w="{W_NS}" xmlns:wp="{WP_NS}">{body}</w:p>"#);
        let styles = StyleDefinitions::new();
        let events = read_events(&xml).unwrap();
        let mut cursor = EventCursor::new(&events);
        let mut ctx = ParseContext::new(config, &styles);
        let block = parse_block(&mut cursor, &mut ctx).unwrap();
        let arena = ctx.into_arena();
        let mut ids = IdGenerator::new("tu");
        TextUnitMapper::new(config, &arena).map(&block, &mut ids).unwrap()
    }

    fn roles(unit: &TextUnit) -> Vec<TagRole> {
        tokenize(&unit.text)
            .unwrap()
            .into_iter()
            .filter_map(|token| match token {
                Token::Code(role, _) => Some(role),
                Token::Text(_) => None,
            })
            .collect()
    }

    #[test]
    fn test_empty_run_yields_no_unit() {
        let units = map("<w:r><w:t></w:t></w:r>", &Config::default());
        assert!(units.is_empty());
    }

    #[test]
    fn test_plain_run_has_no_codes() {
        let units = map("<w:r><w:t>Hello</w:t></w:r>", &Config::default());
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].text, "Hello");
        assert!(units[0].codes.is_empty());
        assert!(units[0].translatable);
    }

    #[test]
    fn test_formatting_codes_are_paired() {
        let units = map(
            r#"<w:r><w:t xml:space="preserve">Plain </w:t></w:r><w:r><w:rPr><w:b/></w:rPr><w:t>bold</w:t></w:r><w:r><w:t xml:space="preserve"> again</w:t></w:r>"#,
            &Config::default(),
        );
        let unit = &units[0];
        assert_eq!(unit.plain_text(), "Plain bold again");
        assert_eq!(roles(unit), vec![TagRole::Opening, TagRole::Closing]);
        assert!(matches!(unit.codes[0].payload, CodePayload::Properties(_)));
    }

    #[test]
    fn test_covered_formatting_stays_open() {
        let units = map(
            r#"<w:r><w:rPr><w:b/></w:rPr><w:t>bold</w:t></w:r><w:r><w:rPr><w:b/><w:i/></w:rPr><w:t>both</w:t></w:r>"#,
            &Config::default(),
        );
        assert_eq!(
            roles(&units[0]),
            vec![TagRole::Opening, TagRole::Opening, TagRole::Closing, TagRole::Closing]
        );

        let units = map(
            r#"<w:r><w:rPr><w:b/><w:i/></w:rPr><w:t>both</w:t></w:r><w:r><w:rPr><w:b/></w:rPr><w:t>bold</w:t></w:r>"#,
            &Config::default(),
        );
        assert_eq!(
            roles(&units[0]),
            vec![TagRole::Opening, TagRole::Closing, TagRole::Opening, TagRole::Closing]
        );
    }

    #[test]
    fn test_hidden_run_is_placeholder() {
        let units = map(
            r#"<w:r><w:t>Shown</w:t></w:r><w:r><w:rPr><w:vanish/></w:rPr><w:t>hidden</w:t></w:r>"#,
            &Config::default(),
        );
        let unit = &units[0];
        assert_eq!(unit.plain_text(), "Shown");
        assert_eq!(roles(unit), vec![TagRole::Isolated]);
    }

    #[test]
    fn test_hyperlink_container_codes() {
        let units = map(
            r#"<w:r><w:t xml:space="preserve">See </w:t></w:r><w:hyperlink w:anchor="x"><w:r><w:t>here</w:t></w:r></w:hyperlink>"#,
            &Config::default(),
        );
        let unit = &units[0];
        assert_eq!(unit.plain_text(), "See here");
        assert_eq!(roles(unit), vec![TagRole::Opening, TagRole::Closing]);
        assert!(matches!(unit.codes[0].payload, CodePayload::Container { .. }));
    }

    #[test]
    fn test_text_box_is_secondary_unit() {
        let units = map(
            r#"<w:r><w:t xml:space="preserve">Body </w:t></w:r><w:r><w:pict><w:txbxContent><w:p><w:r><w:t>Boxed</w:t></w:r></w:p></w:txbxContent></w:pict></w:r>"#,
            &Config::default(),
        );
        assert_eq!(units.len(), 2);
        assert_eq!(units[0].id.as_str(), "tu1");
        assert_eq!(roles(&units[0]), vec![TagRole::Isolated]);
        assert_eq!(units[1].id.as_str(), "tu1-1");
        assert!(units[1].referent);
        assert_eq!(units[1].text, "Boxed");
        assert_eq!(units[0].references(), vec![&units[1].id]);
    }

    #[test]
    fn test_anchor_unit_without_text() {
        let units = map(
            r#"<w:r><w:drawing><wp:inline><wp:docPr id="1" name="Picture 1" descr="Harbour at dusk"/></wp:inline></w:drawing></w:r>"#,
            &Config::default(),
        );
        assert_eq!(units.len(), 2);
        assert!(!units[0].translatable);
        assert!(units[1].is_attribute());
        assert_eq!(units[1].text, "Harbour at dusk");
    }
}
