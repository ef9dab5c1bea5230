//! Blocks and the arena holding nested blocks.

use super::dialect::{Dialect, RunTags};
use super::emit::RunEmitter;
use super::markup::Markup;
use super::run::{Run, RunContainer};
use crate::config::Config;
use crate::xml::{QName, XmlEvent};

/// Index of a block in a [`BlockArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub u32);

/// Flat storage for nested blocks; cross-references are plain [`BlockId`]s.
#[derive(Debug, Clone, Default)]
pub struct BlockArena {
    blocks: Vec<Block>,
}

impl BlockArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, block: Block) -> BlockId {
        let id = BlockId(self.blocks.len() as u32);
        self.blocks.push(block);
        id
    }

    pub fn get(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(id.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// One element of a block.
#[derive(Debug, Clone, PartialEq)]
pub enum Chunk {
    Markup(Markup),
    Run(Run),
    Container(RunContainer),
    Block(BlockId),
}

impl Chunk {
    pub fn has_visible_text(&self, arena: &BlockArena) -> bool {
        match self {
            Chunk::Run(run) => run.has_visible_text(),
            Chunk::Container(container) => container.has_visible_text(arena),
            Chunk::Markup(_) | Chunk::Block(_) => false,
        }
    }

    pub fn write_to(&self, emitter: &mut RunEmitter<'_>, arena: &BlockArena, config: &Config) {
        match self {
            Chunk::Markup(markup) => emitter.block_markup(&markup.events()),
            Chunk::Run(run) => run.write_to(emitter, arena, config),
            Chunk::Container(container) => container.write_to(emitter, arena, config),
            Chunk::Block(id) => {
                if let Some(block) = arena.get(*id) {
                    emitter.block_markup(&block.to_events(arena, config));
                }
            }
        }
    }

    /// Nested blocks referenced from this chunk, in document order.
    fn nested_blocks(&self, out: &mut Vec<BlockId>) {
        match self {
            Chunk::Run(run) => out.extend(run.nested_blocks()),
            Chunk::Container(container) => {
                for chunk in container.chunks() {
                    chunk.nested_blocks(out);
                }
            }
            Chunk::Block(id) => out.push(*id),
            Chunk::Markup(_) => {}
        }
    }
}

/// A parsed paragraph, string item or text-body paragraph.
///
/// The first and last chunks are markup holding the block's own start and
/// end tags.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    name: QName,
    chunks: Vec<Chunk>,
    paragraph_style: Option<String>,
    excluded: bool,
}

impl Block {
    pub fn name(&self) -> &QName {
        &self.name
    }

    pub fn dialect(&self) -> Dialect {
        Dialect::of(&self.name).unwrap_or(Dialect::Word)
    }

    /// Run tags for writing this block's runs.
    pub fn tags(&self) -> RunTags {
        RunTags::for_element(&self.name).unwrap_or_else(|| RunTags::new(Dialect::Word, Some("w")))
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn paragraph_style(&self) -> Option<&str> {
        self.paragraph_style.as_deref()
    }

    /// The paragraph style is on the excluded list.
    pub fn is_excluded(&self) -> bool {
        self.excluded
    }

    /// Whether any run in this block (not in nested blocks) has visible text.
    pub fn has_visible_text(&self, arena: &BlockArena) -> bool {
        self.chunks.iter().any(|c| c.has_visible_text(arena))
    }

    /// Visible text here or in any nested block.
    pub fn has_visible_content(&self, arena: &BlockArena) -> bool {
        self.has_visible_text(arena)
            || self
                .nested_blocks()
                .into_iter()
                .filter_map(|id| arena.get(id))
                .any(|block| block.has_visible_content(arena))
    }

    pub fn nested_blocks(&self) -> Vec<BlockId> {
        let mut out = Vec::new();
        for chunk in &self.chunks {
            chunk.nested_blocks(&mut out);
        }
        out
    }

    /// Concatenated visible text of the block's runs.
    pub fn text(&self) -> String {
        fn collect(chunks: &[Chunk], out: &mut String) {
            for chunk in chunks {
                match chunk {
                    Chunk::Run(run) if run.has_visible_text() => out.push_str(&run.text()),
                    Chunk::Container(container) => collect(container.chunks(), out),
                    _ => {}
                }
            }
        }
        let mut out = String::new();
        collect(&self.chunks, &mut out);
        out
    }

    /// Every run in document order, containers flattened.
    pub fn runs(&self) -> Vec<&Run> {
        fn collect<'b>(chunks: &'b [Chunk], out: &mut Vec<&'b Run>) {
            for chunk in chunks {
                match chunk {
                    Chunk::Run(run) => out.push(run),
                    Chunk::Container(container) => collect(container.chunks(), out),
                    _ => {}
                }
            }
        }
        let mut out = Vec::new();
        collect(&self.chunks, &mut out);
        out
    }

    /// Serialise the block back to events.
    pub fn to_events(&self, arena: &BlockArena, config: &Config) -> Vec<XmlEvent> {
        let tags = self.tags();
        let mut emitter = RunEmitter::new(&tags, config);
        for chunk in &self.chunks {
            chunk.write_to(&mut emitter, arena, config);
        }
        emitter.finish()
    }
}

/// Accumulates a block while it is being parsed.
#[derive(Debug, Clone)]
pub struct BlockBuilder {
    name: QName,
    chunks: Vec<Chunk>,
    paragraph_style: Option<String>,
    excluded: bool,
}

impl BlockBuilder {
    pub fn new(name: QName) -> Self {
        Self {
            name,
            chunks: Vec::new(),
            paragraph_style: None,
            excluded: false,
        }
    }

    pub fn set_paragraph_style(&mut self, style: Option<String>, excluded: bool) {
        self.paragraph_style = style;
        self.excluded = excluded;
    }

    pub fn paragraph_style(&self) -> Option<&str> {
        self.paragraph_style.as_deref()
    }

    pub fn is_excluded(&self) -> bool {
        self.excluded
    }

    pub fn add_markup(&mut self, events: Vec<XmlEvent>) {
        match self.chunks.last_mut() {
            Some(Chunk::Markup(existing)) => existing.push_events(events),
            _ => self.chunks.push(Chunk::Markup(Markup::from_events(events))),
        }
    }

    pub fn add_start_tag(&mut self, start: crate::xml::StartElement) {
        match self.chunks.last_mut() {
            Some(Chunk::Markup(existing)) => existing.push_start(start),
            _ => {
                let mut markup = Markup::new();
                markup.push_start(start);
                self.chunks.push(Chunk::Markup(markup));
            }
        }
    }

    pub fn add_end_tag(&mut self, end: crate::xml::EndElement) {
        match self.chunks.last_mut() {
            Some(Chunk::Markup(existing)) => existing.push_end(end),
            _ => {
                let mut markup = Markup::new();
                markup.push_end(end);
                self.chunks.push(Chunk::Markup(markup));
            }
        }
    }

    pub fn add_chunk(&mut self, chunk: Chunk) {
        self.chunks.push(chunk);
    }

    /// Freeze the block.
    pub fn build(self) -> Block {
        Block {
            name: self.name,
            chunks: self.chunks,
            paragraph_style: self.paragraph_style,
            excluded: self.excluded,
        }
    }
}
