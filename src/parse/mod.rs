//! Block and run parsing.
//!
//! Recursive descent over a buffered event list. A [`BlockParser`] consumes
//! one paragraph-like element; runs, run containers and blocks nested inside
//! runs are parsed by the same parser (or a nested one) borrowing the same
//! [`EventCursor`], so only one parse frame advances the cursor at a time.

mod block;
mod container;
pub mod field;
mod merge;
pub mod properties;
mod run;
pub mod skip;

pub use block::BlockParser;
pub use field::{ComplexFieldStack, FieldFrame, FieldState};
pub use merge::RunMerger;
pub use skip::{AttributeStripper, ElementSkipper, SkipAction, SkipContext};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::{Block, BlockArena, BlockId};
use crate::styles::StyleSource;
use crate::xml::names::is_block_start;
use crate::xml::{EventCursor, XmlEvent};

/// Shared state for parsing the blocks of one part.
///
/// Owns the arena that nested blocks are stored in. Not thread-safe; use one
/// context per part.
pub struct ParseContext<'a> {
    pub config: &'a Config,
    pub styles: &'a dyn StyleSource,
    arena: BlockArena,
}

impl<'a> ParseContext<'a> {
    pub fn new(config: &'a Config, styles: &'a dyn StyleSource) -> Self {
        Self {
            config,
            styles,
            arena: BlockArena::new(),
        }
    }

    pub fn arena(&self) -> &BlockArena {
        &self.arena
    }

    pub fn into_arena(self) -> BlockArena {
        self.arena
    }

    pub fn skipper(&self) -> ElementSkipper<'a> {
        ElementSkipper::new(self.config)
    }

    pub(crate) fn alloc(&mut self, block: Block) -> BlockId {
        self.arena.alloc(block)
    }
}

/// Parse the block starting at the cursor (leading whitespace allowed).
pub fn parse_block(cursor: &mut EventCursor<'_>, ctx: &mut ParseContext<'_>) -> Result<Block> {
    cursor.skip_whitespace();
    match cursor.next() {
        Some(XmlEvent::Start(start))
            if is_block_start(start.name.namespace.as_deref(), &start.name.local) =>
        {
            BlockParser::new(cursor, ctx).parse(start)
        }
        Some(other) => Err(Error::UnexpectedStructure(format!(
            "expected a block start, found {other:?}"
        ))),
        None => Err(Error::UnexpectedStructure("expected a block start, found end of input".into())),
    }
}
