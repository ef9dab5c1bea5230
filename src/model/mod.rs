//! Parsed block structure.
//!
//! Parsers accumulate into builders ([`BlockBuilder`], [`RunBuilder`],
//! [`RunContainerBuilder`]) and freeze them into the immutable [`Block`],
//! [`Run`] and [`RunContainer`] before handing them on. Blocks nested inside
//! runs live in a [`BlockArena`] and are referenced by [`BlockId`].

mod block;
mod dialect;
mod emit;
mod markup;
mod run;

pub use block::{Block, BlockArena, BlockBuilder, BlockId, Chunk};
pub use dialect::{Dialect, RunTags};
pub use emit::{RunEmitter, xml_space};
pub use markup::{Markup, MarkupComponent};
pub use run::{
    AttributeText, ContainerKind, NestedItem, Run, RunBuilder, RunChunk, RunContainer,
    RunContainerBuilder, graphic_metadata, is_graphic_metadata_element,
};
