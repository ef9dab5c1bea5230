//! Text units: flat text with inline codes.
//!
//! A block is linearized into a [`TextUnit`]: a string in which every piece
//! of formatting or opaque markup is replaced by a two-character marker, and
//! a code map holding what each marker stands for. Markers are a
//! private-use role character followed by an index character:
//!
//! | Marker               | Meaning                       |
//! |----------------------|-------------------------------|
//! | `U+E101` + index     | opening half of a paired code |
//! | `U+E102` + index     | closing half of a paired code |
//! | `U+E103` + index     | isolated code                 |
//!
//! The index character is `U+E110 + n` for code `n`. For display and
//! editing, [`TextUnit::tagged`] renders the same text with `<gN>`, `</gN>`
//! and `<xN/>` tags.

mod bidi;
mod mapper;
mod tagged;
mod writer;

pub use mapper::TextUnitMapper;
pub use writer::TextUnitWriter;

use std::fmt;

use crate::model::{Markup, RunTags};
use crate::properties::RunProperties;
use crate::xml::{QName, StartElement, XmlEvent};

pub const OPENING_MARKER: char = '\u{E101}';
pub const CLOSING_MARKER: char = '\u{E102}';
pub const ISOLATED_MARKER: char = '\u{E103}';
const INDEX_BASE: u32 = 0xE110;

/// How a code marker relates to the text around it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum TagRole {
    Opening,
    Closing,
    Isolated,
}

impl TagRole {
    pub fn marker(self) -> char {
        match self {
            TagRole::Opening => OPENING_MARKER,
            TagRole::Closing => CLOSING_MARKER,
            TagRole::Isolated => ISOLATED_MARKER,
        }
    }

    pub fn from_marker(c: char) -> Option<Self> {
        match c {
            OPENING_MARKER => Some(TagRole::Opening),
            CLOSING_MARKER => Some(TagRole::Closing),
            ISOLATED_MARKER => Some(TagRole::Isolated),
            _ => None,
        }
    }
}

pub fn index_char(index: usize) -> char {
    u32::try_from(index)
        .ok()
        .and_then(|n| char::from_u32(INDEX_BASE + n))
        .unwrap_or(char::REPLACEMENT_CHARACTER)
}

pub fn index_of(c: char) -> Option<usize> {
    (c as u32).checked_sub(INDEX_BASE).map(|n| n as usize)
}

/// Append a marker for code `index` to coded text.
pub fn push_marker(text: &mut String, role: TagRole, index: usize) {
    text.push(role.marker());
    text.push(index_char(index));
}

/// One token of coded text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'t> {
    Text(&'t str),
    Code(TagRole, usize),
}

/// Split coded text into text spans and code markers.
///
/// A role character not followed by an index character is reported as
/// [`crate::Error::InvalidTaggedText`].
pub fn tokenize(text: &str) -> crate::Result<Vec<Token<'_>>> {
    let mut tokens = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((offset, c)) = chars.next() {
        let Some(role) = TagRole::from_marker(c) else {
            continue;
        };
        if start < offset {
            tokens.push(Token::Text(&text[start..offset]));
        }
        let index = chars
            .next()
            .and_then(|(_, c)| index_of(c))
            .ok_or_else(|| crate::Error::InvalidTaggedText(format!("dangling marker at {offset}")))?;
        tokens.push(Token::Code(role, index));
        start = chars.peek().map_or(text.len(), |(next, _)| *next);
    }
    if start < text.len() {
        tokens.push(Token::Text(&text[start..]));
    }
    Ok(tokens)
}

/// Coded text with the markers removed.
pub fn plain_text(coded: &str) -> String {
    let mut out = String::with_capacity(coded.len());
    let mut chars = coded.chars();
    while let Some(c) = chars.next() {
        if TagRole::from_marker(c).is_some() {
            chars.next();
        } else {
            out.push(c);
        }
    }
    out
}

/// Identifier of a text unit. Secondary units are scoped under their
/// parent: `tu3`, `tu3-1`, `tu3-1-2`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct UnitId(String);

impl UnitId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hands out unit ids. Ids are never reused.
#[derive(Debug, Clone)]
pub struct IdGenerator {
    prefix: String,
    next: u32,
}

impl IdGenerator {
    /// Top-level ids: `{prefix}1`, `{prefix}2`, …
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 1,
        }
    }

    /// Ids for the secondary units of `parent`: `{parent}-1`, …
    pub fn scoped(parent: &UnitId) -> Self {
        Self::new(format!("{parent}-"))
    }

    pub fn next_id(&mut self) -> UnitId {
        let id = UnitId(format!("{}{}", self.prefix, self.next));
        self.next += 1;
        id
    }
}

/// The run a property code writes: its element, properties and whether
/// text is written without a run wrapper.
#[derive(Debug, Clone, PartialEq)]
pub struct RunFormat {
    pub run: StartElement,
    pub direct: RunProperties,
    pub combined: RunProperties,
    pub bare: bool,
}

impl RunFormat {
    /// A plain run with no properties.
    pub fn plain(tags: &RunTags, bare: bool) -> Self {
        Self {
            run: StartElement::new(tags.run()),
            direct: RunProperties::empty(),
            combined: RunProperties::empty(),
            bare,
        }
    }
}

/// Where isolated markup goes when it is written back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Inside the current run (`w:drawing`, `w:fldChar`).
    Run,
    /// Between runs (a whole placeholder run, a simple field).
    Block,
}

/// An attribute whose value is the text of a secondary unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeSlot {
    pub event: usize,
    pub attribute: QName,
    pub unit: UnitId,
}

/// A piece of isolated markup: literal events, or a secondary unit written
/// in place.
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    Events {
        events: Vec<XmlEvent>,
        attributes: Vec<AttributeSlot>,
    },
    Unit(UnitId),
}

/// What a code stands for.
#[derive(Debug, Clone, PartialEq)]
pub enum CodePayload {
    /// Paired: run formatting.
    Properties(RunFormat),
    /// Paired: a hyperlink, content control or other run container.
    Container {
        start: Markup,
        end: Markup,
        defaults: RunFormat,
    },
    /// Isolated: opaque markup.
    Markup {
        fragments: Vec<Fragment>,
        placement: Placement,
    },
    /// Isolated: a nested block written from its own unit.
    Reference { unit: UnitId, placement: Placement },
}

impl CodePayload {
    pub fn is_paired(&self) -> bool {
        matches!(self, CodePayload::Properties(_) | CodePayload::Container { .. })
    }
}

/// An inline code: its id (its index in the code map) and payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Code {
    pub id: usize,
    pub payload: CodePayload,
}

/// One translatable (or anchor) unit of text.
///
/// Primary units are written in place of their block; secondary units
/// (`referent`) are written where a code of another unit refers to them.
#[derive(Debug, Clone, PartialEq)]
pub struct TextUnit {
    pub id: UnitId,
    /// Coded text.
    pub text: String,
    pub codes: Vec<Code>,
    /// Block markup before the first run: start tag and paragraph properties.
    pub prefix: Vec<XmlEvent>,
    /// Block markup after the last run: the end tag.
    pub suffix: Vec<XmlEvent>,
    pub tags: RunTags,
    /// Format of text outside every property code.
    pub base: RunFormat,
    pub translatable: bool,
    pub referent: bool,
}

impl TextUnit {
    pub fn code(&self, index: usize) -> Option<&Code> {
        self.codes.get(index)
    }

    /// Text without code markers.
    pub fn plain_text(&self) -> String {
        plain_text(&self.text)
    }

    /// Units stored in an attribute rather than a block.
    pub fn is_attribute(&self) -> bool {
        self.prefix.is_empty() && self.suffix.is_empty() && self.codes.is_empty() && self.referent
    }

    /// Ids of the secondary units this unit's codes refer to.
    pub fn references(&self) -> Vec<&UnitId> {
        let mut out = Vec::new();
        for code in &self.codes {
            match &code.payload {
                CodePayload::Reference { unit, .. } => out.push(unit),
                CodePayload::Markup { fragments, .. } => {
                    for fragment in fragments {
                        match fragment {
                            Fragment::Unit(unit) => out.push(unit),
                            Fragment::Events { attributes, .. } => {
                                out.extend(attributes.iter().map(|slot| &slot.unit));
                            }
                        }
                    }
                }
                CodePayload::Properties(_) | CodePayload::Container { .. } => {}
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markers_round_trip() {
        let mut text = String::from("a");
        push_marker(&mut text, TagRole::Opening, 0);
        text.push('b');
        push_marker(&mut text, TagRole::Closing, 0);
        push_marker(&mut text, TagRole::Isolated, 12);

        let tokens = tokenize(&text).unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Text("a"),
                Token::Code(TagRole::Opening, 0),
                Token::Text("b"),
                Token::Code(TagRole::Closing, 0),
                Token::Code(TagRole::Isolated, 12),
            ]
        );
        assert_eq!(plain_text(&text), "ab");
    }

    #[test]
    fn test_dangling_marker() {
        let text = format!("abc{OPENING_MARKER}");
        assert!(matches!(tokenize(&text), Err(crate::Error::InvalidTaggedText(_))));
    }

    #[test]
    fn test_scoped_ids() {
        let mut ids = IdGenerator::new("tu");
        let first = ids.next_id();
        assert_eq!(first.as_str(), "tu1");
        assert_eq!(ids.next_id().as_str(), "tu2");

        let mut children = IdGenerator::scoped(&first);
        let child = children.next_id();
        assert_eq!(child.as_str(), "tu1-1");
        assert_eq!(IdGenerator::scoped(&child).next_id().as_str(), "tu1-1-1");
    }
}
