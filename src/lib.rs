//! # runfold
//!
//! A paragraph and run engine for Office Open XML parts. It turns block
//! markup (WordprocessingML, DrawingML, SpreadsheetML shared strings and
//! Office Math) into translatable text units with inline codes, and writes
//! translated units back into well-formed markup.
//!
//! ## Features
//!
//! - Resolves run formatting through the style cascade, including toggle
//!   properties and linked character styles
//! - Merges adjacent runs that differ only in formatting noise
//! - Keeps complex fields, revisions, content controls and hyperlinks
//!   consistent while their content is translated
//! - Extracts text boxes and drawing descriptions as their own units
//! - Rebuilds run structure from reordered codes in a translation
//!
//! ## Quick Start
//!
//! ```
//! use std::collections::HashMap;
//! use runfold::{Config, StyleDefinitions, UnitId};
//!
//! let xml = r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body><w:p><w:r><w:rPr><w:b/></w:rPr><w:t>Hello</w:t></w:r><w:r><w:t> world</w:t></w:r></w:p></w:body></w:document>"#;
//!
//! let config = Config::default();
//! let extraction = runfold::extract(xml, &StyleDefinitions::new(), &config)?;
//! let unit = &extraction.units()[0];
//! assert_eq!(unit.tagged(), "<g0>Hello</g0> world");
//!
//! let coded = unit.coded_from_tagged("<g0>Bonjour</g0> le monde")?;
//! let translations = HashMap::from([(UnitId::new("tu1"), coded)]);
//! let merged = runfold::merge(&extraction, &translations, &config)?;
//! assert!(merged.contains("<w:t>Bonjour</w:t>"));
//! # Ok::<(), runfold::Error>(())
//! ```
//!
//! ## Lower-level pieces
//!
//! [`parse::parse_block`] turns one block element into a [`model::Block`];
//! [`unit::TextUnitMapper`] linearizes blocks into [`TextUnit`]s; and
//! [`unit::TextUnitWriter`] replays coded text back into events.

pub mod config;
pub mod error;
pub mod model;
pub mod parse;
pub mod part;
pub mod properties;
pub mod styles;
pub mod unit;
pub mod xml;

pub use config::{Config, Locale};
pub use error::{Error, Result};
pub use model::{Block, BlockArena, Dialect};
pub use part::{Extraction, Segment, extract, extract_events, merge, merge_events};
pub use styles::{StyleDefinition, StyleDefinitions, StyleSource, StyleType};
pub use unit::{TextUnit, TextUnitMapper, TextUnitWriter, UnitId};
