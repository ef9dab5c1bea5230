//! Whole-part extraction and merging.
//!
//! Walks every event of a document part, hands each top-level block to the
//! parser and mapper, and keeps everything else as skeleton. Merging replays
//! the skeleton with every unit written back in place.

use std::collections::HashMap;

use log::debug;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::parse::{ParseContext, parse_block};
use crate::styles::StyleSource;
use crate::unit::{IdGenerator, TextUnit, TextUnitMapper, TextUnitWriter, UnitId};
use crate::xml::names::is_block_start;
use crate::xml::{EventCursor, XmlEvent, read_events, write_events};

/// One piece of a part: untouched events, or the place of a primary unit.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Skeleton(Vec<XmlEvent>),
    Unit(UnitId),
}

/// The result of extracting a part.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    segments: Vec<Segment>,
    units: Vec<TextUnit>,
}

impl Extraction {
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Every unit, primary and secondary, in document order.
    pub fn units(&self) -> &[TextUnit] {
        &self.units
    }

    /// Units a translator should see.
    pub fn translatable_units(&self) -> impl Iterator<Item = &TextUnit> {
        self.units.iter().filter(|unit| unit.translatable)
    }

    pub fn unit(&self, id: &UnitId) -> Option<&TextUnit> {
        self.units.iter().find(|unit| &unit.id == id)
    }

    fn push_skeleton(&mut self, events: impl IntoIterator<Item = XmlEvent>) {
        match self.segments.last_mut() {
            Some(Segment::Skeleton(existing)) => existing.extend(events),
            _ => self.segments.push(Segment::Skeleton(events.into_iter().collect())),
        }
    }
}

/// Extract the text units of a part.
pub fn extract(xml: &str, styles: &dyn StyleSource, config: &Config) -> Result<Extraction> {
    let events = read_events(xml)?;
    extract_events(&events, styles, config)
}

/// Extract the text units of a part that was already read into events.
pub fn extract_events(
    events: &[XmlEvent],
    styles: &dyn StyleSource,
    config: &Config,
) -> Result<Extraction> {
    let mut cursor = EventCursor::new(events);
    let mut ctx = ParseContext::new(config, styles);
    let mut ids = IdGenerator::new("tu");
    let mut extraction = Extraction::default();

    while let Some(event) = cursor.peek() {
        let is_block = event
            .start_name()
            .is_some_and(|name| is_block_start(name.namespace.as_deref(), &name.local));
        if !is_block {
            extraction.push_skeleton([event.clone()]);
            cursor.next();
            continue;
        }

        let block = parse_block(&mut cursor, &mut ctx)?;
        let mapper = TextUnitMapper::new(config, ctx.arena());
        let units = mapper.map(&block, &mut ids)?;
        match units.first() {
            Some(primary) if !primary.referent => {
                extraction.segments.push(Segment::Unit(primary.id.clone()));
                extraction.units.extend(units);
            }
            _ => extraction.push_skeleton(block.to_events(ctx.arena(), config)),
        }
    }

    debug!(
        "extracted {} units ({} translatable) from {} events",
        extraction.units.len(),
        extraction.translatable_units().count(),
        events.len()
    );
    Ok(extraction)
}

/// Write a part back, replacing the text of units found in `translations`
/// (coded text keyed by unit id). Other units keep their source text.
pub fn merge_events(
    extraction: &Extraction,
    translations: &HashMap<UnitId, String>,
    config: &Config,
) -> Result<Vec<XmlEvent>> {
    for id in translations.keys() {
        if extraction.unit(id).is_none() {
            return Err(Error::UnknownUnit(id.to_string()));
        }
    }

    let writer = TextUnitWriter::new(config, &extraction.units, translations);
    let mut out = Vec::new();
    for segment in &extraction.segments {
        match segment {
            Segment::Skeleton(events) => out.extend(events.iter().cloned()),
            Segment::Unit(id) => {
                let unit = extraction
                    .unit(id)
                    .ok_or_else(|| Error::UnknownUnit(id.to_string()))?;
                out.extend(writer.write(unit)?);
            }
        }
    }
    Ok(out)
}

/// [`merge_events`], serialised.
pub fn merge(
    extraction: &Extraction,
    translations: &HashMap<UnitId, String>,
    config: &Config,
) -> Result<String> {
    Ok(write_events(&merge_events(extraction, translations, config)?))
}
