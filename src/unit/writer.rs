//! Writing text units back to markup.

use std::collections::HashMap;

use super::{CodePayload, Fragment, Placement, RunFormat, TagRole, TextUnit, Token, UnitId, bidi, tokenize};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::RunEmitter;
use crate::xml::XmlEvent;

/// Replays coded text against the code maps of a set of units.
///
/// Units without a translation are written from their source text, so the
/// writer can regenerate a whole part from a partial translation.
pub struct TextUnitWriter<'a> {
    config: &'a Config,
    units: HashMap<&'a UnitId, &'a TextUnit>,
    translations: &'a HashMap<UnitId, String>,
}

impl<'a> TextUnitWriter<'a> {
    pub fn new(
        config: &'a Config,
        units: impl IntoIterator<Item = &'a TextUnit>,
        translations: &'a HashMap<UnitId, String>,
    ) -> Self {
        Self {
            config,
            units: units.into_iter().map(|unit| (&unit.id, unit)).collect(),
            translations,
        }
    }

    /// Coded text to write for a unit.
    pub fn text_for<'u>(&'u self, unit: &'u TextUnit) -> &'u str {
        self.translations
            .get(&unit.id)
            .map_or(unit.text.as_str(), String::as_str)
    }

    /// Write a unit from its translation, or its source text.
    pub fn write(&self, unit: &TextUnit) -> Result<Vec<XmlEvent>> {
        self.write_coded(unit, self.text_for(unit))
    }

    /// Write a unit from the given coded text.
    pub fn write_coded(&self, unit: &TextUnit, text: &str) -> Result<Vec<XmlEvent>> {
        let mut out = bidi::paragraph_prefix(&unit.prefix, &unit.tags, self.config);
        let mut replay = Replay {
            unit,
            config: self.config,
            emitter: RunEmitter::new(&unit.tags, self.config),
            formats: Vec::new(),
            open: Vec::new(),
            active: None,
        };

        for token in tokenize(text)? {
            match token {
                Token::Text(text) => replay.text(text),
                Token::Code(role, index) => {
                    let code = unit.code(index).ok_or(Error::UnknownCode(index))?;
                    match (role, &code.payload) {
                        (TagRole::Opening, CodePayload::Properties(format)) => {
                            replay.push(index, format);
                        }
                        (TagRole::Opening, CodePayload::Container { start, defaults, .. }) => {
                            replay.emitter.block_markup(&start.events());
                            replay.push(index, defaults);
                        }
                        (TagRole::Closing, CodePayload::Properties(_)) => replay.pop(index)?,
                        (TagRole::Closing, CodePayload::Container { end, .. }) => {
                            replay.pop(index)?;
                            replay.emitter.block_markup(&end.events());
                        }
                        (TagRole::Isolated, CodePayload::Markup { fragments, placement }) => {
                            let events = self.render_fragments(fragments)?;
                            replay.place(&events, *placement);
                        }
                        (TagRole::Isolated, CodePayload::Reference { unit, placement }) => {
                            let events = self.write_reference(unit)?;
                            replay.place(&events, *placement);
                        }
                        _ => return Err(Error::UnbalancedCode(index)),
                    }
                }
            }
        }

        out.extend(replay.finish()?);
        out.extend(unit.suffix.iter().cloned());
        Ok(out)
    }

    fn write_reference(&self, id: &UnitId) -> Result<Vec<XmlEvent>> {
        let unit = self
            .units
            .get(id)
            .ok_or_else(|| Error::UnknownUnit(id.to_string()))?;
        self.write(unit)
    }

    fn render_fragments(&self, fragments: &[Fragment]) -> Result<Vec<XmlEvent>> {
        let mut out = Vec::new();
        for fragment in fragments {
            match fragment {
                Fragment::Events { events, attributes } => {
                    let start = out.len();
                    out.extend(events.iter().cloned());
                    for slot in attributes {
                        let Some(unit) = self.units.get(&slot.unit) else {
                            continue;
                        };
                        let text = super::plain_text(self.text_for(unit));
                        if let Some(XmlEvent::Start(element)) = out.get_mut(start + slot.event) {
                            element.set_attribute(slot.attribute.clone(), text);
                        }
                    }
                }
                Fragment::Unit(id) => out.extend(self.write_reference(id)?),
            }
        }
        Ok(out)
    }
}

/// Replay state for one unit: the run emitter, the stack of formats opened
/// by codes, and the codes still open.
struct Replay<'u> {
    unit: &'u TextUnit,
    config: &'u Config,
    emitter: RunEmitter<'u>,
    formats: Vec<(usize, &'u RunFormat)>,
    open: Vec<usize>,
    /// The format the emitter's current run was begun with, by code index
    /// (`None` inside is the unit's base format).
    active: Option<Option<usize>>,
}

impl<'u> Replay<'u> {
    fn push(&mut self, index: usize, format: &'u RunFormat) {
        self.formats.push((index, format));
        self.open.push(index);
    }

    fn pop(&mut self, index: usize) -> Result<()> {
        if self.open.last() != Some(&index) {
            return Err(Error::UnbalancedCode(index));
        }
        self.open.pop();
        self.formats.pop();
        Ok(())
    }

    /// Begin a run with the format on top of the stack, unless the current
    /// run already has it.
    fn ensure_run(&mut self) {
        let key = self.formats.last().map(|(index, _)| *index);
        if self.active == Some(key) {
            return;
        }
        let format = self.formats.last().map_or(&self.unit.base, |(_, format)| *format);
        let properties = bidi::run_properties(&format.direct, &self.unit.tags, self.config);
        self.emitter
            .begin_run(format.run.clone(), &properties, format.bare);
        self.active = Some(key);
    }

    fn text(&mut self, text: &str) {
        self.ensure_run();
        self.emitter.text(text);
    }

    fn place(&mut self, events: &[XmlEvent], placement: Placement) {
        match placement {
            Placement::Run => {
                self.ensure_run();
                self.emitter.run_markup(events);
            }
            Placement::Block => self.emitter.block_markup(events),
        }
    }

    fn finish(self) -> Result<Vec<XmlEvent>> {
        if let Some(&index) = self.open.last() {
            return Err(Error::UnbalancedCode(index));
        }
        Ok(self.emitter.finish())
    }
}
