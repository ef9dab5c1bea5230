//! Runs and run containers.

use super::block::{BlockArena, BlockId, Chunk};
use super::emit::RunEmitter;
use super::markup::Markup;
use crate::config::{Config, Locale};
use crate::properties::{ContentCategories, PropertyKey, RunProperties, detect_categories};
use crate::xml::names::{A_NS, W_NS, X_NS};
use crate::xml::{QName, StartElement, XmlEvent};

/// One piece of a run body.
#[derive(Debug, Clone, PartialEq)]
pub enum RunChunk {
    /// Visible text. Tabs, line breaks and no-break hyphens exposed as
    /// characters live here too.
    Text(String),
    /// Markup kept inside the run: field characters, drawings, symbols.
    Markup(Markup),
    /// A nested block with visible text (text box paragraph, footnote).
    Nested(BlockId),
}

/// Text that lives somewhere other than the run's own body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NestedItem {
    Block(BlockId),
    /// Text stored in an attribute, such as a drawing's `descr`.
    Attribute(AttributeText),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeText {
    pub element: QName,
    pub attribute: QName,
    pub text: String,
}

/// A formatting-homogeneous span of text.
///
/// Built by the run parser, possibly merged with its neighbours, and frozen
/// by [`RunBuilder::build`].
#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    start: StartElement,
    properties: RunProperties,
    combined: RunProperties,
    body: Vec<RunChunk>,
    nested: Vec<NestedItem>,
    hidden: bool,
    complex_codes: bool,
    bare: bool,
    categories: ContentCategories,
}

impl Run {
    pub fn start(&self) -> &StartElement {
        &self.start
    }

    /// Directly specified properties, as written on the run.
    pub fn properties(&self) -> &RunProperties {
        &self.properties
    }

    /// Effective properties after the style cascade.
    pub fn combined_properties(&self) -> &RunProperties {
        &self.combined
    }

    pub fn body(&self) -> &[RunChunk] {
        &self.body
    }

    pub fn nested_items(&self) -> &[NestedItem] {
        &self.nested
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// The run holds complex-field characters or opaque field content.
    pub fn has_complex_codes(&self) -> bool {
        self.complex_codes
    }

    /// Text written without a run wrapper (`<si><t>..</t></si>`).
    pub fn is_bare(&self) -> bool {
        self.bare
    }

    pub fn categories(&self) -> ContentCategories {
        self.categories
    }

    pub fn text(&self) -> String {
        self.body
            .iter()
            .filter_map(|chunk| match chunk {
                RunChunk::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn has_text(&self) -> bool {
        self.body
            .iter()
            .any(|chunk| matches!(chunk, RunChunk::Text(text) if !text.is_empty()))
    }

    /// Text a translator should see: present, not hidden, not field code.
    pub fn has_visible_text(&self) -> bool {
        self.has_text() && !self.hidden && !self.complex_codes
    }

    pub fn nested_blocks(&self) -> impl Iterator<Item = BlockId> + '_ {
        self.body.iter().filter_map(|chunk| match chunk {
            RunChunk::Nested(id) => Some(*id),
            _ => None,
        })
    }

    pub fn write_to(&self, emitter: &mut RunEmitter<'_>, arena: &BlockArena, config: &Config) {
        emitter.begin_run(self.start.clone(), &self.properties, self.bare);
        if self.body.is_empty() {
            emitter.open_now();
        }
        for chunk in &self.body {
            match chunk {
                RunChunk::Text(text) => emitter.text(text),
                RunChunk::Markup(markup) => emitter.run_markup(&markup.events()),
                RunChunk::Nested(id) => {
                    if let Some(block) = arena.get(*id) {
                        emitter.run_markup(&block.to_events(arena, config));
                    }
                }
            }
        }
        emitter.end_run();
    }
}

/// Accumulates one run while it is being parsed or merged.
#[derive(Debug, Clone)]
pub struct RunBuilder {
    pub(crate) start: StartElement,
    pub(crate) properties: RunProperties,
    pub(crate) combined: RunProperties,
    pub(crate) body: Vec<RunChunk>,
    pub(crate) nested: Vec<NestedItem>,
    pub(crate) hidden: bool,
    pub(crate) complex_codes: bool,
    pub(crate) bare: bool,
}

impl RunBuilder {
    pub fn new(start: StartElement) -> Self {
        Self {
            start,
            properties: RunProperties::empty(),
            combined: RunProperties::empty(),
            body: Vec::new(),
            nested: Vec::new(),
            hidden: false,
            complex_codes: false,
            bare: false,
        }
    }

    pub fn name(&self) -> &QName {
        &self.start.name
    }

    pub fn add_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        match self.body.last_mut() {
            Some(RunChunk::Text(existing)) => existing.push_str(text),
            _ => self.body.push(RunChunk::Text(text.to_string())),
        }
    }

    pub fn add_markup(&mut self, events: Vec<XmlEvent>) {
        match self.body.last_mut() {
            Some(RunChunk::Markup(existing)) => existing.push_events(events),
            _ => self.body.push(RunChunk::Markup(Markup::from_events(events))),
        }
    }

    pub fn add_nested_block(&mut self, id: BlockId) {
        self.body.push(RunChunk::Nested(id));
        self.nested.push(NestedItem::Block(id));
    }

    pub fn add_nested_item(&mut self, item: NestedItem) {
        self.nested.push(item);
    }

    /// Append another run's body, collapsing adjacent text and markup.
    pub fn append_body(&mut self, body: Vec<RunChunk>) {
        for chunk in body {
            match chunk {
                RunChunk::Text(text) => self.add_text(&text),
                RunChunk::Markup(markup) => match self.body.last_mut() {
                    Some(RunChunk::Markup(existing)) => existing.extend(markup),
                    _ => self.body.push(RunChunk::Markup(markup)),
                },
                RunChunk::Nested(id) => self.body.push(RunChunk::Nested(id)),
            }
        }
    }

    pub fn text(&self) -> String {
        self.body
            .iter()
            .filter_map(|chunk| match chunk {
                RunChunk::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn has_non_whitespace_text(&self) -> bool {
        self.body.iter().any(|chunk| {
            matches!(chunk, RunChunk::Text(text) if text.chars().any(|c| !c.is_whitespace()))
        })
    }

    pub fn has_nested_blocks(&self) -> bool {
        self.body.iter().any(|c| matches!(c, RunChunk::Nested(_)))
    }

    pub fn is_math(&self) -> bool {
        self.start.name.in_namespace(crate::xml::names::M_NS)
    }

    /// Content categories exercised by this run's text.
    pub fn categories(&self, source: &Locale) -> ContentCategories {
        detect_categories(&self.text(), source, self.combined.is_complex_script())
    }

    /// Freeze the builder.
    pub fn build(mut self, config: &Config) -> Run {
        if config.cleanup_aggressively && !self.has_non_whitespace_text() {
            strip_vertical_alignment(&mut self.properties);
            strip_vertical_alignment(&mut self.combined);
        }

        let categories = self.categories(&config.source_locale);
        for props in [&mut self.properties, &mut self.combined] {
            if let Some(fonts) = props.fonts_mut() {
                fonts.set_detected(categories);
            }
        }

        Run {
            start: self.start,
            properties: self.properties,
            combined: self.combined,
            body: self.body,
            nested: self.nested,
            hidden: self.hidden,
            complex_codes: self.complex_codes,
            bare: self.bare,
            categories,
        }
    }
}

fn strip_vertical_alignment(props: &mut RunProperties) {
    props.remove(&PropertyKey::element(Some(W_NS), "vertAlign"));
    props.remove(&PropertyKey::element(Some(X_NS), "vertAlign"));
    props.remove(&PropertyKey::attribute(None, "baseline"));
}

/// The wrapper a container stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ContainerKind {
    Hyperlink,
    SmartTag,
    CustomXml,
    StructuredDocumentTag,
    /// `w:dir` / `w:bdo` bidirectional overrides.
    Bidi,
}

impl ContainerKind {
    pub fn of(name: &QName) -> Option<Self> {
        if !name.in_namespace(W_NS) {
            return None;
        }
        match name.local.as_str() {
            "hyperlink" => Some(ContainerKind::Hyperlink),
            "smartTag" => Some(ContainerKind::SmartTag),
            "customXml" => Some(ContainerKind::CustomXml),
            "sdt" => Some(ContainerKind::StructuredDocumentTag),
            "dir" | "bdo" => Some(ContainerKind::Bidi),
            _ => None,
        }
    }
}

/// Runs wrapped by a hyperlink, smart tag, content control or override.
#[derive(Debug, Clone, PartialEq)]
pub struct RunContainer {
    pub(crate) kind: ContainerKind,
    pub(crate) start: Markup,
    pub(crate) end: Markup,
    pub(crate) chunks: Vec<Chunk>,
    pub(crate) default_properties: RunProperties,
    pub(crate) default_combined: RunProperties,
}

impl RunContainer {
    pub fn kind(&self) -> ContainerKind {
        self.kind
    }

    /// Opening markup: the start tag and any property children.
    pub fn start_markup(&self) -> &Markup {
        &self.start
    }

    pub fn end_markup(&self) -> &Markup {
        &self.end
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Direct properties shared by every run inside, or empty.
    pub fn default_properties(&self) -> &RunProperties {
        &self.default_properties
    }

    pub fn default_combined_properties(&self) -> &RunProperties {
        &self.default_combined
    }

    pub fn has_visible_text(&self, arena: &BlockArena) -> bool {
        self.chunks.iter().any(|c| c.has_visible_text(arena))
    }

    pub fn write_to(&self, emitter: &mut RunEmitter<'_>, arena: &BlockArena, config: &Config) {
        emitter.block_markup(&self.start.events());
        for chunk in &self.chunks {
            chunk.write_to(emitter, arena, config);
        }
        emitter.block_markup(&self.end.events());
    }
}

/// Accumulates a container while its children are parsed.
#[derive(Debug, Clone)]
pub struct RunContainerBuilder {
    kind: ContainerKind,
    start: Markup,
    end: Markup,
    chunks: Vec<Chunk>,
}

impl RunContainerBuilder {
    pub fn new(kind: ContainerKind, start: StartElement) -> Self {
        let mut markup = Markup::new();
        markup.push_start(start);
        Self {
            kind,
            start: markup,
            end: Markup::new(),
            chunks: Vec::new(),
        }
    }

    pub fn has_chunks(&self) -> bool {
        !self.chunks.is_empty()
    }

    pub fn add_start_markup(&mut self, events: Vec<XmlEvent>) {
        self.start.push_events(events);
    }

    pub fn add_start_tag(&mut self, start: StartElement) {
        self.start.push_start(start);
    }

    pub fn add_end_markup(&mut self, events: Vec<XmlEvent>) {
        self.end.push_events(events);
    }

    pub fn add_end_tag(&mut self, end: crate::xml::EndElement) {
        self.end.push_end(end);
    }

    pub fn add_chunk(&mut self, chunk: Chunk) {
        self.chunks.push(chunk);
    }

    /// Add markup between runs, coalescing with preceding markup.
    pub fn add_markup(&mut self, events: Vec<XmlEvent>) {
        match self.chunks.last_mut() {
            Some(Chunk::Markup(existing)) => existing.push_events(events),
            _ => self.chunks.push(Chunk::Markup(Markup::from_events(events))),
        }
    }

    /// Freeze the container.
    ///
    /// Default properties are those of the first run when every run inside
    /// resolves to the same combined properties; otherwise there are none.
    pub fn build(self) -> RunContainer {
        let runs: Vec<&Run> = self
            .chunks
            .iter()
            .filter_map(|chunk| match chunk {
                Chunk::Run(run) => Some(run),
                _ => None,
            })
            .collect();

        let shared = runs
            .split_first()
            .filter(|(first, rest)| rest.iter().all(|r| r.combined == first.combined))
            .map(|(first, _)| (first.properties.clone(), first.combined.clone()));
        let (default_properties, default_combined) = shared.unwrap_or_default();

        RunContainer {
            kind: self.kind,
            start: self.start,
            end: self.end,
            chunks: self.chunks,
            default_properties,
            default_combined,
        }
    }
}

/// Elements whose attributes hold user-visible text.
pub fn is_graphic_metadata_element(name: &QName) -> bool {
    use crate::xml::names::{P_NS, PIC_NS, WP_NS};
    name.is(WP_NS, "docPr")
        || name.is(PIC_NS, "cNvPr")
        || name.is(P_NS, "cNvPr")
        || name.is(A_NS, "cNvPr")
}

/// Attribute text (`descr`, `title`) found in a slice of markup.
pub fn graphic_metadata(events: &[XmlEvent]) -> Vec<(usize, AttributeText)> {
    let mut found = Vec::new();
    for (index, event) in events.iter().enumerate() {
        let XmlEvent::Start(start) = event else {
            continue;
        };
        if !is_graphic_metadata_element(&start.name) {
            continue;
        }
        for attr in &start.attributes {
            let is_text_attribute =
                attr.name.namespace.is_none() && matches!(attr.name.local.as_str(), "descr" | "title");
            if is_text_attribute && !attr.value.trim().is_empty() {
                found.push((
                    index,
                    AttributeText {
                        element: start.name.clone(),
                        attribute: attr.name.clone(),
                        text: attr.value.clone(),
                    },
                ));
            }
        }
    }
    found
}
