//! Per-script font assignments and content-category detection.
//!
//! A run's `w:rFonts` names up to four fonts, one per *content category*.
//! Which of them actually renders anything depends on the characters in the
//! run: Latin text never touches the east-Asian slot, Arabic never touches the
//! ASCII slot. Two runs whose fonts differ only in slots their text does not
//! exercise render identically and can be merged.

use std::collections::BTreeMap;
use std::fmt;

use crate::config::Locale;
use crate::xml::{Attribute, QName, StartElement, XmlEvent};

/// One attribute slot of `w:rFonts`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FontSlot {
    Hint,
    Ascii,
    HighAnsi,
    EastAsia,
    ComplexScript,
    AsciiTheme,
    HighAnsiTheme,
    EastAsiaTheme,
    ComplexScriptTheme,
}

impl FontSlot {
    pub const ALL: [FontSlot; 9] = [
        FontSlot::Hint,
        FontSlot::Ascii,
        FontSlot::HighAnsi,
        FontSlot::EastAsia,
        FontSlot::ComplexScript,
        FontSlot::AsciiTheme,
        FontSlot::HighAnsiTheme,
        FontSlot::EastAsiaTheme,
        FontSlot::ComplexScriptTheme,
    ];

    pub fn attribute_name(self) -> &'static str {
        match self {
            FontSlot::Hint => "hint",
            FontSlot::Ascii => "ascii",
            FontSlot::HighAnsi => "hAnsi",
            FontSlot::EastAsia => "eastAsia",
            FontSlot::ComplexScript => "cs",
            FontSlot::AsciiTheme => "asciiTheme",
            FontSlot::HighAnsiTheme => "hAnsiTheme",
            FontSlot::EastAsiaTheme => "eastAsiaTheme",
            FontSlot::ComplexScriptTheme => "cstheme",
        }
    }

    pub fn from_attribute_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|slot| slot.attribute_name() == name)
    }
}

/// The glyph repertoire a piece of text draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentCategory {
    Ascii,
    HighAnsi,
    ComplexScript,
    EastAsian,
}

impl ContentCategory {
    pub const ALL: [ContentCategory; 4] = [
        ContentCategory::Ascii,
        ContentCategory::HighAnsi,
        ContentCategory::ComplexScript,
        ContentCategory::EastAsian,
    ];

    /// Font slots consulted when rendering text of this category.
    pub fn slots(self) -> &'static [FontSlot] {
        match self {
            ContentCategory::Ascii => &[FontSlot::Ascii, FontSlot::AsciiTheme],
            ContentCategory::HighAnsi => &[FontSlot::HighAnsi, FontSlot::HighAnsiTheme],
            ContentCategory::ComplexScript => {
                &[FontSlot::ComplexScript, FontSlot::ComplexScriptTheme]
            }
            // the hint only changes how ambiguous characters are classified,
            // which matters for east-Asian text only
            ContentCategory::EastAsian => {
                &[FontSlot::EastAsia, FontSlot::EastAsiaTheme, FontSlot::Hint]
            }
        }
    }

    fn bit(self) -> u8 {
        match self {
            ContentCategory::Ascii => 1,
            ContentCategory::HighAnsi => 2,
            ContentCategory::ComplexScript => 4,
            ContentCategory::EastAsian => 8,
        }
    }
}

/// A set of content categories.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ContentCategories(u8);

impl ContentCategories {
    pub fn empty() -> Self {
        Self(0)
    }

    pub fn insert(&mut self, category: ContentCategory) {
        self.0 |= category.bit();
    }

    pub fn contains(self, category: ContentCategory) -> bool {
        self.0 & category.bit() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub fn intersection(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    pub fn iter(self) -> impl Iterator<Item = ContentCategory> {
        ContentCategory::ALL
            .into_iter()
            .filter(move |category| self.contains(*category))
    }
}

impl FromIterator<ContentCategory> for ContentCategories {
    fn from_iter<I: IntoIterator<Item = ContentCategory>>(iter: I) -> Self {
        let mut set = Self::empty();
        for category in iter {
            set.insert(category);
        }
        set
    }
}

impl fmt::Display for ContentCategories {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self.iter().map(|c| format!("{c:?}")).collect();
        write!(f, "{{{}}}", names.join(", "))
    }
}

/// Classify the characters of a run's text.
///
/// When `complex_script` is set (the run carries `w:rtl` or `w:cs`), every
/// character is rendered with the complex-script font.
pub fn detect_categories(text: &str, source: &Locale, complex_script: bool) -> ContentCategories {
    if text.is_empty() {
        return ContentCategories::empty();
    }
    if complex_script {
        return [ContentCategory::ComplexScript].into_iter().collect();
    }
    let east_asian_quotes = source.is_east_asian();
    text.chars().map(|c| classify(c, east_asian_quotes)).collect()
}

/// Classify a single character.
pub fn classify(c: char, east_asian_quotes: bool) -> ContentCategory {
    let cp = c as u32;
    if cp <= 0x7F {
        return ContentCategory::Ascii;
    }
    if matches!(cp, 0x2018 | 0x2019 | 0x201C | 0x201D) {
        return if east_asian_quotes {
            ContentCategory::EastAsian
        } else {
            ContentCategory::HighAnsi
        };
    }
    if is_complex_script(cp) {
        return ContentCategory::ComplexScript;
    }
    if is_east_asian(cp) {
        return ContentCategory::EastAsian;
    }
    ContentCategory::HighAnsi
}

fn is_complex_script(cp: u32) -> bool {
    matches!(cp,
        0x0590..=0x08FF     // Hebrew, Arabic, Syriac, Thaana, NKo, Samaritan, Mandaic
        | 0x0900..=0x0DFF   // Indic scripts through Sinhala
        | 0x0E00..=0x0EFF   // Thai, Lao
        | 0x0F00..=0x0FFF   // Tibetan
        | 0x1780..=0x17FF   // Khmer
        | 0xFB1D..=0xFDFF   // Hebrew and Arabic presentation forms A
        | 0xFE70..=0xFEFF   // Arabic presentation forms B
    )
}

fn is_east_asian(cp: u32) -> bool {
    matches!(cp,
        0x1100..=0x11FF     // Hangul Jamo
        | 0x2E80..=0x2FFF   // CJK radicals, Kangxi, ideographic description
        | 0x3000..=0x303F   // CJK symbols and punctuation
        | 0x3040..=0x30FF   // Hiragana, Katakana
        | 0x3100..=0x31FF   // Bopomofo, Hangul compatibility Jamo, Kanbun
        | 0x3200..=0x33FF   // Enclosed CJK, compatibility
        | 0x3400..=0x4DBF   // CJK extension A
        | 0x4E00..=0x9FFF   // CJK unified ideographs
        | 0xA000..=0xA4CF   // Yi
        | 0xAC00..=0xD7AF   // Hangul syllables
        | 0xF900..=0xFAFF   // CJK compatibility ideographs
        | 0xFE30..=0xFE4F   // CJK compatibility forms
        | 0xFF00..=0xFFEF   // Halfwidth and fullwidth forms
        | 0x20000..=0x3FFFF // supplementary ideographic planes
    )
}

/// The `w:rFonts` property.
#[derive(Debug, Clone)]
pub struct RunFonts {
    pub name: QName,
    slots: BTreeMap<FontSlot, String>,
    /// Attributes that are not font slots, kept for output.
    extra: Vec<Attribute>,
    detected: ContentCategories,
}

impl RunFonts {
    pub fn new(name: QName) -> Self {
        Self {
            name,
            slots: BTreeMap::new(),
            extra: Vec::new(),
            detected: ContentCategories::empty(),
        }
    }

    pub fn from_start(start: &StartElement) -> Self {
        let mut fonts = Self::new(start.name.clone());
        for attr in &start.attributes {
            match FontSlot::from_attribute_name(&attr.name.local) {
                Some(slot) if !attr.is_namespace_declaration() => {
                    fonts.slots.insert(slot, attr.value.clone());
                }
                _ => fonts.extra.push(attr.clone()),
            }
        }
        fonts
    }

    pub fn with_slot(mut self, slot: FontSlot, font: impl Into<String>) -> Self {
        self.set(slot, font);
        self
    }

    pub fn get(&self, slot: FontSlot) -> Option<&str> {
        self.slots.get(&slot).map(String::as_str)
    }

    pub fn set(&mut self, slot: FontSlot, font: impl Into<String>) {
        self.slots.insert(slot, font.into());
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty() && self.extra.is_empty()
    }

    /// Categories exercised by the text of the run carrying these fonts.
    pub fn detected(&self) -> ContentCategories {
        self.detected
    }

    pub fn set_detected(&mut self, detected: ContentCategories) {
        self.detected = detected;
    }

    /// Overlay `over` on `self`, slot by slot.
    pub fn combine(&self, over: &RunFonts) -> RunFonts {
        let mut combined = self.clone();
        combined.name = over.name.clone();
        for (slot, font) in &over.slots {
            combined.slots.insert(*slot, font.clone());
        }
        for attr in &over.extra {
            combined.extra.retain(|a| a.name != attr.name);
            combined.extra.push(attr.clone());
        }
        combined.detected = self.detected.union(over.detected);
        combined
    }

    /// Slot-for-slot equality, ignoring detected categories.
    pub fn same_fonts(&self, other: &RunFonts) -> bool {
        self.slots == other.slots && self.extra == other.extra
    }

    /// Check that every slot of the given categories agrees.
    pub fn agrees_on(&self, other: &RunFonts, categories: ContentCategories) -> bool {
        categories.iter().all(|category| {
            category
                .slots()
                .iter()
                .all(|slot| self.get(*slot) == other.get(*slot))
        })
    }

    /// Build the font property of a merged run.
    ///
    /// Each category's slots come from the run whose text exercises that
    /// category; categories neither run exercises keep the first run's
    /// assignment, or the second's if the first has none.
    pub fn reconcile(
        first: &RunFonts,
        first_detected: ContentCategories,
        second: &RunFonts,
        second_detected: ContentCategories,
    ) -> RunFonts {
        let mut merged = RunFonts::new(first.name.clone());
        merged.extra = first.extra.clone();
        for category in ContentCategory::ALL {
            let source = if first_detected.contains(category) {
                first
            } else if second_detected.contains(category) {
                second
            } else if category.slots().iter().any(|s| first.get(*s).is_some()) {
                first
            } else {
                second
            };
            for slot in category.slots() {
                if let Some(font) = source.get(*slot) {
                    merged.set(*slot, font);
                }
            }
        }
        merged.detected = first_detected.union(second_detected);
        merged
    }

    pub fn to_events(&self) -> Vec<XmlEvent> {
        let mut start = StartElement::new(self.name.clone());
        for (slot, font) in &self.slots {
            start
                .attributes
                .push(Attribute::new(self.name.sibling(slot.attribute_name()), font));
        }
        start.attributes.extend(self.extra.iter().cloned());
        let end = start.end();
        vec![XmlEvent::Start(start), XmlEvent::End(end)]
    }
}

impl PartialEq for RunFonts {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.same_fonts(other)
    }
}
