//! Conversion settings consulted while parsing and writing.
//!
//! A [`Config`] is read-only for the duration of a parse. Every flag is
//! consulted at one well-defined point in the block, run or writer code.

use std::collections::BTreeSet;

/// Line separator inserted for converted line breaks by default.
pub const LINE_SEPARATOR: char = '\u{2028}';

/// Non-breaking hyphen inserted for `w:noBreakHyphen` when replacement is on.
pub const NO_BREAK_HYPHEN: char = '\u{2011}';

/// Languages whose east-Asian quotation marks are classified as east-Asian text.
const EAST_ASIAN_LANGUAGES: &[&str] = &["zh", "ja", "ko"];

/// Languages written right-to-left.
const RTL_LANGUAGES: &[&str] = &["ar", "he", "fa", "ur", "yi", "dv", "ps", "sd", "ug", "ku"];

/// A BCP 47 locale tag such as `en-US` or `zh-Hant-TW`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Locale(String);

impl Locale {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Primary language subtag, lowercased (`zh-TW` → `zh`).
    pub fn language(&self) -> String {
        self.0
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase()
    }

    pub fn is_east_asian(&self) -> bool {
        EAST_ASIAN_LANGUAGES.contains(&self.language().as_str())
    }

    pub fn is_rtl(&self) -> bool {
        RTL_LANGUAGES.contains(&self.language().as_str())
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self::new("en-US")
    }
}

impl From<&str> for Locale {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

/// Settings for block parsing, run merging and text-unit writing.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    /// Accept tracked insertions and drop tracked deletions. When off, any
    /// revision mark aborts the parse with [`crate::Error::RevisionsPresent`].
    pub accept_revisions: bool,
    /// Expose `w:tab` as a literal U+0009 in the text instead of a code.
    pub add_tab_as_character: bool,
    /// Expose line breaks as [`Config::line_separator`] instead of a code.
    pub add_line_separator_character: bool,
    /// Character used for converted line breaks.
    pub line_separator: char,
    /// Expose `w:noBreakHyphen` as U+2011.
    pub replace_no_break_hyphen: bool,
    /// Drop `w:softHyphen` entirely.
    pub ignore_soft_hyphen: bool,
    /// Treat runs hidden through `w:vanish` as translatable text.
    pub translate_hidden: bool,
    /// Strip formatting noise (spacing, kerning, proofing marks, bookmarks,
    /// vertical alignment of blank runs) so more runs merge.
    pub cleanup_aggressively: bool,
    /// Keep drawing titles and descriptions out of the extracted text.
    pub exclude_graphic_metadata: bool,
    /// Field codes whose visible result stays translatable.
    pub persistent_fields: BTreeSet<String>,
    /// Style ids whose paragraphs and runs are never translated.
    pub excluded_styles: BTreeSet<String>,
    pub source_locale: Locale,
    pub target_locale: Option<Locale>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            accept_revisions: true,
            add_tab_as_character: false,
            add_line_separator_character: false,
            line_separator: LINE_SEPARATOR,
            replace_no_break_hyphen: false,
            ignore_soft_hyphen: false,
            translate_hidden: false,
            cleanup_aggressively: false,
            exclude_graphic_metadata: false,
            persistent_fields: BTreeSet::from(["HYPERLINK".to_string()]),
            excluded_styles: BTreeSet::new(),
            source_locale: Locale::default(),
            target_locale: None,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_accept_revisions(mut self, accept: bool) -> Self {
        self.accept_revisions = accept;
        self
    }

    pub fn with_tab_as_character(mut self, enabled: bool) -> Self {
        self.add_tab_as_character = enabled;
        self
    }

    pub fn with_line_separator_character(mut self, enabled: bool) -> Self {
        self.add_line_separator_character = enabled;
        self
    }

    pub fn with_line_separator(mut self, separator: char) -> Self {
        self.line_separator = separator;
        self
    }

    pub fn with_no_break_hyphen_replacement(mut self, enabled: bool) -> Self {
        self.replace_no_break_hyphen = enabled;
        self
    }

    pub fn with_soft_hyphens_ignored(mut self, enabled: bool) -> Self {
        self.ignore_soft_hyphen = enabled;
        self
    }

    pub fn with_hidden_translated(mut self, enabled: bool) -> Self {
        self.translate_hidden = enabled;
        self
    }

    pub fn with_aggressive_cleanup(mut self, enabled: bool) -> Self {
        self.cleanup_aggressively = enabled;
        self
    }

    pub fn with_graphic_metadata_excluded(mut self, enabled: bool) -> Self {
        self.exclude_graphic_metadata = enabled;
        self
    }

    pub fn with_persistent_field(mut self, name: impl Into<String>) -> Self {
        self.persistent_fields.insert(name.into().to_ascii_uppercase());
        self
    }

    pub fn with_excluded_style(mut self, style_id: impl Into<String>) -> Self {
        self.excluded_styles.insert(style_id.into());
        self
    }

    pub fn with_source_locale(mut self, locale: impl Into<Locale>) -> Self {
        self.source_locale = locale.into();
        self
    }

    pub fn with_target_locale(mut self, locale: impl Into<Locale>) -> Self {
        self.target_locale = Some(locale.into());
        self
    }

    /// Check whether a field code name keeps its result translatable.
    pub fn is_persistent_field(&self, name: &str) -> bool {
        self.persistent_fields
            .iter()
            .any(|field| field.eq_ignore_ascii_case(name))
    }

    pub fn is_excluded_style(&self, style_id: &str) -> bool {
        self.excluded_styles.contains(style_id)
    }

    pub fn target_is_rtl(&self) -> bool {
        self.target_locale.as_ref().is_some_and(Locale::is_rtl)
    }
}
