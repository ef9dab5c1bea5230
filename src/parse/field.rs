//! Complex field tracking.
//!
//! A complex field spans several runs:
//!
//! ```text
//! <w:fldChar w:fldCharType="begin"/>
//! <w:instrText> HYPERLINK "https://example.com" </w:instrText>
//! <w:fldChar w:fldCharType="separate"/>
//! <w:t>click here</w:t>
//! <w:fldChar w:fldCharType="end"/>
//! ```
//!
//! Fields nest, so the state is a stack of frames. The result of a field is
//! translatable only when the field is persistent (its code names a field
//! on the configured allow-list) and every enclosing field is too.

use crate::config::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldState {
    /// Between `begin` and `separate`: collecting the field code.
    Code,
    /// Between `separate` and `end`: the field's visible result.
    Result,
}

/// One open field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFrame {
    pub state: FieldState,
    pub code: String,
    pub persistent: bool,
}

impl FieldFrame {
    fn new() -> Self {
        Self {
            state: FieldState::Code,
            code: String::new(),
            persistent: false,
        }
    }

    /// Field name: the first word of the code, uppercased.
    pub fn name(&self) -> Option<String> {
        self.code
            .split_whitespace()
            .next()
            .map(|name| name.to_ascii_uppercase())
    }
}

/// The `w:fldChar` type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldChar {
    Begin,
    Separate,
    End,
}

impl FieldChar {
    pub fn from_attribute(value: &str) -> Option<Self> {
        match value {
            "begin" => Some(FieldChar::Begin),
            "separate" => Some(FieldChar::Separate),
            "end" => Some(FieldChar::End),
            _ => None,
        }
    }
}

/// Open complex fields, innermost last. Lives for one block.
#[derive(Debug, Clone, Default)]
pub struct ComplexFieldStack {
    frames: Vec<FieldFrame>,
}

impl ComplexFieldStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> &[FieldFrame] {
        &self.frames
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_active(&self) -> bool {
        !self.frames.is_empty()
    }

    pub fn apply(&mut self, field_char: FieldChar, config: &Config) {
        match field_char {
            FieldChar::Begin => self.begin(),
            FieldChar::Separate => self.separate(config),
            FieldChar::End => {
                self.end();
            }
        }
    }

    pub fn begin(&mut self) {
        self.frames.push(FieldFrame::new());
    }

    /// Append field code text to the innermost frame.
    pub fn instruction(&mut self, text: &str) {
        if let Some(frame) = self.frames.last_mut()
            && frame.state == FieldState::Code
        {
            frame.code.push_str(text);
        }
    }

    /// Switch the innermost frame to its result, deciding persistence.
    pub fn separate(&mut self, config: &Config) {
        if let Some(frame) = self.frames.last_mut() {
            frame.state = FieldState::Result;
            frame.persistent = frame
                .name()
                .is_some_and(|name| config.is_persistent_field(&name));
        }
    }

    /// Close the innermost frame. Returns true when no field remains open.
    pub fn end(&mut self) -> bool {
        self.frames.pop();
        self.frames.is_empty()
    }

    /// Whether content at the current position is translatable text.
    pub fn content_is_translatable(&self) -> bool {
        self.frames
            .iter()
            .all(|frame| frame.state == FieldState::Result && frame.persistent)
    }
}
