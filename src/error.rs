//! Error types for runfold operations.

use thiserror::Error;

/// Errors that can occur while parsing, mapping or writing markup.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "cli")]
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Malformed XML: {0}")]
    MalformedXml(String),

    /// The event stream ended before the block's end tag.
    #[error("Unterminated block: <{0}>")]
    UnterminatedBlock(String),

    /// The event stream ended before the run's end tag.
    #[error("Unterminated run: <{0}>")]
    UnterminatedRun(String),

    /// The event stream ended inside an element consumed as markup.
    #[error("Unterminated element: <{0}>")]
    UnterminatedElement(String),

    /// Content where only whitespace or a specific terminator is valid.
    #[error("Unexpected structure: {0}")]
    UnexpectedStructure(String),

    /// A revision mark was found while revisions are not accepted automatically.
    #[error("Document contains tracked revisions (<{0}>) and revisions are not accepted")]
    RevisionsPresent(String),

    /// A chunk of the wrong kind where a run or run container was expected.
    #[error("Unexpected chunk: expected a run or run container, found {0}")]
    UnexpectedChunk(&'static str),

    /// A style inherits from itself, directly or through its chain.
    #[error("Cyclic style inheritance through style '{0}'")]
    CyclicStyle(String),

    #[error("Unknown code index {0} in coded text")]
    UnknownCode(usize),

    #[error("Unbalanced code {0} in coded text")]
    UnbalancedCode(usize),

    #[error("Unknown text unit: {0}")]
    UnknownUnit(String),

    #[error("Invalid tagged text: {0}")]
    InvalidTaggedText(String),

    #[cfg(feature = "cli")]
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
