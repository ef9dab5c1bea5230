//! Namespace URIs and element names the engine recognises.

/// WordprocessingML main namespace.
pub const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
/// DrawingML main namespace.
pub const A_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
/// SpreadsheetML main namespace.
pub const X_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
/// Office Math namespace. Math runs corrupt when split and rejoined.
pub const M_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/math";
/// Word drawing placement namespace (`wp:docPr`).
pub const WP_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";
/// DrawingML picture namespace (`pic:cNvPr`).
pub const PIC_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/picture";
/// Presentation namespace (`p:cNvPr`).
pub const P_NS: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
/// Word 2010 extensions (`w14:paraId`, `w14:textId`).
pub const W14_NS: &str = "http://schemas.microsoft.com/office/word/2010/wordml";
/// Markup compatibility namespace.
pub const MC_NS: &str = "http://schemas.openxmlformats.org/markup-compatibility/2006";

/// Paragraph-like elements that start a block.
pub fn is_block_start(ns: Option<&str>, local: &str) -> bool {
    matches!(
        (ns, local),
        (Some(W_NS), "p") | (Some(A_NS), "p") | (Some(X_NS), "si") | (Some(X_NS), "is")
    )
}

/// Run elements, in any dialect (math runs included; they are never merged).
pub fn is_run(ns: Option<&str>, local: &str) -> bool {
    matches!(
        (ns, local),
        (Some(W_NS), "r") | (Some(A_NS), "r") | (Some(X_NS), "r") | (Some(M_NS), "r")
    )
}

/// Run property blocks.
pub fn is_run_properties(ns: Option<&str>, local: &str) -> bool {
    matches!(
        (ns, local),
        (Some(W_NS), "rPr") | (Some(A_NS), "rPr") | (Some(X_NS), "rPr") | (Some(M_NS), "rPr")
    )
}

/// Paragraph property blocks.
pub fn is_paragraph_properties(ns: Option<&str>, local: &str) -> bool {
    matches!((ns, local), (Some(W_NS), "pPr") | (Some(A_NS), "pPr"))
}

/// Text-bearing elements inside a run.
pub fn is_text(ns: Option<&str>, local: &str) -> bool {
    matches!(
        (ns, local),
        (Some(W_NS), "t") | (Some(A_NS), "t") | (Some(X_NS), "t")
    )
}

/// Elements flushed as opaque markup at block level.
pub fn is_simple_field(ns: Option<&str>, local: &str) -> bool {
    matches!((ns, local), (Some(W_NS), "fldSimple") | (Some(A_NS), "fld"))
}
