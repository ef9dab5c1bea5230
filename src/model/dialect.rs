//! Markup dialects and the run tag names each one uses.

use crate::xml::QName;
use crate::xml::names::{A_NS, M_NS, W_NS, X_NS};

/// The markup vocabulary a block is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Dialect {
    /// WordprocessingML (`w:p`, `w:r`, `w:t`).
    Word,
    /// DrawingML text bodies (`a:p`, `a:r`, `a:t`).
    Drawing,
    /// SpreadsheetML rich strings (`si`, `r`, `t`).
    Sheet,
    /// Office Math (`m:r`, `m:t`). Never merged.
    Math,
}

impl Dialect {
    pub fn of(name: &QName) -> Option<Self> {
        match name.namespace.as_deref()? {
            W_NS => Some(Dialect::Word),
            A_NS => Some(Dialect::Drawing),
            X_NS => Some(Dialect::Sheet),
            M_NS => Some(Dialect::Math),
            _ => None,
        }
    }

    pub fn namespace(self) -> &'static str {
        match self {
            Dialect::Word => W_NS,
            Dialect::Drawing => A_NS,
            Dialect::Sheet => X_NS,
            Dialect::Math => M_NS,
        }
    }
}

/// Names of the run-level elements of one dialect, with the prefix the
/// source document bound to its namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RunTags {
    pub dialect: Dialect,
    pub prefix: Option<String>,
}

impl RunTags {
    pub fn new(dialect: Dialect, prefix: Option<&str>) -> Self {
        Self {
            dialect,
            prefix: prefix.map(str::to_string),
        }
    }

    /// Tags matching the namespace and prefix of an element.
    pub fn for_element(name: &QName) -> Option<Self> {
        Dialect::of(name).map(|dialect| Self::new(dialect, name.prefix.as_deref()))
    }

    pub fn name(&self, local: &str) -> QName {
        QName::new(self.prefix.as_deref(), local, Some(self.dialect.namespace()))
    }

    pub fn run(&self) -> QName {
        self.name("r")
    }

    pub fn text(&self) -> QName {
        self.name("t")
    }

    pub fn properties(&self) -> QName {
        self.name("rPr")
    }

    pub fn paragraph_properties(&self) -> QName {
        self.name("pPr")
    }

    /// Whether `xml:space="preserve"` is meaningful on text elements.
    pub fn preserves_space(&self) -> bool {
        !matches!(self.dialect, Dialect::Drawing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_keep_source_prefix() {
        let p = QName::new(Some("ns0"), "p", Some(W_NS));
        let tags = RunTags::for_element(&p).unwrap();
        assert_eq!(tags.dialect, Dialect::Word);
        assert_eq!(tags.run().qualified(), "ns0:r");
        assert_eq!(tags.text().qualified(), "ns0:t");
    }

    #[test]
    fn test_sheet_tags_are_unprefixed() {
        let si = QName::new(None, "si", Some(X_NS));
        let tags = RunTags::for_element(&si).unwrap();
        assert_eq!(tags.properties().qualified(), "rPr");
        assert!(tags.preserves_space());
        assert!(RunTags::for_element(&QName::local("p")).is_none());
    }
}
