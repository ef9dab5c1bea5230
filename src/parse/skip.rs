//! Policies for markup that is consumed without trace.

use log::debug;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::xml::names::{A_NS, W_NS};
use crate::xml::{Attribute, QName, StartElement};

/// What to do with an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipAction {
    Keep,
    /// Drop the element and everything inside it.
    Skip,
    /// Drop the tags, keep parsing the content as if it were in the parent.
    Unwrap,
}

/// Where the element was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipContext {
    /// Child of a block or run container.
    Block,
    /// Child of a run.
    Run,
    /// Child of a run property element.
    RunProperties,
}

/// Decides which elements are noise: tracked revisions, proofing marks and,
/// when cleaning up aggressively, bookmarks and kerning.
#[derive(Debug, Clone, Copy)]
pub struct ElementSkipper<'c> {
    config: &'c Config,
}

impl<'c> ElementSkipper<'c> {
    pub fn new(config: &'c Config) -> Self {
        Self { config }
    }

    /// Decide for one element. Fails with [`Error::RevisionsPresent`] on a
    /// revision mark when revisions are not accepted.
    pub fn action(&self, name: &QName, context: SkipContext) -> Result<SkipAction> {
        if !name.in_namespace(W_NS) {
            return Ok(SkipAction::Keep);
        }
        let local = name.local.as_str();

        if let Some(action) = revision_action(local, context) {
            if !self.config.accept_revisions {
                return Err(Error::RevisionsPresent(name.qualified()));
            }
            debug!("accepting revision mark {name} ({action:?})");
            return Ok(action);
        }

        let skip = match context {
            SkipContext::Block => {
                local == "proofErr"
                    || (self.config.cleanup_aggressively
                        && matches!(local, "bookmarkStart" | "bookmarkEnd"))
            }
            SkipContext::Run => {
                matches!(local, "proofErr" | "lastRenderedPageBreak")
                    || (local == "softHyphen" && self.config.ignore_soft_hyphen)
            }
            SkipContext::RunProperties => {
                self.config.cleanup_aggressively && matches!(local, "noProof" | "kern" | "spacing")
            }
        };
        Ok(if skip { SkipAction::Skip } else { SkipAction::Keep })
    }
}

/// Accepting a revision keeps insertions and drops deletions and history.
fn revision_action(local: &str, context: SkipContext) -> Option<SkipAction> {
    match local {
        "ins" | "moveTo" if context == SkipContext::RunProperties => Some(SkipAction::Skip),
        "ins" | "moveTo" => Some(SkipAction::Unwrap),
        "del" | "moveFrom" | "delText" | "delInstrText" => Some(SkipAction::Skip),
        "moveFromRangeStart" | "moveFromRangeEnd" | "moveToRangeStart" | "moveToRangeEnd" => {
            Some(SkipAction::Skip)
        }
        "customXmlInsRangeStart" | "customXmlInsRangeEnd" | "customXmlDelRangeStart"
        | "customXmlDelRangeEnd" => Some(SkipAction::Skip),
        _ if local.ends_with("PrChange") || local == "tblGridChange" || local == "numberingChange" => {
            Some(SkipAction::Skip)
        }
        _ => None,
    }
}

/// Removes attributes that only record editing history.
#[derive(Debug, Clone, Copy, Default)]
pub struct AttributeStripper;

impl AttributeStripper {
    pub fn strip(&self, start: &mut StartElement) {
        let element = start.name.clone();
        start.attributes.retain(|attr| !is_noise(&element, attr));
    }
}

fn is_noise(element: &QName, attr: &Attribute) -> bool {
    if attr.name.in_namespace(W_NS) && attr.name.local.starts_with("rsid") {
        return true;
    }
    let drawing_run_properties = element.in_namespace(A_NS)
        && matches!(element.local.as_str(), "rPr" | "endParaRPr" | "defRPr");
    drawing_run_properties
        && attr.name.namespace.is_none()
        && matches!(attr.name.local.as_str(), "dirty" | "err" | "smtClean" | "smtId")
}
