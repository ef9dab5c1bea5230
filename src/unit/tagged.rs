//! Tagged rendering of coded text for display and editing.

use std::fmt::Write as _;

use quick_xml::escape::{minimal_escape, unescape};

use super::{TagRole, TextUnit, index_of, push_marker};
use crate::error::{Error, Result};

impl TextUnit {
    /// Coded text with markers rendered as `<gN>`, `</gN>` and `<xN/>`.
    /// Literal `<` and `&` in the text are escaped.
    pub fn tagged(&self) -> String {
        let mut out = String::with_capacity(self.text.len());
        let mut span = String::new();
        let mut chars = self.text.chars();
        while let Some(c) = chars.next() {
            let Some(role) = TagRole::from_marker(c) else {
                span.push(c);
                continue;
            };
            let Some(index) = chars.next().and_then(index_of) else {
                continue;
            };
            out.push_str(&minimal_escape(std::mem::take(&mut span)));
            let _ = match role {
                TagRole::Opening => write!(out, "<g{index}>"),
                TagRole::Closing => write!(out, "</g{index}>"),
                TagRole::Isolated => write!(out, "<x{index}/>"),
            };
        }
        out.push_str(&minimal_escape(span));
        out
    }

    /// Convert edited tagged text back to coded text.
    ///
    /// Tags must name codes of this unit, paired tags must nest, and a code
    /// must be used in its own role (`g` for formatting and containers, `x`
    /// for isolated markup). Isolated codes may be dropped.
    pub fn coded_from_tagged(&self, tagged: &str) -> Result<String> {
        let mut out = String::with_capacity(tagged.len());
        let mut open = Vec::new();
        let mut rest = tagged;

        while let Some(lt) = rest.find('<') {
            push_unescaped(&mut out, &rest[..lt])?;
            let gt = rest[lt..]
                .find('>')
                .map(|offset| lt + offset)
                .ok_or_else(|| Error::InvalidTaggedText(format!("unclosed tag in {tagged:?}")))?;
            let tag = &rest[lt + 1..gt];
            let (role, index) = parse_tag(tag)
                .ok_or_else(|| Error::InvalidTaggedText(format!("unknown tag <{tag}>")))?;
            let code = self.code(index).ok_or(Error::UnknownCode(index))?;

            let paired = code.payload.is_paired();
            match role {
                TagRole::Opening if paired => open.push(index),
                TagRole::Closing if paired && open.last() == Some(&index) => {
                    open.pop();
                }
                TagRole::Isolated if !paired => {}
                _ => return Err(Error::UnbalancedCode(index)),
            }
            push_marker(&mut out, role, index);
            rest = &rest[gt + 1..];
        }
        push_unescaped(&mut out, rest)?;

        match open.pop() {
            Some(index) => Err(Error::UnbalancedCode(index)),
            None => Ok(out),
        }
    }
}

fn parse_tag(tag: &str) -> Option<(TagRole, usize)> {
    let (role, number) = if let Some(number) = tag.strip_prefix("/g") {
        (TagRole::Closing, number)
    } else if let Some(number) = tag.strip_prefix('g') {
        (TagRole::Opening, number)
    } else {
        (TagRole::Isolated, tag.strip_prefix('x')?.strip_suffix('/')?)
    };
    number.trim_end().parse().ok().map(|index| (role, index))
}

fn push_unescaped(out: &mut String, text: &str) -> Result<()> {
    let text = unescape(text).map_err(|e| Error::InvalidTaggedText(e.to_string()))?;
    out.push_str(&text);
    Ok(())
}
