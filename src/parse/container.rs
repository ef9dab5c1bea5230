use super::block::BlockParser;
use super::skip::AttributeStripper;
use crate::error::{Error, Result};
use crate::model::{ContainerKind, RunContainer, RunContainerBuilder};
use crate::xml::names::W_NS;
use crate::xml::{QName, StartElement, XmlEvent};

/// Property elements that precede a container's content.
fn is_prologue(name: &QName) -> bool {
    name.in_namespace(W_NS)
        && matches!(
            name.local.as_str(),
            "sdtPr" | "sdtEndPr" | "smartTagPr" | "customXmlPr"
        )
}

impl BlockParser<'_, '_, '_> {
    /// Parse a run container whose start tag was just consumed.
    pub(super) fn parse_container(
        &mut self,
        kind: ContainerKind,
        start: &StartElement,
    ) -> Result<RunContainer> {
        let mut tag = start.clone();
        AttributeStripper.strip(&mut tag);
        let mut builder = RunContainerBuilder::new(kind, tag);

        while let Some(XmlEvent::Start(child)) = self.cursor.peek_tag() {
            if is_prologue(&child.name) {
                self.cursor.skip_whitespace();
                self.cursor.next();
                let events = self.take_element(child)?;
                builder.add_start_markup(events);
                continue;
            }
            if child.name.is(W_NS, "sdtContent") {
                self.cursor.skip_whitespace();
                self.cursor.next();
                let mut content = child.clone();
                AttributeStripper.strip(&mut content);
                builder.add_start_tag(content);
                let content_end = self.parse_children(&child.name, &mut builder)?;
                builder.add_end_tag(content_end);
                return self.finish_content_control(start, builder);
            }
            break;
        }

        let end = self.parse_children(&start.name, &mut builder)?;
        builder.add_end_tag(end);
        Ok(builder.build())
    }

    /// Whatever follows `w:sdtContent` (usually `w:sdtEndPr`) closes the
    /// container.
    fn finish_content_control(
        &mut self,
        start: &StartElement,
        mut builder: RunContainerBuilder,
    ) -> Result<RunContainer> {
        loop {
            match self.cursor.next() {
                Some(XmlEvent::End(end)) if end.name == start.name => {
                    builder.add_end_tag(end.clone());
                    return Ok(builder.build());
                }
                Some(XmlEvent::Start(child)) => {
                    let events = self.take_element(child)?;
                    builder.add_end_markup(events);
                }
                Some(XmlEvent::End(end)) => {
                    return Err(Error::UnexpectedStructure(format!(
                        "unexpected end of {} in {}",
                        end.name, start.name
                    )));
                }
                Some(_) => {}
                None => return Err(Error::UnterminatedElement(start.name.qualified())),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn w(local: &str) -> QName {
        QName::new(Some("w"), local, Some(W_NS))
    }

    #[test]
    fn test_prologue_elements() {
        assert!(is_prologue(&w("sdtPr")));
        assert!(is_prologue(&w("smartTagPr")));
        assert!(is_prologue(&w("customXmlPr")));
        assert!(!is_prologue(&w("rPr")));
        assert!(!is_prologue(&w("pPr")));
        assert!(!is_prologue(&QName::new(Some("a"), "rPr", Some(crate::xml::names::A_NS))));
    }
}
