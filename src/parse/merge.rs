//! Run merging.
//!
//! Word splits text into many runs for reasons that do not change how it
//! renders: spell-check state, editing sessions, fonts assigned to scripts
//! the text never uses. Every run boundary becomes an inline code in the
//! extracted text, so adjacent runs that render identically are merged back
//! together first.

use log::trace;

use crate::config::Config;
use crate::properties::{ContentCategories, ContentCategory, RunFonts, RunProperties, RunProperty};
use crate::model::RunBuilder;
use crate::styles::StyleSource;

/// Decides and performs merges of adjacent runs within one block.
pub struct RunMerger<'a> {
    config: &'a Config,
    styles: &'a dyn StyleSource,
    paragraph_style: Option<&'a str>,
}

impl<'a> RunMerger<'a> {
    pub fn new(
        config: &'a Config,
        styles: &'a dyn StyleSource,
        paragraph_style: Option<&'a str>,
    ) -> Self {
        Self {
            config,
            styles,
            paragraph_style,
        }
    }

    /// Merge every mergeable pair in a sequence of adjacent runs.
    pub fn merge_all(&self, runs: Vec<RunBuilder>) -> Vec<RunBuilder> {
        let mut merged = Vec::with_capacity(runs.len());
        let mut runs = runs.into_iter();
        let Some(mut current) = runs.next() else {
            return merged;
        };
        for next in runs {
            match self.merge(&current, &next) {
                Some(combined) => current = combined,
                None => merged.push(std::mem::replace(&mut current, next)),
            }
        }
        merged.push(current);
        merged
    }

    /// Check whether two adjacent runs may be merged.
    pub fn can_merge(&self, left: &RunBuilder, right: &RunBuilder) -> bool {
        // 1. Hidden text keeps its own run
        if left.hidden || right.hidden {
            return false;
        }

        // 2. Math corrupts when split and rejoined
        if left.is_math() || right.is_math() {
            return false;
        }

        // 3. Nested content and field characters stay put
        if !left.nested.is_empty() || !right.nested.is_empty() {
            return false;
        }
        if left.complex_codes || right.complex_codes {
            return false;
        }

        // 4. Same run element
        if left.name() != right.name() || left.bare != right.bare {
            return false;
        }

        // 5. Same effective formatting apart from fonts
        if left.combined.without_fonts() != right.combined.without_fonts() {
            return false;
        }

        // 6. Fonts agree wherever both runs render text
        let shared = self
            .categories(left)
            .intersection(self.categories(right));
        fonts_agree(left.combined.fonts(), right.combined.fonts(), shared)
    }

    /// Merge two adjacent runs, or return `None` when that would change how
    /// either renders.
    pub fn merge(&self, left: &RunBuilder, right: &RunBuilder) -> Option<RunBuilder> {
        if !self.can_merge(left, right) {
            return None;
        }

        let left_detected = self.categories(left);
        let right_detected = self.categories(right);

        let mut merged = left.clone();
        merged.properties = self.merge_properties(left, left_detected, right, right_detected);
        merged.append_body(right.body.clone());
        merged.combined = self.styles.combine(
            self.paragraph_style,
            merged.properties.run_style(),
            &merged.properties,
        );

        // The heuristic union can pick a different run style than one side
        // had; make sure both sides still render the same.
        let merged_detected = left_detected.union(right_detected);
        let renders_same = merged.combined.without_fonts() == left.combined.without_fonts()
            && fonts_agree(merged.combined.fonts(), left.combined.fonts(), left_detected)
            && fonts_agree(merged.combined.fonts(), right.combined.fonts(), right_detected);
        if !renders_same {
            trace!("merge of {:?} and {:?} rejected after reconciliation", left.text(), right.text());
            return None;
        }

        trace!(
            "merged runs {:?} + {:?} (categories {merged_detected})",
            left.text(),
            right.text()
        );
        Some(merged)
    }

    fn categories(&self, run: &RunBuilder) -> ContentCategories {
        run.categories(&self.config.source_locale)
    }

    /// Direct properties of the merged run: the run with fewer properties is
    /// the base, the other's remaining properties are copied over, and fonts
    /// are reconciled per content category.
    fn merge_properties(
        &self,
        left: &RunBuilder,
        left_detected: ContentCategories,
        right: &RunBuilder,
        right_detected: ContentCategories,
    ) -> RunProperties {
        let (base, rest) = if left.properties.len() <= right.properties.len() {
            (&left.properties, &right.properties)
        } else {
            (&right.properties, &left.properties)
        };

        let mut merged = base.clone();
        if merged.name().is_none()
            && let Some(name) = rest.name()
        {
            merged.set_name(name.clone());
        }
        for property in rest.iter() {
            if merged.get(&property.key()).is_none() {
                merged.push(property.clone());
            }
        }

        let left_fonts = left.properties.fonts();
        let right_fonts = right.properties.fonts();
        if let Some(name) = left_fonts.or(right_fonts).map(|f| f.name.clone()) {
            let empty = RunFonts::new(name);
            let fonts = RunFonts::reconcile(
                left_fonts.unwrap_or(&empty),
                left_detected,
                right_fonts.unwrap_or(&empty),
                right_detected,
            );
            if fonts.is_empty() {
                merged.retain(|p| !matches!(p, RunProperty::Fonts(_)));
            } else {
                merged.set(RunProperty::Fonts(fonts));
            }
        }

        merged.sort_by_schema();
        merged
    }
}

/// Font slots of the given categories agree. A missing font property counts
/// as every slot unset.
fn fonts_agree(a: Option<&RunFonts>, b: Option<&RunFonts>, categories: ContentCategories) -> bool {
    categories.iter().all(|category: ContentCategory| {
        category.slots().iter().all(|slot| {
            a.and_then(|fonts| fonts.get(*slot)) == b.and_then(|fonts| fonts.get(*slot))
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RunChunk;
    use crate::properties::{FontSlot, GenericProperty, ToggleProperty};
    use crate::styles::StyleDefinitions;
    use crate::xml::names::{M_NS, W_NS};
    use crate::xml::{QName, StartElement};

    fn w(local: &str) -> QName {
        QName::new(Some("w"), local, Some(W_NS))
    }

    fn run(text: &str, props: Vec<RunProperty>) -> RunBuilder {
        let mut properties = RunProperties::new(w("rPr"));
        for p in props {
            properties.set(p);
        }
        let mut run = RunBuilder::new(StartElement::new(w("r")));
        run.combined = properties.clone();
        run.properties = properties;
        run.add_text(text);
        run
    }

    fn bold() -> RunProperty {
        RunProperty::Toggle(ToggleProperty::new(w("b"), true))
    }

    fn fonts(slots: &[(FontSlot, &str)]) -> RunProperty {
        let mut fonts = RunFonts::new(w("rFonts"));
        for (slot, name) in slots {
            fonts.set(*slot, *name);
        }
        RunProperty::Fonts(fonts)
    }

    #[test]
    fn test_bold_runs_merge() {
        let config = Config::default();
        let styles = StyleDefinitions::new();
        let merger = RunMerger::new(&config, &styles, None);

        let merged = merger.merge_all(vec![run("Hello", vec![bold()]), run(" world", vec![bold()])]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].text(), "Hello world");
        assert_eq!(merged[0].body, vec![RunChunk::Text("Hello world".into())]);
        assert_eq!(merged[0].properties.len(), 1);
        assert_eq!(merged[0].combined.toggle(W_NS, "b"), Some(true));
    }

    #[test]
    fn test_different_formatting_does_not_merge() {
        let config = Config::default();
        let styles = StyleDefinitions::new();
        let merger = RunMerger::new(&config, &styles, None);
        let merged = merger.merge_all(vec![run("a", vec![bold()]), run("b", vec![]), run("c", vec![])]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[1].text(), "bc");
    }

    #[test]
    fn test_hidden_complex_and_math_runs_stay_apart() {
        let config = Config::default();
        let styles = StyleDefinitions::new();
        let merger = RunMerger::new(&config, &styles, None);

        let mut hidden = run("b", vec![]);
        hidden.hidden = true;
        assert!(!merger.can_merge(&run("a", vec![]), &hidden));

        let mut field = run("b", vec![]);
        field.complex_codes = true;
        assert!(!merger.can_merge(&run("a", vec![]), &field));

        let mut math = RunBuilder::new(StartElement::new(QName::new(Some("m"), "r", Some(M_NS))));
        math.add_text("x");
        assert!(!merger.can_merge(&math, &math.clone()));
    }

    #[test]
    fn test_fonts_for_unused_scripts_do_not_block_merge() {
        let config = Config::default();
        let styles = StyleDefinitions::new();
        let merger = RunMerger::new(&config, &styles, None);

        let left = run("Hello", vec![fonts(&[(FontSlot::Ascii, "Arial"), (FontSlot::EastAsia, "MS Mincho")])]);
        let right = run(" 漢字", vec![fonts(&[(FontSlot::Ascii, "Arial"), (FontSlot::EastAsia, "SimSun")])]);
        let merged = merger.merge(&left, &right).expect("mergeable");

        let merged_fonts = merged.properties.fonts().unwrap();
        assert_eq!(merged_fonts.get(FontSlot::Ascii), Some("Arial"));
        assert_eq!(merged_fonts.get(FontSlot::EastAsia), Some("SimSun"));
    }

    #[test]
    fn test_conflicting_fonts_for_shared_script_block_merge() {
        let config = Config::default();
        let styles = StyleDefinitions::new();
        let merger = RunMerger::new(&config, &styles, None);
        let left = run("Hello", vec![fonts(&[(FontSlot::Ascii, "Arial")])]);
        let right = run("World", vec![fonts(&[(FontSlot::Ascii, "Calibri")])]);
        assert!(merger.merge(&left, &right).is_none());
    }

    #[test]
    fn test_fewer_properties_win() {
        let config = Config::default();
        let styles = StyleDefinitions::new();
        let merger = RunMerger::new(&config, &styles, None);
        let color = || RunProperty::Generic(GenericProperty::with_value(w("color"), Some("FF0000")));

        let left = run("a", vec![bold(), color()]);
        let mut right = run("b", vec![bold()]);
        right.combined = left.combined.clone();
        let merged = merger.merge(&left, &right).expect("mergeable");
        assert_eq!(merged.properties.len(), 2);
    }
}
