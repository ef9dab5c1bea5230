//! Behavioural scenarios for parsing, run merging, field handling and
//! nested blocks, checked through the public API.

use proptest::prelude::*;

use runfold::model::{Block, BlockArena};
use runfold::parse::{ParseContext, parse_block};
use runfold::unit::{IdGenerator, TagRole, Token, tokenize};
use runfold::xml::names::W_NS;
use runfold::xml::{EventCursor, read_events};
use runfold::{Config, StyleDefinitions, TextUnit, TextUnitMapper};

fn paragraph(body: &str) -> String {
    format!(
        r#"<w:p xmlns:w="{W_NS}" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">{body}</w:p>"#
    )
}

fn parse(body: &str, config: &Config) -> (Block, BlockArena) {
    let events = read_events(&paragraph(body)).unwrap();
    let styles = StyleDefinitions::new();
    let mut cursor = EventCursor::new(&events);
    let mut ctx = ParseContext::new(config, &styles);
    let block = parse_block(&mut cursor, &mut ctx).unwrap();
    (block, ctx.into_arena())
}

fn map(body: &str, config: &Config) -> Vec<TextUnit> {
    let (block, arena) = parse(body, config);
    TextUnitMapper::new(config, &arena)
        .map(&block, &mut IdGenerator::new("tu"))
        .unwrap()
}

/// Opening and closing codes nest, and every opened code is closed.
fn assert_balanced(unit: &TextUnit) {
    let mut open = Vec::new();
    for token in tokenize(&unit.text).unwrap() {
        match token {
            Token::Code(TagRole::Opening, index) => open.push(index),
            Token::Code(TagRole::Closing, index) => {
                assert_eq!(open.pop(), Some(index), "unbalanced close in {:?}", unit.tagged());
            }
            Token::Code(TagRole::Isolated, index) => {
                assert!(unit.code(index).is_some());
            }
            Token::Text(_) => {}
        }
    }
    assert!(open.is_empty(), "unclosed codes in {:?}", unit.tagged());
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_empty_run_yields_no_unit() {
    let units = map("<w:r><w:t></w:t></w:r>", &Config::default());
    assert!(units.is_empty());
}

#[test]
fn test_adjacent_bold_runs_merge() {
    let (block, _) = parse(
        r#"<w:r><w:rPr><w:b/></w:rPr><w:t>Hello</w:t></w:r><w:r><w:rPr><w:b/></w:rPr><w:t xml:space="preserve"> world</w:t></w:r>"#,
        &Config::default(),
    );
    let runs = block.runs();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].text(), "Hello world");
    assert_eq!(runs[0].properties().len(), 1);
    assert!(runs[0].properties().is_on(W_NS, "b"));
}

#[test]
fn test_redundant_namespace_declaration_still_merges() {
    let body = format!(
        r#"<w:r><w:rPr><w:b/></w:rPr><w:t xml:space="preserve">Hello </w:t></w:r><w:r><w:rPr xmlns:w="{W_NS}"><w:b/></w:rPr><w:t>world</w:t></w:r>"#
    );
    let units = map(&body, &Config::default());
    assert_eq!(units.len(), 1);
    assert_eq!(units[0].tagged(), "<g0>Hello world</g0>");
    assert_eq!(units[0].codes.len(), 1);
}

fn field(code: &str) -> String {
    format!(
        r#"<w:r><w:t xml:space="preserve">See </w:t></w:r><w:r><w:fldChar w:fldCharType="begin"/></w:r><w:r><w:instrText xml:space="preserve"> {code} </w:instrText></w:r><w:r><w:fldChar w:fldCharType="separate"/></w:r><w:r><w:t>click here</w:t></w:r><w:r><w:fldChar w:fldCharType="end"/></w:r>"#
    )
}

#[test]
fn test_hyperlink_field_result_is_translatable() {
    let units = map(&field(r#"HYPERLINK "https://example.com""#), &Config::default());
    assert_eq!(units.len(), 1);
    assert!(units[0].translatable);
    assert_eq!(units[0].plain_text(), "See click here");
    assert_balanced(&units[0]);
}

#[test]
fn test_ref_field_result_is_opaque() {
    let units = map(&field("REF _Ref123 \\h"), &Config::default());
    assert_eq!(units.len(), 1);
    assert_eq!(units[0].plain_text(), "See ");
    assert!(
        units[0].codes.iter().all(|code| !code.payload.is_paired()),
        "field markup should be isolated codes"
    );
}

#[test]
fn test_persistent_fields_are_configurable() {
    let config = Config::default().with_persistent_field("REF");
    let units = map(&field("REF _Ref123 \\h"), &config);
    assert_eq!(units[0].plain_text(), "See click here");
}

#[test]
fn test_nested_block_becomes_secondary_unit() {
    let units = map(
        r#"<w:r><w:t xml:space="preserve">Caption </w:t></w:r><w:r><w:pict><w:txbxContent><w:p><w:r><w:t>Boxed text</w:t></w:r></w:p></w:txbxContent></w:pict></w:r>"#,
        &Config::default(),
    );
    assert_eq!(units.len(), 2);
    let isolated: Vec<_> = tokenize(&units[0].text)
        .unwrap()
        .into_iter()
        .filter(|token| matches!(token, Token::Code(TagRole::Isolated, _)))
        .collect();
    assert_eq!(isolated.len(), 1);
    assert_eq!(units[0].references(), vec![&units[1].id]);
    assert!(units[1].referent);
    assert_eq!(units[1].plain_text(), "Boxed text");
}

#[test]
fn test_revisions_rejected_when_not_accepted() {
    let xml = paragraph(r#"<w:ins w:id="1" w:author="a"><w:r><w:t>new</w:t></w:r></w:ins>"#);
    let events = read_events(&xml).unwrap();
    let config = Config::default().with_accept_revisions(false);
    let styles = StyleDefinitions::new();
    let mut cursor = EventCursor::new(&events);
    let mut ctx = ParseContext::new(&config, &styles);
    assert!(matches!(
        parse_block(&mut cursor, &mut ctx),
        Err(runfold::Error::RevisionsPresent(_))
    ));
}

#[test]
fn test_deleted_text_is_dropped() {
    let units = map(
        r#"<w:r><w:t xml:space="preserve">kept </w:t></w:r><w:del w:id="1" w:author="a"><w:r><w:delText>gone</w:delText></w:r></w:del><w:ins w:id="2" w:author="a"><w:r><w:t>added</w:t></w:r></w:ins>"#,
        &Config::default(),
    );
    assert_eq!(units[0].plain_text(), "kept added");
}

// ============================================================================
// Code stack balance
// ============================================================================

#[derive(Debug, Clone)]
struct RunShape {
    bold: bool,
    italic: bool,
    underline: bool,
    linked: bool,
    text: String,
}

fn run_shape() -> impl Strategy<Value = RunShape> {
    (any::<bool>(), any::<bool>(), any::<bool>(), any::<bool>(), "[a-z ]{1,6}").prop_map(
        |(bold, italic, underline, linked, text)| RunShape {
            bold,
            italic,
            underline,
            linked,
            text,
        },
    )
}

fn render(runs: &[RunShape]) -> String {
    let mut body = String::new();
    for (i, run) in runs.iter().enumerate() {
        let mut props = String::new();
        if run.bold {
            props.push_str("<w:b/>");
        }
        if run.italic {
            props.push_str("<w:i/>");
        }
        if run.underline {
            props.push_str(r#"<w:u w:val="single"/>"#);
        }
        let rpr = if props.is_empty() {
            String::new()
        } else {
            format!("<w:rPr>{props}</w:rPr>")
        };
        let r = format!(r#"<w:r>{rpr}<w:t xml:space="preserve">{}</w:t></w:r>"#, run.text);
        if run.linked {
            body.push_str(&format!(r#"<w:hyperlink r:id="rId{i}">{r}</w:hyperlink>"#));
        } else {
            body.push_str(&r);
        }
    }
    body
}

proptest! {
    #[test]
    fn code_stack_is_balanced(runs in proptest::collection::vec(run_shape(), 1..8)) {
        let units = map(&render(&runs), &Config::default());
        for unit in &units {
            assert_balanced(unit);
        }
        let expected: String = runs.iter().map(|run| run.text.as_str()).collect();
        if let Some(unit) = units.first() {
            prop_assert_eq!(unit.plain_text(), expected);
        }
    }
}
