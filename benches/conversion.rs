//! Benchmarks for the extraction and merge pipeline.
//!
//! Run with: cargo bench

use std::collections::HashMap;
use std::fmt::Write as _;

use criterion::{Criterion, criterion_group, criterion_main};

use runfold::xml::read_events;
use runfold::{Config, StyleDefinitions, extract, extract_events, merge};

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

/// A document part with mixed formatting, fields, hyperlinks and revisions.
fn sample_document(paragraphs: usize) -> String {
    let mut body = String::new();
    for i in 0..paragraphs {
        let _ = write!(
            body,
            r#"<w:p><w:pPr><w:pStyle w:val="Normal"/></w:pPr><w:r><w:t xml:space="preserve">Paragraph {i} has </w:t></w:r><w:r><w:rPr><w:b/><w:lang w:val="en-US"/></w:rPr><w:t>bold</w:t></w:r><w:r><w:rPr><w:b/><w:lang w:val="en-GB"/></w:rPr><w:t xml:space="preserve"> text</w:t></w:r><w:proofErr w:type="spellStart"/><w:r><w:t xml:space="preserve">, a </w:t></w:r><w:proofErr w:type="spellEnd"/><w:hyperlink r:id="rId{i}"><w:r><w:rPr><w:rStyle w:val="Hyperlink"/></w:rPr><w:t>link</w:t></w:r></w:hyperlink><w:ins w:id="{i}" w:author="a"><w:r><w:t xml:space="preserve"> and </w:t></w:r></w:ins><w:r><w:fldChar w:fldCharType="begin"/></w:r><w:r><w:instrText xml:space="preserve"> PAGE </w:instrText></w:r><w:r><w:fldChar w:fldCharType="separate"/></w:r><w:r><w:t>1</w:t></w:r><w:r><w:fldChar w:fldCharType="end"/></w:r><w:r><w:t>.</w:t></w:r></w:p>"#
        );
    }
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="{W_NS}" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><w:body>{body}<w:sectPr/></w:body></w:document>"#
    )
}

fn sample_styles() -> String {
    format!(
        r#"<w:styles xmlns:w="{W_NS}"><w:docDefaults><w:rPrDefault><w:rPr><w:sz w:val="22"/></w:rPr></w:rPrDefault></w:docDefaults><w:style w:type="paragraph" w:default="1" w:styleId="Normal"/><w:style w:type="character" w:styleId="Hyperlink"><w:rPr><w:color w:val="0563C1"/><w:u w:val="single"/></w:rPr></w:style></w:styles>"#
    )
}

// ============================================================================
// Pipeline Benchmarks
// ============================================================================

fn bench_read_events(c: &mut Criterion) {
    let xml = sample_document(200);
    c.bench_function("read_events", |b| {
        b.iter(|| read_events(&xml).unwrap());
    });
}

fn bench_extract(c: &mut Criterion) {
    let config = Config::default();
    let styles = StyleDefinitions::parse(&sample_styles(), &config).unwrap();
    let events = read_events(&sample_document(200)).unwrap();
    c.bench_function("extract", |b| {
        b.iter(|| extract_events(&events, &styles, &config).unwrap());
    });
}

fn bench_merge(c: &mut Criterion) {
    let config = Config::default();
    let styles = StyleDefinitions::parse(&sample_styles(), &config).unwrap();
    let extraction = extract(&sample_document(200), &styles, &config).unwrap();
    let translations = HashMap::new();
    c.bench_function("merge", |b| {
        b.iter(|| merge(&extraction, &translations, &config).unwrap());
    });
}

criterion_group!(benches, bench_read_events, bench_extract, bench_merge);
criterion_main!(benches);
