//! Whole-part extraction and merging across dialects, through files on disk.

use std::collections::HashMap;
use std::fs;

use tempfile::TempDir;

use runfold::xml::decode_part;
use runfold::{Config, Locale, Segment, StyleDefinitions, UnitId, extract, merge};

const SLIDE: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:cSld><p:spTree><p:sp><p:txBody><a:bodyPr/><a:p><a:r><a:rPr lang="en-US" b="1"/><a:t>Quarterly</a:t></a:r><a:r><a:rPr lang="en-US"/><a:t xml:space="preserve"> results</a:t></a:r></a:p><a:p><a:endParaRPr lang="en-US"/></a:p></p:txBody></p:sp></p:spTree></p:cSld></p:sld>"#;

const SHARED_STRINGS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="2" uniqueCount="2"><si><t>Revenue</t></si><si><r><rPr><b/></rPr><t>Net</t></r><r><t xml:space="preserve"> income</t></r></si></sst>"#;

fn write_part(dir: &TempDir, name: &str, xml: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, xml).unwrap();
    path
}

#[test]
fn test_slide_part_round_trip() {
    let dir = TempDir::new().unwrap();
    let input = write_part(&dir, "slide1.xml", SLIDE);

    let config = Config::default();
    let styles = StyleDefinitions::new();
    let xml = decode_part(&fs::read(&input).unwrap()).into_owned();
    let extraction = extract(&xml, &styles, &config).unwrap();

    let units: Vec<_> = extraction.translatable_units().collect();
    assert_eq!(units.len(), 1);
    assert_eq!(units[0].plain_text(), "Quarterly results");
    assert!(matches!(extraction.segments().first(), Some(Segment::Skeleton(_))));

    let merged = merge(&extraction, &HashMap::new(), &config).unwrap();
    let output = write_part(&dir, "slide1.out.xml", &merged);
    let again = extract(&fs::read_to_string(output).unwrap(), &styles, &config).unwrap();
    assert_eq!(again.units()[0].text, units[0].text);
    assert!(merged.contains(r#"<a:p><a:endParaRPr lang="en-US"/></a:p>"#));
}

#[test]
fn test_slide_translation_keeps_run_properties() {
    let config = Config::default();
    let extraction = extract(SLIDE, &StyleDefinitions::new(), &config).unwrap();
    let unit = &extraction.units()[0];

    let tagged = unit.tagged().replace("Quarterly", "Résultats").replace(" results", " trimestriels");
    let coded = unit.coded_from_tagged(&tagged).unwrap();
    let translations = HashMap::from([(unit.id.clone(), coded)]);
    let merged = merge(&extraction, &translations, &config).unwrap();

    assert!(merged.contains(r#"b="1"/><a:t>Résultats</a:t>"#));
    assert!(merged.contains("trimestriels"));
    assert!(!merged.contains("Quarterly"));
}

#[test]
fn test_slide_rtl_target() {
    let config = Config::default().with_target_locale(Locale::new("ar"));
    let extraction = extract(SLIDE, &StyleDefinitions::new(), &config).unwrap();
    let merged = merge(&extraction, &HashMap::new(), &config).unwrap();
    assert!(merged.contains(r#"<a:p><a:pPr rtl="1"/><a:r>"#));
}

#[test]
fn test_shared_strings_part() {
    let dir = TempDir::new().unwrap();
    let input = write_part(&dir, "sharedStrings.xml", SHARED_STRINGS);
    let config = Config::default();
    let xml = fs::read_to_string(input).unwrap();
    let extraction = extract(&xml, &StyleDefinitions::new(), &config).unwrap();

    let texts: Vec<_> = extraction.units().iter().map(|u| u.plain_text()).collect();
    assert_eq!(texts, vec!["Revenue", "Net income"]);

    let translations = HashMap::from([(UnitId::new("tu1"), "Chiffre d'affaires".to_string())]);
    let merged = merge(&extraction, &translations, &config).unwrap();
    assert!(merged.contains("<si><t>Chiffre d'affaires</t></si>"));
    assert!(merged.contains(r#"count="2""#));
}

#[test]
fn test_utf16_part_is_decoded() {
    let mut bytes = vec![0xFF, 0xFE];
    for unit in SHARED_STRINGS.replace("UTF-8", "UTF-16").encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }
    let xml = decode_part(&bytes);
    let extraction = extract(&xml, &StyleDefinitions::new(), &Config::default()).unwrap();
    assert_eq!(extraction.units().len(), 2);
}
