//! runfold - extract translatable text from OOXML parts and merge it back

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{Read, Seek, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use runfold::xml::decode_part;
use runfold::{Config, Error, Extraction, Result, StyleDefinitions, UnitId};

/// Styles part that WordprocessingML parts resolve against.
const WORD_STYLES: &str = "word/styles.xml";

const PACKAGE_EXTENSIONS: &[&str] = &["docx", "docm", "dotx", "pptx", "pptm", "xlsx", "xlsm"];

#[derive(Parser)]
#[command(name = "runfold")]
#[command(version, about = "Extract translatable text from OOXML parts and merge it back", long_about = None)]
#[command(after_help = "EXAMPLES:
    runfold extract report.docx > units.json          Print text units as JSON
    runfold merge report.docx fr.json report.fr.docx  Write a translated copy
    runfold roundtrip word/document.xml               Check an untranslated rewrite")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// JSON file with conversion settings
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Styles part to resolve formatting against (defaults to the package's)
    #[arg(short, long, global = true, value_name = "FILE")]
    styles: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Print the text units of a part as JSON
    Extract {
        /// XML part or OOXML package
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Include units that are not translatable
        #[arg(short, long)]
        all: bool,
    },
    /// Write a part back with translations applied
    Merge {
        /// XML part or OOXML package
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// JSON object mapping unit ids to tagged text
        #[arg(value_name = "TRANSLATIONS")]
        translations: PathBuf,

        /// Output part, or package when the input is a package
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,
    },
    /// Check that an untranslated rewrite re-extracts to the same text
    Roundtrip {
        /// XML part or OOXML package
        #[arg(value_name = "INPUT")]
        input: PathBuf,
    },
}

/// A text unit as exchanged with translators.
#[derive(Serialize)]
struct UnitRecord {
    id: String,
    text: String,
    translatable: bool,
}

#[derive(Deserialize)]
#[serde(transparent)]
struct Translations(HashMap<String, String>);

/// The parts being worked on, read from a raw XML file or a package.
struct Source {
    parts: Vec<SourcePart>,
    styles: Option<String>,
}

struct SourcePart {
    /// Entry name inside the package, `None` for a raw part.
    entry: Option<String>,
    xml: String,
}

impl SourcePart {
    /// Inside a package, ids are qualified by the entry name.
    fn record_id(&self, id: &UnitId) -> String {
        match &self.entry {
            Some(entry) => format!("{entry}#{id}"),
            None => id.to_string(),
        }
    }
}

impl Source {
    /// Find the part and unit a translator-facing id refers to.
    fn locate(&self, key: &str) -> Option<(usize, UnitId)> {
        let (entry, id) = match key.split_once('#') {
            Some((entry, id)) => (Some(entry), id),
            None => (None, key),
        };
        let index = self.parts.iter().position(|part| part.entry.as_deref() == entry)?;
        Some((index, UnitId::new(id)))
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<bool> {
    let config = match &cli.config {
        Some(path) => serde_json::from_slice(&std::fs::read(path)?)?,
        None => Config::default(),
    };

    match &cli.command {
        Command::Extract { input, all } => {
            let source = read_source(input)?;
            let extractions = extract(&source, cli.styles.as_deref(), &config)?;
            let mut records = Vec::new();
            for (part, extraction) in source.parts.iter().zip(&extractions) {
                records.extend(
                    extraction
                        .units()
                        .iter()
                        .filter(|unit| *all || unit.translatable)
                        .map(|unit| UnitRecord {
                            id: part.record_id(&unit.id),
                            text: unit.tagged(),
                            translatable: unit.translatable,
                        }),
                );
            }
            println!("{}", serde_json::to_string_pretty(&records)?);
            Ok(true)
        }
        Command::Merge {
            input,
            translations,
            output,
        } => {
            let source = read_source(input)?;
            let extractions = extract(&source, cli.styles.as_deref(), &config)?;
            let Translations(tagged) = serde_json::from_slice(&std::fs::read(translations)?)?;

            let mut coded = vec![HashMap::new(); source.parts.len()];
            for (key, text) in tagged {
                let (index, unit) = source
                    .locate(&key)
                    .and_then(|(index, id)| Some((index, extractions[index].unit(&id)?)))
                    .ok_or_else(|| Error::UnknownUnit(key.clone()))?;
                coded[index].insert(unit.id.clone(), unit.coded_from_tagged(&text)?);
            }
            info!(
                "merging {} of {} units",
                coded.iter().map(HashMap::len).sum::<usize>(),
                extractions.iter().map(|e| e.units().len()).sum::<usize>()
            );

            let mut merged = Vec::with_capacity(source.parts.len());
            for ((part, extraction), coded) in source.parts.iter().zip(&extractions).zip(&coded) {
                merged.push((part, runfold::merge(extraction, coded, &config)?));
            }
            write_target(input, &merged, output)?;
            Ok(true)
        }
        Command::Roundtrip { input } => {
            let source = read_source(input)?;
            let extractions = extract(&source, cli.styles.as_deref(), &config)?;
            let styles = load_styles(&source, cli.styles.as_deref(), &config)?;

            let mut ok = true;
            for (part, extraction) in source.parts.iter().zip(&extractions) {
                let merged = runfold::merge(extraction, &HashMap::new(), &config)?;
                let again = runfold::extract(&merged, &styles, &config)?;

                let mut part_ok = extraction.units().len() == again.units().len();
                for (before, after) in extraction.units().iter().zip(again.units()) {
                    if before.plain_text() != after.plain_text() {
                        println!(
                            "{}: {:?} != {:?}",
                            part.record_id(&before.id),
                            before.plain_text(),
                            after.plain_text()
                        );
                        part_ok = false;
                    }
                }
                let name = match &part.entry {
                    Some(entry) => format!("{}#{entry}", input.display()),
                    None => input.display().to_string(),
                };
                println!(
                    "{name}: {} units, {}",
                    extraction.units().len(),
                    if part_ok { "ok" } else { "MISMATCH" }
                );
                ok &= part_ok;
            }
            Ok(ok)
        }
    }
}

fn extract(source: &Source, styles: Option<&Path>, config: &Config) -> Result<Vec<Extraction>> {
    let styles = load_styles(source, styles, config)?;
    source
        .parts
        .iter()
        .map(|part| runfold::extract(&part.xml, &styles, config))
        .collect()
}

fn load_styles(source: &Source, path: Option<&Path>, config: &Config) -> Result<StyleDefinitions> {
    let xml = match path {
        Some(path) => Some(decode_part(&std::fs::read(path)?).into_owned()),
        None => source.styles.clone(),
    };
    match xml {
        Some(xml) => StyleDefinitions::parse(&xml, config),
        None => Ok(StyleDefinitions::new()),
    }
}

fn is_package(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| PACKAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

/// Package entries that hold translatable blocks.
fn is_text_part(name: &str) -> bool {
    let Some((dir, stem)) = name.strip_suffix(".xml").and_then(|n| n.rsplit_once('/')) else {
        return false;
    };
    match dir {
        "word" => {
            matches!(stem, "document" | "footnotes" | "endnotes" | "comments")
                || stem.starts_with("header")
                || stem.starts_with("footer")
        }
        "ppt/slides" => stem.starts_with("slide"),
        "ppt/notesSlides" => stem.starts_with("notesSlide"),
        "xl" => stem == "sharedStrings",
        _ => false,
    }
}

fn read_source(path: &Path) -> Result<Source> {
    if !is_package(path) {
        return Ok(Source {
            parts: vec![SourcePart {
                entry: None,
                xml: decode_part(&std::fs::read(path)?).into_owned(),
            }],
            styles: None,
        });
    }

    let mut archive = ZipArchive::new(File::open(path)?)?;
    let mut entries: Vec<String> = archive
        .file_names()
        .filter(|name| is_text_part(name))
        .map(str::to_string)
        .collect();
    if entries.is_empty() {
        return Err(Error::UnexpectedStructure(format!(
            "{} has no document, slide or shared strings part",
            path.display()
        )));
    }
    entries.sort_by(|a, b| (a.len(), a).cmp(&(b.len(), b)));

    let mut parts = Vec::with_capacity(entries.len());
    for entry in entries {
        debug!("reading {entry} from {}", path.display());
        let xml = read_archive_file(&mut archive, &entry)?;
        parts.push(SourcePart {
            entry: Some(entry),
            xml,
        });
    }
    let styles = match archive.index_for_name(WORD_STYLES) {
        Some(_) => Some(read_archive_file(&mut archive, WORD_STYLES)?),
        None => None,
    };
    Ok(Source { parts, styles })
}

fn read_archive_file<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<String> {
    let mut file = archive.by_name(name)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;
    Ok(decode_part(&bytes).into_owned())
}

/// Write the merged parts, copying every other package entry unchanged.
fn write_target(input: &Path, merged: &[(&SourcePart, String)], output: &Path) -> Result<()> {
    if let [(SourcePart { entry: None, .. }, xml)] = merged {
        std::fs::write(output, xml)?;
        return Ok(());
    }

    let replaced: HashSet<&str> = merged
        .iter()
        .filter_map(|(part, _)| part.entry.as_deref())
        .collect();
    let mut archive = ZipArchive::new(File::open(input)?)?;
    let mut zip = ZipWriter::new(File::create(output)?);
    let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for i in 0..archive.len() {
        let file = archive.by_index_raw(i)?;
        if replaced.contains(file.name()) {
            continue;
        }
        zip.raw_copy_file(file)?;
    }
    for (part, xml) in merged {
        if let Some(entry) = &part.entry {
            zip.start_file(entry.as_str(), deflated)?;
            zip.write_all(xml.as_bytes())?;
        }
    }
    zip.finish()?;
    info!("wrote {}", output.display());
    Ok(())
}
