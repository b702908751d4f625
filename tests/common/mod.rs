/*!
 * Common test utilities for the nmtrans test suite
 */

#![allow(dead_code)]

use anyhow::Result;
use std::fs;
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

use nmtrans::app_config::{Config, ModelEntry, PathsConfig};
use nmtrans::engines::mock::{MockEngine, MockLoader};
use nmtrans::language_utils::LanguageCode;
use nmtrans::translation::{ModelRegistry, TextGuard};

/// Location of the mock English to French model
pub const EN_FR: &str = "mock://en-fr";

/// Location of the mock English to German model
pub const EN_DE: &str = "mock://en-de";

/// Sample subtitle content used across tests
pub const SAMPLE_SRT: &str = "1
00:00:01,000 --> 00:00:04,000
This is a test subtitle.

2
00:00:05,000 --> 00:00:09,000
It contains
multiple lines.

3
00:00:10,000 --> 00:00:14,000
For testing purposes.
";

/// Routes log output through the test harness, once per process
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Creates a sample subtitle file for testing
pub fn create_test_subtitle(dir: &Path, filename: &str) -> Result<PathBuf> {
    create_test_file(dir, filename, SAMPLE_SRT)
}

pub fn lang(code: &str) -> LanguageCode {
    LanguageCode::parse(code).unwrap()
}

/// Model entries for en->fr and en->de
pub fn model_entries() -> Vec<ModelEntry> {
    vec![
        ModelEntry::new(EN_FR, "en", "fr"),
        ModelEntry::new(EN_DE, "en", "de"),
    ]
}

/// Registry over `model_entries` whose engines all come from `engine`
///
/// The returned loader shares its load log with the one inside the registry.
pub fn mock_registry(engine: MockEngine) -> (Arc<ModelRegistry>, MockLoader) {
    let loader = MockLoader::new(engine);
    let registry = ModelRegistry::from_entries(&model_entries(), Box::new(loader.clone())).unwrap();
    (Arc::new(registry), loader)
}

/// Guard over a mock registry
pub fn mock_guard(engine: MockEngine) -> TextGuard {
    let (registry, _) = mock_registry(engine);
    TextGuard::new(registry)
}

/// Config rooted in `root` with input, intermediate and output folders created
pub fn test_config(root: &Path) -> Result<Config> {
    let paths = PathsConfig {
        input: root.join("input"),
        intermediate: root.join("intermediate"),
        output: root.join("output"),
    };
    fs::create_dir_all(&paths.input)?;
    fs::create_dir_all(&paths.intermediate)?;
    fs::create_dir_all(&paths.output)?;

    Ok(Config {
        paths,
        source_language: "en".to_string(),
        target_languages: vec!["fr".to_string()],
        models: model_entries(),
        ..Config::default()
    })
}

/// Wrap body content in a WordprocessingML document
pub fn document_xml(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}<w:sectPr/></w:body></w:document>"#,
        body
    )
}

/// A paragraph with one plain run per text
pub fn paragraph(runs: &[&str]) -> String {
    let runs: String = runs
        .iter()
        .map(|text| format!(r#"<w:r><w:t xml:space="preserve">{}</w:t></w:r>"#, text))
        .collect();
    format!("<w:p>{}</w:p>", runs)
}

/// A one-cell table holding `content`
pub fn table(content: &str) -> String {
    format!("<w:tbl><w:tr><w:tc>{}</w:tc></w:tr></w:tbl>", content)
}

// @const: Part that must survive translation byte for byte
pub const STYLES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:style w:styleId="Normal"/></w:styles>"#;

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

/// Build a minimal .docx package in memory
pub fn build_docx(document_xml: &str) -> Result<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();

    for (name, content) in [
        ("[Content_Types].xml", CONTENT_TYPES_XML),
        ("_rels/.rels", RELS_XML),
        ("word/document.xml", document_xml),
        ("word/styles.xml", STYLES_XML),
    ] {
        writer.start_file(name, options)?;
        writer.write_all(content.as_bytes())?;
    }

    Ok(writer.finish()?.into_inner())
}

/// Write a .docx with the given main document part
pub fn create_test_docx(dir: &Path, filename: &str, document_xml: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, build_docx(document_xml)?)?;
    Ok(file_path)
}

/// Read one part of a .docx on disk
pub fn read_docx_part(path: &Path, part: &str) -> Result<String> {
    let bytes = fs::read(path)?;
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut entry = archive.by_name(part)?;
    let mut content = String::new();
    entry.read_to_string(&mut content)?;
    Ok(content)
}

/// Entry names of a .docx on disk, in archive order
pub fn docx_entry_names(path: &Path) -> Result<Vec<String>> {
    let bytes = fs::read(path)?;
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut names = Vec::new();
    for i in 0..archive.len() {
        names.push(archive.by_index(i)?.name().to_string());
    }
    Ok(names)
}
