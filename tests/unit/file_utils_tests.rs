/*!
 * Tests for file utilities
 */

use anyhow::Result;
use std::fs;
use std::path::PathBuf;
use nmtrans::errors::SubtitleError;
use nmtrans::file_utils::{FileManager, FileType};
use crate::common;

#[test]
fn test_findInputFiles_withMixedFolder_shouldReturnSortedTranslatableFiles() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let dir = temp_dir.path();
    for name in ["b.srt", "a.DOCX", "~$a.docx", "notes.txt", "c.Srt"] {
        common::create_test_file(dir, name, "x")?;
    }
    fs::create_dir(dir.join("nested.srt"))?;
    common::create_test_file(&dir.join("nested.srt"), "deep.srt", "x")?;

    let files = FileManager::find_input_files(dir)?;
    let names: Vec<String> = files
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
        .collect();

    assert_eq!(names, vec!["a.DOCX", "b.srt", "c.Srt"]);

    Ok(())
}

#[test]
fn test_findInputFiles_withMissingFolder_shouldFail() {
    assert!(FileManager::find_input_files("/definitely/not/here").is_err());
}

#[test]
fn test_detectFileType_shouldIgnoreCase() {
    assert_eq!(FileManager::detect_file_type("x.SRT"), FileType::Subtitle);
    assert_eq!(FileManager::detect_file_type("x.docx"), FileType::Document);
    assert_eq!(FileManager::detect_file_type("x.doc"), FileType::Unknown);
    assert_eq!(FileManager::detect_file_type("srt"), FileType::Unknown);
}

#[test]
fn test_generateOutputPath_shouldAppendLanguageToStem() {
    let path = FileManager::generate_output_path("/in/My Movie.en.srt", "/out", "fr", "srt");
    assert_eq!(path, PathBuf::from("/out/My Movie.en -fr.srt"));

    let path = FileManager::generate_output_path("/in/report.docx", "/tmp", "de", ".docx");
    assert_eq!(path, PathBuf::from("/tmp/report -de.docx"));
}

#[test]
fn test_decodeText_withUtf8Bom_shouldStripBom() -> Result<()> {
    let bytes = [&[0xEF, 0xBB, 0xBF][..], "1\nHi".as_bytes()].concat();

    assert_eq!(FileManager::decode_text(&bytes, "x")?, "1\nHi");

    Ok(())
}

#[test]
fn test_decodeText_withUtf16BigEndian_shouldDecode() -> Result<()> {
    let mut bytes = vec![0xFE, 0xFF];
    for unit in "Grüße".encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }

    assert_eq!(FileManager::decode_text(&bytes, "x")?, "Grüße");

    Ok(())
}

#[test]
fn test_decodeText_withUtf16WithoutBom_shouldAssumeLittleEndian() -> Result<()> {
    let bytes: Vec<u8> = "1\r\nHi".encode_utf16().flat_map(|u| u.to_le_bytes()).collect();

    assert_eq!(FileManager::decode_text(&bytes, "x")?, "1\r\nHi");

    Ok(())
}

/// Valid UTF-8 with a stray NUL stays UTF-8, whatever the byte count
#[test]
fn test_decodeText_withUtf8AndStrayNul_shouldKeepUtf8() -> Result<()> {
    let odd = b"1\n00:00:01,000 --> 00:00:02,000\nA\0\n";
    assert_eq!(odd.len() % 2, 1);
    assert_eq!(
        FileManager::decode_text(odd, "x")?,
        "1\n00:00:01,000 --> 00:00:02,000\nA\0\n"
    );

    let even = b"1\n00:00:01,000 --> 00:00:02,000\nAB\0\n";
    assert_eq!(even.len() % 2, 0);
    assert_eq!(
        FileManager::decode_text(even, "x")?,
        "1\n00:00:01,000 --> 00:00:02,000\nAB\0\n"
    );

    Ok(())
}

#[test]
fn test_decodeText_withInvalidBytes_shouldFail() {
    // Odd length rules out UTF-16, 0xFF rules out UTF-8
    let result = FileManager::decode_text(&[0x31, 0xFF, 0x32], "broken.srt");

    match result {
        Err(SubtitleError::UnsupportedEncoding(origin)) => assert_eq!(origin, "broken.srt"),
        other => panic!("Expected UnsupportedEncoding, got {:?}", other),
    }
}

#[test]
fn test_moveFile_shouldCreateTargetFolder() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let from = common::create_test_file(temp_dir.path(), "a.docx", "content")?;
    let to = temp_dir.path().join("out").join("b.docx");

    FileManager::move_file(&from, &to)?;

    assert!(!from.exists());
    assert_eq!(fs::read_to_string(&to)?, "content");

    Ok(())
}

#[test]
fn test_dirIsEmpty_shouldSeeHiddenFiles() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    assert!(FileManager::dir_is_empty(temp_dir.path())?);

    common::create_test_file(temp_dir.path(), ".hidden", "")?;
    assert!(!FileManager::dir_is_empty(temp_dir.path())?);

    Ok(())
}

#[test]
fn test_appendToLogFile_shouldAppendTimestampedLines() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let log_path = temp_dir.path().join("logs").join("issues.log");

    FileManager::append_to_log_file(&log_path, "first")?;
    FileManager::append_to_log_file(&log_path, "second")?;

    let content = fs::read_to_string(&log_path)?;
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with('[') && lines[0].ends_with("] first"));
    assert!(lines[1].ends_with("] second"));

    Ok(())
}
