use anyhow::{Result, Context, anyhow};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use std::fs::OpenOptions;
use std::io::Write;
use chrono::Local;

use crate::errors::SubtitleError;

// @module: File and directory utilities

// @const: Extensions picked up from the input folder
const SUBTITLE_EXTENSION: &str = "srt";
const DOCUMENT_EXTENSION: &str = "docx";

// @const: Prefix of Word lock files
const LOCK_FILE_PREFIX: char = '~';

/// Kinds of input the batch knows how to translate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    /// SubRip subtitle file
    Subtitle,
    /// Word document
    Document,
    /// Anything else
    Unknown,
}

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: Directory has no entries at all
    pub fn dir_is_empty<P: AsRef<Path>>(path: P) -> Result<bool> {
        let path = path.as_ref();
        let mut entries = fs::read_dir(path)
            .with_context(|| format!("Failed to read directory: {}", path.display()))?;
        Ok(entries.next().is_none())
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path)
                .with_context(|| format!("Failed to create directory: {}", path.display()))?;
        }
        Ok(())
    }

    // @classifies: Input file by extension, case-insensitively
    pub fn detect_file_type<P: AsRef<Path>>(path: P) -> FileType {
        match path.as_ref().extension().map(|e| e.to_string_lossy().to_lowercase()) {
            Some(ext) if ext == SUBTITLE_EXTENSION => FileType::Subtitle,
            Some(ext) if ext == DOCUMENT_EXTENSION => FileType::Document,
            _ => FileType::Unknown,
        }
    }

    /// List translatable files at the top level of `dir`, sorted by name
    ///
    /// Word lock files ("~$report.docx") are skipped.
    pub fn find_input_files<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(anyhow!("Input directory does not exist: {}", dir.display()));
        }

        let mut result = Vec::new();
        for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();

            if !entry.file_type().is_file() {
                continue;
            }
            let is_lock_file = entry
                .file_name()
                .to_string_lossy()
                .starts_with(LOCK_FILE_PREFIX);
            if is_lock_file {
                continue;
            }
            if Self::detect_file_type(path) != FileType::Unknown {
                result.push(path.to_path_buf());
            }
        }

        Ok(result)
    }

    // @generates: "<stem> -<lang>.<ext>" inside output_dir
    pub fn generate_output_path<P1: AsRef<Path>, P2: AsRef<Path>>(
        input_file: P1,
        output_dir: P2,
        target_language: &str,
        extension: &str,
    ) -> PathBuf {
        let stem = input_file.as_ref().file_stem().unwrap_or_default().to_string_lossy();
        let extension = extension.trim_start_matches('.');
        output_dir
            .as_ref()
            .join(format!("{} -{}.{}", stem, target_language, extension))
    }

    /// Decode subtitle bytes: UTF-8 first, then UTF-16
    ///
    /// A UTF-8 byte order mark is dropped. UTF-16 honours its byte order
    /// mark and defaults to little-endian without one.
    pub fn decode_text(bytes: &[u8], origin: &str) -> std::result::Result<String, SubtitleError> {
        let utf8 = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);
        if let Ok(text) = std::str::from_utf8(utf8) {
            if !Self::looks_like_utf16_le(bytes) {
                return Ok(text.to_string());
            }
        }

        let (body, big_endian) = match bytes {
            [0xFF, 0xFE, rest @ ..] => (rest, false),
            [0xFE, 0xFF, rest @ ..] => (rest, true),
            _ => (bytes, false),
        };
        if body.len() % 2 != 0 {
            return Err(SubtitleError::UnsupportedEncoding(origin.to_string()));
        }

        let units: Vec<u16> = body
            .chunks_exact(2)
            .map(|pair| {
                if big_endian {
                    u16::from_be_bytes([pair[0], pair[1]])
                } else {
                    u16::from_le_bytes([pair[0], pair[1]])
                }
            })
            .collect();

        String::from_utf16(&units).map_err(|_| SubtitleError::UnsupportedEncoding(origin.to_string()))
    }

    // @checks: BOM-less UTF-16 LE, i.e. even length with NULs only in high bytes,
    // filling at least half of them. A stray NUL in UTF-8 text does not qualify.
    fn looks_like_utf16_le(bytes: &[u8]) -> bool {
        if bytes.is_empty() || bytes.len() % 2 != 0 {
            return false;
        }
        if bytes.iter().step_by(2).any(|&b| b == 0) {
            return false;
        }
        let high_nuls = bytes.iter().skip(1).step_by(2).filter(|&&b| b == 0).count();
        high_nuls * 2 >= bytes.len() / 2
    }

    /// Read a subtitle file whatever its Unicode encoding
    pub fn read_subtitle_file<P: AsRef<Path>>(path: P) -> Result<String> {
        let path = path.as_ref();
        let bytes = fs::read(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;
        Ok(Self::decode_text(&bytes, &path.display().to_string())?)
    }

    /// Write a string to a file
    pub fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }

        fs::write(&path, content)
            .with_context(|| format!("Failed to write to file: {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Move a file, falling back to copy and delete across filesystems
    pub fn move_file<P1: AsRef<Path>, P2: AsRef<Path>>(from: P1, to: P2) -> Result<()> {
        let from = from.as_ref();
        let to = to.as_ref();

        if !from.exists() {
            return Err(anyhow!("Source file does not exist: {:?}", from));
        }
        if let Some(parent) = to.parent() {
            Self::ensure_dir(parent)?;
        }

        if fs::rename(from, to).is_err() {
            fs::copy(from, to)
                .with_context(|| format!("Failed to copy {:?} to {:?}", from, to))?;
            fs::remove_file(from)
                .with_context(|| format!("Failed to remove {:?}", from))?;
        }

        Ok(())
    }

    /// Append content to a log file with timestamp
    pub fn append_to_log_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();

        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open log file: {:?}", path.as_ref()))?;

        writeln!(file, "[{}] {}", timestamp, content)
            .with_context(|| format!("Failed to write to log file: {:?}", path.as_ref()))?;

        Ok(())
    }
}
