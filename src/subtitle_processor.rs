use std::fmt;
use std::path::{Path, PathBuf};
use anyhow::{Result, Context};
use log::{debug, info, trace, warn};
use indicatif::{ProgressBar, ProgressStyle};

use crate::errors::{SubtitleError, TranslationError};
use crate::file_utils::FileManager;
use crate::language_utils::LanguageCode;
use crate::translation::guard::TextGuard;

// @module: SRT parsing, serialization and per-record translation

// @struct: Single subtitle record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleEntry {
    // @field: Index line, kept verbatim
    pub index: String,

    // @field: Time range line, kept verbatim
    pub time_range: String,

    // @field: Text lines joined by single spaces
    pub text: String,
}

impl SubtitleEntry {
    pub fn new(index: impl Into<String>, time_range: impl Into<String>, text: impl Into<String>) -> Self {
        SubtitleEntry {
            index: index.into(),
            time_range: time_range.into(),
            text: text.into(),
        }
    }

    /// Same index and time range, new text
    pub fn with_text(&self, text: String) -> Self {
        SubtitleEntry {
            index: self.index.clone(),
            time_range: self.time_range.clone(),
            text,
        }
    }
}

impl fmt::Display for SubtitleEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}\n{}\n{}", self.index, self.time_range, self.text)
    }
}

// @enum: How a single trimmed line is read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind {
    Blank,
    Numeric,
    TimeRange,
    Text,
}

impl LineKind {
    fn classify(line: &str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            LineKind::Blank
        } else if trimmed.chars().all(char::is_numeric) {
            LineKind::Numeric
        } else if trimmed.contains("-->") {
            LineKind::TimeRange
        } else {
            LineKind::Text
        }
    }
}

// @struct: Partially read record
#[derive(Debug, Default)]
struct Accumulator {
    index: Option<String>,
    time_range: Option<String>,
    text: Option<String>,
}

impl Accumulator {
    fn is_empty(&self) -> bool {
        self.index.is_none() && self.time_range.is_none() && self.text.is_none()
    }

    fn has_index_and_time_only(&self) -> bool {
        self.index.is_some() && self.time_range.is_some() && self.text.is_none()
    }

    fn has_index_only(&self) -> bool {
        self.index.is_some() && self.time_range.is_none() && self.text.is_none()
    }

    fn is_full(&self) -> bool {
        self.index.is_some() && self.time_range.is_some() && self.text.is_some()
    }

    // @returns: The finished record, leaving the accumulator empty
    fn take_entry(&mut self) -> Option<SubtitleEntry> {
        if !self.is_full() {
            return None;
        }
        let acc = std::mem::take(self);
        Some(SubtitleEntry {
            index: acc.index.unwrap_or_default(),
            time_range: acc.time_range.unwrap_or_default(),
            text: acc.text.unwrap_or_default(),
        })
    }
}

/// Collection of subtitle entries with metadata
#[derive(Debug, Clone)]
pub struct SubtitleCollection {
    /// Source filename
    pub source_file: PathBuf,

    /// List of subtitle entries
    pub entries: Vec<SubtitleEntry>,

    /// Language of the entries' text
    pub source_language: String,
}

impl SubtitleCollection {
    /// Create a new subtitle collection
    pub fn new(source_file: PathBuf, source_language: String) -> Self {
        SubtitleCollection {
            source_file,
            entries: Vec::new(),
            source_language,
        }
    }

    /// Read and parse an SRT file, decoding UTF-8 or UTF-16
    pub fn from_srt_file<P: AsRef<Path>>(path: P, source_language: &LanguageCode) -> Result<Self> {
        let path = path.as_ref();
        let content = FileManager::read_subtitle_file(path)?;
        let entries = Self::parse_srt_string(&content)
            .with_context(|| format!("Failed to parse subtitle file: {}", path.display()))?;

        debug!("Parsed {} subtitle records from {}", entries.len(), path.display());

        Ok(SubtitleCollection {
            source_file: path.to_path_buf(),
            entries,
            source_language: source_language.to_string(),
        })
    }

    /// Parse SRT content into records
    ///
    /// Lines are classified on their trimmed form and stored as read.
    /// Stray blank lines are tolerated and a blank line inside an incomplete
    /// record drops that record with a warning. Anything else out of place
    /// is an error carrying the 1-based line number.
    pub fn parse_srt_string(content: &str) -> std::result::Result<Vec<SubtitleEntry>, SubtitleError> {
        let mut entries = Vec::new();
        let mut acc = Accumulator::default();

        for (i, line) in content.lines().enumerate() {
            let line_number = i + 1;
            trace!("Line {}: {:?}", line_number, line);

            match LineKind::classify(line) {
                LineKind::Blank => {
                    if acc.is_empty() {
                        continue;
                    }
                    match acc.take_entry() {
                        Some(entry) => entries.push(entry),
                        None => {
                            warn!(
                                "Malformed subtitle ended by blank line {}, record discarded",
                                line_number
                            );
                            acc = Accumulator::default();
                        }
                    }
                }
                LineKind::Numeric => {
                    if acc.is_empty() {
                        acc.index = Some(line.to_string());
                    } else if acc.has_index_and_time_only() {
                        info!("Subtitle text on line {} is just a number", line_number);
                        acc.text = Some(line.to_string());
                    } else {
                        return Err(SubtitleError::UnexpectedNumericLine {
                            line: line_number,
                            content: line.to_string(),
                        });
                    }
                }
                LineKind::TimeRange => {
                    if acc.has_index_only() {
                        acc.time_range = Some(line.to_string());
                    } else {
                        return Err(SubtitleError::UnexpectedTimeRange {
                            line: line_number,
                            content: line.to_string(),
                        });
                    }
                }
                LineKind::Text => {
                    if acc.has_index_and_time_only() {
                        acc.text = Some(line.to_string());
                    } else if let (true, Some(text)) = (acc.is_full(), acc.text.as_mut()) {
                        text.push(' ');
                        text.push_str(line);
                    } else {
                        return Err(SubtitleError::UnexpectedText {
                            line: line_number,
                            content: line.to_string(),
                        });
                    }
                }
            }
        }

        if let Some(entry) = acc.take_entry() {
            entries.push(entry);
        } else if !acc.is_empty() {
            return Err(SubtitleError::TruncatedRecord);
        }

        Ok(entries)
    }

    /// Serialize records: one blank line between records, none after the last
    pub fn to_srt_string(&self) -> String {
        self.entries
            .iter()
            .map(|entry| entry.to_string())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Write subtitles to an SRT file, always as UTF-8
    pub fn write_to_srt<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        FileManager::write_to_file(path, &self.to_srt_string())
            .with_context(|| format!("Failed to write subtitle file: {}", path.display()))
    }

    /// Translate every record through the guard, keeping index and time range
    pub async fn translate(
        &self,
        guard: &TextGuard,
        source_language: &LanguageCode,
        target_language: &LanguageCode,
    ) -> std::result::Result<SubtitleCollection, TranslationError> {
        let progress_bar = ProgressBar::new(self.entries.len() as u64);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} subtitles ({percent}%) {msg}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(style.progress_chars("=>-"));
        progress_bar.set_message("Translating subtitles");

        let mut translated = SubtitleCollection::new(self.source_file.clone(), target_language.to_string());
        translated.entries.reserve(self.entries.len());

        for entry in &self.entries {
            let text = match guard.robust_translate(&entry.text, source_language, target_language).await {
                Ok(text) => text,
                Err(e) => {
                    progress_bar.abandon();
                    return Err(e);
                }
            };
            let translated_entry = entry.with_text(text);
            trace!("{}", translated_entry);
            translated.entries.push(translated_entry);
            progress_bar.inc(1);
        }

        progress_bar.finish_and_clear();
        Ok(translated)
    }
}

impl fmt::Display for SubtitleCollection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Subtitle Collection")?;
        writeln!(f, "Source: {:?}", self.source_file)?;
        writeln!(f, "Language: {}", self.source_language)?;
        writeln!(f, "Entries: {}", self.entries.len())?;
        Ok(())
    }
}
