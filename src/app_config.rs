use anyhow::{anyhow, Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::language_utils::{Direction, LanguageCode};

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Input, intermediate and output folders
    #[serde(default)]
    pub paths: PathsConfig,

    /// Source language code (ISO)
    pub source_language: String,

    /// Target language codes, processed one after another
    pub target_languages: Vec<String>,

    /// Model locations and the direction each one serves
    #[serde(default)]
    pub models: Vec<ModelEntry>,

    /// Engine settings
    #[serde(default)]
    pub engine: EngineConfig,

    /// 0 errors only, 1 warnings, 2-3 info, 4 debug, 5 and up trace
    #[serde(default = "default_verbosity")]
    pub verbosity: u8,

    /// Strict mode: the first failing file halts the batch
    #[serde(default)]
    pub testing_mode: bool,

    /// Convert translated Word documents to PDF
    #[serde(default)]
    pub convert_to_pdf: bool,

    /// Load every needed model before the first file
    #[serde(default)]
    pub preload_models: bool,

    /// External PDF converter
    #[serde(default)]
    pub converter: ConverterConfig,
}

/// Folder layout
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PathsConfig {
    // @field: Folder scanned for .srt and .docx files
    #[serde(default = "default_input_dir")]
    pub input: PathBuf,

    // @field: Scratch folder for translated .docx files; must start empty
    #[serde(default = "default_intermediate_dir")]
    pub intermediate: PathBuf,

    // @field: Folder receiving the results
    #[serde(default = "default_output_dir")]
    pub output: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            input: default_input_dir(),
            intermediate: default_intermediate_dir(),
            output: default_output_dir(),
        }
    }
}

/// One configured model
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ModelEntry {
    // @field: Server URL or model directory, depending on the backend
    pub location: String,

    // @field: Language the model reads
    pub source_language: String,

    // @field: Language the model writes
    pub target_language: String,
}

impl ModelEntry {
    pub fn new(location: &str, source_language: &str, target_language: &str) -> Self {
        Self {
            location: location.to_string(),
            source_language: source_language.to_string(),
            target_language: target_language.to_string(),
        }
    }
}

/// Engine backend type
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum EngineBackend {
    // @backend: EasyNMT-compatible HTTP server
    #[default]
    #[serde(rename = "easynmt")]
    EasyNmt,
    // @backend: In-process CTranslate2 model
    #[serde(rename = "ctranslate2")]
    CTranslate2,
}

impl EngineBackend {
    // @returns: Capitalized backend name
    pub fn display_name(&self) -> &str {
        match self {
            Self::EasyNmt => "EasyNMT",
            Self::CTranslate2 => "CTranslate2",
        }
    }

    // @returns: Lowercase backend identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::EasyNmt => "easynmt".to_string(),
            Self::CTranslate2 => "ctranslate2".to_string(),
        }
    }
}

impl std::fmt::Display for EngineBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

impl std::str::FromStr for EngineBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "easynmt" => Ok(Self::EasyNmt),
            "ctranslate2" | "ct2" => Ok(Self::CTranslate2),
            _ => Err(anyhow!("Invalid engine backend: {}", s)),
        }
    }
}

/// Engine settings shared by all models
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EngineConfig {
    /// Which loader turns model locations into engines
    #[serde(default)]
    pub backend: EngineBackend,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Token budget per fragment
    #[serde(default = "default_max_new_tokens")]
    pub max_new_tokens: usize,

    /// Beam width
    #[serde(default = "default_beam_size")]
    pub beam_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            backend: EngineBackend::default(),
            timeout_secs: default_timeout_secs(),
            max_new_tokens: default_max_new_tokens(),
            beam_size: default_beam_size(),
        }
    }
}

/// External PDF converter settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ConverterConfig {
    /// Office binary accepting `--headless --convert-to pdf`
    #[serde(default = "default_converter_command")]
    pub command: String,

    /// Timeout per document in seconds
    #[serde(default = "default_converter_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            command: default_converter_command(),
            timeout_secs: default_converter_timeout_secs(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn from_verbosity(verbosity: u8) -> Self {
        match verbosity {
            0 => LogLevel::Error,
            1 => LogLevel::Warn,
            2 | 3 => LogLevel::Info,
            4 => LogLevel::Debug,
            _ => LogLevel::Trace,
        }
    }
}

fn default_input_dir() -> PathBuf {
    PathBuf::from("InputFolder")
}

fn default_intermediate_dir() -> PathBuf {
    PathBuf::from("IntermediateFolder")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("OutputFolder")
}

fn default_verbosity() -> u8 {
    3
}

fn default_timeout_secs() -> u64 {
    300
}

fn default_max_new_tokens() -> usize {
    512
}

fn default_beam_size() -> usize {
    5
}

fn default_converter_command() -> String {
    "soffice".to_string()
}

fn default_converter_timeout_secs() -> u64 {
    120
}

fn default_easynmt_location() -> String {
    "http://localhost:24080".to_string()
}

impl Config {
    /// Load `path`, or write and return the defaults when it does not exist
    ///
    /// The boolean is true when a default file was created.
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<(Self, bool)> {
        let path = path.as_ref();
        if path.exists() {
            let file = File::open(path)
                .with_context(|| format!("Failed to open config file: {}", path.display()))?;
            let config: Config = serde_json::from_reader(BufReader::new(file))
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            return Ok((config, false));
        }

        warn!("Config file not found at '{}', creating default config.", path.display());
        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;
        std::fs::write(path, config_json)
            .with_context(|| format!("Failed to write default config to file: {}", path.display()))?;

        Ok((config, true))
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        let source = self.source()?;
        let targets = self.targets()?;

        if targets.is_empty() {
            return Err(anyhow!("At least one target language is required"));
        }
        if let Some(target) = targets.iter().find(|t| **t == source) {
            return Err(anyhow!("Target language {} is the same as the source language", target));
        }

        let mut directions = HashSet::new();
        for entry in &self.models {
            if entry.location.trim().is_empty() {
                return Err(anyhow!("Model entry has an empty location"));
            }
            let direction = Direction::new(
                LanguageCode::parse(&entry.source_language)
                    .with_context(|| format!("Model {}", entry.location))?,
                LanguageCode::parse(&entry.target_language)
                    .with_context(|| format!("Model {}", entry.location))?,
            );
            if !directions.insert(direction.clone()) {
                return Err(anyhow!("More than one model configured for direction {}", direction));
            }
        }

        if self.engine.max_new_tokens == 0 {
            return Err(anyhow!("engine.max_new_tokens must be greater than zero"));
        }
        if self.engine.timeout_secs == 0 {
            return Err(anyhow!("engine.timeout_secs must be greater than zero"));
        }

        Ok(())
    }

    /// Parsed source language
    pub fn source(&self) -> Result<LanguageCode> {
        LanguageCode::parse(&self.source_language)
            .with_context(|| format!("Invalid source language: {}", self.source_language))
    }

    /// Parsed target languages, in configured order
    pub fn targets(&self) -> Result<Vec<LanguageCode>> {
        self.target_languages
            .iter()
            .map(|t| LanguageCode::parse(t).with_context(|| format!("Invalid target language: {}", t)))
            .collect()
    }

    pub fn log_level(&self) -> LogLevel {
        LogLevel::from_verbosity(self.verbosity)
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            paths: PathsConfig::default(),
            source_language: "en".to_string(),
            target_languages: vec!["fr".to_string()],
            models: vec![ModelEntry::new(&default_easynmt_location(), "en", "fr")],
            engine: EngineConfig::default(),
            verbosity: default_verbosity(),
            testing_mode: false,
            convert_to_pdf: false,
            preload_models: false,
            converter: ConverterConfig::default(),
        }
    }
}
