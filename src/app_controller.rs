use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::app_config::Config;
use crate::converter::PdfConverter;
use crate::engines::{engine_loader_for, EngineLoader};
use crate::errors::AppError;
use crate::file_utils::{FileManager, FileType};
use crate::language_utils::LanguageCode;
use crate::subtitle_processor::SubtitleCollection;
use crate::translation::{DocumentTranslator, ModelRegistry, TextGuard};

// @module: Batch controller for subtitle and document translation

// @const: Issues log written next to the results when something failed
const ISSUES_LOG_FILE: &str = "nmtrans.issues.log";

/// Outcome of one batch run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// (file, target language) pairs that produced an output
    pub translated: usize,
    /// Pairs that failed and were skipped
    pub failed: usize,
    /// Output files, in processing order
    pub outputs: Vec<PathBuf>,
}

/// Main application controller
pub struct Controller {
    // @field: App configuration
    config: Config,

    // @field: Guard in front of the model registry
    guard: TextGuard,

    // @field: Word to PDF converter
    converter: PdfConverter,
}

impl Controller {
    // @method: Create a controller whose engines come from the configured backend
    pub fn with_config(config: Config) -> Result<Self> {
        let loader = engine_loader_for(&config.engine)?;
        Self::with_loader(config, loader)
    }

    /// Create a controller loading engines through `loader`
    pub fn with_loader(config: Config, loader: Box<dyn EngineLoader>) -> Result<Self> {
        let registry = ModelRegistry::from_entries(&config.models, loader)?;
        let guard = TextGuard::with_max_new_tokens(Arc::new(registry), config.engine.max_new_tokens);
        let converter = PdfConverter::from_config(&config.converter);

        Ok(Self {
            config,
            guard,
            converter,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &Arc<ModelRegistry> {
        self.guard.registry()
    }

    /// Translate every input file into every target language
    ///
    /// Fatal errors (see `AppError::is_fatal`) stop the batch in any mode.
    /// Other failures stop it only in testing mode.
    pub async fn run(&self) -> Result<BatchSummary> {
        let start_time = std::time::Instant::now();
        let paths = &self.config.paths;

        let source = self.config.source().map_err(|e| AppError::Config(format!("{:#}", e)))?;
        let targets = self.config.targets().map_err(|e| AppError::Config(format!("{:#}", e)))?;

        let files = FileManager::find_input_files(&paths.input)
            .map_err(|e| AppError::Config(format!("{:#}", e)))?;
        if files.is_empty() {
            warn!("No .srt or .docx files found in {}", paths.input.display());
            return Ok(BatchSummary::default());
        }
        info!("Found {} file(s) in {}", files.len(), paths.input.display());

        let has_documents = files
            .iter()
            .any(|f| FileManager::detect_file_type(f) == FileType::Document);
        if has_documents {
            self.check_intermediate_dir()?;
        }
        FileManager::ensure_dir(&paths.output)?;

        if self.config.preload_models {
            self.registry()
                .preload(&source, &targets)
                .await
                .map_err(AppError::from)?;
        }

        let folder_pb = ProgressBar::new((files.len() * targets.len()) as u64);
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        folder_pb.set_style(template_result.progress_chars("█▓▒░"));
        folder_pb.set_message("Processing files");

        let mut summary = BatchSummary::default();

        for file in &files {
            let file_name = file
                .file_name()
                .map(|f| f.to_string_lossy().to_string())
                .unwrap_or_else(|| "unknown".to_string());

            for target in &targets {
                folder_pb.set_message(format!("{} -> {}", file_name, target));

                match self.process_pair(file, &source, target).await {
                    Ok(output) => {
                        info!("Success: {}", output.display());
                        summary.translated += 1;
                        summary.outputs.push(output);
                    }
                    Err(e) => {
                        summary.failed += 1;
                        let message = format!("{} ({}): {}", file_name, target, e);
                        error!("Error processing {}", message);
                        self.record_issue(&message);

                        if e.is_fatal() || self.config.testing_mode {
                            folder_pb.abandon();
                            return Err(e.into());
                        }
                    }
                }

                folder_pb.inc(1);
            }
        }

        folder_pb.finish_with_message("Folder processing complete");

        let summary_message = format!(
            "Batch completed: {} translated, {} failed - Duration: {}",
            summary.translated,
            summary.failed,
            Self::format_duration(start_time.elapsed())
        );
        info!("{}", summary_message);
        if summary.failed > 0 {
            self.record_issue(&summary_message);
            warn!(
                "Issues written to {}",
                paths.output.join(ISSUES_LOG_FILE).display()
            );
        }

        Ok(summary)
    }

    // @checks: Intermediate folder exists and holds nothing from an earlier run
    fn check_intermediate_dir(&self) -> std::result::Result<(), AppError> {
        let dir = &self.config.paths.intermediate;
        FileManager::ensure_dir(dir).map_err(|e| AppError::Config(format!("{:#}", e)))?;

        let empty = FileManager::dir_is_empty(dir).map_err(|e| AppError::Config(format!("{:#}", e)))?;
        if !empty {
            return Err(AppError::Config(format!(
                "Intermediate folder {} is not empty, clear it before running",
                dir.display()
            )));
        }

        Ok(())
    }

    /// Translate one file into one target language
    async fn process_pair(
        &self,
        file: &Path,
        source: &LanguageCode,
        target: &LanguageCode,
    ) -> std::result::Result<PathBuf, AppError> {
        match FileManager::detect_file_type(file) {
            FileType::Subtitle => self.process_subtitle(file, source, target).await,
            FileType::Document => self.process_document(file, source, target).await,
            FileType::Unknown => Err(AppError::File(format!("Unsupported file type: {}", file.display()))),
        }
    }

    async fn process_subtitle(
        &self,
        file: &Path,
        source: &LanguageCode,
        target: &LanguageCode,
    ) -> std::result::Result<PathBuf, AppError> {
        info!("Translating subtitles {} into {}", file.display(), target.name());

        let subtitles = SubtitleCollection::from_srt_file(file, source)?;
        debug!("{}", subtitles);

        let translated = subtitles.translate(&self.guard, source, target).await?;

        let output_path = FileManager::generate_output_path(file, &self.config.paths.output, target.as_str(), "srt");
        translated
            .write_to_srt(&output_path)
            .map_err(|e| AppError::File(format!("{:#}", e)))?;

        Ok(output_path)
    }

    async fn process_document(
        &self,
        file: &Path,
        source: &LanguageCode,
        target: &LanguageCode,
    ) -> std::result::Result<PathBuf, AppError> {
        info!("Translating document {} into {}", file.display(), target.name());
        let paths = &self.config.paths;
        let intermediate = FileManager::generate_output_path(file, &paths.intermediate, target.as_str(), "docx");

        let result = self.translate_and_publish(file, &intermediate, source, target).await;
        if result.is_err() && intermediate.exists() {
            // Leave the intermediate folder empty for the next run
            if let Err(e) = std::fs::remove_file(&intermediate) {
                warn!("Failed to remove {}: {}", intermediate.display(), e);
            }
        }

        result
    }

    async fn translate_and_publish(
        &self,
        file: &Path,
        intermediate: &Path,
        source: &LanguageCode,
        target: &LanguageCode,
    ) -> std::result::Result<PathBuf, AppError> {
        let output_dir = &self.config.paths.output;

        let report = DocumentTranslator::new(&self.guard)
            .translate_file(file, intermediate, source, target)
            .await
            .map_err(Self::document_error)?;
        debug!("{:?}", report);

        if self.config.convert_to_pdf {
            let pdf = self
                .converter
                .convert(intermediate, output_dir)
                .await
                .map_err(|e| AppError::Conversion(format!("{:#}", e)))?;
            std::fs::remove_file(intermediate)?;
            Ok(pdf)
        } else {
            let output_path = FileManager::generate_output_path(file, output_dir, target.as_str(), "docx");
            FileManager::move_file(intermediate, &output_path)
                .map_err(|e| AppError::File(format!("{:#}", e)))?;
            Ok(output_path)
        }
    }

    // @maps: Untyped document failures to AppError::Document
    fn document_error(error: anyhow::Error) -> AppError {
        match AppError::from(error) {
            AppError::Unknown(message) => AppError::Document(message),
            other => other,
        }
    }

    fn record_issue(&self, message: &str) {
        let log_file_path = self.config.paths.output.join(ISSUES_LOG_FILE);
        if let Err(e) = FileManager::append_to_log_file(&log_file_path, message) {
            warn!("Failed to write issues log: {}", e);
        }
    }

    // Format duration in a human-readable format (HH:MM:SS)
    pub fn format_duration(duration: std::time::Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
