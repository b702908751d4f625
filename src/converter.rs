use anyhow::{Result, anyhow};
use log::{debug, error};
use std::path::{Path, PathBuf};
use tokio::process::Command;

use crate::app_config::ConverterConfig;
use crate::file_utils::FileManager;

// @module: Word to PDF conversion through an office suite in headless mode

/// Runs `<command> --headless --convert-to pdf --outdir <dir> <file>`
#[derive(Debug, Clone)]
pub struct PdfConverter {
    command: String,
    timeout_secs: u64,
}

impl PdfConverter {
    pub fn new(command: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            command: command.into(),
            timeout_secs,
        }
    }

    pub fn from_config(config: &ConverterConfig) -> Self {
        Self::new(config.command.clone(), config.timeout_secs)
    }

    /// Path the converter will produce for `input`
    pub fn output_path_for<P1: AsRef<Path>, P2: AsRef<Path>>(input: P1, output_dir: P2) -> PathBuf {
        let stem = input.as_ref().file_stem().unwrap_or_default().to_string_lossy();
        output_dir.as_ref().join(format!("{}.pdf", stem))
    }

    /// Convert `input` into a PDF inside `output_dir`
    pub async fn convert<P1: AsRef<Path>, P2: AsRef<Path>>(&self, input: P1, output_dir: P2) -> Result<PathBuf> {
        let input = input.as_ref();
        let output_dir = output_dir.as_ref();

        if !input.is_file() {
            return Err(anyhow!("Document to convert does not exist: {}", input.display()));
        }
        FileManager::ensure_dir(output_dir)?;

        debug!("Converting {} with {}", input.display(), self.command);
        let convert_future = Command::new(&self.command)
            .arg("--headless")
            .arg("--convert-to")
            .arg("pdf")
            .arg("--outdir")
            .arg(output_dir)
            .arg(input)
            .kill_on_drop(true)
            .output();

        let timeout_duration = std::time::Duration::from_secs(self.timeout_secs);
        let result = tokio::select! {
            result = convert_future => {
                result.map_err(|e| anyhow!("Failed to execute {}: {}", self.command, e))?
            },
            _ = tokio::time::sleep(timeout_duration) => {
                return Err(anyhow!("{} timed out after {} seconds", self.command, self.timeout_secs));
            }
        };

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            let filtered = Self::filter_stderr(&stderr);
            error!("PDF conversion failed: {}", filtered);
            return Err(anyhow!("PDF conversion failed: {}", filtered));
        }

        let output = Self::output_path_for(input, output_dir);
        if !output.is_file() {
            return Err(anyhow!("Converter reported success but {} is missing", output.display()));
        }

        Ok(output)
    }

    /// Keep only lines that say something about the failure
    fn filter_stderr(stderr: &str) -> String {
        let noise_prefixes = ["javaldx", "Warning: failed to launch javaldx", "convert "];

        let meaningful: Vec<&str> = stderr
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .filter(|line| !noise_prefixes.iter().any(|p| line.starts_with(p)))
            .collect();

        if meaningful.is_empty() {
            "unknown converter error (stderr was empty after filtering)".to_string()
        } else {
            meaningful.join("; ")
        }
    }
}
