/*!
 * Error types for the nmtrans application.
 *
 * Each layer has its own thiserror enum; the orchestrator folds them into
 * `AppError` and asks `is_fatal()` whether the batch may continue.
 */

use thiserror::Error;

use crate::language_utils::Direction;

/// Errors raised by a translation engine or its loader
#[derive(Error, Debug)]
pub enum EngineError {
    /// The model at a configured location could not be loaded
    #[error("Failed to load model from {location}: {reason}")]
    LoadFailed {
        /// Configured model location
        location: String,
        /// Underlying cause
        reason: String,
    },

    /// Error when sending a request to a model server fails
    #[error("Engine request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an engine response fails
    #[error("Failed to parse engine response: {0}")]
    ParseError(String),

    /// Error returned by a model server itself
    #[error("Engine responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the server
        message: String,
    },

    /// Error establishing a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The engine did not answer in time
    #[error("Engine timed out after {0} seconds")]
    Timeout(u64),
}

/// Errors raised by the model registry
#[derive(Error, Debug)]
pub enum RegistryError {
    /// A second engine was registered for an already loaded direction
    #[error("A model is already loaded for translation direction {0}")]
    DuplicateDirection(Direction),

    /// No configured model serves the requested direction
    #[error("No model configured for translation direction {0}")]
    UnconfiguredDirection(Direction),

    /// Loading a configured model failed
    #[error(transparent)]
    Load(#[from] EngineError),
}

/// Errors that can occur during subtitle parsing and reading
#[derive(Error, Debug)]
pub enum SubtitleError {
    /// A numeric line arrived where no index or text can go
    #[error("Unexpected numeric line {line}: {content:?}")]
    UnexpectedNumericLine { line: usize, content: String },

    /// A time range arrived where it cannot go
    #[error("Unexpected time range at line {line}: {content:?}")]
    UnexpectedTimeRange { line: usize, content: String },

    /// A text line arrived before index and time range
    #[error("Unexpected text at line {line}: {content:?}")]
    UnexpectedText { line: usize, content: String },

    /// Input ended inside a record
    #[error("Input ended inside an incomplete subtitle record")]
    TruncatedRecord,

    /// The file is neither UTF-8 nor UTF-16
    #[error("Unsupported text encoding in {0}")]
    UnsupportedEncoding(String),
}

/// Errors that can occur during translation
#[derive(Error, Debug)]
pub enum TranslationError {
    /// Error from the engine
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// Error resolving the engine for a direction
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),
}

impl TranslationError {
    /// Configuration mistakes that no amount of retrying another file will fix
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Registry(RegistryError::UnconfiguredDirection(_))
                | Self::Registry(RegistryError::DuplicateDirection(_))
        )
    }
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Invalid or inconsistent configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from subtitle processing
    #[error("Subtitle error: {0}")]
    Subtitle(#[from] SubtitleError),

    /// Error from translation
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    /// Error while reading or writing a Word document
    #[error("Document error: {0}")]
    Document(String),

    /// Error from the PDF converter
    #[error("Conversion error: {0}")]
    Conversion(String),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl AppError {
    /// Fatal errors halt the batch in every mode
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Config(_) => true,
            Self::Translation(e) => e.is_configuration(),
            _ => false,
        }
    }
}

impl From<RegistryError> for AppError {
    fn from(error: RegistryError) -> Self {
        Self::Translation(TranslationError::Registry(error))
    }
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        // Keep typed causes reachable through anyhow chains
        match error.downcast::<TranslationError>() {
            Ok(e) => Self::Translation(e),
            Err(error) => match error.downcast::<SubtitleError>() {
                Ok(e) => Self::Subtitle(e),
                Err(error) => Self::Unknown(format!("{:#}", error)),
            },
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
