/*!
 * Translation engines behind the model registry.
 *
 * An engine turns one fragment of source text into target text for a fixed
 * direction. Loaders turn a configured model location into a ready engine:
 * - `easynmt`: HTTP client for an EasyNMT-compatible model server
 * - `ctranslate2`: in-process opus-mt models (feature `ctranslate2`)
 * - `mock`: deterministic engine for tests and benchmarks
 */

use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;

use crate::app_config::{EngineBackend, EngineConfig};
use crate::errors::EngineError;
use crate::language_utils::LanguageCode;

/// A loaded model able to translate single fragments
#[async_trait]
pub trait TranslationEngine: Send + Sync + Debug {
    /// Translate `text` from `source` to `target`
    ///
    /// # Arguments
    /// * `max_new_tokens` - Upper bound on generated tokens
    async fn translate(
        &self,
        text: &str,
        source: &LanguageCode,
        target: &LanguageCode,
        max_new_tokens: usize,
    ) -> Result<String, EngineError>;

    /// Short name for log lines
    fn name(&self) -> &str;
}

/// Turns a configured model location into a loaded engine
#[async_trait]
pub trait EngineLoader: Send + Sync {
    async fn load(&self, location: &str) -> Result<Arc<dyn TranslationEngine>, EngineError>;
}

/// Pick the loader matching the configured backend
pub fn engine_loader_for(config: &EngineConfig) -> Result<Box<dyn EngineLoader>, EngineError> {
    match config.backend {
        EngineBackend::EasyNmt => Ok(Box::new(easynmt::EasyNmtLoader::new(config))),
        #[cfg(feature = "ctranslate2")]
        EngineBackend::CTranslate2 => Ok(Box::new(ctranslate2::CTranslate2Loader::new(config))),
        #[cfg(not(feature = "ctranslate2"))]
        EngineBackend::CTranslate2 => Err(EngineError::LoadFailed {
            location: "ctranslate2".to_string(),
            reason: "built without the `ctranslate2` feature".to_string(),
        }),
    }
}

pub mod easynmt;
pub mod mock;
#[cfg(feature = "ctranslate2")]
pub mod ctranslate2;
