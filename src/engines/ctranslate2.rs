use async_trait::async_trait;
use ct2rs::tokenizers::auto::Tokenizer;
use ct2rs::{TranslationOptions, Translator};
use log::debug;
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::app_config::EngineConfig;
use crate::engines::{EngineLoader, TranslationEngine};
use crate::errors::EngineError;
use crate::language_utils::LanguageCode;

/// Converted opus-mt model running in-process
pub struct CTranslate2Engine {
    model_path: PathBuf,
    translator: Arc<Mutex<Translator<Tokenizer>>>,
    beam_size: usize,
}

impl fmt::Debug for CTranslate2Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CTranslate2Engine")
            .field("model_path", &self.model_path)
            .field("beam_size", &self.beam_size)
            .finish()
    }
}

#[async_trait]
impl TranslationEngine for CTranslate2Engine {
    async fn translate(
        &self,
        text: &str,
        _source: &LanguageCode,
        _target: &LanguageCode,
        max_new_tokens: usize,
    ) -> Result<String, EngineError> {
        // Marian models are single-direction, no language tokens needed
        let translator = Arc::clone(&self.translator);
        let prompts = vec![text.to_string()];
        let beam_size = self.beam_size;

        let results = tokio::task::spawn_blocking(move || {
            let opts = TranslationOptions {
                beam_size,
                max_decoding_length: max_new_tokens,
                ..Default::default()
            };
            let translator = translator
                .lock()
                .map_err(|_| EngineError::RequestFailed("translator lock poisoned".to_string()))?;
            translator
                .translate_batch(&prompts, &opts, None)
                .map_err(|e| EngineError::RequestFailed(e.to_string()))
        })
        .await
        .map_err(|e| EngineError::RequestFailed(e.to_string()))??;

        results
            .into_iter()
            .next()
            .map(|(r, _)| r)
            .ok_or_else(|| EngineError::ParseError("no hypothesis returned".to_string()))
    }

    fn name(&self) -> &str {
        self.model_path.to_str().unwrap_or("ctranslate2")
    }
}

/// Loads model directories produced by `ct2-transformers-converter`
pub struct CTranslate2Loader {
    beam_size: usize,
}

impl CTranslate2Loader {
    pub fn new(config: &EngineConfig) -> Self {
        Self { beam_size: config.beam_size }
    }
}

#[async_trait]
impl EngineLoader for CTranslate2Loader {
    async fn load(&self, location: &str) -> Result<Arc<dyn TranslationEngine>, EngineError> {
        let model_path = PathBuf::from(location);
        let load_failed = |reason: String| EngineError::LoadFailed {
            location: location.to_string(),
            reason,
        };

        if !model_path.is_dir() {
            return Err(load_failed("not a model directory".to_string()));
        }

        let path = model_path.clone();
        let translator = tokio::task::spawn_blocking(move || Translator::new(&path, &Default::default()))
            .await
            .map_err(|e| load_failed(e.to_string()))?
            .map_err(|e| load_failed(e.to_string()))?;

        debug!("CTranslate2 model ready at {}", model_path.display());

        Ok(Arc::new(CTranslate2Engine {
            model_path,
            translator: Arc::new(Mutex::new(translator)),
            beam_size: self.beam_size,
        }))
    }
}
