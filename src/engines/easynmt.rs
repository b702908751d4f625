use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::app_config::EngineConfig;
use crate::engines::{EngineLoader, TranslationEngine};
use crate::errors::EngineError;
use crate::language_utils::LanguageCode;

/// Client for an EasyNMT-compatible model server
///
/// One server hosts one model; the configured location is its base URL.
#[derive(Debug)]
pub struct EasyNmtEngine {
    /// Base URL of the server
    base_url: Url,
    /// HTTP client for making requests
    client: Client,
    /// Model name reported by the server
    model_name: String,
    /// Beam width forwarded with every request
    beam_size: usize,
    /// Request timeout, for error messages
    timeout_secs: u64,
}

/// Translation request body
#[derive(Debug, Serialize)]
pub struct TranslateRequest<'a> {
    /// Fragments to translate
    text: Vec<&'a str>,
    /// Source language code
    source_lang: &'a str,
    /// Target language code
    target_lang: &'a str,
    /// Beam width
    beam_size: usize,
    /// Fragments are already sentence sized
    perform_sentence_splitting: bool,
    /// Generation cap; servers without this field ignore it
    max_new_tokens: usize,
}

/// Translation response body
#[derive(Debug, Deserialize)]
pub struct TranslateResponse {
    /// One translation per input fragment
    pub translated: Vec<String>,
    /// Server side duration in seconds
    #[serde(default)]
    pub translation_time: Option<f64>,
}

impl EasyNmtEngine {
    fn endpoint(&self, path: &str) -> Result<Url, EngineError> {
        self.base_url
            .join(path)
            .map_err(|e| EngineError::RequestFailed(format!("Invalid endpoint {}: {}", path, e)))
    }

    fn map_send_error(&self, e: reqwest::Error) -> EngineError {
        if e.is_timeout() {
            EngineError::Timeout(self.timeout_secs)
        } else if e.is_connect() {
            EngineError::ConnectionError(e.to_string())
        } else {
            EngineError::RequestFailed(e.to_string())
        }
    }
}

#[async_trait]
impl TranslationEngine for EasyNmtEngine {
    async fn translate(
        &self,
        text: &str,
        source: &LanguageCode,
        target: &LanguageCode,
        max_new_tokens: usize,
    ) -> Result<String, EngineError> {
        let request = TranslateRequest {
            text: vec![text],
            source_lang: source.as_str(),
            target_lang: target.as_str(),
            beam_size: self.beam_size,
            perform_sentence_splitting: false,
            max_new_tokens,
        };

        let response = self
            .client
            .post(self.endpoint("translate")?)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            error!("Model server {} returned {}: {}", self.base_url, status, message);
            return Err(EngineError::ApiError {
                status_code: status.as_u16(),
                message,
            });
        }

        let body: TranslateResponse = response
            .json()
            .await
            .map_err(|e| EngineError::ParseError(e.to_string()))?;

        if let Some(seconds) = body.translation_time {
            debug!("{} answered in {:.3}s", self.model_name, seconds);
        }

        body.translated
            .into_iter()
            .next()
            .ok_or_else(|| EngineError::ParseError("response contained no translation".to_string()))
    }

    fn name(&self) -> &str {
        &self.model_name
    }
}

/// Connects to model servers listed in the configuration
pub struct EasyNmtLoader {
    timeout_secs: u64,
    beam_size: usize,
}

impl EasyNmtLoader {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            timeout_secs: config.timeout_secs,
            beam_size: config.beam_size,
        }
    }

    fn parse_location(location: &str) -> Result<Url, EngineError> {
        let load_failed = |reason: String| EngineError::LoadFailed {
            location: location.to_string(),
            reason,
        };

        // Url::join drops the last segment unless the base ends with '/'
        let mut normalized = location.trim().to_string();
        if !normalized.ends_with('/') {
            normalized.push('/');
        }

        let url = Url::parse(&normalized).map_err(|e| load_failed(e.to_string()))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(load_failed(format!("unsupported scheme '{}'", other))),
        }
    }
}

#[async_trait]
impl EngineLoader for EasyNmtLoader {
    async fn load(&self, location: &str) -> Result<Arc<dyn TranslationEngine>, EngineError> {
        let base_url = Self::parse_location(location)?;
        let load_failed = |reason: String| EngineError::LoadFailed {
            location: location.to_string(),
            reason,
        };

        let client = Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| load_failed(e.to_string()))?;

        // The server reports its model; an unreachable server fails the load
        let model_name_url = base_url
            .join("model_name")
            .map_err(|e| load_failed(e.to_string()))?;
        let response = client
            .get(model_name_url)
            .send()
            .await
            .map_err(|e| load_failed(e.to_string()))?;
        if !response.status().is_success() {
            return Err(load_failed(format!("server answered {}", response.status())));
        }
        let model_name = response
            .text()
            .await
            .map_err(|e| load_failed(e.to_string()))?
            .trim()
            .trim_matches('"')
            .to_string();

        Ok(Arc::new(EasyNmtEngine {
            base_url,
            client,
            model_name,
            beam_size: self.beam_size,
            timeout_secs: self.timeout_secs,
        }))
    }
}
