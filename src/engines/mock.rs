/*!
 * Mock engines for testing.
 *
 * `MockEngine` simulates model behaviour and records every fragment it is
 * asked to translate; `MockLoader` hands out mock engines and counts loads.
 */

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::engines::{EngineLoader, TranslationEngine};
use crate::errors::EngineError;
use crate::language_utils::LanguageCode;

/// A fragment seen by the mock engine
#[derive(Debug, Clone, PartialEq)]
pub struct MockRequest {
    /// The text to translate
    pub text: String,
    /// Source language
    pub source_language: String,
    /// Target language
    pub target_language: String,
    /// Token budget passed by the caller
    pub max_new_tokens: usize,
}

/// Behavior mode for the mock engine
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Prefixes the text with the target language, e.g. "[fr] Hello"
    Working,
    /// Returns the text unchanged
    Echo,
    /// Returns a run of periods far longer than the input
    Garbage,
    /// Fails every Nth request
    Intermittent { fail_every: usize },
    /// Always fails with an error
    Failing,
    /// Simulates a slow model
    Slow { delay_ms: u64 },
}

/// Mock engine for testing translation behavior
#[derive(Debug, Clone)]
pub struct MockEngine {
    behavior: MockBehavior,
    request_count: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<MockRequest>>>,
    custom_response: Option<fn(&MockRequest) -> String>,
}

impl MockEngine {
    /// Create a new mock engine with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
            custom_response: None,
        }
    }

    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    pub fn echo() -> Self {
        Self::new(MockBehavior::Echo)
    }

    pub fn garbage() -> Self {
        Self::new(MockBehavior::Garbage)
    }

    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent { fail_every })
    }

    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Set a custom response generator, used in `Working` mode
    pub fn with_custom_response(mut self, generator: fn(&MockRequest) -> String) -> Self {
        self.custom_response = Some(generator);
        self
    }

    /// Number of translate calls so far, including failed ones
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Snapshot of every fragment received
    pub fn requests(&self) -> Vec<MockRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Just the texts received, in order
    pub fn request_texts(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.text).collect()
    }

    fn default_translation(request: &MockRequest) -> String {
        format!("[{}] {}", request.target_language, request.text)
    }
}

#[async_trait]
impl TranslationEngine for MockEngine {
    async fn translate(
        &self,
        text: &str,
        source: &LanguageCode,
        target: &LanguageCode,
        max_new_tokens: usize,
    ) -> Result<String, EngineError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);
        let request = MockRequest {
            text: text.to_string(),
            source_language: source.to_string(),
            target_language: target.to_string(),
            max_new_tokens,
        };
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        match self.behavior {
            MockBehavior::Working => Ok(match self.custom_response {
                Some(generator) => generator(&request),
                None => Self::default_translation(&request),
            }),

            MockBehavior::Echo => Ok(request.text),

            MockBehavior::Garbage => Ok(".".repeat(text.chars().count() * 4 + 10)),

            MockBehavior::Intermittent { fail_every } => {
                if fail_every > 0 && count % fail_every == fail_every - 1 {
                    Err(EngineError::ApiError {
                        status_code: 503,
                        message: format!("Simulated intermittent failure (request #{})", count + 1),
                    })
                } else {
                    Ok(Self::default_translation(&request))
                }
            }

            MockBehavior::Failing => Err(EngineError::ApiError {
                status_code: 500,
                message: "Simulated engine failure".to_string(),
            }),

            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(tokio::time::Duration::from_millis(delay_ms)).await;
                Ok(Self::default_translation(&request))
            }
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Loader handing out mock engines
///
/// Every location maps to the same engine unless overridden with
/// `with_engine`. Locations listed in `with_failing_location` fail to load.
#[derive(Debug, Clone)]
pub struct MockLoader {
    default_engine: MockEngine,
    engines: HashMap<String, MockEngine>,
    failing: Vec<String>,
    loads: Arc<Mutex<Vec<String>>>,
}

impl MockLoader {
    pub fn new(default_engine: MockEngine) -> Self {
        Self {
            default_engine,
            engines: HashMap::new(),
            failing: Vec::new(),
            loads: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_engine(mut self, location: &str, engine: MockEngine) -> Self {
        self.engines.insert(location.to_string(), engine);
        self
    }

    pub fn with_failing_location(mut self, location: &str) -> Self {
        self.failing.push(location.to_string());
        self
    }

    /// Locations loaded so far, in order
    pub fn loads(&self) -> Vec<String> {
        self.loads.lock().map(|l| l.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl EngineLoader for MockLoader {
    async fn load(&self, location: &str) -> Result<Arc<dyn TranslationEngine>, EngineError> {
        if let Ok(mut loads) = self.loads.lock() {
            loads.push(location.to_string());
        }

        if self.failing.iter().any(|l| l == location) {
            return Err(EngineError::LoadFailed {
                location: location.to_string(),
                reason: "simulated load failure".to_string(),
            });
        }

        let engine = self
            .engines
            .get(location)
            .cloned()
            .unwrap_or_else(|| self.default_engine.clone());
        Ok(Arc::new(engine))
    }
}
