/*!
 * Heuristic text guard in front of the NMT engines.
 *
 * Opus-mt style models answer some inputs with nonsense: bare numbers,
 * lone symbols, "N." enumerations, "!)." followed by periods. The guard
 * keeps those away from the engine, splits off the parts that are safe to
 * keep verbatim, and throws away engine output that looks corrupted.
 */

use log::{debug, trace};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

use crate::errors::TranslationError;
use crate::language_utils::LanguageCode;
use crate::translation::registry::ModelRegistry;

/// Token budget requested from the engine per fragment
pub const MAX_NEW_TOKENS: usize = 512;

// @const: Maximum output/input length ratio before output is considered garbage
const MAX_LENGTH_RATIO: usize = 3;

// @const: Ten periods or ten hyphens in a row
static CORRUPTION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\.{10}|-{10}").unwrap()
});

// @const: Marker whose trailing periods make models ramble
const BANG_PAREN_PERIOD: &str = "!).";

/// What the guard does with a fragment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Whitespace only, becomes the empty string
    Empty,
    /// Returned as is
    Verbatim,
    /// Enumeration prefix of `prefix_len` bytes kept, rest guarded
    NumberedPrefix { prefix_len: usize },
    /// Head of `head_len` bytes guarded, trailing periods kept
    TrailingPeriods { head_len: usize },
    /// Sent to the engine
    Delegate,
}

/// Pick the rule for a fragment; the first match wins
pub fn classify(text: &str) -> GuardDecision {
    if text.chars().all(char::is_whitespace) {
        return GuardDecision::Empty;
    }

    if text
        .chars()
        .all(|c| c.is_numeric() || c == ' ' || c == '\t' || c == '.')
    {
        return GuardDecision::Verbatim;
    }

    if text == "≈" {
        return GuardDecision::Verbatim;
    }

    let mut chars = text.chars();
    let first = chars.next();
    let second = chars.next();
    if let (Some(first), Some('.')) = (first, second) {
        if first.is_numeric() && text.chars().count() > 2 {
            // Whitespace after "N." stays with the prefix
            let after_period = first.len_utf8() + 1;
            let rest = &text[after_period..];
            let padding = rest.len() - rest.trim_start().len();
            return GuardDecision::NumberedPrefix {
                prefix_len: after_period + padding,
            };
        }
    }

    if text.chars().count() == 1 {
        return GuardDecision::Verbatim;
    }

    if let Some(pos) = text.find(BANG_PAREN_PERIOD) {
        let head_len = pos + BANG_PAREN_PERIOD.len();
        let tail = &text[head_len..];
        // An empty tail would guard the same text again
        if !tail.is_empty() && tail.chars().all(|c| c == '.') {
            return GuardDecision::TrailingPeriods { head_len };
        }
    }

    GuardDecision::Delegate
}

/// True when engine output should be discarded in favour of the original
pub fn looks_corrupted(original: &str, translated: &str) -> bool {
    translated.chars().count() > MAX_LENGTH_RATIO * original.chars().count()
        || CORRUPTION_PATTERN.is_match(translated)
}

/// Robust single-fragment translation
pub struct TextGuard {
    registry: Arc<ModelRegistry>,
    max_new_tokens: usize,
}

impl TextGuard {
    pub fn new(registry: Arc<ModelRegistry>) -> Self {
        Self::with_max_new_tokens(registry, MAX_NEW_TOKENS)
    }

    pub fn with_max_new_tokens(registry: Arc<ModelRegistry>, max_new_tokens: usize) -> Self {
        Self {
            registry,
            max_new_tokens,
        }
    }

    pub fn registry(&self) -> &Arc<ModelRegistry> {
        &self.registry
    }

    /// Translate one fragment
    ///
    /// Content never causes an error; only an unconfigured direction or a
    /// failing engine does. Output that looks corrupted is replaced by the
    /// input.
    pub async fn robust_translate(
        &self,
        text: &str,
        source: &LanguageCode,
        target: &LanguageCode,
    ) -> Result<String, TranslationError> {
        debug!("Translating text: \"{}\"", text);

        let result = match classify(text) {
            GuardDecision::Empty => String::new(),
            GuardDecision::Verbatim => text.to_string(),
            GuardDecision::NumberedPrefix { prefix_len } => {
                trace!("Recursing");
                let (prefix, rest) = text.split_at(prefix_len);
                let translated = Box::pin(self.robust_translate(rest, source, target)).await?;
                format!("{}{}", prefix, translated)
            }
            GuardDecision::TrailingPeriods { head_len } => {
                trace!("Recursing");
                let (head, tail) = text.split_at(head_len);
                let translated = Box::pin(self.robust_translate(head, source, target)).await?;
                format!("{}{}", translated, tail)
            }
            GuardDecision::Delegate => {
                let engine = self.registry.resolve(source, target).await?;
                let translated = engine
                    .translate(text, source, target, self.max_new_tokens)
                    .await?;
                trace!("Clear");
                translated
            }
        };

        if looks_corrupted(text, &result) {
            debug!("Translation looks like garbage, keeping original text: \"{}\"", text);
            return Ok(text.to_string());
        }

        Ok(result)
    }
}
