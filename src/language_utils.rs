/*!
 * Language utilities for ISO language code handling.
 *
 * Codes are validated against ISO 639-1 and ISO 639-2 through `isolang`,
 * plus the handful of legacy and regional codes that Marian/opus-mt model
 * names still use. Every code is normalized to its shortest form so that
 * "fre", "fra" and "fr" all key the same translation direction.
 */

use anyhow::{Result, anyhow};
use isolang::Language;
use std::fmt;
use std::str::FromStr;

/// Language code type
pub enum LanguageCodeType {
    /// ISO 639-1 (2-letter) code
    Part1,
    /// ISO 639-2/T (3-letter) code
    Part2T,
    /// ISO 639-2/B (3-letter) code
    Part2B,
    /// Legacy or regional code kept for model compatibility
    Legacy,
}

// @const: ISO 639-2/B codes that differ from their 639-2/T form
const BIBLIOGRAPHIC_CODES: &[(&str, &str)] = &[
    ("fre", "fra"),
    ("ger", "deu"),
    ("dut", "nld"),
    ("gre", "ell"),
    ("chi", "zho"),
    ("cze", "ces"),
    ("ice", "isl"),
    ("alb", "sqi"),
    ("arm", "hye"),
    ("baq", "eus"),
    ("bur", "mya"),
    ("per", "fas"),
    ("geo", "kat"),
    ("may", "msa"),
    ("mac", "mkd"),
    ("rum", "ron"),
    ("slo", "slk"),
    ("wel", "cym"),
];

// @const: Withdrawn 639-1 codes still found in model names
const LEGACY_ALIASES: &[(&str, &str)] = &[("iw", "he"), ("jw", "jv"), ("in", "id"), ("ji", "yi")];

// @const: Regional variants that get their own models
const REGIONAL_CODES: &[(&str, &str)] = &[
    ("zh-cn", "Chinese (Simplified)"),
    ("zh-tw", "Chinese (Traditional)"),
];

fn bibliographic_to_terminology(code: &str) -> Option<&'static str> {
    BIBLIOGRAPHIC_CODES
        .iter()
        .find(|(b, _)| *b == code)
        .map(|(_, t)| *t)
}

fn regional_name(code: &str) -> Option<&'static str> {
    REGIONAL_CODES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
}

fn resolve_alias(code: &str) -> &str {
    LEGACY_ALIASES
        .iter()
        .find(|(alias, _)| *alias == code)
        .map(|(_, current)| *current)
        .unwrap_or(code)
}

/// Validate if a language code belongs to the supported vocabulary
pub fn validate_language_code(code: &str) -> Result<LanguageCodeType> {
    let normalized_code = code.trim().to_lowercase();

    if regional_name(&normalized_code).is_some()
        || LEGACY_ALIASES.iter().any(|(alias, _)| *alias == normalized_code)
    {
        return Ok(LanguageCodeType::Legacy);
    }

    match normalized_code.len() {
        2 if Language::from_639_1(&normalized_code).is_some() => Ok(LanguageCodeType::Part1),
        3 if Language::from_639_3(&normalized_code).is_some() => Ok(LanguageCodeType::Part2T),
        3 if bibliographic_to_terminology(&normalized_code).is_some() => Ok(LanguageCodeType::Part2B),
        _ => Err(anyhow!("Invalid language code: {}", code)),
    }
}

/// Normalize a language code to ISO 639-2/T (3-letter) format
pub fn normalize_to_part2t(code: &str) -> Result<String> {
    let normalized_code = code.trim().to_lowercase();
    let normalized_code = resolve_alias(&normalized_code);

    if normalized_code.len() == 2 {
        if let Some(lang) = Language::from_639_1(normalized_code) {
            return Ok(lang.to_639_3().to_string());
        }
    } else if normalized_code.len() == 3 {
        if Language::from_639_3(normalized_code).is_some() {
            return Ok(normalized_code.to_string());
        }
        if let Some(part2t) = bibliographic_to_terminology(normalized_code) {
            return Ok(part2t.to_string());
        }
    }

    Err(anyhow!("Cannot normalize invalid language code: {}", code))
}

/// Normalize a language code to ISO 639-1 (2-letter) format if possible
/// Falls back to ISO 639-2/T if no ISO 639-1 code exists
pub fn normalize_to_part1_or_part2t(code: &str) -> Result<String> {
    let part2t = normalize_to_part2t(code)?;
    let lang = Language::from_639_3(&part2t)
        .ok_or_else(|| anyhow!("Cannot normalize invalid language code: {}", code))?;

    Ok(lang.to_639_1().map(str::to_string).unwrap_or(part2t))
}

/// Check if two language codes match (represent the same language)
pub fn language_codes_match(code1: &str, code2: &str) -> bool {
    match (LanguageCode::parse(code1), LanguageCode::parse(code2)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Get the English language name from a code
pub fn get_language_name(code: &str) -> Result<String> {
    let normalized = code.trim().to_lowercase();
    if let Some(name) = regional_name(&normalized) {
        return Ok(name.to_string());
    }

    let part2t = normalize_to_part2t(&normalized)?;
    let lang = Language::from_639_3(&part2t)
        .ok_or_else(|| anyhow!("Failed to get language from code: {}", part2t))?;

    Ok(lang.to_name().to_string())
}

/// A validated, normalized language code
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LanguageCode(String);

impl LanguageCode {
    /// Parse and normalize a code from the supported vocabulary
    pub fn parse(code: &str) -> Result<Self> {
        let lowered = code.trim().to_lowercase();
        if regional_name(&lowered).is_some() {
            return Ok(Self(lowered));
        }
        Ok(Self(normalize_to_part1_or_part2t(&lowered)?))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// English name, falling back to the code itself
    pub fn name(&self) -> String {
        get_language_name(&self.0).unwrap_or_else(|_| self.0.clone())
    }
}

impl FromStr for LanguageCode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ordered (source, target) language pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Direction {
    pub source: LanguageCode,
    pub target: LanguageCode,
}

impl Direction {
    pub fn new(source: LanguageCode, target: LanguageCode) -> Self {
        Self { source, target }
    }

    /// Human readable form, e.g. "English->French"
    pub fn describe(&self) -> String {
        format!("{}->{}", self.source.name(), self.target.name())
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.source, self.target)
    }
}
