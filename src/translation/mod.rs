/*!
 * Translation layer between input formats and the NMT engines.
 *
 * - `guard`: heuristic text guard, the only way fragments reach an engine
 * - `registry`: loaded engines keyed by translation direction
 * - `document`: paragraph-level translation of Word documents
 *
 * Subtitle records go through `SubtitleCollection::translate`, which uses
 * the same guard.
 */

// Re-export main types for easier usage
pub use self::document::{DocumentReport, DocumentTranslator};
pub use self::guard::{GuardDecision, TextGuard, MAX_NEW_TOKENS};
pub use self::registry::{ModelLocation, ModelRegistry};

// Submodules
pub mod document;
pub mod guard;
pub mod registry;
