/*!
 * Minimal Word (.docx) document model.
 *
 * Only what paragraph translation needs is modelled:
 * - `package`: the zip container; every part except the main document is
 *   copied through untouched
 * - `tree`: paragraphs and runs of `word/document.xml`, with run text that
 *   can be rewritten in place while the rest of the XML is kept as read
 */

pub mod package;
pub mod tree;

pub use package::DocxPackage;
pub use tree::{Paragraph, Run, WordDocument};
