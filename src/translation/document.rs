/*!
 * Paragraph-level translation of Word documents.
 *
 * Runs split sentences wherever formatting changes, so each paragraph is
 * translated as one fragment and written back into a single run. The first
 * run holding an alphabetic character donates its formatting (skipping
 * bullet glyphs in symbol fonts); every other run is cleared. All formatting
 * inside the paragraph collapses to that run's style.
 */

use anyhow::{Context, Result};
use log::{debug, info, trace};
use std::path::Path;

use crate::errors::TranslationError;
use crate::language_utils::LanguageCode;
use crate::translation::guard::TextGuard;
use crate::word::{DocxPackage, Paragraph, WordDocument};

/// Counters from one document pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentReport {
    /// Paragraphs seen, table paragraphs included
    pub paragraphs: usize,
    /// Paragraphs sent through the guard
    pub translated: usize,
    /// Paragraphs kept as is because their carrier run is super/subscript
    pub kept_script: usize,
    /// Paragraphs inside table cells
    pub table_paragraphs: usize,
}

/// What happened to one paragraph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParagraphOutcome {
    /// No run text, or nothing alphabetic
    Untouched,
    Translated,
    KeptScript,
}

pub struct DocumentTranslator<'a> {
    guard: &'a TextGuard,
}

impl<'a> DocumentTranslator<'a> {
    pub fn new(guard: &'a TextGuard) -> Self {
        Self { guard }
    }

    /// Translate `input` into `output`
    pub async fn translate_file<P1: AsRef<Path>, P2: AsRef<Path>>(
        &self,
        input: P1,
        output: P2,
        source: &LanguageCode,
        target: &LanguageCode,
    ) -> Result<DocumentReport> {
        let input = input.as_ref();
        let output = output.as_ref();

        let package = DocxPackage::open(input)?;
        let xml = package.document_xml()?;
        let mut document = WordDocument::parse(&xml)
            .with_context(|| format!("Failed to parse document: {}", input.display()))?;
        debug!(
            "{}: {} paragraphs, {} tables",
            input.display(),
            document.paragraphs().len(),
            document.table_count()
        );

        let report = self.translate_document(&mut document, source, target).await?;

        package.save_with_document_xml(output, &document.to_xml()?)?;
        info!(
            "Translated {} of {} paragraphs into {}",
            report.translated,
            report.paragraphs,
            output.display()
        );

        Ok(report)
    }

    /// Translate every paragraph of an already parsed document
    pub async fn translate_document(
        &self,
        document: &mut WordDocument,
        source: &LanguageCode,
        target: &LanguageCode,
    ) -> std::result::Result<DocumentReport, TranslationError> {
        let mut report = DocumentReport::default();

        for paragraph in document.paragraphs_mut() {
            report.paragraphs += 1;
            if paragraph.in_table() {
                report.table_paragraphs += 1;
            }

            match self.translate_paragraph(paragraph, source, target).await? {
                ParagraphOutcome::Translated => report.translated += 1,
                ParagraphOutcome::KeptScript => report.kept_script += 1,
                ParagraphOutcome::Untouched => {}
            }
        }

        Ok(report)
    }

    /// Join, translate and write back one paragraph
    pub async fn translate_paragraph(
        &self,
        paragraph: &mut Paragraph,
        source: &LanguageCode,
        target: &LanguageCode,
    ) -> std::result::Result<ParagraphOutcome, TranslationError> {
        if paragraph.runs.iter().all(|run| run.text().is_empty()) {
            return Ok(ParagraphOutcome::Untouched);
        }

        let joined = paragraph.text();
        let Some(carrier) = paragraph
            .runs
            .iter()
            .position(|run| run.text().chars().any(char::is_alphabetic))
        else {
            return Ok(ParagraphOutcome::Untouched);
        };

        let keep_original = {
            let run = &paragraph.runs[carrier];
            run.is_superscript() || run.is_subscript()
        };

        let text = if keep_original {
            trace!("Keeping super/subscript paragraph: \"{}\"", joined);
            joined
        } else {
            self.guard.robust_translate(&joined, source, target).await?
        };

        for run in paragraph.runs.iter_mut() {
            run.set_text(String::new());
        }
        paragraph.runs[carrier].set_text(text);

        Ok(if keep_original {
            ParagraphOutcome::KeptScript
        } else {
            ParagraphOutcome::Translated
        })
    }
}
