/*!
 * Tests for paragraph-level Word document translation
 */

use anyhow::Result;
use nmtrans::engines::mock::MockEngine;
use nmtrans::translation::document::ParagraphOutcome;
use nmtrans::translation::{DocumentReport, DocumentTranslator};
use nmtrans::word::WordDocument;
use crate::common::{self, lang};

fn parse(body: &str) -> WordDocument {
    WordDocument::parse(&common::document_xml(body)).unwrap()
}

/// Runs are joined, translated as one fragment and written into the first alphabetic run
#[tokio::test]
async fn test_translateParagraph_withSeveralRuns_shouldCollapseIntoCarrier() -> Result<()> {
    let engine = MockEngine::working();
    let guard = common::mock_guard(engine.clone());
    let mut document = parse(&common::paragraph(&["• ", "Hello ", "big world"]));

    let paragraph = &mut document.paragraphs_mut()[0];
    let outcome = DocumentTranslator::new(&guard)
        .translate_paragraph(paragraph, &lang("en"), &lang("fr"))
        .await?;

    assert_eq!(outcome, ParagraphOutcome::Translated);
    assert_eq!(engine.request_texts(), vec!["• Hello big world".to_string()]);
    let texts: Vec<&str> = paragraph.runs.iter().map(|r| r.text()).collect();
    assert_eq!(texts, vec!["", "[fr] • Hello big world", ""]);

    Ok(())
}

#[tokio::test]
async fn test_translateParagraph_withoutLetters_shouldStayUntouched() -> Result<()> {
    let engine = MockEngine::working();
    let guard = common::mock_guard(engine.clone());
    let mut document = parse(&common::paragraph(&["12", " – ", "34"]));

    let paragraph = &mut document.paragraphs_mut()[0];
    let outcome = DocumentTranslator::new(&guard)
        .translate_paragraph(paragraph, &lang("en"), &lang("fr"))
        .await?;

    assert_eq!(outcome, ParagraphOutcome::Untouched);
    assert_eq!(paragraph.text(), "12 – 34");
    assert_eq!(engine.request_count(), 0);

    Ok(())
}

#[tokio::test]
async fn test_translateParagraph_withEmptyRuns_shouldStayUntouched() -> Result<()> {
    let guard = common::mock_guard(MockEngine::working());
    let mut document = parse("<w:p><w:pPr/></w:p><w:p><w:r><w:t></w:t></w:r></w:p>");

    let translator = DocumentTranslator::new(&guard);
    for paragraph in document.paragraphs_mut() {
        let outcome = translator
            .translate_paragraph(paragraph, &lang("en"), &lang("fr"))
            .await?;
        assert_eq!(outcome, ParagraphOutcome::Untouched);
    }

    Ok(())
}

/// A superscript carrier keeps the joined original text
#[tokio::test]
async fn test_translateParagraph_withSuperscriptCarrier_shouldKeepOriginal() -> Result<()> {
    let engine = MockEngine::working();
    let guard = common::mock_guard(engine.clone());
    let body = r#"<w:p><w:r><w:rPr><w:vertAlign w:val="superscript"/></w:rPr><w:t>th</w:t></w:r><w:r><w:t xml:space="preserve"> edition</w:t></w:r></w:p>"#;
    let mut document = parse(body);

    let paragraph = &mut document.paragraphs_mut()[0];
    let outcome = DocumentTranslator::new(&guard)
        .translate_paragraph(paragraph, &lang("en"), &lang("fr"))
        .await?;

    assert_eq!(outcome, ParagraphOutcome::KeptScript);
    assert_eq!(engine.request_count(), 0);
    assert_eq!(paragraph.runs[0].text(), "th edition");
    assert_eq!(paragraph.runs[1].text(), "");

    Ok(())
}

#[tokio::test]
async fn test_translateDocument_withTables_shouldCountEveryParagraph() -> Result<()> {
    let guard = common::mock_guard(MockEngine::working());
    let body = format!(
        "{}{}{}",
        common::paragraph(&["Introduction text"]),
        common::table(&format!(
            "{}{}",
            common::paragraph(&["Cell content"]),
            common::table(&common::paragraph(&["Inner cell"]))
        )),
        common::paragraph(&["2024"])
    );
    let mut document = parse(&body);

    let report = DocumentTranslator::new(&guard)
        .translate_document(&mut document, &lang("en"), &lang("fr"))
        .await?;

    assert_eq!(
        report,
        DocumentReport {
            paragraphs: 4,
            translated: 3,
            kept_script: 0,
            table_paragraphs: 2,
        }
    );
    let texts: Vec<String> = document.paragraphs().iter().map(|p| p.text()).collect();
    assert_eq!(
        texts,
        vec!["[fr] Introduction text", "[fr] Cell content", "[fr] Inner cell", "2024"]
    );

    Ok(())
}

#[tokio::test]
async fn test_translateDocument_withFailingEngine_shouldPropagate() {
    let guard = common::mock_guard(MockEngine::failing());
    let mut document = parse(&common::paragraph(&["Hello world"]));

    let result = DocumentTranslator::new(&guard)
        .translate_document(&mut document, &lang("en"), &lang("fr"))
        .await;

    assert!(result.is_err());
}

/// Tabs and line breaks reach the engine as whitespace, not glued words
#[tokio::test]
async fn test_translateDocument_withTabsAndBreaks_shouldKeepWordsApart() -> Result<()> {
    let engine = MockEngine::working();
    let guard = common::mock_guard(engine.clone());
    let body = "<w:p><w:r><w:t>Hello</w:t><w:br/><w:t>world</w:t></w:r></w:p><w:p><w:r><w:t>Name:</w:t><w:tab/><w:t>Value</w:t></w:r></w:p>";
    let mut document = parse(body);

    DocumentTranslator::new(&guard)
        .translate_document(&mut document, &lang("en"), &lang("fr"))
        .await?;

    assert_eq!(
        engine.request_texts(),
        vec!["Hello\nworld".to_string(), "Name:\tValue".to_string()]
    );

    let xml = document.to_xml()?;
    assert_eq!(xml.matches("<w:br/>").count(), 1);
    assert_eq!(xml.matches("<w:tab/>").count(), 1);
    let reparsed = WordDocument::parse(&xml)?;
    let texts: Vec<String> = reparsed.paragraphs().iter().map(|p| p.text()).collect();
    assert_eq!(texts, vec!["[fr] Hello\nworld", "[fr] Name:\tValue"]);

    Ok(())
}
