/*!
 * End-to-end tests for subtitle translation
 */

use anyhow::Result;
use std::fs;
use nmtrans::app_controller::Controller;
use nmtrans::engines::mock::{MockEngine, MockLoader};
use nmtrans::subtitle_processor::SubtitleCollection;
use crate::common::{self, lang};

/// Read, translate and write back one SRT file
#[tokio::test]
async fn test_subtitleWorkflow_withMockGuard_shouldKeepTimingAndTranslateText() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(temp_dir.path(), "episode.srt")?;
    let guard = common::mock_guard(MockEngine::working());

    let subtitles = SubtitleCollection::from_srt_file(&input, &lang("en"))?;
    let translated = subtitles.translate(&guard, &lang("en"), &lang("fr")).await?;

    assert_eq!(translated.entries.len(), subtitles.entries.len());
    for (original, result) in subtitles.entries.iter().zip(&translated.entries) {
        assert_eq!(result.index, original.index);
        assert_eq!(result.time_range, original.time_range);
        assert_eq!(result.text, format!("[fr] {}", original.text));
    }
    assert_eq!(translated.source_language, "fr");

    Ok(())
}

#[tokio::test]
async fn test_subtitleWorkflow_withEnumeratedAndNumericLines_shouldGuardThem() -> Result<()> {
    let content = "1\n00:00:01,000 --> 00:00:02,000\n2. Take the train\n\n2\n00:00:03,000 --> 00:00:04,000\n1984\n\n3\n00:00:05,000 --> 00:00:06,000\n≈\n";
    let engine = MockEngine::working();
    let guard = common::mock_guard(engine.clone());

    let mut subtitles = SubtitleCollection::new("inline.srt".into(), "en".to_string());
    subtitles.entries = SubtitleCollection::parse_srt_string(content)?;
    let translated = subtitles.translate(&guard, &lang("en"), &lang("fr")).await?;

    let texts: Vec<&str> = translated.entries.iter().map(|e| e.text.as_str()).collect();
    assert_eq!(texts, vec!["2. [fr] Take the train", "1984", "≈"]);
    assert_eq!(engine.request_texts(), vec!["Take the train".to_string()]);

    Ok(())
}

/// The controller writes "<stem> -<lang>.srt" for every target language
#[tokio::test]
async fn test_controller_withSubtitleAndTwoTargets_shouldWriteOnePerLanguage() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let mut config = common::test_config(temp_dir.path())?;
    config.target_languages = vec!["fr".to_string(), "de".to_string()];
    common::create_test_subtitle(&config.paths.input, "movie.srt")?;

    let output_dir = config.paths.output.clone();
    let controller = Controller::with_loader(config, Box::new(MockLoader::new(MockEngine::working())))?;
    let summary = controller.run().await?;

    assert_eq!(summary.translated, 2);
    assert_eq!(summary.failed, 0);
    assert_eq!(
        summary.outputs,
        vec![output_dir.join("movie -fr.srt"), output_dir.join("movie -de.srt")]
    );

    let french = fs::read_to_string(output_dir.join("movie -fr.srt"))?;
    assert!(french.starts_with("1\n00:00:01,000 --> 00:00:04,000\n[fr] This is a test subtitle.\n\n2\n"));
    assert!(french.ends_with("[fr] For testing purposes."));

    let german = fs::read_to_string(output_dir.join("movie -de.srt"))?;
    assert!(german.contains("[de] It contains multiple lines."));

    Ok(())
}

#[tokio::test]
async fn test_controller_withUtf16Subtitle_shouldWriteUtf8() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let config = common::test_config(temp_dir.path())?;
    let mut bytes = vec![0xFF, 0xFE];
    for unit in "1\r\n00:00:01,000 --> 00:00:02,000\r\nGood evening\r\n".encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }
    fs::write(config.paths.input.join("wide.srt"), bytes)?;

    let output_dir = config.paths.output.clone();
    let controller = Controller::with_loader(config, Box::new(MockLoader::new(MockEngine::working())))?;
    controller.run().await?;

    let written = fs::read_to_string(output_dir.join("wide -fr.srt"))?;
    assert_eq!(written, "1\n00:00:01,000 --> 00:00:02,000\n[fr] Good evening");

    Ok(())
}
