/*!
 * Tests for the direction-keyed model registry
 */

use anyhow::Result;
use std::sync::Arc;
use nmtrans::app_config::ModelEntry;
use nmtrans::engines::mock::{MockEngine, MockLoader};
use nmtrans::errors::{EngineError, RegistryError};
use nmtrans::language_utils::Direction;
use nmtrans::translation::ModelRegistry;
use crate::common::{self, lang, EN_DE, EN_FR};

#[tokio::test]
async fn test_resolve_withConfiguredDirection_shouldLoadOnce() -> Result<()> {
    let (registry, loader) = common::mock_registry(MockEngine::working());

    let first = registry.resolve(&lang("en"), &lang("fr")).await?;
    let second = registry.resolve(&lang("en"), &lang("fr")).await?;

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(loader.loads(), vec![EN_FR.to_string()]);

    Ok(())
}

/// An unconfigured direction fails and leaves the registry untouched
#[tokio::test]
async fn test_resolve_withUnconfiguredDirection_shouldFailWithoutMutation() -> Result<()> {
    let (registry, loader) = common::mock_registry(MockEngine::working());
    registry.resolve(&lang("en"), &lang("fr")).await?;

    let result = registry.resolve(&lang("fr"), &lang("en")).await;

    match result {
        Err(RegistryError::UnconfiguredDirection(direction)) => {
            assert_eq!(direction, Direction::new(lang("fr"), lang("en")));
        }
        Err(e) => panic!("Expected UnconfiguredDirection, got {}", e),
        Ok(_) => panic!("Expected UnconfiguredDirection, got an engine"),
    }
    assert_eq!(registry.loaded_directions().await.len(), 1);
    assert_eq!(loader.loads().len(), 1);

    Ok(())
}

/// Directions are ordered pairs
#[tokio::test]
async fn test_resolve_withReversedDirection_shouldNotReuseEngine() {
    let (registry, _) = common::mock_registry(MockEngine::working());

    assert!(registry.resolve(&lang("en"), &lang("de")).await.is_ok());
    assert!(registry.resolve(&lang("de"), &lang("en")).await.is_err());
}

#[tokio::test]
async fn test_register_withSameDirectionTwice_shouldFailWithDuplicate() -> Result<()> {
    let loader = MockLoader::new(MockEngine::working());
    let registry = ModelRegistry::new(Vec::new(), Box::new(loader.clone()));

    registry.register("mock://first", &lang("en"), &lang("fr")).await?;
    let result = registry.register("mock://second", &lang("en"), &lang("fr")).await;

    assert!(matches!(result, Err(RegistryError::DuplicateDirection(_))));
    // The duplicate is rejected before anything is loaded
    assert_eq!(loader.loads(), vec!["mock://first".to_string()]);
    assert_eq!(
        registry.loaded_directions().await,
        vec![(Direction::new(lang("en"), lang("fr")), "mock://first".to_string())]
    );

    Ok(())
}

#[tokio::test]
async fn test_register_afterResolve_shouldFailWithDuplicate() -> Result<()> {
    let (registry, _) = common::mock_registry(MockEngine::working());
    registry.resolve(&lang("en"), &lang("fr")).await?;

    let result = registry.register(EN_FR, &lang("en"), &lang("fr")).await;

    assert!(matches!(result, Err(RegistryError::DuplicateDirection(_))));

    Ok(())
}

#[tokio::test]
async fn test_resolve_withFailingLocation_shouldReturnLoadError() -> Result<()> {
    let loader = MockLoader::new(MockEngine::working()).with_failing_location(EN_FR);
    let registry = ModelRegistry::from_entries(&common::model_entries(), Box::new(loader))?;

    let result = registry.resolve(&lang("en"), &lang("fr")).await;

    assert!(matches!(
        result,
        Err(RegistryError::Load(EngineError::LoadFailed { .. }))
    ));
    assert!(!registry.is_loaded(&Direction::new(lang("en"), lang("fr"))).await);

    Ok(())
}

/// The first configured entry for a direction wins
#[tokio::test]
async fn test_resolve_withTwoEntriesForDirection_shouldUseFirst() -> Result<()> {
    let entries = vec![
        ModelEntry::new("mock://primary", "en", "fr"),
        ModelEntry::new("mock://secondary", "en", "fr"),
    ];
    let loader = MockLoader::new(MockEngine::working());
    let registry = ModelRegistry::from_entries(&entries, Box::new(loader.clone()))?;

    registry.resolve(&lang("en"), &lang("fr")).await?;

    assert_eq!(loader.loads(), vec!["mock://primary".to_string()]);

    Ok(())
}

#[tokio::test]
async fn test_preload_withRequestedTargets_shouldLoadMatchingEntriesOnly() -> Result<()> {
    let mut entries = common::model_entries();
    entries.push(ModelEntry::new("mock://de-en", "de", "en"));
    let loader = MockLoader::new(MockEngine::working());
    let registry = ModelRegistry::from_entries(&entries, Box::new(loader.clone()))?;

    let count = registry.preload(&lang("en"), &[lang("fr"), lang("de")]).await?;

    assert_eq!(count, 2);
    assert_eq!(loader.loads(), vec![EN_FR.to_string(), EN_DE.to_string()]);

    // A second preload has nothing left to do
    assert_eq!(registry.preload(&lang("en"), &[lang("fr"), lang("de")]).await?, 0);

    let directions: Vec<String> = registry
        .loaded_directions()
        .await
        .into_iter()
        .map(|(direction, _)| direction.to_string())
        .collect();
    assert_eq!(directions, vec!["en->de".to_string(), "en->fr".to_string()]);

    Ok(())
}

#[tokio::test]
async fn test_fromEntries_withInvalidLanguage_shouldFail() {
    let entries = vec![ModelEntry::new("mock://x", "en", "klingon")];
    let result = ModelRegistry::from_entries(&entries, Box::new(MockLoader::new(MockEngine::working())));

    assert!(result.is_err());
}

#[tokio::test]
async fn test_resolve_withAliasCode_shouldMatchNormalizedDirection() -> Result<()> {
    let entries = vec![ModelEntry::new("mock://en-he", "en", "iw")];
    let registry = ModelRegistry::from_entries(&entries, Box::new(MockLoader::new(MockEngine::working())))?;

    assert!(registry.resolve(&lang("eng"), &lang("he")).await.is_ok());

    Ok(())
}
