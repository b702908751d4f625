/*!
 * Model registry: one loaded engine per translation direction.
 *
 * Model locations come from the configuration. Engines are loaded on first
 * use (or eagerly through `preload`) and kept for the life of the registry.
 */

use log::{debug, info};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::app_config::ModelEntry;
use crate::engines::{EngineLoader, TranslationEngine};
use crate::errors::RegistryError;
use crate::language_utils::{Direction, LanguageCode};

/// A configured model location and the direction it serves
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelLocation {
    pub location: String,
    pub direction: Direction,
}

impl ModelLocation {
    pub fn new(location: impl Into<String>, source: LanguageCode, target: LanguageCode) -> Self {
        Self {
            location: location.into(),
            direction: Direction::new(source, target),
        }
    }

    /// Validate a configuration entry
    pub fn from_entry(entry: &ModelEntry) -> anyhow::Result<Self> {
        Ok(Self::new(
            entry.location.clone(),
            LanguageCode::parse(&entry.source_language)?,
            LanguageCode::parse(&entry.target_language)?,
        ))
    }
}

// @struct: Engine kept for a direction
struct LoadedModel {
    engine: Arc<dyn TranslationEngine>,
    location: String,
}

/// Direction-keyed cache of loaded engines
pub struct ModelRegistry {
    locations: Vec<ModelLocation>,
    loader: Box<dyn EngineLoader>,
    // Held across loads so a direction is loaded at most once
    loaded: Mutex<HashMap<Direction, LoadedModel>>,
}

impl ModelRegistry {
    pub fn new(locations: Vec<ModelLocation>, loader: Box<dyn EngineLoader>) -> Self {
        Self {
            locations,
            loader,
            loaded: Mutex::new(HashMap::new()),
        }
    }

    /// Build from configuration entries
    pub fn from_entries(entries: &[ModelEntry], loader: Box<dyn EngineLoader>) -> anyhow::Result<Self> {
        let locations = entries
            .iter()
            .map(ModelLocation::from_entry)
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(Self::new(locations, loader))
    }

    pub fn locations(&self) -> &[ModelLocation] {
        &self.locations
    }

    /// Load the model at `location` for an explicit direction
    pub async fn register(
        &self,
        location: &str,
        source: &LanguageCode,
        target: &LanguageCode,
    ) -> Result<(), RegistryError> {
        let direction = Direction::new(source.clone(), target.clone());
        let mut loaded = self.loaded.lock().await;

        if loaded.contains_key(&direction) {
            return Err(RegistryError::DuplicateDirection(direction));
        }

        let engine = self.loader.load(location).await?;
        Self::log_loaded(&direction, location);
        loaded.insert(
            direction,
            LoadedModel {
                engine,
                location: location.to_string(),
            },
        );

        Ok(())
    }

    /// Engine for a direction, loading the first configured match if needed
    pub async fn resolve(
        &self,
        source: &LanguageCode,
        target: &LanguageCode,
    ) -> Result<Arc<dyn TranslationEngine>, RegistryError> {
        let direction = Direction::new(source.clone(), target.clone());
        let mut loaded = self.loaded.lock().await;

        if let Some(model) = loaded.get(&direction) {
            return Ok(Arc::clone(&model.engine));
        }

        let location = self
            .locations
            .iter()
            .find(|l| l.direction == direction)
            .map(|l| l.location.clone())
            .ok_or_else(|| RegistryError::UnconfiguredDirection(direction.clone()))?;

        let engine = self.loader.load(&location).await?;
        Self::log_loaded(&direction, &location);
        loaded.insert(
            direction,
            LoadedModel {
                engine: Arc::clone(&engine),
                location,
            },
        );

        Ok(engine)
    }

    /// Eagerly load every configured model from `source` into one of `targets`
    ///
    /// Returns the number of engines newly loaded.
    pub async fn preload(
        &self,
        source: &LanguageCode,
        targets: &[LanguageCode],
    ) -> Result<usize, RegistryError> {
        info!("Loading translation models...");
        let mut count = 0;

        for entry in &self.locations {
            let direction = &entry.direction;
            if &direction.source != source || !targets.contains(&direction.target) {
                continue;
            }
            if self.is_loaded(direction).await {
                debug!("Skipping {}, direction {} already loaded", entry.location, direction);
                continue;
            }
            self.register(&entry.location, &direction.source, &direction.target)
                .await?;
            count += 1;
        }

        Ok(count)
    }

    pub async fn is_loaded(&self, direction: &Direction) -> bool {
        self.loaded.lock().await.contains_key(direction)
    }

    /// Loaded directions and their locations, sorted by direction
    pub async fn loaded_directions(&self) -> Vec<(Direction, String)> {
        let loaded = self.loaded.lock().await;
        let mut result: Vec<_> = loaded
            .iter()
            .map(|(direction, model)| (direction.clone(), model.location.clone()))
            .collect();
        result.sort();
        result
    }

    fn log_loaded(direction: &Direction, location: &str) {
        info!(
            "Loaded model with translation direction: {} from: {}",
            direction.describe(),
            location
        );
    }
}
