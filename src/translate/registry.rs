use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::{ModelFamily, TranslateConfig};
use super::{HfMultilingualEngine, HfPairEngine, InferenceClient, MultilingualTranslator, PairTranslator};

/// How a supported target language is translated
#[derive(Clone)]
pub enum EngineHandle {
    /// The language is the transcript's own language
    Source,
    Pair(Arc<dyn PairTranslator>),
    Multilingual {
        engine: Arc<dyn MultilingualTranslator>,
        target_tag: String,
    },
    /// Supported, but the engine could not be set up
    Unavailable(String),
}

impl EngineHandle {
    pub fn is_available(&self) -> bool {
        !matches!(self, Self::Unavailable(_))
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Source => "source language".to_string(),
            Self::Pair(engine) => engine.model().to_string(),
            Self::Multilingual { engine, target_tag } => format!("{} ({})", engine.model(), target_tag),
            Self::Unavailable(reason) => format!("unavailable: {}", reason),
        }
    }
}

/// Language code -> translation engine, immutable once built
pub struct ModelRegistry {
    source_language: String,
    source_tag: String,
    engines: HashMap<String, EngineHandle>,
}

impl ModelRegistry {
    pub fn new(
        source_language: impl Into<String>,
        source_tag: impl Into<String>,
        engines: HashMap<String, EngineHandle>,
    ) -> Self {
        Self {
            source_language: source_language.into(),
            source_tag: source_tag.into(),
            engines,
        }
    }

    /// Build every configured engine. Languages whose engine cannot be set up
    /// stay supported but are marked unavailable.
    pub fn from_config(config: &TranslateConfig) -> Self {
        let source_language = config.source_language.to_lowercase();
        let mut engines = HashMap::new();

        let client = match InferenceClient::new(config) {
            Ok(client) => Some(client),
            Err(e) => {
                warn!("Failed to create inference client, translation disabled: {}", e);
                None
            }
        };

        if config.api_token.is_some() {
            info!("Translation provider token found");
        } else {
            info!("No translation provider token found. Public models only.");
        }

        // One engine per model id, shared by every language that uses it
        let mut multilingual: HashMap<String, Arc<dyn MultilingualTranslator>> = HashMap::new();

        for language in &config.languages {
            let code = language.code.to_lowercase();

            let handle = match (&language.model, &client) {
                _ if code == source_language => EngineHandle::Source,
                (None, _) => EngineHandle::Unavailable("no model configured".to_string()),
                (Some(_), None) => EngineHandle::Unavailable("inference client unavailable".to_string()),
                (Some(_), Some(_)) if language.requires_token && config.api_token.is_none() => {
                    warn!("Skipping {} translation: needs token", code);
                    EngineHandle::Unavailable("provider token required".to_string())
                }
                (Some(model), Some(client)) => match language.family {
                    ModelFamily::Pair => {
                        EngineHandle::Pair(Arc::new(HfPairEngine::new(client.clone(), model.clone())))
                    }
                    ModelFamily::Multilingual => match &language.tag {
                        Some(tag) => {
                            let engine = multilingual
                                .entry(model.clone())
                                .or_insert_with(|| {
                                    Arc::new(HfMultilingualEngine::new(client.clone(), model.clone()))
                                })
                                .clone();
                            EngineHandle::Multilingual { engine, target_tag: tag.clone() }
                        }
                        None => EngineHandle::Unavailable("multilingual model without target tag".to_string()),
                    },
                },
            };

            info!("Translation for {}: {}", code, handle.describe());
            engines.insert(code, handle);
        }

        let unavailable = engines.values().filter(|handle| !handle.is_available()).count();
        if unavailable > 0 {
            warn!(
                "{} of {} languages have no usable translation model and will keep the source text",
                unavailable,
                engines.len()
            );
        }

        Self::new(source_language, config.source_tag.clone(), engines)
    }

    pub fn source_language(&self) -> &str {
        &self.source_language
    }

    pub fn source_tag(&self) -> &str {
        &self.source_tag
    }

    pub fn get(&self, code: &str) -> Option<&EngineHandle> {
        self.engines.get(code)
    }

    /// Supported language codes, sorted
    pub fn languages(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = self.engines.keys().map(String::as_str).collect();
        codes.sort_unstable();
        codes
    }
}
