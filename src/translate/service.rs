use std::fmt;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::error::{Result, KaptionError};
use crate::segment::Segment;
use super::{EngineHandle, ModelRegistry};

/// Why segments were passed through untranslated
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslationFallback {
    /// Target is the transcript's own language
    SameLanguage,
    /// Target is not a supported language
    Unsupported,
    /// Supported, but no engine could be set up
    Unavailable(String),
    /// The engine call failed
    Failed(String),
}

impl fmt::Display for TranslationFallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SameLanguage => f.write_str("target is the source language"),
            Self::Unsupported => f.write_str("unsupported language"),
            Self::Unavailable(reason) => write!(f, "no model available ({})", reason),
            Self::Failed(reason) => write!(f, "translation failed ({})", reason),
        }
    }
}

/// Result of a best-effort translation. `segments` always has the input's
/// length and timing.
#[derive(Debug, Clone)]
pub struct TranslationOutcome {
    pub segments: Vec<Segment>,
    pub fallback: Option<TranslationFallback>,
}

impl TranslationOutcome {
    fn translated(segments: Vec<Segment>) -> Self {
        Self { segments, fallback: None }
    }

    fn passed_through(segments: &[Segment], fallback: TranslationFallback) -> Self {
        Self { segments: segments.to_vec(), fallback: Some(fallback) }
    }

    pub fn is_translated(&self) -> bool {
        self.fallback.is_none()
    }
}

/// Translates transcripts through the model registry
pub struct TranslationService {
    registry: Arc<ModelRegistry>,
}

impl TranslationService {
    pub fn new(registry: Arc<ModelRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Translate segment texts into `target_language`. Never fails: every
    /// problem degrades to returning the original segments.
    pub async fn translate_segments(&self, segments: &[Segment], target_language: &str) -> TranslationOutcome {
        let target = target_language.trim().to_lowercase();

        if target == self.registry.source_language() {
            return TranslationOutcome::passed_through(segments, TranslationFallback::SameLanguage);
        }

        let Some(handle) = self.registry.get(&target) else {
            warn!("Unsupported language: {}", target);
            return TranslationOutcome::passed_through(segments, TranslationFallback::Unsupported);
        };

        match self.invoke(handle, segments).await {
            Ok(Some(translated)) => {
                info!("Translated {} segments to {}", translated.len(), target);
                TranslationOutcome::translated(translated)
            }
            Ok(None) => TranslationOutcome::passed_through(segments, TranslationFallback::SameLanguage),
            Err(InvokeError::Unavailable(reason)) => {
                warn!("No model for {}: {}", target, reason);
                TranslationOutcome::passed_through(segments, TranslationFallback::Unavailable(reason))
            }
            Err(InvokeError::Failed(e)) => {
                error!("Translation error for {}: {}", target, e);
                TranslationOutcome::passed_through(segments, TranslationFallback::Failed(e.to_string()))
            }
        }
    }

    async fn invoke(&self, handle: &EngineHandle, segments: &[Segment]) -> std::result::Result<Option<Vec<Segment>>, InvokeError> {
        let texts: Vec<String> = segments.iter().map(|s| s.text.clone()).collect();

        let translations = match handle {
            EngineHandle::Source => return Ok(None),
            EngineHandle::Unavailable(reason) => return Err(InvokeError::Unavailable(reason.clone())),
            _ if segments.is_empty() => return Ok(Some(Vec::new())),
            EngineHandle::Pair(engine) => engine.translate_batch(&texts).await,
            EngineHandle::Multilingual { engine, target_tag } => {
                engine.translate_batch(&texts, self.registry.source_tag(), target_tag).await
            }
        }
        .map_err(InvokeError::Failed)?;

        rebuild_segments(segments, translations).map(Some).map_err(InvokeError::Failed)
    }
}

enum InvokeError {
    Unavailable(String),
    Failed(KaptionError),
}

/// Pair translated texts back with their segments, keeping timing
fn rebuild_segments(segments: &[Segment], translations: Vec<String>) -> Result<Vec<Segment>> {
    if translations.len() != segments.len() {
        return Err(KaptionError::Translation(format!(
            "Engine returned {} texts for {} segments",
            translations.len(),
            segments.len()
        )));
    }

    Ok(segments
        .iter()
        .zip(translations)
        .map(|(segment, text)| segment.with_text(text.trim()))
        .collect())
}
