// Modular transcription architecture
//
// Speech-to-text backends behind one trait:
// - WhisperCpp: whisper.cpp command line
// - OpenAI: OpenAI Whisper Python command line
//
// To add a new transcription service:
// 1. Create service-specific data structures for parsing its JSON
// 2. Implement TranscriptionMapper for them
// 3. Add the service to TranscriberImplementation
// 4. Update the factory to create your implementation

pub mod common;
pub mod whisper_cpp;
pub mod openai;

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

pub use common::*;
use crate::config::{TranscriberConfig, TranscriberImplementation};
use crate::error::Result;
use crate::segment::Segment;

/// Main trait for transcription operations
#[async_trait]
pub trait TranscriberTrait: Send + Sync {
    /// Transcribe audio into chronologically ordered segments with trimmed text
    async fn transcribe(&self, audio_path: &Path, language: &SourceLanguage) -> Result<Vec<Segment>>;

    /// Whether the file can be handed to the engine without extracting audio first
    fn accepts_input(&self, _path: &Path) -> bool {
        true
    }

    /// Check that the engine binary and model are usable
    async fn check_availability(&self) -> Result<()>;

    fn name(&self) -> &str;
}

/// Factory for creating transcriber instances
pub struct TranscriberFactory;

impl TranscriberFactory {
    pub fn create_transcriber(config: TranscriberConfig) -> Arc<dyn TranscriberTrait> {
        match config.implementation {
            TranscriberImplementation::WhisperCpp => {
                Arc::new(whisper_cpp::WhisperCppTranscriber::new(config))
            }
            TranscriberImplementation::OpenAI => {
                Arc::new(openai::OpenAITranscriber::new(config))
            }
        }
    }
}
