// OpenAI Whisper Python implementation

use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;
use tracing::{debug, error, info};

use crate::config::TranscriberConfig;
use crate::error::{Result, KaptionError};
use crate::segment::Segment;
use super::{TranscriberTrait, common::{read_json_output, OpenAIWhisperMapper, OpenAIWhisperOutput, SourceLanguage, TranscriptionMapper}};

/// OpenAI Whisper implementation
pub struct OpenAITranscriber {
    config: TranscriberConfig,
}

impl OpenAITranscriber {
    pub fn new(config: TranscriberConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl TranscriberTrait for OpenAITranscriber {
    async fn transcribe(&self, audio_path: &Path, language: &SourceLanguage) -> Result<Vec<Segment>> {
        info!("Transcribing {} with OpenAI Whisper (language: {})", audio_path.display(), language);

        let temp_dir = tempfile::tempdir()
            .map_err(|e| KaptionError::Transcriber(format!("Failed to create temp directory: {}", e)))?;
        let output_dir = temp_dir.path();

        let mut cmd = Command::new(&self.config.binary_path);
        cmd.arg(audio_path)
            .arg("--model").arg(&self.config.model)
            .arg("--output_dir").arg(output_dir)
            .arg("--output_format").arg("json")
            .arg("--verbose").arg("False");

        if let Some(lang) = language.code() {
            cmd.arg("--language").arg(lang);
        }

        debug!("Executing whisper command: {:?}", cmd);

        let output = cmd.output().await.map_err(|e| {
            error!("Failed to execute whisper: {}", e);
            KaptionError::Transcriber(format!("Failed to execute whisper: {}", e))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!("Whisper failed: {}", stderr);
            return Err(KaptionError::Transcriber(format!("Whisper failed: {}", stderr.trim())));
        }

        let audio_stem = audio_path
            .file_stem()
            .ok_or_else(|| KaptionError::Transcriber("Invalid audio filename".to_string()))?;
        let json_file = output_dir.join(format!("{}.json", audio_stem.to_string_lossy()));

        let whisper_output: OpenAIWhisperOutput = read_json_output(&json_file).await?;
        let segments = OpenAIWhisperMapper::to_segments(whisper_output);

        info!("Transcription produced {} segments", segments.len());
        Ok(segments)
    }

    async fn check_availability(&self) -> Result<()> {
        let output = Command::new(&self.config.binary_path)
            .arg("--help")
            .output()
            .await
            .map_err(|e| KaptionError::Transcriber(format!("whisper command not found: {}", e)))?;

        if output.status.success() {
            info!("OpenAI Whisper command-line tool is available");
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(KaptionError::Transcriber(format!(
                "OpenAI Whisper not available. Install with: pip install openai-whisper\nError: {}",
                stderr
            )))
        }
    }

    fn name(&self) -> &str {
        "openai-whisper"
    }
}
