use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;
use tracing::{debug, error, info};

use crate::config::TranscriberConfig;
use crate::error::{Result, KaptionError};
use crate::segment::Segment;
use super::{TranscriberTrait, common::{read_json_output, SourceLanguage, TranscriptionMapper, WhisperCppMapper, WhisperCppOutput}};

/// whisper.cpp command line transcriber (`whisper-cli`)
pub struct WhisperCppTranscriber {
    config: TranscriberConfig,
}

impl WhisperCppTranscriber {
    pub fn new(config: TranscriberConfig) -> Self {
        Self { config }
    }

    fn build_command(&self, audio_path: &Path, output_stem: &Path, language: &SourceLanguage) -> Command {
        let mut cmd = Command::new(&self.config.binary_path);
        cmd.arg("-m").arg(&self.config.model)
            .arg("-f").arg(audio_path)
            .arg("-l").arg(language.to_string())
            .arg("-t").arg(self.config.threads.max(1).to_string())
            .arg("-oj")
            .arg("-of").arg(output_stem)
            .arg("-np");
        cmd
    }
}

#[async_trait]
impl TranscriberTrait for WhisperCppTranscriber {
    async fn transcribe(&self, audio_path: &Path, language: &SourceLanguage) -> Result<Vec<Segment>> {
        info!("Transcribing {} with whisper.cpp (language: {})", audio_path.display(), language);

        let temp_dir = tempfile::tempdir()
            .map_err(|e| KaptionError::Transcriber(format!("Failed to create temp directory: {}", e)))?;
        let output_stem = temp_dir.path().join("transcript");

        let mut cmd = self.build_command(audio_path, &output_stem, language);
        debug!("Executing whisper.cpp command: {:?}", cmd);

        let output = cmd.output().await.map_err(|e| {
            error!("Failed to execute whisper.cpp: {}", e);
            KaptionError::Transcriber(format!("Failed to execute whisper.cpp: {}", e))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!("whisper.cpp failed: {}", stderr);
            return Err(KaptionError::Transcriber(format!("whisper.cpp failed: {}", stderr.trim())));
        }

        let whisper_output: WhisperCppOutput =
            read_json_output(&output_stem.with_extension("json")).await?;
        let segments = WhisperCppMapper::to_segments(whisper_output);

        info!("Transcription produced {} segments", segments.len());
        Ok(segments)
    }

    /// whisper.cpp needs 16 kHz mono PCM. A `.wav` upload may be any rate or
    /// channel layout, so every input goes through audio extraction first.
    fn accepts_input(&self, _path: &Path) -> bool {
        false
    }

    async fn check_availability(&self) -> Result<()> {
        if !Path::new(&self.config.model).exists() {
            return Err(KaptionError::Transcriber(format!(
                "whisper.cpp model not found: {}",
                self.config.model
            )));
        }

        let output = Command::new(&self.config.binary_path)
            .arg("--help")
            .output()
            .await
            .map_err(|e| KaptionError::Transcriber(format!("{} not found: {}", self.config.binary_path, e)))?;

        if output.status.success() {
            info!("whisper.cpp is available");
            Ok(())
        } else {
            Err(KaptionError::Transcriber(format!(
                "{} --help exited with {}",
                self.config.binary_path, output.status
            )))
        }
    }

    fn name(&self) -> &str {
        "whisper.cpp"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TranscriberImplementation;

    fn transcriber(binary: &str, model: &str) -> WhisperCppTranscriber {
        WhisperCppTranscriber::new(TranscriberConfig {
            implementation: TranscriberImplementation::WhisperCpp,
            binary_path: binary.to_string(),
            model: model.to_string(),
            source_language: "en".to_string(),
            threads: 2,
        })
    }

    #[test]
    fn test_every_input_is_resampled_first() {
        let t = transcriber("whisper-cli", "ggml-base.bin");
        assert!(!t.accepts_input(Path::new("audio.WAV")));
        assert!(!t.accepts_input(Path::new("stereo_44k.wav")));
        assert!(!t.accepts_input(Path::new("song.mp3")));
        assert!(!t.accepts_input(Path::new("noext")));
    }

    #[test]
    fn test_command_passes_language_and_json_output() {
        let t = transcriber("whisper-cli", "models/ggml-base.bin");
        let cmd = t.build_command(Path::new("a.wav"), Path::new("/tmp/x/transcript"), &SourceLanguage::Auto);
        let args: Vec<String> = cmd
            .as_std()
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();

        assert_eq!(
            args,
            vec!["-m", "models/ggml-base.bin", "-f", "a.wav", "-l", "auto", "-t", "2", "-oj", "-of", "/tmp/x/transcript", "-np"]
        );
    }

    #[tokio::test]
    async fn test_missing_binary_is_transcriber_error() {
        let t = transcriber("/nonexistent/whisper-cli", "ggml-base.bin");
        let err = t
            .transcribe(Path::new("a.wav"), &SourceLanguage::Code("en".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, KaptionError::Transcriber(_)));
    }

    #[tokio::test]
    async fn test_availability_requires_model_file() {
        let t = transcriber("whisper-cli", "/nonexistent/ggml-base.bin");
        assert!(t.check_availability().await.is_err());
    }
}
