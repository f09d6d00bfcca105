use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, error, info};

use crate::config::MediaConfig;
use crate::error::{Result, KaptionError};
use super::{MediaProcessorTrait, MediaCommandBuilder};

/// Concrete implementation of media processor (FFmpeg-based)
pub struct MediaProcessorImpl {
    config: MediaConfig,
    command_builder: MediaCommandBuilder,
}

impl MediaProcessorImpl {
    /// Create a new media processor implementation
    pub fn new(config: MediaConfig) -> Self {
        let command_builder = MediaCommandBuilder::new(&config.binary_path);

        Self {
            config,
            command_builder,
        }
    }
}

async fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    Ok(())
}

#[async_trait]
impl MediaProcessorTrait for MediaProcessorImpl {
    async fn extract_audio(&self, input_path: &Path, audio_path: &Path) -> Result<PathBuf> {
        info!("Extracting audio from {} to {}", input_path.display(), audio_path.display());

        ensure_parent_dir(audio_path).await?;

        let command = self.command_builder.extract_audio(input_path, audio_path);
        command.execute().await?;

        info!("Audio extraction completed");
        Ok(audio_path.to_path_buf())
    }

    async fn embed_subtitles(
        &self,
        video_path: &Path,
        subtitle_path: &Path,
        output_path: &Path,
    ) -> Result<()> {
        info!("Embedding subtitles from {} into {} -> {}",
              subtitle_path.display(), video_path.display(), output_path.display());

        if !video_path.exists() {
            error!("Video not found: {}", video_path.display());
            return Err(KaptionError::VideoNotFound(video_path.display().to_string()));
        }
        if !subtitle_path.exists() {
            error!("Subtitle not found: {}", subtitle_path.display());
            return Err(KaptionError::SubtitleNotFound(subtitle_path.display().to_string()));
        }

        ensure_parent_dir(output_path).await?;

        let command = self.command_builder.embed_subtitles(
            video_path,
            subtitle_path,
            output_path,
            self.config.crf,
            &self.config.preset,
            &self.config.subtitle_options,
        );
        command.execute().await?;

        info!("Subtitle embedding completed successfully");
        Ok(())
    }

    async fn check_availability(&self) -> Result<()> {
        self.command_builder
            .version_check()
            .execute()
            .await
            .map_err(|e| KaptionError::Media(format!("Media processor not available: {}", e)))?;

        info!("Media processor is available");
        Ok(())
    }

    async fn get_version_info(&self) -> Result<String> {
        debug!("Getting media processor version information");

        let stdout = self.command_builder.version_check().execute().await?;
        // The first line carries the version
        Ok(stdout.lines().next().unwrap_or("Unknown version").to_string())
    }
}
