use std::path::{Path, PathBuf};
use std::fs;
use tokio::fs as async_fs;
use tokio::io::AsyncWriteExt;
use reqwest::Client;
use tracing::{info, warn};
use indicatif::{ProgressBar, ProgressStyle};

use crate::error::{Result, KaptionError};
use crate::config::{Config, TranscriberImplementation};

const MODEL_BASE_URL: &str = "https://huggingface.co/ggerganov/whisper.cpp/resolve/main";

pub struct SetupManager {
    client: Client,
    kaption_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ModelInfo {
    pub name: String,
    pub filename: String,
    pub url: String,
    pub size_mb: f64,
}

impl ModelInfo {
    fn ggml(name: &str, size_mb: f64) -> Self {
        let filename = format!("ggml-{}.bin", name);
        Self {
            name: name.to_string(),
            url: format!("{}/{}", MODEL_BASE_URL, filename),
            filename,
            size_mb,
        }
    }
}

impl SetupManager {
    pub fn new() -> Result<Self> {
        Self::with_dir(".kaption")
    }

    pub fn with_dir<P: Into<PathBuf>>(kaption_dir: P) -> Result<Self> {
        let kaption_dir = kaption_dir.into();
        fs::create_dir_all(kaption_dir.join("models"))?;

        let client = Client::builder()
            .user_agent(concat!("kaption/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, kaption_dir })
    }

    /// Make sure the configured whisper.cpp model is on disk, rewriting
    /// `config.transcriber.model` to its local path
    pub async fn initialize(&self, config: &mut Config) -> Result<()> {
        if config.transcriber.implementation != TranscriberImplementation::WhisperCpp {
            return Ok(());
        }

        info!("Configured whisper model: {}", config.transcriber.model);

        if self.model_exists(&config.transcriber.model) {
            config.transcriber.model = self.resolve_model_path(&config.transcriber.model);
        } else {
            info!("Whisper model not found: {}", config.transcriber.model);
            let model = self.select_appropriate_model(&config.transcriber.model)?;
            config.transcriber.model = self.download_model(&model).await?;
        }

        info!("Using whisper model: {}", config.transcriber.model);
        Ok(())
    }

    pub fn get_available_models(&self) -> Vec<ModelInfo> {
        vec![
            ModelInfo::ggml("tiny", 39.0),
            ModelInfo::ggml("tiny.en", 39.0),
            ModelInfo::ggml("base", 142.0),
            ModelInfo::ggml("base.en", 142.0),
            ModelInfo::ggml("small", 466.0),
            ModelInfo::ggml("small.en", 466.0),
            ModelInfo::ggml("medium", 1500.0),
            ModelInfo::ggml("medium.en", 1500.0),
            ModelInfo::ggml("large-v3", 2900.0),
        ]
    }

    fn select_appropriate_model(&self, preferred: &str) -> Result<ModelInfo> {
        let models = self.get_available_models();

        if let Some(model) = models.iter().find(|m| m.name == preferred) {
            return Ok(model.clone());
        }

        if let Some(model) = models.iter().find(|m| m.name == "base") {
            warn!("Preferred model '{}' not found, using 'base' instead", preferred);
            return Ok(model.clone());
        }

        Err(KaptionError::Config("No suitable whisper model found".to_string()))
    }

    /// Local path a model is stored at
    pub fn model_path(&self, model: &ModelInfo) -> PathBuf {
        self.kaption_dir.join("models").join(&model.filename)
    }

    pub fn model_exists(&self, model: &str) -> bool {
        // An explicit path
        if model.contains('/') || model.ends_with(".bin") {
            return Path::new(model).exists();
        }

        self.kaption_dir.join("models").join(format!("ggml-{}.bin", model)).exists()
    }

    /// Map a model name like `base` to `.kaption/models/ggml-base.bin`; paths pass through
    pub fn resolve_model_path(&self, model: &str) -> String {
        if model.contains('/') || model.ends_with(".bin") {
            return model.to_string();
        }

        self.kaption_dir
            .join("models")
            .join(format!("ggml-{}.bin", model))
            .to_string_lossy()
            .to_string()
    }

    pub async fn download_model(&self, model: &ModelInfo) -> Result<String> {
        let local_path = self.model_path(model);

        if local_path.exists() {
            info!("Model {} already exists at {}", model.name, local_path.display());
            return Ok(local_path.to_string_lossy().to_string());
        }

        info!("Downloading {} model ({:.1} MB)...", model.name, model.size_mb);

        let mut response = self.client.get(&model.url).send().await?;

        if !response.status().is_success() {
            return Err(KaptionError::Config(format!(
                "Failed to download model {}: HTTP {}",
                model.name, response.status()
            )));
        }

        let total = response
            .content_length()
            .unwrap_or((model.size_mb * 1_000_000.0) as u64);
        let pb = ProgressBar::new(total);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
        {
            pb.set_style(style.progress_chars("#>-"));
        }

        // Renamed into place once complete
        let temp_path = local_path.with_extension("tmp");
        let mut file = async_fs::File::create(&temp_path).await?;

        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
            pb.inc(chunk.len() as u64);
        }

        file.flush().await?;
        drop(file);

        async_fs::rename(&temp_path, &local_path).await?;

        pb.finish_with_message(format!("Downloaded {}", model.name));
        info!("Successfully downloaded {} to {}", model.name, local_path.display());

        Ok(local_path.to_string_lossy().to_string())
    }

    pub fn kaption_dir(&self) -> &Path {
        &self.kaption_dir
    }
}
