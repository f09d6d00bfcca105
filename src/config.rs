use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::error::{Result, KaptionError};

/// Environment variable holding the translation provider credential
pub const TOKEN_ENV_VAR: &str = "HUGGINGFACE_TOKEN";

fn default_max_upload_bytes() -> usize {
    100 * 1024 * 1024
}

fn default_timeout_secs() -> u64 {
    300
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub transcriber: TranscriberConfig,
    pub translate: TranslateConfig,
    pub media: MediaConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The address the listener binds to
    pub address: String,
    /// The port the listener binds to
    pub port: u16,
    /// Largest accepted request body
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Raw uploads, stored as `<uuid>_<filename>`
    pub uploads_dir: PathBuf,
    /// Generated artifacts, stored as `<job-id>.srt` and `<job-id>_<filename>`
    pub processed_dir: PathBuf,
    /// Keep the extracted audio track after a successful job
    #[serde(default)]
    pub keep_intermediate: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriberConfig {
    /// Which speech-to-text backend to drive
    pub implementation: TranscriberImplementation,
    /// Path to transcriber binary (`whisper-cli` or `whisper`)
    pub binary_path: String,
    /// Model name (`base`) or path to a ggml model file
    pub model: String,
    /// Language spoken in the media, or `auto` to let the model detect it
    pub source_language: String,
    /// Worker threads handed to whisper.cpp
    pub threads: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TranscriberImplementation {
    /// whisper.cpp command line (`whisper-cli`)
    WhisperCpp,
    /// OpenAI Whisper Python command line (`whisper`)
    OpenAI,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslateConfig {
    /// Base URL of the inference endpoint, the model id is appended
    pub endpoint: String,
    /// Provider credential, falls back to `HUGGINGFACE_TOKEN`
    #[serde(default)]
    pub api_token: Option<String>,
    /// Language the transcript is translated from
    pub source_language: String,
    /// Tag for the source language on multilingual models
    pub source_tag: String,
    /// Request timeout for a single translation call
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Supported target languages
    pub languages: Vec<LanguageConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageConfig {
    /// Language code accepted from clients (`fr`)
    pub code: String,
    /// Model id on the inference endpoint, none for the source language
    #[serde(default)]
    pub model: Option<String>,
    /// Invocation shape of the model
    #[serde(default)]
    pub family: ModelFamily,
    /// Target tag for multilingual models (`ur_PK`)
    #[serde(default)]
    pub tag: Option<String>,
    /// The model is only reachable with a provider token
    #[serde(default)]
    pub requires_token: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelFamily {
    /// One language pair per model, plain text list in and out
    #[default]
    Pair,
    /// Many-to-many model, source and target tags on every call
    Multilingual,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Path to ffmpeg binary
    pub binary_path: String,
    /// Burn subtitles into video uploads; otherwise the upload is copied as is
    pub burn_subtitles: bool,
    /// libx264 constant rate factor used when burning subtitles
    pub crf: u8,
    /// libx264 preset used when burning subtitles
    pub preset: String,
    /// Additional encoding options appended to the embedding command
    /// e.g. ["-pix_fmt", "yuv420p"]
    pub subtitle_options: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                address: "0.0.0.0".to_string(),
                port: 5000,
                max_upload_bytes: default_max_upload_bytes(),
            },
            storage: StorageConfig {
                uploads_dir: PathBuf::from("uploads"),
                processed_dir: PathBuf::from("processed"),
                keep_intermediate: false,
            },
            transcriber: TranscriberConfig {
                implementation: TranscriberImplementation::WhisperCpp,
                binary_path: "whisper-cli".to_string(),
                model: "base".to_string(),
                source_language: "en".to_string(),
                threads: 4,
            },
            translate: TranslateConfig {
                endpoint: "https://api-inference.huggingface.co/models".to_string(),
                api_token: None,
                source_language: "en".to_string(),
                source_tag: "en_XX".to_string(),
                timeout_secs: default_timeout_secs(),
                languages: default_languages(),
            },
            media: MediaConfig {
                binary_path: "ffmpeg".to_string(),
                burn_subtitles: true,
                crf: 23,
                preset: "fast".to_string(),
                subtitle_options: vec![],
            },
        }
    }
}

fn default_languages() -> Vec<LanguageConfig> {
    let pair = |code: &str| LanguageConfig {
        code: code.to_string(),
        model: Some(format!("Helsinki-NLP/opus-mt-en-{}", code)),
        family: ModelFamily::Pair,
        tag: None,
        requires_token: false,
    };
    let mbart = |code: &str, tag: &str| LanguageConfig {
        code: code.to_string(),
        model: Some("facebook/mbart-large-50-many-to-many-mmt".to_string()),
        family: ModelFamily::Multilingual,
        tag: Some(tag.to_string()),
        requires_token: true,
    };

    vec![
        LanguageConfig {
            code: "en".to_string(),
            model: None,
            family: ModelFamily::Pair,
            tag: None,
            requires_token: false,
        },
        pair("fr"),
        pair("de"),
        pair("es"),
        mbart("ur", "ur_PK"),
        mbart("pt", "pt_XX"),
    ]
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| KaptionError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| KaptionError::Config(format!("Failed to parse config file: {}", e)))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| KaptionError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| KaptionError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Fill an unset provider token from the environment
    pub fn apply_env_token(&mut self, env_value: Option<String>) {
        let has_token = self
            .translate
            .api_token
            .as_deref()
            .is_some_and(|t| !t.trim().is_empty());

        if !has_token {
            self.translate.api_token = env_value.filter(|t| !t.trim().is_empty());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_languages_cover_both_families() {
        let config = Config::default();
        let codes: Vec<&str> = config.translate.languages.iter().map(|l| l.code.as_str()).collect();
        assert_eq!(codes, vec!["en", "fr", "de", "es", "ur", "pt"]);

        let ur = config.translate.languages.iter().find(|l| l.code == "ur").unwrap();
        assert_eq!(ur.family, ModelFamily::Multilingual);
        assert_eq!(ur.tag.as_deref(), Some("ur_PK"));
        assert!(ur.requires_token);
    }

    #[test]
    fn test_config_round_trips_through_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kaption.toml");

        let mut config = Config::default();
        config.server.port = 8080;
        config.media.preset = "medium".to_string();
        config.save_to_file(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.server.port, 8080);
        assert_eq!(loaded.media.preset, "medium");
        assert_eq!(loaded.translate.languages.len(), 6);
    }

    #[test]
    fn test_env_token_only_fills_missing_value() {
        let mut config = Config::default();
        config.apply_env_token(Some("from-env".to_string()));
        assert_eq!(config.translate.api_token.as_deref(), Some("from-env"));

        config.apply_env_token(Some("other".to_string()));
        assert_eq!(config.translate.api_token.as_deref(), Some("from-env"));

        let mut config = Config::default();
        config.apply_env_token(Some("  ".to_string()));
        assert!(config.translate.api_token.is_none());
    }

    #[test]
    fn test_missing_config_file_is_config_error() {
        let err = Config::from_file("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, KaptionError::Config(_)));
    }
}
