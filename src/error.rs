use thiserror::Error;

#[derive(Error, Debug)]
pub enum KaptionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transcription error: {0}")]
    Transcriber(String),

    #[error("Translation error: {0}")]
    Translation(String),

    #[error("Media processing error: {0}")]
    Media(String),

    #[error("Video not found: {0}")]
    VideoNotFound(String),

    #[error("Subtitle not found: {0}")]
    SubtitleNotFound(String),

    #[error("Subtitle format error: {0}")]
    Subtitle(String),

    #[error("Configuration error: {0}")]
    Config(String),

    /// A requested artifact is missing or its name is not a plain filename
    #[error("File not found")]
    FileNotFound(String),

    #[error("File type not allowed: {0}")]
    UnsupportedFormat(String),

    #[error("{0}")]
    Upload(String),
}

pub type Result<T> = std::result::Result<T, KaptionError>;
