use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::error::{Result, KaptionError};
use crate::segment::{sort_chronologically, Segment};

/// Language hint handed to the speech model
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLanguage {
    /// Let the model detect the spoken language
    Auto,
    Code(String),
}

impl SourceLanguage {
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case("auto") {
            Self::Auto
        } else {
            Self::Code(value.to_lowercase())
        }
    }

    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Auto => None,
            Self::Code(code) => Some(code),
        }
    }
}

impl fmt::Display for SourceLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => f.write_str("auto"),
            Self::Code(code) => f.write_str(code),
        }
    }
}

/// Trait for converting service-specific transcription output to segments
pub trait TranscriptionMapper<T> {
    fn to_segments(service_result: T) -> Vec<Segment>;
}

/// whisper.cpp `-oj` output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhisperCppOutput {
    #[serde(default)]
    pub result: Option<WhisperCppResult>,
    #[serde(default)]
    pub transcription: Vec<WhisperCppSegment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhisperCppResult {
    pub language: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhisperCppSegment {
    pub offsets: WhisperCppOffsets,
    pub text: String,
}

/// Offsets in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhisperCppOffsets {
    pub from: i64,
    pub to: i64,
}

pub struct WhisperCppMapper;

impl TranscriptionMapper<WhisperCppOutput> for WhisperCppMapper {
    fn to_segments(output: WhisperCppOutput) -> Vec<Segment> {
        let mut segments: Vec<Segment> = output
            .transcription
            .into_iter()
            .map(|seg| Segment {
                start: seg.offsets.from.max(0) as f64 / 1000.0,
                end: seg.offsets.to.max(0) as f64 / 1000.0,
                text: seg.text.trim().to_string(),
            })
            .collect();
        sort_chronologically(&mut segments);
        segments
    }
}

/// OpenAI Whisper `--output_format json` output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIWhisperOutput {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub segments: Vec<OpenAIWhisperSegment>,
    pub language: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIWhisperSegment {
    pub id: u64,
    pub start: f64,
    pub end: f64,
    pub text: String,
    pub avg_logprob: Option<f64>,
    pub no_speech_prob: Option<f64>,
}

pub struct OpenAIWhisperMapper;

impl TranscriptionMapper<OpenAIWhisperOutput> for OpenAIWhisperMapper {
    fn to_segments(output: OpenAIWhisperOutput) -> Vec<Segment> {
        let mut segments: Vec<Segment> = output
            .segments
            .into_iter()
            .map(|seg| Segment {
                start: seg.start,
                end: seg.end,
                text: seg.text.trim().to_string(),
            })
            .collect();
        sort_chronologically(&mut segments);
        segments
    }
}

/// Read and decode a JSON file written by a transcriber
pub async fn read_json_output<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        KaptionError::Transcriber(format!("Failed to read output {}: {}", path.display(), e))
    })?;

    serde_json::from_str(&content)
        .map_err(|e| KaptionError::Transcriber(format!("Failed to parse transcriber JSON: {}", e)))
}
