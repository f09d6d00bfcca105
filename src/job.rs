use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::segment::Segment;

/// Unique token naming one pipeline run and its artifacts
pub fn new_job_id() -> String {
    Uuid::new_v4().to_string()
}

/// Outcome of one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobResult {
    pub success: bool,
    pub job_id: String,
    pub subtitles: Vec<Segment>,
    /// Subtitle artifact name inside the processed directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub srt_file: Option<String>,
    /// Media artifact name inside the processed directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_file: Option<String>,
    #[serde(default)]
    pub has_video: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobResult {
    pub fn completed(
        job_id: String,
        subtitles: Vec<Segment>,
        srt_file: String,
        processed_file: String,
        has_video: bool,
    ) -> Self {
        Self {
            success: true,
            job_id,
            subtitles,
            srt_file: Some(srt_file),
            processed_file: Some(processed_file),
            has_video,
            error: None,
        }
    }

    pub fn failed<S: Into<String>>(job_id: String, error: S) -> Self {
        Self {
            success: false,
            job_id,
            subtitles: Vec::new(),
            srt_file: None,
            processed_file: None,
            has_video: false,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_result_omits_artifacts() {
        let result = JobResult::failed("abc".to_string(), "boom");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "success": false,
                "job_id": "abc",
                "subtitles": [],
                "has_video": false,
                "error": "boom"
            })
        );
    }

    #[test]
    fn test_completed_result_serializes_segments() {
        let result = JobResult::completed(
            "abc".to_string(),
            vec![Segment::new(1.0, 2.5, "hi")],
            "abc.srt".to_string(),
            "abc_clip.mp4".to_string(),
            true,
        );
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["subtitles"][0], serde_json::json!({"start": 1.0, "end": 2.5, "text": "hi"}));
        assert_eq!(json["srt_file"], "abc.srt");
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_job_ids_are_unique_uuids() {
        let a = new_job_id();
        assert_ne!(a, new_job_id());
        assert!(Uuid::parse_str(&a).is_ok());
    }
}
