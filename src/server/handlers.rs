use axum::body::{Body, Bytes};
use axum::extract::{Multipart, Path as UrlPath, Request, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use std::path::Path;
use tokio::fs;
use tower::ServiceExt;
use tower_http::services::ServeFile;
use tracing::{error, info, warn};

use crate::error::{KaptionError, Result};
use crate::job::JobResult;
use crate::storage::allowed_file;
use super::AppState;

/// Body of every rejected request. Errors are reported with HTTP 200.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new<S: Into<String>>(error: S) -> Self {
        Self { success: false, error: error.into() }
    }
}

impl From<KaptionError> for ErrorResponse {
    fn from(e: KaptionError) -> Self {
        Self::new(e.to_string())
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    #[serde(flatten)]
    pub result: JobResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_link: Option<String>,
}

impl From<JobResult> for GenerateResponse {
    fn from(result: JobResult) -> Self {
        let download_link = if result.success { result.processed_file.clone() } else { None };
        Self { result, download_link }
    }
}

#[tracing::instrument(skip(state, multipart))]
pub async fn generate_handler(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let (filename, data, language) = match read_upload(&mut multipart).await.and_then(validate_upload) {
        Ok(upload) => upload,
        Err(e) => {
            warn!("Rejected upload: {}", e);
            return ErrorResponse::from(e).into_response();
        }
    };

    let upload_path = state.workflow.storage().upload_path(&filename);
    if let Err(e) = save_upload(&upload_path, &data).await {
        error!("Error saving upload {}: {}", upload_path.display(), e);
        return ErrorResponse::from(e).into_response();
    }

    info!("File uploaded: {}, language: {}", filename, language);

    let result = state.workflow.process(&upload_path, &filename, &language).await;
    Json(GenerateResponse::from(result)).into_response()
}

/// Multipart fields: the `file` part (filename, content) and `language`, default `en`
struct UploadForm {
    file: Option<(String, Bytes)>,
    language: String,
}

async fn read_upload(multipart: &mut Multipart) -> Result<UploadForm> {
    let invalid = |e: axum::extract::multipart::MultipartError| KaptionError::Upload(format!("Invalid upload: {}", e));
    let mut form = UploadForm { file: None, language: "en".to_string() };

    while let Some(field) = multipart.next_field().await.map_err(invalid)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let data = field.bytes().await.map_err(invalid)?;
                form.file = Some((filename, data));
            }
            "language" => {
                let text = field.text().await.map_err(invalid)?;
                if !text.trim().is_empty() {
                    form.language = text.trim().to_string();
                }
            }
            _ => {}
        }
    }

    Ok(form)
}

fn validate_upload(form: UploadForm) -> Result<(String, Bytes, String)> {
    let Some((filename, data)) = form.file else {
        return Err(KaptionError::Upload("No file uploaded".to_string()));
    };
    if filename.is_empty() {
        return Err(KaptionError::Upload("No file selected".to_string()));
    }
    if !allowed_file(&filename) {
        return Err(KaptionError::UnsupportedFormat(filename));
    }
    Ok((filename, data, form.language))
}

async fn save_upload(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, data).await?;
    Ok(())
}

pub async fn download_handler(
    State(state): State<AppState>,
    UrlPath(filename): UrlPath<String>,
    request: Request,
) -> Response {
    serve_artifact(&state, &filename, true, request).await
}

pub async fn subtitle_handler(
    State(state): State<AppState>,
    UrlPath(filename): UrlPath<String>,
    request: Request,
) -> Response {
    serve_artifact(&state, &filename, true, request).await
}

pub async fn video_handler(
    State(state): State<AppState>,
    UrlPath(filename): UrlPath<String>,
    request: Request,
) -> Response {
    serve_artifact(&state, &filename, false, request).await
}

pub async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Stream a processed artifact from disk. Range requests are honoured.
async fn serve_artifact(state: &AppState, filename: &str, attachment: bool, request: Request) -> Response {
    let Some(path) = state.workflow.storage().resolve_processed(filename) else {
        warn!("Requested artifact not found: {}", filename);
        return ErrorResponse::from(KaptionError::FileNotFound(filename.to_string())).into_response();
    };

    let mime: mime::Mime = content_type_for(filename).parse().expect("static content type is a valid MIME type");
    let mut response = match ServeFile::new_with_mime(&path, &mime).oneshot(request).await {
        Ok(response) => response.map(Body::new),
        Err(never) => match never {},
    };

    if response.status() == StatusCode::NOT_FOUND {
        warn!("Artifact vanished before it was served: {}", path.display());
        return ErrorResponse::from(KaptionError::FileNotFound(filename.to_string())).into_response();
    }

    let disposition = format!(
        "{}; filename=\"{}\"",
        if attachment { "attachment" } else { "inline" },
        filename.replace('"', "_")
    );
    let disposition = HeaderValue::from_str(&disposition).unwrap_or_else(|_| {
        HeaderValue::from_static(if attachment { "attachment" } else { "inline" })
    });
    response.headers_mut().insert(header::CONTENT_DISPOSITION, disposition);

    response
}

fn content_type_for(filename: &str) -> &'static str {
    let ext = filename.rsplit_once('.').map(|(_, ext)| ext.to_lowercase()).unwrap_or_default();
    match ext.as_str() {
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "avi" => "video/x-msvideo",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "ogg" => "audio/ogg",
        "m4a" => "audio/mp4",
        "srt" => "application/x-subrip",
        _ => "application/octet-stream",
    }
}
