use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::StorageConfig;
use crate::error::Result;

/// Extensions accepted for upload
pub const ALLOWED_EXTENSIONS: [&str; 7] = ["mp4", "avi", "mov", "mp3", "wav", "ogg", "m4a"];

/// Extensions treated as video (audio is extracted, subtitles can be burned in)
pub const VIDEO_EXTENSIONS: [&str; 3] = ["mp4", "avi", "mov"];

fn extension_of(filename: &str) -> Option<String> {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .filter(|ext| !ext.is_empty())
}

/// The filename has an extension in the upload allow-list
pub fn allowed_file(filename: &str) -> bool {
    extension_of(filename).is_some_and(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
}

pub fn is_video(filename: &str) -> bool {
    extension_of(filename).is_some_and(|ext| VIDEO_EXTENSIONS.contains(&ext.as_str()))
}

/// Reduce a client-supplied filename to a safe single path component:
/// ASCII letters, digits, `.`, `_` and `-`, whitespace turned into `_`.
pub fn secure_filename(filename: &str) -> String {
    // Clients on Windows send backslash separated names
    let base = filename.rsplit(['/', '\\']).next().unwrap_or_default();

    let cleaned: String = base
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();

    cleaned.trim_matches(|c| c == '.' || c == '_').to_string()
}

/// Name an upload is stored under: sanitized stem, lowercased original
/// extension. A stem with nothing left after sanitizing becomes `upload`.
pub fn stored_filename(filename: &str) -> String {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or_default();
    let (stem, ext) = match base.rsplit_once('.') {
        Some((stem, ext)) if !ext.is_empty() => (stem, Some(ext.to_lowercase())),
        _ => (base, None),
    };

    let mut safe_stem = secure_filename(stem);
    if safe_stem.is_empty() {
        safe_stem = "upload".to_string();
    }

    match ext.filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric())) {
        Some(ext) => format!("{}.{}", safe_stem, ext),
        None => safe_stem,
    }
}

/// The flat `uploads/` and `processed/` directories
#[derive(Debug, Clone)]
pub struct Storage {
    uploads_dir: PathBuf,
    processed_dir: PathBuf,
}

impl Storage {
    pub fn new<P: Into<PathBuf>, Q: Into<PathBuf>>(uploads_dir: P, processed_dir: Q) -> Self {
        Self {
            uploads_dir: uploads_dir.into(),
            processed_dir: processed_dir.into(),
        }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(&config.uploads_dir, &config.processed_dir)
    }

    pub fn uploads_dir(&self) -> &Path {
        &self.uploads_dir
    }

    pub fn processed_dir(&self) -> &Path {
        &self.processed_dir
    }

    /// Create both directories if they don't exist
    pub async fn ensure_dirs(&self) -> Result<()> {
        fs::create_dir_all(&self.uploads_dir).await?;
        fs::create_dir_all(&self.processed_dir).await?;
        Ok(())
    }

    /// Fresh `uploads/<uuid>_<stored filename>` path
    pub fn upload_path(&self, filename: &str) -> PathBuf {
        self.uploads_dir.join(format!("{}_{}", Uuid::new_v4(), stored_filename(filename)))
    }

    pub fn processed_path(&self, name: &str) -> PathBuf {
        self.processed_dir.join(name)
    }

    /// Resolve a client-requested artifact name. Only plain single-component
    /// names of existing files resolve.
    pub fn resolve_processed(&self, name: &str) -> Option<PathBuf> {
        let mut components = Path::new(name).components();
        let single_normal = matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        );
        if !single_normal || name.contains('\\') {
            return None;
        }

        let path = self.processed_dir.join(name);
        path.is_file().then_some(path)
    }
}

/// Delete the given files. Missing files are skipped; failures are logged
/// and never stop the rest of the list. Returns how many files were removed.
pub async fn cleanup_files<P: AsRef<Path>>(files: &[P]) -> usize {
    let mut removed = 0;

    for file in files {
        let file = file.as_ref();
        if !fs::try_exists(file).await.unwrap_or(false) {
            continue;
        }

        match fs::remove_file(file).await {
            Ok(()) => {
                info!("Deleted {}", file.display());
                removed += 1;
            }
            Err(e) => warn!("Could not delete {}: {}", file.display(), e),
        }
    }

    removed
}
