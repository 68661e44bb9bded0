use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::shared::AppError;

pub const DEFAULT_FOLDER: &str = "default-folder";
pub const ALLOWED_FORMATS: &[&str] = &["jpg", "png", "jpeg", "gif", "webp"];
pub const WATERMARK_TEXT: &str = "Ente Rental Kochi";
pub const MAX_DIMENSION: u32 = 800;

const ARCHIVE_SUBFOLDER: &str = "og-image";
const ARCHIVE_SUFFIX: &str = "original";
const WATERMARKED_SUFFIX: &str = "ente-rental-kochi";

/// What the host should do with one upload
#[derive(Debug, Clone, PartialEq)]
pub struct UploadOptions {
    pub folder: String,
    pub public_id: String,
    /// Centered text overlay at 30% opacity when set
    pub watermark: Option<&'static str>,
    pub max_width: u32,
    pub max_height: u32,
    pub allowed_formats: &'static [&'static str],
}

/// Hosted image returned to the client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UploadedImage {
    pub url: String,
    pub public_id: String,
}

/// External image host
#[async_trait]
pub trait ImageHost: Send + Sync {
    async fn upload(&self, path: &Path, options: &UploadOptions) -> Result<UploadedImage, AppError>;
}

/// Spools an uploaded file to disk and pushes an archival copy plus a
/// watermarked copy to the image host.
pub struct ImageRelay {
    host: Arc<dyn ImageHost>,
    upload_dir: PathBuf,
}

impl ImageRelay {
    pub fn new(host: Arc<dyn ImageHost>, upload_dir: PathBuf) -> Self {
        Self { host, upload_dir }
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    /// Returns the watermarked copy. The spooled file is removed whether
    /// or not the uploads succeed.
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn relay(
        &self,
        file_name: &str,
        bytes: &[u8],
        folder: Option<&str>,
    ) -> Result<UploadedImage, AppError> {
        let folder = folder
            .filter(|folder| !folder.is_empty())
            .unwrap_or(DEFAULT_FOLDER);
        let stem = file_stem(file_name);

        let spooled = self.spool(bytes).await?;
        let result = self.upload_copies(&spooled, folder, &stem).await;

        if let Err(e) = tokio::fs::remove_file(&spooled).await {
            warn!(path = %spooled.display(), error = %e, "Failed to remove spooled upload");
        }

        result
    }

    async fn spool(&self, bytes: &[u8]) -> Result<PathBuf, AppError> {
        tokio::fs::create_dir_all(&self.upload_dir)
            .await
            .map_err(|e| AppError::UploadFailed(format!("upload dir: {}", e)))?;

        let path = self.upload_dir.join(Uuid::new_v4().to_string());
        write_spooled(&path, bytes).await?;

        debug!(path = %path.display(), "Spooled upload");
        Ok(path)
    }

    async fn upload_copies(
        &self,
        path: &Path,
        folder: &str,
        stem: &str,
    ) -> Result<UploadedImage, AppError> {
        let archival = UploadOptions {
            folder: format!("{}/{}", folder, ARCHIVE_SUBFOLDER),
            public_id: format!("{}-{}", stem, ARCHIVE_SUFFIX),
            watermark: None,
            max_width: MAX_DIMENSION,
            max_height: MAX_DIMENSION,
            allowed_formats: ALLOWED_FORMATS,
        };
        self.host.upload(path, &archival).await?;
        debug!(public_id = %archival.public_id, "Archival copy uploaded");

        // A failure here leaves the archival copy behind on the host
        let watermarked = UploadOptions {
            folder: folder.to_string(),
            public_id: format!("{}-{}", stem, WATERMARKED_SUFFIX),
            watermark: Some(WATERMARK_TEXT),
            ..archival
        };
        let image = self.host.upload(path, &watermarked).await?;

        info!(public_id = %image.public_id, "Watermarked copy uploaded");
        Ok(image)
    }
}

/// Writes the spool file, removing whatever was written when the write fails
async fn write_spooled(path: &Path, bytes: &[u8]) -> Result<(), AppError> {
    if let Err(e) = tokio::fs::write(path, bytes).await {
        match tokio::fs::remove_file(path).await {
            Ok(()) => debug!(path = %path.display(), "Removed partial spool file"),
            Err(remove_err) if remove_err.kind() == std::io::ErrorKind::NotFound => {}
            Err(remove_err) => {
                warn!(path = %path.display(), error = %remove_err, "Failed to remove partial spool file")
            }
        }
        return Err(AppError::UploadFailed(format!("spool: {}", e)));
    }
    Ok(())
}

/// File name without directories or extension; `image` when nothing remains
fn file_stem(file_name: &str) -> String {
    Path::new(file_name)
        .file_stem()
        .map(|stem| stem.to_string_lossy().trim().to_string())
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| "image".to_string())
}

/// Records every upload and answers with a predictable URL
#[cfg(test)]
pub struct RecordingImageHost {
    pub calls: std::sync::Mutex<Vec<(PathBuf, UploadOptions)>>,
    fail_on_call: Option<usize>,
}

#[cfg(test)]
impl RecordingImageHost {
    pub fn new() -> Self {
        Self {
            calls: std::sync::Mutex::new(Vec::new()),
            fail_on_call: None,
        }
    }

    /// Fails the n-th call (0-based)
    pub fn failing_on(call: usize) -> Self {
        Self {
            fail_on_call: Some(call),
            ..Self::new()
        }
    }

    pub fn recorded(&self) -> Vec<(PathBuf, UploadOptions)> {
        self.calls.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl ImageHost for RecordingImageHost {
    async fn upload(&self, path: &Path, options: &UploadOptions) -> Result<UploadedImage, AppError> {
        assert!(path.exists(), "spooled file must exist during upload");

        let mut calls = self.calls.lock().unwrap();
        let index = calls.len();
        calls.push((path.to_path_buf(), options.clone()));

        if self.fail_on_call == Some(index) {
            return Err(AppError::UploadFailed("host unavailable".to_string()));
        }

        let public_id = format!("{}/{}", options.folder, options.public_id);
        Ok(UploadedImage {
            url: format!("https://images.test/{}.jpg", public_id),
            public_id,
        })
    }
}
