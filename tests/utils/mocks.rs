use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

use house_rental::{AppError, ImageHost, UploadOptions, UploadedImage};

// ============================================================================
// Mock Infrastructure
// ============================================================================

/// Image host that keeps uploads in memory and answers with stable URLs
#[derive(Clone, Default)]
pub struct MockImageHost {
    uploads: Arc<RwLock<Vec<UploadOptions>>>,
    unavailable: bool,
}

impl MockImageHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    pub async fn uploads(&self) -> Vec<UploadOptions> {
        self.uploads.read().await.clone()
    }
}

#[async_trait]
impl ImageHost for MockImageHost {
    async fn upload(&self, path: &Path, options: &UploadOptions) -> Result<UploadedImage, AppError> {
        if self.unavailable {
            return Err(AppError::UploadFailed("mock host offline".to_string()));
        }
        assert!(path.exists(), "relay must spool before uploading");

        self.uploads.write().await.push(options.clone());
        let public_id = format!("{}/{}", options.folder, options.public_id);
        Ok(UploadedImage {
            url: format!("https://cdn.mock/{}.webp", public_id),
            public_id,
        })
    }
}
