use async_trait::async_trait;
use chrono::Utc;
use reqwest::{multipart, Client};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::path::Path;
use tracing::{debug, instrument, warn};

use super::relay::{ImageHost, UploadOptions, UploadedImage};
use crate::shared::AppError;

const API_BASE: &str = "https://api.cloudinary.com/v1_1";

/// Cloudinary account credentials
#[derive(Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Signed uploads to the Cloudinary upload API
pub struct CloudinaryImageHost {
    config: CloudinaryConfig,
    client: Client,
}

impl CloudinaryImageHost {
    pub fn new(config: CloudinaryConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    fn upload_url(&self) -> String {
        format!("{}/{}/image/upload", API_BASE, self.config.cloud_name)
    }

    /// Signature over the sorted `key=value` pairs followed by the API secret
    fn sign(&self, params: &[(&str, String)]) -> String {
        let mut sorted: Vec<_> = params.iter().collect();
        sorted.sort_by(|a, b| a.0.cmp(b.0));

        let to_sign = sorted
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect::<Vec<_>>()
            .join("&");

        let mut hasher = Sha256::new();
        hasher.update(to_sign.as_bytes());
        hasher.update(self.config.api_secret.as_bytes());
        hex::encode(hasher.finalize())
    }
}

/// Incoming transformation chain: optional watermark, size bound, delivery quality
fn transformation(options: &UploadOptions) -> String {
    let mut steps = Vec::new();
    if let Some(text) = options.watermark {
        steps.push(format!(
            "l_text:Arial_24_bold:{},g_center,o_30",
            text.replace(' ', "%20")
        ));
    }
    steps.push(format!(
        "c_limit,w_{},h_{},q_100",
        options.max_width, options.max_height
    ));
    steps.push("f_auto,q_auto:best,dpr_2.0".to_string());
    steps.join("/")
}

fn upload_params(options: &UploadOptions, timestamp: i64) -> Vec<(&'static str, String)> {
    vec![
        ("allowed_formats", options.allowed_formats.join(",")),
        ("folder", options.folder.clone()),
        ("public_id", options.public_id.clone()),
        ("signature_algorithm", "sha256".to_string()),
        ("timestamp", timestamp.to_string()),
        ("transformation", transformation(options)),
    ]
}

#[async_trait]
impl ImageHost for CloudinaryImageHost {
    #[instrument(skip(self, path, options), fields(folder = %options.folder, public_id = %options.public_id))]
    async fn upload(&self, path: &Path, options: &UploadOptions) -> Result<UploadedImage, AppError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| AppError::UploadFailed(format!("read spooled file: {}", e)))?;

        let params = upload_params(options, Utc::now().timestamp());
        let signature = self.sign(&params);

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| "upload".to_string());
        let mut form = multipart::Form::new()
            .part("file", multipart::Part::bytes(bytes).file_name(file_name))
            .text("api_key", self.config.api_key.clone())
            .text("signature", signature);
        for (key, value) in params {
            form = form.text(key, value);
        }

        debug!("Sending upload to Cloudinary");
        let response = self
            .client
            .post(self.upload_url())
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Cloudinary request failed");
                AppError::UploadFailed(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorResponse>()
                .await
                .map(|body| body.error.message)
                .unwrap_or_else(|_| status.to_string());
            warn!(%status, error = %message, "Cloudinary rejected upload");
            return Err(AppError::UploadFailed(message));
        }

        let body: UploadResponse = response.json().await.map_err(|e| {
            warn!(error = %e, "Unreadable Cloudinary response");
            AppError::UploadFailed(e.to_string())
        })?;

        Ok(UploadedImage {
            url: body.secure_url,
            public_id: body.public_id,
        })
    }
}
