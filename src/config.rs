use thiserror::Error;

use crate::upload::CloudinaryConfig;

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_UPLOAD_DIR: &str = "uploads";
pub const DEFAULT_HOUSE_IMAGE_FOLDER: &str = "ente-rental/development/house-images";

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },

    #[error("ACCESS_TOKEN_SECRET and REFRESH_TOKEN_SECRET must differ")]
    SharedTokenSecret,
}

/// Seed account created at startup when absent
#[derive(Clone, PartialEq)]
pub struct SuperAdminSeed {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Process configuration, read once at startup
#[derive(Clone)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: Option<String>,
    pub access_token_secret: String,
    pub refresh_token_secret: String,
    pub cloudinary: CloudinaryConfig,
    pub upload_dir: String,
    pub house_image_folder: String,
    pub super_admin: Option<SuperAdminSeed>,
    pub cors_allowed_origin: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup; blank values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let optional = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let required = |key: &'static str| optional(key).ok_or(ConfigError::Missing(key));

        let port = match optional("PORT") {
            Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
                key: "PORT",
                value,
            })?,
            None => DEFAULT_PORT,
        };

        let access_token_secret = required("ACCESS_TOKEN_SECRET")?;
        let refresh_token_secret = required("REFRESH_TOKEN_SECRET")?;
        if access_token_secret == refresh_token_secret {
            return Err(ConfigError::SharedTokenSecret);
        }

        let cloudinary = CloudinaryConfig {
            cloud_name: required("CLOUDINARY_CLOUD_NAME")?,
            api_key: required("CLOUDINARY_API_KEY")?,
            api_secret: required("CLOUDINARY_API_SECRET")?,
        };

        let super_admin = match (
            optional("SUPER_ADMIN_NAME"),
            optional("SUPER_ADMIN_EMAIL"),
            optional("SUPER_ADMIN_PASSWORD"),
        ) {
            (Some(name), Some(email), Some(password)) => Some(SuperAdminSeed {
                name,
                email,
                password,
            }),
            _ => None,
        };

        Ok(Self {
            port,
            database_url: optional("DATABASE_URL"),
            access_token_secret,
            refresh_token_secret,
            cloudinary,
            upload_dir: optional("UPLOAD_DIR").unwrap_or_else(|| DEFAULT_UPLOAD_DIR.to_string()),
            house_image_folder: optional("HOUSE_IMAGE_FOLDER")
                .unwrap_or_else(|| DEFAULT_HOUSE_IMAGE_FOLDER.to_string()),
            super_admin,
            cors_allowed_origin: optional("CORS_ALLOWED_ORIGIN"),
        })
    }
}
