// Public API - what other modules can use
pub use cloudinary::{CloudinaryConfig, CloudinaryImageHost};
pub use handlers::upload_house_photo;
#[cfg(test)]
pub use relay::RecordingImageHost;
pub use relay::{ImageHost, ImageRelay, UploadOptions, UploadedImage};

// Internal modules
mod cloudinary;
mod handlers;
pub mod relay;
