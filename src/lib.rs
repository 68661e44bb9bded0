// Library crate for the house rental backend
// This file exposes the public API for the binary and integration tests

pub mod account;
pub mod config;
pub mod listing;
pub mod routes;
pub mod session;
pub mod shared;
pub mod upload;

// Re-export commonly used types for easier access in tests
pub use account::{AccountService, AdminAccount, Role, UserAccount};
pub use config::AppConfig;
pub use listing::{ListingModel, ListingService};
pub use routes::{app, cors_layer};
pub use session::TokenConfig;
pub use shared::{AppError, AppState};
pub use upload::{ImageHost, ImageRelay, UploadOptions, UploadedImage};
