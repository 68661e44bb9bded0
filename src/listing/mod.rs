// Public API - what other modules can use
pub use handlers::{
    create_house, delete_house, get_house, get_house_by_slug, list_houses, update_house,
};
pub use models::ListingModel;
pub use service::ListingService;

// Internal modules
mod handlers;
pub mod models;
pub mod repository;
pub mod service;
pub mod slug;
pub mod types;
