// Public API - what other modules can use
pub use handlers::{
    admin_auth_details, admin_login, admin_logout, admin_refresh, create_admin, user_login,
    user_logout, user_profile, user_refresh, user_register,
};
pub use models::{AccountKind, AccountModel, AdminAccount, Role, UserAccount};
pub use service::AccountService;
pub use types::{AccountProfile, AuthenticatedAccount};

// Internal modules
mod handlers;
pub mod models;
mod password;
pub mod policy;
pub mod repository;
mod service;
pub mod types;
