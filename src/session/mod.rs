// Public API - what other modules can use
pub use cookies::{
    clear_token_pair, set_token_pair, ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE,
};
pub use middleware::{admin_auth, Credentials};
pub use token::TokenConfig;
pub use types::{TokenClaims, TokenKind, TokenPair};

// Internal modules
pub mod cookies;
mod middleware;
mod token;
mod types;
