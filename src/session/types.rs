use serde::{Deserialize, Serialize};

use crate::account::models::Role;

/// Which secret a token was signed with and what it may be used for
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT claims carried by both access and refresh tokens.
///
/// Decoding is strict: unknown fields, missing fields and unknown
/// `role`/`tokenKind` values all fail verification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TokenClaims {
    pub subject_id: String,
    pub email: String,
    pub role: Role,
    pub token_kind: TokenKind,
    pub iat: usize, // Issued at timestamp (standard JWT claim)
    pub exp: usize, // Expiration timestamp (standard JWT claim)
}

/// Freshly issued access + refresh tokens
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}
