use serde::{Deserialize, Serialize};

use super::models::{AccountModel, Role};
use crate::session::TokenClaims;

/// Request payload for user self-registration
#[derive(Debug, Default, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Request payload for user and admin login
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Request payload for creating an admin account
#[derive(Debug, Default, Deserialize)]
pub struct CreateAdminRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

/// Client-safe projection of an account: never includes the password hash
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccountProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl AccountProfile {
    pub fn from_account(account: &AccountModel) -> Self {
        Self {
            id: account.id.clone(),
            name: account.name.clone(),
            email: account.email.clone(),
            role: None,
        }
    }

    pub fn with_role(account: &AccountModel) -> Self {
        Self {
            role: Some(account.role),
            ..Self::from_account(account)
        }
    }
}

/// Identity established by a verified access token, stored in request extensions
#[derive(Debug, Clone)]
pub struct AuthenticatedAccount {
    pub claims: TokenClaims,
    pub account: AccountModel,
}

/// Returns the trimmed value when present and non-blank
pub(crate) fn required(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}
