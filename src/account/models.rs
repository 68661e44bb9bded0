use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use strum_macros::EnumIter;

use super::policy::Action;
use super::types::AccountProfile;
use crate::shared::new_object_id;

/// Account role. Users are always `user`; admins are `admin` or `superAdmin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter)]
#[serde(rename_all = "camelCase")]
pub enum Role {
    User,
    Admin,
    SuperAdmin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
            Role::SuperAdmin => "superAdmin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for Role {
    type Error = String;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            "superAdmin" => Ok(Role::SuperAdmin),
            _ => Err(s.to_string()),
        }
    }
}

/// Stored account record shared by the user and admin variants
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountModel {
    pub id: String, // 24-char hex, ObjectId-compatible
    pub name: String,
    pub email: String, // Always lowercase
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AccountModel {
    /// Creates a new account with generated ID and timestamps.
    /// The email is normalized to lowercase.
    pub fn new(name: String, email: String, password_hash: String, role: Role) -> Self {
        let now = Utc::now();

        Self {
            id: new_object_id(),
            name,
            email: normalize_email(&email),
            password_hash,
            role,
            created_at: now,
            updated_at: now,
        }
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Distinguishes the account variants that share one service implementation
pub trait AccountKind: Send + Sync + 'static {
    /// Human-readable variant name used in messages ("User", "Admin")
    const LABEL: &'static str;

    /// Roles an account of this kind may hold
    fn allowed_roles() -> &'static [Role];

    /// Role assigned when none is requested
    fn default_role() -> Role;

    /// Policy action checked after a successful password match
    const SIGN_IN: Action;

    fn allows(role: Role) -> bool {
        Self::allowed_roles().contains(&role)
    }

    /// Client-safe view returned by login and self-details
    fn project(account: &AccountModel) -> AccountProfile {
        AccountProfile::from_account(account)
    }
}

/// Marketplace users; role fixed to `user`
pub struct UserAccount;

impl AccountKind for UserAccount {
    const LABEL: &'static str = "User";
    const SIGN_IN: Action = Action::UserSignIn;

    fn allowed_roles() -> &'static [Role] {
        &[Role::User]
    }

    fn default_role() -> Role {
        Role::User
    }
}

/// Back-office admins; role `admin` or `superAdmin`
pub struct AdminAccount;

impl AccountKind for AdminAccount {
    const LABEL: &'static str = "Admin";
    const SIGN_IN: Action = Action::AdminSignIn;

    fn allowed_roles() -> &'static [Role] {
        &[Role::Admin, Role::SuperAdmin]
    }

    fn default_role() -> Role {
        Role::Admin
    }

    fn project(account: &AccountModel) -> AccountProfile {
        AccountProfile::with_role(account)
    }
}
