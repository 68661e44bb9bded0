use super::models::Role;
use crate::shared::AppError;

/// Actions guarded by role
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CreateAdmin,
    UserSignIn,
    AdminSignIn,
    ViewOwnProfile,
}

impl Action {
    fn denial_message(&self) -> &'static str {
        match self {
            Action::CreateAdmin => "Only superAdmin can create admin users",
            Action::UserSignIn => "User access only",
            Action::AdminSignIn => "Admin access only",
            Action::ViewOwnProfile => "Access denied",
        }
    }
}

pub fn is_allowed(role: Role, action: Action) -> bool {
    match action {
        Action::CreateAdmin => role == Role::SuperAdmin,
        Action::UserSignIn => role == Role::User,
        Action::AdminSignIn => matches!(role, Role::Admin | Role::SuperAdmin),
        Action::ViewOwnProfile => true,
    }
}

/// Maps `(role, action)` to allow or `Forbidden`
pub fn authorize(role: Role, action: Action) -> Result<(), AppError> {
    if is_allowed(role, action) {
        Ok(())
    } else {
        Err(AppError::Forbidden(action.denial_message().to_string()))
    }
}
