use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::{
    models::{normalize_email, AccountKind, AccountModel, AdminAccount, Role, UserAccount},
    password::{hash_password, verify_dummy_password, verify_password},
    policy::{authorize, Action},
    repository::AccountRepository,
    types::{
        required, AccountProfile, AuthenticatedAccount, CreateAdminRequest, LoginRequest,
        RegisterRequest,
    },
};
use crate::session::{Credentials, TokenConfig, TokenKind, TokenPair};
use crate::shared::AppError;

const INVALID_CREDENTIALS: &str = "Invalid credentials";
const INVALID_REFRESH_TOKEN: &str = "Invalid or expired refresh token";

/// Authentication and account management for one account variant.
///
/// Instantiated once for users and once for admins; the variant decides the
/// allowed roles and the sign-in policy, the token configuration is shared.
pub struct AccountService<K: AccountKind> {
    repository: Arc<dyn AccountRepository + Send + Sync>,
    token_config: TokenConfig,
    _kind: PhantomData<K>,
}

impl<K: AccountKind> AccountService<K> {
    pub fn new(
        repository: Arc<dyn AccountRepository + Send + Sync>,
        token_config: TokenConfig,
    ) -> Self {
        Self {
            repository,
            token_config,
            _kind: PhantomData,
        }
    }

    pub fn token_config(&self) -> &TokenConfig {
        &self.token_config
    }

    /// Hashes the password and stores a new account of this variant
    async fn insert_account(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<AccountModel, AppError> {
        if !K::allows(role) {
            return Err(AppError::BadRequest(format!(
                "Role {} is not allowed for {} accounts",
                role,
                K::LABEL
            )));
        }

        let email = normalize_email(email);
        if self.repository.find_by_email(&email).await?.is_some() {
            warn!(kind = K::LABEL, "Account email already registered");
            return Err(AppError::Conflict(format!("{} already exists", K::LABEL)));
        }

        let account = AccountModel::new(name.to_string(), email, hash_password(password)?, role);

        // The store has the final say on uniqueness when two requests race
        self.repository
            .create_account(&account)
            .await
            .map_err(|e| match e {
                AppError::Conflict(_) => AppError::Conflict(format!("{} already exists", K::LABEL)),
                other => other,
            })?;

        info!(kind = K::LABEL, account_id = %account.id, role = %account.role, "Account created");
        Ok(account)
    }

    /// Verifies email + password and issues a token pair.
    ///
    /// Unknown email and wrong password produce the same error.
    #[instrument(skip(self, request), fields(kind = K::LABEL))]
    pub async fn login(
        &self,
        request: LoginRequest,
    ) -> Result<(AccountProfile, TokenPair), AppError> {
        let (Some(email), Some(password)) = (required(&request.email), request.password.as_deref())
        else {
            return Err(AppError::BadRequest(
                "Email and password are required".to_string(),
            ));
        };

        let account = self
            .repository
            .find_by_email(&normalize_email(email))
            .await?;
        let verified = match &account {
            Some(account) => verify_password(password, &account.password_hash),
            None => verify_dummy_password(password),
        };
        let account = account
            .filter(|_| verified)
            .ok_or_else(|| {
                warn!("Login rejected");
                AppError::Unauthorized(INVALID_CREDENTIALS.to_string())
            })?;

        authorize(account.role, K::SIGN_IN)?;

        let tokens = self.token_config.create_token_pair(&account)?;
        info!(account_id = %account.id, "Login successful");

        Ok((K::project(&account), tokens))
    }

    /// Rotates the token pair using a valid refresh token.
    ///
    /// Previously issued refresh tokens are not revoked and stay valid until
    /// they expire.
    #[instrument(skip(self, credentials), fields(kind = K::LABEL))]
    pub async fn refresh(
        &self,
        credentials: &Credentials,
    ) -> Result<(AccountModel, TokenPair), AppError> {
        let token = credentials
            .refresh_token
            .as_deref()
            .ok_or_else(|| AppError::BadRequest("Refresh token missing".to_string()))?;

        let claims = self
            .token_config
            .validate_token(TokenKind::Refresh, token)
            .map_err(|e| {
                warn!(error = %e, "Refresh token rejected");
                AppError::Unauthorized(INVALID_REFRESH_TOKEN.to_string())
            })?;

        let account = self
            .repository
            .find_by_id(&claims.subject_id)
            .await?
            .ok_or_else(|| {
                warn!(account_id = %claims.subject_id, "Refresh token subject no longer exists");
                AppError::Unauthorized(INVALID_REFRESH_TOKEN.to_string())
            })?;

        let tokens = self.token_config.create_token_pair(&account)?;
        info!(account_id = %account.id, "Token pair rotated");

        Ok((account, tokens))
    }

    /// Resolves the account behind the request's access token.
    ///
    /// The refresh token is only consulted to tell "never signed in"
    /// (`NoToken`) apart from "access token gone or stale" (`TokenExpired`).
    #[instrument(skip(self, credentials), fields(kind = K::LABEL))]
    pub async fn authenticate(
        &self,
        credentials: &Credentials,
    ) -> Result<AuthenticatedAccount, AppError> {
        let token = match (&credentials.access_token, &credentials.refresh_token) {
            (Some(token), _) => token,
            (None, None) => {
                debug!("Request carries no tokens");
                return Err(AppError::NoToken);
            }
            (None, Some(_)) => {
                debug!("Access token missing but refresh token present");
                return Err(AppError::TokenExpired);
            }
        };

        let claims = self
            .token_config
            .validate_token(TokenKind::Access, token)
            .map_err(|e| {
                debug!(error = %e, "Access token rejected");
                AppError::TokenExpired
            })?;

        let account = self
            .repository
            .find_by_id(&claims.subject_id)
            .await?
            .filter(|account| K::allows(account.role))
            .ok_or_else(|| {
                warn!(account_id = %claims.subject_id, "Access token subject not found");
                AppError::Unauthorized("Account not found".to_string())
            })?;

        authorize(account.role, Action::ViewOwnProfile)?;

        Ok(AuthenticatedAccount { claims, account })
    }

    /// Self-details for the current request
    pub async fn profile(&self, credentials: &Credentials) -> Result<AccountProfile, AppError> {
        let authenticated = self.authenticate(credentials).await?;
        Ok(K::project(&authenticated.account))
    }
}

impl AccountService<UserAccount> {
    /// Self-registration; role is always `user`
    #[instrument(skip(self, request))]
    pub async fn register(&self, request: RegisterRequest) -> Result<AccountProfile, AppError> {
        let (Some(name), Some(email), Some(_)) = (
            required(&request.name),
            required(&request.email),
            required(&request.password),
        ) else {
            return Err(AppError::BadRequest("All fields are required".to_string()));
        };
        let password = request.password.as_deref().unwrap_or_default();

        let account = self
            .insert_account(name, email, password, UserAccount::default_role())
            .await?;

        Ok(AccountProfile::from_account(&account))
    }
}

impl AccountService<AdminAccount> {
    /// Creates an admin on behalf of an authenticated caller.
    ///
    /// The caller's authority is checked before the request body is looked at.
    #[instrument(skip(self, caller, request), fields(caller_id = %caller.account.id))]
    pub async fn create_admin(
        &self,
        caller: &AuthenticatedAccount,
        request: CreateAdminRequest,
    ) -> Result<AccountProfile, AppError> {
        authorize(caller.account.role, Action::CreateAdmin)?;

        let (Some(name), Some(email), Some(_), Some(role)) = (
            required(&request.name),
            required(&request.email),
            required(&request.password),
            required(&request.role),
        ) else {
            return Err(AppError::BadRequest("All fields are required".to_string()));
        };
        let password = request.password.as_deref().unwrap_or_default();

        let role = Role::try_from(role)
            .ok()
            .filter(|role| AdminAccount::allows(*role))
            .ok_or_else(|| {
                AppError::BadRequest("Role must be either admin or superAdmin".to_string())
            })?;

        let account = self.insert_account(name, email, password, role).await?;

        Ok(AccountProfile::with_role(&account))
    }

    /// Seeds a superAdmin when none exists with that email.
    /// Returns whether an account was created.
    #[instrument(skip(self, name, password))]
    pub async fn ensure_super_admin(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<bool, AppError> {
        if self
            .repository
            .find_by_email(&normalize_email(email))
            .await?
            .is_some()
        {
            debug!("Bootstrap superAdmin already present");
            return Ok(false);
        }

        self.insert_account(name, email, password, Role::SuperAdmin)
            .await?;
        Ok(true)
    }
}
