use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use tracing::{debug, instrument};

use super::types::{TokenClaims, TokenKind, TokenPair};
use crate::account::models::AccountModel;
use crate::shared::AppError;

pub const ACCESS_TOKEN_MINUTES: i64 = 15;
pub const REFRESH_TOKEN_DAYS: i64 = 7;

/// Signing configuration for access and refresh tokens.
///
/// Each token kind has its own secret so a refresh token can never pass
/// as an access token and vice versa.
#[derive(Clone)]
pub struct TokenConfig {
    access_secret: String,
    refresh_secret: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenConfig {
    pub fn new(access_secret: String, refresh_secret: String) -> Self {
        Self {
            access_secret,
            refresh_secret,
            access_ttl: Duration::minutes(ACCESS_TOKEN_MINUTES),
            refresh_ttl: Duration::days(REFRESH_TOKEN_DAYS),
        }
    }

    pub fn with_lifetimes(mut self, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        self.access_ttl = access_ttl;
        self.refresh_ttl = refresh_ttl;
        self
    }

    pub fn ttl(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        }
    }

    fn secret(&self, kind: TokenKind) -> &[u8] {
        match kind {
            TokenKind::Access => self.access_secret.as_bytes(),
            TokenKind::Refresh => self.refresh_secret.as_bytes(),
        }
    }

    /// Creates a signed token of the given kind for an account
    pub fn create_token(&self, kind: TokenKind, account: &AccountModel) -> Result<String, AppError> {
        self.create_token_at(kind, account, Utc::now())
    }

    #[instrument(skip(self, account), fields(account_id = %account.id))]
    pub fn create_token_at(
        &self,
        kind: TokenKind,
        account: &AccountModel,
        issued_at: DateTime<Utc>,
    ) -> Result<String, AppError> {
        let exp = (issued_at + self.ttl(kind)).timestamp().max(0) as usize;

        debug!(?kind, exp_timestamp = exp, "Creating JWT token");

        let claims = TokenClaims {
            subject_id: account.id.clone(),
            email: account.email.clone(),
            role: account.role,
            token_kind: kind,
            iat: issued_at.timestamp().max(0) as usize,
            exp,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret(kind)),
        )
        .map_err(|e| {
            debug!(error = %e, "Failed to encode JWT token");
            AppError::JwtError(e.to_string())
        })
    }

    /// Issues a fresh access + refresh pair
    pub fn create_token_pair(&self, account: &AccountModel) -> Result<TokenPair, AppError> {
        Ok(TokenPair {
            access_token: self.create_token(TokenKind::Access, account)?,
            refresh_token: self.create_token(TokenKind::Refresh, account)?,
        })
    }

    /// Validates a token against the secret for `kind` and returns its claims
    #[instrument(skip(self, token))]
    pub fn validate_token(&self, kind: TokenKind, token: &str) -> Result<TokenClaims, AppError> {
        debug!("Decoding and validating JWT token");

        let claims = decode::<TokenClaims>(
            token,
            &DecodingKey::from_secret(self.secret(kind)),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|e| {
            debug!(error = %e, "Failed to decode JWT token");
            AppError::JwtError(e.to_string())
        })?;

        if claims.token_kind != kind {
            debug!(expected = ?kind, actual = ?claims.token_kind, "Token kind mismatch");
            return Err(AppError::JwtError("token kind mismatch".to_string()));
        }

        debug!(
            subject_id = %claims.subject_id,
            role = %claims.role,
            exp = claims.exp,
            "JWT token decoded successfully"
        );
        Ok(claims)
    }
}
