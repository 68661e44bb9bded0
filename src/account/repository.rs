use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Row};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, instrument, warn};

use super::models::{AccountModel, Role};
use crate::shared::AppError;

/// Trait for account repository operations.
///
/// Emails are passed already normalized; each store is one uniqueness domain.
#[async_trait]
pub trait AccountRepository {
    async fn create_account(&self, account: &AccountModel) -> Result<(), AppError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<AccountModel>, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<AccountModel>, AppError>;
}

/// In-memory implementation of AccountRepository for development and testing
pub struct InMemoryAccountRepository {
    accounts: Mutex<HashMap<String, AccountModel>>,
}

impl Default for InMemoryAccountRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryAccountRepository {
    /// Creates a new empty in-memory repository
    pub fn new() -> Self {
        Self {
            accounts: Mutex::new(HashMap::new()),
        }
    }

    /// Creates an in-memory repository with pre-populated accounts
    pub fn with_accounts(accounts: Vec<AccountModel>) -> Self {
        let account_map = accounts
            .into_iter()
            .map(|account| (account.id.clone(), account))
            .collect();

        Self {
            accounts: Mutex::new(account_map),
        }
    }

    /// Returns the current number of accounts in the repository
    pub fn account_count(&self) -> usize {
        self.accounts.lock().unwrap().len()
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    #[instrument(skip(self, account), fields(account_id = %account.id))]
    async fn create_account(&self, account: &AccountModel) -> Result<(), AppError> {
        debug!("Creating account in memory");

        let mut accounts = self.accounts.lock().unwrap();
        if accounts.values().any(|existing| existing.email == account.email) {
            warn!("Account email already exists in memory");
            return Err(AppError::Conflict("Account already exists".to_string()));
        }
        if accounts.contains_key(&account.id) {
            warn!("Account id already exists in memory");
            return Err(AppError::DatabaseError(
                "Account already exists".to_string(),
            ));
        }
        accounts.insert(account.id.clone(), account.clone());

        debug!("Account created successfully in memory");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_by_email(&self, email: &str) -> Result<Option<AccountModel>, AppError> {
        let accounts = self.accounts.lock().unwrap();
        let account = accounts
            .values()
            .find(|account| account.email == email)
            .cloned();

        debug!(found = account.is_some(), "Looked up account by email in memory");
        Ok(account)
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: &str) -> Result<Option<AccountModel>, AppError> {
        let accounts = self.accounts.lock().unwrap();
        let account = accounts.get(id).cloned();

        debug!(found = account.is_some(), "Looked up account by id in memory");
        Ok(account)
    }
}

/// PostgreSQL implementation of account repository.
///
/// Users and admins live in separate tables with identical columns.
pub struct PostgresAccountRepository {
    pool: PgPool,
    table: &'static str,
}

impl PostgresAccountRepository {
    pub fn users(pool: PgPool) -> Self {
        Self {
            pool,
            table: "users",
        }
    }

    pub fn admins(pool: PgPool) -> Self {
        Self {
            pool,
            table: "admins",
        }
    }

    fn map_row(row: &PgRow) -> Result<AccountModel, AppError> {
        let role: String = row.get("role");
        let role = Role::try_from(role.as_str()).map_err(|unknown| {
            warn!(role = %unknown, "Stored account has unknown role");
            AppError::DatabaseError(format!("unknown role {}", unknown))
        })?;

        Ok(AccountModel {
            id: row.get("id"),
            name: row.get("name"),
            email: row.get("email"),
            password_hash: row.get("password_hash"),
            role,
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }
}

#[async_trait]
impl AccountRepository for PostgresAccountRepository {
    #[instrument(skip(self, account), fields(account_id = %account.id, table = self.table))]
    async fn create_account(&self, account: &AccountModel) -> Result<(), AppError> {
        debug!("Creating account in database");

        let sql = format!(
            "INSERT INTO {} (id, name, email, password_hash, role, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7)",
            self.table
        );
        sqlx::query(&sql)
            .bind(&account.id)
            .bind(&account.name)
            .bind(&account.email)
            .bind(&account.password_hash)
            .bind(account.role.as_str())
            .bind(account.created_at)
            .bind(account.updated_at)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if e.as_database_error()
                    .is_some_and(|db_error| db_error.is_unique_violation())
                {
                    warn!("Account email already exists in database");
                    return AppError::Conflict("Account already exists".to_string());
                }
                warn!(error = %e, "Failed to create account in database");
                AppError::DatabaseError(e.to_string())
            })?;

        debug!("Account created successfully in database");
        Ok(())
    }

    #[instrument(skip(self), fields(table = self.table))]
    async fn find_by_email(&self, email: &str) -> Result<Option<AccountModel>, AppError> {
        let sql = format!(
            "SELECT id, name, email, password_hash, role, created_at, updated_at FROM {} WHERE email = $1",
            self.table
        );
        let row = sqlx::query(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to fetch account by email");
                AppError::DatabaseError(e.to_string())
            })?;

        row.as_ref().map(Self::map_row).transpose()
    }

    #[instrument(skip(self), fields(table = self.table))]
    async fn find_by_id(&self, id: &str) -> Result<Option<AccountModel>, AppError> {
        let sql = format!(
            "SELECT id, name, email, password_hash, role, created_at, updated_at FROM {} WHERE id = $1",
            self.table
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, account_id = %id, "Failed to fetch account by id");
                AppError::DatabaseError(e.to_string())
            })?;

        row.as_ref().map(Self::map_row).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_account(email: &str) -> AccountModel {
        AccountModel::new(
            "Test".to_string(),
            email.to_string(),
            "hash".to_string(),
            Role::User,
        )
    }

    #[tokio::test]
    async fn test_create_and_find_account() {
        let repo = InMemoryAccountRepository::new();
        let account = create_test_account("a@example.com");

        repo.create_account(&account).await.unwrap();

        let by_id = repo.find_by_id(&account.id).await.unwrap().unwrap();
        assert_eq!(by_id.email, "a@example.com");

        let by_email = repo.find_by_email("a@example.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, account.id);
    }

    #[tokio::test]
    async fn test_find_missing_account() {
        let repo = InMemoryAccountRepository::new();
        assert!(repo.find_by_id("missing").await.unwrap().is_none());
        assert!(repo.find_by_email("nobody@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_is_conflict() {
        let repo = InMemoryAccountRepository::new();
        repo.create_account(&create_test_account("dup@example.com"))
            .await
            .unwrap();

        let result = repo
            .create_account(&create_test_account("dup@example.com"))
            .await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
        assert_eq!(repo.account_count(), 1);
    }

    #[tokio::test]
    async fn test_with_accounts_preloads() {
        let accounts = vec![
            create_test_account("one@example.com"),
            create_test_account("two@example.com"),
        ];
        let repo = InMemoryAccountRepository::with_accounts(accounts.clone());

        assert_eq!(repo.account_count(), 2);
        for account in &accounts {
            assert!(repo.find_by_id(&account.id).await.unwrap().is_some());
        }
    }
}
