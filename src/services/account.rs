//! Account lifecycle: registration, listing, partial updates, and
//! credential verification.

use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

use crate::config::SecurityConfig;
use crate::db::{Account, AccountChanges, NewAccount, Role, Store};
use crate::services::password;

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("username already taken")]
    Conflict,

    #[error("account not found")]
    NotFound,

    #[error("storage failure: {0}")]
    Storage(#[source] anyhow::Error),
}

impl AccountError {
    fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}

/// Unique-constraint violations mean a duplicate username (or, vanishingly,
/// an API key collision); everything else is an internal storage failure.
fn map_db_err(err: DbErr) -> AccountError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AccountError::Conflict,
        _ => AccountError::Storage(err.into()),
    }
}

/// Partial update request; `None` means "leave untouched", never "clear".
#[derive(Debug, Clone, Default)]
pub struct AccountUpdate {
    pub username: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

/// Account operations over the store.
///
/// Authorization is NOT enforced here: the request boundary authenticates
/// the caller with the required role before invoking any of these.
pub struct AccountService {
    store: Store,
    security: SecurityConfig,
}

impl AccountService {
    #[must_use]
    pub const fn new(store: Store, security: SecurityConfig) -> Self {
        Self { store, security }
    }

    /// Create an account and return it with the freshly issued API key.
    ///
    /// Issuance is the only disclosure event for the plaintext key; it is
    /// not retrievable here again later.
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        role: &str,
    ) -> Result<(Account, String), AccountError> {
        if username.trim().is_empty() {
            return Err(AccountError::invalid("Username is required"));
        }
        if password.is_empty() {
            return Err(AccountError::invalid("Password is required"));
        }
        let role = Role::parse(role)
            .ok_or_else(|| AccountError::invalid("Role must be 'admin' or 'user'"))?;

        // Cheap duplicate check before the expensive hash; the unique
        // constraint remains the arbiter under concurrent registration.
        if self
            .store
            .find_account_by_username(username)
            .await
            .map_err(map_db_err)?
            .is_some()
        {
            return Err(AccountError::Conflict);
        }

        let password_hash = password::hash_password_blocking(password, &self.security)
            .await
            .map_err(AccountError::Storage)?;
        let api_key = password::generate_api_key();

        let account = self
            .store
            .insert_account(NewAccount {
                username: username.to_string(),
                password_hash,
                role,
                api_key: api_key.clone(),
            })
            .await
            .map_err(map_db_err)?;

        Ok((account, api_key))
    }

    /// List all accounts. The `Account` projection carries no password hash.
    pub async fn list(&self) -> Result<Vec<Account>, AccountError> {
        self.store.list_accounts().await.map_err(map_db_err)
    }

    /// Apply a partial update. Validation happens before any persistence, so
    /// a rejected request leaves the account unmodified.
    pub async fn update(&self, id: i32, update: AccountUpdate) -> Result<Account, AccountError> {
        let mut changes = AccountChanges::default();

        if let Some(username) = update.username {
            if username.trim().is_empty() {
                return Err(AccountError::invalid("Username must not be empty"));
            }
            changes.username = Some(username);
        }

        if let Some(role) = update.role {
            changes.role = Some(
                Role::parse(&role)
                    .ok_or_else(|| AccountError::invalid("Role must be 'admin' or 'user'"))?,
            );
        }

        if let Some(new_password) = update.password {
            if new_password.is_empty() {
                return Err(AccountError::invalid("Password must not be empty"));
            }
            changes.password_hash = Some(
                password::hash_password_blocking(&new_password, &self.security)
                    .await
                    .map_err(AccountError::Storage)?,
            );
        }

        self.store
            .update_account(id, changes)
            .await
            .map_err(map_db_err)?
            .ok_or(AccountError::NotFound)
    }

    /// Check a username/password pair, returning the account on success.
    ///
    /// Unknown usernames and wrong passwords are indistinguishable to the
    /// caller.
    pub async fn verify_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<Account>, AccountError> {
        let Some((account, password_hash)) = self
            .store
            .find_account_by_username_with_password(username)
            .await
            .map_err(map_db_err)?
        else {
            return Ok(None);
        };

        let valid = password::verify_password_blocking(password, &password_hash)
            .await
            .map_err(AccountError::Storage)?;

        Ok(valid.then_some(account))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_security() -> SecurityConfig {
        SecurityConfig {
            argon2_memory_cost_kib: 1024,
            argon2_time_cost: 1,
            argon2_parallelism: 1,
        }
    }

    async fn service() -> AccountService {
        let store = Store::with_pool_options("sqlite::memory:", 1, 1)
            .await
            .expect("in-memory store");
        AccountService::new(store, fast_security())
    }

    #[tokio::test]
    async fn register_issues_an_opaque_key() {
        let svc = service().await;

        let (account, api_key) = svc.register("alice", "pw1", "user").await.unwrap();

        assert_eq!(account.username, "alice");
        assert_eq!(account.role, Role::User);
        assert!(api_key.len() >= 20);
        assert_eq!(account.api_key, api_key);
    }

    #[tokio::test]
    async fn register_rejects_bad_input() {
        let svc = service().await;

        assert!(matches!(
            svc.register("", "pw", "user").await,
            Err(AccountError::InvalidInput(_))
        ));
        assert!(matches!(
            svc.register("   ", "pw", "user").await,
            Err(AccountError::InvalidInput(_))
        ));
        assert!(matches!(
            svc.register("alice", "", "user").await,
            Err(AccountError::InvalidInput(_))
        ));
        assert!(matches!(
            svc.register("alice", "pw", "superuser").await,
            Err(AccountError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn duplicate_username_conflicts_exactly_once() {
        let svc = service().await;

        svc.register("bob", "pw2", "admin").await.unwrap();
        assert!(matches!(
            svc.register("bob", "other", "admin").await,
            Err(AccountError::Conflict)
        ));

        let accounts = svc.list().await.unwrap();
        assert_eq!(
            accounts.iter().filter(|a| a.username == "bob").count(),
            1
        );
    }

    #[tokio::test]
    async fn update_role_only_leaves_rest_untouched() {
        let svc = service().await;

        let (account, key_before) = svc.register("carol", "pw3", "user").await.unwrap();

        let updated = svc
            .update(
                account.id,
                AccountUpdate {
                    role: Some("admin".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.role, Role::Admin);
        assert_eq!(updated.username, "carol");
        assert_eq!(updated.api_key, key_before);
        // Password untouched
        assert!(
            svc.verify_credentials("carol", "pw3")
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn invalid_role_update_leaves_account_unmodified() {
        let svc = service().await;

        let (account, _) = svc.register("dave", "pw4", "user").await.unwrap();

        assert!(matches!(
            svc.update(
                account.id,
                AccountUpdate {
                    username: Some("renamed".to_string()),
                    role: Some("superuser".to_string()),
                    ..Default::default()
                },
            )
            .await,
            Err(AccountError::InvalidInput(_))
        ));

        let accounts = svc.list().await.unwrap();
        let dave = accounts.iter().find(|a| a.id == account.id).unwrap();
        assert_eq!(dave.username, "dave");
        assert_eq!(dave.role, Role::User);
    }

    #[tokio::test]
    async fn update_missing_account_is_not_found() {
        let svc = service().await;

        assert!(matches!(
            svc.update(9999, AccountUpdate::default()).await,
            Err(AccountError::NotFound)
        ));
    }

    #[tokio::test]
    async fn update_password_rehashes() {
        let svc = service().await;

        let (account, _) = svc.register("erin", "old-pw", "user").await.unwrap();

        svc.update(
            account.id,
            AccountUpdate {
                password: Some("new-pw".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert!(
            svc.verify_credentials("erin", "new-pw")
                .await
                .unwrap()
                .is_some()
        );
        assert!(
            svc.verify_credentials("erin", "old-pw")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn verify_credentials_rejects_unknown_and_wrong() {
        let svc = service().await;

        svc.register("frank", "right", "user").await.unwrap();

        assert!(
            svc.verify_credentials("frank", "wrong")
                .await
                .unwrap()
                .is_none()
        );
        assert!(
            svc.verify_credentials("nobody", "right")
                .await
                .unwrap()
                .is_none()
        );
    }
}
