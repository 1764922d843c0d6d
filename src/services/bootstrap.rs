//! First-run admin seeding.

use anyhow::{Context, Result};
use sea_orm::SqlErr;
use tracing::info;

use crate::config::SecurityConfig;
use crate::db::{NewAccount, Role, Store};
use crate::services::password;

/// Username of the seeded first admin.
pub const DEFAULT_ADMIN_USERNAME: &str = "root_admin";

/// Well-known starting password for the seeded admin. Operators are expected
/// to rotate it immediately.
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin1234";

/// Credentials of a freshly seeded admin. The API key exists nowhere else in
/// recoverable form; the caller must surface it to the operator.
#[derive(Debug, Clone)]
pub struct SeededAdmin {
    pub username: String,
    pub api_key: String,
}

/// Seed the first admin account if none exists.
///
/// Idempotent: with an admin already present this is a no-op. Two processes
/// starting at once may both pass the count check; the unique username
/// constraint lets exactly one insert win and the loser degrades to a no-op.
pub async fn ensure_admin(
    store: &Store,
    security: &SecurityConfig,
) -> Result<Option<SeededAdmin>> {
    let admins = store
        .count_accounts_by_role(Role::Admin)
        .await
        .context("Failed to count admin accounts")?;

    if admins > 0 {
        return Ok(None);
    }

    let password_hash = password::hash_password_blocking(DEFAULT_ADMIN_PASSWORD, security).await?;
    let api_key = password::generate_api_key();

    match store
        .insert_account(NewAccount {
            username: DEFAULT_ADMIN_USERNAME.to_string(),
            password_hash,
            role: Role::Admin,
            api_key: api_key.clone(),
        })
        .await
    {
        Ok(account) => Ok(Some(SeededAdmin {
            username: account.username,
            api_key,
        })),
        Err(err) => match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                info!("Admin account already seeded by a concurrent starter");
                Ok(None)
            }
            _ => Err(err).context("Failed to seed admin account"),
        },
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

    #[tokio::test]
    async fn seeds_exactly_one_admin_from_empty() {
        let store = Store::with_pool_options("sqlite::memory:", 1, 1)
            .await
            .unwrap();

        let seeded = ensure_admin(&store, &fast_security()).await.unwrap();
        let seeded = seeded.expect("admin should be seeded");
        assert_eq!(seeded.username, DEFAULT_ADMIN_USERNAME);
        assert_eq!(seeded.api_key.len(), 64);

        assert_eq!(store.count_accounts_by_role(Role::Admin).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn existing_admin_makes_it_a_noop() {
        let store = Store::with_pool_options("sqlite::memory:", 1, 1)
            .await
            .unwrap();
        let security = fast_security();

        ensure_admin(&store, &security).await.unwrap();
        let second = ensure_admin(&store, &security).await.unwrap();

        assert!(second.is_none());
        assert_eq!(store.count_accounts_by_role(Role::Admin).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn seeded_admin_can_log_in_with_default_password() {
        let store = Store::with_pool_options("sqlite::memory:", 1, 1)
            .await
            .unwrap();
        let security = fast_security();

        ensure_admin(&store, &security).await.unwrap();

        let svc = crate::services::AccountService::new(store, security);
        let account = svc
            .verify_credentials(DEFAULT_ADMIN_USERNAME, DEFAULT_ADMIN_PASSWORD)
            .await
            .unwrap()
            .expect("default credentials should verify");
        assert_eq!(account.role, Role::Admin);
    }
}
