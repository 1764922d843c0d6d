//! API-key authentication and role authorization.

use sea_orm::DbErr;
use thiserror::Error;

use crate::db::{Account, Role, Store};

/// Authentication failures. `InvalidKey` and `Forbidden` are
/// client-attributable and terminal for the request; `Storage` is an
/// internal-server condition and must never be treated as a grant.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid API key")]
    InvalidKey,

    #[error("admin access required")]
    Forbidden,

    #[error("account lookup failed: {0}")]
    Storage(#[from] DbErr),
}

/// Resolves a presented API key to an account and enforces role sufficiency.
///
/// Read-only; safe to call on every request. Results are not cached across
/// requests.
pub struct Authenticator {
    store: Store,
}

impl Authenticator {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn authenticate(
        &self,
        presented_key: &str,
        min_role: Role,
    ) -> Result<Account, AuthError> {
        if presented_key.is_empty() {
            return Err(AuthError::InvalidKey);
        }

        let account = self
            .store
            .find_account_by_api_key(presented_key)
            .await?
            .ok_or(AuthError::InvalidKey)?;

        if min_role == Role::Admin && account.role != Role::Admin {
            return Err(AuthError::Forbidden);
        }

        Ok(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::NewAccount;

    async fn store_with_accounts() -> (Store, String, String) {
        let store = Store::with_pool_options("sqlite::memory:", 1, 1)
            .await
            .expect("in-memory store");

        let admin_key = crate::services::password::generate_api_key();
        store
            .insert_account(NewAccount {
                username: "boss".to_string(),
                password_hash: "$argon2id$test".to_string(),
                role: Role::Admin,
                api_key: admin_key.clone(),
            })
            .await
            .unwrap();

        let user_key = crate::services::password::generate_api_key();
        store
            .insert_account(NewAccount {
                username: "sensor01".to_string(),
                password_hash: "$argon2id$test".to_string(),
                role: Role::User,
                api_key: user_key.clone(),
            })
            .await
            .unwrap();

        (store, admin_key, user_key)
    }

    #[tokio::test]
    async fn empty_key_is_rejected_without_lookup() {
        let (store, _, _) = store_with_accounts().await;
        let auth = Authenticator::new(store);

        assert!(matches!(
            auth.authenticate("", Role::User).await,
            Err(AuthError::InvalidKey)
        ));
        assert!(matches!(
            auth.authenticate("", Role::Admin).await,
            Err(AuthError::InvalidKey)
        ));
    }

    #[tokio::test]
    async fn unknown_key_is_rejected() {
        let (store, _, _) = store_with_accounts().await;
        let auth = Authenticator::new(store);

        assert!(matches!(
            auth.authenticate("not-a-real-key", Role::User).await,
            Err(AuthError::InvalidKey)
        ));
    }

    #[tokio::test]
    async fn user_key_passes_user_gate_but_not_admin_gate() {
        let (store, _, user_key) = store_with_accounts().await;
        let auth = Authenticator::new(store);

        let account = auth.authenticate(&user_key, Role::User).await.unwrap();
        assert_eq!(account.username, "sensor01");

        assert!(matches!(
            auth.authenticate(&user_key, Role::Admin).await,
            Err(AuthError::Forbidden)
        ));
    }

    #[tokio::test]
    async fn admin_key_passes_both_gates() {
        let (store, admin_key, _) = store_with_accounts().await;
        let auth = Authenticator::new(store);

        assert_eq!(
            auth.authenticate(&admin_key, Role::User)
                .await
                .unwrap()
                .role,
            Role::Admin
        );
        assert_eq!(
            auth.authenticate(&admin_key, Role::Admin)
                .await
                .unwrap()
                .username,
            "boss"
        );
    }
}
