use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};

use crate::entities::accounts;

/// Coarse authorization level.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    /// Parse a role name; anything other than `admin`/`user` is rejected.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Self::Admin),
            "user" => Some(Self::User),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::User => "user",
        }
    }
}

/// Account data returned from the repository (without the password hash)
#[derive(Debug, Clone)]
pub struct Account {
    pub id: i32,
    pub username: String,
    pub role: Role,
    pub api_key: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<accounts::Model> for Account {
    fn from(model: accounts::Model) -> Self {
        // An unrecognized role string in storage never grants admin.
        let role = Role::parse(&model.role).unwrap_or(Role::User);
        Self {
            id: model.id,
            username: model.username,
            role,
            api_key: model.api_key,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Insert payload for a new account row.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub api_key: String,
}

/// Partial update; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct AccountChanges {
    pub username: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<Role>,
}

/// Repository for account rows.
///
/// Methods return `DbErr` directly rather than a wrapped error so callers can
/// tell unique-constraint violations (`DbErr::sql_err()`) apart from other
/// storage failures.
pub struct AccountRepository {
    conn: DatabaseConnection,
}

impl AccountRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Get account by username
    pub async fn find_by_username(&self, username: &str) -> Result<Option<Account>, DbErr> {
        let account = accounts::Entity::find()
            .filter(accounts::Column::Username.eq(username))
            .one(&self.conn)
            .await?;

        Ok(account.map(Account::from))
    }

    /// Get account by username along with the stored password hash
    /// (for credential verification only; the hash never leaves the service layer)
    pub async fn find_by_username_with_password(
        &self,
        username: &str,
    ) -> Result<Option<(Account, String)>, DbErr> {
        let account = accounts::Entity::find()
            .filter(accounts::Column::Username.eq(username))
            .one(&self.conn)
            .await?;

        Ok(account.map(|a| {
            let password_hash = a.password_hash.clone();
            (Account::from(a), password_hash)
        }))
    }

    /// Get account by API key (exact match; keys are unique)
    pub async fn find_by_api_key(&self, api_key: &str) -> Result<Option<Account>, DbErr> {
        let account = accounts::Entity::find()
            .filter(accounts::Column::ApiKey.eq(api_key))
            .one(&self.conn)
            .await?;

        Ok(account.map(Account::from))
    }

    /// Get account by ID
    pub async fn find_by_id(&self, id: i32) -> Result<Option<Account>, DbErr> {
        let account = accounts::Entity::find_by_id(id).one(&self.conn).await?;

        Ok(account.map(Account::from))
    }

    /// List all accounts in creation order
    pub async fn list(&self) -> Result<Vec<Account>, DbErr> {
        let rows = accounts::Entity::find()
            .order_by_asc(accounts::Column::Id)
            .all(&self.conn)
            .await?;

        Ok(rows.into_iter().map(Account::from).collect())
    }

    /// Count accounts holding the given role
    pub async fn count_by_role(&self, role: Role) -> Result<u64, DbErr> {
        accounts::Entity::find()
            .filter(accounts::Column::Role.eq(role.as_str()))
            .count(&self.conn)
            .await
    }

    /// Insert a new account row.
    ///
    /// A duplicate username or API key surfaces as
    /// `SqlErr::UniqueConstraintViolation` via `DbErr::sql_err()`.
    pub async fn insert(&self, new: NewAccount) -> Result<Account, DbErr> {
        let now = chrono::Utc::now().to_rfc3339();

        let active = accounts::ActiveModel {
            username: Set(new.username),
            password_hash: Set(new.password_hash),
            role: Set(new.role.as_str().to_string()),
            api_key: Set(new.api_key),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active.insert(&self.conn).await?;
        Ok(Account::from(model))
    }

    /// Apply a partial update to an account row.
    ///
    /// Returns `Ok(None)` if the id does not resolve to an account.
    pub async fn update(
        &self,
        id: i32,
        changes: AccountChanges,
    ) -> Result<Option<Account>, DbErr> {
        let Some(model) = accounts::Entity::find_by_id(id).one(&self.conn).await? else {
            return Ok(None);
        };

        let mut active: accounts::ActiveModel = model.into();
        if let Some(username) = changes.username {
            active.username = Set(username);
        }
        if let Some(password_hash) = changes.password_hash {
            active.password_hash = Set(password_hash);
        }
        if let Some(role) = changes.role {
            active.role = Set(role.as_str().to_string());
        }
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let model = active.update(&self.conn).await?;
        Ok(Some(Account::from(model)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Store;

    async fn repo() -> AccountRepository {
        let store = Store::with_pool_options("sqlite::memory:", 1, 1)
            .await
            .expect("in-memory store");
        AccountRepository::new(store.conn)
    }

    fn new_account(username: &str, role: Role, api_key: &str) -> NewAccount {
        NewAccount {
            username: username.to_string(),
            password_hash: "$argon2id$test".to_string(),
            role,
            api_key: api_key.to_string(),
        }
    }

    #[tokio::test]
    async fn lookups_roundtrip() {
        let repo = repo().await;
        let inserted = repo
            .insert(new_account("alice", Role::User, "key-alice"))
            .await
            .unwrap();

        assert_eq!(
            repo.find_by_id(inserted.id).await.unwrap().unwrap().username,
            "alice"
        );
        assert_eq!(
            repo.find_by_username("alice").await.unwrap().unwrap().id,
            inserted.id
        );
        assert_eq!(
            repo.find_by_api_key("key-alice").await.unwrap().unwrap().id,
            inserted.id
        );
        assert!(repo.find_by_api_key("other-key").await.unwrap().is_none());
        assert_eq!(repo.count_by_role(Role::Admin).await.unwrap(), 0);
        assert_eq!(repo.count_by_role(Role::User).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn duplicate_username_surfaces_as_unique_violation() {
        let repo = repo().await;
        repo.insert(new_account("bob", Role::Admin, "key-1"))
            .await
            .unwrap();

        let err = repo
            .insert(new_account("bob", Role::Admin, "key-2"))
            .await
            .unwrap_err();
        assert!(matches!(
            err.sql_err(),
            Some(sea_orm::SqlErr::UniqueConstraintViolation(_))
        ));
    }

    #[tokio::test]
    async fn duplicate_api_key_surfaces_as_unique_violation() {
        let repo = repo().await;
        repo.insert(new_account("carol", Role::User, "shared-key"))
            .await
            .unwrap();

        let err = repo
            .insert(new_account("dave", Role::User, "shared-key"))
            .await
            .unwrap_err();
        assert!(matches!(
            err.sql_err(),
            Some(sea_orm::SqlErr::UniqueConstraintViolation(_))
        ));
    }

    #[test]
    fn unknown_role_string_projects_as_user() {
        let model = crate::entities::accounts::Model {
            id: 1,
            username: "x".to_string(),
            password_hash: "h".to_string(),
            role: "superuser".to_string(),
            api_key: "k".to_string(),
            created_at: String::new(),
            updated_at: String::new(),
        };

        assert_eq!(Account::from(model).role, Role::User);
    }
}
