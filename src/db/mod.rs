use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::entities::sensor_readings;

pub mod migrator;
pub mod repositories;

pub use repositories::account::{Account, AccountChanges, NewAccount, Role};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn account_repo(&self) -> repositories::account::AccountRepository {
        repositories::account::AccountRepository::new(self.conn.clone())
    }

    fn reading_repo(&self) -> repositories::reading::ReadingRepository {
        repositories::reading::ReadingRepository::new(self.conn.clone())
    }

    // ========== Account Repository Methods ==========

    pub async fn find_account_by_username(&self, username: &str) -> Result<Option<Account>, DbErr> {
        self.account_repo().find_by_username(username).await
    }

    pub async fn find_account_by_username_with_password(
        &self,
        username: &str,
    ) -> Result<Option<(Account, String)>, DbErr> {
        self.account_repo()
            .find_by_username_with_password(username)
            .await
    }

    pub async fn find_account_by_api_key(&self, api_key: &str) -> Result<Option<Account>, DbErr> {
        self.account_repo().find_by_api_key(api_key).await
    }

    pub async fn find_account_by_id(&self, id: i32) -> Result<Option<Account>, DbErr> {
        self.account_repo().find_by_id(id).await
    }

    pub async fn list_accounts(&self) -> Result<Vec<Account>, DbErr> {
        self.account_repo().list().await
    }

    pub async fn count_accounts_by_role(&self, role: Role) -> Result<u64, DbErr> {
        self.account_repo().count_by_role(role).await
    }

    pub async fn insert_account(&self, new: NewAccount) -> Result<Account, DbErr> {
        self.account_repo().insert(new).await
    }

    pub async fn update_account(
        &self,
        id: i32,
        changes: AccountChanges,
    ) -> Result<Option<Account>, DbErr> {
        self.account_repo().update(id, changes).await
    }

    // ========== Reading Repository Methods ==========

    pub async fn insert_reading(
        &self,
        temperature: f64,
        humidity: f64,
    ) -> Result<sensor_readings::Model, DbErr> {
        self.reading_repo().insert(temperature, humidity).await
    }

    pub async fn list_readings(&self) -> Result<Vec<sensor_readings::Model>, DbErr> {
        self.reading_repo().list().await
    }
}
