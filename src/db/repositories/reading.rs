use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, QueryOrder, Set};

use crate::entities::sensor_readings;

/// Repository for sensor reading rows. Readings are immutable once written.
pub struct ReadingRepository {
    conn: DatabaseConnection,
}

impl ReadingRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Insert a reading, stamping it with the current time
    pub async fn insert(
        &self,
        temperature: f64,
        humidity: f64,
    ) -> Result<sensor_readings::Model, DbErr> {
        let active = sensor_readings::ActiveModel {
            temperature: Set(temperature),
            humidity: Set(humidity),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        active.insert(&self.conn).await
    }

    /// List all readings in insertion order
    pub async fn list(&self) -> Result<Vec<sensor_readings::Model>, DbErr> {
        sensor_readings::Entity::find()
            .order_by_asc(sensor_readings::Column::Id)
            .all(&self.conn)
            .await
    }
}
