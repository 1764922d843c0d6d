pub use super::accounts::Entity as Accounts;
pub use super::sensor_readings::Entity as SensorReadings;
