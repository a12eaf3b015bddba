use chrono_tz::Tz;
use grocery_platform_shared::constants::{DEFAULT_SLOT_HORIZON_DAYS, DEFAULT_STORE_TIMEZONE};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub store_timezone: String,
    pub slot_horizon_days: u32,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .set_default("host", "127.0.0.1")?
            .set_default("port", 8080)?
            .set_default("store_timezone", DEFAULT_STORE_TIMEZONE)?
            .set_default("slot_horizon_days", DEFAULT_SLOT_HORIZON_DAYS as i64)?
            .add_source(config::Environment::default().try_parsing(true))
            .build()?;

        config.try_deserialize()
    }

    /// Store timezone all delivery cutoff arithmetic runs in. An unknown
    /// zone name fails startup rather than falling back to machine-local
    /// time, which would shift cutoff enforcement with the host.
    pub fn timezone(&self) -> Result<Tz, config::ConfigError> {
        self.store_timezone.parse::<Tz>().map_err(|_| {
            config::ConfigError::Message(format!(
                "invalid store_timezone: {}",
                self.store_timezone
            ))
        })
    }
}
