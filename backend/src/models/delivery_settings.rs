use crate::error::AppError;
use chrono::{DateTime, NaiveTime, Utc};
use grocery_platform_shared::constants::{
    FALLBACK_CUTOFF_HOUR, FALLBACK_CUTOFF_MINUTE, FALLBACK_SLOT_CAPACITY,
};
use grocery_platform_shared::DeliverySettingsResponse;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

/// Store-wide delivery settings. A single row; absence falls back to the
/// hardcoded defaults.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DeliverySettings {
    pub cutoff_time: NaiveTime,
    pub max_deliveries_per_slot: i32,
    pub updated_at: Option<DateTime<Utc>>,
}

impl DeliverySettings {
    /// Load the settings singleton, substituting defaults when the row has
    /// never been written. A query failure is an error for the caller to
    /// handle; it is never silently mapped to defaults here so the
    /// admission path can stay conservative.
    pub async fn load(pool: &PgPool) -> Result<Self, AppError> {
        let settings = sqlx::query_as::<_, DeliverySettings>(
            "SELECT cutoff_time, max_deliveries_per_slot, updated_at FROM delivery_settings WHERE id = TRUE",
        )
        .fetch_optional(pool)
        .await?;

        Ok(settings.unwrap_or_else(Self::fallback))
    }

    /// Create or replace the settings singleton
    pub async fn upsert(
        pool: &PgPool,
        cutoff_time: NaiveTime,
        max_deliveries_per_slot: i32,
    ) -> Result<Self, AppError> {
        let settings = sqlx::query_as::<_, DeliverySettings>(
            r#"
            INSERT INTO delivery_settings (id, cutoff_time, max_deliveries_per_slot)
            VALUES (TRUE, $1, $2)
            ON CONFLICT (id)
            DO UPDATE SET
                cutoff_time = EXCLUDED.cutoff_time,
                max_deliveries_per_slot = EXCLUDED.max_deliveries_per_slot,
                updated_at = NOW()
            RETURNING cutoff_time, max_deliveries_per_slot, updated_at
            "#,
        )
        .bind(cutoff_time)
        .bind(max_deliveries_per_slot)
        .fetch_one(pool)
        .await?;

        Ok(settings)
    }

    /// Hardcoded defaults: 13:00 cutoff, 15 deliveries per slot.
    pub fn fallback() -> Self {
        Self {
            cutoff_time: NaiveTime::from_hms_opt(FALLBACK_CUTOFF_HOUR, FALLBACK_CUTOFF_MINUTE, 0)
                .unwrap_or(NaiveTime::MIN),
            max_deliveries_per_slot: FALLBACK_SLOT_CAPACITY,
            updated_at: None,
        }
    }

    pub fn to_response(&self) -> DeliverySettingsResponse {
        DeliverySettingsResponse {
            cutoff_time: self.cutoff_time,
            max_deliveries_per_slot: self.max_deliveries_per_slot,
            updated_at: self.updated_at,
        }
    }
}
