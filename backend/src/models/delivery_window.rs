use crate::error::AppError;
use chrono::{DateTime, NaiveTime, Utc};
use grocery_platform_shared::constants::{BUILTIN_WINDOWS, ERROR_WINDOW_IN_USE, ERROR_WINDOW_NOT_FOUND};
use grocery_platform_shared::{CreateDeliveryWindowRequest, DeliveryWindowResponse, UpdateDeliveryWindowRequest};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DeliveryWindow {
    pub id: Uuid,
    pub name: String,
    pub display_name: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub max_deliveries: Option<i32>,
    pub is_active: bool,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DeliveryWindow {
    /// Active windows ordered by start time. Ordering is deliberately a
    /// function of the time of day, not `sort_order`, so "next window to
    /// start" logic holds however admins reorder records.
    pub async fn find_active(pool: &PgPool) -> Result<Vec<Self>, AppError> {
        let windows = sqlx::query_as::<_, DeliveryWindow>(
            r#"
            SELECT id, name, display_name, start_time, end_time, max_deliveries,
                   is_active, sort_order, created_at, updated_at
            FROM delivery_windows
            WHERE is_active = TRUE
            ORDER BY start_time ASC
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(windows)
    }

    /// All windows for the admin back-office, active or not.
    pub async fn find_all(pool: &PgPool) -> Result<Vec<Self>, AppError> {
        let windows = sqlx::query_as::<_, DeliveryWindow>(
            r#"
            SELECT id, name, display_name, start_time, end_time, max_deliveries,
                   is_active, sort_order, created_at, updated_at
            FROM delivery_windows
            ORDER BY start_time ASC
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(windows)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, AppError> {
        let window = sqlx::query_as::<_, DeliveryWindow>(
            r#"
            SELECT id, name, display_name, start_time, end_time, max_deliveries,
                   is_active, sort_order, created_at, updated_at
            FROM delivery_windows
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(window)
    }

    /// Create a new delivery window
    pub async fn create(
        pool: &PgPool,
        request: CreateDeliveryWindowRequest,
    ) -> Result<Self, AppError> {
        Self::validate_time_range(request.start_time, request.end_time)?;

        let existing = Self::find_active(pool).await?;
        Self::validate_no_overlap(request.start_time, request.end_time, None, &existing)?;

        let window = sqlx::query_as::<_, DeliveryWindow>(
            r#"
            INSERT INTO delivery_windows (name, display_name, start_time, end_time, max_deliveries, sort_order)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, display_name, start_time, end_time, max_deliveries,
                      is_active, sort_order, created_at, updated_at
            "#,
        )
        .bind(&request.name)
        .bind(&request.display_name)
        .bind(request.start_time)
        .bind(request.end_time)
        .bind(request.max_deliveries)
        .bind(request.sort_order.unwrap_or(0))
        .fetch_one(pool)
        .await?;

        Ok(window)
    }

    /// Update an existing delivery window
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        request: UpdateDeliveryWindowRequest,
    ) -> Result<Self, AppError> {
        let current = Self::find_by_id(pool, id)
            .await?
            .ok_or_else(|| AppError::NotFound(ERROR_WINDOW_NOT_FOUND.to_string()))?;

        let start_time = request.start_time.unwrap_or(current.start_time);
        let end_time = request.end_time.unwrap_or(current.end_time);
        Self::validate_time_range(start_time, end_time)?;

        let existing = Self::find_active(pool).await?;
        Self::validate_no_overlap(start_time, end_time, Some(id), &existing)?;

        let window = sqlx::query_as::<_, DeliveryWindow>(
            r#"
            UPDATE delivery_windows
            SET display_name = $1, start_time = $2, end_time = $3,
                max_deliveries = $4, sort_order = $5, updated_at = NOW()
            WHERE id = $6
            RETURNING id, name, display_name, start_time, end_time, max_deliveries,
                      is_active, sort_order, created_at, updated_at
            "#,
        )
        .bind(request.display_name.unwrap_or(current.display_name))
        .bind(start_time)
        .bind(end_time)
        .bind(request.max_deliveries.or(current.max_deliveries))
        .bind(request.sort_order.unwrap_or(current.sort_order))
        .bind(id)
        .fetch_one(pool)
        .await?;

        Ok(window)
    }

    /// Toggle the active flag
    pub async fn set_active(pool: &PgPool, id: Uuid, is_active: bool) -> Result<Self, AppError> {
        // Re-activating a window must not introduce an overlap that was
        // created while it sat inactive.
        if is_active {
            let current = Self::find_by_id(pool, id)
                .await?
                .ok_or_else(|| AppError::NotFound(ERROR_WINDOW_NOT_FOUND.to_string()))?;
            let existing = Self::find_active(pool).await?;
            Self::validate_no_overlap(current.start_time, current.end_time, Some(id), &existing)?;
        }

        let window = sqlx::query_as::<_, DeliveryWindow>(
            r#"
            UPDATE delivery_windows
            SET is_active = $1, updated_at = NOW()
            WHERE id = $2
            RETURNING id, name, display_name, start_time, end_time, max_deliveries,
                      is_active, sort_order, created_at, updated_at
            "#,
        )
        .bind(is_active)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(ERROR_WINDOW_NOT_FOUND.to_string()))?;

        Ok(window)
    }

    /// Delete a window. Refused while orders reference it, either by the
    /// stable id or by the derived time-slot string historical orders carry.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<(), AppError> {
        let window = Self::find_by_id(pool, id)
            .await?
            .ok_or_else(|| AppError::NotFound(ERROR_WINDOW_NOT_FOUND.to_string()))?;

        let referencing: i64 = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM orders WHERE delivery_window_id = $1 OR delivery_time_slot = $2",
        )
        .bind(id)
        .bind(window.time_slot())
        .fetch_one(pool)
        .await?;

        if referencing > 0 {
            return Err(AppError::Conflict(ERROR_WINDOW_IN_USE.to_string()));
        }

        sqlx::query("DELETE FROM delivery_windows WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(())
    }

    /// Built-in fallback windows for a fresh install or a failed catalog
    /// read. Synthetic (nil id, never persisted); capacity defers to the
    /// global default.
    pub fn builtin_defaults() -> Vec<Self> {
        let now = Utc::now();
        BUILTIN_WINDOWS
            .iter()
            .enumerate()
            .filter_map(|(i, &(name, display_name, start_hour, end_hour))| {
                let start_time = NaiveTime::from_hms_opt(start_hour, 0, 0)?;
                let end_time = NaiveTime::from_hms_opt(end_hour, 0, 0)?;
                Some(Self {
                    id: Uuid::nil(),
                    name: name.to_string(),
                    display_name: display_name.to_string(),
                    start_time,
                    end_time,
                    max_deliveries: None,
                    is_active: true,
                    sort_order: i as i32,
                    created_at: now,
                    updated_at: now,
                })
            })
            .collect()
    }

    /// The "HH:MM-HH:MM" key orders are stored under.
    pub fn time_slot(&self) -> String {
        format!(
            "{}-{}",
            self.start_time.format("%H:%M"),
            self.end_time.format("%H:%M")
        )
    }

    /// Human-readable label, e.g. "11:00 AM - 3:00 PM".
    pub fn display_time(&self) -> String {
        format!(
            "{} - {}",
            self.start_time.format("%-I:%M %p"),
            self.end_time.format("%-I:%M %p")
        )
    }

    /// Whether this window was synthesized from the built-in defaults
    /// rather than loaded from the catalog.
    pub fn is_builtin(&self) -> bool {
        self.id.is_nil()
    }

    pub fn to_response(&self) -> DeliveryWindowResponse {
        DeliveryWindowResponse {
            id: self.id,
            name: self.name.clone(),
            display_name: self.display_name.clone(),
            start_time: self.start_time,
            end_time: self.end_time,
            time_slot: self.time_slot(),
            max_deliveries: self.max_deliveries,
            is_active: self.is_active,
            sort_order: self.sort_order,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    fn validate_time_range(start: NaiveTime, end: NaiveTime) -> Result<(), AppError> {
        if start >= end {
            return Err(AppError::Validation(
                "start_time must precede end_time".to_string(),
            ));
        }
        Ok(())
    }

    fn validate_no_overlap(
        start: NaiveTime,
        end: NaiveTime,
        exclude_id: Option<Uuid>,
        active_windows: &[Self],
    ) -> Result<(), AppError> {
        for other in active_windows {
            if Some(other.id) == exclude_id {
                continue;
            }
            if start < other.end_time && other.start_time < end {
                return Err(AppError::Validation(format!(
                    "time range overlaps active window '{}' ({})",
                    other.name,
                    other.time_slot()
                )));
            }
        }
        Ok(())
    }
}
