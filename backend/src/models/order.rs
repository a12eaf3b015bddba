use crate::error::AppError;
use chrono::{DateTime, NaiveDate, Utc};
use grocery_platform_shared::{OrderResponse, OrderStatus, PlaceOrderRequest};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub delivery_address: String,
    pub delivery_date: NaiveDate,
    pub delivery_time_slot: String,
    pub delivery_window_id: Option<Uuid>,
    pub status: OrderStatus,
    pub total: Decimal,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const ORDER_COLUMNS: &str = "id, customer_name, customer_email, customer_phone, delivery_address, \
     delivery_date, delivery_time_slot, delivery_window_id, status, total, notes, \
     created_at, updated_at";

impl Order {
    /// Insert a new order. Takes any executor so the admission gate can run
    /// it inside its slot-locked transaction.
    pub async fn create<'e, E>(
        executor: E,
        request: &PlaceOrderRequest,
        delivery_window_id: Option<Uuid>,
    ) -> Result<Self, AppError>
    where
        E: sqlx::PgExecutor<'e>,
    {
        let order = sqlx::query_as::<_, Order>(&format!(
            r#"
            INSERT INTO orders (customer_name, customer_email, customer_phone, delivery_address,
                                delivery_date, delivery_time_slot, delivery_window_id, total, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(&request.customer_name)
        .bind(&request.customer_email)
        .bind(&request.customer_phone)
        .bind(&request.delivery_address)
        .bind(request.delivery_date)
        .bind(&request.delivery_time_slot)
        .bind(delivery_window_id)
        .bind(request.total)
        .bind(&request.notes)
        .fetch_one(executor)
        .await?;

        Ok(order)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, AppError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(order)
    }

    /// Orders for a delivery date, dispatch view ordering.
    pub async fn find_by_date(pool: &PgPool, date: NaiveDate) -> Result<Vec<Self>, AppError> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE delivery_date = $1 ORDER BY delivery_time_slot, created_at"
        ))
        .bind(date)
        .fetch_all(pool)
        .await?;

        Ok(orders)
    }

    /// Count of orders occupying a slot: matching date and time-slot string,
    /// any status except cancelled. Runs on a pool or an open transaction;
    /// the admission gate relies on re-running it under its lock.
    pub async fn count_for_slot<'e, E>(
        executor: E,
        date: NaiveDate,
        time_slot: &str,
    ) -> Result<i64, AppError>
    where
        E: sqlx::PgExecutor<'e>,
    {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM orders
            WHERE delivery_date = $1 AND delivery_time_slot = $2 AND status <> 'cancelled'
            "#,
        )
        .bind(date)
        .bind(time_slot)
        .fetch_one(executor)
        .await?;

        Ok(count)
    }

    /// Occupancy for every slot across a set of dates in one aggregate
    /// query, keyed by (date, time-slot string). Slots with no orders are
    /// simply absent.
    pub async fn counts_by_slot(
        pool: &PgPool,
        dates: &[NaiveDate],
    ) -> Result<HashMap<(NaiveDate, String), i64>, AppError> {
        let rows = sqlx::query_as::<_, (NaiveDate, String, i64)>(
            r#"
            SELECT delivery_date, delivery_time_slot, COUNT(*)
            FROM orders
            WHERE delivery_date = ANY($1) AND status <> 'cancelled'
            GROUP BY delivery_date, delivery_time_slot
            "#,
        )
        .bind(dates)
        .fetch_all(pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(date, slot, count)| ((date, slot), count))
            .collect())
    }

    /// Update order status. Takes any executor; un-cancel transitions must
    /// run inside the admission gate's transaction.
    pub async fn update_status<'e, E>(
        executor: E,
        id: Uuid,
        status: OrderStatus,
    ) -> Result<Option<Self>, AppError>
    where
        E: sqlx::PgExecutor<'e>,
    {
        let order = sqlx::query_as::<_, Order>(&format!(
            r#"
            UPDATE orders SET status = $1, updated_at = NOW()
            WHERE id = $2
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(status)
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(order)
    }

    pub fn to_response(&self) -> OrderResponse {
        OrderResponse {
            id: self.id,
            customer_name: self.customer_name.clone(),
            customer_email: self.customer_email.clone(),
            customer_phone: self.customer_phone.clone(),
            delivery_address: self.delivery_address.clone(),
            delivery_date: self.delivery_date,
            delivery_time_slot: self.delivery_time_slot.clone(),
            delivery_window_id: self.delivery_window_id,
            status: self.status,
            total: self.total,
            notes: self.notes.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
