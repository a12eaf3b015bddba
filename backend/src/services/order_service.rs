use crate::error::AppError;
use crate::models::{DeliverySettings, DeliveryWindow, Order};
use crate::services::scheduling_service::{effective_capacity, SchedulingService};
use chrono::NaiveDate;
use grocery_platform_shared::constants::ERROR_ORDER_NOT_FOUND;
use grocery_platform_shared::{OrderResponse, OrderStatus, PlaceOrderRequest};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{info, warn};
use uuid::Uuid;

/// Order admission and lifecycle service.
///
/// The write path is the one place the capacity invariant has teeth: the
/// slot listing a customer saw may be stale by the time checkout submits,
/// so admission re-checks occupancy and inserts inside a single
/// slot-locked transaction.
#[derive(Clone)]
pub struct OrderService {
    db_pool: PgPool,
    scheduling: SchedulingService,
}

impl OrderService {
    pub fn new(db_pool: PgPool, scheduling: SchedulingService) -> Self {
        Self { db_pool, scheduling }
    }

    /// Admit and create an order.
    ///
    /// Serializes against all other admissions for the same
    /// (delivery_date, delivery_time_slot) pair via a transaction-scoped
    /// advisory lock, then re-counts occupancy and inserts. Concurrent
    /// checkouts at the capacity boundary therefore cannot overbook: the
    /// non-cancelled order count for a slot never exceeds its effective
    /// capacity.
    pub async fn place_order(&self, request: PlaceOrderRequest) -> Result<OrderResponse, AppError> {
        if request.total < rust_decimal::Decimal::ZERO {
            return Err(AppError::Validation(
                "order total cannot be negative".to_string(),
            ));
        }

        let (window, settings) = self
            .scheduling
            .resolve_slot_for_admission(request.delivery_date, &request.delivery_time_slot)
            .await?;

        let capacity = effective_capacity(&window, &settings) as i64;
        // Built-in fallback windows have no catalog row to reference.
        let window_id = (!window.is_builtin()).then_some(window.id);

        let mut tx = self.db_pool.begin().await?;
        lock_slot(&mut tx, request.delivery_date, &request.delivery_time_slot).await?;

        let used = Order::count_for_slot(
            &mut *tx,
            request.delivery_date,
            &request.delivery_time_slot,
        )
        .await?;

        if used >= capacity {
            tx.rollback().await?;
            info!(
                "Rejected order for {} {}: slot full ({}/{})",
                request.delivery_date, request.delivery_time_slot, used, capacity
            );
            return Err(AppError::SlotFull {
                date: request.delivery_date,
                time_slot: request.delivery_time_slot.clone(),
            });
        }

        let order = Order::create(&mut *tx, &request, window_id).await?;
        tx.commit().await?;

        info!(
            "Admitted order {} into {} {} ({}/{})",
            order.id,
            order.delivery_date,
            order.delivery_time_slot,
            used + 1,
            capacity
        );

        Ok(order.to_response())
    }

    pub async fn get_order(&self, id: Uuid) -> Result<OrderResponse, AppError> {
        let order = Order::find_by_id(&self.db_pool, id)
            .await?
            .ok_or_else(|| AppError::NotFound(ERROR_ORDER_NOT_FOUND.to_string()))?;

        Ok(order.to_response())
    }

    /// Orders for one delivery date (admin dispatch view).
    pub async fn orders_for_date(&self, date: NaiveDate) -> Result<Vec<OrderResponse>, AppError> {
        let orders = Order::find_by_date(&self.db_pool, date).await?;
        Ok(orders.iter().map(Order::to_response).collect())
    }

    /// Change an order's status.
    ///
    /// Cancelling releases the slot implicitly (occupancy is a live count
    /// filtered on status). The reverse transition re-occupies a slot, so
    /// moving an order out of `cancelled` runs back through the admission
    /// gate before the status flips.
    pub async fn update_status(
        &self,
        id: Uuid,
        new_status: OrderStatus,
    ) -> Result<OrderResponse, AppError> {
        let order = Order::find_by_id(&self.db_pool, id)
            .await?
            .ok_or_else(|| AppError::NotFound(ERROR_ORDER_NOT_FOUND.to_string()))?;

        if order.status == new_status {
            return Ok(order.to_response());
        }

        let reoccupies_slot =
            order.status == OrderStatus::Cancelled && new_status.counts_against_capacity();

        if reoccupies_slot {
            return self.readmit_order(order, new_status).await;
        }

        let updated = Order::update_status(&self.db_pool, id, new_status)
            .await?
            .ok_or_else(|| AppError::NotFound(ERROR_ORDER_NOT_FOUND.to_string()))?;

        info!("Order {} status: {} -> {}", id, order.status, new_status);

        Ok(updated.to_response())
    }

    /// Un-cancel path: same lock, same recount, before the order starts
    /// counting against its slot again.
    async fn readmit_order(
        &self,
        order: Order,
        new_status: OrderStatus,
    ) -> Result<OrderResponse, AppError> {
        let capacity = self.capacity_for_order_slot(&order).await? as i64;

        let mut tx = self.db_pool.begin().await?;
        lock_slot(&mut tx, order.delivery_date, &order.delivery_time_slot).await?;

        let used =
            Order::count_for_slot(&mut *tx, order.delivery_date, &order.delivery_time_slot)
                .await?;

        if used >= capacity {
            tx.rollback().await?;
            warn!(
                "Refused to un-cancel order {}: slot {} {} is full ({}/{})",
                order.id, order.delivery_date, order.delivery_time_slot, used, capacity
            );
            return Err(AppError::SlotFull {
                date: order.delivery_date,
                time_slot: order.delivery_time_slot.clone(),
            });
        }

        let updated = Order::update_status(&mut *tx, order.id, new_status)
            .await?
            .ok_or_else(|| AppError::NotFound(ERROR_ORDER_NOT_FOUND.to_string()))?;
        tx.commit().await?;

        info!(
            "Order {} status: {} -> {} (re-admitted into {} {})",
            order.id, order.status, new_status, order.delivery_date, order.delivery_time_slot
        );

        Ok(updated.to_response())
    }

    /// Effective capacity for the slot an existing order occupies. Prefers
    /// the stable window reference; historical orders whose window row is
    /// gone fall back to the store-wide default.
    async fn capacity_for_order_slot(&self, order: &Order) -> Result<i32, AppError> {
        let settings = DeliverySettings::load(&self.db_pool).await?;

        let window = match order.delivery_window_id {
            Some(window_id) => DeliveryWindow::find_by_id(&self.db_pool, window_id).await?,
            None => None,
        };

        let window = match window {
            Some(window) => Some(window),
            None => DeliveryWindow::find_active(&self.db_pool)
                .await?
                .into_iter()
                .find(|w| w.time_slot() == order.delivery_time_slot),
        };

        Ok(match window {
            Some(window) => effective_capacity(&window, &settings),
            None => settings.max_deliveries_per_slot,
        })
    }
}

/// Transaction-scoped advisory lock on a (date, time-slot) pair.
///
/// `pg_advisory_xact_lock` serializes admissions for one slot across all
/// connections and processes; the lock releases with the transaction, so
/// no explicit unlock (and no leak on rollback) is possible.
async fn lock_slot(
    tx: &mut Transaction<'_, Postgres>,
    date: NaiveDate,
    time_slot: &str,
) -> Result<(), AppError> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
        .bind(format!("{}|{}", date, time_slot))
        .execute(&mut **tx)
        .await?;

    Ok(())
}
