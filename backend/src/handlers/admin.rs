use crate::error::AppError;
use crate::models::{DeliverySettings, DeliveryWindow};
use crate::services::OrderService;
use actix_web::{web, HttpResponse, Result};
use chrono::NaiveDate;
use grocery_platform_shared::{
    CreateDeliveryWindowRequest, UpdateDeliverySettingsRequest, UpdateDeliveryWindowRequest,
    UpdateOrderStatusRequest,
};
use serde::Deserialize;
use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize)]
pub struct ToggleWindowRequest {
    pub is_active: bool,
}

#[derive(Debug, Deserialize)]
pub struct AdminOrderQuery {
    pub date: NaiveDate,
}

// Delivery window management

pub async fn list_delivery_windows(pool: web::Data<PgPool>) -> Result<HttpResponse, AppError> {
    let windows = DeliveryWindow::find_all(pool.get_ref()).await?;
    let responses: Vec<_> = windows.iter().map(DeliveryWindow::to_response).collect();

    Ok(HttpResponse::Ok().json(responses))
}

pub async fn create_delivery_window(
    request: web::Json<CreateDeliveryWindowRequest>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    request.validate()?;

    let window = DeliveryWindow::create(pool.get_ref(), request.into_inner()).await?;

    info!("Created delivery window '{}' ({})", window.name, window.time_slot());

    Ok(HttpResponse::Created().json(window.to_response()))
}

pub async fn update_delivery_window(
    window_id: web::Path<Uuid>,
    request: web::Json<UpdateDeliveryWindowRequest>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    request.validate()?;

    let window = DeliveryWindow::update(pool.get_ref(), *window_id, request.into_inner()).await?;

    info!("Updated delivery window '{}' ({})", window.name, window.time_slot());

    Ok(HttpResponse::Ok().json(window.to_response()))
}

pub async fn toggle_delivery_window(
    window_id: web::Path<Uuid>,
    request: web::Json<ToggleWindowRequest>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let window = DeliveryWindow::set_active(pool.get_ref(), *window_id, request.is_active).await?;

    info!(
        "Delivery window '{}' is now {}",
        window.name,
        if window.is_active { "active" } else { "inactive" }
    );

    Ok(HttpResponse::Ok().json(window.to_response()))
}

pub async fn delete_delivery_window(
    window_id: web::Path<Uuid>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    DeliveryWindow::delete(pool.get_ref(), *window_id).await?;

    info!("Deleted delivery window {}", window_id);

    Ok(HttpResponse::NoContent().finish())
}

// Delivery settings

pub async fn get_delivery_settings(pool: web::Data<PgPool>) -> Result<HttpResponse, AppError> {
    let settings = DeliverySettings::load(pool.get_ref()).await?;

    Ok(HttpResponse::Ok().json(settings.to_response()))
}

pub async fn update_delivery_settings(
    request: web::Json<UpdateDeliverySettingsRequest>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    request.validate()?;

    let settings = DeliverySettings::upsert(
        pool.get_ref(),
        request.cutoff_time,
        request.max_deliveries_per_slot,
    )
    .await?;

    info!(
        "Updated delivery settings: cutoff {}, {} per slot",
        settings.cutoff_time, settings.max_deliveries_per_slot
    );

    Ok(HttpResponse::Ok().json(settings.to_response()))
}

// Order management

/// Orders for one delivery date, dispatch view.
pub async fn list_orders(
    query: web::Query<AdminOrderQuery>,
    order_service: web::Data<OrderService>,
) -> Result<HttpResponse, AppError> {
    debug!("Listing orders for {}", query.date);

    let orders = order_service.orders_for_date(query.date).await?;

    Ok(HttpResponse::Ok().json(orders))
}

/// Change an order's status. Moving an order out of `cancelled` re-runs
/// slot admission and can answer 409 `slot_full`.
pub async fn update_order_status(
    order_id: web::Path<Uuid>,
    request: web::Json<UpdateOrderStatusRequest>,
    order_service: web::Data<OrderService>,
) -> Result<HttpResponse, AppError> {
    let order = order_service.update_status(*order_id, request.status).await?;

    Ok(HttpResponse::Ok().json(order))
}
