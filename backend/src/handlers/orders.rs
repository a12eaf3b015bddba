use crate::error::AppError;
use crate::services::OrderService;
use actix_web::{web, HttpResponse, Result};
use grocery_platform_shared::constants::SUCCESS_ORDER_PLACED;
use grocery_platform_shared::{OrderPlacedResponse, PlaceOrderRequest};
use tracing::debug;
use uuid::Uuid;
use validator::Validate;

/// Place an order for a selected delivery slot.
///
/// The slot the customer picked may have filled since it was displayed;
/// admission re-validates capacity and answers 409 `slot_full` when the
/// race was lost.
pub async fn place_order(
    request: web::Json<PlaceOrderRequest>,
    order_service: web::Data<OrderService>,
) -> Result<HttpResponse, AppError> {
    request.validate()?;

    debug!(
        "Placing order for {} {}",
        request.delivery_date, request.delivery_time_slot
    );

    let order = order_service.place_order(request.into_inner()).await?;

    Ok(HttpResponse::Created().json(OrderPlacedResponse {
        order,
        message: SUCCESS_ORDER_PLACED.to_string(),
    }))
}

/// Look up an order for tracking.
pub async fn get_order(
    order_id: web::Path<Uuid>,
    order_service: web::Data<OrderService>,
) -> Result<HttpResponse, AppError> {
    let order = order_service.get_order(*order_id).await?;

    Ok(HttpResponse::Ok().json(order))
}
