use crate::error::AppError;
use crate::services::SchedulingService;
use actix_web::{web, HttpResponse, Result};
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize)]
pub struct SlotListQuery {
    /// Days beyond today to offer; clamped server-side.
    pub days: Option<u32>,
}

/// List offerable delivery slots grouped by date.
pub async fn list_delivery_slots(
    query: web::Query<SlotListQuery>,
    scheduling: web::Data<SchedulingService>,
) -> Result<HttpResponse, AppError> {
    debug!("Listing delivery slots (days: {:?})", query.days);

    let listing = scheduling.generate_slots(query.days).await?;

    Ok(HttpResponse::Ok().json(listing))
}
