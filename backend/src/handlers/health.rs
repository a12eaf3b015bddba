use crate::database::Database;
use crate::error::AppError;
use actix_web::{get, web, HttpResponse, Result};
use serde_json::json;

#[get("/health")]
pub async fn health_check(database: web::Data<Database>) -> Result<HttpResponse, AppError> {
    let db_health = database.health_check().await?;

    Ok(HttpResponse::Ok().json(json!({
        "status": if db_health.is_healthy { "healthy" } else { "degraded" },
        "service": "grocery-platform-backend",
        "version": env!("CARGO_PKG_VERSION"),
        "database": {
            "healthy": db_health.is_healthy,
            "response_time_ms": db_health.response_time.as_millis() as u64,
        }
    })))
}
