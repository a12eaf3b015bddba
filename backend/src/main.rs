use actix_cors::Cors;
use actix_web::{web, App, HttpServer, Result};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use grocery_platform_backend::config::AppConfig;
use grocery_platform_backend::database::{Database, DatabaseConfig};
use grocery_platform_backend::error::AppError;
use grocery_platform_backend::handlers;
use grocery_platform_backend::services::{
    BusinessCalendar, OrderService, SchedulingService, SystemClock,
};

#[actix_web::main]
async fn main() -> Result<(), AppError> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration; an invalid store timezone fails startup here
    let config = AppConfig::from_env()?;
    let timezone = config.timezone()?;
    info!(
        "Starting Grocery Platform Backend on {}:{} (store timezone: {})",
        config.host, config.port, timezone
    );

    // Initialize database
    let database = Database::new(DatabaseConfig::new(config.database_url.clone())).await?;

    // Run migrations
    database.migrate().await?;

    // Initialize services
    let calendar = BusinessCalendar::new(Arc::new(SystemClock), timezone);
    let scheduling_service = SchedulingService::new(
        database.pool().clone(),
        calendar,
        config.slot_horizon_days,
    );
    let order_service = OrderService::new(database.pool().clone(), scheduling_service.clone());
    let pool = database.pool().clone();

    // Start HTTP server
    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .app_data(web::Data::new(database.clone()))
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(scheduling_service.clone()))
            .app_data(web::Data::new(order_service.clone()))
            .service(
                web::scope("/api/v1")
                    .service(handlers::health::health_check)
                    .service(
                        web::scope("/delivery")
                            .route("/slots", web::get().to(handlers::delivery::list_delivery_slots)),
                    )
                    .service(
                        web::scope("/orders")
                            .route("", web::post().to(handlers::orders::place_order))
                            .route("/{order_id}", web::get().to(handlers::orders::get_order)),
                    )
                    .service(
                        web::scope("/admin")
                            // Delivery window management
                            .route("/delivery-windows", web::get().to(handlers::admin::list_delivery_windows))
                            .route("/delivery-windows", web::post().to(handlers::admin::create_delivery_window))
                            .route("/delivery-windows/{window_id}", web::put().to(handlers::admin::update_delivery_window))
                            .route("/delivery-windows/{window_id}", web::delete().to(handlers::admin::delete_delivery_window))
                            .route("/delivery-windows/{window_id}/toggle", web::put().to(handlers::admin::toggle_delivery_window))
                            // Delivery settings
                            .route("/delivery-settings", web::get().to(handlers::admin::get_delivery_settings))
                            .route("/delivery-settings", web::put().to(handlers::admin::update_delivery_settings))
                            // Order management
                            .route("/orders", web::get().to(handlers::admin::list_orders))
                            .route("/orders/{order_id}/status", web::put().to(handlers::admin::update_order_status)),
                    ),
            )
    })
    .bind(format!("{}:{}", config.host, config.port))?
    .run()
    .await
    .map_err(AppError::from)
}
