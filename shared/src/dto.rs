use crate::types::*;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

// Delivery slot DTOs
//
// Slots are derived per request and never persisted; `id` is the composite
// "{date}_{window name}" the frontend uses as a selection key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliverySlotResponse {
    pub id: String,
    pub date: NaiveDate,
    pub time_slot: String,
    pub display_time: String,
    pub available: bool,
    pub capacity: i32,
    pub used: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryDaySlots {
    pub date: NaiveDate,
    pub slots: Vec<DeliverySlotResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotListResponse {
    pub days: Vec<DeliveryDaySlots>,
}

// Order DTOs
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PlaceOrderRequest {
    #[validate(length(min = 1, max = 255))]
    pub customer_name: String,

    #[validate(email)]
    pub customer_email: String,

    #[validate(length(min = 7, max = 20))]
    pub customer_phone: String,

    #[validate(length(min = 1, max = 1000))]
    pub delivery_address: String,

    pub delivery_date: NaiveDate,

    /// "HH:MM-HH:MM", matching a slot returned by the slot listing.
    #[validate(length(min = 11, max = 11))]
    pub delivery_time_slot: String,

    pub total: Decimal,

    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderResponse {
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

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderPlacedResponse {
    pub order: OrderResponse,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

// Delivery window DTOs (admin surface)
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateDeliveryWindowRequest {
    #[validate(length(min = 1, max = 50))]
    pub name: String,

    #[validate(length(min = 1, max = 100))]
    pub display_name: String,

    pub start_time: NaiveTime,
    pub end_time: NaiveTime,

    #[validate(range(min = 1, max = 1000))]
    pub max_deliveries: Option<i32>,

    pub sort_order: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateDeliveryWindowRequest {
    #[validate(length(min = 1, max = 100))]
    pub display_name: Option<String>,

    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,

    #[validate(range(min = 1, max = 1000))]
    pub max_deliveries: Option<i32>,

    pub sort_order: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryWindowResponse {
    pub id: Uuid,
    pub name: String,
    pub display_name: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub time_slot: String,
    pub max_deliveries: Option<i32>,
    pub is_active: bool,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Delivery settings DTOs (admin surface)
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateDeliverySettingsRequest {
    pub cutoff_time: NaiveTime,

    #[validate(range(min = 1, max = 1000))]
    pub max_deliveries_per_slot: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliverySettingsResponse {
    pub cutoff_time: NaiveTime,
    pub max_deliveries_per_slot: i32,
    pub updated_at: Option<DateTime<Utc>>,
}

