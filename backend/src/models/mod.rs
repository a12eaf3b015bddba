//! Database models for the grocery delivery platform.
//!
//! Each model corresponds to a database table and provides type-safe
//! interactions with the database using sqlx.

pub mod delivery_settings;
pub mod delivery_window;
pub mod order;

// Re-export commonly used models
pub use delivery_settings::DeliverySettings;
pub use delivery_window::DeliveryWindow;
pub use order::Order;
