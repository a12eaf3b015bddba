// Delivery scheduling defaults
// Applied when the delivery_settings singleton is missing or unreadable.
pub const FALLBACK_CUTOFF_HOUR: u32 = 13;
pub const FALLBACK_CUTOFF_MINUTE: u32 = 0;
pub const FALLBACK_SLOT_CAPACITY: i32 = 15;

// Built-in delivery windows (name, display name, start hour, end hour),
// used when no admin-configured windows exist. Capacity is left unset so
// the global default applies.
pub const BUILTIN_WINDOWS: &[(&str, &str, u32, u32)] = &[
    ("morning", "Morning", 11, 15),
    ("afternoon", "Afternoon", 15, 19),
    ("evening", "Evening", 19, 23),
];

// Slot listing horizon (days beyond today)
pub const DEFAULT_SLOT_HORIZON_DAYS: u32 = 2;
pub const MAX_SLOT_HORIZON_DAYS: u32 = 7;

// Store timezone fallback; overridden by STORE_TIMEZONE
pub const DEFAULT_STORE_TIMEZONE: &str = "America/Toronto";

// Error messages
pub const ERROR_SLOT_FULL: &str = "This delivery slot just filled up, please choose another";
pub const ERROR_WINDOW_NOT_FOUND: &str = "Delivery window not found";
pub const ERROR_WINDOW_IN_USE: &str = "Delivery window is referenced by existing orders";
pub const ERROR_ORDER_NOT_FOUND: &str = "Order not found";

// Success messages
pub const SUCCESS_ORDER_PLACED: &str = "Order placed successfully";
