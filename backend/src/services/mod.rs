pub mod clock;
pub mod order_service;
pub mod scheduling_service;

pub use clock::{BusinessCalendar, Clock, FixedClock, SystemClock};
pub use order_service::OrderService;
pub use scheduling_service::SchedulingService;
