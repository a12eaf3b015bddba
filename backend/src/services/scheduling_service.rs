use crate::error::AppError;
use crate::models::{DeliverySettings, DeliveryWindow, Order};
use crate::services::clock::BusinessCalendar;
use chrono::{NaiveDate, NaiveTime, Timelike};
use grocery_platform_shared::constants::{FALLBACK_SLOT_CAPACITY, MAX_SLOT_HORIZON_DAYS};
use grocery_platform_shared::{DeliveryDaySlots, DeliverySlotResponse, SlotListResponse};
use sqlx::PgPool;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Same-day delivery is offered strictly before the cutoff, compared as
/// minutes since midnight.
pub fn same_day_allowed(now: NaiveTime, cutoff: NaiveTime) -> bool {
    minutes_since_midnight(now) < minutes_since_midnight(cutoff)
}

/// Whether a window can still be offered for today. Hour-granularity gate:
/// a window starting within the current hour is already excluded even if
/// its start minute has not passed.
pub fn window_still_offerable_today(window: &DeliveryWindow, now: NaiveTime) -> bool {
    window.start_time.hour() > now.hour()
}

/// Capacity for a window: per-window override when set and nonzero, else
/// the store-wide default, else the hardcoded fallback.
pub fn effective_capacity(window: &DeliveryWindow, settings: &DeliverySettings) -> i32 {
    match window.max_deliveries {
        Some(capacity) if capacity > 0 => capacity,
        _ if settings.max_deliveries_per_slot > 0 => settings.max_deliveries_per_slot,
        _ => FALLBACK_SLOT_CAPACITY,
    }
}

fn minutes_since_midnight(t: NaiveTime) -> u32 {
    t.hour() * 60 + t.minute()
}

/// Composes the store calendar, window catalog, cutoff policy and occupancy
/// counts into the offerable slot listing. Read-only; repeated calls with
/// the same clock and order state produce identical output.
#[derive(Clone)]
pub struct SchedulingService {
    db_pool: PgPool,
    calendar: BusinessCalendar,
    default_horizon_days: u32,
}

impl SchedulingService {
    pub fn new(db_pool: PgPool, calendar: BusinessCalendar, default_horizon_days: u32) -> Self {
        Self {
            db_pool,
            calendar,
            default_horizon_days,
        }
    }

    pub fn calendar(&self) -> &BusinessCalendar {
        &self.calendar
    }

    pub fn default_horizon_days(&self) -> u32 {
        self.default_horizon_days
    }

    /// Offerable slots for today plus the next `horizon_days` civil dates,
    /// grouped by date.
    ///
    /// Settings and catalog reads are best-effort (built-in defaults on
    /// failure); occupancy counts are not. A failed count never renders as
    /// an open slot, so on count failure the listing degrades to empty.
    pub async fn generate_slots(&self, horizon_days: Option<u32>) -> Result<SlotListResponse, AppError> {
        let horizon_days = horizon_days
            .unwrap_or(self.default_horizon_days)
            .clamp(1, MAX_SLOT_HORIZON_DAYS);

        let settings = match DeliverySettings::load(&self.db_pool).await {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Failed to load delivery settings, using defaults: {}", e);
                DeliverySettings::fallback()
            }
        };

        let windows = match DeliveryWindow::find_active(&self.db_pool).await {
            Ok(windows) if !windows.is_empty() => windows,
            Ok(_) => {
                debug!("No delivery windows configured, using built-in defaults");
                DeliveryWindow::builtin_defaults()
            }
            Err(e) => {
                warn!("Failed to load delivery windows, using built-in defaults: {}", e);
                DeliveryWindow::builtin_defaults()
            }
        };

        let dates: Vec<NaiveDate> = (0..=horizon_days as i64)
            .map(|offset| self.calendar.civil_date(offset))
            .collect();

        let counts = match Order::counts_by_slot(&self.db_pool, &dates).await {
            Ok(counts) => counts,
            Err(e) => {
                warn!("Slot occupancy count failed, withholding listing: {}", e);
                return Ok(SlotListResponse { days: Vec::new() });
            }
        };

        let now = self.calendar.civil_time_of_day();

        Ok(build_slot_listing(
            &windows, &settings, &counts, &dates, now,
        ))
    }

    /// Resolve a submitted (date, time-slot) pair for the admission path.
    ///
    /// Strict counterpart of the listing reads: catalog or settings
    /// failures propagate instead of being papered over with defaults,
    /// because a reservation must never be granted against guessed state.
    /// The cutoff and start-hour gates are re-applied here so a slot that
    /// expired between display and submit is rejected.
    pub async fn resolve_slot_for_admission(
        &self,
        date: NaiveDate,
        time_slot: &str,
    ) -> Result<(DeliveryWindow, DeliverySettings), AppError> {
        let settings = DeliverySettings::load(&self.db_pool).await?;

        let windows = DeliveryWindow::find_active(&self.db_pool).await?;
        let windows = if windows.is_empty() {
            DeliveryWindow::builtin_defaults()
        } else {
            windows
        };

        let window = windows
            .into_iter()
            .find(|w| w.time_slot() == time_slot)
            .ok_or_else(|| {
                AppError::Validation(format!("unknown delivery time slot: {}", time_slot))
            })?;

        let today = self.calendar.civil_date(0);
        let last_offerable = self.calendar.civil_date(self.default_horizon_days as i64);
        if date < today || date > last_offerable {
            return Err(AppError::Validation(format!(
                "delivery date {} is outside the offerable horizon",
                date
            )));
        }

        if date == today {
            let now = self.calendar.civil_time_of_day();
            if !same_day_allowed(now, settings.cutoff_time) {
                return Err(AppError::Validation(
                    "same-day delivery is past the order cutoff".to_string(),
                ));
            }
            if !window_still_offerable_today(&window, now) {
                return Err(AppError::Validation(
                    "the selected delivery window has already started".to_string(),
                ));
            }
        }

        Ok((window, settings))
    }
}

/// Pure assembly of the slot listing from already-loaded state. The first
/// date is "today" and gets the cutoff and start-hour gates; later dates
/// emit every active window.
fn build_slot_listing(
    windows: &[DeliveryWindow],
    settings: &DeliverySettings,
    counts: &HashMap<(NaiveDate, String), i64>,
    dates: &[NaiveDate],
    now: NaiveTime,
) -> SlotListResponse {
    let mut days = Vec::with_capacity(dates.len());

    for (i, &date) in dates.iter().enumerate() {
        let is_today = i == 0;

        if is_today && !same_day_allowed(now, settings.cutoff_time) {
            continue;
        }

        let slots: Vec<DeliverySlotResponse> = windows
            .iter()
            .filter(|w| !is_today || window_still_offerable_today(w, now))
            .map(|w| build_slot(w, settings, counts, date))
            .collect();

        if !slots.is_empty() {
            days.push(DeliveryDaySlots { date, slots });
        }
    }

    SlotListResponse { days }
}

fn build_slot(
    window: &DeliveryWindow,
    settings: &DeliverySettings,
    counts: &HashMap<(NaiveDate, String), i64>,
    date: NaiveDate,
) -> DeliverySlotResponse {
    let time_slot = window.time_slot();
    // Absent from the aggregate means no orders, genuinely zero.
    let used = counts
        .get(&(date, time_slot.clone()))
        .copied()
        .unwrap_or(0) as i32;
    let capacity = effective_capacity(window, settings);

    DeliverySlotResponse {
        id: format!("{}_{}", date, window.name),
        date,
        time_slot,
        display_time: window.display_time(),
        available: used < capacity,
        capacity,
        used,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn window(name: &str, start_hour: u32, max_deliveries: Option<i32>) -> DeliveryWindow {
        let now = Utc::now();
        DeliveryWindow {
            id: Uuid::new_v4(),
            name: name.to_string(),
            display_name: name.to_string(),
            start_time: NaiveTime::from_hms_opt(start_hour, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(start_hour + 4, 0, 0).unwrap(),
            max_deliveries,
            is_active: true,
            sort_order: 0,
            created_at: now,
            updated_at: now,
        }
    }

    fn settings(cutoff: (u32, u32), max_per_slot: i32) -> DeliverySettings {
        DeliverySettings {
            cutoff_time: NaiveTime::from_hms_opt(cutoff.0, cutoff.1, 0).unwrap(),
            max_deliveries_per_slot: max_per_slot,
            updated_at: None,
        }
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    #[test]
    fn same_day_allowed_is_strict_at_the_cutoff() {
        let cutoff = time(13, 0);
        assert!(same_day_allowed(time(12, 59), cutoff));
        assert!(!same_day_allowed(time(13, 0), cutoff));
        assert!(!same_day_allowed(time(13, 1), cutoff));
    }

    #[test]
    fn window_is_excluded_once_its_start_hour_arrives() {
        let w = window("morning", 11, None);
        assert!(window_still_offerable_today(&w, time(10, 59)));
        assert!(!window_still_offerable_today(&w, time(11, 0)));
        assert!(!window_still_offerable_today(&w, time(11, 30)));
        assert!(!window_still_offerable_today(&w, time(12, 0)));
    }

    #[test]
    fn effective_capacity_prefers_window_override() {
        let s = settings((13, 0), 20);
        assert_eq!(effective_capacity(&window("w", 11, Some(5)), &s), 5);
        assert_eq!(effective_capacity(&window("w", 11, None), &s), 20);
        // A zero override is treated as unset
        assert_eq!(effective_capacity(&window("w", 11, Some(0)), &s), 20);
    }

    #[test]
    fn effective_capacity_falls_back_to_hardcoded_default() {
        let s = settings((13, 0), 0);
        assert_eq!(effective_capacity(&window("w", 11, None), &s), 15);
    }

    #[test]
    fn capacity_arithmetic_at_the_boundary() {
        let w = window("morning", 11, Some(5));
        let s = settings((13, 0), 15);
        let slot_key = (date(10), w.time_slot());

        let mut counts = HashMap::new();
        counts.insert(slot_key.clone(), 4);
        let listing = build_slot_listing(
            &[w.clone()],
            &s,
            &counts,
            &[date(10)],
            time(9, 0),
        );
        let slot = &listing.days[0].slots[0];
        assert!(slot.available);
        assert_eq!(slot.used, 4);
        assert_eq!(slot.capacity, 5);

        counts.insert(slot_key, 5);
        let listing = build_slot_listing(&[w], &s, &counts, &[date(10)], time(9, 0));
        let slot = &listing.days[0].slots[0];
        assert!(!slot.available);
        assert_eq!(slot.used, 5);
    }

    #[test]
    fn no_same_day_slots_after_cutoff_regardless_of_window_start() {
        let windows = vec![window("afternoon", 15, None), window("evening", 19, None)];
        let s = settings((13, 0), 15);
        let counts = HashMap::new();

        // 13:00 exactly: cutoff passed, today is gone, tomorrow intact
        let listing = build_slot_listing(
            &windows,
            &s,
            &counts,
            &[date(10), date(11)],
            time(13, 0),
        );
        assert_eq!(listing.days.len(), 1);
        assert_eq!(listing.days[0].date, date(11));
        assert_eq!(listing.days[0].slots.len(), 2);
    }

    #[test]
    fn future_days_are_not_gated_by_start_hour() {
        let windows = vec![window("morning", 11, None), window("evening", 19, None)];
        let s = settings((13, 0), 15);
        let counts = HashMap::new();

        // 12:30, before cutoff: morning already started so today only has
        // evening, but tomorrow and the day after carry both windows.
        let listing = build_slot_listing(
            &windows,
            &s,
            &counts,
            &[date(10), date(11), date(12)],
            time(12, 30),
        );
        assert_eq!(listing.days.len(), 3);
        assert_eq!(listing.days[0].slots.len(), 1);
        assert_eq!(listing.days[0].slots[0].time_slot, "19:00-23:00");
        assert_eq!(listing.days[1].slots.len(), 2);
        assert_eq!(listing.days[2].slots.len(), 2);
    }

    #[test]
    fn slot_ids_compose_date_and_window_name() {
        let windows = vec![window("morning", 11, None)];
        let s = settings((13, 0), 15);
        let listing = build_slot_listing(
            &windows,
            &s,
            &HashMap::new(),
            &[date(10)],
            time(8, 0),
        );
        assert_eq!(listing.days[0].slots[0].id, "2025-06-10_morning");
    }

    #[test]
    fn listing_is_deterministic_for_fixed_inputs() {
        let windows = vec![window("morning", 11, Some(3)), window("evening", 19, None)];
        let s = settings((13, 0), 15);
        let mut counts = HashMap::new();
        counts.insert((date(10), "11:00-15:00".to_string()), 2);

        let dates = [date(10), date(11), date(12)];
        let first = build_slot_listing(&windows, &s, &counts, &dates, time(9, 0));
        let second = build_slot_listing(&windows, &s, &counts, &dates, time(9, 0));

        let a = serde_json::to_value(&first).unwrap();
        let b = serde_json::to_value(&second).unwrap();
        assert_eq!(a, b);
    }
}
