use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use std::sync::Arc;

/// Abstraction over "current time" so cutoff and window-exclusion behavior
/// is deterministic in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Fixed-instant clock for tests.
#[derive(Debug, Clone)]
pub struct FixedClock {
    now: DateTime<Utc>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }
}

/// Civil date and time-of-day in the store's timezone.
///
/// Delivery cutoffs are a business-local concept; every piece of scheduling
/// arithmetic routes through here so nothing depends on where the process
/// happens to run.
#[derive(Clone)]
pub struct BusinessCalendar {
    clock: Arc<dyn Clock>,
    tz: Tz,
}

impl BusinessCalendar {
    pub fn new(clock: Arc<dyn Clock>, tz: Tz) -> Self {
        Self { clock, tz }
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// Civil date "today + offset_days" in the store timezone.
    pub fn civil_date(&self, offset_days: i64) -> NaiveDate {
        self.clock.now().with_timezone(&self.tz).date_naive() + Duration::days(offset_days)
    }

    /// Current time of day in the store timezone.
    pub fn civil_time_of_day(&self) -> NaiveTime {
        self.clock.now().with_timezone(&self.tz).time()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn calendar_at(instant: &str, tz: Tz) -> BusinessCalendar {
        let now = instant.parse::<DateTime<Utc>>().unwrap();
        BusinessCalendar::new(Arc::new(FixedClock::new(now)), tz)
    }

    #[test]
    fn civil_date_follows_store_timezone_not_utc() {
        // 03:30 UTC is still the previous evening in Toronto (UTC-4 in June)
        let cal = calendar_at("2025-06-15T03:30:00Z", chrono_tz::America::Toronto);
        assert_eq!(cal.civil_date(0), NaiveDate::from_ymd_opt(2025, 6, 14).unwrap());
        assert_eq!(cal.civil_time_of_day(), NaiveTime::from_hms_opt(23, 30, 0).unwrap());
    }

    #[test]
    fn civil_date_offsets_advance_whole_days() {
        let cal = calendar_at("2025-06-15T03:30:00Z", chrono_tz::America::Toronto);
        assert_eq!(cal.civil_date(1), NaiveDate::from_ymd_opt(2025, 6, 15).unwrap());
        assert_eq!(cal.civil_date(2), NaiveDate::from_ymd_opt(2025, 6, 16).unwrap());
    }

    #[test]
    fn same_instant_same_store_timezone_is_host_independent() {
        // Two calendars over the same instant and store zone agree exactly;
        // nothing here consults the process-local timezone.
        let a = calendar_at("2025-01-10T18:00:00Z", chrono_tz::America::Toronto);
        let b = calendar_at("2025-01-10T18:00:00Z", chrono_tz::America::Toronto);
        assert_eq!(a.civil_date(0), b.civil_date(0));
        assert_eq!(a.civil_time_of_day(), b.civil_time_of_day());

        // A different store zone is a different civil clock for the same
        // instant, which is exactly the dependency we want: configuration,
        // not host environment.
        let sydney = calendar_at("2025-01-10T18:00:00Z", chrono_tz::Australia::Sydney);
        assert_eq!(
            sydney.civil_date(0),
            NaiveDate::from_ymd_opt(2025, 1, 11).unwrap()
        );
    }

    #[test]
    fn system_clock_tracks_real_time() {
        let clock = SystemClock;
        let before = Utc::now();
        let now = clock.now();
        assert!(now >= before);
    }

    #[test]
    fn fixed_clock_never_advances() {
        let instant = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let clock = FixedClock::new(instant);
        assert_eq!(clock.now(), instant);
        assert_eq!(clock.now(), instant);
    }
}
