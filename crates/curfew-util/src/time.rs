//! Time utilities for curfew
//!
//! Provides wall-clock primitives (weekdays, minute-of-day clock times) for
//! schedule windows and monotonic time for cache expiry.
//!
//! # Mock Time for Development
//!
//! In debug builds, the `CURFEW_MOCK_TIME` environment variable can be set
//! to override the system time for all time-sensitive operations. This is useful
//! for exercising lock and unlock windows by hand.
//!
//! Format: `YYYY-MM-DD HH:MM:SS` (e.g., `2025-12-26 22:30:00`)
//!
//! Example:
//! ```bash
//! CURFEW_MOCK_TIME="2025-12-26 22:30:00" curfewd
//! ```

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Timelike, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;
use std::time::{Duration, Instant};

/// Environment variable name for mock time (debug builds only)
pub const MOCK_TIME_ENV_VAR: &str = "CURFEW_MOCK_TIME";

/// Format accepted by [`MOCK_TIME_ENV_VAR`]
pub const MOCK_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Minutes in one day
pub const MINUTES_PER_DAY: u16 = 24 * 60;

/// Offset between mock time and real time, captured once at first use.
/// Mock time advances at the same rate as real time.
static MOCK_TIME_OFFSET: OnceLock<Option<chrono::Duration>> = OnceLock::new();

#[allow(clippy::disallowed_methods)] // Wraps Local::now()
fn get_mock_time_offset() -> Option<chrono::Duration> {
    *MOCK_TIME_OFFSET.get_or_init(|| {
        #[cfg(debug_assertions)]
        {
            let mock_time_str = std::env::var(MOCK_TIME_ENV_VAR).ok()?;
            let Ok(naive_dt) = NaiveDateTime::parse_from_str(&mock_time_str, MOCK_TIME_FORMAT)
            else {
                tracing::warn!(
                    mock_time = %mock_time_str,
                    expected_format = MOCK_TIME_FORMAT,
                    "Invalid mock time format"
                );
                return None;
            };
            let Some(mock_dt) = Local.from_local_datetime(&naive_dt).single() else {
                tracing::warn!(
                    mock_time = %mock_time_str,
                    "Failed to convert mock time to local timezone"
                );
                return None;
            };
            let offset = mock_dt.signed_duration_since(chrono::Local::now());
            tracing::info!(
                mock_time = %mock_time_str,
                offset_secs = offset.num_seconds(),
                "Mock time enabled"
            );
            Some(offset)
        }
        #[cfg(not(debug_assertions))]
        {
            None
        }
    })
}

/// Returns whether mock time is currently active.
pub fn is_mock_time_active() -> bool {
    get_mock_time_offset().is_some()
}

/// Get the current local time, respecting mock time settings in debug builds.
#[allow(clippy::disallowed_methods)] // The one place allowed to read the system clock
pub fn now() -> DateTime<Local> {
    let real_now = chrono::Local::now();

    match get_mock_time_offset() {
        Some(offset) => real_now + offset,
        None => real_now,
    }
}

/// Represents a point in monotonic time, immune to wall-clock changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MonotonicInstant(Instant);

impl MonotonicInstant {
    pub fn now() -> Self {
        Self(Instant::now())
    }

    pub fn elapsed(&self) -> Duration {
        self.0.elapsed()
    }

    /// Duration since `earlier`, or zero if `earlier` is later than `self`
    pub fn saturating_duration_since(&self, earlier: MonotonicInstant) -> Duration {
        self.0.saturating_duration_since(earlier.0)
    }
}

impl std::ops::Add<Duration> for MonotonicInstant {
    type Output = MonotonicInstant;

    fn add(self, rhs: Duration) -> Self::Output {
        MonotonicInstant(self.0 + rhs)
    }
}

/// Day of the week, numbered Sunday = 0 through Saturday = 6
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum WeekDay {
    Sunday = 0,
    Monday = 1,
    Tuesday = 2,
    Wednesday = 3,
    Thursday = 4,
    Friday = 5,
    Saturday = 6,
}

impl WeekDay {
    pub const ALL: [WeekDay; 7] = [
        WeekDay::Sunday,
        WeekDay::Monday,
        WeekDay::Tuesday,
        WeekDay::Wednesday,
        WeekDay::Thursday,
        WeekDay::Friday,
        WeekDay::Saturday,
    ];

    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    pub fn index(self) -> u8 {
        self as u8
    }

    /// The day before this one (Sunday wraps to Saturday)
    pub fn previous(self) -> Self {
        Self::ALL[(self.index() as usize + 6) % 7]
    }
}

impl From<Weekday> for WeekDay {
    fn from(day: Weekday) -> Self {
        Self::ALL[day.num_days_from_sunday() as usize]
    }
}

impl TryFrom<u8> for WeekDay {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_index(value).ok_or_else(|| format!("weekday {} out of range 0-6", value))
    }
}

impl From<WeekDay> for u8 {
    fn from(day: WeekDay) -> Self {
        day.index()
    }
}

/// Set of weekdays. Serialized as a list of day numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Vec<WeekDay>", into = "Vec<WeekDay>")]
pub struct DaysOfWeek(u8);

impl DaysOfWeek {
    pub const WEEKDAYS: DaysOfWeek = DaysOfWeek(0b0011_1110);
    pub const WEEKENDS: DaysOfWeek = DaysOfWeek(0b0100_0001);
    pub const ALL_DAYS: DaysOfWeek = DaysOfWeek(0x7F);
    pub const NONE: DaysOfWeek = DaysOfWeek(0);

    pub fn of(days: &[WeekDay]) -> Self {
        days.iter().fold(Self::NONE, |set, day| set.with(*day))
    }

    pub fn with(self, day: WeekDay) -> Self {
        Self(self.0 | (1 << day.index()))
    }

    pub fn contains(&self, day: WeekDay) -> bool {
        (self.0 & (1 << day.index())) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(&self) -> impl Iterator<Item = WeekDay> + '_ {
        WeekDay::ALL.into_iter().filter(|day| self.contains(*day))
    }
}

impl std::ops::BitOr for DaysOfWeek {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl From<Vec<WeekDay>> for DaysOfWeek {
    fn from(days: Vec<WeekDay>) -> Self {
        Self::of(&days)
    }
}

impl From<DaysOfWeek> for Vec<WeekDay> {
    fn from(days: DaysOfWeek) -> Self {
        days.iter().collect()
    }
}

/// Time of day at minute resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WallClock {
    pub hour: u8,
    pub minute: u8,
}

impl WallClock {
    pub fn new(hour: u8, minute: u8) -> Option<Self> {
        let clock = Self { hour, minute };
        clock.is_valid().then_some(clock)
    }

    pub fn from_datetime(dt: &DateTime<Local>) -> Self {
        Self {
            hour: dt.hour() as u8,
            minute: dt.minute() as u8,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.hour < 24 && self.minute < 60
    }

    /// Returns minutes since midnight
    pub fn minutes_from_midnight(&self) -> u16 {
        (self.hour as u16) * 60 + (self.minute as u16)
    }
}

impl PartialOrd for WallClock {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for WallClock {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.minutes_from_midnight()
            .cmp(&other.minutes_from_midnight())
    }
}

impl fmt::Display for WallClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn test_wall_clock_ordering() {
        let morning = WallClock::new(8, 0).unwrap();
        let noon = WallClock::new(12, 0).unwrap();
        let evening = WallClock::new(18, 30).unwrap();

        assert!(morning < noon);
        assert!(noon < evening);
        assert_eq!(evening.minutes_from_midnight(), 18 * 60 + 30);
        assert_eq!(evening.to_string(), "18:30");
    }

    #[test]
    fn test_wall_clock_rejects_out_of_range() {
        assert!(WallClock::new(24, 0).is_none());
        assert!(WallClock::new(12, 60).is_none());
        assert!(WallClock::new(23, 59).is_some());
    }

    #[test]
    fn test_weekday_numbering() {
        assert_eq!(WeekDay::from(Weekday::Sun), WeekDay::Sunday);
        assert_eq!(WeekDay::from(Weekday::Sat).index(), 6);
        assert_eq!(WeekDay::Sunday.previous(), WeekDay::Saturday);
        assert_eq!(WeekDay::Saturday.previous(), WeekDay::Friday);
        assert!(WeekDay::from_index(7).is_none());
    }

    #[test]
    fn test_days_of_week() {
        let weekdays = DaysOfWeek::WEEKDAYS;
        assert!(weekdays.contains(WeekDay::Monday));
        assert!(weekdays.contains(WeekDay::Friday));
        assert!(!weekdays.contains(WeekDay::Saturday));
        assert!(!weekdays.contains(WeekDay::Sunday));
        assert_eq!(weekdays.len(), 5);

        let weekends = DaysOfWeek::WEEKENDS;
        assert!(weekends.contains(WeekDay::Saturday));
        assert!(weekends.contains(WeekDay::Sunday));
        assert_eq!(weekdays | weekends, DaysOfWeek::ALL_DAYS);
        assert!(DaysOfWeek::NONE.is_empty());
    }

    #[test]
    fn test_days_serialize_as_numbers() {
        let days = DaysOfWeek::of(&[WeekDay::Monday, WeekDay::Friday]);
        let json = serde_json::to_string(&days).unwrap();
        assert_eq!(json, "[1,5]");

        let parsed: DaysOfWeek = serde_json::from_str("[0,6]").unwrap();
        assert_eq!(parsed, DaysOfWeek::WEEKENDS);

        assert!(serde_json::from_str::<DaysOfWeek>("[7]").is_err());
    }

    #[test]
    fn test_now_returns_time() {
        let t = now();
        assert!(t.year() >= 2020);
        assert!(t.year() <= 2100);
    }

    #[test]
    fn test_parse_mock_time_format() {
        for valid in ["2025-12-25 14:30:00", "2025-01-01 00:00:00"] {
            assert!(NaiveDateTime::parse_from_str(valid, MOCK_TIME_FORMAT).is_ok());
        }
        for invalid in ["2025-12-25", "2025-12-25T14:30:00", "not a date", ""] {
            assert!(NaiveDateTime::parse_from_str(invalid, MOCK_TIME_FORMAT).is_err());
        }
    }

    #[test]
    fn test_monotonic_saturating() {
        let t1 = MonotonicInstant::now();
        let t2 = t1 + Duration::from_secs(5);
        assert_eq!(t2.saturating_duration_since(t1), Duration::from_secs(5));
        assert_eq!(t1.saturating_duration_since(t2), Duration::ZERO);
    }
}
