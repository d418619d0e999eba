//! Restriction schedule model

use curfew_util::{CurfewError, CurfewResult, DaysOfWeek, ScheduleId, TimeRangeId, WallClock};
use serde::{Deserialize, Serialize};

/// How a schedule's time ranges restrict its application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleType {
    /// Restricted while inside any of the schedule's ranges
    Lock,
    /// Restricted at all times except while inside one of the schedule's ranges
    Unlock,
}

impl ScheduleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleType::Lock => "lock",
            ScheduleType::Unlock => "unlock",
        }
    }
}

/// One recurring time-of-day window on a set of weekdays.
///
/// `end` may be earlier than or equal to `start` in minutes-of-day, in which
/// case a window ending before it starts crosses midnight into the next day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    id: TimeRangeId,
    start: WallClock,
    end: WallClock,
    days: DaysOfWeek,
}

impl TimeRange {
    /// Create a range, rejecting hours outside 0-23 and minutes outside 0-59.
    pub fn new(
        start_hour: u8,
        start_minute: u8,
        end_hour: u8,
        end_minute: u8,
        days: DaysOfWeek,
    ) -> CurfewResult<Self> {
        let start = clock(start_hour, start_minute, "start")?;
        let end = clock(end_hour, end_minute, "end")?;

        Ok(Self {
            id: TimeRangeId::new(),
            start,
            end,
            days,
        })
    }

    pub fn from_clocks(start: WallClock, end: WallClock, days: DaysOfWeek) -> CurfewResult<Self> {
        Self::new(start.hour, start.minute, end.hour, end.minute, days)
    }

    pub fn id(&self) -> TimeRangeId {
        self.id
    }

    pub fn start(&self) -> WallClock {
        self.start
    }

    pub fn end(&self) -> WallClock {
        self.end
    }

    pub fn days(&self) -> DaysOfWeek {
        self.days
    }

    /// True when the window ends on the day after it starts
    pub fn crosses_midnight(&self) -> bool {
        self.start > self.end
    }

    /// Re-check the numeric invariants.
    ///
    /// Ranges built through [`TimeRange::new`] always pass; ranges
    /// deserialized from storage may not.
    pub fn validate(&self) -> CurfewResult<()> {
        clock(self.start.hour, self.start.minute, "start")?;
        clock(self.end.hour, self.end.minute, "end")?;
        Ok(())
    }

    /// Same window, days and time, ignoring the generated ID
    pub fn same_window(&self, other: &TimeRange) -> bool {
        self.start == other.start && self.end == other.end && self.days == other.days
    }
}

fn clock(hour: u8, minute: u8, which: &str) -> CurfewResult<WallClock> {
    WallClock::new(hour, minute).ok_or_else(|| {
        CurfewError::invalid_time(format!("{} time {}:{:02} out of range", which, hour, minute))
    })
}

/// A typed collection of time ranges attached to one application
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub id: ScheduleId,
    #[serde(rename = "type")]
    pub kind: ScheduleType,
    pub time_ranges: Vec<TimeRange>,
    pub enabled: bool,
}

impl Schedule {
    /// New schedules start enabled
    pub fn new(kind: ScheduleType, time_ranges: Vec<TimeRange>) -> Self {
        Self {
            id: ScheduleId::new(),
            kind,
            time_ranges,
            enabled: true,
        }
    }

    /// Enabled and holding at least one range
    pub fn is_active(&self) -> bool {
        self.enabled && !self.time_ranges.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use curfew_util::WeekDay;

    #[test]
    fn time_range_rejects_out_of_range_fields() {
        let days = DaysOfWeek::ALL_DAYS;
        assert!(matches!(
            TimeRange::new(24, 0, 1, 0, days),
            Err(CurfewError::InvalidTimeValue(_))
        ));
        assert!(matches!(
            TimeRange::new(9, 0, 17, 60, days),
            Err(CurfewError::InvalidTimeValue(_))
        ));
        assert!(TimeRange::new(23, 59, 0, 0, days).is_ok());
    }

    #[test]
    fn midnight_crossing_detection() {
        let days = DaysOfWeek::of(&[WeekDay::Friday]);
        assert!(TimeRange::new(22, 0, 2, 0, days).unwrap().crosses_midnight());
        assert!(!TimeRange::new(9, 0, 17, 0, days).unwrap().crosses_midnight());
        assert!(!TimeRange::new(9, 0, 9, 0, days).unwrap().crosses_midnight());
    }

    #[test]
    fn deserialized_range_is_revalidated() {
        let json = r#"{"id":"6f9619ff-8b86-d011-b42d-00cf4fc964ff","start":{"hour":25,"minute":0},"end":{"hour":2,"minute":0},"days":[5]}"#;
        let range: TimeRange = serde_json::from_str(json).unwrap();
        assert!(matches!(
            range.validate(),
            Err(CurfewError::InvalidTimeValue(_))
        ));
    }

    #[test]
    fn schedule_serialization_uses_type_tag() {
        let range = TimeRange::new(9, 0, 17, 0, DaysOfWeek::WEEKDAYS).unwrap();
        let schedule = Schedule::new(ScheduleType::Unlock, vec![range]);

        let json = serde_json::to_string(&schedule).unwrap();
        assert!(json.contains(r#""type":"unlock""#));

        let parsed: Schedule = serde_json::from_str(&json).unwrap();
        assert_eq!(schedule, parsed);
        assert!(parsed.enabled);
    }

    #[test]
    fn empty_or_disabled_schedule_is_inactive() {
        let mut schedule = Schedule::new(ScheduleType::Lock, vec![]);
        assert!(!schedule.is_active());

        schedule
            .time_ranges
            .push(TimeRange::new(9, 0, 17, 0, DaysOfWeek::ALL_DAYS).unwrap());
        assert!(schedule.is_active());

        schedule.enabled = false;
        assert!(!schedule.is_active());
    }
}
