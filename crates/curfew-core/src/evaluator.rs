//! Time window evaluation
//!
//! Decides whether an application is restricted at a given instant. LOCK
//! schedules take precedence over UNLOCK schedules: a more restrictive
//! declaration is never overridden by a more permissive one.

use chrono::{DateTime, Datelike, Local};
use curfew_api::{ManagedApp, ScheduleType, TimeRange};
use curfew_util::{CurfewError, CurfewResult, WallClock, WeekDay};

/// Time-of-day test only; weekday matching is up to the caller.
///
/// Both ends are inclusive. A range whose start is after its end crosses
/// midnight and matches from `start` to midnight and from midnight to `end`.
pub fn is_time_in_range(range: &TimeRange, now_hour: u8, now_minute: u8) -> bool {
    let start = range.start().minutes_from_midnight();
    let end = range.end().minutes_from_midnight();
    let t = (now_hour as u16) * 60 + (now_minute as u16);

    if start <= end {
        start <= t && t <= end
    } else {
        t >= start || t <= end
    }
}

/// Whether `range` is open at `now`, including its weekday.
///
/// The part of a midnight-crossing window after midnight belongs to the day
/// the window started on: a Friday 22:00-02:00 window is still open at
/// 01:00 on Saturday.
pub fn range_covers(range: &TimeRange, now: &DateTime<Local>) -> bool {
    let clock = WallClock::from_datetime(now);
    if !is_time_in_range(range, clock.hour, clock.minute) {
        return false;
    }

    let today = WeekDay::from(now.weekday());
    let window_day = if range.crosses_midnight() && clock < range.start() {
        today.previous()
    } else {
        today
    };

    range.days().contains(window_day)
}

/// Whether `app` should be restricted at `now`.
///
/// 1. No enabled schedule: fall back to the legacy manual lock flag.
/// 2. Any open range of an enabled LOCK schedule: restricted.
/// 3. An enabled UNLOCK schedule with ranges exists: restricted unless one
///    of its ranges is open.
/// 4. Otherwise: not restricted.
///
/// Fails if an enabled schedule holds a malformed range.
pub fn should_app_be_locked(app: &ManagedApp, now: &DateTime<Local>) -> CurfewResult<bool> {
    let enabled: Vec<_> = app.schedules.iter().filter(|s| s.enabled).collect();
    if enabled.is_empty() {
        return Ok(app.manually_locked);
    }

    for range in enabled.iter().flat_map(|s| &s.time_ranges) {
        range
            .validate()
            .map_err(|e| CurfewError::skipped(app.package_id.clone(), e.to_string()))?;
    }

    let ranges_of = |kind: ScheduleType| {
        enabled
            .iter()
            .filter(move |s| s.kind == kind)
            .flat_map(|s| &s.time_ranges)
    };

    if ranges_of(ScheduleType::Lock).any(|r| range_covers(r, now)) {
        return Ok(true);
    }

    let mut unlock_ranges = ranges_of(ScheduleType::Unlock).peekable();
    if unlock_ranges.peek().is_none() {
        return Ok(false);
    }

    Ok(!unlock_ranges.any(|r| range_covers(r, now)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use curfew_api::Schedule;
    use curfew_util::{DaysOfWeek, PackageId};

    // 2025-12-29 is a Monday, 2025-12-26 a Friday
    fn at(day: u32, hour: u32, minute: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 12, day, hour, minute, 0).unwrap()
    }

    fn monday() -> DaysOfWeek {
        DaysOfWeek::of(&[WeekDay::Monday])
    }

    fn app_with(schedules: Vec<Schedule>) -> ManagedApp {
        ManagedApp {
            package_id: PackageId::new("org.example.Game"),
            display_name: "Game".into(),
            icon_ref: None,
            is_system_app: false,
            is_flagged_distractive: false,
            manually_locked: false,
            schedules,
            currently_restricted: false,
        }
    }

    fn schedule(kind: ScheduleType, ranges: Vec<TimeRange>) -> Schedule {
        Schedule::new(kind, ranges)
    }

    #[test]
    fn test_regular_range_is_inclusive() {
        let range = TimeRange::new(9, 0, 17, 0, DaysOfWeek::ALL_DAYS).unwrap();

        assert!(is_time_in_range(&range, 9, 0));
        assert!(is_time_in_range(&range, 12, 30));
        assert!(is_time_in_range(&range, 17, 0));
        assert!(!is_time_in_range(&range, 8, 59));
        assert!(!is_time_in_range(&range, 17, 1));
    }

    #[test]
    fn test_midnight_crossing_range() {
        let range = TimeRange::new(22, 0, 2, 0, DaysOfWeek::ALL_DAYS).unwrap();

        assert!(is_time_in_range(&range, 23, 30));
        assert!(is_time_in_range(&range, 1, 0));
        assert!(is_time_in_range(&range, 22, 0));
        assert!(is_time_in_range(&range, 2, 0));
        assert!(!is_time_in_range(&range, 12, 0));
        assert!(!is_time_in_range(&range, 2, 1));
    }

    #[test]
    fn test_time_in_range_exhaustive_for_regular_and_crossing() {
        let regular = TimeRange::new(6, 15, 18, 45, DaysOfWeek::ALL_DAYS).unwrap();
        let crossing = TimeRange::new(21, 30, 5, 10, DaysOfWeek::ALL_DAYS).unwrap();
        let (rs, re) = (6 * 60 + 15, 18 * 60 + 45);
        let (cs, ce) = (21 * 60 + 30, 5 * 60 + 10);

        for t in 0..(24 * 60u16) {
            let (h, m) = ((t / 60) as u8, (t % 60) as u8);
            assert_eq!(is_time_in_range(&regular, h, m), rs <= t && t <= re);
            assert_eq!(is_time_in_range(&crossing, h, m), t >= cs || t <= ce);
        }
    }

    #[test]
    fn test_crossing_window_belongs_to_start_day() {
        let range = TimeRange::new(22, 0, 2, 0, DaysOfWeek::of(&[WeekDay::Friday])).unwrap();

        assert!(range_covers(&range, &at(26, 23, 0))); // Friday night
        assert!(range_covers(&range, &at(27, 1, 0))); // Saturday early morning
        assert!(!range_covers(&range, &at(27, 23, 0))); // Saturday night
        assert!(!range_covers(&range, &at(26, 1, 0))); // Friday early morning, Thursday's window
    }

    #[test]
    fn test_lock_schedule_monday_business_hours() {
        let range = TimeRange::new(9, 0, 17, 0, monday()).unwrap();
        let app = app_with(vec![schedule(ScheduleType::Lock, vec![range])]);

        assert!(should_app_be_locked(&app, &at(29, 12, 0)).unwrap());
        assert!(!should_app_be_locked(&app, &at(29, 18, 0)).unwrap());
        assert!(!should_app_be_locked(&app, &at(30, 12, 0)).unwrap()); // Tuesday
    }

    #[test]
    fn test_unlock_schedule_defaults_to_restricted() {
        let range = TimeRange::new(9, 0, 17, 0, monday()).unwrap();
        let app = app_with(vec![schedule(ScheduleType::Unlock, vec![range])]);

        assert!(should_app_be_locked(&app, &at(29, 8, 0)).unwrap());
        assert!(!should_app_be_locked(&app, &at(29, 12, 0)).unwrap());
        assert!(should_app_be_locked(&app, &at(30, 12, 0)).unwrap()); // Tuesday
    }

    #[test]
    fn test_lock_takes_precedence_over_unlock() {
        let lock = TimeRange::new(11, 0, 13, 0, monday()).unwrap();
        let unlock = TimeRange::new(9, 0, 17, 0, monday()).unwrap();
        let app = app_with(vec![
            schedule(ScheduleType::Unlock, vec![unlock]),
            schedule(ScheduleType::Lock, vec![lock]),
        ]);

        assert!(should_app_be_locked(&app, &at(29, 12, 0)).unwrap());
        assert!(!should_app_be_locked(&app, &at(29, 10, 0)).unwrap());
    }

    #[test]
    fn test_no_enabled_schedule_falls_back_to_manual_flag() {
        let range = TimeRange::new(0, 0, 23, 59, DaysOfWeek::ALL_DAYS).unwrap();
        let mut lock = schedule(ScheduleType::Lock, vec![range]);
        lock.enabled = false;

        let mut app = app_with(vec![lock]);
        assert!(!should_app_be_locked(&app, &at(29, 12, 0)).unwrap());

        app.manually_locked = true;
        assert!(should_app_be_locked(&app, &at(29, 12, 0)).unwrap());

        app.schedules.clear();
        assert!(should_app_be_locked(&app, &at(29, 12, 0)).unwrap());
    }

    #[test]
    fn test_empty_schedules_impose_nothing() {
        let app = app_with(vec![
            schedule(ScheduleType::Lock, vec![]),
            schedule(ScheduleType::Unlock, vec![]),
        ]);
        assert!(!should_app_be_locked(&app, &at(29, 12, 0)).unwrap());
    }

    #[test]
    fn test_disabled_unlock_does_not_restrict() {
        let range = TimeRange::new(9, 0, 17, 0, monday()).unwrap();
        let lock_range = TimeRange::new(20, 0, 21, 0, monday()).unwrap();
        let mut unlock = schedule(ScheduleType::Unlock, vec![range]);
        unlock.enabled = false;
        let app = app_with(vec![unlock, schedule(ScheduleType::Lock, vec![lock_range])]);

        assert!(!should_app_be_locked(&app, &at(29, 8, 0)).unwrap());
        assert!(should_app_be_locked(&app, &at(29, 20, 30)).unwrap());
    }

    #[test]
    fn test_unlock_crossing_window_on_next_morning() {
        let range = TimeRange::new(20, 0, 1, 0, DaysOfWeek::of(&[WeekDay::Friday])).unwrap();
        let app = app_with(vec![schedule(ScheduleType::Unlock, vec![range])]);

        assert!(!should_app_be_locked(&app, &at(27, 0, 30)).unwrap()); // Saturday 00:30
        assert!(should_app_be_locked(&app, &at(27, 1, 30)).unwrap());
    }

    #[test]
    fn test_malformed_range_fails_evaluation() {
        let json = r#"{"id":"6f9619ff-8b86-d011-b42d-00cf4fc964ff","start":{"hour":30,"minute":0},"end":{"hour":2,"minute":0},"days":[1]}"#;
        let bad: TimeRange = serde_json_range(json);
        let app = app_with(vec![schedule(ScheduleType::Lock, vec![bad])]);

        assert!(matches!(
            should_app_be_locked(&app, &at(29, 12, 0)),
            Err(CurfewError::EvaluatorSkipped { .. })
        ));
    }

    fn serde_json_range(json: &str) -> TimeRange {
        serde_json::from_str(json).unwrap()
    }
}
