//! Schedule building from user-entered time slots
//!
//! The editing surface works on flat lists of slots per schedule type. These
//! functions turn those lists into schedules and back, never touching more
//! than the caller hands in.

use curfew_api::{ManagedApp, Schedule, ScheduleType, TimeRange};
use curfew_config::SlotSpec;
use curfew_util::{CurfewError, CurfewResult, DaysOfWeek, TimeRangeId};

/// Append a new slot to `existing`.
///
/// Nothing is returned on failure: an empty day set or an out-of-range
/// field leaves the caller's list as it was.
pub fn add_time_slot(
    existing: &[TimeRange],
    start_hour: u8,
    start_minute: u8,
    end_hour: u8,
    end_minute: u8,
    days: DaysOfWeek,
) -> CurfewResult<Vec<TimeRange>> {
    if days.is_empty() {
        return Err(CurfewError::NoDaysSelected);
    }

    let range = TimeRange::new(start_hour, start_minute, end_hour, end_minute, days)?;

    let mut slots = existing.to_vec();
    slots.push(range);
    Ok(slots)
}

/// Remove the slot with `id`; unknown IDs leave the list unchanged.
pub fn remove_time_slot(existing: &[TimeRange], id: TimeRangeId) -> Vec<TimeRange> {
    existing.iter().filter(|r| r.id() != id).cloned().collect()
}

/// Copy of `app` with every schedule enabled or disabled.
///
/// `app` itself is untouched. Persisting the copy is the caller's job;
/// `SchedulerService` rejects the whole change with
/// [`CurfewError::PartialUpdateRejected`] when the store write fails.
pub fn set_schedules_enabled(app: &ManagedApp, enabled: bool) -> ManagedApp {
    let mut updated = app.clone();
    for schedule in &mut updated.schedules {
        schedule.enabled = enabled;
    }
    updated
}

/// Check slots handed in whole, as `add_time_slot` checks a new one.
pub fn validate_slots(slots: &[TimeRange]) -> CurfewResult<()> {
    for slot in slots {
        if slot.days().is_empty() {
            return Err(CurfewError::NoDaysSelected);
        }
        slot.validate()?;
    }
    Ok(())
}

/// At most one schedule per type; an empty slot list yields no schedule.
pub fn build_schedules_from_slots(lock_slots: &[TimeRange], unlock_slots: &[TimeRange]) -> Vec<Schedule> {
    let mut schedules = Vec::new();
    if !lock_slots.is_empty() {
        schedules.push(Schedule::new(ScheduleType::Lock, lock_slots.to_vec()));
    }
    if !unlock_slots.is_empty() {
        schedules.push(Schedule::new(ScheduleType::Unlock, unlock_slots.to_vec()));
    }
    schedules
}

/// Flatten schedules back into `(lock_slots, unlock_slots)`.
pub fn decompose_schedules(schedules: &[Schedule]) -> (Vec<TimeRange>, Vec<TimeRange>) {
    (
        slots_of(schedules, ScheduleType::Lock),
        slots_of(schedules, ScheduleType::Unlock),
    )
}

/// All ranges of every schedule of `kind`, in order.
pub fn slots_of(schedules: &[Schedule], kind: ScheduleType) -> Vec<TimeRange> {
    schedules
        .iter()
        .filter(|s| s.kind == kind)
        .flat_map(|s| s.time_ranges.iter().cloned())
        .collect()
}

/// Replace the slots of one schedule type, leaving the other type alone.
///
/// The first existing schedule of `kind` keeps its ID and enabled flag;
/// further schedules of the same kind are folded into it. An empty `slots`
/// removes the schedule. A type without a schedule gets a new, enabled one.
pub fn replace_slots(existing: &[Schedule], kind: ScheduleType, slots: Vec<TimeRange>) -> Vec<Schedule> {
    let mut result = Vec::with_capacity(existing.len() + 1);
    let mut slots = Some(slots).filter(|s| !s.is_empty());
    let mut placed = false;

    for schedule in existing {
        if schedule.kind != kind {
            result.push(schedule.clone());
            continue;
        }
        if placed {
            continue;
        }
        placed = true;
        if let Some(ranges) = slots.take() {
            result.push(Schedule {
                time_ranges: ranges,
                ..schedule.clone()
            });
        }
    }

    if let Some(ranges) = slots {
        result.push(Schedule::new(kind, ranges));
    }

    result
}

/// Build slots from configured seeds.
pub fn slots_from_specs(specs: &[SlotSpec]) -> CurfewResult<Vec<TimeRange>> {
    specs.iter().try_fold(Vec::new(), |slots, spec| {
        add_time_slot(
            &slots,
            spec.start.hour,
            spec.start.minute,
            spec.end.hour,
            spec.end.minute,
            spec.days,
        )
    })
}
