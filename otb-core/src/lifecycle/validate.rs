//! Temporal validation for seance scheduling.

use thiserror::Error;
use time::{Duration, PrimitiveDateTime, Time};

/// Shortest seance the schedule accepts.
pub const MIN_DURATION: Duration = Duration::hours(1);

/// Performances may not start before the house opens...
pub const HOUSE_OPENS: Time = time::macros::time!(8:00);

/// ...and must end by closing time.
pub const HOUSE_CLOSES: Time = time::macros::time!(23:00);

/// Why a proposed time slot was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("end time must be after start time")]
    EndNotAfterStart,

    #[error("a seance must run for at least one hour")]
    TooShort,

    #[error("a seance must start and end on the same day")]
    CrossesMidnight,

    #[error("seances must run between 08:00 and 23:00")]
    OutsideHouseHours,
}

/// Validate a proposed seance time slot.
///
/// Checks run most-fundamental-first so the caller gets the most
/// specific error available: ordering, minimum duration, single-day
/// span, house hours.
pub fn validate_schedule(
    starts_at: PrimitiveDateTime,
    ends_at: PrimitiveDateTime,
) -> Result<(), ScheduleError> {
    if ends_at <= starts_at {
        return Err(ScheduleError::EndNotAfterStart);
    }
    if ends_at - starts_at < MIN_DURATION {
        return Err(ScheduleError::TooShort);
    }
    if starts_at.date() != ends_at.date() {
        return Err(ScheduleError::CrossesMidnight);
    }
    if starts_at.time() < HOUSE_OPENS || ends_at.time() > HOUSE_CLOSES {
        return Err(ScheduleError::OutsideHouseHours);
    }
    Ok(())
}

/// Whether two half-open time ranges overlap.
///
/// Touching boundaries do not conflict: one seance may end exactly when
/// the next begins.
pub fn ranges_overlap(
    a_start: PrimitiveDateTime,
    a_end: PrimitiveDateTime,
    b_start: PrimitiveDateTime,
    b_end: PrimitiveDateTime,
) -> bool {
    a_start < b_end && b_start < a_end
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_valid_slot_passes() {
        assert_eq!(
            validate_schedule(datetime!(2026-03-01 19:00), datetime!(2026-03-01 21:30)),
            Ok(())
        );
    }

    #[test]
    fn test_end_before_start() {
        assert_eq!(
            validate_schedule(datetime!(2026-03-01 19:00), datetime!(2026-03-01 18:00)),
            Err(ScheduleError::EndNotAfterStart)
        );
        assert_eq!(
            validate_schedule(datetime!(2026-03-01 19:00), datetime!(2026-03-01 19:00)),
            Err(ScheduleError::EndNotAfterStart)
        );
    }

    #[test]
    fn test_under_an_hour_rejected() {
        assert_eq!(
            validate_schedule(datetime!(2026-03-01 19:00), datetime!(2026-03-01 19:59)),
            Err(ScheduleError::TooShort)
        );
        // Exactly one hour is fine.
        assert_eq!(
            validate_schedule(datetime!(2026-03-01 19:00), datetime!(2026-03-01 20:00)),
            Ok(())
        );
    }

    #[test]
    fn test_crossing_midnight_rejected() {
        assert_eq!(
            validate_schedule(datetime!(2026-03-01 21:00), datetime!(2026-03-02 01:00)),
            Err(ScheduleError::CrossesMidnight)
        );
    }

    #[test]
    fn test_house_hours_enforced() {
        assert_eq!(
            validate_schedule(datetime!(2026-03-01 7:00), datetime!(2026-03-01 9:00)),
            Err(ScheduleError::OutsideHouseHours)
        );
        assert_eq!(
            validate_schedule(datetime!(2026-03-01 21:30), datetime!(2026-03-01 23:30)),
            Err(ScheduleError::OutsideHouseHours)
        );
        // Boundary values are allowed.
        assert_eq!(
            validate_schedule(datetime!(2026-03-01 8:00), datetime!(2026-03-01 23:00)),
            Ok(())
        );
    }

    #[test]
    fn test_touching_ranges_do_not_overlap() {
        let a = (datetime!(2026-03-01 18:00), datetime!(2026-03-01 20:00));
        let b = (datetime!(2026-03-01 20:00), datetime!(2026-03-01 22:00));
        assert!(!ranges_overlap(a.0, a.1, b.0, b.1));
        assert!(!ranges_overlap(b.0, b.1, a.0, a.1));
    }

    #[test]
    fn test_crossing_ranges_overlap() {
        let a = (datetime!(2026-03-01 18:00), datetime!(2026-03-01 20:00));
        let b = (datetime!(2026-03-01 19:59), datetime!(2026-03-01 22:00));
        assert!(ranges_overlap(a.0, a.1, b.0, b.1));
        assert!(ranges_overlap(b.0, b.1, a.0, a.1));
    }

    #[test]
    fn test_contained_range_overlaps() {
        let outer = (datetime!(2026-03-01 18:00), datetime!(2026-03-01 22:00));
        let inner = (datetime!(2026-03-01 19:00), datetime!(2026-03-01 20:00));
        assert!(ranges_overlap(outer.0, outer.1, inner.0, inner.1));
    }
}
