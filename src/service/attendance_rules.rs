use chrono::{NaiveTime, Timelike};

use crate::model::{attendance::AttendanceStatus, employee::ShiftType};

const MINUTES_PER_DAY: i64 = 24 * 60;

/// Standard length of a guard shift, in hours.
pub const STANDARD_WORKING_HOURS: i64 = 12;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShiftSchedule {
    pub start: NaiveTime,
    pub late_grace_minutes: i64,
}

impl ShiftSchedule {
    pub fn for_shift(shift: ShiftType, late_grace_minutes: i64) -> Self {
        let start = match shift {
            ShiftType::DayShift => NaiveTime::from_hms_opt(6, 0, 0),
            ShiftType::NightShift => NaiveTime::from_hms_opt(18, 0, 0),
        }
        .unwrap_or_default();

        Self {
            start,
            late_grace_minutes,
        }
    }

    /// Minutes between scheduled start and `check_in`, negative when early.
    /// Wrapped into (-12h, 12h] so a night-shift check-in after midnight
    /// still reads as late rather than as most of a day early.
    fn minutes_late(&self, check_in: NaiveTime) -> i64 {
        let diff = (minute_of_day(check_in) - minute_of_day(self.start)).rem_euclid(MINUTES_PER_DAY);
        if diff > MINUTES_PER_DAY / 2 {
            diff - MINUTES_PER_DAY
        } else {
            diff
        }
    }
}

pub fn minute_of_day(t: NaiveTime) -> i64 {
    (t.num_seconds_from_midnight() / 60) as i64
}

/// Worked interval as minutes from the midnight of the check-in date.
/// A check-out earlier than the check-in is taken to be on the next day.
pub fn worked_interval(check_in: NaiveTime, check_out: NaiveTime) -> (i64, i64) {
    let start = minute_of_day(check_in);
    let mut end = minute_of_day(check_out);
    if end < start {
        end += MINUTES_PER_DAY;
    }
    (start, end)
}

pub fn worked_minutes(check_in: NaiveTime, check_out: NaiveTime) -> i64 {
    let (start, end) = worked_interval(check_in, check_out);
    end - start
}

pub fn clock_in_status(schedule: &ShiftSchedule, check_in: NaiveTime) -> AttendanceStatus {
    if schedule.minutes_late(check_in) > schedule.late_grace_minutes {
        AttendanceStatus::Late
    } else {
        AttendanceStatus::Present
    }
}

/// Status after clock-out. A late arrival stays `Late` even when the
/// shift is also cut short.
pub fn clock_out_status(
    current: AttendanceStatus,
    check_in: NaiveTime,
    check_out: NaiveTime,
) -> AttendanceStatus {
    if current == AttendanceStatus::Late {
        return AttendanceStatus::Late;
    }
    if worked_minutes(check_in, check_out) < STANDARD_WORKING_HOURS * 60 {
        AttendanceStatus::Undertime
    } else {
        AttendanceStatus::Present
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn day_shift_lateness_respects_grace() {
        let schedule = ShiftSchedule::for_shift(ShiftType::DayShift, 10);
        assert_eq!(clock_in_status(&schedule, t(5, 45)), AttendanceStatus::Present);
        assert_eq!(clock_in_status(&schedule, t(6, 10)), AttendanceStatus::Present);
        assert_eq!(clock_in_status(&schedule, t(6, 11)), AttendanceStatus::Late);
    }

    #[test]
    fn night_shift_check_in_after_midnight_is_late() {
        let schedule = ShiftSchedule::for_shift(ShiftType::NightShift, 0);
        assert_eq!(clock_in_status(&schedule, t(17, 30)), AttendanceStatus::Present);
        assert_eq!(clock_in_status(&schedule, t(1, 0)), AttendanceStatus::Late);
    }

    #[test]
    fn overnight_interval_wraps() {
        assert_eq!(worked_minutes(t(18, 0), t(6, 0)), 12 * 60);
        assert_eq!(worked_interval(t(22, 30), t(2, 0)), (22 * 60 + 30, 26 * 60));
    }

    #[test]
    fn short_shift_is_undertime_unless_late() {
        assert_eq!(
            clock_out_status(AttendanceStatus::Present, t(6, 0), t(15, 0)),
            AttendanceStatus::Undertime
        );
        assert_eq!(
            clock_out_status(AttendanceStatus::Present, t(6, 0), t(18, 0)),
            AttendanceStatus::Present
        );
        assert_eq!(
            clock_out_status(AttendanceStatus::Late, t(7, 0), t(15, 0)),
            AttendanceStatus::Late
        );
    }
}
