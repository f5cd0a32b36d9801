//! Payslip computation.
//!
//! Everything here is a pure function of the records handed in: the same
//! inputs always produce the same payslip, and nothing is written until the
//! caller decides to save the result.
//!
//! Money is carried as [`Decimal`]. Rates stay unrounded; every line item is
//! rounded to centavos before it is summed, so the totals and net pay add
//! up exactly from the printed lines.

use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate, Weekday};
use derive_more::Display;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::AppError,
    model::{
        attendance::{Attendance, AttendanceStatus},
        base_salary::BaseSalary,
        employee::ShiftType,
        extra_shift::{ExtraShift, ExtraShiftStatus},
        holiday::{HolidayCalendar, HolidayKind},
        leave_request::{LeaveRequest, LeaveStatus},
    },
    service::{
        attendance_rules::{STANDARD_WORKING_HOURS, worked_interval, worked_minutes},
        leave_balance,
    },
};

/// Night-differential window [22:00, 06:00) in minutes from the midnight of
/// the check-in date: the tail of the previous night and the coming night.
const NIGHT_WINDOWS: [(i64, i64); 2] = [(-2 * 60, 6 * 60), (22 * 60, 30 * 60)];

/// Rates and percentages applied by the calculator.
#[derive(Debug, Clone, PartialEq)]
pub struct PayrollPolicy {
    pub days_per_month: Decimal,
    pub standard_working_hours: Decimal,
    /// Flat pay per overtime hour, independent of the employee's own rate.
    pub overtime_hourly_pay: Decimal,
    pub regular_holiday_multiplier: Decimal,
    pub special_holiday_multiplier: Decimal,
    pub night_differential_rate: Decimal,
    pub sss_rate: Decimal,
    pub philhealth_rate: Decimal,
    pub pagibig_rate: Decimal,
    pub tin_rate: Decimal,
    pub bat_rate: Decimal,
    pub bonus_rate: Decimal,
}

impl Default for PayrollPolicy {
    fn default() -> Self {
        Self {
            days_per_month: dec!(30),
            standard_working_hours: Decimal::from(STANDARD_WORKING_HOURS),
            overtime_hourly_pay: dec!(100),
            regular_holiday_multiplier: dec!(2),
            special_holiday_multiplier: dec!(1.3),
            night_differential_rate: dec!(0.1),
            sss_rate: dec!(0.05),
            philhealth_rate: dec!(0.035),
            pagibig_rate: dec!(0.03),
            tin_rate: dec!(0.10),
            bat_rate: dec!(0.20),
            bonus_rate: dec!(0.10),
        }
    }
}

#[derive(Debug, Display, PartialEq)]
pub enum PayrollError {
    #[display(fmt = "No base salary on record for this employee, payslip cannot be computed")]
    MissingBaseSalary,
    #[display(fmt = "Base salary must not be negative")]
    NegativeBaseSalary,
    #[display(fmt = "Invalid pay period {}-{}", _0, _1)]
    InvalidPeriod(i32, u32),
}

impl std::error::Error for PayrollError {}

impl From<PayrollError> for AppError {
    fn from(e: PayrollError) -> Self {
        match e {
            PayrollError::MissingBaseSalary => AppError::Precondition(e.to_string()),
            PayrollError::NegativeBaseSalary | PayrollError::InvalidPeriod(..) => {
                AppError::Validation(e.to_string())
            }
        }
    }
}

/// One calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl PayPeriod {
    pub fn month(year: i32, month: u32) -> Result<Self, PayrollError> {
        let start =
            NaiveDate::from_ymd_opt(year, month, 1).ok_or(PayrollError::InvalidPeriod(year, month))?;
        let next = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)
        };
        let end = next
            .and_then(|d| d.pred_opt())
            .ok_or(PayrollError::InvalidPeriod(year, month))?;
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Everything the calculator reads for one employee and one month.
pub struct PayrollInput<'a> {
    pub shift_type: ShiftType,
    pub period: PayPeriod,
    /// Absence is counted up to and including this date.
    pub today: NaiveDate,
    pub base_salary: Option<&'a BaseSalary>,
    pub attendance: &'a [Attendance],
    /// Leave records of the period's year; used for leave pay and the bonus.
    pub leaves: &'a [LeaveRequest],
    pub extra_shifts: &'a [ExtraShift],
    pub holidays: &'a HolidayCalendar,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Earnings {
    #[schema(value_type = String)]
    pub basic: Decimal,
    #[schema(value_type = String)]
    pub overtime: Decimal,
    #[schema(value_type = String)]
    pub regular_holiday_pay: Decimal,
    #[schema(value_type = String)]
    pub special_holiday_pay: Decimal,
    #[schema(value_type = String)]
    pub leave_pay: Decimal,
    #[schema(value_type = String)]
    pub night_differential: Decimal,
    #[schema(value_type = String)]
    pub bonus: Decimal,
}

impl Earnings {
    /// Night differential and bonus are added to net pay separately.
    pub fn total(&self) -> Decimal {
        self.basic
            + self.overtime
            + self.regular_holiday_pay
            + self.special_holiday_pay
            + self.leave_pay
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Deductions {
    #[schema(value_type = String)]
    pub sss: Decimal,
    #[schema(value_type = String)]
    pub philhealth: Decimal,
    #[schema(value_type = String)]
    pub pagibig: Decimal,
    #[schema(value_type = String)]
    pub tin: Decimal,
    #[schema(value_type = String)]
    pub absent_deduction: Decimal,
    #[schema(value_type = String)]
    pub undertime_deduction: Decimal,
    #[schema(value_type = String)]
    pub bat_deduction: Decimal,
}

impl Deductions {
    pub fn total(&self) -> Decimal {
        self.sss
            + self.philhealth
            + self.pagibig
            + self.tin
            + self.absent_deduction
            + self.undertime_deduction
            + self.bat_deduction
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Payslip {
    #[schema(value_type = String, format = "date")]
    pub period_start: NaiveDate,
    #[schema(value_type = String, format = "date")]
    pub period_end: NaiveDate,
    #[schema(value_type = String)]
    pub daily_rate: Decimal,
    #[schema(value_type = String)]
    pub hourly_rate: Decimal,
    pub overtime_hours: i64,
    pub regular_holidays_worked: u32,
    pub special_holidays_worked: u32,
    pub paid_leaves: u32,
    pub absent_days: u32,
    #[schema(value_type = String)]
    pub undertime_hours: Decimal,
    #[schema(value_type = String)]
    pub night_hours: Decimal,
    pub earnings: Earnings,
    pub deductions: Deductions,
    #[schema(value_type = String)]
    pub total_earnings: Decimal,
    #[schema(value_type = String)]
    pub total_deductions: Decimal,
    #[schema(value_type = String)]
    pub net_pay: Decimal,
}

fn money(d: Decimal) -> Decimal {
    d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

fn minutes_to_hours(minutes: i64) -> Decimal {
    money(Decimal::from(minutes) / dec!(60))
}

fn overlap(start: i64, end: i64, window: (i64, i64)) -> i64 {
    (end.min(window.1) - start.max(window.0)).max(0)
}

pub fn compute_payslip(input: &PayrollInput<'_>, policy: &PayrollPolicy) -> Result<Payslip, PayrollError> {
    let base = input
        .base_salary
        .map(|s| s.amount)
        .ok_or(PayrollError::MissingBaseSalary)?;
    if base.is_sign_negative() {
        return Err(PayrollError::NegativeBaseSalary);
    }

    let period = input.period;
    let daily_rate = base / policy.days_per_month;
    let hourly_rate = daily_rate / policy.standard_working_hours;

    let attendance: Vec<&Attendance> = input
        .attendance
        .iter()
        .filter(|a| period.contains(a.date) && a.status != AttendanceStatus::Absent)
        .collect();
    let attended: BTreeSet<NaiveDate> = attendance.iter().map(|a| a.date).collect();

    // overtime
    let overtime_minutes: i64 = input
        .extra_shifts
        .iter()
        .filter(|s| s.status == ExtraShiftStatus::Approved && period.contains(s.start_at.date()))
        .map(|s| (s.end_at - s.start_at).num_minutes().max(0))
        .sum();
    let overtime_hours = overtime_minutes / 60;
    let overtime = money(Decimal::from(overtime_hours) * policy.overtime_hourly_pay);

    // holidays worked
    let (mut regular_days, mut special_days) = (0u32, 0u32);
    for date in &attended {
        match input.holidays.kind_of(*date) {
            Some(HolidayKind::Regular) => regular_days += 1,
            Some(HolidayKind::Special) => special_days += 1,
            None => {}
        }
    }
    let regular_holiday_pay =
        money(Decimal::from(regular_days) * daily_rate * policy.regular_holiday_multiplier);
    let special_holiday_pay =
        money(Decimal::from(special_days) * daily_rate * policy.special_holiday_multiplier);

    let paid_leaves = input
        .leaves
        .iter()
        .filter(|l| l.status == LeaveStatus::Approved && l.is_paid && l.overlaps(period.start, period.end))
        .count() as u32;
    let leave_pay = money(Decimal::from(paid_leaves) * daily_rate);

    // night differential and undertime over closed shifts
    let standard_minutes = STANDARD_WORKING_HOURS * 60;
    let (mut night_minutes, mut undertime_minutes) = (0i64, 0i64);
    for (check_in, check_out) in attendance.iter().filter_map(|a| a.worked_span()) {
        if input.shift_type == ShiftType::NightShift {
            let (start, end) = worked_interval(check_in, check_out);
            night_minutes += NIGHT_WINDOWS.iter().map(|w| overlap(start, end, *w)).sum::<i64>();
        }
        let worked = worked_minutes(check_in, check_out);
        if worked < standard_minutes {
            undertime_minutes += standard_minutes - worked;
        }
    }
    let night_differential = money(
        Decimal::from(night_minutes) / dec!(60) * hourly_rate * policy.night_differential_rate,
    );
    let undertime_deduction = money(Decimal::from(undertime_minutes) / dec!(60) * hourly_rate);

    let absent_days = count_absent_days(period, input.today, &attended, input.holidays);
    let absent_deduction = money(Decimal::from(absent_days) * daily_rate);

    let bonus = if leave_balance::paid_days_used(input.leaves, period.start.year()).is_zero() {
        money(base * policy.bonus_rate)
    } else {
        Decimal::ZERO
    };

    let earnings = Earnings {
        basic: money(base),
        overtime,
        regular_holiday_pay,
        special_holiday_pay,
        leave_pay,
        night_differential,
        bonus,
    };
    let deductions = Deductions {
        sss: money(base * policy.sss_rate),
        philhealth: money(base * policy.philhealth_rate),
        pagibig: money(base * policy.pagibig_rate),
        tin: money(base * policy.tin_rate),
        absent_deduction,
        undertime_deduction,
        bat_deduction: money(base * policy.bat_rate),
    };

    let total_earnings = earnings.total();
    let total_deductions = deductions.total();
    let net_pay = total_earnings + earnings.bonus + earnings.night_differential - total_deductions;

    Ok(Payslip {
        period_start: period.start,
        period_end: period.end,
        daily_rate: money(daily_rate),
        hourly_rate: money(hourly_rate),
        overtime_hours,
        regular_holidays_worked: regular_days,
        special_holidays_worked: special_days,
        paid_leaves,
        absent_days,
        undertime_hours: minutes_to_hours(undertime_minutes),
        night_hours: minutes_to_hours(night_minutes),
        earnings,
        deductions,
        total_earnings,
        total_deductions,
        net_pay,
    })
}

/// Ledger line booked when a payslip is saved.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerEntry {
    pub reference: String,
    pub amount: Decimal,
}

/// Only the BAT deduction is booked. A payslip without one books nothing.
pub fn ledger_entry_for(payslip: &Payslip) -> Option<LedgerEntry> {
    let amount = payslip.deductions.bat_deduction;
    (amount > Decimal::ZERO).then(|| LedgerEntry {
        reference: Uuid::new_v4().to_string(),
        amount,
    })
}

/// Weekdays from the start of the period through `today` with no attendance
/// that are not holidays.
fn count_absent_days(
    period: PayPeriod,
    today: NaiveDate,
    attended: &BTreeSet<NaiveDate>,
    holidays: &HolidayCalendar,
) -> u32 {
    let last = today.min(period.end);
    period
        .start
        .iter_days()
        .take_while(|d| *d <= last)
        .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
        .filter(|d| !attended.contains(d) && !holidays.is_holiday(*d))
        .count() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        base_salary::SalaryType,
        holiday::Holiday,
        leave_request::LeaveType,
    };
    use crate::service::leave_balance::tests::leave;
    use chrono::{NaiveDateTime, NaiveTime};

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, m, day).unwrap()
    }

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn dt(m: u32, day: u32, h: u32, min: u32) -> NaiveDateTime {
        d(m, day).and_time(t(h, min))
    }

    fn salary(amount: Decimal) -> BaseSalary {
        BaseSalary {
            employee_id: 7,
            salary_type: SalaryType::Fixed,
            amount,
        }
    }

    fn shift(date: NaiveDate, check_in: NaiveTime, check_out: NaiveTime) -> Attendance {
        Attendance {
            id: 0,
            employee_id: 7,
            date,
            check_in: Some(check_in),
            check_out: Some(check_out),
            status: AttendanceStatus::Present,
        }
    }

    /// A full 06:00-18:00 shift on every weekday of June 2026.
    fn full_june() -> Vec<Attendance> {
        d(6, 1)
            .iter_days()
            .take_while(|x| *x <= d(6, 30))
            .filter(|x| !matches!(x.weekday(), Weekday::Sat | Weekday::Sun))
            .map(|x| shift(x, t(6, 0), t(18, 0)))
            .collect()
    }

    fn extra(start: NaiveDateTime, end: NaiveDateTime, status: ExtraShiftStatus) -> ExtraShift {
        ExtraShift {
            id: 0,
            employee_id: 7,
            start_at: start,
            end_at: end,
            shift_type: "relief".into(),
            status,
        }
    }

    struct Case {
        shift_type: ShiftType,
        salary: Option<BaseSalary>,
        attendance: Vec<Attendance>,
        leaves: Vec<LeaveRequest>,
        extra_shifts: Vec<ExtraShift>,
        holidays: HolidayCalendar,
        today: NaiveDate,
    }

    impl Case {
        fn june() -> Self {
            Self {
                shift_type: ShiftType::DayShift,
                salary: Some(salary(dec!(15000))),
                attendance: Vec::new(),
                leaves: Vec::new(),
                extra_shifts: Vec::new(),
                holidays: HolidayCalendar::default(),
                today: d(6, 30),
            }
        }

        fn run(&self) -> Result<Payslip, PayrollError> {
            let input = PayrollInput {
                shift_type: self.shift_type,
                period: PayPeriod::month(2026, 6).unwrap(),
                today: self.today,
                base_salary: self.salary.as_ref(),
                attendance: &self.attendance,
                leaves: &self.leaves,
                extra_shifts: &self.extra_shifts,
                holidays: &self.holidays,
            };
            compute_payslip(&input, &PayrollPolicy::default())
        }
    }

    fn assert_balanced(p: &Payslip) {
        assert_eq!(
            p.net_pay,
            p.total_earnings + p.earnings.bonus + p.earnings.night_differential - p.total_deductions
        );
    }

    #[test]
    fn missing_base_salary_is_a_precondition_failure() {
        let mut case = Case::june();
        case.salary = None;
        let err = case.run().unwrap_err();
        assert_eq!(err, PayrollError::MissingBaseSalary);
        assert!(matches!(AppError::from(err), AppError::Precondition(_)));
    }

    #[test]
    fn full_attendance_without_bonus_nets_8775() {
        let mut case = Case::june();
        case.attendance = full_june();
        // paid leave taken earlier in the year removes the bonus but adds no leave pay in June
        case.leaves = vec![leave(d(3, 2), 1, true, LeaveStatus::Approved)];

        let p = case.run().unwrap();
        assert_eq!(p.absent_days, 0);
        assert_eq!(p.earnings.leave_pay, Decimal::ZERO);
        assert_eq!(p.earnings.bonus, Decimal::ZERO);
        assert_eq!(p.deductions.sss, dec!(750));
        assert_eq!(p.deductions.philhealth, dec!(525));
        assert_eq!(p.deductions.pagibig, dec!(450));
        assert_eq!(p.deductions.tin, dec!(1500));
        assert_eq!(p.deductions.bat_deduction, dec!(3000));
        assert_eq!(p.total_deductions, dec!(6225));
        assert_eq!(p.net_pay, dec!(8775));
        assert_balanced(&p);
    }

    #[test]
    fn bonus_granted_only_without_paid_leave_this_year() {
        let mut case = Case::june();
        case.attendance = full_june();
        let with_bonus = case.run().unwrap();
        assert_eq!(with_bonus.earnings.bonus, dec!(1500));
        assert_eq!(with_bonus.net_pay, dec!(10275));

        // unpaid and rejected leave do not touch the bonus
        case.leaves = vec![
            leave(d(2, 2), 2, false, LeaveStatus::Approved),
            leave(d(4, 6), 1, true, LeaveStatus::Rejected),
        ];
        assert_eq!(case.run().unwrap().earnings.bonus, dec!(1500));

        case.leaves.push(leave(d(1, 12), 1, true, LeaveStatus::Approved));
        let first = case.run().unwrap();
        let second = case.run().unwrap();
        assert_eq!(first.earnings.bonus, Decimal::ZERO);
        assert_eq!(first, second);
    }

    #[test]
    fn empty_month_is_basic_pay_minus_flat_and_absence_deductions() {
        let p = Case::june().run().unwrap();
        // June 2026 has 22 weekdays
        assert_eq!(p.absent_days, 22);
        assert_eq!(p.total_earnings, dec!(15000));
        assert_eq!(p.earnings.overtime, Decimal::ZERO);
        assert_eq!(p.earnings.leave_pay, Decimal::ZERO);
        assert_eq!(p.earnings.night_differential, Decimal::ZERO);
        assert_eq!(p.deductions.absent_deduction, dec!(11000));
        assert_eq!(p.deductions.undertime_deduction, Decimal::ZERO);
        assert_eq!(p.total_deductions, dec!(6225) + dec!(11000));
        assert_eq!(p.net_pay, dec!(15000) + dec!(1500) - dec!(17225));
        assert_balanced(&p);
    }

    #[test]
    fn absence_stops_at_today_and_skips_holidays() {
        let mut case = Case::june();
        case.today = d(6, 12);
        case.holidays = HolidayCalendar::new([Holiday {
            date: d(6, 12),
            kind: HolidayKind::Regular,
        }]);
        // June 1-11 has 9 weekdays; the 12th is a holiday
        assert_eq!(case.run().unwrap().absent_days, 9);

        case.today = d(5, 31);
        assert_eq!(case.run().unwrap().absent_days, 0);
    }

    #[test]
    fn holiday_attendance_is_paid_at_premium() {
        let mut case = Case::june();
        case.holidays = HolidayCalendar::new([
            Holiday { date: d(6, 12), kind: HolidayKind::Regular },
            Holiday { date: d(6, 24), kind: HolidayKind::Special },
        ]);
        case.attendance = vec![
            shift(d(6, 12), t(6, 0), t(18, 0)),
            shift(d(6, 24), t(6, 0), t(18, 0)),
            shift(d(6, 24), t(6, 0), t(18, 0)),
        ];
        let p = case.run().unwrap();
        assert_eq!(p.regular_holidays_worked, 1);
        assert_eq!(p.special_holidays_worked, 1);
        assert_eq!(p.earnings.regular_holiday_pay, dec!(1000));
        assert_eq!(p.earnings.special_holiday_pay, dec!(650));
        assert_balanced(&p);
    }

    #[test]
    fn overtime_counts_whole_hours_of_approved_shifts() {
        let mut case = Case::june();
        case.extra_shifts = vec![
            extra(dt(6, 6, 8, 0), dt(6, 6, 10, 30), ExtraShiftStatus::Approved),
            extra(dt(6, 13, 8, 0), dt(6, 13, 9, 0), ExtraShiftStatus::Approved),
            extra(dt(6, 20, 8, 0), dt(6, 20, 16, 0), ExtraShiftStatus::Pending),
            extra(dt(5, 30, 8, 0), dt(5, 30, 16, 0), ExtraShiftStatus::Approved),
        ];
        let p = case.run().unwrap();
        assert_eq!(p.overtime_hours, 3);
        assert_eq!(p.earnings.overtime, dec!(300));
    }

    #[test]
    fn approved_paid_leave_in_period_is_paid_per_record() {
        let mut case = Case::june();
        case.leaves = vec![
            leave(d(6, 3), 2, true, LeaveStatus::Approved),
            leave(d(6, 17), 1, true, LeaveStatus::Approved),
            leave(d(6, 22), 1, true, LeaveStatus::Pending),
            leave(d(6, 25), 1, false, LeaveStatus::Approved),
        ];
        case.leaves[1].leave_type = LeaveType::Sick;
        let p = case.run().unwrap();
        assert_eq!(p.paid_leaves, 2);
        assert_eq!(p.earnings.leave_pay, dec!(1000));
        assert_eq!(p.earnings.bonus, Decimal::ZERO);
    }

    #[test]
    fn night_differential_only_for_night_shift() {
        let mut case = Case::june();
        case.attendance = vec![shift(d(6, 1), t(18, 0), t(6, 0))];
        assert_eq!(case.run().unwrap().earnings.night_differential, Decimal::ZERO);

        case.shift_type = ShiftType::NightShift;
        let p = case.run().unwrap();
        assert_eq!(p.night_hours, dec!(8));
        // 8h x (500 / 12) x 0.1
        assert_eq!(p.earnings.night_differential, dec!(33.33));
        assert_balanced(&p);
    }

    #[test]
    fn night_overlap_covers_shift_started_after_midnight() {
        let mut case = Case::june();
        case.shift_type = ShiftType::NightShift;
        case.attendance = vec![shift(d(6, 2), t(2, 0), t(14, 0))];
        assert_eq!(case.run().unwrap().night_hours, dec!(4));
    }

    #[test]
    fn short_shifts_accumulate_undertime() {
        let mut case = Case::june();
        case.attendance = vec![
            shift(d(6, 1), t(6, 0), t(16, 0)),
            shift(d(6, 2), t(6, 0), t(17, 30)),
            Attendance {
                check_out: None,
                ..shift(d(6, 3), t(6, 0), t(6, 0))
            },
        ];
        let p = case.run().unwrap();
        assert_eq!(p.undertime_hours, dec!(2.5));
        // 2.5h x 41.666...
        assert_eq!(p.deductions.undertime_deduction, dec!(104.17));
        assert_balanced(&p);
    }

    #[test]
    fn rounding_keeps_net_pay_exact() {
        let mut case = Case::june();
        case.salary = Some(salary(dec!(18333.33)));
        case.shift_type = ShiftType::NightShift;
        case.today = d(6, 19);
        case.attendance = vec![
            shift(d(6, 1), t(18, 7), t(5, 41)),
            shift(d(6, 2), t(19, 13), t(6, 2)),
        ];
        case.extra_shifts = vec![extra(dt(6, 5, 1, 0), dt(6, 5, 5, 59), ExtraShiftStatus::Approved)];
        let p = case.run().unwrap();
        assert_eq!(p.net_pay.scale(), 2);
        assert_balanced(&p);
    }

    #[test]
    fn ledger_entry_only_for_a_nonzero_bat_deduction() {
        let mut case = Case::june();
        case.attendance = full_june();
        let p = case.run().unwrap();
        let entry = ledger_entry_for(&p).unwrap();
        assert_eq!(entry.amount, dec!(3000));
        assert_eq!(entry.amount, p.deductions.bat_deduction);
        assert!(Uuid::parse_str(&entry.reference).is_ok());
        assert_ne!(ledger_entry_for(&p).unwrap().reference, entry.reference);

        case.salary = Some(salary(Decimal::ZERO));
        let unpaid = case.run().unwrap();
        assert_eq!(unpaid.deductions.bat_deduction, Decimal::ZERO);
        assert_eq!(ledger_entry_for(&unpaid), None);
    }

    #[test]
    fn paid_leave_spilling_over_new_year_is_paid_in_january() {
        let december = NaiveDate::from_ymd_opt(2025, 12, 29).unwrap();
        let leaves = vec![leave(december, 5, true, LeaveStatus::Approved)];
        let holidays = HolidayCalendar::default();
        let base = salary(dec!(15000));
        let input = PayrollInput {
            shift_type: ShiftType::DayShift,
            period: PayPeriod::month(2026, 1).unwrap(),
            today: d(1, 31),
            base_salary: Some(&base),
            attendance: &[],
            leaves: &leaves,
            extra_shifts: &[],
            holidays: &holidays,
        };
        let p = compute_payslip(&input, &PayrollPolicy::default()).unwrap();
        assert_eq!(p.paid_leaves, 1);
        assert_eq!(p.earnings.leave_pay, dec!(500));
        // the days were drawn from the 2025 allowance
        assert_eq!(p.earnings.bonus, dec!(1500));
    }

    #[test]
    fn period_bounds_and_invalid_month() {
        let feb = PayPeriod::month(2028, 2).unwrap();
        assert_eq!(feb.end, NaiveDate::from_ymd_opt(2028, 2, 29).unwrap());
        let dec_ = PayPeriod::month(2026, 12).unwrap();
        assert_eq!(dec_.end, d(12, 31));
        assert_eq!(PayPeriod::month(2026, 13), Err(PayrollError::InvalidPeriod(2026, 13)));
    }
}
