use chrono::{Datelike, NaiveDate};
use derive_more::Display;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppError,
    model::leave_request::{LeaveRequest, LeaveStatus},
};

/// Paid leave days granted per calendar year.
pub const YEARLY_PAID_LEAVE_ALLOWANCE: Decimal = dec!(5);

#[derive(Debug, Display, PartialEq)]
pub enum LeaveError {
    #[display(fmt = "start_date cannot be after end_date")]
    EndBeforeStart,
    #[display(fmt = "A reason is required for leave requests")]
    MissingReason,
    #[display(
        fmt = "Insufficient paid leave: requested {} day(s), {} available",
        requested,
        available
    )]
    InsufficientBalance { requested: Decimal, available: Decimal },
}

impl std::error::Error for LeaveError {}

impl From<LeaveError> for AppError {
    fn from(e: LeaveError) -> Self {
        AppError::Validation(e.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct LeaveBalance {
    pub year: i32,
    #[schema(value_type = String, example = "5")]
    pub allowance: Decimal,
    #[schema(value_type = String, example = "2")]
    pub used: Decimal,
    #[schema(value_type = String, example = "3")]
    pub available: Decimal,
}

/// Paid days used in `year`. Pending requests count against the balance
/// so a second request cannot spend the same days twice.
pub fn paid_days_used(records: &[LeaveRequest], year: i32) -> Decimal {
    records
        .iter()
        .filter(|r| r.is_paid && r.status != LeaveStatus::Rejected && r.start_date.year() == year)
        .map(|r| r.days_used)
        .sum()
}

pub fn balance(records: &[LeaveRequest], year: i32) -> LeaveBalance {
    let used = paid_days_used(records, year);
    LeaveBalance {
        year,
        allowance: YEARLY_PAID_LEAVE_ALLOWANCE,
        used,
        available: YEARLY_PAID_LEAVE_ALLOWANCE - used,
    }
}

/// Inclusive day count of a leave request.
pub fn days_requested(start: NaiveDate, end: NaiveDate) -> Result<Decimal, LeaveError> {
    if start > end {
        return Err(LeaveError::EndBeforeStart);
    }
    Ok(Decimal::from((end - start).num_days() + 1))
}

pub fn validate_request(
    existing: &[LeaveRequest],
    start: NaiveDate,
    end: NaiveDate,
    is_paid: bool,
    reason: &str,
) -> Result<Decimal, LeaveError> {
    let days = days_requested(start, end)?;
    if reason.trim().is_empty() {
        return Err(LeaveError::MissingReason);
    }
    if is_paid {
        let available = balance(existing, start.year()).available;
        if days > available {
            return Err(LeaveError::InsufficientBalance {
                requested: days,
                available,
            });
        }
    }
    Ok(days)
}
