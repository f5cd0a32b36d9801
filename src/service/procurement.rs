//! Purchase-request status workflow.
//!
//! A request carries three status tracks. Each track is advanced by a
//! different role, and [`apply_transition`] is the only place that decides
//! which (role, state, action) combinations are legal.

use derive_more::Display;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::{
    error::AppError,
    model::{
        purchase_request::{FinanceStatus, InventoryStatus, RequestStatus, SupplierStatus},
        role::Role,
    },
    service::context::ActorContext,
};

/// An action requested against a purchase request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum WorkflowAction {
    Approve,
    Reject { reason: String },
    Return { reason: Option<String> },
    Resubmit,
    Prepare,
    Decline { reason: String },
    Ship,
    Deliver,
    Receive,
}

impl WorkflowAction {
    pub fn name(&self) -> &'static str {
        match self {
            WorkflowAction::Approve => "approve",
            WorkflowAction::Reject { .. } => "reject",
            WorkflowAction::Return { .. } => "return",
            WorkflowAction::Resubmit => "resubmit",
            WorkflowAction::Prepare => "prepare",
            WorkflowAction::Decline { .. } => "decline",
            WorkflowAction::Ship => "ship",
            WorkflowAction::Deliver => "deliver",
            WorkflowAction::Receive => "receive",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum Track {
    #[display(fmt = "finance")]
    Finance,
    #[display(fmt = "supplier")]
    Supplier,
}

/// Result of a legal transition: the statuses to write and the track whose
/// current value must still match at write time.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub track: Track,
    pub before: RequestStatus,
    pub after: RequestStatus,
    pub reason: Option<String>,
}

impl Transition {
    /// Rejections are announced to the requester.
    pub fn is_rejection(&self) -> bool {
        self.after.finance_status == FinanceStatus::Rejected
            || self.after.supplier_status == SupplierStatus::Rejected
    }
}

#[derive(Debug, Display, PartialEq)]
pub enum TransitionError {
    #[display(fmt = "A non-empty reason is required to {}", _0)]
    MissingReason(&'static str),
    #[display(fmt = "Finance has not approved this request yet (finance status: {})", _0)]
    AwaitingFinance(FinanceStatus),
    #[display(fmt = "{} may not {} a request whose {} status is {}", role, action, track, current)]
    NotPermitted {
        role: Role,
        action: &'static str,
        track: Track,
        current: String,
    },
}

impl std::error::Error for TransitionError {}

impl From<TransitionError> for AppError {
    fn from(e: TransitionError) -> Self {
        match e {
            TransitionError::MissingReason(_) => AppError::Validation(e.to_string()),
            _ => AppError::Precondition(e.to_string()),
        }
    }
}

fn required_reason(reason: &str, action: &'static str) -> Result<String, TransitionError> {
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(TransitionError::MissingReason(action));
    }
    Ok(reason.to_string())
}

/// Decide whether `actor` may apply `action` to a request currently in
/// `current`. Reasons are validated before any guard so a rejection with a
/// blank reason never reaches the state check.
pub fn apply_transition(
    current: &RequestStatus,
    requester_id: u64,
    actor: &ActorContext,
    action: &WorkflowAction,
) -> Result<Transition, TransitionError> {
    let reason = match action {
        WorkflowAction::Reject { reason } => Some(required_reason(reason, "reject")?),
        WorkflowAction::Decline { reason } => Some(required_reason(reason, "decline")?),
        WorkflowAction::Return { reason } => reason
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string),
        _ => None,
    };

    let track = match action {
        WorkflowAction::Approve
        | WorkflowAction::Reject { .. }
        | WorkflowAction::Return { .. }
        | WorkflowAction::Resubmit => Track::Finance,
        _ => Track::Supplier,
    };

    let not_permitted = || TransitionError::NotPermitted {
        role: actor.role,
        action: action.name(),
        track,
        current: match track {
            Track::Finance => current.finance_status.to_string(),
            Track::Supplier => current.supplier_status.to_string(),
        },
    };

    if track == Track::Supplier && current.finance_status != FinanceStatus::Approved {
        return Err(TransitionError::AwaitingFinance(current.finance_status));
    }

    let mut after = *current;
    match (actor.role, current.finance_status, current.supplier_status, action) {
        (Role::Finance, FinanceStatus::Pending, _, WorkflowAction::Approve) => {
            after.finance_status = FinanceStatus::Approved;
        }
        (Role::Finance, FinanceStatus::Pending, _, WorkflowAction::Reject { .. }) => {
            after.finance_status = FinanceStatus::Rejected;
        }
        (Role::Finance, FinanceStatus::Pending, _, WorkflowAction::Return { .. }) => {
            after.finance_status = FinanceStatus::Returned;
        }
        (_, FinanceStatus::Returned, _, WorkflowAction::Resubmit)
            if actor.employee_id == Some(requester_id) =>
        {
            after.finance_status = FinanceStatus::Pending;
        }
        (Role::Supplier, _, SupplierStatus::Pending, WorkflowAction::Prepare) => {
            after.supplier_status = SupplierStatus::Preparing;
        }
        (Role::Supplier, _, SupplierStatus::Pending, WorkflowAction::Decline { .. }) => {
            after.supplier_status = SupplierStatus::Rejected;
        }
        (Role::Supplier, _, SupplierStatus::Preparing, WorkflowAction::Ship) => {
            after.supplier_status = SupplierStatus::InTransit;
        }
        (Role::Supplier, _, SupplierStatus::InTransit, WorkflowAction::Deliver) => {
            after.supplier_status = SupplierStatus::Delivered;
        }
        (role, _, SupplierStatus::Delivered, WorkflowAction::Receive) if role != Role::Supplier => {
            after.supplier_status = SupplierStatus::Received;
            after.inventory_status = InventoryStatus::Received;
        }
        _ => return Err(not_permitted()),
    }

    Ok(Transition {
        track,
        before: *current,
        after,
        reason,
    })
}

/// Largest unit price the `DECIMAL(12,2)` price column holds.
pub const MAX_UNIT_PRICE: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, 2);
/// Largest line or request total the `DECIMAL(14,2)` total columns hold.
pub const MAX_TOTAL: Decimal = Decimal::from_parts(276_447_231, 23_283, 0, false, 2);

/// Line total for `quantity` units at `unit_price`, rounded half away from
/// zero to centavos.
pub fn line_total(quantity: u32, unit_price: Decimal) -> Result<Decimal, AppError> {
    Decimal::from(quantity)
        .checked_mul(unit_price)
        .map(|amount| amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
        .filter(|amount| *amount <= MAX_TOTAL)
        .ok_or_else(|| {
            AppError::Validation(format!(
                "Line total of {} x {} exceeds {}",
                quantity, unit_price, MAX_TOTAL
            ))
        })
}

/// Sum of line totals, refused once it no longer fits the total column.
pub fn order_total<I>(amounts: I) -> Result<Decimal, AppError>
where
    I: IntoIterator<Item = Decimal>,
{
    amounts.into_iter().try_fold(Decimal::ZERO, |acc, amount| {
        acc.checked_add(amount)
            .filter(|total| *total <= MAX_TOTAL)
            .ok_or_else(|| {
                AppError::Validation(format!("Purchase request total exceeds {}", MAX_TOTAL))
            })
    })
}

/// An invoice can only be printed once the goods have been received.
pub fn ensure_invoiceable(status: &RequestStatus) -> Result<(), AppError> {
    if status.supplier_status == SupplierStatus::Received {
        Ok(())
    } else {
        Err(AppError::Precondition(format!(
            "Invoice is available only after receipt (supplier status: {})",
            status.supplier_status
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const REQUESTER: u64 = 42;

    fn actor(role: Role) -> ActorContext {
        ActorContext::new(1, role)
    }

    fn approved() -> RequestStatus {
        RequestStatus {
            finance_status: FinanceStatus::Approved,
            ..RequestStatus::new()
        }
    }

    fn step(status: &RequestStatus, role: Role, action: WorkflowAction) -> Result<RequestStatus, TransitionError> {
        apply_transition(status, REQUESTER, &actor(role), &action).map(|t| t.after)
    }

    #[test]
    fn finance_decides_pending_requests() {
        let pending = RequestStatus::new();
        assert_eq!(
            step(&pending, Role::Finance, WorkflowAction::Approve).unwrap().finance_status,
            FinanceStatus::Approved
        );
        assert_eq!(
            step(&pending, Role::Finance, WorkflowAction::Return { reason: None })
                .unwrap()
                .finance_status,
            FinanceStatus::Returned
        );
        // terminal once decided
        assert!(matches!(
            step(&approved(), Role::Finance, WorkflowAction::Approve),
            Err(TransitionError::NotPermitted { .. })
        ));
        // other roles cannot decide
        assert!(step(&pending, Role::Supplier, WorkflowAction::Approve).is_err());
    }

    #[test]
    fn rejection_without_reason_fails_validation_first() {
        let pending = RequestStatus::new();
        let err = step(&pending, Role::Finance, WorkflowAction::Reject { reason: "   ".into() }).unwrap_err();
        assert_eq!(err, TransitionError::MissingReason("reject"));
        assert!(matches!(AppError::from(err), AppError::Validation(_)));

        // even from a state where rejecting would not be allowed
        let err = step(&approved(), Role::Supplier, WorkflowAction::Decline { reason: String::new() })
            .unwrap_err();
        assert_eq!(err, TransitionError::MissingReason("decline"));
    }

    #[test]
    fn rejection_records_the_reason() {
        let t = apply_transition(
            &RequestStatus::new(),
            REQUESTER,
            &actor(Role::Finance),
            &WorkflowAction::Reject { reason: " over budget ".into() },
        )
        .unwrap();
        assert_eq!(t.reason.as_deref(), Some("over budget"));
        assert!(t.is_rejection());
        assert_eq!(t.track, Track::Finance);
    }

    #[test]
    fn supplier_waits_for_finance_approval() {
        let err = step(&RequestStatus::new(), Role::Supplier, WorkflowAction::Prepare).unwrap_err();
        assert_eq!(err, TransitionError::AwaitingFinance(FinanceStatus::Pending));
    }

    #[test]
    fn supplier_advances_one_stage_at_a_time() {
        let s = step(&approved(), Role::Supplier, WorkflowAction::Prepare).unwrap();
        assert_eq!(s.supplier_status, SupplierStatus::Preparing);

        // skipping In transit is refused and leaves the state as it was
        let err = step(&s, Role::Supplier, WorkflowAction::Deliver).unwrap_err();
        assert!(matches!(err, TransitionError::NotPermitted { .. }));
        assert_eq!(s.supplier_status, SupplierStatus::Preparing);

        let s = step(&s, Role::Supplier, WorkflowAction::Ship).unwrap();
        assert_eq!(s.supplier_status, SupplierStatus::InTransit);
        // no going back
        assert!(step(&s, Role::Supplier, WorkflowAction::Prepare).is_err());
        let s = step(&s, Role::Supplier, WorkflowAction::Deliver).unwrap();
        assert_eq!(s.supplier_status, SupplierStatus::Delivered);
    }

    #[test]
    fn pending_cannot_jump_to_delivered() {
        assert!(step(&approved(), Role::Supplier, WorkflowAction::Deliver).is_err());
        assert!(step(&approved(), Role::Supplier, WorkflowAction::Ship).is_err());
        assert!(step(&approved(), Role::Inventory, WorkflowAction::Receive).is_err());
    }

    #[test]
    fn supplier_may_decline_only_before_preparing() {
        let declined = step(&approved(), Role::Supplier, WorkflowAction::Decline { reason: "out of stock".into() })
            .unwrap();
        assert_eq!(declined.supplier_status, SupplierStatus::Rejected);

        let preparing = step(&approved(), Role::Supplier, WorkflowAction::Prepare).unwrap();
        assert!(step(&preparing, Role::Supplier, WorkflowAction::Decline { reason: "late".into() }).is_err());
        assert!(step(&declined, Role::Supplier, WorkflowAction::Prepare).is_err());
    }

    #[test]
    fn receipt_is_confirmed_by_a_non_supplier() {
        let delivered = RequestStatus {
            supplier_status: SupplierStatus::Delivered,
            ..approved()
        };
        assert!(step(&delivered, Role::Supplier, WorkflowAction::Receive).is_err());

        let received = step(&delivered, Role::Inventory, WorkflowAction::Receive).unwrap();
        assert_eq!(received.supplier_status, SupplierStatus::Received);
        assert_eq!(received.inventory_status, InventoryStatus::Received);
        assert!(ensure_invoiceable(&received).is_ok());
        assert!(ensure_invoiceable(&delivered).is_err());
    }

    #[test]
    fn only_the_requester_resubmits_a_returned_request() {
        let returned = RequestStatus {
            finance_status: FinanceStatus::Returned,
            ..RequestStatus::new()
        };
        let requester = ActorContext::new(9, Role::Employee).with_employee(REQUESTER);
        let t = apply_transition(&returned, REQUESTER, &requester, &WorkflowAction::Resubmit).unwrap();
        assert_eq!(t.after.finance_status, FinanceStatus::Pending);

        let stranger = ActorContext::new(10, Role::Employee).with_employee(7);
        assert!(apply_transition(&returned, REQUESTER, &stranger, &WorkflowAction::Resubmit).is_err());
    }

    #[test]
    fn line_totals_are_rounded_to_centavos() {
        assert_eq!(line_total(3, dec!(19.995)).unwrap(), dec!(59.99));
        assert_eq!(line_total(1, dec!(0.125)).unwrap(), dec!(0.13));
        assert_eq!(line_total(0, dec!(250)).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn column_limits_match_the_schema() {
        assert_eq!(MAX_UNIT_PRICE, dec!(9999999999.99));
        assert_eq!(MAX_TOTAL, dec!(999999999999.99));
    }

    #[test]
    fn oversized_amounts_are_refused_instead_of_overflowing() {
        assert!(matches!(line_total(2, Decimal::MAX), Err(AppError::Validation(_))));
        assert!(matches!(
            line_total(u32::MAX, MAX_UNIT_PRICE),
            Err(AppError::Validation(_))
        ));
        assert_eq!(line_total(100, MAX_UNIT_PRICE).unwrap(), dec!(999999999999.00));

        assert_eq!(order_total([dec!(10.50), dec!(0.25)]).unwrap(), dec!(10.75));
        assert_eq!(order_total(Vec::<Decimal>::new()).unwrap(), Decimal::ZERO);
        assert!(matches!(
            order_total([MAX_TOTAL, dec!(0.01)]),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            order_total([Decimal::MAX, Decimal::MAX]),
            Err(AppError::Validation(_))
        ));
    }
}
