use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::leave_request::LeaveStatus;

/// Extra shifts share the Pending/Approved/Rejected lifecycle of leave.
pub type ExtraShiftStatus = LeaveStatus;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct ExtraShift {
    pub id: u64,
    pub employee_id: u64,
    #[schema(value_type = String, format = "date-time")]
    pub start_at: NaiveDateTime,
    #[schema(value_type = String, format = "date-time")]
    pub end_at: NaiveDateTime,
    #[schema(example = "relief")]
    pub shift_type: String,
    pub status: ExtraShiftStatus,
}
