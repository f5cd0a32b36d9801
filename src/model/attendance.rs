use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use strum_macros::Display;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema, Display)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    Present,
    Late,
    Undertime,
    Absent,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Attendance {
    pub id: u64,
    pub employee_id: u64,
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(value_type = Option<String>, example = "06:02:00")]
    pub check_in: Option<NaiveTime>,
    #[schema(value_type = Option<String>, example = "18:00:00")]
    pub check_out: Option<NaiveTime>,
    pub status: AttendanceStatus,
}

impl Attendance {
    /// Both timestamps, when the shift has been closed.
    pub fn worked_span(&self) -> Option<(NaiveTime, NaiveTime)> {
        Some((self.check_in?, self.check_out?))
    }
}
