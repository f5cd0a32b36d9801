use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A saved payslip. The computed breakdown is stored as JSON next to the
/// rendered document reference.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct PayslipRecord {
    pub id: u64,
    pub employee_id: u64,
    #[schema(value_type = String, format = "date")]
    pub month: NaiveDate,
    #[schema(value_type = String, example = "8775.00")]
    pub net_pay: Decimal,
    #[schema(value_type = Object)]
    pub breakdown: sqlx::types::Json<serde_json::Value>,
    pub document_url: String,
    pub ledger_reference: Option<String>,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
}
