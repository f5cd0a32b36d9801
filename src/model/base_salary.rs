use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum_macros::Display;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema, Display)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SalaryType {
    Hourly,
    Daily,
    Fixed,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct BaseSalary {
    pub employee_id: u64,
    pub salary_type: SalaryType,
    /// Monthly figure every payroll rate is derived from.
    #[schema(value_type = String, example = "15000.00")]
    pub amount: Decimal,
}
