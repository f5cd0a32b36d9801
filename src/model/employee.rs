use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema, Display, EnumString,
)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ShiftType {
    #[strum(serialize = "Day Shift")]
    DayShift,
    #[strum(serialize = "Night Shift")]
    NightShift,
}

/// Onboarding stages in the order an applicant goes through them.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    sqlx::Type,
    ToSchema,
    Display,
    EnumString,
    EnumIter,
)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TrainingStage {
    #[strum(serialize = "Initial Interview")]
    InitialInterview,
    #[strum(serialize = "Final Interview")]
    FinalInterview,
    #[strum(serialize = "Orientation")]
    Orientation,
    #[strum(serialize = "Physical Training")]
    PhysicalTraining,
    #[strum(serialize = "Customer Service Training")]
    CustomerServiceTraining,
    #[strum(serialize = "Deployment")]
    Deployment,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema, Display, EnumString,
)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Ongoing,
    Passed,
    Failed,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "employee_code": "EMP-001",
        "first_name": "Juan",
        "last_name": "Dela Cruz",
        "email": "juan.delacruz@company.com",
        "phone": "+639171234567",
        "branch_id": 2,
        "hire_date": "2026-01-05",
        "shift_type": "night_shift",
        "training_status": "physical_training",
        "application_status": "ongoing"
    })
)]
pub struct Employee {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "EMP-001")]
    pub employee_code: String,

    #[schema(example = "Juan")]
    pub first_name: String,

    #[schema(example = "Dela Cruz")]
    pub last_name: String,

    #[schema(example = "juan.delacruz@company.com")]
    pub email: String,

    #[schema(example = "+639171234567", nullable = true)]
    pub phone: Option<String>,

    #[schema(example = 2, nullable = true)]
    pub branch_id: Option<u64>,

    #[schema(
        example = "2026-01-05",
        value_type = String,
        format = "date"
    )]
    pub hire_date: NaiveDate,

    pub shift_type: ShiftType,

    pub training_status: TrainingStage,

    pub application_status: ApplicationStatus,
}

impl Employee {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
