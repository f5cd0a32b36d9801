use crate::api::extra_shift::CreateExtraShift;
use crate::api::holiday::HolidayEntry;
use crate::api::leave_request::{CreateLeave, LeaveFilter, LeaveListResponse};
use crate::api::payroll::{PaginatedPayslipResponse, PayrollQuery, SavePayslip, UpsertBaseSalary};
use crate::api::purchase_request::{
    CreatePurchaseRequest, Invoice, NewItem, PurchaseRequestDetail, StatusAction, TransitionResponse,
};
use crate::api::training::{EvaluationResponse, ProgressResponse, RubricResponse, SubmitEvaluation};
use crate::model::attendance::AttendanceStatus;
use crate::model::base_salary::{BaseSalary, SalaryType};
use crate::model::employee::{ApplicationStatus, Employee, ShiftType, TrainingStage};
use crate::model::extra_shift::ExtraShift;
use crate::model::holiday::HolidayKind;
use crate::model::leave_request::{LeaveRequest, LeaveStatus, LeaveType};
use crate::model::payslip::PayslipRecord;
use crate::model::purchase_request::{
    FinanceStatus, InventoryStatus, PurchaseItem, PurchaseRequest, RequestStatus, SupplierStatus,
};
use crate::service::leave_balance::LeaveBalance;
use crate::service::payroll::{Deductions, Earnings, Payslip};
use crate::service::training::{
    DeploymentAssignment, Evaluation, EvaluationOutcome, TrainingProgress,
};
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "GuardHR API",
        version = "1.0.0",
        description = r#"
## Security-services HR backend

Back office for a security-guard agency: the guards' time records and pay,
the company's purchasing pipeline, and applicant onboarding.

### Key Features
- **Attendance**: shift-aware clock-in/out (Day 06:00-18:00, Night 18:00-06:00)
- **Leave and extra shifts**: filing, paid-leave balance, HR decisions
- **Payroll**: itemised payslip preview and save with a ledger entry
- **Procurement**: finance, supplier and inventory status tracks per purchase request
- **Training**: interview, orientation, rubric-scored training and deployment

### Security
Every endpoint requires a **JWT Bearer** access token. Role checks are done
per operation (HR/Admin, Finance, Supplier, employee self-service).

### Errors
Failures are returned as `{"message": "..."}` with 400 (validation),
401 (missing or invalid token), 403 (role), 404 (missing), 409 (concurrent change), 422 (not allowed in the
current state) or 502 (external write failed).
"#,
    ),
    paths(
        crate::api::attendance::check_in,
        crate::api::attendance::check_out,

        crate::api::leave_request::create_leave,
        crate::api::leave_request::leave_list,
        crate::api::leave_request::leave_balance,
        crate::api::leave_request::get_leave,
        crate::api::leave_request::approve_leave,
        crate::api::leave_request::reject_leave,

        crate::api::extra_shift::create_extra_shift,
        crate::api::extra_shift::approve_extra_shift,
        crate::api::extra_shift::reject_extra_shift,

        crate::api::holiday::list_holidays,
        crate::api::holiday::upsert_holiday,

        crate::api::payroll::upsert_base_salary,
        crate::api::payroll::get_base_salary,
        crate::api::payroll::preview_payslip,
        crate::api::payroll::save_payslip,
        crate::api::payroll::list_payslips,

        crate::api::purchase_request::create_purchase_request,
        crate::api::purchase_request::get_purchase_request,
        crate::api::purchase_request::update_status,
        crate::api::purchase_request::get_invoice,

        crate::api::training::get_progress,
        crate::api::training::submit_evaluation,
        crate::api::training::assign_deployment,
        crate::api::training::reset_application,
        crate::api::training::get_rubric
    ),
    components(
        schemas(
            AttendanceStatus,
            ShiftType,
            TrainingStage,
            ApplicationStatus,
            Employee,
            CreateLeave,
            LeaveType,
            LeaveStatus,
            LeaveRequest,
            LeaveFilter,
            LeaveListResponse,
            LeaveBalance,
            CreateExtraShift,
            ExtraShift,
            HolidayKind,
            HolidayEntry,
            SalaryType,
            BaseSalary,
            UpsertBaseSalary,
            SavePayslip,
            PayrollQuery,
            Earnings,
            Deductions,
            Payslip,
            PayslipRecord,
            PaginatedPayslipResponse,
            FinanceStatus,
            SupplierStatus,
            InventoryStatus,
            RequestStatus,
            PurchaseRequest,
            PurchaseItem,
            NewItem,
            CreatePurchaseRequest,
            PurchaseRequestDetail,
            StatusAction,
            TransitionResponse,
            Invoice,
            TrainingProgress,
            Evaluation,
            EvaluationOutcome,
            SubmitEvaluation,
            EvaluationResponse,
            DeploymentAssignment,
            ProgressResponse,
            RubricResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Attendance", description = "Clock-in and clock-out"),
        (name = "Leave", description = "Leave filing, balance and approval"),
        (name = "Extra Shift", description = "Overtime shift requests"),
        (name = "Holiday", description = "Holiday calendar"),
        (name = "Payroll", description = "Base salaries and payslips"),
        (name = "Procurement", description = "Purchase request workflow"),
        (name = "Training", description = "Applicant onboarding"),
    )
)]
pub struct ApiDoc;

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
