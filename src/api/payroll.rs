use actix_web::{HttpResponse, Responder, web};
use chrono::{Datelike, Local};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

use crate::{
    api::{attendance::fetch_shift_type, leave_request::fetch_year_leaves},
    auth::auth::AuthUser,
    error::{AppError, is_duplicate_key},
    model::{
        attendance::Attendance,
        base_salary::{BaseSalary, SalaryType},
        extra_shift::ExtraShift,
        payslip::PayslipRecord,
    },
    service::payroll::{
        PayPeriod, PayrollInput, PayrollPolicy, Payslip, compute_payslip, ledger_entry_for,
    },
    utils::holiday_cache::HolidayCache,
};

#[derive(Deserialize, ToSchema)]
pub struct UpsertBaseSalary {
    #[schema(example = "fixed")]
    pub salary_type: SalaryType,
    #[schema(value_type = String, example = "15000.00")]
    pub amount: Decimal,
}

#[derive(Deserialize, IntoParams)]
pub struct PeriodQuery {
    /// Defaults to the current year
    pub year: Option<i32>,
    /// 1-12, defaults to the current month
    pub month: Option<u32>,
}

#[derive(Deserialize, ToSchema)]
pub struct SavePayslip {
    #[schema(example = 2026)]
    pub year: i32,
    #[schema(example = 6)]
    pub month: u32,
    /// Reference to the rendered payslip document
    #[schema(example = "https://files.example.com/payslips/7-2026-06.pdf")]
    pub document_url: String,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct PayrollQuery {
    #[schema(example = 1)]
    pub page: Option<u32>,

    #[schema(example = 10)]
    pub per_page: Option<u32>,

    #[schema(example = 1001)]
    pub employee_id: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct PaginatedPayslipResponse {
    pub data: Vec<PayslipRecord>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

fn requested_period(year: Option<i32>, month: Option<u32>) -> Result<PayPeriod, AppError> {
    let today = Local::now().date_naive();
    Ok(PayPeriod::month(
        year.unwrap_or(today.year()),
        month.unwrap_or(today.month()),
    )?)
}

async fn fetch_base_salary(pool: &MySqlPool, employee_id: u64) -> Result<Option<BaseSalary>, AppError> {
    sqlx::query_as::<_, BaseSalary>(
        "SELECT employee_id, salary_type, amount FROM base_salaries WHERE employee_id = ?",
    )
    .bind(employee_id)
    .fetch_optional(pool)
    .await
    .map_err(|e| {
        tracing::error!(error = %e, employee_id, "Failed to fetch base salary");
        AppError::Internal
    })
}

/// Load every record the calculator reads for one employee and month, then
/// compute the payslip.
async fn build_payslip(
    pool: &MySqlPool,
    holidays: &HolidayCache,
    employee_id: u64,
    period: PayPeriod,
) -> Result<Payslip, AppError> {
    let shift_type = fetch_shift_type(pool, employee_id).await?;
    let base_salary = fetch_base_salary(pool, employee_id).await?;

    let attendance = sqlx::query_as::<_, Attendance>(
        r#"
        SELECT id, employee_id, date, check_in, check_out, status
        FROM attendance
        WHERE employee_id = ?
        AND date BETWEEN ? AND ?
        "#,
    )
    .bind(employee_id)
    .bind(period.start)
    .bind(period.end)
    .fetch_all(pool)
    .await
    .map_err(|e| {
        tracing::error!(error = %e, employee_id, "Failed to fetch attendance for payroll");
        AppError::Internal
    })?;

    let extra_shifts = sqlx::query_as::<_, ExtraShift>(
        r#"
        SELECT id, employee_id, start_at, end_at, shift_type, status
        FROM extra_shifts
        WHERE employee_id = ?
        AND DATE(start_at) BETWEEN ? AND ?
        "#,
    )
    .bind(employee_id)
    .bind(period.start)
    .bind(period.end)
    .fetch_all(pool)
    .await
    .map_err(|e| {
        tracing::error!(error = %e, employee_id, "Failed to fetch extra shifts for payroll");
        AppError::Internal
    })?;

    let leaves = fetch_year_leaves(pool, employee_id, period.start.year()).await?;
    let calendar = holidays.calendar(pool, period.start.year()).await?;

    let input = PayrollInput {
        shift_type,
        period,
        today: Local::now().date_naive(),
        base_salary: base_salary.as_ref(),
        attendance: &attendance,
        leaves: &leaves,
        extra_shifts: &extra_shifts,
        holidays: &calendar,
    };
    Ok(compute_payslip(&input, &PayrollPolicy::default())?)
}

#[utoipa::path(
    put,
    path = "/api/payroll/base-salary/{employee_id}",
    request_body = UpsertBaseSalary,
    params(("employee_id" = u64, Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Base salary saved", body = BaseSalary),
        (status = 400, description = "Negative amount"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn upsert_base_salary(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<UpsertBaseSalary>,
) -> Result<impl Responder, AppError> {
    auth.require_hr_or_admin()?;
    let employee_id = path.into_inner();

    if body.amount.is_sign_negative() {
        return Err(AppError::Validation("amount cannot be negative".into()));
    }

    sqlx::query(
        r#"
        INSERT INTO base_salaries (employee_id, salary_type, amount)
        VALUES (?, ?, ?)
        ON DUPLICATE KEY UPDATE salary_type = VALUES(salary_type), amount = VALUES(amount)
        "#,
    )
    .bind(employee_id)
    .bind(body.salary_type)
    .bind(body.amount)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, employee_id, "Failed to save base salary");
        AppError::Internal
    })?;

    tracing::info!(employee_id, by = auth.user_id, "Base salary updated");

    Ok(HttpResponse::Ok().json(BaseSalary {
        employee_id,
        salary_type: body.salary_type,
        amount: body.amount,
    }))
}

#[utoipa::path(
    get,
    path = "/api/payroll/base-salary/{employee_id}",
    params(("employee_id" = u64, Path, description = "Employee ID")),
    responses(
        (status = 200, body = BaseSalary),
        (status = 404, description = "No base salary on file")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn get_base_salary(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<impl Responder, AppError> {
    let employee_id = auth.employee_scope(Some(path.into_inner()))?;

    let salary = fetch_base_salary(pool.get_ref(), employee_id)
        .await?
        .ok_or(AppError::NotFound("Base salary"))?;

    Ok(HttpResponse::Ok().json(salary))
}

/// Compute a payslip without saving it
#[utoipa::path(
    get,
    path = "/api/payroll/payslip/{employee_id}",
    params(
        ("employee_id" = u64, Path, description = "Employee ID"),
        PeriodQuery
    ),
    responses(
        (status = 200, body = Payslip),
        (status = 400, description = "Invalid month"),
        (status = 404, description = "Employee not found"),
        (status = 422, description = "Base salary missing")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn preview_payslip(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    holidays: web::Data<HolidayCache>,
    path: web::Path<u64>,
    query: web::Query<PeriodQuery>,
) -> Result<impl Responder, AppError> {
    let employee_id = auth.employee_scope(Some(path.into_inner()))?;
    let period = requested_period(query.year, query.month)?;

    let payslip = build_payslip(pool.get_ref(), holidays.get_ref(), employee_id, period).await?;
    Ok(HttpResponse::Ok().json(payslip))
}

fn save_failed(e: sqlx::Error, employee_id: u64) -> AppError {
    if is_duplicate_key(&e) {
        return AppError::Conflict("payslip already saved for this month".into());
    }
    tracing::error!(error = %e, employee_id, "Payslip save failed");
    AppError::Dependency("payslip was not saved and cannot be printed".into())
}

/// Compute and persist a payslip with its ledger entry
#[utoipa::path(
    post,
    path = "/api/payroll/payslip/{employee_id}",
    request_body = SavePayslip,
    params(("employee_id" = u64, Path, description = "Employee ID")),
    responses(
        (status = 201, description = "Payslip saved", body = Object, example = json!({
            "message": "Payslip saved",
            "net_pay": "8775.00",
            "ledger_reference": "7c4a8d09-ca37-4d2b-8f4b-5c8a5e9d2f10"
        })),
        (status = 409, description = "Payslip already saved for this month"),
        (status = 422, description = "Base salary missing"),
        (status = 502, description = "Payslip or ledger write failed")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn save_payslip(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    holidays: web::Data<HolidayCache>,
    path: web::Path<u64>,
    body: web::Json<SavePayslip>,
) -> Result<impl Responder, AppError> {
    auth.require_hr_or_admin()?;
    let employee_id = path.into_inner();

    if body.document_url.trim().is_empty() {
        return Err(AppError::Validation("document_url is required".into()));
    }

    let period = PayPeriod::month(body.year, body.month)?;
    let payslip = build_payslip(pool.get_ref(), holidays.get_ref(), employee_id, period).await?;

    let breakdown = serde_json::to_value(&payslip).map_err(|e| {
        tracing::error!(error = %e, employee_id, "Failed to serialise payslip");
        AppError::Internal
    })?;

    let ledger_entry = ledger_entry_for(&payslip);

    // payslip and ledger entry land together or not at all
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| save_failed(e, employee_id))?;

    if let Some(entry) = &ledger_entry {
        sqlx::query(
            r#"
            INSERT INTO ledger_transactions (reference, employee_id, month, kind, amount)
            VALUES (?, ?, ?, 'bat_deduction', ?)
            "#,
        )
        .bind(&entry.reference)
        .bind(employee_id)
        .bind(period.start)
        .bind(entry.amount)
        .execute(&mut *tx)
        .await
        .map_err(|e| save_failed(e, employee_id))?;
    }

    sqlx::query(
        r#"
        INSERT INTO payslips (employee_id, month, net_pay, breakdown, document_url, ledger_reference)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(employee_id)
    .bind(period.start)
    .bind(payslip.net_pay)
    .bind(sqlx::types::Json(&breakdown))
    .bind(body.document_url.trim())
    .bind(ledger_entry.as_ref().map(|entry| entry.reference.as_str()))
    .execute(&mut *tx)
    .await
    .map_err(|e| save_failed(e, employee_id))?;

    tx.commit().await.map_err(|e| save_failed(e, employee_id))?;

    tracing::info!(
        employee_id,
        month = %period.start,
        net_pay = %payslip.net_pay,
        "Payslip saved"
    );

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Payslip saved",
        "net_pay": payslip.net_pay,
        "ledger_reference": ledger_entry.map(|entry| entry.reference)
    })))
}

#[utoipa::path(
    get,
    path = "/api/payroll",
    params(PayrollQuery),
    responses(
        (status = 200, body = PaginatedPayslipResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn list_payslips(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<PayrollQuery>,
) -> Result<impl Responder, AppError> {
    // employees only ever see their own payslips
    let employee_filter = if auth.role.is_hr_or_admin() {
        query.employee_id
    } else {
        Some(auth.require_employee()?)
    };

    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(10).clamp(1, 100);
    let offset = (page - 1) * per_page;

    let where_sql = if employee_filter.is_some() {
        " WHERE employee_id = ?"
    } else {
        ""
    };

    let count_sql = format!("SELECT COUNT(*) FROM payslips{}", where_sql);
    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    if let Some(id) = employee_filter {
        count_q = count_q.bind(id);
    }
    let total = count_q.fetch_one(pool.get_ref()).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to count payslips");
        AppError::Internal
    })?;

    let data_sql = format!(
        r#"
        SELECT id, employee_id, month, net_pay, breakdown, document_url, ledger_reference, created_at
        FROM payslips
        {}
        ORDER BY month DESC
        LIMIT ? OFFSET ?
        "#,
        where_sql
    );
    let mut data_q = sqlx::query_as::<_, PayslipRecord>(&data_sql);
    if let Some(id) = employee_filter {
        data_q = data_q.bind(id);
    }
    let data = data_q
        .bind(per_page as i64)
        .bind(offset as i64)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to fetch payslip list");
            AppError::Internal
        })?;

    Ok(HttpResponse::Ok().json(PaginatedPayslipResponse {
        data,
        page,
        per_page,
        total,
    }))
}
