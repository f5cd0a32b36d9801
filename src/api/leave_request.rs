use crate::{
    auth::auth::AuthUser,
    error::AppError,
    model::leave_request::{LeaveRequest, LeaveStatus, LeaveType},
    service::leave_balance::{balance, validate_request},
};
use actix_web::{HttpResponse, Responder, web};
use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct CreateLeave {
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-02", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "sick")]
    pub leave_type: LeaveType,
    #[schema(example = true)]
    pub is_paid: bool,
    #[schema(example = "Flu, medical certificate attached")]
    pub reason: String,
    #[schema(example = "https://files.example.com/medcert.pdf")]
    pub attachment_url: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct LeaveListResponse {
    pub data: Vec<LeaveRequest>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 10)]
    pub per_page: u32,
    #[schema(example = 1)]
    pub total: i64,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct LeaveFilter {
    #[schema(example = 123)]
    /// Filter by employee ID
    pub employee_id: Option<u64>,
    #[schema(example = "pending")]
    /// Filter by leave status
    pub status: Option<LeaveStatus>,
    #[schema(example = 1)]
    /// Pagination page number (start with 1)
    pub page: Option<u64>,
    #[schema(example = 10)]
    /// Pagination per page number
    pub per_page: Option<u64>,
}

#[derive(Deserialize, IntoParams)]
pub struct BalanceQuery {
    /// Employee to inspect; defaults to the caller
    pub employee_id: Option<u64>,
    /// Calendar year; defaults to the current year
    pub year: Option<i32>,
}

enum FilterValue {
    U64(u64),
    Status(LeaveStatus),
}

const LEAVE_COLUMNS: &str = r#"
    id, employee_id, leave_type, start_date, end_date, is_paid,
    days_used, reason, attachment_url, status
"#;

/// First and last day of `year`.
fn year_bounds(year: i32) -> Result<(NaiveDate, NaiveDate), AppError> {
    NaiveDate::from_ymd_opt(year, 1, 1)
        .zip(NaiveDate::from_ymd_opt(year, 12, 31))
        .ok_or_else(|| AppError::Validation(format!("Invalid year {}", year)))
}

/// Leave records touching `year`, including ones that started in December
/// of the year before.
pub(crate) async fn fetch_year_leaves(
    pool: &MySqlPool,
    employee_id: u64,
    year: i32,
) -> Result<Vec<LeaveRequest>, AppError> {
    let (first, last) = year_bounds(year)?;
    sqlx::query_as::<_, LeaveRequest>(&format!(
        "SELECT {} FROM leave_requests WHERE employee_id = ? AND start_date <= ? AND end_date >= ?",
        LEAVE_COLUMNS
    ))
    .bind(employee_id)
    .bind(last)
    .bind(first)
    .fetch_all(pool)
    .await
    .map_err(|e| {
        tracing::error!(error = %e, employee_id, year, "Failed to fetch leave records");
        AppError::Internal
    })
}

/* =========================
Create leave request
========================= */
#[utoipa::path(
    post,
    path = "/api/leave",
    request_body(
        content = CreateLeave,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Leave request submitted successfully",
         body = Object,
         example = json!({
            "message": "Leave request submitted",
            "status": "pending",
            "days_used": "2"
         })
        ),
        (status = 400, description = "Invalid dates, missing reason or insufficient balance"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn create_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateLeave>,
) -> Result<impl Responder, AppError> {
    let employee_id = auth.require_employee()?;

    let existing = fetch_year_leaves(pool.get_ref(), employee_id, payload.start_date.year()).await?;
    let days_used = validate_request(
        &existing,
        payload.start_date,
        payload.end_date,
        payload.is_paid,
        &payload.reason,
    )?;

    sqlx::query(
        r#"
        INSERT INTO leave_requests
            (employee_id, leave_type, start_date, end_date, is_paid, days_used, reason, attachment_url)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(employee_id)
    .bind(payload.leave_type)
    .bind(payload.start_date)
    .bind(payload.end_date)
    .bind(payload.is_paid)
    .bind(days_used)
    .bind(payload.reason.trim())
    .bind(payload.attachment_url.as_deref())
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, employee_id, "Failed to create leave request");
        AppError::Internal
    })?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Leave request submitted",
        "status": LeaveStatus::Pending,
        "days_used": days_used
    })))
}

async fn decide_leave(
    pool: &MySqlPool,
    leave_id: u64,
    decision: LeaveStatus,
) -> Result<(), AppError> {
    let result = sqlx::query(
        r#"
        UPDATE leave_requests
        SET status = ?
        WHERE id = ?
        AND status = 'pending'
        "#,
    )
    .bind(decision)
    .bind(leave_id)
    .execute(pool)
    .await
    .map_err(|e| {
        tracing::error!(error = %e, leave_id, decision = %decision, "Leave decision failed");
        AppError::Internal
    })?;

    if result.rows_affected() == 0 {
        return Err(AppError::Validation(
            "Leave request not found or already processed".into(),
        ));
    }
    Ok(())
}

/* =========================
Approve leave (HR/Admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/approve",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to approve")
    ),
    responses(
        (status = 200, description = "Leave approved successfully", body = Object, example = json!({
            "message": "Leave approved"
        })),
        (status = 400, description = "Leave request not found or already processed", body = Object, example = json!({
            "message": "Leave request not found or already processed"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn approve_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<impl Responder, AppError> {
    auth.require_hr_or_admin()?;
    decide_leave(pool.get_ref(), path.into_inner(), LeaveStatus::Approved).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Leave approved"
    })))
}

/* =========================
Reject leave (HR/Admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/reject",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to reject")
    ),
    responses(
        (status = 200, description = "Leave rejected successfully", body = Object, example = json!({
            "message": "Leave rejected"
        })),
        (status = 400, description = "Leave request not found or already processed", body = Object, example = json!({
            "message": "Leave request not found or already processed"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn reject_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<impl Responder, AppError> {
    auth.require_hr_or_admin()?;
    decide_leave(pool.get_ref(), path.into_inner(), LeaveStatus::Rejected).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Leave rejected"
    })))
}

/// Paid leave balance for a calendar year
#[utoipa::path(
    get,
    path = "/api/leave/balance",
    params(BalanceQuery),
    responses(
        (status = 200, description = "Leave balance", body = crate::service::leave_balance::LeaveBalance),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_balance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<BalanceQuery>,
) -> Result<impl Responder, AppError> {
    let employee_id = auth.employee_scope(query.employee_id)?;
    let year = query.year.unwrap_or_else(|| Local::now().year());

    let records = fetch_year_leaves(pool.get_ref(), employee_id, year).await?;
    Ok(HttpResponse::Ok().json(balance(&records, year)))
}

/// for getting a leave application details endpoint
#[utoipa::path(
    get,
    path = "/api/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to fetch")
    ),
    responses(
        (status = 200, description = "Leave request found", body = LeaveRequest),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found", body = Object, example = json!({
            "message": "Leave request not found"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn get_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<impl Responder, AppError> {
    let leave_id = path.into_inner();

    let leave = sqlx::query_as::<_, LeaveRequest>(&format!(
        "SELECT {} FROM leave_requests WHERE id = ?",
        LEAVE_COLUMNS
    ))
    .bind(leave_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, leave_id, "Failed to fetch leave request");
        AppError::Internal
    })?
    .ok_or(AppError::NotFound("Leave request"))?;

    auth.employee_scope(Some(leave.employee_id))?;
    Ok(HttpResponse::Ok().json(leave))
}

/// for getting leave applications endpoint
#[utoipa::path(
    get,
    path = "/api/leave",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Paginated leave list", body = LeaveListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_list(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<LeaveFilter>,
) -> Result<impl Responder, AppError> {
    auth.require_hr_or_admin()?;

    // -------------------------
    // Pagination
    // -------------------------
    let per_page = query.per_page.unwrap_or(10).clamp(1, 100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    // -------------------------
    // WHERE clause
    // -------------------------
    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<FilterValue> = Vec::new();

    if let Some(emp_id) = query.employee_id {
        where_sql.push_str(" AND employee_id = ?");
        args.push(FilterValue::U64(emp_id));
    }

    if let Some(status) = query.status {
        where_sql.push_str(" AND status = ?");
        args.push(FilterValue::Status(status));
    }

    let count_sql = format!("SELECT COUNT(*) FROM leave_requests{}", where_sql);

    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::U64(v) => count_q.bind(*v),
            FilterValue::Status(s) => count_q.bind(*s),
        };
    }

    let total = count_q.fetch_one(pool.get_ref()).await.map_err(|e| {
        tracing::error!(error=%e, "Failed to count leave requests");
        AppError::Internal
    })?;

    let data_sql = format!(
        r#"
        SELECT {}
        FROM leave_requests
        {}
        ORDER BY created_at DESC
        LIMIT ? OFFSET ?
        "#,
        LEAVE_COLUMNS, where_sql
    );

    let mut data_q = sqlx::query_as::<_, LeaveRequest>(&data_sql);
    for arg in args {
        data_q = match arg {
            FilterValue::U64(v) => data_q.bind(v),
            FilterValue::Status(s) => data_q.bind(s),
        };
    }

    let leaves = data_q
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error=%e, "Failed to fetch leave list");
            AppError::Internal
        })?;

    Ok(HttpResponse::Ok().json(LeaveListResponse {
        data: leaves,
        page: page as u32,
        per_page: per_page as u32,
        total,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn year_bounds_cover_the_whole_calendar_year() {
        let (first, last) = year_bounds(2026).unwrap();
        assert_eq!(first, NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
        assert_eq!(last, NaiveDate::from_ymd_opt(2026, 12, 31).unwrap());
        assert!(matches!(year_bounds(i32::MAX), Err(AppError::Validation(_))));
    }
}
