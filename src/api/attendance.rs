use crate::{
    auth::auth::AuthUser,
    config::Config,
    error::{AppError, ensure_unchanged, is_duplicate_key},
    model::{
        attendance::{Attendance, AttendanceStatus},
        employee::ShiftType,
    },
    service::attendance_rules::{ShiftSchedule, clock_in_status, clock_out_status},
};
use actix_web::{HttpResponse, Responder, web};
use chrono::{Duration, Local};
use sqlx::MySqlPool;

pub(crate) async fn fetch_shift_type(pool: &MySqlPool, employee_id: u64) -> Result<ShiftType, AppError> {
    sqlx::query_scalar::<_, ShiftType>("SELECT shift_type FROM employees WHERE id = ?")
        .bind(employee_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, employee_id, "Failed to fetch employee shift");
            AppError::Internal
        })?
        .ok_or(AppError::NotFound("Employee"))
}

/// Check-in endpoint
#[utoipa::path(
    post,
    path = "/api/attendance",
    responses(
        (status = 200, description = "Checked in", body = Object, example = json!({
            "message": "Checked in successfully",
            "status": "late"
        })),
        (status = 400, description = "Already checked in today", body = Object, example = json!({
            "message": "Already checked in today"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_in(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> Result<impl Responder, AppError> {
    let employee_id = auth.require_employee()?;
    let shift = fetch_shift_type(pool.get_ref(), employee_id).await?;

    let now = Local::now().naive_local();
    let schedule = ShiftSchedule::for_shift(shift, config.late_grace_minutes);
    let status = clock_in_status(&schedule, now.time());

    let result = sqlx::query(
        r#"
        INSERT INTO attendance (employee_id, date, check_in, status)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(employee_id)
    .bind(now.date())
    .bind(now.time())
    .bind(status)
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(_) => {
            tracing::info!(employee_id, status = %status, "Checked in");
            Ok(HttpResponse::Ok().json(serde_json::json!({
                "message": "Checked in successfully",
                "status": status
            })))
        }

        Err(e) => {
            // Duplicate check-in for same day
            if is_duplicate_key(&e) {
                return Err(AppError::Validation("Already checked in today".into()));
            }

            tracing::error!(error = %e, employee_id, "Check-in failed");
            Err(AppError::Internal)
        }
    }
}

/// Check-out endpoint
#[utoipa::path(
    put,
    path = "/api/attendance",
    responses(
        (status = 200, description = "Checked out", body = Object, example = json!({
            "message": "Checked out successfully",
            "status": "undertime"
        })),
        (status = 400, description = "No open check-in found", body = Object, example = json!({
            "message": "No active check-in found"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Record changed concurrently"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_out(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> Result<impl Responder, AppError> {
    let employee_id = auth.require_employee()?;
    let now = Local::now().naive_local();

    // a night shift is closed the morning after it started
    let open = sqlx::query_as::<_, Attendance>(
        r#"
        SELECT id, employee_id, date, check_in, check_out, status
        FROM attendance
        WHERE employee_id = ?
        AND check_out IS NULL
        AND check_in IS NOT NULL
        AND date >= ?
        ORDER BY date DESC
        LIMIT 1
        "#,
    )
    .bind(employee_id)
    .bind(now.date() - Duration::days(1))
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, employee_id, "Failed to fetch open attendance");
        AppError::Internal
    })?
    .ok_or_else(|| AppError::Validation("No active check-in found".into()))?;

    let check_in = open.check_in.unwrap_or_default();
    let status = clock_out_status(open.status, check_in, now.time());

    let result = sqlx::query(
        r#"
        UPDATE attendance
        SET check_out = ?, status = ?
        WHERE id = ?
        AND check_out IS NULL
        "#,
    )
    .bind(now.time())
    .bind(status)
    .bind(open.id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, employee_id, "Check-out failed");
        AppError::Internal
    })?;

    ensure_unchanged(result.rows_affected(), || "attendance already closed".into())?;

    if status != AttendanceStatus::Present {
        tracing::info!(employee_id, status = %status, "Checked out with exception");
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Checked out successfully",
        "status": status
    })))
}
