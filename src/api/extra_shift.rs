use crate::{
    auth::auth::AuthUser,
    error::AppError,
    model::extra_shift::ExtraShiftStatus,
};
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDateTime;
use serde::Deserialize;
use sqlx::MySqlPool;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct CreateExtraShift {
    #[schema(example = "2026-06-06T18:00:00", format = "date-time", value_type = String)]
    pub start_at: NaiveDateTime,
    #[schema(example = "2026-06-06T22:00:00", format = "date-time", value_type = String)]
    pub end_at: NaiveDateTime,
    #[schema(example = "relief")]
    pub shift_type: String,
}

/// File an extra shift for approval
#[utoipa::path(
    post,
    path = "/api/extra-shift",
    request_body = CreateExtraShift,
    responses(
        (status = 200, description = "Extra shift filed", body = Object, example = json!({
            "message": "Extra shift submitted",
            "status": "pending"
        })),
        (status = 400, description = "End must be after start"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Extra Shift"
)]
pub async fn create_extra_shift(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateExtraShift>,
) -> Result<impl Responder, AppError> {
    let employee_id = auth.require_employee()?;

    if payload.end_at <= payload.start_at {
        return Err(AppError::Validation("end_at must be after start_at".into()));
    }

    sqlx::query(
        r#"
        INSERT INTO extra_shifts (employee_id, start_at, end_at, shift_type)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(employee_id)
    .bind(payload.start_at)
    .bind(payload.end_at)
    .bind(payload.shift_type.trim())
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, employee_id, "Failed to file extra shift");
        AppError::Internal
    })?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Extra shift submitted",
        "status": ExtraShiftStatus::Pending
    })))
}

async fn decide_shift(
    pool: &MySqlPool,
    shift_id: u64,
    decision: ExtraShiftStatus,
) -> Result<(), AppError> {
    let result = sqlx::query(
        r#"
        UPDATE extra_shifts
        SET status = ?
        WHERE id = ?
        AND status = 'pending'
        "#,
    )
    .bind(decision)
    .bind(shift_id)
    .execute(pool)
    .await
    .map_err(|e| {
        tracing::error!(error = %e, shift_id, "Extra shift decision failed");
        AppError::Internal
    })?;

    if result.rows_affected() == 0 {
        return Err(AppError::Validation(
            "Extra shift not found or already processed".into(),
        ));
    }
    Ok(())
}

#[utoipa::path(
    put,
    path = "/api/extra-shift/{shift_id}/approve",
    params(("shift_id" = u64, Path, description = "Extra shift ID")),
    responses(
        (status = 200, description = "Extra shift approved"),
        (status = 400, description = "Not found or already processed"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Extra Shift"
)]
pub async fn approve_extra_shift(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<impl Responder, AppError> {
    auth.require_hr_or_admin()?;
    decide_shift(pool.get_ref(), path.into_inner(), ExtraShiftStatus::Approved).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Extra shift approved"
    })))
}

#[utoipa::path(
    put,
    path = "/api/extra-shift/{shift_id}/reject",
    params(("shift_id" = u64, Path, description = "Extra shift ID")),
    responses(
        (status = 200, description = "Extra shift rejected"),
        (status = 400, description = "Not found or already processed"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Extra Shift"
)]
pub async fn reject_extra_shift(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<impl Responder, AppError> {
    auth.require_hr_or_admin()?;
    decide_shift(pool.get_ref(), path.into_inner(), ExtraShiftStatus::Rejected).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Extra shift rejected"
    })))
}
