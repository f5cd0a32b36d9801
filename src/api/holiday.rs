use actix_web::{HttpResponse, Responder, web};
use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

use crate::{
    auth::auth::AuthUser, error::AppError, model::holiday::HolidayKind,
    utils::holiday_cache::HolidayCache,
};

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct HolidayEntry {
    #[schema(example = "2026-12-25", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = "Christmas Day")]
    pub name: String,
    pub kind: HolidayKind,
}

#[derive(Deserialize, IntoParams)]
pub struct YearQuery {
    /// Defaults to the current year
    pub year: Option<i32>,
}

#[utoipa::path(
    get,
    path = "/api/holiday",
    params(YearQuery),
    responses((status = 200, body = [HolidayEntry])),
    security(("bearer_auth" = [])),
    tag = "Holiday"
)]
pub async fn list_holidays(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<YearQuery>,
) -> Result<impl Responder, AppError> {
    let year = query.year.unwrap_or_else(|| Local::now().year());

    let holidays = sqlx::query_as::<_, HolidayEntry>(
        "SELECT date, name, kind FROM holidays WHERE YEAR(date) = ? ORDER BY date",
    )
    .bind(year)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, year, "Failed to list holidays");
        AppError::Internal
    })?;

    Ok(HttpResponse::Ok().json(holidays))
}

/// Add or replace a holiday
#[utoipa::path(
    put,
    path = "/api/holiday",
    request_body = HolidayEntry,
    responses(
        (status = 200, description = "Holiday saved", body = HolidayEntry),
        (status = 400, description = "Name is required"),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Holiday"
)]
pub async fn upsert_holiday(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    cache: web::Data<HolidayCache>,
    payload: web::Json<HolidayEntry>,
) -> Result<impl Responder, AppError> {
    auth.require_admin()?;

    if payload.name.trim().is_empty() {
        return Err(AppError::Validation("name is required".into()));
    }

    sqlx::query(
        r#"
        INSERT INTO holidays (date, name, kind)
        VALUES (?, ?, ?)
        ON DUPLICATE KEY UPDATE name = VALUES(name), kind = VALUES(kind)
        "#,
    )
    .bind(payload.date)
    .bind(payload.name.trim())
    .bind(payload.kind)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, date = %payload.date, "Failed to save holiday");
        AppError::Internal
    })?;

    cache.invalidate(payload.date.year()).await;
    tracing::info!(date = %payload.date, by = auth.user_id, "Holiday saved");

    Ok(HttpResponse::Ok().json(payload.into_inner()))
}
