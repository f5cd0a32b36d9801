use actix_web::{HttpResponse, Responder, web};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::ToSchema;

use crate::{
    auth::auth::AuthUser,
    error::{AppError, ensure_unchanged},
    model::{
        purchase_request::{PurchaseItem, PurchaseRequest, RequestStatus},
        role::Role,
    },
    service::{
        notify::{Notifier, dispatch, rejection_notice},
        procurement::{
            MAX_UNIT_PRICE, Transition, WorkflowAction, apply_transition, ensure_invoiceable,
            line_total, order_total,
        },
    },
};

#[derive(Deserialize, ToSchema)]
pub struct NewItem {
    #[schema(example = 12)]
    pub item_id: u64,
    #[schema(example = "Flashlight")]
    pub item_name: String,
    #[schema(example = 5)]
    pub quantity: u32,
    #[schema(value_type = String, example = "250.00")]
    pub unit_price: Decimal,
}

#[derive(Deserialize, ToSchema)]
pub struct CreatePurchaseRequest {
    #[schema(example = "Operations")]
    pub department: String,
    pub items: Vec<NewItem>,
}

#[derive(Serialize, ToSchema)]
pub struct PurchaseRequestDetail {
    #[serde(flatten)]
    pub request: PurchaseRequest,
    pub items: Vec<PurchaseItem>,
}

/// Request body of the status endpoint, as documented. Parsed into
/// [`WorkflowAction`].
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct StatusAction {
    /// approve, reject, return, resubmit, prepare, decline, ship, deliver or receive
    #[schema(example = "reject")]
    pub action: String,
    /// Required for reject and decline, optional for return
    #[schema(example = "Budget exceeded", nullable = true)]
    pub reason: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct TransitionResponse {
    #[schema(example = "Status updated")]
    pub message: String,
    pub status: RequestStatus,
    #[schema(nullable = true)]
    pub warning: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct Invoice {
    pub purchase_request_id: u64,
    pub department: String,
    pub items: Vec<PurchaseItem>,
    #[schema(value_type = String, example = "1250.00")]
    pub total: Decimal,
    #[schema(value_type = String, format = "date-time")]
    pub issued_at: DateTime<Utc>,
}

fn validate_items(items: &[NewItem]) -> Result<(), AppError> {
    if items.is_empty() {
        return Err(AppError::Validation("At least one item is required".into()));
    }
    for item in items {
        if item.quantity == 0 {
            return Err(AppError::Validation(format!(
                "Quantity for {} must be at least 1",
                item.item_name
            )));
        }
        if item.unit_price.is_sign_negative() {
            return Err(AppError::Validation(format!(
                "Unit price for {} cannot be negative",
                item.item_name
            )));
        }
        if item.unit_price > MAX_UNIT_PRICE {
            return Err(AppError::Validation(format!(
                "Unit price for {} cannot exceed {}",
                item.item_name, MAX_UNIT_PRICE
            )));
        }
    }
    Ok(())
}

async fn fetch_request(pool: &MySqlPool, request_id: u64) -> Result<PurchaseRequest, AppError> {
    sqlx::query_as::<_, PurchaseRequest>(
        r#"
        SELECT id, requester_id, department, finance_status, supplier_status,
               inventory_status, rejection_reason, total, created_at
        FROM purchase_requests
        WHERE id = ?
        "#,
    )
    .bind(request_id)
    .fetch_optional(pool)
    .await
    .map_err(|e| {
        tracing::error!(error = %e, request_id, "Failed to fetch purchase request");
        AppError::Internal
    })?
    .ok_or(AppError::NotFound("Purchase request"))
}

async fn fetch_items(pool: &MySqlPool, request_id: u64) -> Result<Vec<PurchaseItem>, AppError> {
    sqlx::query_as::<_, PurchaseItem>(
        r#"
        SELECT item_id, item_name, quantity, unit_price, line_total
        FROM purchase_request_items
        WHERE purchase_request_id = ?
        ORDER BY id
        "#,
    )
    .bind(request_id)
    .fetch_all(pool)
    .await
    .map_err(|e| {
        tracing::error!(error = %e, request_id, "Failed to fetch purchase request items");
        AppError::Internal
    })
}

fn ensure_can_view(auth: &AuthUser, request: &PurchaseRequest) -> Result<(), AppError> {
    if auth.role == Role::Employee && auth.employee_id != Some(request.requester_id) {
        return Err(AppError::Forbidden("Not your purchase request"));
    }
    Ok(())
}

#[utoipa::path(
    post,
    path = "/api/purchase-request",
    request_body = CreatePurchaseRequest,
    responses(
        (status = 201, description = "Purchase request created", body = Object, example = json!({
            "message": "Purchase request created",
            "id": 17,
            "total": "1250.00"
        })),
        (status = 400, description = "Invalid items"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Procurement"
)]
pub async fn create_purchase_request(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreatePurchaseRequest>,
) -> Result<impl Responder, AppError> {
    let requester_id = auth.require_employee()?;
    validate_items(&payload.items)?;

    let department = payload.department.trim();
    if department.is_empty() {
        return Err(AppError::Validation("department is required".into()));
    }

    let lines = payload
        .items
        .iter()
        .map(|item| line_total(item.quantity, item.unit_price).map(|amount| (item, amount)))
        .collect::<Result<Vec<(&NewItem, Decimal)>, AppError>>()?;
    let total = order_total(lines.iter().map(|(_, amount)| *amount))?;

    let db_error = |e: sqlx::Error| {
        tracing::error!(error = %e, requester_id, "Failed to create purchase request");
        AppError::Internal
    };

    let mut tx = pool.begin().await.map_err(db_error)?;

    let request_id = sqlx::query(
        r#"
        INSERT INTO purchase_requests (requester_id, department, total)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(requester_id)
    .bind(department)
    .bind(total)
    .execute(&mut *tx)
    .await
    .map_err(db_error)?
    .last_insert_id();

    for (item, amount) in &lines {
        sqlx::query(
            r#"
            INSERT INTO purchase_request_items
                (purchase_request_id, item_id, item_name, quantity, unit_price, line_total)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(request_id)
        .bind(item.item_id)
        .bind(item.item_name.trim())
        .bind(item.quantity)
        .bind(item.unit_price)
        .bind(*amount)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;
    }

    tx.commit().await.map_err(db_error)?;

    tracing::info!(request_id, requester_id, total = %total, "Purchase request created");

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Purchase request created",
        "id": request_id,
        "total": total
    })))
}

#[utoipa::path(
    get,
    path = "/api/purchase-request/{request_id}",
    params(("request_id" = u64, Path, description = "Purchase request ID")),
    responses(
        (status = 200, body = PurchaseRequestDetail),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Purchase request not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Procurement"
)]
pub async fn get_purchase_request(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<impl Responder, AppError> {
    let request_id = path.into_inner();

    let request = fetch_request(pool.get_ref(), request_id).await?;
    ensure_can_view(&auth, &request)?;
    let items = fetch_items(pool.get_ref(), request_id).await?;

    Ok(HttpResponse::Ok().json(PurchaseRequestDetail { request, items }))
}

/// Apply a workflow action to a purchase request
///
/// The action is checked against the caller's role and the request's current
/// statuses, then written only if those statuses are still unchanged.
#[utoipa::path(
    put,
    path = "/api/purchase-request/{request_id}/status",
    params(("request_id" = u64, Path, description = "Purchase request ID")),
    request_body(
        content = StatusAction,
        example = json!({ "action": "reject", "reason": "Budget exceeded" })
    ),
    responses(
        (status = 200, body = TransitionResponse),
        (status = 400, description = "Reason required"),
        (status = 404, description = "Purchase request not found"),
        (status = 409, description = "Request changed since it was read"),
        (status = 422, description = "Action not allowed in the current state")
    ),
    security(("bearer_auth" = [])),
    tag = "Procurement"
)]
pub async fn update_status(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    notifier: web::Data<dyn Notifier>,
    path: web::Path<u64>,
    action: web::Json<WorkflowAction>,
) -> Result<impl Responder, AppError> {
    let request_id = path.into_inner();
    let actor = auth.context();

    let request = fetch_request(pool.get_ref(), request_id).await?;
    let transition = apply_transition(&request.status, request.requester_id, &actor, &action)?;

    let db_error = |e: sqlx::Error| {
        tracing::error!(error = %e, request_id, action = action.name(), "Status update failed");
        AppError::Internal
    };

    let mut tx = pool.begin().await.map_err(db_error)?;

    let result = sqlx::query(
        r#"
        UPDATE purchase_requests
        SET finance_status = ?,
            supplier_status = ?,
            inventory_status = ?,
            rejection_reason = COALESCE(?, rejection_reason)
        WHERE id = ?
        AND finance_status = ?
        AND supplier_status = ?
        AND inventory_status = ?
        "#,
    )
    .bind(transition.after.finance_status)
    .bind(transition.after.supplier_status)
    .bind(transition.after.inventory_status)
    .bind(transition.reason.as_deref())
    .bind(request_id)
    .bind(transition.before.finance_status)
    .bind(transition.before.supplier_status)
    .bind(transition.before.inventory_status)
    .execute(&mut *tx)
    .await
    .map_err(db_error)?;

    ensure_unchanged(result.rows_affected(), || {
        format!("purchase request {} was updated by someone else", request_id)
    })?;

    sqlx::query(
        r#"
        INSERT INTO purchase_request_events (purchase_request_id, actor_user_id, track, action, reason)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(request_id)
    .bind(actor.user_id)
    .bind(transition.track.to_string())
    .bind(action.name())
    .bind(transition.reason.as_deref())
    .execute(&mut *tx)
    .await
    .map_err(db_error)?;

    tx.commit().await.map_err(db_error)?;

    tracing::info!(
        request_id,
        actor = actor.user_id,
        action = action.name(),
        "Purchase request status changed"
    );

    let warning = if transition.is_rejection() {
        notify_requester(pool.get_ref(), notifier.get_ref(), request.requester_id, request_id, &transition).await
    } else {
        None
    };

    Ok(HttpResponse::Ok().json(TransitionResponse {
        message: "Status updated".into(),
        status: transition.after,
        warning,
    }))
}

async fn notify_requester(
    pool: &MySqlPool,
    notifier: &dyn Notifier,
    requester_id: u64,
    request_id: u64,
    transition: &Transition,
) -> Option<String> {
    let email = sqlx::query_scalar::<_, String>("SELECT email FROM employees WHERE id = ?")
        .bind(requester_id)
        .fetch_optional(pool)
        .await;

    match email {
        Ok(Some(to)) => dispatch(notifier, rejection_notice(to, request_id, transition)).await,
        Ok(None) => Some(format!(
            "Change saved, but requester {} has no contact address",
            requester_id
        )),
        Err(e) => {
            tracing::warn!(error = %e, requester_id, "Could not look up requester email");
            Some("Change saved, but the requester could not be notified".into())
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/purchase-request/{request_id}/invoice",
    params(("request_id" = u64, Path, description = "Purchase request ID")),
    responses(
        (status = 200, body = Invoice),
        (status = 404, description = "Purchase request not found"),
        (status = 422, description = "Goods not yet received")
    ),
    security(("bearer_auth" = [])),
    tag = "Procurement"
)]
pub async fn get_invoice(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<impl Responder, AppError> {
    let request_id = path.into_inner();

    let request = fetch_request(pool.get_ref(), request_id).await?;
    ensure_can_view(&auth, &request)?;
    ensure_invoiceable(&request.status)?;

    let items = fetch_items(pool.get_ref(), request_id).await?;

    Ok(HttpResponse::Ok().json(Invoice {
        purchase_request_id: request.id,
        department: request.department,
        items,
        total: request.total,
        issued_at: Utc::now(),
    }))
}
