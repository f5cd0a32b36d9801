use actix_web::{HttpResponse, Responder, web};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{MySql, MySqlPool, Transaction};
use utoipa::ToSchema;

use crate::{
    auth::auth::AuthUser,
    error::{AppError, ensure_unchanged},
    model::employee::{Employee, TrainingStage},
    service::{
        notify::{Notifier, dispatch, training_notice},
        training::{
            DeploymentAssignment, Evaluation, EvaluationOutcome, PASSING_AVERAGE, TrainingError,
            TrainingProgress, deploy, evaluate, reset,
        },
    },
};

#[derive(Deserialize, ToSchema)]
pub struct SubmitEvaluation {
    pub evaluation: Evaluation,
    #[schema(example = "Strong on drills, needs work on report writing")]
    pub comments: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct EvaluationResponse {
    #[serde(flatten)]
    pub outcome: EvaluationOutcome,
    #[schema(nullable = true)]
    pub warning: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct ProgressResponse {
    #[schema(example = "Application reset")]
    pub message: String,
    pub progress: TrainingProgress,
    #[schema(nullable = true)]
    pub warning: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct RubricResponse {
    pub stage: TrainingStage,
    pub criteria: Vec<String>,
    #[schema(value_type = String, example = "3.00")]
    pub passing_average: Decimal,
}

async fn fetch_applicant(pool: &MySqlPool, employee_id: u64) -> Result<Employee, AppError> {
    sqlx::query_as::<_, Employee>(
        r#"
        SELECT id, employee_code, first_name, last_name, email, phone, branch_id,
               hire_date, shift_type, training_status, application_status
        FROM employees
        WHERE id = ?
        "#,
    )
    .bind(employee_id)
    .fetch_optional(pool)
    .await
    .map_err(|e| {
        tracing::error!(error = %e, employee_id, "Failed to fetch applicant");
        AppError::Internal
    })?
    .ok_or(AppError::NotFound("Employee"))
}

fn progress_of(applicant: &Employee) -> TrainingProgress {
    TrainingProgress {
        stage: applicant.training_status,
        status: applicant.application_status,
    }
}

/// Move the applicant from `before` to `after`, provided nobody else changed
/// their progress in the meantime.
async fn write_progress(
    tx: &mut Transaction<'_, MySql>,
    employee_id: u64,
    before: TrainingProgress,
    after: TrainingProgress,
) -> Result<(), AppError> {
    let result = sqlx::query(
        r#"
        UPDATE employees
        SET training_status = ?, application_status = ?
        WHERE id = ?
        AND training_status = ?
        AND application_status = ?
        "#,
    )
    .bind(after.stage)
    .bind(after.status)
    .bind(employee_id)
    .bind(before.stage)
    .bind(before.status)
    .execute(&mut **tx)
    .await
    .map_err(|e| {
        tracing::error!(error = %e, employee_id, "Failed to update training progress");
        AppError::Internal
    })?;

    ensure_unchanged(result.rows_affected(), || {
        format!("training progress of employee {} was updated by someone else", employee_id)
    })
}

async fn notify_applicant(
    notifier: &dyn Notifier,
    applicant: &Employee,
    progress: &TrainingProgress,
) -> Option<String> {
    let notice = training_notice(applicant.email.clone(), &applicant.full_name(), progress);
    dispatch(notifier, notice).await
}

#[utoipa::path(
    get,
    path = "/api/training/{employee_id}",
    params(("employee_id" = u64, Path, description = "Employee ID")),
    responses(
        (status = 200, body = TrainingProgress),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Training"
)]
pub async fn get_progress(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<impl Responder, AppError> {
    let employee_id = auth.employee_scope(Some(path.into_inner()))?;
    let applicant = fetch_applicant(pool.get_ref(), employee_id).await?;

    Ok(HttpResponse::Ok().json(progress_of(&applicant)))
}

/// Record the outcome of the applicant's current stage
#[utoipa::path(
    post,
    path = "/api/training/{employee_id}/evaluation",
    params(("employee_id" = u64, Path, description = "Employee ID")),
    request_body(
        content = SubmitEvaluation,
        example = json!({
            "evaluation": { "rubric": { "ratings": [3, 4, 3, 3, 4, 3, 2, 3, 4, 3] } },
            "comments": "Good stamina"
        })
    ),
    responses(
        (status = 200, body = EvaluationResponse),
        (status = 400, description = "Malformed evaluation for this stage"),
        (status = 403, description = "HR/Admin only"),
        (status = 409, description = "Progress changed since it was read"),
        (status = 422, description = "Application is failed or already deployed")
    ),
    security(("bearer_auth" = [])),
    tag = "Training"
)]
pub async fn submit_evaluation(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    notifier: web::Data<dyn Notifier>,
    path: web::Path<u64>,
    payload: web::Json<SubmitEvaluation>,
) -> Result<impl Responder, AppError> {
    let employee_id = path.into_inner();
    let actor = auth.context();

    let applicant = fetch_applicant(pool.get_ref(), employee_id).await?;
    let before = progress_of(&applicant);
    let outcome = evaluate(&actor, &before, &payload.evaluation)?;

    let ratings = match &payload.evaluation {
        Evaluation::Rubric { ratings } => Some(sqlx::types::Json(ratings.clone())),
        Evaluation::Decision { .. } => None,
    };

    let db_error = |e: sqlx::Error| {
        tracing::error!(error = %e, employee_id, "Failed to record evaluation");
        AppError::Internal
    };

    let mut tx = pool.begin().await.map_err(db_error)?;

    sqlx::query(
        r#"
        INSERT INTO training_evaluations
            (employee_id, stage, result, average, ratings, comments, evaluator_id)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(employee_id)
    .bind(outcome.evaluated_stage)
    .bind(outcome.result)
    .bind(outcome.average)
    .bind(ratings)
    .bind(payload.comments.as_deref())
    .bind(actor.user_id)
    .execute(&mut *tx)
    .await
    .map_err(db_error)?;

    write_progress(&mut tx, employee_id, before, outcome.progress).await?;
    tx.commit().await.map_err(db_error)?;

    tracing::info!(
        employee_id,
        stage = %outcome.evaluated_stage,
        result = %outcome.result,
        evaluator = actor.user_id,
        "Training evaluation recorded"
    );

    let warning = notify_applicant(notifier.get_ref(), &applicant, &outcome.progress).await;

    Ok(HttpResponse::Ok().json(EvaluationResponse { outcome, warning }))
}

/// Assign a ready applicant to a client
#[utoipa::path(
    post,
    path = "/api/training/{employee_id}/deployment",
    params(("employee_id" = u64, Path, description = "Employee ID")),
    request_body = DeploymentAssignment,
    responses(
        (status = 200, body = ProgressResponse),
        (status = 400, description = "No client selected"),
        (status = 403, description = "HR/Admin only"),
        (status = 409, description = "Progress changed since it was read"),
        (status = 422, description = "Applicant is not at the deployment stage")
    ),
    security(("bearer_auth" = [])),
    tag = "Training"
)]
pub async fn assign_deployment(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    notifier: web::Data<dyn Notifier>,
    path: web::Path<u64>,
    payload: web::Json<DeploymentAssignment>,
) -> Result<impl Responder, AppError> {
    let employee_id = path.into_inner();
    let actor = auth.context();

    let applicant = fetch_applicant(pool.get_ref(), employee_id).await?;
    let before = progress_of(&applicant);
    let after = deploy(&actor, &before, &payload)?;
    let client_id = payload.client_id.ok_or(TrainingError::MissingClient)?;
    // defaults to the assigning officer's own branch
    let branch_id = payload.branch_id.or(actor.branch_id);

    let db_error = |e: sqlx::Error| {
        tracing::error!(error = %e, employee_id, client_id, "Failed to record deployment");
        AppError::Internal
    };

    let mut tx = pool.begin().await.map_err(db_error)?;

    sqlx::query(
        r#"
        INSERT INTO deployments (employee_id, client_id, branch_id, assigned_by)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(employee_id)
    .bind(client_id)
    .bind(branch_id)
    .bind(actor.user_id)
    .execute(&mut *tx)
    .await
    .map_err(db_error)?;

    write_progress(&mut tx, employee_id, before, after).await?;

    if let Some(branch_id) = branch_id {
        sqlx::query("UPDATE employees SET branch_id = ? WHERE id = ?")
            .bind(branch_id)
            .bind(employee_id)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;
    }

    tx.commit().await.map_err(db_error)?;

    tracing::info!(employee_id, client_id, by = actor.user_id, "Applicant deployed");

    let warning = notify_applicant(notifier.get_ref(), &applicant, &after).await;

    Ok(HttpResponse::Ok().json(ProgressResponse {
        message: "Applicant deployed".into(),
        progress: after,
        warning,
    }))
}

/// Re-open a failed application at the stage it failed
#[utoipa::path(
    put,
    path = "/api/training/{employee_id}/reset",
    params(("employee_id" = u64, Path, description = "Employee ID")),
    responses(
        (status = 200, body = ProgressResponse),
        (status = 403, description = "HR/Admin only"),
        (status = 409, description = "Progress changed since it was read"),
        (status = 422, description = "Application has not failed")
    ),
    security(("bearer_auth" = [])),
    tag = "Training"
)]
pub async fn reset_application(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    notifier: web::Data<dyn Notifier>,
    path: web::Path<u64>,
) -> Result<impl Responder, AppError> {
    let employee_id = path.into_inner();
    let actor = auth.context();

    let applicant = fetch_applicant(pool.get_ref(), employee_id).await?;
    let before = progress_of(&applicant);
    let after = reset(&actor, &before)?;

    let mut tx = pool.begin().await.map_err(|e| {
        tracing::error!(error = %e, employee_id, "Failed to reset application");
        AppError::Internal
    })?;
    write_progress(&mut tx, employee_id, before, after).await?;
    tx.commit().await.map_err(|e| {
        tracing::error!(error = %e, employee_id, "Failed to reset application");
        AppError::Internal
    })?;

    tracing::info!(employee_id, stage = %after.stage, by = actor.user_id, "Application reset");

    let warning = notify_applicant(notifier.get_ref(), &applicant, &after).await;

    Ok(HttpResponse::Ok().json(ProgressResponse {
        message: "Application reset".into(),
        progress: after,
        warning,
    }))
}

#[utoipa::path(
    get,
    path = "/api/training/rubric/{stage}",
    params(("stage" = TrainingStage, Path, description = "physical_training or customer_service_training")),
    responses(
        (status = 200, body = RubricResponse),
        (status = 400, description = "Stage is not scored with a rubric")
    ),
    security(("bearer_auth" = [])),
    tag = "Training"
)]
pub async fn get_rubric(path: web::Path<TrainingStage>) -> Result<impl Responder, AppError> {
    let stage = path.into_inner();
    let criteria = stage
        .rubric()
        .ok_or(TrainingError::RubricNotApplicable(stage))?;

    Ok(HttpResponse::Ok().json(RubricResponse {
        stage,
        criteria: criteria.iter().map(|c| c.to_string()).collect(),
        passing_average: PASSING_AVERAGE,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        model::{employee::ApplicationStatus, role::Role},
        service::context::ActorContext,
    };

    /// Same rule as the guarded progress UPDATE.
    fn guarded_write(
        stored: &mut TrainingProgress,
        before: TrainingProgress,
        after: TrainingProgress,
    ) -> u64 {
        if *stored == before {
            *stored = after;
            1
        } else {
            0
        }
    }

    #[test]
    fn double_advance_from_one_read_is_a_conflict() {
        let hr = ActorContext::new(1, Role::Hr);
        let snapshot = TrainingProgress::new();
        let mut stored = snapshot;
        let passed = Evaluation::Decision { passed: true };

        let first = evaluate(&hr, &snapshot, &passed).unwrap();
        let second = evaluate(&hr, &snapshot, &passed).unwrap();

        assert_eq!(
            ensure_unchanged(guarded_write(&mut stored, snapshot, first.progress), || "first".into()),
            Ok(())
        );
        assert!(matches!(
            ensure_unchanged(guarded_write(&mut stored, snapshot, second.progress), || {
                "training progress of employee 5".into()
            }),
            Err(AppError::Conflict(_))
        ));
        // one stage advanced, not two
        assert_eq!(stored.stage, TrainingStage::FinalInterview);
        assert_eq!(stored.status, ApplicationStatus::Ongoing);
    }
}
