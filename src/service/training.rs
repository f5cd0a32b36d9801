//! Applicant onboarding progression.
//!
//! An applicant moves through [`TrainingStage`] one stage at a time. A pass
//! moves them to the next stage as `Ongoing`; a fail parks them at the
//! current stage as `Failed` until someone resets the application.

use derive_more::Display;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::AppError,
    model::{
        employee::{ApplicationStatus, TrainingStage},
        role::Role,
    },
    service::context::ActorContext,
};

pub const RUBRIC_SIZE: usize = 10;
pub const PASSING_AVERAGE: Decimal = dec!(3.00);

pub const PHYSICAL_TRAINING_RUBRIC: [&str; RUBRIC_SIZE] = [
    "Endurance run",
    "Push-ups",
    "Sit-ups",
    "Agility drill",
    "Unarmed defense",
    "Baton handling",
    "Patrol posture",
    "Drill and ceremony",
    "First aid response",
    "Discipline",
];

pub const CUSTOMER_SERVICE_RUBRIC: [&str; RUBRIC_SIZE] = [
    "Greeting and courtesy",
    "Verbal communication",
    "Active listening",
    "Visitor screening",
    "Complaint handling",
    "Telephone etiquette",
    "Incident report writing",
    "Conflict de-escalation",
    "Grooming",
    "Professional conduct",
];

impl TrainingStage {
    pub fn next(self) -> Option<Self> {
        match self {
            TrainingStage::InitialInterview => Some(TrainingStage::FinalInterview),
            TrainingStage::FinalInterview => Some(TrainingStage::Orientation),
            TrainingStage::Orientation => Some(TrainingStage::PhysicalTraining),
            TrainingStage::PhysicalTraining => Some(TrainingStage::CustomerServiceTraining),
            TrainingStage::CustomerServiceTraining => Some(TrainingStage::Deployment),
            TrainingStage::Deployment => None,
        }
    }

    /// Criteria scored for the two training stages.
    pub fn rubric(self) -> Option<&'static [&'static str; RUBRIC_SIZE]> {
        match self {
            TrainingStage::PhysicalTraining => Some(&PHYSICAL_TRAINING_RUBRIC),
            TrainingStage::CustomerServiceTraining => Some(&CUSTOMER_SERVICE_RUBRIC),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TrainingProgress {
    pub stage: TrainingStage,
    pub status: ApplicationStatus,
}

impl TrainingProgress {
    pub fn new() -> Self {
        Self {
            stage: TrainingStage::InitialInterview,
            status: ApplicationStatus::Ongoing,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.stage == TrainingStage::Deployment && self.status == ApplicationStatus::Passed
    }
}

impl Default for TrainingProgress {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome submitted for the current stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Evaluation {
    /// Interviews and orientation are a plain pass/fail decision.
    Decision { passed: bool },
    /// Training stages are scored 1-5 on each rubric criterion.
    Rubric { ratings: Vec<u8> },
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct EvaluationOutcome {
    pub evaluated_stage: TrainingStage,
    #[schema(value_type = Option<String>, example = "3.40")]
    pub average: Option<Decimal>,
    pub result: ApplicationStatus,
    pub progress: TrainingProgress,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DeploymentAssignment {
    #[schema(example = 12)]
    pub client_id: Option<u64>,
    #[schema(example = 3)]
    pub branch_id: Option<u64>,
}

#[derive(Debug, Display, PartialEq)]
pub enum TrainingError {
    #[display(fmt = "{} cannot manage applicant training", _0)]
    NotPermitted(Role),
    #[display(fmt = "Expected {} ratings, got {}", RUBRIC_SIZE, _0)]
    RatingCount(usize),
    #[display(fmt = "Ratings must be between 1 and 5, got {}", _0)]
    RatingOutOfRange(u8),
    #[display(fmt = "{} is scored with the rubric", _0)]
    RubricRequired(TrainingStage),
    #[display(fmt = "{} is not scored with a rubric", _0)]
    RubricNotApplicable(TrainingStage),
    #[display(fmt = "Application failed at {}; reset it before another attempt", _0)]
    Halted(TrainingStage),
    #[display(fmt = "Applicant is already deployed")]
    AlreadyDeployed,
    #[display(fmt = "Deployment is completed by assigning a client, not by evaluation")]
    DeploymentNeedsAssignment,
    #[display(fmt = "Applicant is at {} and cannot be deployed yet", _0)]
    NotReadyForDeployment(TrainingStage),
    #[display(fmt = "A client must be selected for deployment")]
    MissingClient,
    #[display(fmt = "Only a failed application can be reset (current status: {})", _0)]
    NotFailed(ApplicationStatus),
}

impl std::error::Error for TrainingError {}

impl From<TrainingError> for AppError {
    fn from(e: TrainingError) -> Self {
        match e {
            TrainingError::NotPermitted(_) => AppError::Forbidden("HR/Admin only"),
            TrainingError::RatingCount(_)
            | TrainingError::RatingOutOfRange(_)
            | TrainingError::RubricRequired(_)
            | TrainingError::RubricNotApplicable(_)
            | TrainingError::MissingClient => AppError::Validation(e.to_string()),
            _ => AppError::Precondition(e.to_string()),
        }
    }
}

fn require_evaluator(actor: &ActorContext) -> Result<(), TrainingError> {
    if actor.role.is_hr_or_admin() {
        Ok(())
    } else {
        Err(TrainingError::NotPermitted(actor.role))
    }
}

/// Mean of the rubric ratings, rounded to two decimals.
pub fn average_rating(ratings: &[u8]) -> Result<Decimal, TrainingError> {
    if ratings.len() != RUBRIC_SIZE {
        return Err(TrainingError::RatingCount(ratings.len()));
    }
    if let Some(bad) = ratings.iter().find(|r| !(1..=5).contains(*r)) {
        return Err(TrainingError::RatingOutOfRange(*bad));
    }
    let sum: u32 = ratings.iter().map(|r| *r as u32).sum();
    Ok((Decimal::from(sum) / Decimal::from(RUBRIC_SIZE as u32))
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}

fn ensure_active(progress: &TrainingProgress) -> Result<(), TrainingError> {
    if progress.is_complete() {
        return Err(TrainingError::AlreadyDeployed);
    }
    if progress.status == ApplicationStatus::Failed {
        return Err(TrainingError::Halted(progress.stage));
    }
    Ok(())
}

pub fn evaluate(
    actor: &ActorContext,
    progress: &TrainingProgress,
    evaluation: &Evaluation,
) -> Result<EvaluationOutcome, TrainingError> {
    require_evaluator(actor)?;
    ensure_active(progress)?;

    let stage = progress.stage;
    let next = stage.next().ok_or(TrainingError::DeploymentNeedsAssignment)?;

    let (passed, average) = match (stage.rubric(), evaluation) {
        (Some(_), Evaluation::Rubric { ratings }) => {
            let average = average_rating(ratings)?;
            (average >= PASSING_AVERAGE, Some(average))
        }
        (Some(_), Evaluation::Decision { .. }) => return Err(TrainingError::RubricRequired(stage)),
        (None, Evaluation::Rubric { .. }) => return Err(TrainingError::RubricNotApplicable(stage)),
        (None, Evaluation::Decision { passed }) => (*passed, None),
    };

    let (result, progress) = if passed {
        (
            ApplicationStatus::Passed,
            TrainingProgress {
                stage: next,
                status: ApplicationStatus::Ongoing,
            },
        )
    } else {
        (
            ApplicationStatus::Failed,
            TrainingProgress {
                stage,
                status: ApplicationStatus::Failed,
            },
        )
    };

    Ok(EvaluationOutcome {
        evaluated_stage: stage,
        average,
        result,
        progress,
    })
}

/// Complete the pipeline by assigning the applicant to a client. Reaching
/// the Deployment stage means Customer Service Training was passed.
pub fn deploy(
    actor: &ActorContext,
    progress: &TrainingProgress,
    assignment: &DeploymentAssignment,
) -> Result<TrainingProgress, TrainingError> {
    require_evaluator(actor)?;
    ensure_active(progress)?;
    if progress.stage != TrainingStage::Deployment {
        return Err(TrainingError::NotReadyForDeployment(progress.stage));
    }
    if assignment.client_id.is_none() {
        return Err(TrainingError::MissingClient);
    }
    Ok(TrainingProgress {
        stage: TrainingStage::Deployment,
        status: ApplicationStatus::Passed,
    })
}

/// Manual re-application after a failure, at the same stage.
pub fn reset(actor: &ActorContext, progress: &TrainingProgress) -> Result<TrainingProgress, TrainingError> {
    require_evaluator(actor)?;
    if progress.status != ApplicationStatus::Failed {
        return Err(TrainingError::NotFailed(progress.status));
    }
    Ok(TrainingProgress {
        stage: progress.stage,
        status: ApplicationStatus::Ongoing,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    fn hr() -> ActorContext {
        ActorContext::new(1, Role::Hr)
    }

    fn at(stage: TrainingStage) -> TrainingProgress {
        TrainingProgress {
            stage,
            status: ApplicationStatus::Ongoing,
        }
    }

    fn pass() -> Evaluation {
        Evaluation::Decision { passed: true }
    }

    fn rubric(ratings: [u8; RUBRIC_SIZE]) -> Evaluation {
        Evaluation::Rubric {
            ratings: ratings.to_vec(),
        }
    }

    #[test]
    fn all_fives_pass_and_all_ones_fail() {
        let top = evaluate(&hr(), &at(TrainingStage::PhysicalTraining), &rubric([5; 10])).unwrap();
        assert_eq!(top.average, Some(dec!(5.00)));
        assert_eq!(top.result, ApplicationStatus::Passed);
        assert_eq!(top.progress, at(TrainingStage::CustomerServiceTraining));

        let bottom = evaluate(&hr(), &at(TrainingStage::PhysicalTraining), &rubric([1; 10])).unwrap();
        assert_eq!(bottom.average, Some(dec!(1.00)));
        assert_eq!(bottom.result, ApplicationStatus::Failed);
        assert_eq!(bottom.progress.stage, TrainingStage::PhysicalTraining);
        assert_eq!(bottom.progress.status, ApplicationStatus::Failed);
    }

    #[test]
    fn threshold_is_inclusive() {
        let exactly_three = rubric([3, 3, 3, 3, 3, 3, 3, 3, 3, 3]);
        let out = evaluate(&hr(), &at(TrainingStage::CustomerServiceTraining), &exactly_three).unwrap();
        assert_eq!(out.result, ApplicationStatus::Passed);
        assert_eq!(out.progress, at(TrainingStage::Deployment));

        let just_under = rubric([3, 3, 3, 3, 3, 3, 3, 3, 3, 2]);
        let out = evaluate(&hr(), &at(TrainingStage::CustomerServiceTraining), &just_under).unwrap();
        assert_eq!(out.average, Some(dec!(2.90)));
        assert_eq!(out.result, ApplicationStatus::Failed);
    }

    #[test]
    fn rubric_shape_is_validated() {
        let stage = at(TrainingStage::PhysicalTraining);
        let short = Evaluation::Rubric { ratings: vec![5; 9] };
        assert_eq!(evaluate(&hr(), &stage, &short), Err(TrainingError::RatingCount(9)));
        assert_eq!(
            evaluate(&hr(), &stage, &rubric([5, 5, 5, 0, 5, 5, 5, 5, 5, 5])),
            Err(TrainingError::RatingOutOfRange(0))
        );
        assert_eq!(
            evaluate(&hr(), &stage, &pass()),
            Err(TrainingError::RubricRequired(TrainingStage::PhysicalTraining))
        );
        assert_eq!(
            evaluate(&hr(), &at(TrainingStage::Orientation), &rubric([4; 10])),
            Err(TrainingError::RubricNotApplicable(TrainingStage::Orientation))
        );
    }

    #[test]
    fn walks_every_stage_in_order() {
        let mut progress = TrainingProgress::new();
        for stage in TrainingStage::iter().take_while(|s| *s != TrainingStage::Deployment) {
            assert_eq!(progress.stage, stage);
            let evaluation = if stage.rubric().is_some() { rubric([4; 10]) } else { pass() };
            progress = evaluate(&hr(), &progress, &evaluation).unwrap().progress;
        }
        assert_eq!(progress, at(TrainingStage::Deployment));

        let assignment = DeploymentAssignment {
            client_id: Some(12),
            branch_id: Some(3),
        };
        let done = deploy(&hr(), &progress, &assignment).unwrap();
        assert!(done.is_complete());
        assert_eq!(deploy(&hr(), &done, &assignment), Err(TrainingError::AlreadyDeployed));
    }

    #[test]
    fn failure_halts_until_reset() {
        let failed = evaluate(&hr(), &at(TrainingStage::FinalInterview), &Evaluation::Decision { passed: false })
            .unwrap()
            .progress;
        assert_eq!(
            evaluate(&hr(), &failed, &pass()),
            Err(TrainingError::Halted(TrainingStage::FinalInterview))
        );

        let retry = reset(&hr(), &failed).unwrap();
        assert_eq!(retry, at(TrainingStage::FinalInterview));
        assert_eq!(
            reset(&hr(), &retry),
            Err(TrainingError::NotFailed(ApplicationStatus::Ongoing))
        );
        assert_eq!(
            evaluate(&hr(), &retry, &pass()).unwrap().progress,
            at(TrainingStage::Orientation)
        );
    }

    #[test]
    fn deployment_requires_a_client_and_the_right_stage() {
        let no_client = DeploymentAssignment {
            client_id: None,
            branch_id: Some(3),
        };
        assert_eq!(
            deploy(&hr(), &at(TrainingStage::Deployment), &no_client),
            Err(TrainingError::MissingClient)
        );
        let client = DeploymentAssignment {
            client_id: Some(1),
            branch_id: None,
        };
        assert_eq!(
            deploy(&hr(), &at(TrainingStage::CustomerServiceTraining), &client),
            Err(TrainingError::NotReadyForDeployment(TrainingStage::CustomerServiceTraining))
        );
        assert_eq!(
            evaluate(&hr(), &at(TrainingStage::Deployment), &pass()),
            Err(TrainingError::DeploymentNeedsAssignment)
        );
    }

    #[test]
    fn only_hr_or_admin_manage_training() {
        let guard = ActorContext::new(5, Role::Employee);
        let err = evaluate(&guard, &at(TrainingStage::Orientation), &pass()).unwrap_err();
        assert_eq!(err, TrainingError::NotPermitted(Role::Employee));
        assert_eq!(AppError::from(err), AppError::Forbidden("HR/Admin only"));
    }
}
