use async_trait::async_trait;
use tracing::info;

use crate::{
    model::employee::{ApplicationStatus, TrainingStage},
    service::{procurement::Transition, training::TrainingProgress},
};

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Outbound message transport.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: &Notification) -> anyhow::Result<()>;
}

/// Writes notifications to the application log instead of delivering them.
pub struct LogNotifier {
    pub from: String,
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, notification: &Notification) -> anyhow::Result<()> {
        info!(
            from = %self.from,
            to = %notification.to,
            subject = %notification.subject,
            "Notification dispatched"
        );
        Ok(())
    }
}

/// Send after the primary write has committed. A failure is returned as a
/// warning for the caller; it never undoes the committed change.
pub async fn dispatch(notifier: &dyn Notifier, notification: Notification) -> Option<String> {
    match notifier.send(&notification).await {
        Ok(()) => None,
        Err(e) => {
            tracing::warn!(error = %e, to = %notification.to, "Notification failed");
            Some(format!("Change saved, but the notification to {} failed: {}", notification.to, e))
        }
    }
}

pub fn rejection_notice(to: String, request_id: u64, transition: &Transition) -> Notification {
    let reason = transition.reason.as_deref().unwrap_or("no reason given");
    Notification {
        to,
        subject: format!("Purchase request #{} was rejected", request_id),
        body: format!(
            "Your purchase request #{} was rejected at the {} stage.\n\nReason: {}",
            request_id, transition.track, reason
        ),
    }
}

/// Stage-specific message sent to an applicant after their progress changes.
pub fn training_notice(to: String, name: &str, progress: &TrainingProgress) -> Notification {
    let (subject, body) = match (progress.stage, progress.status) {
        (stage, ApplicationStatus::Failed) => (
            format!("{} result", stage),
            format!(
                "Dear {},\n\nThank you for taking part in the {}. Unfortunately you did not pass this stage. \
                 Please contact HR if you wish to re-apply.",
                name, stage
            ),
        ),
        (TrainingStage::Deployment, ApplicationStatus::Passed) => (
            "Deployment confirmed".to_string(),
            format!(
                "Dear {},\n\nCongratulations, you have completed onboarding and have been assigned to a client post. \
                 Your supervisor will contact you with your schedule.",
                name
            ),
        ),
        (TrainingStage::InitialInterview, _) => (
            "Initial interview schedule".to_string(),
            format!("Dear {},\n\nYour application was received. Please wait for your initial interview schedule.", name),
        ),
        (TrainingStage::FinalInterview, _) => (
            "You passed the initial interview".to_string(),
            format!("Dear {},\n\nYou passed the initial interview. Your final interview will be scheduled shortly.", name),
        ),
        (TrainingStage::Orientation, _) => (
            "Orientation schedule".to_string(),
            format!("Dear {},\n\nYou passed the final interview. Please attend the company orientation.", name),
        ),
        (TrainingStage::PhysicalTraining, _) => (
            "Physical training".to_string(),
            format!(
                "Dear {},\n\nYou completed orientation. Physical training starts next; bring your training uniform.",
                name
            ),
        ),
        (TrainingStage::CustomerServiceTraining, _) => (
            "Customer service training".to_string(),
            format!("Dear {},\n\nYou passed physical training. Customer service training starts next.", name),
        ),
        (TrainingStage::Deployment, _) => (
            "Ready for deployment".to_string(),
            format!(
                "Dear {},\n\nYou passed customer service training and are now awaiting deployment to a client.",
                name
            ),
        ),
    };
    Notification { to, subject, body }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{purchase_request::RequestStatus, role::Role};
    use crate::service::{
        context::ActorContext,
        procurement::{WorkflowAction, apply_transition},
    };

    struct Unreachable;

    #[async_trait]
    impl Notifier for Unreachable {
        async fn send(&self, _: &Notification) -> anyhow::Result<()> {
            anyhow::bail!("smtp connection refused")
        }
    }

    fn notice() -> Notification {
        Notification {
            to: "juan@company.com".into(),
            subject: "s".into(),
            body: "b".into(),
        }
    }

    #[actix_web::test]
    async fn failed_delivery_becomes_a_warning() {
        let warning = dispatch(&Unreachable, notice()).await.unwrap();
        assert!(warning.contains("juan@company.com"));
        assert!(warning.contains("smtp connection refused"));

        let ok = LogNotifier { from: "hr@company.com".into() };
        assert_eq!(dispatch(&ok, notice()).await, None);
    }

    #[test]
    fn rejection_notice_carries_reason() {
        let t = apply_transition(
            &RequestStatus::new(),
            1,
            &ActorContext::new(2, Role::Finance),
            &WorkflowAction::Reject { reason: "duplicate order".into() },
        )
        .unwrap();
        let n = rejection_notice("ops@company.com".into(), 17, &t);
        assert_eq!(n.subject, "Purchase request #17 was rejected");
        assert!(n.body.contains("duplicate order"));
        assert!(n.body.contains("finance"));
    }

    #[test]
    fn training_templates_differ_by_stage() {
        let progress = TrainingProgress {
            stage: TrainingStage::Orientation,
            status: ApplicationStatus::Ongoing,
        };
        let n = training_notice("a@b.c".into(), "Juan", &progress);
        assert_eq!(n.subject, "Orientation schedule");

        let failed = TrainingProgress {
            status: ApplicationStatus::Failed,
            ..progress
        };
        let n = training_notice("a@b.c".into(), "Juan", &failed);
        assert_eq!(n.subject, "Orientation result");
        assert!(n.body.contains("did not pass"));
    }
}
