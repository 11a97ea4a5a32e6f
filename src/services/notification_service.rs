use std::sync::Arc;
use tokio_util::task::TaskTracker;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::services::collaborators::{
    ApplicationNotice, EmailSender, InterviewNotice, NotificationSender, Recipient, StatusNotice,
    UserDirectory,
};

/// Event raised after a pipeline write has been persisted.
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    ApplicationReceived {
        candidate_id: Uuid,
        notice: ApplicationNotice,
    },
    StatusUpdated {
        candidate_id: Uuid,
        notice: StatusNotice,
    },
    InterviewScheduled {
        candidate_id: Uuid,
        notice: InterviewNotice,
    },
}

impl PipelineEvent {
    pub fn candidate_id(&self) -> Uuid {
        match self {
            PipelineEvent::ApplicationReceived { candidate_id, .. }
            | PipelineEvent::StatusUpdated { candidate_id, .. }
            | PipelineEvent::InterviewScheduled { candidate_id, .. } => *candidate_id,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PipelineEvent::ApplicationReceived { .. } => "application_received",
            PipelineEvent::StatusUpdated { .. } => "status_updated",
            PipelineEvent::InterviewScheduled { .. } => "interview_scheduled",
        }
    }
}

/// Fire-and-forget delivery of pipeline events to the candidate over email and
/// in-app notifications. Each channel fails independently; failures are
/// logged and dropped (at-most-once, no retry).
#[derive(Clone)]
pub struct NotificationService {
    users: Arc<dyn UserDirectory>,
    email: Arc<dyn EmailSender>,
    notifier: Arc<dyn NotificationSender>,
    tracker: TaskTracker,
}

impl NotificationService {
    pub fn new(
        users: Arc<dyn UserDirectory>,
        email: Arc<dyn EmailSender>,
        notifier: Arc<dyn NotificationSender>,
    ) -> Self {
        Self {
            users,
            email,
            notifier,
            tracker: TaskTracker::new(),
        }
    }

    /// Spawns delivery and returns immediately.
    pub fn dispatch(&self, event: PipelineEvent) {
        let this = self.clone();
        self.tracker.spawn(async move {
            this.deliver(event).await;
        });
    }

    pub async fn deliver(&self, event: PipelineEvent) {
        let candidate_id = event.candidate_id();
        let recipient = match self.users.get_user(candidate_id).await {
            Ok(Some(user)) => Recipient::from(&user),
            Ok(None) => {
                warn!(
                    user_id = %candidate_id,
                    event = event.name(),
                    "Notification recipient not found"
                );
                return;
            }
            Err(e) => {
                warn!(
                    user_id = %candidate_id,
                    event = event.name(),
                    error = %e,
                    "Failed to resolve notification recipient"
                );
                return;
            }
        };

        let (email, in_app) = match &event {
            PipelineEvent::ApplicationReceived { notice, .. } => (
                self.email.application_received(&recipient, notice).await,
                self.notifier.application_received(&recipient, notice).await,
            ),
            PipelineEvent::StatusUpdated { notice, .. } => (
                self.email.status_updated(&recipient, notice).await,
                self.notifier.status_updated(&recipient, notice).await,
            ),
            PipelineEvent::InterviewScheduled { notice, .. } => (
                self.email.interview_scheduled(&recipient, notice).await,
                self.notifier.interview_scheduled(&recipient, notice).await,
            ),
        };

        if let Err(e) = email {
            warn!(
                user_id = %candidate_id,
                event = event.name(),
                error = %e,
                "Email delivery failed"
            );
        }
        if let Err(e) = in_app {
            warn!(
                user_id = %candidate_id,
                event = event.name(),
                error = %e,
                "In-app notification failed"
            );
        }
        debug!(user_id = %candidate_id, event = event.name(), "Notification dispatch finished");
    }

    /// Waits for every delivery spawned so far; new dispatches are still accepted afterwards.
    pub async fn flush(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }

    /// Waits for in-flight deliveries before shutdown.
    pub async fn drain(&self) {
        self.tracker.close();
        self.tracker.wait().await;
    }
}
