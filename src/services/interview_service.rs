use chrono::Duration;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::database::PipelineStore;
use crate::dto::interview_dto::{
    CancelInterviewPayload, CompleteInterviewPayload, RescheduleInterviewPayload,
    ScheduleInterviewPayload,
};
use crate::error::{Error, Result};
use crate::models::application::{Application, ApplicationStatus};
use crate::models::interview::{Interview, InterviewStatus};
use crate::models::note::{Note, NoteCategory, NoteSentiment};
use crate::services::access_service::AccessService;
use crate::services::application_service::ApplicationService;
use crate::services::collaborators::InterviewNotice;
use crate::services::notification_service::{NotificationService, PipelineEvent};
use crate::utils::time::now;
use crate::utils::validation::{validate, validate_score};

#[derive(Clone)]
pub struct InterviewService {
    store: Arc<dyn PipelineStore>,
    applications: ApplicationService,
    access: AccessService,
    notifications: NotificationService,
}

impl InterviewService {
    pub fn new(
        store: Arc<dyn PipelineStore>,
        applications: ApplicationService,
        access: AccessService,
        notifications: NotificationService,
    ) -> Self {
        Self {
            store,
            applications,
            access,
            notifications,
        }
    }

    /// Moves the application to `interview` first when it has not got there yet.
    pub async fn schedule(
        &self,
        application_id: Uuid,
        actor: Uuid,
        payload: ScheduleInterviewPayload,
    ) -> Result<Interview> {
        validate(&payload)?;
        let mut application = self.applications.load(application_id).await?;
        self.access.check_employer_access(&application, actor).await?;
        if application.status.is_terminal() {
            return Err(Error::InvalidState(format!(
                "cannot schedule an interview for an application in status '{}'",
                application.status
            )));
        }

        // Resolve an explicit stage before any state change so a bad id leaves
        // the application untouched.
        let explicit_stage = match payload.stage_id {
            Some(stage_id) => {
                let stage = self
                    .store
                    .get_stage(stage_id)
                    .await?
                    .ok_or_else(|| Error::not_found("stage", stage_id))?;
                if stage.application_id != application.id {
                    return Err(Error::BadRequest(format!(
                        "stage {} does not belong to application {}",
                        stage_id, application.id
                    )));
                }
                Some(stage.id)
            }
            None => None,
        };

        if !application.status.has_reached(ApplicationStatus::Interview) {
            application = self
                .applications
                .advance_loaded(
                    &application,
                    actor,
                    ApplicationStatus::Interview,
                    Some("Interview scheduled".to_string()),
                )
                .await?;
        }

        let stage_id = match explicit_stage {
            Some(stage_id) => Some(stage_id),
            None => self
                .store
                .list_stages(application.id)
                .await?
                .into_iter()
                .rev()
                .find(|stage| stage.is_open())
                .map(|stage| stage.id),
        };

        let ts = now();
        let interview = Interview {
            id: Uuid::new_v4(),
            application_id: application.id,
            stage_id,
            interviewer_id: payload.interviewer_id,
            scheduled_at: payload.scheduled_at,
            ended_at: None,
            medium: payload.medium,
            meeting_link: payload.meeting_link,
            location: payload.location,
            status: InterviewStatus::Scheduled,
            overall_score: None,
            technical_score: None,
            communication_score: None,
            personality_score: None,
            remarks: payload.remarks,
            feedback_summary: None,
            reminded_at: None,
            created_at: ts,
            updated_at: ts,
        };
        let interview = self.store.insert_interview(interview).await?;
        info!(
            interview_id = %interview.id,
            application_id = %application.id,
            scheduled_at = %interview.scheduled_at,
            "Interview scheduled"
        );

        self.notify_scheduled(&application, &interview);
        Ok(interview)
    }

    pub async fn reschedule(
        &self,
        interview_id: Uuid,
        actor: Uuid,
        payload: RescheduleInterviewPayload,
    ) -> Result<Interview> {
        validate(&payload)?;
        let (mut interview, application) = self.load_for_update(interview_id, actor).await?;
        ensure_pending(&interview, "rescheduled")?;

        interview.scheduled_at = payload.scheduled_at;
        if payload.meeting_link.is_some() {
            interview.meeting_link = payload.meeting_link;
        }
        if payload.location.is_some() {
            interview.location = payload.location;
        }
        interview.status = InterviewStatus::Rescheduled;
        interview.reminded_at = None;
        interview.updated_at = now();
        let interview = self.store.update_interview(interview).await?;

        if let Some(reason) = payload.reason {
            self.add_workflow_note(
                &interview,
                actor,
                NoteCategory::Interview,
                NoteSentiment::Neutral,
                format!("Interview rescheduled: {}", reason),
            )
            .await?;
        }

        info!(
            interview_id = %interview.id,
            scheduled_at = %interview.scheduled_at,
            "Interview rescheduled"
        );
        self.notify_scheduled(&application, &interview);
        Ok(interview)
    }

    pub async fn cancel(
        &self,
        interview_id: Uuid,
        actor: Uuid,
        payload: CancelInterviewPayload,
    ) -> Result<Interview> {
        validate(&payload)?;
        let (mut interview, _) = self.load_for_update(interview_id, actor).await?;
        ensure_pending(&interview, "cancelled")?;

        interview.status = InterviewStatus::Cancelled;
        interview.updated_at = now();
        let interview = self.store.update_interview(interview).await?;

        if let Some(reason) = payload.reason {
            self.add_workflow_note(
                &interview,
                actor,
                NoteCategory::Interview,
                NoteSentiment::Neutral,
                format!("Interview cancelled: {}", reason),
            )
            .await?;
        }

        info!(interview_id = %interview.id, "Interview cancelled");
        Ok(interview)
    }

    pub async fn complete(
        &self,
        interview_id: Uuid,
        actor: Uuid,
        payload: CompleteInterviewPayload,
    ) -> Result<Interview> {
        validate(&payload)?;
        for (field, score) in payload.scores.iter() {
            validate_score(field, Some(score))?;
        }
        let (mut interview, _) = self.load_for_update(interview_id, actor).await?;
        if interview.status != InterviewStatus::Scheduled {
            return Err(Error::InvalidState(format!(
                "interview cannot be completed in current status '{}'",
                interview.status
            )));
        }

        let ts = now();
        interview.status = InterviewStatus::Completed;
        interview.ended_at = Some(ts);
        interview.overall_score = payload.scores.overall;
        interview.technical_score = payload.scores.technical;
        interview.communication_score = payload.scores.communication;
        interview.personality_score = payload.scores.personality;
        if payload.remarks.is_some() {
            interview.remarks = payload.remarks;
        }
        interview.feedback_summary = payload.feedback_summary.clone();
        interview.updated_at = ts;
        let interview = self.store.update_interview(interview).await?;

        if let Some(summary) = payload.feedback_summary {
            self.add_workflow_note(
                &interview,
                actor,
                NoteCategory::Feedback,
                NoteSentiment::Neutral,
                summary,
            )
            .await?;
        }

        info!(
            interview_id = %interview.id,
            overall_score = ?interview.overall_score,
            "Interview completed"
        );
        Ok(interview)
    }

    pub async fn mark_no_show(&self, interview_id: Uuid, actor: Uuid) -> Result<Interview> {
        let (mut interview, _) = self.load_for_update(interview_id, actor).await?;
        ensure_pending(&interview, "marked as no-show")?;

        interview.status = InterviewStatus::NoShow;
        interview.updated_at = now();
        let interview = self.store.update_interview(interview).await?;

        self.add_workflow_note(
            &interview,
            actor,
            NoteCategory::Interview,
            NoteSentiment::Negative,
            "Candidate did not attend the scheduled interview".to_string(),
        )
        .await?;

        info!(interview_id = %interview.id, "Interview marked as no-show");
        Ok(interview)
    }

    /// Re-issues the scheduling notification.
    pub async fn send_reminder(&self, interview_id: Uuid, actor: Uuid) -> Result<Interview> {
        let (interview, application) = self.load_for_update(interview_id, actor).await?;
        ensure_pending(&interview, "reminded")?;
        self.notify_scheduled(&application, &interview);
        info!(interview_id = %interview.id, "Interview reminder sent");
        Ok(interview)
    }

    /// Sends one reminder per pending interview starting within `lead` from now
    /// and stamps `reminded_at` so the next sweep skips it. Returns how many
    /// reminders went out.
    pub async fn send_due_reminders(&self, lead: Duration) -> Result<usize> {
        let ts = now();
        let due = self.store.list_due_reminders(ts, ts + lead).await?;
        let mut sent = 0;

        for mut interview in due {
            let application = match self.store.get_application(interview.application_id).await {
                Ok(Some(application)) => application,
                Ok(None) => {
                    warn!(
                        interview_id = %interview.id,
                        "Skipping reminder for missing application"
                    );
                    continue;
                }
                Err(e) => {
                    warn!(
                        interview_id = %interview.id,
                        error = %e,
                        "Failed to load application for reminder"
                    );
                    continue;
                }
            };
            let interview_id = interview.id;
            let terminal = application.status.is_terminal();
            // Terminal applications get stamped without a notice so later sweeps skip them.
            interview.reminded_at = Some(ts);
            interview.updated_at = ts;
            let interview = match self.store.update_interview(interview).await {
                Ok(interview) => interview,
                Err(e) => {
                    warn!(%interview_id, error = %e, "Failed to stamp interview reminder");
                    continue;
                }
            };
            if terminal {
                continue;
            }

            self.notify_scheduled(&application, &interview);
            sent += 1;
        }

        if sent > 0 {
            info!(count = sent, "Interview reminders dispatched");
        }
        Ok(sent)
    }

    pub async fn get(&self, interview_id: Uuid, caller: Uuid) -> Result<Interview> {
        let interview = self.load(interview_id).await?;
        let application = self.applications.load(interview.application_id).await?;
        self.access.check_read_access(&application, caller).await?;
        Ok(interview)
    }

    pub async fn list(&self, application_id: Uuid, caller: Uuid) -> Result<Vec<Interview>> {
        let application = self.applications.load(application_id).await?;
        self.access.check_read_access(&application, caller).await?;
        self.store.list_interviews(application_id).await
    }

    async fn load(&self, interview_id: Uuid) -> Result<Interview> {
        self.store
            .get_interview(interview_id)
            .await?
            .ok_or_else(|| Error::not_found("interview", interview_id))
    }

    async fn load_for_update(
        &self,
        interview_id: Uuid,
        actor: Uuid,
    ) -> Result<(Interview, Application)> {
        let interview = self.load(interview_id).await?;
        let application = self.applications.load(interview.application_id).await?;
        self.access.check_employer_access(&application, actor).await?;
        Ok((interview, application))
    }

    async fn add_workflow_note(
        &self,
        interview: &Interview,
        author: Uuid,
        category: NoteCategory,
        sentiment: NoteSentiment,
        content: String,
    ) -> Result<Note> {
        let note = Note::internal(
            interview.application_id,
            interview.stage_id,
            author,
            category,
            sentiment,
            content,
            now(),
        );
        self.store.insert_note(note).await
    }

    fn notify_scheduled(&self, application: &Application, interview: &Interview) {
        self.notifications.dispatch(PipelineEvent::InterviewScheduled {
            candidate_id: application.candidate_id,
            notice: InterviewNotice {
                interview_id: interview.id,
                application_id: application.id,
                job_id: application.job_id,
                scheduled_at: interview.scheduled_at,
                medium: interview.medium,
                meeting_link: interview.meeting_link.clone(),
                location: interview.location.clone(),
            },
        });
    }
}

fn ensure_pending(interview: &Interview, action: &str) -> Result<()> {
    if !interview.status.is_pending() {
        return Err(Error::InvalidState(format!(
            "interview cannot be {} in current status '{}'",
            action, interview.status
        )));
    }
    Ok(())
}
