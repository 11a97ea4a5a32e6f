use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::database::PipelineStore;
use crate::dto::application_dto::{
    AdvanceStagePayload, ApplicationListQuery, BulkStatusPayload, BulkUpdateResult,
    RejectPayload, SubmitApplicationPayload,
};
use crate::error::{Error, Result};
use crate::models::application::{Application, ApplicationFilter, ApplicationStatus};
use crate::models::directory::AccountType;
use crate::models::stage::{StageEntry, StageTransition};
use crate::services::access_service::AccessService;
use crate::services::collaborators::{ApplicationNotice, JobDirectory, StatusNotice, UserDirectory};
use crate::services::document_service::DocumentService;
use crate::services::notification_service::{NotificationService, PipelineEvent};
use crate::utils::time::now;
use crate::utils::validation::validate;

const DEFAULT_BULK_REJECTION: &str = "Rejected in bulk review";

/// Owns the application record and every status change on it. Each change
/// closes the open ledger entry and opens a new one in a single store call.
#[derive(Clone)]
pub struct ApplicationService {
    store: Arc<dyn PipelineStore>,
    jobs: Arc<dyn JobDirectory>,
    users: Arc<dyn UserDirectory>,
    access: AccessService,
    documents: DocumentService,
    notifications: NotificationService,
}

impl ApplicationService {
    pub fn new(
        store: Arc<dyn PipelineStore>,
        jobs: Arc<dyn JobDirectory>,
        users: Arc<dyn UserDirectory>,
        access: AccessService,
        documents: DocumentService,
        notifications: NotificationService,
    ) -> Self {
        Self {
            store,
            jobs,
            users,
            access,
            documents,
            notifications,
        }
    }

    pub async fn submit(
        &self,
        candidate_id: Uuid,
        payload: SubmitApplicationPayload,
    ) -> Result<Application> {
        validate(&payload)?;

        let job = self
            .jobs
            .get_job(payload.job_id)
            .await?
            .ok_or_else(|| Error::not_found("job", payload.job_id))?;
        if !job.accepts_applications() {
            return Err(Error::InvalidState(
                "job is not open for applications".to_string(),
            ));
        }

        let user = self
            .users
            .get_user(candidate_id)
            .await?
            .ok_or_else(|| Error::not_found("user", candidate_id))?;
        if !user.is_active {
            return Err(Error::Forbidden("candidate account is inactive".to_string()));
        }
        if user.account_type != AccountType::Candidate {
            return Err(Error::Forbidden(
                "only candidate accounts can apply to jobs".to_string(),
            ));
        }

        if self
            .store
            .find_active_application(job.id, candidate_id)
            .await?
            .is_some()
        {
            return Err(Error::Duplicate(
                "you have already applied to this job".to_string(),
            ));
        }

        let ts = now();
        let application = Application {
            id: Uuid::new_v4(),
            job_id: job.id,
            candidate_id,
            company_id: job.company_id,
            status: ApplicationStatus::Applied,
            source: payload.source,
            resume_url: payload.resume_url,
            cover_letter: payload.cover_letter,
            match_score: payload.match_score,
            employer_viewed: false,
            bookmarked: false,
            version: 0,
            applied_at: ts,
            updated_at: ts,
        };
        let initial = StageEntry::open(
            application.id,
            ApplicationStatus::Applied,
            Some(candidate_id),
            None,
            ts,
        );
        let application = self.store.insert_application(application, initial).await?;
        info!(
            application_id = %application.id,
            job_id = %application.job_id,
            candidate_id = %candidate_id,
            "Application submitted"
        );

        for upload in payload.documents {
            if let Err(e) = self.documents.attach(&application, candidate_id, upload).await {
                warn!(
                    application_id = %application.id,
                    error = %e,
                    "Failed to attach document on submission"
                );
            }
        }

        if let Err(e) = self.jobs.record_application(job.id).await {
            warn!(job_id = %job.id, error = %e, "Failed to bump job application counter");
        }

        self.notifications.dispatch(PipelineEvent::ApplicationReceived {
            candidate_id,
            notice: ApplicationNotice {
                application_id: application.id,
                job_id: application.job_id,
            },
        });

        Ok(application)
    }

    pub async fn get(&self, application_id: Uuid, caller: Uuid) -> Result<Application> {
        let application = self.load(application_id).await?;
        self.access.check_read_access(&application, caller).await?;
        Ok(application)
    }

    pub async fn list_for_candidate(
        &self,
        candidate_id: Uuid,
        caller: Uuid,
        query: ApplicationListQuery,
    ) -> Result<Vec<Application>> {
        if candidate_id != caller {
            return Err(Error::Forbidden(
                "candidates can only list their own applications".to_string(),
            ));
        }
        self.store
            .list_applications(&ApplicationFilter {
                candidate_id: Some(candidate_id),
                status: query.status,
                ..Default::default()
            })
            .await
    }

    pub async fn list_for_job(
        &self,
        job_id: Uuid,
        caller: Uuid,
        query: ApplicationListQuery,
    ) -> Result<Vec<Application>> {
        let job = self
            .jobs
            .get_job(job_id)
            .await?
            .ok_or_else(|| Error::not_found("job", job_id))?;
        self.access.check_company_access(job.company_id, caller).await?;
        self.store
            .list_applications(&ApplicationFilter {
                job_id: Some(job_id),
                status: query.status,
                ..Default::default()
            })
            .await
    }

    pub async fn stage_history(
        &self,
        application_id: Uuid,
        caller: Uuid,
    ) -> Result<Vec<StageEntry>> {
        let application = self.load(application_id).await?;
        self.access.check_read_access(&application, caller).await?;
        self.store.list_stages(application_id).await
    }

    pub async fn advance_stage(
        &self,
        application_id: Uuid,
        actor: Uuid,
        payload: AdvanceStagePayload,
    ) -> Result<Application> {
        validate(&payload)?;
        if !payload.status.is_advance_target() {
            return Err(Error::BadRequest(format!(
                "cannot advance an application to '{}'",
                payload.status
            )));
        }
        let application = self.load(application_id).await?;
        self.access.check_employer_access(&application, actor).await?;
        self.advance_loaded(&application, actor, payload.status, payload.notes)
            .await
    }

    /// Advance without the access check; callers must have authorized `actor`.
    pub(crate) async fn advance_loaded(
        &self,
        application: &Application,
        actor: Uuid,
        status: ApplicationStatus,
        notes: Option<String>,
    ) -> Result<Application> {
        ensure_open(application, "advanced")?;
        let closing_note = format!("Moved to {}", status);
        let updated = self
            .transition(application, actor, status, notes, closing_note)
            .await?;
        self.notify_status(&updated);
        Ok(updated)
    }

    pub async fn reject(
        &self,
        application_id: Uuid,
        actor: Uuid,
        payload: RejectPayload,
    ) -> Result<Application> {
        validate(&payload)?;
        let application = self.load(application_id).await?;
        self.access.check_employer_access(&application, actor).await?;
        ensure_open(&application, "rejected")?;

        let updated = self
            .transition(
                &application,
                actor,
                ApplicationStatus::Rejected,
                Some(payload.reason.clone()),
                payload.reason,
            )
            .await?;
        self.notify_status(&updated);
        Ok(updated)
    }

    /// Candidate-initiated; no notification is sent.
    pub async fn withdraw(&self, application_id: Uuid, candidate_id: Uuid) -> Result<Application> {
        let application = self.load(application_id).await?;
        self.access.check_ownership(&application, candidate_id)?;
        ensure_open(&application, "withdrawn")?;

        self.transition(
            &application,
            candidate_id,
            ApplicationStatus::Withdrawn,
            None,
            "Withdrawn by candidate".to_string(),
        )
        .await
    }

    /// Applies the matching single-application operation to every id. Items
    /// that fail for any reason are logged and reported as skipped.
    pub async fn bulk_update_status(
        &self,
        actor: Uuid,
        payload: BulkStatusPayload,
    ) -> Result<BulkUpdateResult> {
        validate(&payload)?;
        if payload.status == ApplicationStatus::Applied {
            return Err(Error::BadRequest(
                "applications cannot be moved back to 'applied'".to_string(),
            ));
        }

        let mut result = BulkUpdateResult::default();
        for id in payload.application_ids {
            let outcome = match payload.status {
                ApplicationStatus::Rejected => {
                    let reason = payload
                        .notes
                        .clone()
                        .unwrap_or_else(|| DEFAULT_BULK_REJECTION.to_string());
                    self.reject(id, actor, RejectPayload { reason }).await
                }
                ApplicationStatus::Withdrawn => self.withdraw(id, actor).await,
                status => {
                    self.advance_stage(
                        id,
                        actor,
                        AdvanceStagePayload {
                            status,
                            notes: payload.notes.clone(),
                        },
                    )
                    .await
                }
            };

            match outcome {
                Ok(_) => result.updated.push(id),
                Err(e) => {
                    warn!(
                        application_id = %id,
                        status = %payload.status,
                        error = %e,
                        "Skipping application in bulk update"
                    );
                    result.skipped.push(id);
                }
            }
        }

        info!(
            status = %payload.status,
            updated = result.updated.len(),
            skipped = result.skipped.len(),
            "Bulk status update finished"
        );
        Ok(result)
    }

    pub async fn mark_viewed(&self, application_id: Uuid, actor: Uuid) -> Result<Application> {
        let application = self.load(application_id).await?;
        self.access.check_employer_access(&application, actor).await?;
        if application.employer_viewed {
            return Ok(application);
        }
        self.store.mark_viewed(application_id, now()).await
    }

    pub async fn toggle_bookmark(&self, application_id: Uuid, actor: Uuid) -> Result<Application> {
        let application = self.load(application_id).await?;
        self.access.check_employer_access(&application, actor).await?;
        self.store.toggle_bookmark(application_id, now()).await
    }

    pub(crate) async fn load(&self, application_id: Uuid) -> Result<Application> {
        self.store
            .get_application(application_id)
            .await?
            .ok_or_else(|| Error::not_found("application", application_id))
    }

    async fn transition(
        &self,
        application: &Application,
        actor: Uuid,
        status: ApplicationStatus,
        entry_notes: Option<String>,
        closing_note: String,
    ) -> Result<Application> {
        let ts = now();
        let entry = StageEntry::open(application.id, status, Some(actor), entry_notes, ts);
        let updated = self
            .store
            .apply_transition(StageTransition {
                application_id: application.id,
                expected_version: application.version,
                closed_at: ts,
                closing_note,
                entry,
            })
            .await?;

        info!(
            application_id = %updated.id,
            from = %application.status,
            to = %updated.status,
            actor = %actor,
            "Application status changed"
        );
        Ok(updated)
    }

    fn notify_status(&self, application: &Application) {
        self.notifications.dispatch(PipelineEvent::StatusUpdated {
            candidate_id: application.candidate_id,
            notice: StatusNotice {
                application_id: application.id,
                job_id: application.job_id,
                status: application.status,
            },
        });
    }
}

fn ensure_open(application: &Application, action: &str) -> Result<()> {
    if application.status.is_terminal() {
        return Err(Error::InvalidState(format!(
            "application cannot be {} in current status '{}'",
            action, application.status
        )));
    }
    Ok(())
}
