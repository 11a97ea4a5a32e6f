use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::models::analytics::{AnalyticsScope, StageDuration, StageReach, StatusCount};
use crate::models::application::{Application, ApplicationFilter};
use crate::models::document::{Document, DocumentType};
use crate::models::interview::Interview;
use crate::models::note::{Note, NoteFilter};
use crate::models::stage::{StageEntry, StageTransition};

/// Persistence seam for the pipeline engine.
///
/// Implementations must apply [`PipelineStore::apply_transition`] atomically and
/// reject it when the application's `version` no longer matches, so that two
/// callers racing on the same application cannot both append a ledger entry.
#[async_trait]
pub trait PipelineStore: Send + Sync {
    /// Persists a new application together with its initial ledger entry.
    /// Fails with `Error::Duplicate` if the candidate already holds a
    /// non-withdrawn application for the job.
    async fn insert_application(
        &self,
        application: Application,
        initial_stage: StageEntry,
    ) -> Result<Application>;

    async fn get_application(&self, id: Uuid) -> Result<Option<Application>>;

    async fn find_active_application(
        &self,
        job_id: Uuid,
        candidate_id: Uuid,
    ) -> Result<Option<Application>>;

    async fn list_applications(&self, filter: &ApplicationFilter) -> Result<Vec<Application>>;

    async fn apply_transition(&self, transition: StageTransition) -> Result<Application>;

    async fn mark_viewed(&self, id: Uuid, now: DateTime<Utc>) -> Result<Application>;

    /// Flips `bookmarked` in place so concurrent toggles never read a stale value.
    async fn toggle_bookmark(&self, id: Uuid, now: DateTime<Utc>) -> Result<Application>;

    async fn list_stages(&self, application_id: Uuid) -> Result<Vec<StageEntry>>;

    async fn get_stage(&self, id: Uuid) -> Result<Option<StageEntry>>;

    async fn insert_interview(&self, interview: Interview) -> Result<Interview>;

    async fn get_interview(&self, id: Uuid) -> Result<Option<Interview>>;

    async fn update_interview(&self, interview: Interview) -> Result<Interview>;

    async fn list_interviews(&self, application_id: Uuid) -> Result<Vec<Interview>>;

    /// Pending interviews starting in `[from, until]` with no reminder sent
    /// since they were last (re)scheduled.
    async fn list_due_reminders(
        &self,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<Interview>>;

    async fn insert_document(&self, document: Document) -> Result<Document>;

    async fn get_document(&self, id: Uuid) -> Result<Option<Document>>;

    async fn update_document(&self, document: Document) -> Result<Document>;

    async fn delete_document(&self, id: Uuid) -> Result<()>;

    async fn list_documents(
        &self,
        application_id: Uuid,
        document_type: Option<DocumentType>,
    ) -> Result<Vec<Document>>;

    async fn list_unverified_documents(&self, company_id: Uuid) -> Result<Vec<Document>>;

    async fn insert_note(&self, note: Note) -> Result<Note>;

    async fn get_note(&self, id: Uuid) -> Result<Option<Note>>;

    async fn update_note(&self, note: Note) -> Result<Note>;

    async fn delete_note(&self, id: Uuid) -> Result<()>;

    async fn list_notes(&self, application_id: Uuid, filter: &NoteFilter) -> Result<Vec<Note>>;

    async fn status_counts(&self, scope: AnalyticsScope) -> Result<Vec<StatusCount>>;

    async fn stage_reach(&self, scope: AnalyticsScope) -> Result<Vec<StageReach>>;

    async fn stage_durations(&self, scope: AnalyticsScope) -> Result<Vec<StageDuration>>;
}
