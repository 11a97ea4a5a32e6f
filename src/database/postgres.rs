use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::store::PipelineStore;
use crate::error::{Error, Result};
use crate::models::analytics::{AnalyticsScope, StageDuration, StageReach, StatusCount};
use crate::models::application::{Application, ApplicationFilter};
use crate::models::document::{Document, DocumentType};
use crate::models::interview::Interview;
use crate::models::note::{Note, NoteFilter};
use crate::models::stage::{StageEntry, StageTransition};

const APPLICATION_COLUMNS: &str = "id, job_id, candidate_id, company_id, status, source, resume_url, cover_letter, match_score, employer_viewed, bookmarked, version, applied_at, updated_at";

const STAGE_COLUMNS: &str =
    "id, application_id, stage_name, description, started_at, completed_at, handled_by, notes";

const INTERVIEW_COLUMNS: &str = "id, application_id, stage_id, interviewer_id, scheduled_at, ended_at, medium, meeting_link, location, status, overall_score, technical_score, communication_score, personality_score, remarks, feedback_summary, reminded_at, created_at, updated_at";

const DOCUMENT_COLUMNS: &str = "id, application_id, stage_id, uploaded_by, document_type, file_url, file_type, file_size, is_verified, verified_by, verified_at, notes, created_at, updated_at";

const NOTE_COLUMNS: &str = "id, application_id, stage_id, author_id, category, content, visibility, sentiment, is_pinned, created_at, updated_at";

/// Postgres-backed store. Transitions run in one transaction guarded by the
/// application's `version` column.
#[derive(Clone)]
pub struct PgPipelineStore {
    pool: PgPool,
}

impl PgPipelineStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn scope_filter(scope: AnalyticsScope) -> (&'static str, Uuid) {
    match scope {
        AnalyticsScope::Job(id) => ("a.job_id", id),
        AnalyticsScope::Company(id) => ("a.company_id", id),
    }
}

#[async_trait]
impl PipelineStore for PgPipelineStore {
    async fn insert_application(
        &self,
        application: Application,
        initial_stage: StageEntry,
    ) -> Result<Application> {
        let mut tx = self.pool.begin().await?;

        let stored = sqlx::query_as::<_, Application>(&format!(
            r#"
            INSERT INTO applications (
                id, job_id, candidate_id, company_id, status, source, resume_url,
                cover_letter, match_score, employer_viewed, bookmarked, version, applied_at, updated_at
            ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14)
            RETURNING {APPLICATION_COLUMNS}
            "#
        ))
        .bind(application.id)
        .bind(application.job_id)
        .bind(application.candidate_id)
        .bind(application.company_id)
        .bind(application.status)
        .bind(application.source)
        .bind(&application.resume_url)
        .bind(&application.cover_letter)
        .bind(application.match_score)
        .bind(application.employer_viewed)
        .bind(application.bookmarked)
        .bind(application.version)
        .bind(application.applied_at)
        .bind(application.updated_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|err| match Error::from(err) {
            Error::Duplicate(_) => {
                Error::Duplicate("candidate already applied to this job".to_string())
            }
            other => other,
        })?;

        insert_stage(&mut tx, &initial_stage).await?;
        tx.commit().await?;
        Ok(stored)
    }

    async fn get_application(&self, id: Uuid) -> Result<Option<Application>> {
        let app = sqlx::query_as::<_, Application>(&format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(app)
    }

    async fn find_active_application(
        &self,
        job_id: Uuid,
        candidate_id: Uuid,
    ) -> Result<Option<Application>> {
        let app = sqlx::query_as::<_, Application>(&format!(
            r#"
            SELECT {APPLICATION_COLUMNS} FROM applications
            WHERE job_id = $1 AND candidate_id = $2 AND status <> 'withdrawn'
            "#
        ))
        .bind(job_id)
        .bind(candidate_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(app)
    }

    async fn list_applications(&self, filter: &ApplicationFilter) -> Result<Vec<Application>> {
        let apps = sqlx::query_as::<_, Application>(&format!(
            r#"
            SELECT {APPLICATION_COLUMNS} FROM applications
            WHERE ($1::uuid IS NULL OR job_id = $1)
              AND ($2::uuid IS NULL OR company_id = $2)
              AND ($3::uuid IS NULL OR candidate_id = $3)
              AND ($4::application_status IS NULL OR status = $4)
            ORDER BY applied_at DESC
            "#
        ))
        .bind(filter.job_id)
        .bind(filter.company_id)
        .bind(filter.candidate_id)
        .bind(filter.status)
        .fetch_all(&self.pool)
        .await?;
        Ok(apps)
    }

    async fn apply_transition(&self, transition: StageTransition) -> Result<Application> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query_as::<_, Application>(&format!(
            r#"
            UPDATE applications
            SET status = $1, version = version + 1, updated_at = $2
            WHERE id = $3 AND version = $4
            RETURNING {APPLICATION_COLUMNS}
            "#
        ))
        .bind(transition.entry.stage_name)
        .bind(transition.entry.started_at)
        .bind(transition.application_id)
        .bind(transition.expected_version)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(updated) = updated else {
            let exists: Option<(Uuid,)> =
                sqlx::query_as("SELECT id FROM applications WHERE id = $1")
                    .bind(transition.application_id)
                    .fetch_optional(&mut *tx)
                    .await?;
            return Err(match exists {
                Some(_) => Error::ConcurrentUpdate(format!(
                    "application {} was modified concurrently",
                    transition.application_id
                )),
                None => Error::not_found("Application", transition.application_id),
            });
        };

        sqlx::query(
            r#"
            UPDATE application_stages
            SET completed_at = $1,
                notes = CASE WHEN notes IS NULL OR notes = '' THEN $2 ELSE notes || E'\n' || $2 END
            WHERE application_id = $3 AND completed_at IS NULL
            "#,
        )
        .bind(transition.closed_at)
        .bind(&transition.closing_note)
        .bind(transition.application_id)
        .execute(&mut *tx)
        .await?;

        insert_stage(&mut tx, &transition.entry).await?;
        tx.commit().await?;
        Ok(updated)
    }

    async fn mark_viewed(&self, id: Uuid, now: DateTime<Utc>) -> Result<Application> {
        let app = sqlx::query_as::<_, Application>(&format!(
            r#"
            UPDATE applications
            SET employer_viewed = TRUE, updated_at = $2
            WHERE id = $1
            RETURNING {APPLICATION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;
        app.ok_or_else(|| Error::not_found("Application", id))
    }

    async fn toggle_bookmark(&self, id: Uuid, now: DateTime<Utc>) -> Result<Application> {
        let app = sqlx::query_as::<_, Application>(&format!(
            r#"
            UPDATE applications
            SET bookmarked = NOT bookmarked, updated_at = $2
            WHERE id = $1
            RETURNING {APPLICATION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;
        app.ok_or_else(|| Error::not_found("Application", id))
    }

    async fn list_stages(&self, application_id: Uuid) -> Result<Vec<StageEntry>> {
        let stages = sqlx::query_as::<_, StageEntry>(&format!(
            "SELECT {STAGE_COLUMNS} FROM application_stages WHERE application_id = $1 ORDER BY seq ASC"
        ))
        .bind(application_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(stages)
    }

    async fn get_stage(&self, id: Uuid) -> Result<Option<StageEntry>> {
        let stage = sqlx::query_as::<_, StageEntry>(&format!(
            "SELECT {STAGE_COLUMNS} FROM application_stages WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(stage)
    }

    async fn insert_interview(&self, interview: Interview) -> Result<Interview> {
        let stored = sqlx::query_as::<_, Interview>(&format!(
            r#"
            INSERT INTO interviews (
                id, application_id, stage_id, interviewer_id, scheduled_at, ended_at, medium,
                meeting_link, location, status, overall_score, technical_score,
                communication_score, personality_score, remarks, feedback_summary,
                reminded_at, created_at, updated_at
            ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,$15,$16,$17,$18,$19)
            RETURNING {INTERVIEW_COLUMNS}
            "#
        ))
        .bind(interview.id)
        .bind(interview.application_id)
        .bind(interview.stage_id)
        .bind(interview.interviewer_id)
        .bind(interview.scheduled_at)
        .bind(interview.ended_at)
        .bind(interview.medium)
        .bind(&interview.meeting_link)
        .bind(&interview.location)
        .bind(interview.status)
        .bind(interview.overall_score)
        .bind(interview.technical_score)
        .bind(interview.communication_score)
        .bind(interview.personality_score)
        .bind(&interview.remarks)
        .bind(&interview.feedback_summary)
        .bind(interview.reminded_at)
        .bind(interview.created_at)
        .bind(interview.updated_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(stored)
    }

    async fn get_interview(&self, id: Uuid) -> Result<Option<Interview>> {
        let interview = sqlx::query_as::<_, Interview>(&format!(
            "SELECT {INTERVIEW_COLUMNS} FROM interviews WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(interview)
    }

    async fn update_interview(&self, interview: Interview) -> Result<Interview> {
        let stored = sqlx::query_as::<_, Interview>(&format!(
            r#"
            UPDATE interviews SET
                scheduled_at = $2, ended_at = $3, meeting_link = $4, location = $5, status = $6,
                overall_score = $7, technical_score = $8, communication_score = $9,
                personality_score = $10, remarks = $11, feedback_summary = $12,
                reminded_at = $13, updated_at = $14
            WHERE id = $1
            RETURNING {INTERVIEW_COLUMNS}
            "#
        ))
        .bind(interview.id)
        .bind(interview.scheduled_at)
        .bind(interview.ended_at)
        .bind(&interview.meeting_link)
        .bind(&interview.location)
        .bind(interview.status)
        .bind(interview.overall_score)
        .bind(interview.technical_score)
        .bind(interview.communication_score)
        .bind(interview.personality_score)
        .bind(&interview.remarks)
        .bind(&interview.feedback_summary)
        .bind(interview.reminded_at)
        .bind(interview.updated_at)
        .fetch_optional(&self.pool)
        .await?;
        stored.ok_or_else(|| Error::not_found("Interview", interview.id))
    }

    async fn list_interviews(&self, application_id: Uuid) -> Result<Vec<Interview>> {
        let interviews = sqlx::query_as::<_, Interview>(&format!(
            "SELECT {INTERVIEW_COLUMNS} FROM interviews WHERE application_id = $1 ORDER BY seq ASC"
        ))
        .bind(application_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(interviews)
    }

    async fn list_due_reminders(
        &self,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<Interview>> {
        let interviews = sqlx::query_as::<_, Interview>(&format!(
            r#"
            SELECT {INTERVIEW_COLUMNS} FROM interviews
            WHERE status IN ('scheduled', 'rescheduled')
              AND reminded_at IS NULL
              AND scheduled_at BETWEEN $1 AND $2
            ORDER BY scheduled_at ASC
            "#
        ))
        .bind(from)
        .bind(until)
        .fetch_all(&self.pool)
        .await?;
        Ok(interviews)
    }

    async fn insert_document(&self, document: Document) -> Result<Document> {
        let stored = sqlx::query_as::<_, Document>(&format!(
            r#"
            INSERT INTO application_documents (
                id, application_id, stage_id, uploaded_by, document_type, file_url, file_type,
                file_size, is_verified, verified_by, verified_at, notes, created_at, updated_at
            ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14)
            RETURNING {DOCUMENT_COLUMNS}
            "#
        ))
        .bind(document.id)
        .bind(document.application_id)
        .bind(document.stage_id)
        .bind(document.uploaded_by)
        .bind(document.document_type)
        .bind(&document.file_url)
        .bind(&document.file_type)
        .bind(document.file_size)
        .bind(document.is_verified)
        .bind(document.verified_by)
        .bind(document.verified_at)
        .bind(&document.notes)
        .bind(document.created_at)
        .bind(document.updated_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(stored)
    }

    async fn get_document(&self, id: Uuid) -> Result<Option<Document>> {
        let document = sqlx::query_as::<_, Document>(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM application_documents WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(document)
    }

    async fn update_document(&self, document: Document) -> Result<Document> {
        let stored = sqlx::query_as::<_, Document>(&format!(
            r#"
            UPDATE application_documents SET
                document_type = $2, file_url = $3, file_type = $4, file_size = $5,
                is_verified = $6, verified_by = $7, verified_at = $8, notes = $9, updated_at = $10
            WHERE id = $1
            RETURNING {DOCUMENT_COLUMNS}
            "#
        ))
        .bind(document.id)
        .bind(document.document_type)
        .bind(&document.file_url)
        .bind(&document.file_type)
        .bind(document.file_size)
        .bind(document.is_verified)
        .bind(document.verified_by)
        .bind(document.verified_at)
        .bind(&document.notes)
        .bind(document.updated_at)
        .fetch_optional(&self.pool)
        .await?;
        stored.ok_or_else(|| Error::not_found("Document", document.id))
    }

    async fn delete_document(&self, id: Uuid) -> Result<()> {
        let res = sqlx::query("DELETE FROM application_documents WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if res.rows_affected() == 0 {
            return Err(Error::not_found("Document", id));
        }
        Ok(())
    }

    async fn list_documents(
        &self,
        application_id: Uuid,
        document_type: Option<DocumentType>,
    ) -> Result<Vec<Document>> {
        let documents = sqlx::query_as::<_, Document>(&format!(
            r#"
            SELECT {DOCUMENT_COLUMNS} FROM application_documents
            WHERE application_id = $1 AND ($2::document_type IS NULL OR document_type = $2)
            ORDER BY seq ASC
            "#
        ))
        .bind(application_id)
        .bind(document_type)
        .fetch_all(&self.pool)
        .await?;
        Ok(documents)
    }

    async fn list_unverified_documents(&self, company_id: Uuid) -> Result<Vec<Document>> {
        let columns = DOCUMENT_COLUMNS
            .split(", ")
            .map(|c| format!("d.{c}"))
            .collect::<Vec<_>>()
            .join(", ");
        let documents = sqlx::query_as::<_, Document>(&format!(
            r#"
            SELECT {columns} FROM application_documents d
            JOIN applications a ON a.id = d.application_id
            WHERE a.company_id = $1 AND d.is_verified = FALSE
            ORDER BY d.created_at ASC
            "#
        ))
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(documents)
    }

    async fn insert_note(&self, note: Note) -> Result<Note> {
        let stored = sqlx::query_as::<_, Note>(&format!(
            r#"
            INSERT INTO application_notes (
                id, application_id, stage_id, author_id, category, content, visibility,
                sentiment, is_pinned, created_at, updated_at
            ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11)
            RETURNING {NOTE_COLUMNS}
            "#
        ))
        .bind(note.id)
        .bind(note.application_id)
        .bind(note.stage_id)
        .bind(note.author_id)
        .bind(note.category)
        .bind(&note.content)
        .bind(note.visibility)
        .bind(note.sentiment)
        .bind(note.is_pinned)
        .bind(note.created_at)
        .bind(note.updated_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(stored)
    }

    async fn get_note(&self, id: Uuid) -> Result<Option<Note>> {
        let note = sqlx::query_as::<_, Note>(&format!(
            "SELECT {NOTE_COLUMNS} FROM application_notes WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(note)
    }

    async fn update_note(&self, note: Note) -> Result<Note> {
        let stored = sqlx::query_as::<_, Note>(&format!(
            r#"
            UPDATE application_notes SET
                category = $2, content = $3, visibility = $4, sentiment = $5,
                is_pinned = $6, updated_at = $7
            WHERE id = $1
            RETURNING {NOTE_COLUMNS}
            "#
        ))
        .bind(note.id)
        .bind(note.category)
        .bind(&note.content)
        .bind(note.visibility)
        .bind(note.sentiment)
        .bind(note.is_pinned)
        .bind(note.updated_at)
        .fetch_optional(&self.pool)
        .await?;
        stored.ok_or_else(|| Error::not_found("Note", note.id))
    }

    async fn delete_note(&self, id: Uuid) -> Result<()> {
        let res = sqlx::query("DELETE FROM application_notes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if res.rows_affected() == 0 {
            return Err(Error::not_found("Note", id));
        }
        Ok(())
    }

    async fn list_notes(&self, application_id: Uuid, filter: &NoteFilter) -> Result<Vec<Note>> {
        let notes = sqlx::query_as::<_, Note>(&format!(
            r#"
            SELECT {NOTE_COLUMNS} FROM application_notes
            WHERE application_id = $1
              AND ($2::note_visibility IS NULL OR visibility = $2)
              AND ($3::uuid IS NULL OR stage_id = $3)
            ORDER BY is_pinned DESC, created_at DESC
            "#
        ))
        .bind(application_id)
        .bind(filter.visibility)
        .bind(filter.stage_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(notes)
    }

    async fn status_counts(&self, scope: AnalyticsScope) -> Result<Vec<StatusCount>> {
        let (column, id) = scope_filter(scope);
        let rows = sqlx::query_as::<_, StatusCount>(&format!(
            r#"
            SELECT a.status AS status, COUNT(*) AS count
            FROM applications a
            WHERE {column} = $1
            GROUP BY a.status
            ORDER BY a.status
            "#
        ))
        .bind(id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn stage_reach(&self, scope: AnalyticsScope) -> Result<Vec<StageReach>> {
        let (column, id) = scope_filter(scope);
        let rows = sqlx::query_as::<_, StageReach>(&format!(
            r#"
            SELECT s.stage_name AS stage, COUNT(DISTINCT s.application_id) AS applications
            FROM application_stages s
            JOIN applications a ON a.id = s.application_id
            WHERE {column} = $1
            GROUP BY s.stage_name
            ORDER BY s.stage_name
            "#
        ))
        .bind(id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn stage_durations(&self, scope: AnalyticsScope) -> Result<Vec<StageDuration>> {
        let (column, id) = scope_filter(scope);
        let rows = sqlx::query_as::<_, StageDuration>(&format!(
            r#"
            SELECT s.stage_name AS stage,
                   AVG(EXTRACT(EPOCH FROM (s.completed_at - s.started_at)))::FLOAT8 AS average_seconds,
                   COUNT(*) AS samples
            FROM application_stages s
            JOIN applications a ON a.id = s.application_id
            WHERE {column} = $1 AND s.completed_at IS NOT NULL
            GROUP BY s.stage_name
            ORDER BY s.stage_name
            "#
        ))
        .bind(id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

async fn insert_stage(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    stage: &StageEntry,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO application_stages (
            id, application_id, stage_name, description, started_at, completed_at, handled_by, notes
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8)
        "#,
    )
    .bind(stage.id)
    .bind(stage.application_id)
    .bind(stage.stage_name)
    .bind(&stage.description)
    .bind(stage.started_at)
    .bind(stage.completed_at)
    .bind(stage.handled_by)
    .bind(&stage.notes)
    .execute(&mut **tx)
    .await?;
    Ok(())
}
