use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::database::store::PipelineStore;
use crate::error::{Error, Result};
use crate::models::analytics::{AnalyticsScope, StageDuration, StageReach, StatusCount};
use crate::models::application::{Application, ApplicationFilter, ApplicationStatus};
use crate::models::document::{Document, DocumentType};
use crate::models::interview::Interview;
use crate::models::note::{Note, NoteFilter};
use crate::models::stage::{StageEntry, StageTransition};

#[derive(Default)]
struct MemoryState {
    applications: HashMap<Uuid, Application>,
    stages: Vec<StageEntry>,
    interviews: Vec<Interview>,
    documents: Vec<Document>,
    notes: Vec<Note>,
}

impl MemoryState {
    fn in_scope(&self, scope: AnalyticsScope) -> BTreeSet<Uuid> {
        self.applications
            .values()
            .filter(|app| match scope {
                AnalyticsScope::Job(id) => app.job_id == id,
                AnalyticsScope::Company(id) => app.company_id == id,
            })
            .map(|app| app.id)
            .collect()
    }
}

/// In-process store with the same invariants as the Postgres store. All state
/// sits behind one mutex, so every trait call is serialized.
#[derive(Default)]
pub struct MemoryPipelineStore {
    state: Mutex<MemoryState>,
}

impl MemoryPipelineStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| Error::Internal("memory store lock poisoned".to_string()))
    }
}

fn append_note(existing: Option<String>, note: &str) -> Option<String> {
    match existing {
        Some(current) if !current.is_empty() => Some(format!("{}\n{}", current, note)),
        _ => Some(note.to_string()),
    }
}

#[async_trait]
impl PipelineStore for MemoryPipelineStore {
    async fn insert_application(
        &self,
        application: Application,
        initial_stage: StageEntry,
    ) -> Result<Application> {
        let mut state = self.lock()?;
        let duplicate = state.applications.values().any(|existing| {
            existing.job_id == application.job_id
                && existing.candidate_id == application.candidate_id
                && existing.status != ApplicationStatus::Withdrawn
        });
        if duplicate {
            return Err(Error::Duplicate(
                "candidate already applied to this job".to_string(),
            ));
        }
        state.stages.push(initial_stage);
        state
            .applications
            .insert(application.id, application.clone());
        Ok(application)
    }

    async fn get_application(&self, id: Uuid) -> Result<Option<Application>> {
        Ok(self.lock()?.applications.get(&id).cloned())
    }

    async fn find_active_application(
        &self,
        job_id: Uuid,
        candidate_id: Uuid,
    ) -> Result<Option<Application>> {
        Ok(self
            .lock()?
            .applications
            .values()
            .find(|app| {
                app.job_id == job_id
                    && app.candidate_id == candidate_id
                    && app.status != ApplicationStatus::Withdrawn
            })
            .cloned())
    }

    async fn list_applications(&self, filter: &ApplicationFilter) -> Result<Vec<Application>> {
        let mut apps: Vec<Application> = self
            .lock()?
            .applications
            .values()
            .filter(|app| filter.matches(app))
            .cloned()
            .collect();
        apps.sort_by(|a, b| b.applied_at.cmp(&a.applied_at));
        Ok(apps)
    }

    async fn apply_transition(&self, transition: StageTransition) -> Result<Application> {
        let mut guard = self.lock()?;
        let state = &mut *guard;

        let app = state
            .applications
            .get_mut(&transition.application_id)
            .ok_or_else(|| Error::not_found("Application", transition.application_id))?;
        if app.version != transition.expected_version {
            return Err(Error::ConcurrentUpdate(format!(
                "application {} was modified concurrently",
                transition.application_id
            )));
        }

        for stage in state
            .stages
            .iter_mut()
            .filter(|s| s.application_id == transition.application_id && s.is_open())
        {
            stage.completed_at = Some(transition.closed_at);
            stage.notes = append_note(stage.notes.take(), &transition.closing_note);
        }

        app.status = transition.entry.stage_name;
        app.version += 1;
        app.updated_at = transition.entry.started_at;
        let updated = app.clone();
        state.stages.push(transition.entry);
        Ok(updated)
    }

    async fn mark_viewed(&self, id: Uuid, now: DateTime<Utc>) -> Result<Application> {
        let mut state = self.lock()?;
        let app = state
            .applications
            .get_mut(&id)
            .ok_or_else(|| Error::not_found("Application", id))?;
        app.employer_viewed = true;
        app.updated_at = now;
        Ok(app.clone())
    }

    async fn toggle_bookmark(&self, id: Uuid, now: DateTime<Utc>) -> Result<Application> {
        let mut state = self.lock()?;
        let app = state
            .applications
            .get_mut(&id)
            .ok_or_else(|| Error::not_found("Application", id))?;
        app.bookmarked = !app.bookmarked;
        app.updated_at = now;
        Ok(app.clone())
    }

    async fn list_stages(&self, application_id: Uuid) -> Result<Vec<StageEntry>> {
        Ok(self
            .lock()?
            .stages
            .iter()
            .filter(|s| s.application_id == application_id)
            .cloned()
            .collect())
    }

    async fn get_stage(&self, id: Uuid) -> Result<Option<StageEntry>> {
        Ok(self.lock()?.stages.iter().find(|s| s.id == id).cloned())
    }

    async fn insert_interview(&self, interview: Interview) -> Result<Interview> {
        self.lock()?.interviews.push(interview.clone());
        Ok(interview)
    }

    async fn get_interview(&self, id: Uuid) -> Result<Option<Interview>> {
        Ok(self.lock()?.interviews.iter().find(|i| i.id == id).cloned())
    }

    async fn update_interview(&self, interview: Interview) -> Result<Interview> {
        let mut state = self.lock()?;
        let slot = state
            .interviews
            .iter_mut()
            .find(|i| i.id == interview.id)
            .ok_or_else(|| Error::not_found("Interview", interview.id))?;
        *slot = interview.clone();
        Ok(interview)
    }

    async fn list_interviews(&self, application_id: Uuid) -> Result<Vec<Interview>> {
        Ok(self
            .lock()?
            .interviews
            .iter()
            .filter(|i| i.application_id == application_id)
            .cloned()
            .collect())
    }

    async fn list_due_reminders(
        &self,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<Interview>> {
        Ok(self
            .lock()?
            .interviews
            .iter()
            .filter(|i| {
                i.status.is_pending()
                    && i.reminded_at.is_none()
                    && i.scheduled_at >= from
                    && i.scheduled_at <= until
            })
            .cloned()
            .collect())
    }

    async fn insert_document(&self, document: Document) -> Result<Document> {
        self.lock()?.documents.push(document.clone());
        Ok(document)
    }

    async fn get_document(&self, id: Uuid) -> Result<Option<Document>> {
        Ok(self.lock()?.documents.iter().find(|d| d.id == id).cloned())
    }

    async fn update_document(&self, document: Document) -> Result<Document> {
        let mut state = self.lock()?;
        let slot = state
            .documents
            .iter_mut()
            .find(|d| d.id == document.id)
            .ok_or_else(|| Error::not_found("Document", document.id))?;
        *slot = document.clone();
        Ok(document)
    }

    async fn delete_document(&self, id: Uuid) -> Result<()> {
        let mut state = self.lock()?;
        let before = state.documents.len();
        state.documents.retain(|d| d.id != id);
        if state.documents.len() == before {
            return Err(Error::not_found("Document", id));
        }
        Ok(())
    }

    async fn list_documents(
        &self,
        application_id: Uuid,
        document_type: Option<DocumentType>,
    ) -> Result<Vec<Document>> {
        Ok(self
            .lock()?
            .documents
            .iter()
            .filter(|d| d.application_id == application_id)
            .filter(|d| document_type.map_or(true, |t| d.document_type == t))
            .cloned()
            .collect())
    }

    async fn list_unverified_documents(&self, company_id: Uuid) -> Result<Vec<Document>> {
        let state = self.lock()?;
        Ok(state
            .documents
            .iter()
            .filter(|d| !d.is_verified)
            .filter(|d| {
                state
                    .applications
                    .get(&d.application_id)
                    .is_some_and(|app| app.company_id == company_id)
            })
            .cloned()
            .collect())
    }

    async fn insert_note(&self, note: Note) -> Result<Note> {
        self.lock()?.notes.push(note.clone());
        Ok(note)
    }

    async fn get_note(&self, id: Uuid) -> Result<Option<Note>> {
        Ok(self.lock()?.notes.iter().find(|n| n.id == id).cloned())
    }

    async fn update_note(&self, note: Note) -> Result<Note> {
        let mut state = self.lock()?;
        let slot = state
            .notes
            .iter_mut()
            .find(|n| n.id == note.id)
            .ok_or_else(|| Error::not_found("Note", note.id))?;
        *slot = note.clone();
        Ok(note)
    }

    async fn delete_note(&self, id: Uuid) -> Result<()> {
        let mut state = self.lock()?;
        let before = state.notes.len();
        state.notes.retain(|n| n.id != id);
        if state.notes.len() == before {
            return Err(Error::not_found("Note", id));
        }
        Ok(())
    }

    async fn list_notes(&self, application_id: Uuid, filter: &NoteFilter) -> Result<Vec<Note>> {
        let mut notes: Vec<Note> = self
            .lock()?
            .notes
            .iter()
            .filter(|n| n.application_id == application_id && filter.matches(n))
            .cloned()
            .collect();
        // pinned first, then newest
        notes.sort_by(|a, b| {
            b.is_pinned
                .cmp(&a.is_pinned)
                .then(b.created_at.cmp(&a.created_at))
        });
        Ok(notes)
    }

    async fn status_counts(&self, scope: AnalyticsScope) -> Result<Vec<StatusCount>> {
        let state = self.lock()?;
        let ids = state.in_scope(scope);
        let mut counts: BTreeMap<ApplicationStatus, i64> = BTreeMap::new();
        for id in &ids {
            if let Some(app) = state.applications.get(id) {
                *counts.entry(app.status).or_default() += 1;
            }
        }
        Ok(counts
            .into_iter()
            .map(|(status, count)| StatusCount { status, count })
            .collect())
    }

    async fn stage_reach(&self, scope: AnalyticsScope) -> Result<Vec<StageReach>> {
        let state = self.lock()?;
        let ids = state.in_scope(scope);
        let reached: BTreeSet<(ApplicationStatus, Uuid)> = state
            .stages
            .iter()
            .filter(|s| ids.contains(&s.application_id))
            .map(|s| (s.stage_name, s.application_id))
            .collect();
        let mut counts: BTreeMap<ApplicationStatus, i64> = BTreeMap::new();
        for (stage, _) in reached {
            *counts.entry(stage).or_default() += 1;
        }
        Ok(counts
            .into_iter()
            .map(|(stage, applications)| StageReach {
                stage,
                applications,
            })
            .collect())
    }

    async fn stage_durations(&self, scope: AnalyticsScope) -> Result<Vec<StageDuration>> {
        let state = self.lock()?;
        let ids = state.in_scope(scope);
        let mut totals: BTreeMap<ApplicationStatus, (i64, i64)> = BTreeMap::new();
        for stage in state.stages.iter().filter(|s| ids.contains(&s.application_id)) {
            if let Some(done) = stage.completed_at {
                let entry = totals.entry(stage.stage_name).or_default();
                entry.0 += (done - stage.started_at).num_seconds();
                entry.1 += 1;
            }
        }
        Ok(totals
            .into_iter()
            .map(|(stage, (seconds, samples))| StageDuration {
                stage,
                average_seconds: seconds as f64 / samples as f64,
                samples,
            })
            .collect())
    }
}
