use std::sync::Arc;
use uuid::Uuid;

use crate::database::PipelineStore;
use crate::dto::note_dto::{CreateNotePayload, NoteListQuery, UpdateNotePayload};
use crate::error::{Error, Result};
use crate::models::application::Application;
use crate::models::note::{Note, NoteFilter, NoteVisibility};
use crate::services::access_service::{AccessService, Viewer};
use crate::utils::time::now;
use crate::utils::validation::validate;

#[derive(Clone)]
pub struct NoteService {
    store: Arc<dyn PipelineStore>,
    access: AccessService,
}

impl NoteService {
    pub fn new(store: Arc<dyn PipelineStore>, access: AccessService) -> Self {
        Self { store, access }
    }

    pub async fn create(
        &self,
        application_id: Uuid,
        author: Uuid,
        payload: CreateNotePayload,
    ) -> Result<Note> {
        validate(&payload)?;
        let application = self.load_application(application_id).await?;
        self.access.check_employer_access(&application, author).await?;

        if let Some(stage_id) = payload.stage_id {
            match self.store.get_stage(stage_id).await? {
                Some(stage) if stage.application_id == application_id => {}
                Some(_) => {
                    return Err(Error::BadRequest(format!(
                        "stage {} does not belong to application {}",
                        stage_id, application_id
                    )))
                }
                None => return Err(Error::not_found("stage", stage_id)),
            }
        }

        let ts = now();
        let note = Note {
            id: Uuid::new_v4(),
            application_id,
            stage_id: payload.stage_id,
            author_id: author,
            category: payload.category.unwrap_or_default(),
            content: payload.content,
            visibility: payload.visibility.unwrap_or_default(),
            sentiment: payload.sentiment.unwrap_or_default(),
            is_pinned: payload.is_pinned.unwrap_or(false),
            created_at: ts,
            updated_at: ts,
        };
        let note = self.store.insert_note(note).await?;
        tracing::info!(note_id = %note.id, application_id = %application_id, "Note created");
        Ok(note)
    }

    /// Editing is limited to the author, who must still hold employer access.
    pub async fn update(
        &self,
        note_id: Uuid,
        caller: Uuid,
        payload: UpdateNotePayload,
    ) -> Result<Note> {
        validate(&payload)?;
        let mut note = self.load(note_id).await?;
        let application = self.load_application(note.application_id).await?;
        self.access.check_employer_access(&application, caller).await?;
        ensure_author(&note, caller, "edit")?;

        if let Some(category) = payload.category {
            note.category = category;
        }
        if let Some(content) = payload.content {
            note.content = content;
        }
        if let Some(visibility) = payload.visibility {
            note.visibility = visibility;
        }
        if let Some(sentiment) = payload.sentiment {
            note.sentiment = sentiment;
        }
        note.updated_at = now();

        self.store.update_note(note).await
    }

    pub async fn delete(&self, note_id: Uuid, caller: Uuid) -> Result<()> {
        let note = self.load(note_id).await?;
        ensure_author(&note, caller, "delete")?;
        self.store.delete_note(note_id).await?;
        tracing::info!(note_id = %note_id, "Note deleted");
        Ok(())
    }

    /// Any reviewer with employer access may pin or unpin.
    pub async fn set_pinned(&self, note_id: Uuid, caller: Uuid, pinned: bool) -> Result<Note> {
        let mut note = self.load(note_id).await?;
        let application = self.load_application(note.application_id).await?;
        self.access.check_employer_access(&application, caller).await?;

        if note.is_pinned == pinned {
            return Ok(note);
        }
        note.is_pinned = pinned;
        note.updated_at = now();
        self.store.update_note(note).await
    }

    pub async fn toggle_pin(&self, note_id: Uuid, caller: Uuid) -> Result<Note> {
        let note = self.load(note_id).await?;
        self.set_pinned(note_id, caller, !note.is_pinned).await
    }

    /// Employers see every note; the owning candidate only sees shared ones.
    pub async fn list(
        &self,
        application_id: Uuid,
        caller: Uuid,
        query: NoteListQuery,
    ) -> Result<Vec<Note>> {
        let application = self.load_application(application_id).await?;
        let visibility = match self.access.check_read_access(&application, caller).await? {
            Viewer::Employer(_) => query.visibility,
            Viewer::Candidate => match query.visibility {
                None | Some(NoteVisibility::Shared) => Some(NoteVisibility::Shared),
                Some(NoteVisibility::Internal) => return Ok(Vec::new()),
            },
        };

        self.store
            .list_notes(
                application_id,
                &NoteFilter {
                    visibility,
                    stage_id: query.stage_id,
                },
            )
            .await
    }

    async fn load(&self, note_id: Uuid) -> Result<Note> {
        self.store
            .get_note(note_id)
            .await?
            .ok_or_else(|| Error::not_found("note", note_id))
    }

    async fn load_application(&self, application_id: Uuid) -> Result<Application> {
        self.store
            .get_application(application_id)
            .await?
            .ok_or_else(|| Error::not_found("application", application_id))
    }
}

fn ensure_author(note: &Note, caller: Uuid, action: &str) -> Result<()> {
    if note.author_id != caller {
        return Err(Error::Forbidden(format!(
            "only the author can {} this note",
            action
        )));
    }
    Ok(())
}
