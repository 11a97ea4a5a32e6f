use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::note::{NoteCategory, NoteSentiment, NoteVisibility};

/// Omitted category, visibility and sentiment default to internal/internal/neutral.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateNotePayload {
    pub stage_id: Option<Uuid>,
    pub category: Option<NoteCategory>,
    #[validate(length(min = 1, max = 10000))]
    pub content: String,
    pub visibility: Option<NoteVisibility>,
    pub sentiment: Option<NoteSentiment>,
    pub is_pinned: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateNotePayload {
    pub category: Option<NoteCategory>,
    #[validate(length(min = 1, max = 10000))]
    pub content: Option<String>,
    pub visibility: Option<NoteVisibility>,
    pub sentiment: Option<NoteSentiment>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NoteListQuery {
    pub visibility: Option<NoteVisibility>,
    pub stage_id: Option<Uuid>,
}
