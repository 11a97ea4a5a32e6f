use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "note_category", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NoteCategory {
    General,
    #[default]
    Internal,
    Screening,
    Interview,
    Feedback,
    Offer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "note_visibility", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NoteVisibility {
    #[default]
    Internal,
    Shared,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "note_sentiment", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NoteSentiment {
    Positive,
    #[default]
    Neutral,
    Negative,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Note {
    pub id: Uuid,
    pub application_id: Uuid,
    pub stage_id: Option<Uuid>,
    pub author_id: Uuid,
    pub category: NoteCategory,
    pub content: String,
    pub visibility: NoteVisibility,
    pub sentiment: NoteSentiment,
    pub is_pinned: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Note {
    /// Internal note raised by the interview workflow on behalf of `author_id`.
    pub fn internal(
        application_id: Uuid,
        stage_id: Option<Uuid>,
        author_id: Uuid,
        category: NoteCategory,
        sentiment: NoteSentiment,
        content: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            application_id,
            stage_id,
            author_id,
            category,
            content,
            visibility: NoteVisibility::Internal,
            sentiment,
            is_pinned: false,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct NoteFilter {
    pub visibility: Option<NoteVisibility>,
    pub stage_id: Option<Uuid>,
}

impl NoteFilter {
    pub fn matches(&self, note: &Note) -> bool {
        self.visibility.map_or(true, |v| note.visibility == v)
            && self.stage_id.map_or(true, |id| note.stage_id == Some(id))
    }
}
