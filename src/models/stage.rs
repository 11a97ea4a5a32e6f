use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::application::ApplicationStatus;

/// One row of the append-only stage ledger.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StageEntry {
    pub id: Uuid,
    pub application_id: Uuid,
    pub stage_name: ApplicationStatus,
    pub description: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub handled_by: Option<Uuid>,
    pub notes: Option<String>,
}

impl StageEntry {
    pub fn open(
        application_id: Uuid,
        stage_name: ApplicationStatus,
        handled_by: Option<Uuid>,
        notes: Option<String>,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            application_id,
            stage_name,
            description: stage_name.stage_description().to_string(),
            started_at,
            completed_at: None,
            handled_by,
            notes,
        }
    }

    pub fn is_open(&self) -> bool {
        self.completed_at.is_none()
    }
}

/// Atomic status change: close whatever entry is open, move the application to
/// `entry.stage_name`, and open `entry`. Rejected if the application version
/// moved since `expected_version` was read.
#[derive(Debug, Clone)]
pub struct StageTransition {
    pub application_id: Uuid,
    pub expected_version: i32,
    pub closed_at: DateTime<Utc>,
    pub closing_note: String,
    pub entry: StageEntry,
}
