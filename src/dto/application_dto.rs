use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::dto::document_dto::DocumentUpload;
use crate::models::application::{ApplicationSource, ApplicationStatus};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SubmitApplicationPayload {
    pub job_id: Uuid,
    #[serde(default)]
    pub source: ApplicationSource,
    #[validate(length(min = 1, max = 2048))]
    pub resume_url: Option<String>,
    #[validate(length(max = 10000))]
    pub cover_letter: Option<String>,
    /// Opaque score supplied by the matching subsystem.
    pub match_score: Option<Decimal>,
    #[serde(default)]
    pub documents: Vec<DocumentUpload>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AdvanceStagePayload {
    pub status: ApplicationStatus,
    #[validate(length(max = 5000))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RejectPayload {
    #[validate(length(min = 1, max = 5000))]
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BulkStatusPayload {
    #[validate(length(min = 1, max = 500))]
    pub application_ids: Vec<Uuid>,
    pub status: ApplicationStatus,
    /// Rejection reason or stage notes, depending on `status`.
    #[validate(length(max = 5000))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BulkUpdateResult {
    pub updated: Vec<Uuid>,
    pub skipped: Vec<Uuid>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplicationListQuery {
    pub status: Option<ApplicationStatus>,
}
