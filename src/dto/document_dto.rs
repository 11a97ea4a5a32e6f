use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::document::DocumentType;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DocumentUpload {
    pub document_type: DocumentType,
    #[validate(length(min = 1, max = 2048))]
    pub file_url: String,
    #[validate(length(max = 255))]
    pub file_type: Option<String>,
    #[validate(range(min = 0))]
    pub file_size: Option<i64>,
    #[validate(length(max = 5000))]
    pub notes: Option<String>,
    pub stage_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateDocumentPayload {
    pub document_type: Option<DocumentType>,
    #[validate(length(min = 1, max = 2048))]
    pub file_url: Option<String>,
    #[validate(length(max = 255))]
    pub file_type: Option<String>,
    #[validate(range(min = 0))]
    pub file_size: Option<i64>,
    #[validate(length(max = 5000))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentListQuery {
    pub document_type: Option<DocumentType>,
}
