use std::sync::Arc;
use uuid::Uuid;

use crate::database::PipelineStore;
use crate::dto::document_dto::{DocumentListQuery, DocumentUpload, UpdateDocumentPayload};
use crate::error::{Error, Result};
use crate::models::application::Application;
use crate::models::document::Document;
use crate::services::access_service::AccessService;
use crate::utils::time::now;
use crate::utils::validation::validate;

#[derive(Clone)]
pub struct DocumentService {
    store: Arc<dyn PipelineStore>,
    access: AccessService,
}

impl DocumentService {
    pub fn new(store: Arc<dyn PipelineStore>, access: AccessService) -> Self {
        Self { store, access }
    }

    pub async fn add(
        &self,
        application_id: Uuid,
        caller: Uuid,
        upload: DocumentUpload,
    ) -> Result<Document> {
        validate(&upload)?;
        let application = self.load_application(application_id).await?;
        self.access.check_ownership(&application, caller)?;
        self.attach(&application, caller, upload).await
    }

    /// Stores a document for an application the caller is already known to own.
    pub(crate) async fn attach(
        &self,
        application: &Application,
        uploaded_by: Uuid,
        upload: DocumentUpload,
    ) -> Result<Document> {
        validate(&upload)?;
        if let Some(stage_id) = upload.stage_id {
            self.ensure_stage_belongs(application.id, stage_id).await?;
        }

        let ts = now();
        let document = Document {
            id: Uuid::new_v4(),
            application_id: application.id,
            stage_id: upload.stage_id,
            uploaded_by,
            document_type: upload.document_type,
            file_url: upload.file_url,
            file_type: upload.file_type,
            file_size: upload.file_size,
            is_verified: false,
            verified_by: None,
            verified_at: None,
            notes: upload.notes,
            created_at: ts,
            updated_at: ts,
        };
        let document = self.store.insert_document(document).await?;
        tracing::info!(
            document_id = %document.id,
            application_id = %application.id,
            "Document attached"
        );
        Ok(document)
    }

    pub async fn get(&self, document_id: Uuid, caller: Uuid) -> Result<Document> {
        let document = self.load(document_id).await?;
        let application = self.load_application(document.application_id).await?;
        self.access.check_read_access(&application, caller).await?;
        Ok(document)
    }

    pub async fn update(
        &self,
        document_id: Uuid,
        caller: Uuid,
        payload: UpdateDocumentPayload,
    ) -> Result<Document> {
        validate(&payload)?;
        let mut document = self.load(document_id).await?;
        let application = self.load_application(document.application_id).await?;
        self.access.check_ownership(&application, caller)?;

        if let Some(document_type) = payload.document_type {
            document.document_type = document_type;
        }
        if let Some(file_url) = payload.file_url {
            document.file_url = file_url;
        }
        if payload.file_type.is_some() {
            document.file_type = payload.file_type;
        }
        if payload.file_size.is_some() {
            document.file_size = payload.file_size;
        }
        if payload.notes.is_some() {
            document.notes = payload.notes;
        }
        document.updated_at = now();

        self.store.update_document(document).await
    }

    pub async fn delete(&self, document_id: Uuid, caller: Uuid) -> Result<()> {
        let document = self.load(document_id).await?;
        let application = self.load_application(document.application_id).await?;
        self.access.check_ownership(&application, caller)?;

        self.store.delete_document(document_id).await?;
        tracing::info!(
            document_id = %document_id,
            application_id = %application.id,
            "Document deleted"
        );
        Ok(())
    }

    /// Marks a document verified. Does not touch the application's status.
    pub async fn verify(&self, document_id: Uuid, caller: Uuid) -> Result<Document> {
        let mut document = self.load(document_id).await?;
        let application = self.load_application(document.application_id).await?;
        self.access.check_employer_access(&application, caller).await?;

        let ts = now();
        document.is_verified = true;
        document.verified_by = Some(caller);
        document.verified_at = Some(ts);
        document.updated_at = ts;

        let document = self.store.update_document(document).await?;
        tracing::info!(document_id = %document.id, verified_by = %caller, "Document verified");
        Ok(document)
    }

    pub async fn list(
        &self,
        application_id: Uuid,
        caller: Uuid,
        query: DocumentListQuery,
    ) -> Result<Vec<Document>> {
        let application = self.load_application(application_id).await?;
        self.access.check_read_access(&application, caller).await?;
        self.store
            .list_documents(application_id, query.document_type)
            .await
    }

    /// Unverified documents across every application of `company_id`.
    pub async fn list_unverified(&self, company_id: Uuid, caller: Uuid) -> Result<Vec<Document>> {
        self.access.check_company_access(company_id, caller).await?;
        self.store.list_unverified_documents(company_id).await
    }

    async fn load(&self, document_id: Uuid) -> Result<Document> {
        self.store
            .get_document(document_id)
            .await?
            .ok_or_else(|| Error::not_found("document", document_id))
    }

    async fn load_application(&self, application_id: Uuid) -> Result<Application> {
        self.store
            .get_application(application_id)
            .await?
            .ok_or_else(|| Error::not_found("application", application_id))
    }

    async fn ensure_stage_belongs(&self, application_id: Uuid, stage_id: Uuid) -> Result<()> {
        match self.store.get_stage(stage_id).await? {
            Some(stage) if stage.application_id == application_id => Ok(()),
            Some(_) => Err(Error::BadRequest(format!(
                "stage {} does not belong to application {}",
                stage_id, application_id
            ))),
            None => Err(Error::not_found("stage", stage_id)),
        }
    }
}
