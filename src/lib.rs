pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

use crate::config::Config;
use crate::database::{directory::PgDirectory, PgPipelineStore, PipelineStore};
use crate::error::Result;
use crate::services::{
    access_service::AccessService,
    analytics_service::AnalyticsService,
    application_service::ApplicationService,
    collaborators::{
        EmailSender, JobDirectory, MembershipDirectory, NotificationSender, UserDirectory,
    },
    document_service::DocumentService,
    interview_service::InterviewService,
    note_service::NoteService,
    notification_service::NotificationService,
    webhook_sender::{NoopSender, WebhookSender},
};
use reqwest::Client;
use sqlx::PgPool;
use std::sync::Arc;

/// External systems the engine talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub jobs: Arc<dyn JobDirectory>,
    pub users: Arc<dyn UserDirectory>,
    pub memberships: Arc<dyn MembershipDirectory>,
    pub email: Arc<dyn EmailSender>,
    pub notifications: Arc<dyn NotificationSender>,
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn PipelineStore>,
    pub access_service: AccessService,
    pub notification_service: NotificationService,
    pub application_service: ApplicationService,
    pub interview_service: InterviewService,
    pub document_service: DocumentService,
    pub note_service: NoteService,
    pub analytics_service: AnalyticsService,
}

impl AppState {
    pub fn new(store: Arc<dyn PipelineStore>, collaborators: Collaborators) -> Self {
        let access_service = AccessService::new(collaborators.memberships.clone());
        let notification_service = NotificationService::new(
            collaborators.users.clone(),
            collaborators.email.clone(),
            collaborators.notifications.clone(),
        );
        let document_service = DocumentService::new(store.clone(), access_service.clone());
        let application_service = ApplicationService::new(
            store.clone(),
            collaborators.jobs.clone(),
            collaborators.users.clone(),
            access_service.clone(),
            document_service.clone(),
            notification_service.clone(),
        );
        let interview_service = InterviewService::new(
            store.clone(),
            application_service.clone(),
            access_service.clone(),
            notification_service.clone(),
        );
        let note_service = NoteService::new(store.clone(), access_service.clone());
        let analytics_service =
            AnalyticsService::new(store.clone(), collaborators.jobs, access_service.clone());

        Self {
            store,
            access_service,
            notification_service,
            application_service,
            interview_service,
            document_service,
            note_service,
            analytics_service,
        }
    }

    /// Postgres-backed state with webhook senders for whichever channels are configured.
    pub fn from_pool(pool: PgPool, config: &Config) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()?;

        let email: Arc<dyn EmailSender> = match &config.email_webhook_url {
            Some(url) => Arc::new(WebhookSender::email(
                http_client.clone(),
                url.clone(),
                config.webhook_secret.clone(),
            )),
            None => {
                tracing::info!("Email delivery disabled (EMAIL_WEBHOOK_URL not set)");
                Arc::new(NoopSender)
            }
        };
        let notifications: Arc<dyn NotificationSender> = match &config.notification_webhook_url {
            Some(url) => Arc::new(WebhookSender::in_app(
                http_client,
                url.clone(),
                config.webhook_secret.clone(),
            )),
            None => {
                tracing::info!("In-app notifications disabled (NOTIFICATION_WEBHOOK_URL not set)");
                Arc::new(NoopSender)
            }
        };

        let directory = Arc::new(PgDirectory::new(pool.clone()));
        let collaborators = Collaborators {
            jobs: directory.clone(),
            users: directory.clone(),
            memberships: directory,
            email,
            notifications,
        };

        Ok(Self::new(Arc::new(PgPipelineStore::new(pool)), collaborators))
    }
}
