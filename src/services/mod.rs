pub mod access_service;
pub mod analytics_service;
pub mod application_service;
pub mod collaborators;
pub mod document_service;
pub mod interview_service;
pub mod note_service;
pub mod notification_service;
pub mod webhook_sender;
