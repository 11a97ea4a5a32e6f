//! Contracts for the systems the pipeline consumes but does not own: the job
//! catalogue, user profiles, company memberships, and the two outbound
//! channels (email and in-app notifications).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::models::application::ApplicationStatus;
use crate::models::directory::{JobSnapshot, Membership, UserProfile};
use crate::models::interview::InterviewMedium;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait JobDirectory: Send + Sync {
    async fn get_job(&self, job_id: Uuid) -> Result<Option<JobSnapshot>>;

    /// Bumps the job's application counter.
    async fn record_application(&self, job_id: Uuid) -> Result<()>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn get_user(&self, user_id: Uuid) -> Result<Option<UserProfile>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MembershipDirectory: Send + Sync {
    async fn get_membership(&self, user_id: Uuid, company_id: Uuid) -> Result<Option<Membership>>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipient {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

impl From<&UserProfile> for Recipient {
    fn from(user: &UserProfile) -> Self {
        Self {
            user_id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationNotice {
    pub application_id: Uuid,
    pub job_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusNotice {
    pub application_id: Uuid,
    pub job_id: Uuid,
    pub status: ApplicationStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewNotice {
    pub interview_id: Uuid,
    pub application_id: Uuid,
    pub job_id: Uuid,
    pub scheduled_at: DateTime<Utc>,
    pub medium: InterviewMedium,
    pub meeting_link: Option<String>,
    pub location: Option<String>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn application_received(&self, to: &Recipient, notice: &ApplicationNotice) -> Result<()>;

    async fn status_updated(&self, to: &Recipient, notice: &StatusNotice) -> Result<()>;

    async fn interview_scheduled(&self, to: &Recipient, notice: &InterviewNotice) -> Result<()>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn application_received(&self, to: &Recipient, notice: &ApplicationNotice) -> Result<()>;

    async fn status_updated(&self, to: &Recipient, notice: &StatusNotice) -> Result<()>;

    async fn interview_scheduled(&self, to: &Recipient, notice: &InterviewNotice) -> Result<()>;
}
