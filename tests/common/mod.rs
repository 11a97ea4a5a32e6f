#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use recruitment_pipeline::database::MemoryPipelineStore;
use recruitment_pipeline::dto::application_dto::SubmitApplicationPayload;
use recruitment_pipeline::error::{Error, Result};
use recruitment_pipeline::models::application::{Application, ApplicationSource};
use recruitment_pipeline::models::directory::{
    AccountType, EmployerRole, JobSnapshot, JobStatus, Membership, UserProfile,
};
use recruitment_pipeline::services::collaborators::{
    ApplicationNotice, EmailSender, InterviewNotice, JobDirectory, MembershipDirectory,
    NotificationSender, Recipient, StatusNotice, UserDirectory,
};
use recruitment_pipeline::{AppState, Collaborators};

#[derive(Default)]
pub struct InMemoryDirectory {
    jobs: Mutex<HashMap<Uuid, JobSnapshot>>,
    application_counts: Mutex<HashMap<Uuid, u32>>,
    users: Mutex<HashMap<Uuid, UserProfile>>,
    memberships: Mutex<HashMap<(Uuid, Uuid), EmployerRole>>,
}

impl InMemoryDirectory {
    pub fn add_job(&self, company_id: Uuid, status: JobStatus) -> Uuid {
        let id = Uuid::new_v4();
        self.jobs.lock().unwrap().insert(
            id,
            JobSnapshot {
                id,
                company_id,
                status,
            },
        );
        id
    }

    pub fn add_user(&self, account_type: AccountType, is_active: bool) -> Uuid {
        let id = Uuid::new_v4();
        self.users.lock().unwrap().insert(
            id,
            UserProfile {
                id,
                name: format!("User {}", &id.to_string()[..8]),
                email: format!("{}@example.com", id.simple()),
                phone: None,
                is_active,
                account_type,
            },
        );
        id
    }

    pub fn add_member(&self, company_id: Uuid, role: &str) -> Uuid {
        let id = self.add_user(AccountType::Employer, true);
        self.memberships
            .lock()
            .unwrap()
            .insert((id, company_id), EmployerRole::parse(role));
        id
    }

    pub fn application_count(&self, job_id: Uuid) -> u32 {
        self.application_counts
            .lock()
            .unwrap()
            .get(&job_id)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl JobDirectory for InMemoryDirectory {
    async fn get_job(&self, job_id: Uuid) -> Result<Option<JobSnapshot>> {
        Ok(self.jobs.lock().unwrap().get(&job_id).cloned())
    }

    async fn record_application(&self, job_id: Uuid) -> Result<()> {
        *self
            .application_counts
            .lock()
            .unwrap()
            .entry(job_id)
            .or_insert(0) += 1;
        Ok(())
    }
}

#[async_trait]
impl UserDirectory for InMemoryDirectory {
    async fn get_user(&self, user_id: Uuid) -> Result<Option<UserProfile>> {
        Ok(self.users.lock().unwrap().get(&user_id).cloned())
    }
}

#[async_trait]
impl MembershipDirectory for InMemoryDirectory {
    async fn get_membership(&self, user_id: Uuid, company_id: Uuid) -> Result<Option<Membership>> {
        Ok(self
            .memberships
            .lock()
            .unwrap()
            .get(&(user_id, company_id))
            .cloned()
            .map(|role| Membership {
                user_id,
                company_id,
                role,
            }))
    }
}

/// Records every delivery; optionally fails all of them.
#[derive(Default)]
pub struct RecordingSender {
    pub fail: bool,
    sent: Mutex<Vec<(String, Uuid)>>,
}

impl RecordingSender {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn events(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|(e, _)| e.clone()).collect()
    }

    pub fn count(&self, event: &str) -> usize {
        self.sent.lock().unwrap().iter().filter(|(e, _)| e == event).count()
    }

    fn record(&self, event: &str, to: &Recipient) -> Result<()> {
        self.sent.lock().unwrap().push((event.to_string(), to.user_id));
        if self.fail {
            return Err(Error::Delivery(format!("{} delivery refused", event)));
        }
        Ok(())
    }
}

#[async_trait]
impl EmailSender for RecordingSender {
    async fn application_received(
        &self,
        to: &Recipient,
        _notice: &ApplicationNotice,
    ) -> Result<()> {
        self.record("application_received", to)
    }

    async fn status_updated(&self, to: &Recipient, notice: &StatusNotice) -> Result<()> {
        self.record(&format!("status_updated:{}", notice.status), to)
    }

    async fn interview_scheduled(&self, to: &Recipient, _notice: &InterviewNotice) -> Result<()> {
        self.record("interview_scheduled", to)
    }
}

#[async_trait]
impl NotificationSender for RecordingSender {
    async fn application_received(
        &self,
        to: &Recipient,
        _notice: &ApplicationNotice,
    ) -> Result<()> {
        self.record("application_received", to)
    }

    async fn status_updated(&self, to: &Recipient, notice: &StatusNotice) -> Result<()> {
        self.record(&format!("status_updated:{}", notice.status), to)
    }

    async fn interview_scheduled(&self, to: &Recipient, _notice: &InterviewNotice) -> Result<()> {
        self.record("interview_scheduled", to)
    }
}

pub struct TestPipeline {
    pub state: AppState,
    pub store: Arc<MemoryPipelineStore>,
    pub directory: Arc<InMemoryDirectory>,
    pub email: Arc<RecordingSender>,
    pub notifications: Arc<RecordingSender>,
    pub company_id: Uuid,
    pub job_id: Uuid,
    pub recruiter: Uuid,
}

pub fn setup() -> TestPipeline {
    setup_with_senders(RecordingSender::default(), RecordingSender::default())
}

pub fn setup_with_senders(email: RecordingSender, notifications: RecordingSender) -> TestPipeline {
    let store = Arc::new(MemoryPipelineStore::new());
    let directory = Arc::new(InMemoryDirectory::default());
    let email = Arc::new(email);
    let notifications = Arc::new(notifications);

    let company_id = Uuid::new_v4();
    let job_id = directory.add_job(company_id, JobStatus::Open);
    let recruiter = directory.add_member(company_id, "recruiter");

    let state = AppState::new(
        store.clone(),
        Collaborators {
            jobs: directory.clone(),
            users: directory.clone(),
            memberships: directory.clone(),
            email: email.clone(),
            notifications: notifications.clone(),
        },
    );

    TestPipeline {
        state,
        store,
        directory,
        email,
        notifications,
        company_id,
        job_id,
        recruiter,
    }
}

impl TestPipeline {
    pub fn candidate(&self) -> Uuid {
        self.directory.add_user(AccountType::Candidate, true)
    }

    pub fn submit_payload(&self, job_id: Uuid) -> SubmitApplicationPayload {
        SubmitApplicationPayload {
            job_id,
            source: ApplicationSource::Direct,
            resume_url: Some("uploads/resume.pdf".to_string()),
            cover_letter: Some("I would like to join the team.".to_string()),
            match_score: None,
            documents: Vec::new(),
        }
    }

    /// Fresh candidate with an `applied` application to the default job.
    pub async fn applied(&self) -> Application {
        let candidate = self.candidate();
        self.state
            .application_service
            .submit(candidate, self.submit_payload(self.job_id))
            .await
            .expect("submit application")
    }
}
