//! Read-only views returned by the job, user and membership lookups.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Open,
    Closed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub id: Uuid,
    pub company_id: Uuid,
    pub status: JobStatus,
}

impl JobSnapshot {
    pub fn accepts_applications(&self) -> bool {
        self.status == JobStatus::Open
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    Candidate,
    Employer,
    Admin,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub is_active: bool,
    pub account_type: AccountType,
}

/// Role a user holds inside a company. Parsed leniently so that roles the
/// portal adds later surface as `Other` instead of failing the lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmployerRole {
    Viewer,
    Recruiter,
    Admin,
    Owner,
    Other(String),
}

impl EmployerRole {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "viewer" => EmployerRole::Viewer,
            "recruiter" => EmployerRole::Recruiter,
            "admin" => EmployerRole::Admin,
            "owner" => EmployerRole::Owner,
            other => EmployerRole::Other(other.to_string()),
        }
    }

    /// Allow-set for employer access. The same set currently gates reads and writes.
    pub fn grants_pipeline_access(&self) -> bool {
        matches!(
            self,
            EmployerRole::Viewer
                | EmployerRole::Recruiter
                | EmployerRole::Admin
                | EmployerRole::Owner
        )
    }
}

impl fmt::Display for EmployerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmployerRole::Viewer => f.write_str("viewer"),
            EmployerRole::Recruiter => f.write_str("recruiter"),
            EmployerRole::Admin => f.write_str("admin"),
            EmployerRole::Owner => f.write_str("owner"),
            EmployerRole::Other(role) => f.write_str(role),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Membership {
    pub user_id: Uuid,
    pub company_id: Uuid,
    pub role: EmployerRole,
}
