use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

/// Pipeline status of an application. Mirrors the `stage_name` of the ledger
/// entry that is currently open for the application.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    sqlx::Type,
)]
#[sqlx(type_name = "application_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Applied,
    Screening,
    Shortlisted,
    Interview,
    Offered,
    Hired,
    Rejected,
    Withdrawn,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 8] = [
        ApplicationStatus::Applied,
        ApplicationStatus::Screening,
        ApplicationStatus::Shortlisted,
        ApplicationStatus::Interview,
        ApplicationStatus::Offered,
        ApplicationStatus::Hired,
        ApplicationStatus::Rejected,
        ApplicationStatus::Withdrawn,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Applied => "applied",
            ApplicationStatus::Screening => "screening",
            ApplicationStatus::Shortlisted => "shortlisted",
            ApplicationStatus::Interview => "interview",
            ApplicationStatus::Offered => "offered",
            ApplicationStatus::Hired => "hired",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Withdrawn => "withdrawn",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            ApplicationStatus::Hired | ApplicationStatus::Rejected | ApplicationStatus::Withdrawn
        )
    }

    /// Statuses reachable through a plain stage advance.
    pub const fn is_advance_target(self) -> bool {
        matches!(
            self,
            ApplicationStatus::Screening
                | ApplicationStatus::Shortlisted
                | ApplicationStatus::Interview
                | ApplicationStatus::Offered
                | ApplicationStatus::Hired
        )
    }

    /// Position on the forward path; `None` for rejected/withdrawn.
    pub const fn progression_rank(self) -> Option<u8> {
        match self {
            ApplicationStatus::Applied => Some(0),
            ApplicationStatus::Screening => Some(1),
            ApplicationStatus::Shortlisted => Some(2),
            ApplicationStatus::Interview => Some(3),
            ApplicationStatus::Offered => Some(4),
            ApplicationStatus::Hired => Some(5),
            ApplicationStatus::Rejected | ApplicationStatus::Withdrawn => None,
        }
    }

    /// True when the application is at `stage` or further along the forward path.
    pub fn has_reached(self, stage: ApplicationStatus) -> bool {
        match (self.progression_rank(), stage.progression_rank()) {
            (Some(current), Some(target)) => current >= target,
            _ => false,
        }
    }

    /// Human-readable description stored on ledger entries.
    pub const fn stage_description(self) -> &'static str {
        match self {
            ApplicationStatus::Applied => "Application submitted",
            ApplicationStatus::Screening => "Application under screening",
            ApplicationStatus::Shortlisted => "Candidate shortlisted",
            ApplicationStatus::Interview => "Interview stage",
            ApplicationStatus::Offered => "Offer extended",
            ApplicationStatus::Hired => "Candidate hired",
            ApplicationStatus::Rejected => "Application rejected",
            ApplicationStatus::Withdrawn => "Application withdrawn by candidate",
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "application_source", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ApplicationSource {
    #[default]
    Direct,
    Referral,
    JobBoard,
    Recruiter,
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Application {
    pub id: Uuid,
    pub job_id: Uuid,
    pub candidate_id: Uuid,
    pub company_id: Uuid,
    pub status: ApplicationStatus,
    pub source: ApplicationSource,
    pub resume_url: Option<String>,
    pub cover_letter: Option<String>,
    pub match_score: Option<Decimal>,
    pub employer_viewed: bool,
    pub bookmarked: bool,
    pub version: i32,
    pub applied_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct ApplicationFilter {
    pub job_id: Option<Uuid>,
    pub company_id: Option<Uuid>,
    pub candidate_id: Option<Uuid>,
    pub status: Option<ApplicationStatus>,
}

impl ApplicationFilter {
    pub fn matches(&self, app: &Application) -> bool {
        self.job_id.map_or(true, |id| app.job_id == id)
            && self.company_id.map_or(true, |id| app.company_id == id)
            && self.candidate_id.map_or(true, |id| app.candidate_id == id)
            && self.status.map_or(true, |s| app.status == s)
    }
}
