use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "interview_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum InterviewStatus {
    Scheduled,
    Rescheduled,
    Completed,
    Cancelled,
    NoShow,
}

impl InterviewStatus {
    pub const fn label(self) -> &'static str {
        match self {
            InterviewStatus::Scheduled => "scheduled",
            InterviewStatus::Rescheduled => "rescheduled",
            InterviewStatus::Completed => "completed",
            InterviewStatus::Cancelled => "cancelled",
            InterviewStatus::NoShow => "no_show",
        }
    }

    /// Scheduled or rescheduled; the only states any transition leaves from.
    pub const fn is_pending(self) -> bool {
        matches!(self, InterviewStatus::Scheduled | InterviewStatus::Rescheduled)
    }
}

impl fmt::Display for InterviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "interview_medium", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum InterviewMedium {
    Online,
    Onsite,
    Phone,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Interview {
    pub id: Uuid,
    pub application_id: Uuid,
    pub stage_id: Option<Uuid>,
    pub interviewer_id: Uuid,
    pub scheduled_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub medium: InterviewMedium,
    pub meeting_link: Option<String>,
    pub location: Option<String>,
    pub status: InterviewStatus,
    pub overall_score: Option<Decimal>,
    pub technical_score: Option<Decimal>,
    pub communication_score: Option<Decimal>,
    pub personality_score: Option<Decimal>,
    pub remarks: Option<String>,
    pub feedback_summary: Option<String>,
    pub reminded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The four evaluation scores recorded on completion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct InterviewScores {
    pub overall: Option<Decimal>,
    pub technical: Option<Decimal>,
    pub communication: Option<Decimal>,
    pub personality: Option<Decimal>,
}

impl InterviewScores {
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, Decimal)> + '_ {
        [
            ("overall", self.overall),
            ("technical", self.technical),
            ("communication", self.communication),
            ("personality", self.personality),
        ]
        .into_iter()
        .filter_map(|(name, score)| score.map(|s| (name, s)))
    }
}
