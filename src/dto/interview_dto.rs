use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::interview::{InterviewMedium, InterviewScores};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ScheduleInterviewPayload {
    /// Ledger entry to attach to; defaults to the application's open entry.
    pub stage_id: Option<Uuid>,
    pub interviewer_id: Uuid,
    pub scheduled_at: DateTime<Utc>,
    pub medium: InterviewMedium,
    #[validate(url)]
    pub meeting_link: Option<String>,
    #[validate(length(min = 1, max = 500))]
    pub location: Option<String>,
    #[validate(length(max = 5000))]
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RescheduleInterviewPayload {
    pub scheduled_at: DateTime<Utc>,
    #[validate(url)]
    pub meeting_link: Option<String>,
    #[validate(length(min = 1, max = 500))]
    pub location: Option<String>,
    #[validate(length(max = 5000))]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CancelInterviewPayload {
    #[validate(length(max = 5000))]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CompleteInterviewPayload {
    #[serde(default)]
    pub scores: InterviewScores,
    #[validate(length(max = 10000))]
    pub remarks: Option<String>,
    #[validate(length(max = 10000))]
    pub feedback_summary: Option<String>,
}
