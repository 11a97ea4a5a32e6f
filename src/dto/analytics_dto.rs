use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::models::analytics::{AnalyticsScope, StatusCount};
use crate::models::application::ApplicationStatus;
use crate::models::document::DocumentType;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub event_type: String,
    pub title: String,
    pub description: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub status: Option<String>,
    pub metadata: Option<JsonValue>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageProgressStatus {
    Completed,
    InProgress,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageProgress {
    pub stage_id: Uuid,
    pub stage: ApplicationStatus,
    pub description: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub duration: Option<String>,
    pub status: StageProgressStatus,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentStats {
    pub total: usize,
    pub verified: usize,
    pub unverified: usize,
    pub by_type: BTreeMap<DocumentType, usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InterviewStats {
    pub total: usize,
    pub completed: usize,
    pub upcoming: usize,
    pub cancelled: usize,
    pub no_show: usize,
    pub average_score: Option<Decimal>,
    pub highest_score: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunnelStep {
    pub stage: ApplicationStatus,
    pub applications: i64,
    /// Percentage of applications that reached this stage, relative to `applied`.
    pub conversion_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageTime {
    pub stage: ApplicationStatus,
    pub average_seconds: f64,
    pub average: String,
    pub samples: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineAnalytics {
    pub scope: AnalyticsScope,
    pub total_applications: i64,
    pub status_counts: Vec<StatusCount>,
    pub funnel: Vec<FunnelStep>,
    pub average_time_per_stage: Vec<StageTime>,
}
