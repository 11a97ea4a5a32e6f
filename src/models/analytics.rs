use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::application::ApplicationStatus;

/// Which applications an aggregation runs over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", content = "id", rename_all = "snake_case")]
pub enum AnalyticsScope {
    Job(Uuid),
    Company(Uuid),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct StatusCount {
    pub status: ApplicationStatus,
    pub count: i64,
}

/// Number of distinct applications whose ledger ever entered `stage`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct StageReach {
    pub stage: ApplicationStatus,
    pub applications: i64,
}

/// Mean time spent in `stage`, over completed ledger entries only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct StageDuration {
    pub stage: ApplicationStatus,
    pub average_seconds: f64,
    pub samples: i64,
}
