use rust_decimal::Decimal;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::database::PipelineStore;
use crate::dto::analytics_dto::{
    DocumentStats, FunnelStep, InterviewStats, PipelineAnalytics, StageProgress,
    StageProgressStatus, StageTime, TimelineEvent,
};
use crate::error::{Error, Result};
use crate::models::analytics::{AnalyticsScope, StageDuration, StageReach};
use crate::models::application::{Application, ApplicationStatus};
use crate::models::document::Document;
use crate::models::interview::{Interview, InterviewStatus};
use crate::models::stage::StageEntry;
use crate::services::access_service::AccessService;
use crate::services::collaborators::JobDirectory;
use crate::utils::time::humanize_duration;

/// Read-only views over the ledger, documents and interviews. Per-application
/// views are composed in memory; job and company aggregates are pushed down
/// to the store.
#[derive(Clone)]
pub struct AnalyticsService {
    store: Arc<dyn PipelineStore>,
    jobs: Arc<dyn JobDirectory>,
    access: AccessService,
}

impl AnalyticsService {
    pub fn new(
        store: Arc<dyn PipelineStore>,
        jobs: Arc<dyn JobDirectory>,
        access: AccessService,
    ) -> Self {
        Self { store, jobs, access }
    }

    pub async fn timeline(&self, application_id: Uuid, caller: Uuid) -> Result<Vec<TimelineEvent>> {
        let application = self.readable(application_id, caller).await?;
        let stages = self.store.list_stages(application_id).await?;
        let interviews = self.store.list_interviews(application_id).await?;
        Ok(build_timeline(&application, &stages, &interviews))
    }

    pub async fn stage_progress(
        &self,
        application_id: Uuid,
        caller: Uuid,
    ) -> Result<Vec<StageProgress>> {
        self.readable(application_id, caller).await?;
        let stages = self.store.list_stages(application_id).await?;
        Ok(stages.iter().map(stage_progress).collect())
    }

    pub async fn document_stats(
        &self,
        application_id: Uuid,
        caller: Uuid,
    ) -> Result<DocumentStats> {
        self.readable(application_id, caller).await?;
        let documents = self.store.list_documents(application_id, None).await?;
        Ok(document_stats(&documents))
    }

    pub async fn interview_stats(
        &self,
        application_id: Uuid,
        caller: Uuid,
    ) -> Result<InterviewStats> {
        self.readable(application_id, caller).await?;
        let interviews = self.store.list_interviews(application_id).await?;
        Ok(interview_stats(&interviews))
    }

    pub async fn job_analytics(&self, job_id: Uuid, caller: Uuid) -> Result<PipelineAnalytics> {
        let job = self
            .jobs
            .get_job(job_id)
            .await?
            .ok_or_else(|| Error::not_found("job", job_id))?;
        self.access.check_company_access(job.company_id, caller).await?;
        self.pipeline_analytics(AnalyticsScope::Job(job_id)).await
    }

    pub async fn company_analytics(
        &self,
        company_id: Uuid,
        caller: Uuid,
    ) -> Result<PipelineAnalytics> {
        self.access.check_company_access(company_id, caller).await?;
        self.pipeline_analytics(AnalyticsScope::Company(company_id)).await
    }

    async fn pipeline_analytics(&self, scope: AnalyticsScope) -> Result<PipelineAnalytics> {
        let status_counts = self.store.status_counts(scope).await?;
        let reach = self.store.stage_reach(scope).await?;
        let durations = self.store.stage_durations(scope).await?;

        Ok(PipelineAnalytics {
            scope,
            total_applications: status_counts.iter().map(|c| c.count).sum(),
            status_counts,
            funnel: funnel(&reach),
            average_time_per_stage: durations.iter().map(stage_time).collect(),
        })
    }

    async fn readable(&self, application_id: Uuid, caller: Uuid) -> Result<Application> {
        let application = self
            .store
            .get_application(application_id)
            .await?
            .ok_or_else(|| Error::not_found("application", application_id))?;
        self.access.check_read_access(&application, caller).await?;
        Ok(application)
    }
}

/// Submission, then ledger entries, then interviews. Not re-sorted by time.
pub fn build_timeline(
    application: &Application,
    stages: &[StageEntry],
    interviews: &[Interview],
) -> Vec<TimelineEvent> {
    let mut events = Vec::with_capacity(1 + stages.len() + interviews.len());

    events.push(TimelineEvent {
        event_type: "application_submitted".to_string(),
        title: "Application submitted".to_string(),
        description: None,
        timestamp: application.applied_at,
        status: Some(ApplicationStatus::Applied.to_string()),
        metadata: Some(json!({ "source": application.source })),
    });

    for stage in stages {
        events.push(TimelineEvent {
            event_type: "stage_change".to_string(),
            title: format!("Moved to {}", stage.stage_name),
            description: Some(stage.description.clone()),
            timestamp: stage.started_at,
            status: Some(stage.stage_name.to_string()),
            metadata: Some(json!({
                "stage_id": stage.id,
                "handled_by": stage.handled_by,
                "notes": stage.notes,
            })),
        });
    }

    for interview in interviews {
        events.push(TimelineEvent {
            event_type: "interview_scheduled".to_string(),
            title: "Interview scheduled".to_string(),
            description: interview.remarks.clone(),
            timestamp: interview.scheduled_at,
            status: Some(interview.status.to_string()),
            metadata: Some(json!({
                "interview_id": interview.id,
                "medium": interview.medium,
                "interviewer_id": interview.interviewer_id,
            })),
        });
    }

    events
}

pub fn stage_progress(stage: &StageEntry) -> StageProgress {
    let (duration, status) = match stage.completed_at {
        Some(completed_at) => (
            Some(humanize_duration(completed_at - stage.started_at)),
            StageProgressStatus::Completed,
        ),
        None => (None, StageProgressStatus::InProgress),
    };
    StageProgress {
        stage_id: stage.id,
        stage: stage.stage_name,
        description: stage.description.clone(),
        started_at: stage.started_at,
        completed_at: stage.completed_at,
        duration,
        status,
    }
}

pub fn document_stats(documents: &[Document]) -> DocumentStats {
    let mut stats = DocumentStats {
        total: documents.len(),
        ..Default::default()
    };
    for document in documents {
        if document.is_verified {
            stats.verified += 1;
        }
        *stats.by_type.entry(document.document_type).or_insert(0) += 1;
    }
    stats.unverified = stats.total - stats.verified;
    stats
}

/// Score figures only consider interviews with a recorded overall score.
pub fn interview_stats(interviews: &[Interview]) -> InterviewStats {
    let mut stats = InterviewStats {
        total: interviews.len(),
        ..Default::default()
    };
    for interview in interviews {
        match interview.status {
            InterviewStatus::Completed => stats.completed += 1,
            InterviewStatus::Scheduled | InterviewStatus::Rescheduled => stats.upcoming += 1,
            InterviewStatus::Cancelled => stats.cancelled += 1,
            InterviewStatus::NoShow => stats.no_show += 1,
        }
    }

    let scores: Vec<Decimal> = interviews.iter().filter_map(|i| i.overall_score).collect();
    if !scores.is_empty() {
        let sum: Decimal = scores.iter().copied().sum();
        stats.average_score = Some((sum / Decimal::from(scores.len())).round_dp(2));
        stats.highest_score = scores.iter().copied().max();
    }
    stats
}

/// Forward-path stages with the percentage of applications that reached each,
/// relative to the number that entered `applied`.
pub fn funnel(reach: &[StageReach]) -> Vec<FunnelStep> {
    let reached = |stage: ApplicationStatus| {
        reach
            .iter()
            .find(|r| r.stage == stage)
            .map_or(0, |r| r.applications)
    };
    let base = reached(ApplicationStatus::Applied);

    ApplicationStatus::ALL
        .iter()
        .copied()
        .filter(|status| status.progression_rank().is_some())
        .map(|stage| {
            let applications = reached(stage);
            let conversion_rate = if base > 0 {
                ((applications as f64 / base as f64) * 10000.0).round() / 100.0
            } else {
                0.0
            };
            FunnelStep {
                stage,
                applications,
                conversion_rate,
            }
        })
        .collect()
}

fn stage_time(duration: &StageDuration) -> StageTime {
    StageTime {
        stage: duration.stage,
        average_seconds: duration.average_seconds,
        average: humanize_duration(chrono::Duration::seconds(
            duration.average_seconds.round() as i64,
        )),
        samples: duration.samples,
    }
}
