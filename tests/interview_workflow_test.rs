mod common;

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use tokio_test::{assert_err, assert_ok};
use uuid::Uuid;

use common::{setup, TestPipeline};
use recruitment_pipeline::database::PipelineStore;
use recruitment_pipeline::dto::application_dto::{AdvanceStagePayload, RejectPayload};
use recruitment_pipeline::dto::interview_dto::{
    CancelInterviewPayload, CompleteInterviewPayload, RescheduleInterviewPayload,
    ScheduleInterviewPayload,
};
use recruitment_pipeline::error::Error;
use recruitment_pipeline::models::application::{Application, ApplicationStatus};
use recruitment_pipeline::models::interview::{
    Interview, InterviewMedium, InterviewScores, InterviewStatus,
};
use recruitment_pipeline::models::note::{NoteCategory, NoteFilter, NoteSentiment};

fn schedule_payload(pipeline: &TestPipeline, hours_ahead: i64) -> ScheduleInterviewPayload {
    ScheduleInterviewPayload {
        stage_id: None,
        interviewer_id: pipeline.recruiter,
        scheduled_at: Utc::now() + Duration::hours(hours_ahead),
        medium: InterviewMedium::Online,
        meeting_link: Some("https://meet.example.com/abc-defg".to_string()),
        location: None,
        remarks: Some("Technical round".to_string()),
    }
}

async fn scheduled(pipeline: &TestPipeline) -> (Application, Interview) {
    let app = pipeline.applied().await;
    let interview = pipeline
        .state
        .interview_service
        .schedule(app.id, pipeline.recruiter, schedule_payload(pipeline, 48))
        .await
        .unwrap();
    (app, interview)
}

#[tokio::test]
async fn scheduling_advances_early_applications_to_interview() {
    let pipeline = setup();
    let service = &pipeline.state.interview_service;

    for earlier in [
        None,
        Some(ApplicationStatus::Screening),
        Some(ApplicationStatus::Shortlisted),
    ] {
        let app = pipeline.applied().await;
        if let Some(status) = earlier {
            pipeline
                .state
                .application_service
                .advance_stage(
                    app.id,
                    pipeline.recruiter,
                    AdvanceStagePayload { status, notes: None },
                )
                .await
                .unwrap();
        }

        let interview = assert_ok!(
            service
                .schedule(app.id, pipeline.recruiter, schedule_payload(&pipeline, 24))
                .await
        );
        assert_eq!(interview.status, InterviewStatus::Scheduled);

        let app = pipeline.store.get_application(app.id).await.unwrap().unwrap();
        assert_eq!(app.status, ApplicationStatus::Interview);
        let stages = pipeline.store.list_stages(app.id).await.unwrap();
        let open = stages.iter().find(|s| s.is_open()).unwrap();
        assert_eq!(open.stage_name, ApplicationStatus::Interview);
        assert_eq!(interview.stage_id, Some(open.id));
    }

    pipeline.state.notification_service.flush().await;
    assert_eq!(pipeline.email.count("interview_scheduled"), 3);
    assert_eq!(pipeline.email.count("status_updated:interview"), 3);
}

#[tokio::test]
async fn scheduling_past_interview_stage_does_not_regress() {
    let pipeline = setup();
    let app = pipeline.applied().await;
    pipeline
        .state
        .application_service
        .advance_stage(
            app.id,
            pipeline.recruiter,
            AdvanceStagePayload { status: ApplicationStatus::Offered, notes: None },
        )
        .await
        .unwrap();

    assert_ok!(
        pipeline
            .state
            .interview_service
            .schedule(app.id, pipeline.recruiter, schedule_payload(&pipeline, 24))
            .await
    );
    let app = pipeline.store.get_application(app.id).await.unwrap().unwrap();
    assert_eq!(app.status, ApplicationStatus::Offered);
}

#[tokio::test]
async fn scheduling_refused_for_terminal_or_foreign_stage() {
    let pipeline = setup();
    let service = &pipeline.state.interview_service;

    let rejected = pipeline.applied().await;
    pipeline
        .state
        .application_service
        .reject(rejected.id, pipeline.recruiter, RejectPayload { reason: "No".to_string() })
        .await
        .unwrap();
    let err = service
        .schedule(rejected.id, pipeline.recruiter, schedule_payload(&pipeline, 24))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidState(_)));

    let other = pipeline.applied().await;
    let foreign_stage = pipeline.store.list_stages(other.id).await.unwrap()[0].id;
    let app = pipeline.applied().await;
    let mut payload = schedule_payload(&pipeline, 24);
    payload.stage_id = Some(foreign_stage);
    let err = service.schedule(app.id, pipeline.recruiter, payload).await.unwrap_err();
    assert!(matches!(err, Error::BadRequest(_)));

    let mut payload = schedule_payload(&pipeline, 24);
    payload.stage_id = Some(Uuid::new_v4());
    let err = service.schedule(app.id, pipeline.recruiter, payload).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));

    // A refused schedule leaves the application where it was.
    let unchanged = pipeline.store.get_application(app.id).await.unwrap().unwrap();
    assert_eq!(unchanged.status, ApplicationStatus::Applied);
    assert_eq!(unchanged.version, 0);
    assert_eq!(pipeline.store.list_stages(app.id).await.unwrap().len(), 1);
    assert!(pipeline.store.list_interviews(app.id).await.unwrap().is_empty());
    pipeline.state.notification_service.flush().await;
    assert_eq!(pipeline.email.count("status_updated:interview"), 0);

    let err = service
        .schedule(app.id, app.candidate_id, schedule_payload(&pipeline, 24))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Forbidden(_)));
}

#[tokio::test]
async fn reschedule_then_cancel_records_internal_notes() {
    let pipeline = setup();
    let service = &pipeline.state.interview_service;
    let (app, interview) = scheduled(&pipeline).await;

    let new_time = Utc::now() + Duration::days(5);
    let moved = service
        .reschedule(
            interview.id,
            pipeline.recruiter,
            RescheduleInterviewPayload {
                scheduled_at: new_time,
                meeting_link: None,
                location: Some("Head office, room 4".to_string()),
                reason: Some("Interviewer travelling".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(moved.status, InterviewStatus::Rescheduled);
    assert_eq!(moved.scheduled_at, new_time);
    assert_eq!(moved.location.as_deref(), Some("Head office, room 4"));
    assert!(moved.meeting_link.is_some());

    let again = assert_ok!(
        service
            .reschedule(
                interview.id,
                pipeline.recruiter,
                RescheduleInterviewPayload {
                    scheduled_at: new_time + Duration::hours(1),
                    meeting_link: None,
                    location: None,
                    reason: None,
                },
            )
            .await
    );
    assert_eq!(again.status, InterviewStatus::Rescheduled);

    let cancelled = service
        .cancel(
            interview.id,
            pipeline.recruiter,
            CancelInterviewPayload { reason: Some("Candidate accepted another offer".to_string()) },
        )
        .await
        .unwrap();
    assert_eq!(cancelled.status, InterviewStatus::Cancelled);

    let notes = pipeline.store.list_notes(app.id, &NoteFilter::default()).await.unwrap();
    assert_eq!(notes.len(), 2);
    assert!(notes.iter().all(|n| n.stage_id == interview.stage_id));
    assert!(notes.iter().any(|n| n.content.contains("Interviewer travelling")));

    let err = service
        .complete(interview.id, pipeline.recruiter, CompleteInterviewPayload::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidState(_)));
    assert_err!(service.mark_no_show(interview.id, pipeline.recruiter).await);
    assert_err!(service.send_reminder(interview.id, pipeline.recruiter).await);
}

#[tokio::test]
async fn completion_records_scores_and_feedback() {
    let pipeline = setup();
    let (app, interview) = scheduled(&pipeline).await;

    let completed = pipeline
        .state
        .interview_service
        .complete(
            interview.id,
            pipeline.recruiter,
            CompleteInterviewPayload {
                scores: InterviewScores {
                    overall: Some(Decimal::new(85, 1)),
                    technical: Some(Decimal::new(9, 0)),
                    communication: None,
                    personality: None,
                },
                remarks: None,
                feedback_summary: Some("Strong systems background".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(completed.status, InterviewStatus::Completed);
    assert!(completed.ended_at.is_some());
    assert_eq!(completed.overall_score, Some(Decimal::new(85, 1)));

    let notes = pipeline.store.list_notes(app.id, &NoteFilter::default()).await.unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].category, NoteCategory::Feedback);

    let stats = pipeline
        .state
        .analytics_service
        .interview_stats(app.id, pipeline.recruiter)
        .await
        .unwrap();
    assert_eq!(stats.completed, 1);
    assert_eq!(stats.average_score, Some(Decimal::new(85, 1)));
    assert_eq!(stats.highest_score, Some(Decimal::new(85, 1)));
}

#[tokio::test]
async fn completion_rejects_out_of_range_scores() {
    let pipeline = setup();
    let (_, interview) = scheduled(&pipeline).await;

    let err = pipeline
        .state
        .interview_service
        .complete(
            interview.id,
            pipeline.recruiter,
            CompleteInterviewPayload {
                scores: InterviewScores {
                    overall: Some(Decimal::new(11, 0)),
                    ..Default::default()
                },
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::BadRequest(_)));

    let unchanged = pipeline.store.get_interview(interview.id).await.unwrap().unwrap();
    assert_eq!(unchanged.status, InterviewStatus::Scheduled);
}

#[tokio::test]
async fn completion_requires_a_scheduled_interview() {
    let pipeline = setup();
    let service = &pipeline.state.interview_service;
    let (_, interview) = scheduled(&pipeline).await;

    service
        .reschedule(
            interview.id,
            pipeline.recruiter,
            RescheduleInterviewPayload {
                scheduled_at: Utc::now() + Duration::days(3),
                meeting_link: None,
                location: None,
                reason: None,
            },
        )
        .await
        .unwrap();

    let err = service
        .complete(interview.id, pipeline.recruiter, CompleteInterviewPayload::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidState(_)));
    let stored = pipeline.store.get_interview(interview.id).await.unwrap().unwrap();
    assert_eq!(stored.status, InterviewStatus::Rescheduled);
    assert!(stored.ended_at.is_none());

    // Cancellation and no-show stay open to rescheduled interviews.
    assert_ok!(service.mark_no_show(interview.id, pipeline.recruiter).await);
}

#[tokio::test]
async fn no_show_adds_negative_note() {
    let pipeline = setup();
    let (app, interview) = scheduled(&pipeline).await;

    let marked = pipeline
        .state
        .interview_service
        .mark_no_show(interview.id, pipeline.recruiter)
        .await
        .unwrap();
    assert_eq!(marked.status, InterviewStatus::NoShow);

    let notes = pipeline.store.list_notes(app.id, &NoteFilter::default()).await.unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].sentiment, NoteSentiment::Negative);
    assert_eq!(notes[0].author_id, pipeline.recruiter);
}

#[tokio::test]
async fn reminders_resend_scheduling_notice() {
    let pipeline = setup();
    let service = &pipeline.state.interview_service;
    let (app, interview) = scheduled(&pipeline).await;

    assert_ok!(service.send_reminder(interview.id, pipeline.recruiter).await);
    pipeline.state.notification_service.flush().await;
    assert_eq!(pipeline.email.count("interview_scheduled"), 2);

    let listed = service.list(app.id, app.candidate_id).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_ok!(service.get(interview.id, app.candidate_id).await);
    assert_err!(service.get(Uuid::new_v4(), app.candidate_id).await);
}

#[tokio::test]
async fn reminder_sweep_sends_once_until_rescheduled() {
    let pipeline = setup();
    let service = &pipeline.state.interview_service;
    let app = pipeline.applied().await;
    let soon = service
        .schedule(app.id, pipeline.recruiter, schedule_payload(&pipeline, 2))
        .await
        .unwrap();
    let later = pipeline.applied().await;
    service
        .schedule(later.id, pipeline.recruiter, schedule_payload(&pipeline, 72))
        .await
        .unwrap();

    let lead = Duration::hours(24);
    assert_eq!(service.send_due_reminders(lead).await.unwrap(), 1);
    assert_eq!(service.send_due_reminders(lead).await.unwrap(), 0);
    let stamped = pipeline.store.get_interview(soon.id).await.unwrap().unwrap();
    assert!(stamped.reminded_at.is_some());

    service
        .reschedule(
            soon.id,
            pipeline.recruiter,
            RescheduleInterviewPayload {
                scheduled_at: Utc::now() + Duration::hours(3),
                meeting_link: None,
                location: None,
                reason: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(service.send_due_reminders(lead).await.unwrap(), 1);
}

#[tokio::test]
async fn reminder_sweep_stamps_interviews_of_closed_applications_silently() {
    let pipeline = setup();
    let service = &pipeline.state.interview_service;
    let app = pipeline.applied().await;
    let interview = service
        .schedule(app.id, pipeline.recruiter, schedule_payload(&pipeline, 2))
        .await
        .unwrap();
    pipeline
        .state
        .application_service
        .reject(app.id, pipeline.recruiter, RejectPayload { reason: "Role filled".to_string() })
        .await
        .unwrap();
    pipeline.state.notification_service.flush().await;
    let scheduled_notices = pipeline.email.count("interview_scheduled");

    let lead = Duration::hours(24);
    assert_eq!(service.send_due_reminders(lead).await.unwrap(), 0);
    let stamped = pipeline.store.get_interview(interview.id).await.unwrap().unwrap();
    assert!(stamped.reminded_at.is_some());
    assert!(pipeline
        .store
        .list_due_reminders(Utc::now(), Utc::now() + lead)
        .await
        .unwrap()
        .is_empty());

    pipeline.state.notification_service.flush().await;
    assert_eq!(pipeline.email.count("interview_scheduled"), scheduled_notices);
}
