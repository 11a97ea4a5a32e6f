mod common;

use tokio_test::{assert_err, assert_ok};
use uuid::Uuid;

use common::{setup, setup_with_senders, RecordingSender, TestPipeline};
use recruitment_pipeline::database::PipelineStore;
use recruitment_pipeline::dto::application_dto::{
    AdvanceStagePayload, ApplicationListQuery, BulkStatusPayload, RejectPayload,
};
use recruitment_pipeline::dto::document_dto::DocumentUpload;
use recruitment_pipeline::error::Error;
use recruitment_pipeline::models::application::{Application, ApplicationStatus};
use recruitment_pipeline::models::directory::{AccountType, JobStatus};
use recruitment_pipeline::models::document::DocumentType;

async fn assert_ledger_matches(pipeline: &TestPipeline, application: &Application) {
    let stages = pipeline.store.list_stages(application.id).await.unwrap();
    let latest = stages.last().expect("ledger has an entry");
    assert_eq!(latest.stage_name, application.status);
    assert_eq!(stages.iter().filter(|s| s.is_open()).count(), 1);
    assert!(latest.is_open());
}

fn advance(status: ApplicationStatus) -> AdvanceStagePayload {
    AdvanceStagePayload {
        status,
        notes: None,
    }
}

#[tokio::test]
async fn submit_creates_applied_entry_and_notifies() {
    let pipeline = setup();
    let app = pipeline.applied().await;

    assert_eq!(app.status, ApplicationStatus::Applied);
    assert_eq!(app.company_id, pipeline.company_id);
    assert_ledger_matches(&pipeline, &app).await;
    assert_eq!(pipeline.directory.application_count(pipeline.job_id), 1);

    pipeline.state.notification_service.flush().await;
    assert_eq!(pipeline.email.events(), vec!["application_received"]);
    assert_eq!(pipeline.notifications.events(), vec!["application_received"]);
}

#[tokio::test]
async fn submit_rejects_closed_jobs_duplicates_and_non_candidates() {
    let pipeline = setup();
    let service = &pipeline.state.application_service;

    let closed_job = pipeline.directory.add_job(pipeline.company_id, JobStatus::Closed);
    let candidate = pipeline.candidate();
    let err = service
        .submit(candidate, pipeline.submit_payload(closed_job))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidState(_)));

    assert_ok!(service.submit(candidate, pipeline.submit_payload(pipeline.job_id)).await);
    let err = service
        .submit(candidate, pipeline.submit_payload(pipeline.job_id))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Duplicate(_)));

    let inactive = pipeline.directory.add_user(AccountType::Candidate, false);
    let err = service
        .submit(inactive, pipeline.submit_payload(pipeline.job_id))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Forbidden(_)));

    let err = service
        .submit(pipeline.recruiter, pipeline.submit_payload(pipeline.job_id))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Forbidden(_)));

    let err = service
        .submit(candidate, pipeline.submit_payload(Uuid::new_v4()))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn failing_document_does_not_fail_submission() {
    let pipeline = setup();
    let candidate = pipeline.candidate();
    let mut payload = pipeline.submit_payload(pipeline.job_id);
    payload.documents = vec![
        DocumentUpload {
            document_type: DocumentType::Resume,
            file_url: "uploads/cv.pdf".to_string(),
            file_type: Some("application/pdf".to_string()),
            file_size: Some(20_480),
            notes: None,
            stage_id: None,
        },
        DocumentUpload {
            document_type: DocumentType::Portfolio,
            file_url: "uploads/portfolio.zip".to_string(),
            file_type: None,
            file_size: None,
            notes: None,
            stage_id: Some(Uuid::new_v4()),
        },
    ];

    let app = assert_ok!(pipeline.state.application_service.submit(candidate, payload).await);
    let documents = pipeline.store.list_documents(app.id, None).await.unwrap();
    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0].document_type, DocumentType::Resume);
    assert_eq!(documents[0].uploaded_by, candidate);
}

#[tokio::test]
async fn every_transition_keeps_status_and_ledger_in_step() {
    let pipeline = setup();
    let service = &pipeline.state.application_service;
    let app = pipeline.applied().await;

    // Skipping stages is allowed.
    let steps = [
        ApplicationStatus::Shortlisted,
        ApplicationStatus::Screening,
        ApplicationStatus::Offered,
        ApplicationStatus::Hired,
    ];
    let mut current = app;
    for status in steps {
        current = service
            .advance_stage(current.id, pipeline.recruiter, advance(status))
            .await
            .unwrap();
        assert_eq!(current.status, status);
        assert_ledger_matches(&pipeline, &current).await;
    }

    let stages = pipeline.store.list_stages(current.id).await.unwrap();
    assert_eq!(stages.len(), 5);
    assert!(stages[..4].iter().all(|s| s.completed_at.is_some()));
    assert_eq!(stages[0].notes.as_deref(), Some("Moved to shortlisted"));

    let err = service
        .advance_stage(current.id, pipeline.recruiter, advance(ApplicationStatus::Interview))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidState(_)));
}

#[tokio::test]
async fn advance_requires_employer_access_and_a_stage_target() {
    let pipeline = setup();
    let service = &pipeline.state.application_service;
    let app = pipeline.applied().await;

    let outsider = pipeline.directory.add_member(Uuid::new_v4(), "owner");
    let err = service
        .advance_stage(app.id, outsider, advance(ApplicationStatus::Screening))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Forbidden(_)));

    let err = service
        .advance_stage(app.id, app.candidate_id, advance(ApplicationStatus::Screening))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Forbidden(_)));

    for status in [
        ApplicationStatus::Applied,
        ApplicationStatus::Rejected,
        ApplicationStatus::Withdrawn,
    ] {
        let err = service
            .advance_stage(app.id, pipeline.recruiter, advance(status))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::BadRequest(_)));
    }

    let err = service
        .advance_stage(Uuid::new_v4(), pipeline.recruiter, advance(ApplicationStatus::Screening))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn employer_roles_outside_allow_set_are_refused() {
    let pipeline = setup();
    let app = pipeline.applied().await;
    let service = &pipeline.state.application_service;

    for role in ["viewer", "recruiter", "admin", "owner"] {
        let member = pipeline.directory.add_member(pipeline.company_id, role);
        assert_ok!(service.get(app.id, member).await);
    }
    let billing = pipeline.directory.add_member(pipeline.company_id, "billing");
    let err = service.get(app.id, billing).await.unwrap_err();
    assert!(matches!(err, Error::Forbidden(_)));

    let stranger = pipeline.candidate();
    assert_err!(service.get(app.id, stranger).await);
    assert_ok!(service.get(app.id, app.candidate_id).await);
}

#[tokio::test]
async fn reject_closes_open_entry_with_reason() {
    let pipeline = setup();
    let service = &pipeline.state.application_service;

    for path in [
        vec![],
        vec![ApplicationStatus::Screening],
        vec![ApplicationStatus::Screening, ApplicationStatus::Interview],
        vec![ApplicationStatus::Offered],
    ] {
        let mut app = pipeline.applied().await;
        for status in path {
            app = service
                .advance_stage(app.id, pipeline.recruiter, advance(status))
                .await
                .unwrap();
        }

        let reason = "Position filled internally".to_string();
        let rejected = service
            .reject(app.id, pipeline.recruiter, RejectPayload { reason: reason.clone() })
            .await
            .unwrap();
        assert_eq!(rejected.status, ApplicationStatus::Rejected);
        assert_ledger_matches(&pipeline, &rejected).await;

        let stages = pipeline.store.list_stages(app.id).await.unwrap();
        let (last, previous) = (&stages[stages.len() - 1], &stages[stages.len() - 2]);
        assert_eq!(last.stage_name, ApplicationStatus::Rejected);
        assert_eq!(last.notes.as_deref(), Some(reason.as_str()));
        assert_eq!(last.handled_by, Some(pipeline.recruiter));
        assert!(previous.completed_at.is_some());
        assert!(previous.notes.as_deref().unwrap_or_default().contains(&reason));
    }

    pipeline.state.notification_service.flush().await;
    assert_eq!(pipeline.email.count("status_updated:rejected"), 4);
}

#[tokio::test]
async fn withdraw_only_from_non_terminal_status() {
    let pipeline = setup();
    let service = &pipeline.state.application_service;

    let app = pipeline.applied().await;
    let err = service.withdraw(app.id, pipeline.recruiter).await.unwrap_err();
    assert!(matches!(err, Error::Forbidden(_)));

    let withdrawn = assert_ok!(service.withdraw(app.id, app.candidate_id).await);
    assert_eq!(withdrawn.status, ApplicationStatus::Withdrawn);
    assert_ledger_matches(&pipeline, &withdrawn).await;
    let err = service.withdraw(app.id, app.candidate_id).await.unwrap_err();
    assert!(matches!(err, Error::InvalidState(_)));

    let hired = pipeline.applied().await;
    service
        .advance_stage(hired.id, pipeline.recruiter, advance(ApplicationStatus::Hired))
        .await
        .unwrap();
    let err = service.withdraw(hired.id, hired.candidate_id).await.unwrap_err();
    assert!(matches!(err, Error::InvalidState(_)));

    let rejected = pipeline.applied().await;
    service
        .reject(
            rejected.id,
            pipeline.recruiter,
            RejectPayload { reason: "Not a fit".to_string() },
        )
        .await
        .unwrap();
    let err = service.withdraw(rejected.id, rejected.candidate_id).await.unwrap_err();
    assert!(matches!(err, Error::InvalidState(_)));

    // Withdrawal frees the pair for a new application and sends nothing.
    assert_ok!(
        service
            .submit(app.candidate_id, pipeline.submit_payload(pipeline.job_id))
            .await
    );
    pipeline.state.notification_service.flush().await;
    assert_eq!(pipeline.email.count("status_updated:withdrawn"), 0);
}

#[tokio::test]
async fn bulk_reject_skips_unauthorized_items() {
    let pipeline = setup();
    let service = &pipeline.state.application_service;

    let mut ids = Vec::new();
    for _ in 0..4 {
        ids.push(pipeline.applied().await.id);
    }
    let other_company = Uuid::new_v4();
    let other_job = pipeline.directory.add_job(other_company, JobStatus::Open);
    let candidate = pipeline.candidate();
    let foreign = service
        .submit(candidate, pipeline.submit_payload(other_job))
        .await
        .unwrap();
    ids.insert(2, foreign.id);

    let result = assert_ok!(
        service
            .bulk_update_status(
                pipeline.recruiter,
                BulkStatusPayload {
                    application_ids: ids.clone(),
                    status: ApplicationStatus::Rejected,
                    notes: Some("Role closed".to_string()),
                },
            )
            .await
    );
    assert_eq!(result.updated.len(), 4);
    assert_eq!(result.skipped, vec![foreign.id]);

    let untouched = pipeline.store.get_application(foreign.id).await.unwrap().unwrap();
    assert_eq!(untouched.status, ApplicationStatus::Applied);
    for id in result.updated {
        let app = pipeline.store.get_application(id).await.unwrap().unwrap();
        assert_eq!(app.status, ApplicationStatus::Rejected);
    }
}

#[tokio::test]
async fn bulk_update_to_applied_is_refused_up_front() {
    let pipeline = setup();
    let app = pipeline.applied().await;

    let err = pipeline
        .state
        .application_service
        .bulk_update_status(
            pipeline.recruiter,
            BulkStatusPayload {
                application_ids: vec![app.id],
                status: ApplicationStatus::Applied,
                notes: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::BadRequest(_)));

    let result = pipeline
        .state
        .application_service
        .bulk_update_status(
            pipeline.recruiter,
            BulkStatusPayload {
                application_ids: vec![app.id, Uuid::new_v4()],
                status: ApplicationStatus::Shortlisted,
                notes: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(result.updated, vec![app.id]);
    assert_eq!(result.skipped.len(), 1);
}

#[tokio::test]
async fn notification_failures_never_reach_the_caller() {
    let pipeline = setup_with_senders(RecordingSender::failing(), RecordingSender::default());
    let app = pipeline.applied().await;

    let screened = assert_ok!(
        pipeline
            .state
            .application_service
            .advance_stage(app.id, pipeline.recruiter, advance(ApplicationStatus::Screening))
            .await
    );
    assert_eq!(screened.status, ApplicationStatus::Screening);

    pipeline.state.notification_service.flush().await;
    assert_eq!(pipeline.email.count("status_updated:screening"), 1);
    assert_eq!(pipeline.notifications.count("status_updated:screening"), 1);
}

#[tokio::test]
async fn listing_viewing_and_bookmarking() {
    let pipeline = setup();
    let service = &pipeline.state.application_service;
    let first = pipeline.applied().await;
    let second = pipeline.applied().await;
    service
        .advance_stage(second.id, pipeline.recruiter, advance(ApplicationStatus::Screening))
        .await
        .unwrap();

    let all = service
        .list_for_job(pipeline.job_id, pipeline.recruiter, ApplicationListQuery::default())
        .await
        .unwrap();
    assert_eq!(all.len(), 2);
    let screening = service
        .list_for_job(
            pipeline.job_id,
            pipeline.recruiter,
            ApplicationListQuery { status: Some(ApplicationStatus::Screening) },
        )
        .await
        .unwrap();
    assert_eq!(screening.len(), 1);
    assert_eq!(screening[0].id, second.id);

    let mine = service
        .list_for_candidate(first.candidate_id, first.candidate_id, ApplicationListQuery::default())
        .await
        .unwrap();
    assert_eq!(mine.len(), 1);
    assert_err!(
        service
            .list_for_candidate(
                first.candidate_id,
                second.candidate_id,
                ApplicationListQuery::default(),
            )
            .await
    );

    let viewed = service.mark_viewed(first.id, pipeline.recruiter).await.unwrap();
    assert!(viewed.employer_viewed);
    let bookmarked = service.toggle_bookmark(first.id, pipeline.recruiter).await.unwrap();
    assert!(bookmarked.bookmarked);
    let unbookmarked = service.toggle_bookmark(first.id, pipeline.recruiter).await.unwrap();
    assert!(!unbookmarked.bookmarked);
    assert_err!(service.toggle_bookmark(first.id, first.candidate_id).await);

    let (a, b) = tokio::join!(
        service.toggle_bookmark(first.id, pipeline.recruiter),
        service.toggle_bookmark(first.id, pipeline.recruiter),
    );
    assert_ok!(a);
    assert_ok!(b);
    let settled = pipeline.store.get_application(first.id).await.unwrap().unwrap();
    assert!(!settled.bookmarked);

    let history = service.stage_history(second.id, second.candidate_id).await.unwrap();
    assert_eq!(history.len(), 2);
}
