//! End-to-end workflow tests against a scripted service.

#![allow(clippy::unwrap_used)]

mod common;

use common::{Call, MockService, fetched, id, messages, report, signed_in};
use mailsweep_core::{
    AnalysisMode, AnalysisPhase, AuthState, Bucket, DeleteStatus, Error, FetchOutcome,
    FetchRequest, Message, NO_RESULTS_TEXT, NoticeLevel, RecentSnapshot, Section, ServiceError,
    Session, SessionConfig, Stats, ViewKind,
};

/// Fetches and analyzes `n` messages, the first `deleted` suggested for deletion.
async fn analyzed_session(n: usize, deleted: usize) -> Session<MockService> {
    let batch = messages("m", n);
    let service = MockService::new();
    service.push_fetch(fetched(batch.clone()));
    service.push_analyze(report(&batch[..deleted], &batch[deleted..]));

    let mut session = signed_in(service, SessionConfig::default()).await;
    session.fetch(FetchRequest::new(10)).await.unwrap();
    session.analyze().await.unwrap();
    session
}

#[tokio::test]
async fn test_fetch_enters_review_with_raw_batch() {
    let service = MockService::new();
    service.push_fetch(fetched(messages("m", 10)));
    let mut session = signed_in(service, SessionConfig::default()).await;

    let outcome = session.fetch(FetchRequest::new(10)).await.unwrap();

    assert_eq!(outcome, FetchOutcome::Fetched { count: 10 });
    assert_eq!(session.view().kind(), ViewKind::ReviewingFetched);
    let batch = session.view().batch().unwrap();
    assert_eq!(batch.len(), 10);
    assert!(batch.messages().iter().all(|m| m.bucket == Bucket::Unclassified));
    assert!(session.store().is_empty());
    assert!(!session.activity().is_busy());
}

#[tokio::test]
async fn test_analysis_merges_and_returns_to_dashboard() {
    let session = analyzed_session(10, 4).await;

    assert_eq!(
        session.stats(),
        Stats {
            total: 10,
            to_delete: 4,
            important: 6,
            unclassified: 0,
        }
    );
    assert_eq!(session.view().kind(), ViewKind::Dashboard);
    assert!(session.view().batch().is_none());

    let progress = session.progress();
    assert_eq!(progress.phase, AnalysisPhase::Complete);
    assert_eq!(progress.completed_batches, 1);
    assert_eq!(progress.total_batches, 1);
    assert_eq!(session.notice().unwrap().level, NoticeLevel::Info);
}

#[tokio::test]
async fn test_bulk_delete_applies_partial_success() {
    let mut session = analyzed_session(10, 4).await;
    session
        .service()
        .set_delete("m2", Err(ServiceError::Status {
            status: 500,
            message: "Failed to delete email".into(),
        }));

    for raw in ["m0", "m1", "m2"] {
        assert!(session.toggle(&id(raw)).unwrap());
    }
    let report = session.delete_selected().await.unwrap();

    assert_eq!(report.succeeded, vec![id("m0"), id("m1")]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].id, id("m2"));
    assert_eq!(report.summary(), "2 deleted, 1 failed");

    assert_eq!(session.store().len(), 8);
    assert!(session.store().contains(&id("m2")));
    assert_eq!(session.selection().ids().cloned().collect::<Vec<_>>(), vec![id("m2")]);
    assert_eq!(session.stats().to_delete, 2);

    let notice = session.notice().unwrap();
    assert_eq!(notice.level, NoticeLevel::Warning);
    assert_eq!(notice.text, "2 deleted, 1 failed");
    assert_eq!(session.service().count(|c| matches!(c, Call::Delete(_))), 3);
}

#[tokio::test]
async fn test_zero_count_is_rejected_without_a_call() {
    let mut session = signed_in(MockService::new(), SessionConfig::default()).await;

    let err = session.fetch(FetchRequest::new(0)).await.unwrap_err();

    assert!(matches!(err, Error::InvalidRequest(_)));
    assert_eq!(session.view().kind(), ViewKind::Dashboard);
    assert_eq!(session.service().calls(), vec![Call::CheckAuth]);
}

#[tokio::test]
async fn test_unauthorized_fetch_resets_session() {
    let mut session = analyzed_session(10, 4).await;
    session.service().push_fetch(Err(ServiceError::Unauthorized));

    let err = session.fetch(FetchRequest::new(25)).await.unwrap_err();

    assert!(err.is_session_expired());
    assert_eq!(session.auth_state(), AuthState::Expired);
    assert!(session.store().is_empty());
    assert!(session.selection().is_empty());
    assert_eq!(session.view().kind(), ViewKind::Dashboard);
    assert_eq!(session.progress().phase, AnalysisPhase::Idle);
    assert_eq!(session.login_url(), "http://triage.test/authorize");

    let err = session.fetch(FetchRequest::new(10)).await.unwrap_err();
    assert!(matches!(err, Error::NotSignedIn));
}

#[tokio::test]
async fn test_unauthorized_mid_bulk_delete_resets_session() {
    let mut session = analyzed_session(10, 4).await;
    session.service().set_delete("m1", Err(ServiceError::Unauthorized));
    session.toggle_section(Section::ToDelete).unwrap();

    let err = session.delete_selected().await.unwrap_err();

    assert!(matches!(err, Error::SessionExpired));
    assert_eq!(session.auth_state(), AuthState::Expired);
    assert!(session.store().is_empty());
    assert!(session.selection().is_empty());
    assert_eq!(session.notice().unwrap().level, NoticeLevel::Error);
}

#[tokio::test]
async fn test_unauthorized_analysis_resets_session() {
    let service = MockService::new();
    service.push_fetch(fetched(messages("m", 5)));
    service.push_analyze(Err(ServiceError::Unauthorized));
    let mut session = signed_in(service, SessionConfig::default()).await;

    session.fetch(FetchRequest::new(10)).await.unwrap();
    let err = session.analyze().await.unwrap_err();

    assert!(err.is_session_expired());
    assert_eq!(session.view().kind(), ViewKind::Dashboard);
    assert_eq!(session.auth_state(), AuthState::Expired);
}

#[tokio::test]
async fn test_empty_fetch_reports_no_results() {
    let service = MockService::new();
    service.push_fetch(fetched(Vec::new()));
    let mut session = signed_in(service, SessionConfig::default()).await;

    let outcome = session.fetch(FetchRequest::new(50)).await.unwrap();

    assert_eq!(outcome, FetchOutcome::NoResults);
    assert_eq!(session.view().kind(), ViewKind::Dashboard);
    assert_eq!(session.notice().unwrap().text, NO_RESULTS_TEXT);
}

#[tokio::test]
async fn test_fetch_failure_returns_to_dashboard() {
    let service = MockService::new();
    service.push_fetch(Err(ServiceError::Transport("connection refused".into())));
    let mut session = signed_in(service, SessionConfig::default()).await;

    let err = session.fetch(FetchRequest::new(10)).await.unwrap_err();

    assert!(err.is_retryable());
    assert_eq!(session.view().kind(), ViewKind::Dashboard);
    assert_eq!(session.auth_state(), AuthState::SignedIn);
    assert!(!session.activity().fetching);
}

#[tokio::test]
async fn test_fetch_with_missing_id_is_invalid_data() {
    let service = MockService::new();
    service.push_fetch(fetched(vec![Message::new("a"), Message::new("")]));
    let mut session = signed_in(service, SessionConfig::default()).await;

    let err = session.fetch(FetchRequest::new(10)).await.unwrap_err();

    assert!(matches!(err, Error::InvalidData(_)));
    assert_eq!(session.view().kind(), ViewKind::Dashboard);
}

#[tokio::test]
async fn test_analysis_failure_keeps_batch_for_retry() {
    let batch = messages("m", 10);
    let service = MockService::new();
    service.push_fetch(fetched(batch.clone()));
    service.push_analyze(Err(ServiceError::Status {
        status: 500,
        message: "model unavailable".into(),
    }));
    service.push_analyze(report(&batch[..3], &batch[3..]));
    let mut session = signed_in(service, SessionConfig::default()).await;
    session.fetch(FetchRequest::new(10)).await.unwrap();

    let err = session.analyze().await.unwrap_err();
    assert!(matches!(err, Error::AnalysisFailed { .. }));
    assert!(session.store().is_empty());
    assert_eq!(session.view().kind(), ViewKind::ReviewingFetched);
    assert_eq!(session.progress().phase, AnalysisPhase::Idle);
    assert!(!session.activity().analyzing);

    let summary = session.analyze().await.unwrap();
    assert_eq!(summary.to_delete, 3);
    assert_eq!(summary.important, 7);
    assert_eq!(session.view().kind(), ViewKind::Dashboard);
}

#[tokio::test]
async fn test_per_batch_mode_submits_chunks_of_ten() {
    let batch = messages("m", 25);
    let service = MockService::new();
    service.push_fetch(fetched(batch.clone()));
    service.push_analyze(report(&batch[..5], &batch[5..10]));
    service.push_analyze(report(&batch[10..20], &[]));
    service.push_analyze(report(&[], &batch[20..]));
    let config = SessionConfig::default().with_analysis_mode(AnalysisMode::PerBatch);
    let mut session = signed_in(service, config).await;

    session.fetch(FetchRequest::new(25)).await.unwrap();
    let summary = session.analyze().await.unwrap();

    assert_eq!(summary.batches_processed, 3);
    assert_eq!(summary.to_delete, 15);
    assert_eq!(summary.important, 10);
    assert_eq!(summary.unclassified, 0);
    assert_eq!(
        session.service().calls()[2..],
        [Call::Analyze(10), Call::Analyze(10), Call::Analyze(5)]
    );

    let progress = session.progress();
    assert_eq!(progress.completed_batches, 3);
    assert_eq!(progress.percent(), 100);
}

#[tokio::test]
async fn test_per_batch_failure_merges_nothing() {
    let batch = messages("m", 20);
    let service = MockService::new();
    service.push_fetch(fetched(batch.clone()));
    service.push_analyze(report(&batch[..10], &[]));
    service.push_analyze(Err(ServiceError::Transport("timed out".into())));
    let config = SessionConfig::default().with_analysis_mode(AnalysisMode::PerBatch);
    let mut session = signed_in(service, config).await;

    session.fetch(FetchRequest::new(20)).await.unwrap();
    assert!(session.analyze().await.is_err());

    assert!(session.store().is_empty());
    assert_eq!(session.view().kind(), ViewKind::ReviewingFetched);
}

#[tokio::test]
async fn test_analysis_can_be_cancelled() {
    let service = MockService::new();
    service.push_fetch(fetched(messages("m", 10)));
    service.hang_analyze();
    let mut session = signed_in(service, SessionConfig::default()).await;
    session.fetch(FetchRequest::new(10)).await.unwrap();

    let outcome = session.analyze_or_cancel(async {}).await.unwrap();

    assert!(outcome.is_none());
    assert_eq!(session.view().kind(), ViewKind::Dashboard);
    assert!(session.store().is_empty());
    assert_eq!(session.progress().phase, AnalysisPhase::Idle);
    assert!(!session.activity().is_busy());
}

#[tokio::test]
async fn test_back_discards_fetched_batch() {
    let service = MockService::new();
    service.push_fetch(fetched(messages("m", 3)));
    let mut session = signed_in(service, SessionConfig::default()).await;
    session.fetch(FetchRequest::new(10)).await.unwrap();

    session.back().unwrap();

    assert_eq!(session.view().kind(), ViewKind::Dashboard);
    assert!(session.store().is_empty());
    assert!(matches!(
        session.back(),
        Err(Error::InvalidTransition { .. })
    ));
}

#[tokio::test]
async fn test_triggers_rejected_in_wrong_view() {
    let service = MockService::new();
    service.push_fetch(fetched(messages("m", 3)));
    let mut session = signed_in(service, SessionConfig::default()).await;

    let err = session.analyze().await.unwrap_err();
    assert!(matches!(
        err,
        Error::InvalidTransition {
            state: ViewKind::Dashboard,
            ..
        }
    ));

    session.fetch(FetchRequest::new(10)).await.unwrap();
    assert!(matches!(
        session.fetch(FetchRequest::new(10)).await,
        Err(Error::InvalidTransition { .. })
    ));
    assert!(matches!(
        session.refresh().await,
        Err(Error::InvalidTransition { .. })
    ));
}

#[tokio::test]
async fn test_delete_from_fetched_batch() {
    let service = MockService::new();
    service.push_fetch(fetched(messages("m", 3)));
    let mut session = signed_in(service, SessionConfig::default()).await;
    session.fetch(FetchRequest::new(10)).await.unwrap();

    session.toggle(&id("m1")).unwrap();
    let status = session.delete_one(&id("m1")).await.unwrap();

    assert_eq!(status, DeleteStatus::Deleted);
    let batch = session.view().batch().unwrap();
    assert_eq!(batch.len(), 2);
    assert!(batch.selection().is_empty());
    assert!(session.store().is_empty());
}

#[tokio::test]
async fn test_delete_from_refetched_batch_updates_dashboard() {
    let mut session = analyzed_session(10, 4).await;
    session.toggle(&id("m0")).unwrap();
    session.toggle(&id("m1")).unwrap();
    session.service().push_fetch(fetched(messages("m", 3)));
    session.fetch(FetchRequest::new(10)).await.unwrap();

    let status = session.delete_one(&id("m0")).await.unwrap();
    assert_eq!(status, DeleteStatus::Deleted);
    session.back().unwrap();

    assert!(!session.store().contains(&id("m0")));
    assert_eq!(session.stats().total, 9);
    assert_eq!(session.stats().to_delete, 3);
    assert!(!session.selection().contains(&id("m0")));
    assert!(session.selection().contains(&id("m1")));
}

#[tokio::test]
async fn test_bulk_delete_from_refetched_batch_updates_dashboard() {
    let mut session = analyzed_session(10, 4).await;
    session.service().push_fetch(fetched(messages("m", 3)));
    session.fetch(FetchRequest::new(10)).await.unwrap();
    session.service().set_delete(
        "m2",
        Err(ServiceError::Status {
            status: 500,
            message: "boom".into(),
        }),
    );

    session.toggle_section(Section::All).unwrap();
    let report = session.delete_selected().await.unwrap();
    session.back().unwrap();

    assert_eq!(report.summary(), "2 deleted, 1 failed");
    assert!(!session.store().contains(&id("m0")));
    assert!(!session.store().contains(&id("m1")));
    assert!(session.store().contains(&id("m2")));
    assert_eq!(session.stats().total, 8);
}

#[tokio::test]
async fn test_unclassified_messages_are_reported() {
    let batch = messages("m", 5);
    let service = MockService::new();
    service.push_fetch(fetched(batch.clone()));
    service.push_analyze(report(&batch[..1], &batch[1..3]));
    let mut session = signed_in(service, SessionConfig::default()).await;
    session.fetch(FetchRequest::new(10)).await.unwrap();

    let summary = session.analyze().await.unwrap();

    assert_eq!(summary.unclassified, 2);
    let notice = session.notice().unwrap();
    assert_eq!(notice.level, NoticeLevel::Warning);
    assert_eq!(
        notice.text,
        "Analysis complete: 1 to delete, 2 important, 2 not classified"
    );
}

#[tokio::test]
async fn test_already_deleted_counts_as_success() {
    let mut session = analyzed_session(10, 4).await;
    session.service().set_delete("m0", Ok(DeleteStatus::AlreadyGone));

    let status = session.delete_one(&id("m0")).await.unwrap();

    assert_eq!(status, DeleteStatus::AlreadyGone);
    assert!(!session.store().contains(&id("m0")));
    assert_eq!(session.notice().unwrap().text, "Email was already deleted");
}

#[tokio::test]
async fn test_failed_single_delete_changes_nothing() {
    let mut session = analyzed_session(10, 4).await;
    session.service().set_delete("m0", Err(ServiceError::Status {
        status: 500,
        message: "Failed to delete email".into(),
    }));
    session.toggle(&id("m0")).unwrap();

    assert!(session.delete_one(&id("m0")).await.is_err());

    assert!(session.store().contains(&id("m0")));
    assert!(session.selection().contains(&id("m0")));
    assert_eq!(session.stats().total, 10);
}

#[tokio::test]
async fn test_stale_ids_and_empty_selection_rejected() {
    let mut session = analyzed_session(10, 4).await;

    assert!(matches!(
        session.delete_one(&id("gone")).await,
        Err(Error::InvalidRequest(_))
    ));
    assert!(matches!(
        session.delete_selected().await,
        Err(Error::InvalidRequest(_))
    ));
    assert!(matches!(session.toggle(&id("gone")), Err(Error::InvalidRequest(_))));
    assert_eq!(session.service().count(|c| matches!(c, Call::Delete(_))), 0);
}

#[tokio::test]
async fn test_section_selection_toggle() {
    let mut session = analyzed_session(10, 4).await;

    assert!(!session.is_section_selected(Section::ToDelete));
    assert!(session.toggle_section(Section::ToDelete).unwrap());
    assert!(session.is_section_selected(Section::ToDelete));
    assert_eq!(session.selection().len(), 4);

    session.toggle(&id("m0")).unwrap();
    assert!(!session.is_section_selected(Section::ToDelete));
    assert!(session.toggle_section(Section::ToDelete).unwrap());
    assert!(!session.toggle_section(Section::ToDelete).unwrap());
    assert!(session.selection().is_empty());

    session.set_selected(&id("m5"), true).unwrap();
    session.clear_selection();
    assert!(session.current_selection().is_empty());
}

#[tokio::test]
async fn test_refresh_loads_categorized_snapshot() {
    let all = messages("r", 5);
    let service = MockService::new();
    service.push_recent(Ok(RecentSnapshot {
        all: all.clone(),
        to_delete: all[..2].to_vec(),
        important: all[2..4].to_vec(),
        total_emails: 5,
    }));
    let mut session = signed_in(service, SessionConfig::default()).await;

    let stats = session.refresh().await.unwrap();

    assert_eq!(
        stats,
        Stats {
            total: 4,
            to_delete: 2,
            important: 2,
            unclassified: 1,
        }
    );
    assert_eq!(session.store().get(&id("r4")).unwrap().bucket, Bucket::Unclassified);
    assert!(!session.activity().refreshing);
}

#[tokio::test]
async fn test_refresh_prunes_selection() {
    let mut session = analyzed_session(10, 4).await;
    session.toggle(&id("m0")).unwrap();
    session.toggle(&id("m9")).unwrap();
    session.service().push_recent(Ok(RecentSnapshot {
        all: messages("m", 5),
        to_delete: Vec::new(),
        important: Vec::new(),
        total_emails: 5,
    }));

    session.refresh().await.unwrap();

    assert_eq!(session.selection().ids().cloned().collect::<Vec<_>>(), vec![id("m0")]);
}

#[tokio::test]
async fn test_signed_out_session_rejects_operations() {
    let service = MockService::new();
    service.reject_auth(ServiceError::Unauthorized);
    let mut session = Session::new(service, SessionConfig::default());

    assert_eq!(session.start().await.unwrap(), AuthState::SignedOut);
    assert!(matches!(
        session.fetch(FetchRequest::new(10)).await,
        Err(Error::NotSignedIn)
    ));
    assert!(matches!(session.refresh().await, Err(Error::NotSignedIn)));
    assert_eq!(session.service().calls(), vec![Call::CheckAuth]);
}

#[tokio::test]
async fn test_unreachable_service_on_start() {
    let service = MockService::new();
    service.reject_auth(ServiceError::Transport("dns".into()));
    let mut session = Session::new(service, SessionConfig::default());

    assert!(matches!(session.start().await, Err(Error::Service(_))));
    assert_eq!(session.auth_state(), AuthState::Unknown);
}

#[tokio::test]
async fn test_logout_clears_state() {
    let mut session = analyzed_session(10, 4).await;

    session.logout().await.unwrap();

    assert_eq!(session.auth_state(), AuthState::SignedOut);
    assert!(session.store().is_empty());
    assert!(session.service().calls().contains(&Call::Logout));
}

#[tokio::test]
async fn test_activity_subscriber_sees_flags_cleared() {
    let mut session = analyzed_session(10, 4).await;
    let rx = session.subscribe_activity();

    session.toggle(&id("m0")).unwrap();
    session.delete_selected().await.unwrap();

    assert!(rx.has_changed().unwrap());
    assert!(!rx.borrow().is_busy());
}
