use std::sync::Arc;

use chrono::Duration;

use super::common::{
    actor, build_service, contest_filing, filed_case, filing, relator, ts, FailingNotifications,
    FixedClock, MemoryNotifications, StaleComplaintRepository,
};
use crate::infra::{
    InMemoryComplaintRepository, InMemoryContestRepository, InMemoryDocumentStore,
};
use crate::workflows::disputes::deadline::DeadlineRules;
use crate::workflows::disputes::domain::{AttachmentCategory, CaseId, ComplaintPhase, DisputeError};
use crate::workflows::disputes::judgment::{AdmissibilityOutcome, MeritsDecision};
use crate::workflows::disputes::repository::{
    ComplaintRepository, DocumentMetadata, NotificationKind, StorageError,
};
use crate::workflows::disputes::service::{DisputeService, DisputeServiceError, JudgeCommand};

#[test]
fn filed_complaint_gets_sequential_protocol() {
    let harness = build_service(ts(2026, 3, 2));
    let actor = actor();

    let first = harness
        .service
        .file_complaint(filing(), &actor)
        .expect("first filing");
    let second = harness
        .service
        .file_complaint(filing(), &actor)
        .expect("second filing");

    assert_eq!(first.protocol, "DEN-2026-000001");
    assert_eq!(second.protocol, "DEN-2026-000002");
    assert_eq!(first.phase, ComplaintPhase::Received);
    assert_eq!(first.version, 0);

    let stored = harness
        .complaints
        .fetch(&first.id)
        .expect("fetch succeeds")
        .expect("record persisted");
    assert_eq!(stored.protocol, first.protocol);
}

#[test]
fn admission_through_the_service_opens_the_defense_window() {
    let filed_at = ts(2026, 3, 2);
    let harness = build_service(filed_at);
    let actor = actor();
    let rules = DeadlineRules::statutory();

    let case = harness
        .service
        .file_complaint(filing(), &actor)
        .expect("filed");
    harness
        .service
        .begin_admissibility_review(&case.id, &actor)
        .expect("review opens");
    let updated = harness
        .service
        .conclude_admissibility_review(
            &case.id,
            AdmissibilityOutcome::Admitted,
            "requirements met",
            &actor,
        )
        .expect("admitted");

    assert_eq!(updated.phase, ComplaintPhase::AwaitingDefense);
    assert_eq!(
        updated.deadlines.defense_due,
        Some(filed_at + Duration::days(rules.defense_days))
    );
    assert!(updated.admissibility.is_some());

    let kinds: Vec<_> = harness
        .notifications
        .events()
        .iter()
        .map(|event| event.kind)
        .collect();
    assert_eq!(
        kinds,
        vec![
            NotificationKind::CaseFiled,
            NotificationKind::AdmissibilityDecided,
        ]
    );
}

#[test]
fn appeal_window_is_enforced_at_mutation_time() {
    let start = ts(2026, 3, 2);
    let harness = build_service(start);
    let actor = actor();
    let rules = DeadlineRules::statutory();

    let case = harness
        .service
        .file_complaint(filing(), &actor)
        .expect("filed");
    let id = case.id.clone();
    harness
        .service
        .begin_admissibility_review(&id, &actor)
        .expect("ok");
    harness
        .service
        .conclude_admissibility_review(&id, AdmissibilityOutcome::Admitted, "met", &actor)
        .expect("ok");
    harness.clock.advance(Duration::days(2));
    harness
        .service
        .receive_defense(&id, "defense", &actor)
        .expect("ok");
    harness
        .service
        .open_evidence_production(&id, &actor)
        .expect("ok");
    harness.clock.advance(Duration::days(2));
    harness
        .service
        .close_evidence_production(&id, &actor)
        .expect("ok");
    let hearing_at = harness.service.now() + Duration::days(4);
    harness
        .service
        .schedule_hearing(&id, hearing_at, &actor)
        .expect("ok");
    harness.clock.set(hearing_at);
    harness
        .service
        .record_hearing(&id, "both parties heard", &actor)
        .expect("ok");
    harness
        .service
        .receive_final_allegations(&id, "closing", &actor)
        .expect("ok");
    harness
        .service
        .assign_relator(&id, relator(), &actor)
        .expect("ok");

    let judged_at = harness.service.now();
    let judged = harness
        .service
        .judge(
            &id,
            JudgeCommand {
                decision: MeritsDecision::Upheld,
                rationale: "conduct proven".to_string(),
                tally: None,
                allows_appeal: true,
            },
            &actor,
        )
        .expect("judged");
    assert_eq!(judged.phase, ComplaintPhase::AwaitingAppeal);
    let due = judged.deadlines.appeal_due.expect("window open");
    assert_eq!(due, judged_at + Duration::days(rules.appeal_days));

    // One day past the window: the deadline is re-checked when the mutation
    // runs, not when the command was drafted.
    harness.clock.set(due + Duration::days(1));
    let late = harness.service.file_appeal(&id, "late grounds", &actor);
    match late {
        Err(DisputeServiceError::Dispute(DisputeError::DeadlineExpired { window, .. })) => {
            assert_eq!(window, "appeal");
        }
        other => panic!("expected expired deadline, got {other:?}"),
    }

    let unchanged = harness.service.get_complaint(&id).expect("still there");
    assert_eq!(unchanged.phase, ComplaintPhase::AwaitingAppeal);
    assert!(unchanged.appeal.is_none());
}

#[test]
fn stale_version_save_surfaces_as_retryable_conflict() {
    let start = ts(2026, 3, 2);
    let case = filed_case(start);
    let repository = Arc::new(StaleComplaintRepository::seeded(case.clone()));
    let service = DisputeService::new(
        repository,
        Arc::new(InMemoryContestRepository::default()),
        Arc::new(MemoryNotifications::default()),
        Arc::new(InMemoryDocumentStore::default()),
        Arc::new(FixedClock::at(start)),
        DeadlineRules::statutory(),
    );

    let result = service.begin_admissibility_review(&case.id, &actor());

    assert!(matches!(
        result,
        Err(DisputeServiceError::Storage(StorageError::VersionConflict))
    ));
}

#[test]
fn concurrent_saves_against_the_same_version_conflict_in_storage() {
    let start = ts(2026, 3, 2);
    let repository = InMemoryComplaintRepository::default();
    let stored = repository.insert(filed_case(start)).expect("seeded");
    let actor = actor();

    // Two writers load the same version.
    let mut first = stored.clone();
    let mut second = stored.clone();
    first
        .begin_admissibility_review(&actor, start)
        .expect("first mutation");
    second
        .begin_admissibility_review(&actor, start)
        .expect("second mutation");

    repository.save(first, stored.version).expect("first save wins");
    let conflict = repository.save(second, stored.version);

    assert!(matches!(conflict, Err(StorageError::VersionConflict)));
}

#[test]
fn notification_failure_never_fails_the_operation() {
    let start = ts(2026, 3, 2);
    let service = DisputeService::new(
        Arc::new(InMemoryComplaintRepository::default()),
        Arc::new(InMemoryContestRepository::default()),
        Arc::new(FailingNotifications),
        Arc::new(InMemoryDocumentStore::default()),
        Arc::new(FixedClock::at(start)),
        DeadlineRules::statutory(),
    );

    let case = service
        .file_complaint(filing(), &actor())
        .expect("filing succeeds despite the dead transport");
    assert_eq!(case.phase, ComplaintPhase::Received);
}

#[test]
fn unknown_case_reports_not_found() {
    let harness = build_service(ts(2026, 3, 2));

    let result = harness
        .service
        .get_complaint(&CaseId("den-999999".to_string()));

    assert!(matches!(
        result,
        Err(DisputeServiceError::Storage(StorageError::NotFound))
    ));
}

#[test]
fn attached_documents_round_trip_through_the_store() {
    let harness = build_service(ts(2026, 3, 2));
    let actor = actor();
    let case = harness
        .service
        .file_complaint(filing(), &actor)
        .expect("filed");

    let updated = harness
        .service
        .attach_complaint_document(
            &case.id,
            DocumentMetadata {
                name: "poster-photo.pdf".to_string(),
                category: AttachmentCategory::Evidence,
                content_type: "application/pdf".to_string(),
            },
            b"pdf bytes".to_vec(),
            &actor,
        )
        .expect("attached");

    assert_eq!(updated.attachments.len(), 1);
    let attachment = &updated.attachments[0];
    assert_eq!(attachment.category, AttachmentCategory::Evidence);

    let bytes = harness
        .service
        .fetch_document(&attachment.document_id)
        .expect("stored bytes");
    assert_eq!(bytes, b"pdf bytes".to_vec());
}

#[test]
fn contest_filing_and_recourse_flow_through_the_service() {
    let start = ts(2026, 4, 6);
    let harness = build_service(start);
    let actor = actor();

    let case = harness
        .service
        .file_contest(contest_filing(), &actor)
        .expect("filed");
    assert_eq!(case.protocol, "IMP-2026-000001");

    harness
        .service
        .open_allegations(&case.id, &actor)
        .expect("opens");
    harness
        .service
        .assign_contest_relator(&case.id, relator(), &actor)
        .expect("relator");
    let judged = harness
        .service
        .judge_allegations(
            &case.id,
            MeritsDecision::Dismissed,
            "recount matched the bulletin",
            None,
            &actor,
        )
        .expect("judged");
    let due = judged.recourse_due.expect("recourse window open");

    harness.clock.set(due + Duration::seconds(1));
    let finalized = harness
        .service
        .finalize_without_recourse(&case.id, &actor)
        .expect("finalizes after the window");
    assert!(finalized.phase.is_terminal());
}
