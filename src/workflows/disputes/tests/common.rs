use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;

use crate::infra::{
    InMemoryComplaintRepository, InMemoryContestRepository, InMemoryDocumentStore,
};
use crate::workflows::disputes::contest::ContestFiling;
use crate::workflows::disputes::deadline::DeadlineRules;
use crate::workflows::disputes::domain::{
    CaseId, ComplaintCase, ComplaintFiling, DecisionMode, Party, Relator, Respondent,
};
use crate::workflows::disputes::history::ActorId;
use crate::workflows::disputes::judgment::AdmissibilityOutcome;
use crate::workflows::disputes::repository::{
    Clock, ComplaintRepository, DisputeNotification, NotificationPublisher, NotifyError,
    StorageError,
};
use crate::workflows::disputes::router::dispute_router;
use crate::workflows::disputes::service::DisputeService;

pub(super) fn ts(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 12, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn actor() -> ActorId {
    ActorId("clerk-01".to_string())
}

pub(super) fn relator() -> Relator {
    Relator {
        registration: "A-10432".to_string(),
        name: "Helena Prado".to_string(),
    }
}

pub(super) fn filing() -> ComplaintFiling {
    ComplaintFiling {
        filer: Party {
            registration: "A-20981".to_string(),
            name: "Rodrigo Lima".to_string(),
        },
        respondent: Respondent::Slate {
            slate_id: "slate-07".to_string(),
        },
        description: "Irregular campaign material distributed at the polling site".to_string(),
        confidential: false,
        decision_mode: DecisionMode::SoleRelator,
    }
}

pub(super) fn collegiate_filing() -> ComplaintFiling {
    ComplaintFiling {
        decision_mode: DecisionMode::Collegiate,
        ..filing()
    }
}

pub(super) fn contest_filing() -> ContestFiling {
    ContestFiling {
        contestant: Party {
            registration: "A-33107".to_string(),
            name: "Marina Duarte".to_string(),
        },
        contested_result: "second round tally, regional chapter".to_string(),
        description: "Tally sheet totals diverge from the published bulletin".to_string(),
        confidential: false,
        decision_mode: DecisionMode::SoleRelator,
    }
}

/// Build a complaint directly in the aggregate, for engine-level tests that
/// drive transitions with explicit times.
pub(super) fn filed_case(now: DateTime<Utc>) -> ComplaintCase {
    ComplaintCase::file(
        CaseId("den-000001".to_string()),
        1,
        "DEN-2026-000001".to_string(),
        filing(),
        &actor(),
        now,
    )
    .expect("filing is valid")
}

/// Complaint admitted into the defense window at `now`.
pub(super) fn admitted_case(now: DateTime<Utc>) -> ComplaintCase {
    let mut case = filed_case(now);
    case.begin_admissibility_review(&actor(), now)
        .expect("review opens");
    case.conclude_admissibility_review(
        AdmissibilityOutcome::Admitted,
        "formal requirements met",
        &DeadlineRules::statutory(),
        &actor(),
        now,
    )
    .expect("admissible");
    case
}

/// Complaint carried through instruction to the judgment phase; the returned
/// timestamp is when the final allegations arrived.
pub(super) fn case_awaiting_judgment(start: DateTime<Utc>) -> (ComplaintCase, DateTime<Utc>) {
    let rules = DeadlineRules::statutory();
    let mut case = admitted_case(start);
    let actor = actor();

    let t1 = start + Duration::days(3);
    case.receive_defense("the material was authorized", &actor, t1)
        .expect("defense in window");
    case.open_evidence_production(&rules, &actor, t1)
        .expect("evidence opens");
    let t2 = t1 + Duration::days(2);
    case.close_evidence_production(&actor, t2).expect("closes");
    let hearing_at = t2 + Duration::days(5);
    case.schedule_hearing(hearing_at, &actor, t2)
        .expect("scheduled");
    case.record_hearing("both parties heard", &rules, &actor, hearing_at)
        .expect("recorded");
    let t3 = hearing_at + Duration::days(1);
    case.receive_final_allegations("nothing further to add", &actor, t3)
        .expect("final allegations");
    case.assign_relator(relator(), &actor, t3).expect("relator");
    (case, t3)
}

/// Clock double the tests move by hand.
pub(super) struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub(super) fn at(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub(super) fn set(&self, to: DateTime<Utc>) {
        *self.now.lock().expect("clock mutex poisoned") = to;
    }

    pub(super) fn advance(&self, by: Duration) {
        let mut guard = self.now.lock().expect("clock mutex poisoned");
        *guard += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock mutex poisoned")
    }
}

/// Notification double recording every published event.
#[derive(Default)]
pub(super) struct MemoryNotifications {
    events: Mutex<Vec<DisputeNotification>>,
}

impl MemoryNotifications {
    pub(super) fn events(&self) -> Vec<DisputeNotification> {
        self.events.lock().expect("notification mutex poisoned").clone()
    }
}

impl NotificationPublisher for MemoryNotifications {
    fn publish(&self, notification: DisputeNotification) -> Result<(), NotifyError> {
        self.events
            .lock()
            .expect("notification mutex poisoned")
            .push(notification);
        Ok(())
    }
}

/// Publisher that always fails; operations must still succeed.
pub(super) struct FailingNotifications;

impl NotificationPublisher for FailingNotifications {
    fn publish(&self, _notification: DisputeNotification) -> Result<(), NotifyError> {
        Err(NotifyError::Transport("mail relay offline".to_string()))
    }
}

/// Complaint repository whose saves always lose the optimistic version race.
pub(super) struct StaleComplaintRepository {
    inner: InMemoryComplaintRepository,
}

impl StaleComplaintRepository {
    pub(super) fn seeded(case: ComplaintCase) -> Self {
        let inner = InMemoryComplaintRepository::default();
        inner.insert(case).expect("seed case");
        Self { inner }
    }
}

impl ComplaintRepository for StaleComplaintRepository {
    fn insert(&self, case: ComplaintCase) -> Result<ComplaintCase, StorageError> {
        self.inner.insert(case)
    }

    fn fetch(&self, id: &CaseId) -> Result<Option<ComplaintCase>, StorageError> {
        self.inner.fetch(id)
    }

    fn save(
        &self,
        _case: ComplaintCase,
        _expected_version: u64,
    ) -> Result<ComplaintCase, StorageError> {
        Err(StorageError::VersionConflict)
    }
}

pub(super) type TestService = DisputeService<
    InMemoryComplaintRepository,
    InMemoryContestRepository,
    MemoryNotifications,
    InMemoryDocumentStore,
    FixedClock,
>;

pub(super) struct TestHarness {
    pub(super) service: Arc<TestService>,
    pub(super) complaints: Arc<InMemoryComplaintRepository>,
    pub(super) notifications: Arc<MemoryNotifications>,
    pub(super) clock: Arc<FixedClock>,
}

pub(super) fn build_service(start: DateTime<Utc>) -> TestHarness {
    let complaints = Arc::new(InMemoryComplaintRepository::default());
    let contests = Arc::new(InMemoryContestRepository::default());
    let notifications = Arc::new(MemoryNotifications::default());
    let documents = Arc::new(InMemoryDocumentStore::default());
    let clock = Arc::new(FixedClock::at(start));

    let service = Arc::new(DisputeService::new(
        complaints.clone(),
        contests,
        notifications.clone(),
        documents,
        clock.clone(),
        DeadlineRules::statutory(),
    ));

    TestHarness {
        service,
        complaints,
        notifications,
        clock,
    }
}

pub(super) fn dispute_router_with(harness: &TestHarness) -> axum::Router {
    dispute_router(harness.service.clone())
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
