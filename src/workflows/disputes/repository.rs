//! Boundary contracts consumed by the dispute service. Implementations
//! (database, mail, object storage) live outside the engine; the in-memory
//! versions used by the binary and the tests are in `crate::infra`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::contest::ResultContestCase;
use super::domain::{AttachmentCategory, CaseId, ComplaintCase, DocumentId};

/// Error enumeration for storage failures. `VersionConflict` is retryable:
/// reload the case and replay the command.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("case already exists")]
    Conflict,
    #[error("case not found")]
    NotFound,
    #[error("case was modified concurrently; reload and retry")]
    VersionConflict,
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Versioned storage for complaint cases. `save` must compare
/// `expected_version` against the stored record and reject the whole write on
/// mismatch; the case record is the unit of concurrency control.
pub trait ComplaintRepository: Send + Sync {
    fn insert(&self, case: ComplaintCase) -> Result<ComplaintCase, StorageError>;
    fn fetch(&self, id: &CaseId) -> Result<Option<ComplaintCase>, StorageError>;
    fn save(&self, case: ComplaintCase, expected_version: u64)
        -> Result<ComplaintCase, StorageError>;
}

/// Versioned storage for result-contest cases.
pub trait ContestRepository: Send + Sync {
    fn insert(&self, case: ResultContestCase) -> Result<ResultContestCase, StorageError>;
    fn fetch(&self, id: &CaseId) -> Result<Option<ResultContestCase>, StorageError>;
    fn save(
        &self,
        case: ResultContestCase,
        expected_version: u64,
    ) -> Result<ResultContestCase, StorageError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    CaseFiled,
    AdmissibilityDecided,
    DefenseRequested,
    HearingScheduled,
    Judged,
    AppealFiled,
    AppealJudged,
    AllegationsJudged,
    RecourseJudged,
    Archived,
}

impl NotificationKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::CaseFiled => "case_filed",
            Self::AdmissibilityDecided => "admissibility_decided",
            Self::DefenseRequested => "defense_requested",
            Self::HearingScheduled => "hearing_scheduled",
            Self::Judged => "judged",
            Self::AppealFiled => "appeal_filed",
            Self::AppealJudged => "appeal_judged",
            Self::AllegationsJudged => "allegations_judged",
            Self::RecourseJudged => "recourse_judged",
            Self::Archived => "archived",
        }
    }
}

/// Payload handed to the notification transport after a durable state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisputeNotification {
    pub case_id: CaseId,
    pub kind: NotificationKind,
    pub details: BTreeMap<String, String>,
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}

/// Outbound notification hook. Fire-and-forget from the engine's perspective:
/// the service logs failures and never fails an operation over them.
pub trait NotificationPublisher: Send + Sync {
    fn publish(&self, notification: DisputeNotification) -> Result<(), NotifyError>;
}

/// Metadata accompanying document bytes handed to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub name: String,
    pub category: AttachmentCategory,
    pub content_type: String,
}

#[derive(Debug, thiserror::Error)]
pub enum DocumentStoreError {
    #[error("document not found")]
    NotFound,
    #[error("document storage unavailable: {0}")]
    Unavailable(String),
}

pub trait DocumentStore: Send + Sync {
    fn store(
        &self,
        case_id: &CaseId,
        metadata: &DocumentMetadata,
        bytes: Vec<u8>,
    ) -> Result<DocumentId, DocumentStoreError>;
    fn fetch(&self, id: &DocumentId) -> Result<Vec<u8>, DocumentStoreError>;
}

/// Injected clock so deadline evaluation stays deterministic under test;
/// production callers supply wall-clock time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
