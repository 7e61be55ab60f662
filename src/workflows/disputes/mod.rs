//! Electoral dispute workflows: conduct complaints and result contests, from
//! filing through admissibility, instruction, judgment, and second instance,
//! each phase gated by statutory deadlines.

pub mod contest;
pub mod deadline;
pub mod domain;
mod engine;
pub mod history;
pub mod judgment;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use contest::{
    AllegationEntry, ContestDecision, ContestFiling, ContestPhase, Recourse, ResultContestCase,
};
pub use deadline::{is_overdue, DeadlineRules, DeadlineWindow};
pub use domain::{
    ArchiveReason, ArchiveRecord, Attachment, AttachmentCategory, AuditStamp, CaseDeadlines,
    CaseId, CaseSummary, ComplaintCase, ComplaintFiling, ComplaintPhase, DeadlineView,
    DecisionMode, DisputeError, DocumentId, Party, Relator, Respondent, Witness,
    WitnessAttendance,
};
pub use history::{ActorId, History, HistoryEntry, OperationTag};
pub use judgment::{
    AdmissibilityDecision, AdmissibilityOutcome, Appeal, AppealJudgment, AppealOutcome, Judgment,
    MeritsDecision, VoteTally,
};
pub use repository::{
    Clock, ComplaintRepository, ContestRepository, DisputeNotification, DocumentMetadata,
    DocumentStore, DocumentStoreError, NotificationKind, NotificationPublisher, NotifyError,
    StorageError, SystemClock,
};
pub use router::dispute_router;
pub use service::{DisputeService, DisputeServiceError, JudgeAppealCommand, JudgeCommand};
