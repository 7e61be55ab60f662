//! Case aggregates and the vocabulary shared by both dispute processes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::deadline::{is_overdue, DeadlineWindow};
use super::history::{ActorId, History, OperationTag};
use super::judgment::{AdmissibilityDecision, Appeal, Judgment};

/// Identifier wrapper for dispute cases of either process.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CaseId(pub String);

/// Identifier of a stored document returned by the document store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(pub String);

/// Error taxonomy of the dispute engine. Every variant is recoverable by the
/// caller; nothing here aborts the process.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DisputeError {
    #[error("operation '{operation}' is not permitted while the case is in phase '{phase}'")]
    PhaseViolation {
        operation: &'static str,
        phase: &'static str,
    },
    #[error("the {window} window closed at {due}")]
    DeadlineExpired {
        window: &'static str,
        due: DateTime<Utc>,
    },
    #[error("{0} has already been decided")]
    AlreadyDecided(&'static str),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("{0}")]
    Unauthorized(&'static str),
    #[error("{0} not found")]
    NotFound(&'static str),
}

/// Council member filing or answering a case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    pub registration: String,
    pub name: String,
}

/// The accused side of a complaint. The variants are mutually exclusive, so a
/// case can never carry zero or several respondents at once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Respondent {
    Slate { slate_id: String },
    SlateMember { slate_id: String, registration: String },
    CommitteeMember { registration: String },
    ThirdParty { name: String },
}

impl Respondent {
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Slate { .. } => "slate",
            Self::SlateMember { .. } => "slate member",
            Self::CommitteeMember { .. } => "committee member",
            Self::ThirdParty { .. } => "third party",
        }
    }
}

/// Whether first-instance decisions come from a sole relator or a collegiate
/// committee vote. Fixed when the case is filed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionMode {
    SoleRelator,
    Collegiate,
}

/// Designated reviewer responsible for admissibility and judgment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relator {
    pub registration: String,
    pub name: String,
}

/// Creation/update timestamps embedded in each aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStamp {
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AuditStamp {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentCategory {
    Filing,
    Defense,
    Evidence,
    HearingRecord,
    Appeal,
    Misc,
}

/// Document reference kept on the case in upload order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub document_id: DocumentId,
    pub name: String,
    pub category: AttachmentCategory,
    pub uploaded_by: ActorId,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WitnessAttendance {
    Present,
    Absent,
}

/// Witness listed for the instruction of a complaint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Witness {
    pub name: String,
    pub summoned_at: Option<DateTime<Utc>>,
    pub attendance: Option<WitnessAttendance>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchiveReason {
    Inadmissible,
    Abandonment,
    Withdrawn,
    DeadlineLapsed,
    Administrative,
}

impl ArchiveReason {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Inadmissible => "inadmissible",
            Self::Abandonment => "abandonment",
            Self::Withdrawn => "withdrawn",
            Self::DeadlineLapsed => "deadline lapsed",
            Self::Administrative => "administrative",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArchiveRecord<P> {
    pub reason: ArchiveReason,
    pub archived_at: DateTime<Utc>,
    /// Phase the case held when archived; reopening restores exactly it.
    pub archived_from: P,
}

/// Stored due dates for the complaint response windows. Deadline checks read
/// these stored values, never a recomputation, so an administrative extension
/// written here is honored by every later operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseDeadlines {
    pub defense_due: Option<DateTime<Utc>>,
    pub evidence_due: Option<DateTime<Utc>>,
    pub final_allegations_due: Option<DateTime<Utc>>,
    pub appeal_due: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Defense {
    pub text: String,
    pub received_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceClosureCause {
    DeadlineElapsed,
    Manual,
}

impl EvidenceClosureCause {
    pub const fn label(self) -> &'static str {
        match self {
            Self::DeadlineElapsed => "deadline elapsed",
            Self::Manual => "closed early",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceWindow {
    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub closure_cause: Option<EvidenceClosureCause>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HearingRecord {
    pub summary: String,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hearing {
    pub scheduled_for: DateTime<Utc>,
    pub record: Option<HearingRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalAllegations {
    pub text: String,
    pub received_at: DateTime<Utc>,
}

/// Phases of the conduct-complaint process, in procedural order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplaintPhase {
    Received,
    AdmissibilityReview,
    AwaitingDefense,
    DefenseReceived,
    EvidenceProduction,
    InstructionHearing,
    FinalAllegations,
    AwaitingJudgment,
    AwaitingAppeal,
    AppealFiled,
    Judged,
    AppealJudged,
    Archived,
}

impl ComplaintPhase {
    pub const fn ordered() -> [Self; 13] {
        [
            Self::Received,
            Self::AdmissibilityReview,
            Self::AwaitingDefense,
            Self::DefenseReceived,
            Self::EvidenceProduction,
            Self::InstructionHearing,
            Self::FinalAllegations,
            Self::AwaitingJudgment,
            Self::AwaitingAppeal,
            Self::AppealFiled,
            Self::Judged,
            Self::AppealJudged,
            Self::Archived,
        ]
    }

    /// Position in the procedural order; only archive/reopen may move a case
    /// to a lower index.
    pub const fn index(self) -> usize {
        match self {
            Self::Received => 0,
            Self::AdmissibilityReview => 1,
            Self::AwaitingDefense => 2,
            Self::DefenseReceived => 3,
            Self::EvidenceProduction => 4,
            Self::InstructionHearing => 5,
            Self::FinalAllegations => 6,
            Self::AwaitingJudgment => 7,
            Self::AwaitingAppeal => 8,
            Self::AppealFiled => 9,
            Self::Judged => 10,
            Self::AppealJudged => 11,
            Self::Archived => 12,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::AdmissibilityReview => "admissibility review",
            Self::AwaitingDefense => "awaiting defense",
            Self::DefenseReceived => "defense received",
            Self::EvidenceProduction => "evidence production",
            Self::InstructionHearing => "instruction hearing",
            Self::FinalAllegations => "final allegations",
            Self::AwaitingJudgment => "awaiting judgment",
            Self::AwaitingAppeal => "awaiting appeal",
            Self::AppealFiled => "appeal filed",
            Self::Judged => "judged",
            Self::AppealJudged => "appeal judged",
            Self::Archived => "archived",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Judged | Self::AppealJudged | Self::Archived)
    }
}

/// Payload required to file a new complaint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplaintFiling {
    pub filer: Party,
    pub respondent: Respondent,
    pub description: String,
    pub confidential: bool,
    pub decision_mode: DecisionMode,
}

/// Aggregate for one conduct complaint. Mutated exclusively through the
/// phase-transition operations in `engine`; never physically deleted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplaintCase {
    pub id: CaseId,
    pub sequence: u64,
    pub protocol: String,
    pub filed_at: DateTime<Utc>,
    pub phase: ComplaintPhase,
    pub filer: Party,
    pub respondent: Respondent,
    pub description: String,
    pub confidential: bool,
    pub decision_mode: DecisionMode,
    pub relator: Option<Relator>,
    pub deadlines: CaseDeadlines,
    pub defense_notified_at: Option<DateTime<Utc>>,
    pub defense: Option<Defense>,
    pub evidence_window: Option<EvidenceWindow>,
    pub hearing: Option<Hearing>,
    pub final_allegations: Option<FinalAllegations>,
    pub admissibility: Option<AdmissibilityDecision>,
    pub judgment: Option<Judgment>,
    pub appeal: Option<Appeal>,
    pub archive: Option<ArchiveRecord<ComplaintPhase>>,
    pub attachments: Vec<Attachment>,
    pub witnesses: Vec<Witness>,
    pub history: History,
    pub audit: AuditStamp,
    pub version: u64,
}

impl ComplaintCase {
    /// Create the aggregate in its initial phase, with the filing recorded as
    /// the first history entry.
    pub fn file(
        id: CaseId,
        sequence: u64,
        protocol: String,
        filing: ComplaintFiling,
        actor: &ActorId,
        now: DateTime<Utc>,
    ) -> Result<Self, DisputeError> {
        if filing.description.trim().is_empty() {
            return Err(DisputeError::InvalidInput(
                "complaint description must not be empty".to_string(),
            ));
        }

        let mut history = History::default();
        history.append(
            now,
            OperationTag::FileCase,
            actor,
            format!("complaint filed against {}", filing.respondent.label()),
            ComplaintPhase::Received.label(),
        );

        Ok(Self {
            id,
            sequence,
            protocol,
            filed_at: now,
            phase: ComplaintPhase::Received,
            filer: filing.filer,
            respondent: filing.respondent,
            description: filing.description,
            confidential: filing.confidential,
            decision_mode: filing.decision_mode,
            relator: None,
            deadlines: CaseDeadlines::default(),
            defense_notified_at: None,
            defense: None,
            evidence_window: None,
            hearing: None,
            final_allegations: None,
            admissibility: None,
            judgment: None,
            appeal: None,
            archive: None,
            attachments: Vec::new(),
            witnesses: Vec::new(),
            history,
            audit: AuditStamp::new(now),
            version: 0,
        })
    }

    /// The one deadline the current phase is waiting on, if any.
    pub fn active_deadline(&self) -> Option<(DeadlineWindow, DateTime<Utc>)> {
        match self.phase {
            ComplaintPhase::AwaitingDefense => self
                .deadlines
                .defense_due
                .map(|due| (DeadlineWindow::Defense, due)),
            ComplaintPhase::EvidenceProduction => self
                .deadlines
                .evidence_due
                .map(|due| (DeadlineWindow::Evidence, due)),
            ComplaintPhase::FinalAllegations => self
                .deadlines
                .final_allegations_due
                .map(|due| (DeadlineWindow::FinalAllegations, due)),
            ComplaintPhase::AwaitingAppeal => self
                .deadlines
                .appeal_due
                .map(|due| (DeadlineWindow::Appeal, due)),
            _ => None,
        }
    }

    pub fn summary(&self, now: DateTime<Utc>) -> CaseSummary {
        let mut deadlines = Vec::new();
        let pairs = [
            (DeadlineWindow::Defense, self.deadlines.defense_due),
            (DeadlineWindow::Evidence, self.deadlines.evidence_due),
            (
                DeadlineWindow::FinalAllegations,
                self.deadlines.final_allegations_due,
            ),
            (DeadlineWindow::Appeal, self.deadlines.appeal_due),
        ];
        for (window, due) in pairs {
            if let Some(due) = due {
                deadlines.push(DeadlineView {
                    window,
                    due,
                    overdue: is_overdue(Some(due), now),
                });
            }
        }

        CaseSummary {
            id: self.id.clone(),
            protocol: self.protocol.clone(),
            phase_label: self.phase.label(),
            terminal: self.phase.is_terminal(),
            confidential: self.confidential,
            relator: self.relator.as_ref().map(|relator| relator.name.clone()),
            deadlines,
            decision_rationale: self.decision_rationale(),
            archive_reason: self.archive.as_ref().map(|record| record.reason.label()),
            attachments: self.attachments.len(),
            history_entries: self.history.len(),
            version: self.version,
        }
    }

    pub fn decision_rationale(&self) -> String {
        if let Some(appeal) = &self.appeal {
            if let Some(judgment) = &appeal.judgment {
                return judgment.summary();
            }
        }
        if let Some(judgment) = &self.judgment {
            return judgment.summary();
        }
        if let Some(admissibility) = &self.admissibility {
            return admissibility.summary();
        }
        "pending admissibility review".to_string()
    }
}

/// Stored due date plus its derived overdue flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeadlineView {
    pub window: DeadlineWindow,
    pub due: DateTime<Utc>,
    pub overdue: bool,
}

/// Sanitized representation of a case exposed by the service layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseSummary {
    pub id: CaseId,
    pub protocol: String,
    pub phase_label: &'static str,
    pub terminal: bool,
    pub confidential: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relator: Option<String>,
    pub deadlines: Vec<DeadlineView>,
    pub decision_rationale: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive_reason: Option<&'static str>,
    pub attachments: usize,
    pub history_entries: usize,
    pub version: u64,
}
