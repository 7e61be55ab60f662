//! Append-only procedural history.
//!
//! Every successful operation on a case leaves exactly one entry. The trail
//! exposes no mutation or removal; an erroneous entry is corrected by
//! appending a corrective one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of the user acting on a case (clerk, relator, party counsel).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorId(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationTag {
    FileCase,
    BeginAdmissibilityReview,
    ConcludeAdmissibilityReview,
    NotifyForDefense,
    ReceiveDefense,
    OpenEvidenceProduction,
    CloseEvidenceProduction,
    ScheduleHearing,
    RecordHearing,
    ReceiveFinalAllegations,
    Judge,
    FileAppeal,
    JudgeAppeal,
    Archive,
    Reopen,
    AssignRelator,
    AttachDocument,
    AddWitness,
    SummonWitness,
    RecordWitnessAttendance,
    OpenAllegations,
    SubmitAllegation,
    JudgeAllegations,
    FileRecourse,
    OpenCounterAllegations,
    SubmitCounterAllegation,
    JudgeRecourse,
    FinalizeWithoutRecourse,
}

impl OperationTag {
    pub const fn label(self) -> &'static str {
        match self {
            Self::FileCase => "case filed",
            Self::BeginAdmissibilityReview => "admissibility review opened",
            Self::ConcludeAdmissibilityReview => "admissibility decided",
            Self::NotifyForDefense => "respondent notified for defense",
            Self::ReceiveDefense => "defense received",
            Self::OpenEvidenceProduction => "evidence production opened",
            Self::CloseEvidenceProduction => "evidence production closed",
            Self::ScheduleHearing => "instruction hearing scheduled",
            Self::RecordHearing => "instruction hearing recorded",
            Self::ReceiveFinalAllegations => "final allegations received",
            Self::Judge => "first-instance judgment",
            Self::FileAppeal => "appeal filed",
            Self::JudgeAppeal => "appeal judged",
            Self::Archive => "case archived",
            Self::Reopen => "case reopened",
            Self::AssignRelator => "relator designated",
            Self::AttachDocument => "document attached",
            Self::AddWitness => "witness listed",
            Self::SummonWitness => "witness summoned",
            Self::RecordWitnessAttendance => "witness attendance recorded",
            Self::OpenAllegations => "allegations window opened",
            Self::SubmitAllegation => "allegation submitted",
            Self::JudgeAllegations => "allegations judged",
            Self::FileRecourse => "recourse filed",
            Self::OpenCounterAllegations => "counter-allegations window opened",
            Self::SubmitCounterAllegation => "counter-allegation submitted",
            Self::JudgeRecourse => "recourse judged",
            Self::FinalizeWithoutRecourse => "result final without recourse",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub at: DateTime<Utc>,
    pub operation: OperationTag,
    pub actor: ActorId,
    pub note: String,
    pub resulting_phase: &'static str,
}

/// Ordered trail where insertion order and timestamp order always agree.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct History {
    entries: Vec<HistoryEntry>,
}

impl History {
    pub fn append(
        &mut self,
        at: DateTime<Utc>,
        operation: OperationTag,
        actor: &ActorId,
        note: impl Into<String>,
        resulting_phase: &'static str,
    ) {
        // Entries never carry a timestamp earlier than their predecessor, even
        // if the injected clock regresses between operations.
        let at = match self.entries.last() {
            Some(last) if at < last.at => last.at,
            _ => at,
        };

        self.entries.push(HistoryEntry {
            at,
            operation,
            actor: actor.clone(),
            note: note.into(),
            resulting_phase,
        });
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&HistoryEntry> {
        self.entries.last()
    }
}
