//! Result-contest process: a formal challenge of a vote-counting result.
//!
//! Shorter machine than the complaint's: allegations are gathered and judged,
//! then either a recourse runs its second round or the result becomes final
//! once the recourse window lapses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::deadline::{is_overdue, DeadlineRules, DeadlineWindow};
use super::domain::{
    ArchiveReason, ArchiveRecord, Attachment, AuditStamp, CaseId, CaseSummary, DeadlineView,
    DecisionMode, DisputeError, Party, Relator,
};
use super::history::{ActorId, History, OperationTag};
use super::judgment::{MeritsDecision, VoteTally};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContestPhase {
    Filed,
    AllegationsOpen,
    AllegationsJudged,
    RecourseFiled,
    CounterAllegationsOpen,
    RecourseJudged,
    FinalNoRecourse,
    Archived,
}

impl ContestPhase {
    pub const fn ordered() -> [Self; 8] {
        [
            Self::Filed,
            Self::AllegationsOpen,
            Self::AllegationsJudged,
            Self::RecourseFiled,
            Self::CounterAllegationsOpen,
            Self::RecourseJudged,
            Self::FinalNoRecourse,
            Self::Archived,
        ]
    }

    pub const fn index(self) -> usize {
        match self {
            Self::Filed => 0,
            Self::AllegationsOpen => 1,
            Self::AllegationsJudged => 2,
            Self::RecourseFiled => 3,
            Self::CounterAllegationsOpen => 4,
            Self::RecourseJudged => 5,
            Self::FinalNoRecourse => 6,
            Self::Archived => 7,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Filed => "filed",
            Self::AllegationsOpen => "allegations open",
            Self::AllegationsJudged => "allegations judged",
            Self::RecourseFiled => "recourse filed",
            Self::CounterAllegationsOpen => "counter-allegations open",
            Self::RecourseJudged => "recourse judged",
            Self::FinalNoRecourse => "final without recourse",
            Self::Archived => "archived",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::RecourseJudged | Self::FinalNoRecourse | Self::Archived
        )
    }
}

/// Submission made by a party during an open allegations window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllegationEntry {
    pub author: Party,
    pub text: String,
    pub received_at: DateTime<Utc>,
}

/// Collegiate or sole-relator decision on allegations or on the recourse.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContestDecision {
    pub decision: MeritsDecision,
    pub rationale: String,
    pub decided_at: DateTime<Utc>,
    pub tally: Option<VoteTally>,
}

impl ContestDecision {
    pub fn summary(&self) -> String {
        format!("{}: {}", self.decision.label(), self.rationale)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recourse {
    pub rationale: String,
    pub filed_at: DateTime<Utc>,
}

/// Payload required to file a result contest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContestFiling {
    pub contestant: Party,
    /// Which counted result is being challenged (poll, round, slate tally).
    pub contested_result: String,
    pub description: String,
    pub confidential: bool,
    pub decision_mode: DecisionMode,
}

/// Aggregate for one result contest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultContestCase {
    pub id: CaseId,
    pub sequence: u64,
    pub protocol: String,
    pub filed_at: DateTime<Utc>,
    pub phase: ContestPhase,
    pub contestant: Party,
    pub contested_result: String,
    pub description: String,
    pub confidential: bool,
    pub decision_mode: DecisionMode,
    pub relator: Option<Relator>,
    pub allegations_due: Option<DateTime<Utc>>,
    pub recourse_due: Option<DateTime<Utc>>,
    pub counter_allegations_due: Option<DateTime<Utc>>,
    pub allegations: Vec<AllegationEntry>,
    pub counter_allegations: Vec<AllegationEntry>,
    pub allegations_decision: Option<ContestDecision>,
    pub recourse: Option<Recourse>,
    pub recourse_decision: Option<ContestDecision>,
    pub archive: Option<ArchiveRecord<ContestPhase>>,
    pub attachments: Vec<Attachment>,
    pub history: History,
    pub audit: AuditStamp,
    pub version: u64,
}

fn expect_phase(
    case: &ResultContestCase,
    operation: &'static str,
    expected: ContestPhase,
) -> Result<(), DisputeError> {
    if case.phase == expected {
        Ok(())
    } else {
        Err(DisputeError::PhaseViolation {
            operation,
            phase: case.phase.label(),
        })
    }
}

fn non_empty(value: &str, what: &str) -> Result<(), DisputeError> {
    if value.trim().is_empty() {
        Err(DisputeError::InvalidInput(format!(
            "{what} must not be empty"
        )))
    } else {
        Ok(())
    }
}

fn check_tally_mode(
    mode: DecisionMode,
    tally: &Option<VoteTally>,
) -> Result<(), DisputeError> {
    match (mode, tally) {
        (DecisionMode::Collegiate, None) => Err(DisputeError::InvalidInput(
            "collegiate cases require a vote tally".to_string(),
        )),
        (DecisionMode::SoleRelator, Some(_)) => Err(DisputeError::InvalidInput(
            "sole-relator cases do not take a vote tally".to_string(),
        )),
        _ => Ok(()),
    }
}

impl ResultContestCase {
    pub fn file(
        id: CaseId,
        sequence: u64,
        protocol: String,
        filing: ContestFiling,
        actor: &ActorId,
        now: DateTime<Utc>,
    ) -> Result<Self, DisputeError> {
        non_empty(&filing.contested_result, "contested result")?;
        non_empty(&filing.description, "contest description")?;

        let mut history = History::default();
        history.append(
            now,
            OperationTag::FileCase,
            actor,
            format!("result contest filed over {}", filing.contested_result.trim()),
            ContestPhase::Filed.label(),
        );

        Ok(Self {
            id,
            sequence,
            protocol,
            filed_at: now,
            phase: ContestPhase::Filed,
            contestant: filing.contestant,
            contested_result: filing.contested_result.trim().to_string(),
            description: filing.description,
            confidential: filing.confidential,
            decision_mode: filing.decision_mode,
            relator: None,
            allegations_due: None,
            recourse_due: None,
            counter_allegations_due: None,
            allegations: Vec::new(),
            counter_allegations: Vec::new(),
            allegations_decision: None,
            recourse: None,
            recourse_decision: None,
            archive: None,
            attachments: Vec::new(),
            history,
            audit: AuditStamp::new(now),
            version: 0,
        })
    }

    pub fn open_allegations(
        &mut self,
        rules: &DeadlineRules,
        actor: &ActorId,
        now: DateTime<Utc>,
    ) -> Result<(), DisputeError> {
        expect_phase(self, "open allegations", ContestPhase::Filed)?;

        self.allegations_due = Some(rules.due_date(DeadlineWindow::Allegations, now));
        self.phase = ContestPhase::AllegationsOpen;
        self.audit.touch(now);
        self.history.append(
            now,
            OperationTag::OpenAllegations,
            actor,
            "interested parties may allege",
            self.phase.label(),
        );
        Ok(())
    }

    pub fn submit_allegation(
        &mut self,
        author: Party,
        text: &str,
        actor: &ActorId,
        now: DateTime<Utc>,
    ) -> Result<(), DisputeError> {
        expect_phase(self, "submit allegation", ContestPhase::AllegationsOpen)?;
        non_empty(text, "allegation text")?;

        let note = format!("allegation by {}", author.name);
        self.allegations.push(AllegationEntry {
            author,
            text: text.trim().to_string(),
            received_at: now,
        });
        self.audit.touch(now);
        self.history.append(
            now,
            OperationTag::SubmitAllegation,
            actor,
            note,
            self.phase.label(),
        );
        Ok(())
    }

    /// One-shot decision on the gathered allegations; opens the recourse
    /// window counted from now.
    pub fn judge_allegations(
        &mut self,
        decision: MeritsDecision,
        rationale: &str,
        tally: Option<VoteTally>,
        rules: &DeadlineRules,
        actor: &ActorId,
        now: DateTime<Utc>,
    ) -> Result<(), DisputeError> {
        if self.allegations_decision.is_some() {
            return Err(DisputeError::AlreadyDecided("allegations"));
        }
        expect_phase(self, "judge allegations", ContestPhase::AllegationsOpen)?;
        if self.relator.is_none() {
            return Err(DisputeError::Unauthorized(
                "a relator must be designated before judgment",
            ));
        }
        non_empty(rationale, "allegations rationale")?;
        check_tally_mode(self.decision_mode, &tally)?;

        self.allegations_decision = Some(ContestDecision {
            decision,
            rationale: rationale.trim().to_string(),
            decided_at: now,
            tally,
        });
        self.recourse_due = Some(rules.due_date(DeadlineWindow::Recourse, now));
        self.phase = ContestPhase::AllegationsJudged;
        self.audit.touch(now);
        self.history.append(
            now,
            OperationTag::JudgeAllegations,
            actor,
            format!("allegations {}", decision.label()),
            self.phase.label(),
        );
        Ok(())
    }

    /// Recourse filings are hard-gated by the stored window.
    pub fn file_recourse(
        &mut self,
        rationale: &str,
        actor: &ActorId,
        now: DateTime<Utc>,
    ) -> Result<(), DisputeError> {
        expect_phase(self, "file recourse", ContestPhase::AllegationsJudged)?;
        if let Some(due) = self.recourse_due {
            if is_overdue(Some(due), now) {
                return Err(DisputeError::DeadlineExpired {
                    window: DeadlineWindow::Recourse.label(),
                    due,
                });
            }
        }
        non_empty(rationale, "recourse fundamentals")?;

        self.recourse = Some(Recourse {
            rationale: rationale.trim().to_string(),
            filed_at: now,
        });
        self.phase = ContestPhase::RecourseFiled;
        self.audit.touch(now);
        self.history.append(
            now,
            OperationTag::FileRecourse,
            actor,
            "recourse against the allegations judgment",
            self.phase.label(),
        );
        Ok(())
    }

    pub fn open_counter_allegations(
        &mut self,
        rules: &DeadlineRules,
        actor: &ActorId,
        now: DateTime<Utc>,
    ) -> Result<(), DisputeError> {
        expect_phase(
            self,
            "open counter-allegations",
            ContestPhase::RecourseFiled,
        )?;

        self.counter_allegations_due =
            Some(rules.due_date(DeadlineWindow::CounterAllegations, now));
        self.phase = ContestPhase::CounterAllegationsOpen;
        self.audit.touch(now);
        self.history.append(
            now,
            OperationTag::OpenCounterAllegations,
            actor,
            "opposing parties may answer the recourse",
            self.phase.label(),
        );
        Ok(())
    }

    pub fn submit_counter_allegation(
        &mut self,
        author: Party,
        text: &str,
        actor: &ActorId,
        now: DateTime<Utc>,
    ) -> Result<(), DisputeError> {
        expect_phase(
            self,
            "submit counter-allegation",
            ContestPhase::CounterAllegationsOpen,
        )?;
        non_empty(text, "counter-allegation text")?;

        let note = format!("counter-allegation by {}", author.name);
        self.counter_allegations.push(AllegationEntry {
            author,
            text: text.trim().to_string(),
            received_at: now,
        });
        self.audit.touch(now);
        self.history.append(
            now,
            OperationTag::SubmitCounterAllegation,
            actor,
            note,
            self.phase.label(),
        );
        Ok(())
    }

    /// Final decision on the recourse; no further transitions afterwards.
    pub fn judge_recourse(
        &mut self,
        decision: MeritsDecision,
        rationale: &str,
        tally: Option<VoteTally>,
        actor: &ActorId,
        now: DateTime<Utc>,
    ) -> Result<(), DisputeError> {
        if self.recourse_decision.is_some() {
            return Err(DisputeError::AlreadyDecided("recourse"));
        }
        expect_phase(self, "judge recourse", ContestPhase::CounterAllegationsOpen)?;
        non_empty(rationale, "recourse rationale")?;
        check_tally_mode(self.decision_mode, &tally)?;

        self.recourse_decision = Some(ContestDecision {
            decision,
            rationale: rationale.trim().to_string(),
            decided_at: now,
            tally,
        });
        self.phase = ContestPhase::RecourseJudged;
        self.audit.touch(now);
        self.history.append(
            now,
            OperationTag::JudgeRecourse,
            actor,
            format!("recourse {}", decision.label()),
            self.phase.label(),
        );
        Ok(())
    }

    /// Close the contest once the recourse window lapsed with no filing.
    pub fn finalize_without_recourse(
        &mut self,
        actor: &ActorId,
        now: DateTime<Utc>,
    ) -> Result<(), DisputeError> {
        expect_phase(
            self,
            "finalize without recourse",
            ContestPhase::AllegationsJudged,
        )?;
        if let Some(due) = self.recourse_due {
            if !is_overdue(Some(due), now) {
                return Err(DisputeError::InvalidInput(format!(
                    "the recourse window is still open until {due}"
                )));
            }
        }

        self.phase = ContestPhase::FinalNoRecourse;
        self.audit.touch(now);
        self.history.append(
            now,
            OperationTag::FinalizeWithoutRecourse,
            actor,
            "no recourse within the statutory window",
            self.phase.label(),
        );
        Ok(())
    }

    pub fn archive(
        &mut self,
        reason: ArchiveReason,
        actor: &ActorId,
        now: DateTime<Utc>,
    ) -> Result<(), DisputeError> {
        if self.phase == ContestPhase::Archived {
            return Ok(());
        }
        if self.phase.is_terminal() {
            return Err(DisputeError::PhaseViolation {
                operation: "archive",
                phase: self.phase.label(),
            });
        }
        if let Some((window, due)) = self.active_deadline() {
            if !is_overdue(Some(due), now) && reason != ArchiveReason::Abandonment {
                return Err(DisputeError::InvalidInput(format!(
                    "the {} window is still open until {due}; only abandonment overrides it",
                    window.label()
                )));
            }
        }

        self.archive = Some(ArchiveRecord {
            reason,
            archived_at: now,
            archived_from: self.phase,
        });
        self.phase = ContestPhase::Archived;
        self.audit.touch(now);
        self.history.append(
            now,
            OperationTag::Archive,
            actor,
            reason.label(),
            self.phase.label(),
        );
        Ok(())
    }

    pub fn reopen(&mut self, actor: &ActorId, now: DateTime<Utc>) -> Result<(), DisputeError> {
        expect_phase(self, "reopen", ContestPhase::Archived)?;
        let record = self
            .archive
            .take()
            .ok_or(DisputeError::NotFound("archive record"))?;

        self.phase = record.archived_from;
        self.audit.touch(now);
        self.history.append(
            now,
            OperationTag::Reopen,
            actor,
            format!("resumed from {}", record.reason.label()),
            self.phase.label(),
        );
        Ok(())
    }

    pub fn assign_relator(
        &mut self,
        relator: Relator,
        actor: &ActorId,
        now: DateTime<Utc>,
    ) -> Result<(), DisputeError> {
        if self.allegations_decision.is_some() || self.phase.is_terminal() {
            return Err(DisputeError::PhaseViolation {
                operation: "assign relator",
                phase: self.phase.label(),
            });
        }

        let note = match &self.relator {
            Some(previous) => format!("{} replaces {}", relator.name, previous.name),
            None => format!("{} designated", relator.name),
        };
        self.relator = Some(relator);
        self.audit.touch(now);
        self.history.append(
            now,
            OperationTag::AssignRelator,
            actor,
            note,
            self.phase.label(),
        );
        Ok(())
    }

    pub fn attach_document(
        &mut self,
        attachment: Attachment,
        actor: &ActorId,
        now: DateTime<Utc>,
    ) -> Result<(), DisputeError> {
        if self.phase == ContestPhase::Archived {
            return Err(DisputeError::PhaseViolation {
                operation: "attach document",
                phase: self.phase.label(),
            });
        }

        let note = format!("{} attached", attachment.name);
        self.attachments.push(attachment);
        self.audit.touch(now);
        self.history.append(
            now,
            OperationTag::AttachDocument,
            actor,
            note,
            self.phase.label(),
        );
        Ok(())
    }

    pub fn active_deadline(&self) -> Option<(DeadlineWindow, DateTime<Utc>)> {
        match self.phase {
            ContestPhase::AllegationsOpen => self
                .allegations_due
                .map(|due| (DeadlineWindow::Allegations, due)),
            ContestPhase::AllegationsJudged => {
                self.recourse_due.map(|due| (DeadlineWindow::Recourse, due))
            }
            ContestPhase::CounterAllegationsOpen => self
                .counter_allegations_due
                .map(|due| (DeadlineWindow::CounterAllegations, due)),
            _ => None,
        }
    }

    pub fn decision_rationale(&self) -> String {
        if let Some(decision) = &self.recourse_decision {
            return decision.summary();
        }
        if let Some(decision) = &self.allegations_decision {
            return decision.summary();
        }
        "pending allegations judgment".to_string()
    }

    pub fn summary(&self, now: DateTime<Utc>) -> CaseSummary {
        let mut deadlines = Vec::new();
        let pairs = [
            (DeadlineWindow::Allegations, self.allegations_due),
            (DeadlineWindow::Recourse, self.recourse_due),
            (
                DeadlineWindow::CounterAllegations,
                self.counter_allegations_due,
            ),
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
}
