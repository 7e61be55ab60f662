//! Phase-transition operations for the conduct-complaint process.
//!
//! Every operation validates the current phase and any governing deadline
//! before touching a single field, appends exactly one history entry on
//! success, and fails with a typed [`DisputeError`] otherwise. Wrong-phase
//! calls fail loudly; silent acceptance would mask double submissions.

use chrono::{DateTime, Utc};

use super::deadline::{is_overdue, DeadlineRules, DeadlineWindow};
use super::domain::{
    ArchiveReason, ArchiveRecord, Attachment, ComplaintCase, ComplaintPhase, DecisionMode, Defense,
    DisputeError, EvidenceClosureCause, EvidenceWindow, FinalAllegations, Hearing, HearingRecord,
    Relator, Witness, WitnessAttendance,
};
use super::history::{ActorId, OperationTag};
use super::judgment::{
    AdmissibilityDecision, AdmissibilityOutcome, Appeal, AppealJudgment, AppealOutcome, Judgment,
    MeritsDecision, VoteTally,
};

fn expect_phase(
    case: &ComplaintCase,
    operation: &'static str,
    expected: ComplaintPhase,
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

/// A collegiate case judges by tally, a sole-relator case without one; a
/// mismatch is a malformed command, not a judgment.
fn check_tally_mode(case: &ComplaintCase, tally: &Option<VoteTally>) -> Result<(), DisputeError> {
    match (case.decision_mode, tally) {
        (DecisionMode::Collegiate, None) => Err(DisputeError::InvalidInput(
            "collegiate cases require a vote tally".to_string(),
        )),
        (DecisionMode::SoleRelator, Some(_)) => Err(DisputeError::InvalidInput(
            "sole-relator cases do not take a vote tally".to_string(),
        )),
        _ => Ok(()),
    }
}

impl ComplaintCase {
    pub fn begin_admissibility_review(
        &mut self,
        actor: &ActorId,
        now: DateTime<Utc>,
    ) -> Result<(), DisputeError> {
        expect_phase(self, "begin admissibility review", ComplaintPhase::Received)?;

        self.phase = ComplaintPhase::AdmissibilityReview;
        self.audit.touch(now);
        self.history.append(
            now,
            OperationTag::BeginAdmissibilityReview,
            actor,
            "formal requirements under review",
            self.phase.label(),
        );
        Ok(())
    }

    /// One-shot gate decision. An admitted complaint moves to the defense
    /// window counted from the filing date; a rejected one is archived as
    /// inadmissible.
    pub fn conclude_admissibility_review(
        &mut self,
        outcome: AdmissibilityOutcome,
        rationale: &str,
        rules: &DeadlineRules,
        actor: &ActorId,
        now: DateTime<Utc>,
    ) -> Result<(), DisputeError> {
        if self.admissibility.is_some() {
            return Err(DisputeError::AlreadyDecided("admissibility"));
        }
        expect_phase(
            self,
            "conclude admissibility review",
            ComplaintPhase::AdmissibilityReview,
        )?;
        non_empty(rationale, "admissibility rationale")?;

        self.admissibility = Some(AdmissibilityDecision {
            outcome,
            rationale: rationale.trim().to_string(),
            decided_at: now,
        });

        match outcome {
            AdmissibilityOutcome::Admitted => {
                self.deadlines.defense_due =
                    Some(rules.due_date(DeadlineWindow::Defense, self.filed_at));
                self.phase = ComplaintPhase::AwaitingDefense;
            }
            AdmissibilityOutcome::NotAdmitted => {
                self.archive = Some(ArchiveRecord {
                    reason: ArchiveReason::Inadmissible,
                    archived_at: now,
                    archived_from: ComplaintPhase::AdmissibilityReview,
                });
                self.phase = ComplaintPhase::Archived;
            }
        }

        self.audit.touch(now);
        self.history.append(
            now,
            OperationTag::ConcludeAdmissibilityReview,
            actor,
            format!("complaint {}", outcome.label()),
            self.phase.label(),
        );
        Ok(())
    }

    pub fn notify_for_defense(
        &mut self,
        actor: &ActorId,
        now: DateTime<Utc>,
    ) -> Result<(), DisputeError> {
        expect_phase(self, "notify for defense", ComplaintPhase::AwaitingDefense)?;

        self.defense_notified_at = Some(now);
        self.audit.touch(now);
        self.history.append(
            now,
            OperationTag::NotifyForDefense,
            actor,
            "respondent formally notified",
            self.phase.label(),
        );
        Ok(())
    }

    /// A defense arriving after its window is still accepted; the stored due
    /// date keeps the overdue fact on the record.
    pub fn receive_defense(
        &mut self,
        text: &str,
        actor: &ActorId,
        now: DateTime<Utc>,
    ) -> Result<(), DisputeError> {
        expect_phase(self, "receive defense", ComplaintPhase::AwaitingDefense)?;
        non_empty(text, "defense text")?;

        self.defense = Some(Defense {
            text: text.trim().to_string(),
            received_at: now,
        });
        self.phase = ComplaintPhase::DefenseReceived;
        self.audit.touch(now);
        self.history.append(
            now,
            OperationTag::ReceiveDefense,
            actor,
            "defense submitted by respondent",
            self.phase.label(),
        );
        Ok(())
    }

    pub fn open_evidence_production(
        &mut self,
        rules: &DeadlineRules,
        actor: &ActorId,
        now: DateTime<Utc>,
    ) -> Result<(), DisputeError> {
        expect_phase(
            self,
            "open evidence production",
            ComplaintPhase::DefenseReceived,
        )?;

        self.deadlines.evidence_due = Some(rules.due_date(DeadlineWindow::Evidence, now));
        self.evidence_window = Some(EvidenceWindow {
            opened_at: now,
            closed_at: None,
            closure_cause: None,
        });
        self.phase = ComplaintPhase::EvidenceProduction;
        self.audit.touch(now);
        self.history.append(
            now,
            OperationTag::OpenEvidenceProduction,
            actor,
            "parties may produce evidence",
            self.phase.label(),
        );
        Ok(())
    }

    /// Closing before the due date is permitted; the record keeps whether the
    /// window ran its course or was closed early.
    pub fn close_evidence_production(
        &mut self,
        actor: &ActorId,
        now: DateTime<Utc>,
    ) -> Result<(), DisputeError> {
        expect_phase(
            self,
            "close evidence production",
            ComplaintPhase::EvidenceProduction,
        )?;

        let cause = if is_overdue(self.deadlines.evidence_due, now) {
            EvidenceClosureCause::DeadlineElapsed
        } else {
            EvidenceClosureCause::Manual
        };
        if let Some(window) = self.evidence_window.as_mut() {
            window.closed_at = Some(now);
            window.closure_cause = Some(cause);
        }
        self.phase = ComplaintPhase::InstructionHearing;
        self.audit.touch(now);
        self.history.append(
            now,
            OperationTag::CloseEvidenceProduction,
            actor,
            cause.label(),
            self.phase.label(),
        );
        Ok(())
    }

    /// Schedule (or reschedule, while unrecorded) the instruction hearing.
    pub fn schedule_hearing(
        &mut self,
        date: DateTime<Utc>,
        actor: &ActorId,
        now: DateTime<Utc>,
    ) -> Result<(), DisputeError> {
        expect_phase(self, "schedule hearing", ComplaintPhase::InstructionHearing)?;
        if date <= now {
            return Err(DisputeError::InvalidInput(
                "hearing date must be in the future".to_string(),
            ));
        }

        self.hearing = Some(Hearing {
            scheduled_for: date,
            record: None,
        });
        self.audit.touch(now);
        self.history.append(
            now,
            OperationTag::ScheduleHearing,
            actor,
            format!("hearing set for {date}"),
            self.phase.label(),
        );
        Ok(())
    }

    pub fn record_hearing(
        &mut self,
        summary: &str,
        rules: &DeadlineRules,
        actor: &ActorId,
        now: DateTime<Utc>,
    ) -> Result<(), DisputeError> {
        expect_phase(self, "record hearing", ComplaintPhase::InstructionHearing)?;
        non_empty(summary, "hearing summary")?;
        let hearing = self.hearing.as_mut().ok_or_else(|| {
            DisputeError::InvalidInput("no hearing has been scheduled".to_string())
        })?;

        hearing.record = Some(HearingRecord {
            summary: summary.trim().to_string(),
            recorded_at: now,
        });
        self.deadlines.final_allegations_due =
            Some(rules.due_date(DeadlineWindow::FinalAllegations, now));
        self.phase = ComplaintPhase::FinalAllegations;
        self.audit.touch(now);
        self.history.append(
            now,
            OperationTag::RecordHearing,
            actor,
            "hearing minutes recorded",
            self.phase.label(),
        );
        Ok(())
    }

    pub fn receive_final_allegations(
        &mut self,
        text: &str,
        actor: &ActorId,
        now: DateTime<Utc>,
    ) -> Result<(), DisputeError> {
        expect_phase(
            self,
            "receive final allegations",
            ComplaintPhase::FinalAllegations,
        )?;
        non_empty(text, "final allegations text")?;

        self.final_allegations = Some(FinalAllegations {
            text: text.trim().to_string(),
            received_at: now,
        });
        self.phase = ComplaintPhase::AwaitingJudgment;
        self.audit.touch(now);
        self.history.append(
            now,
            OperationTag::ReceiveFinalAllegations,
            actor,
            "case ready for judgment",
            self.phase.label(),
        );
        Ok(())
    }

    /// First-instance judgment. Requires a designated relator; when the merits
    /// remain appealable the appeal window opens counted from now.
    pub fn judge(
        &mut self,
        decision: MeritsDecision,
        rationale: &str,
        tally: Option<VoteTally>,
        allows_appeal: bool,
        rules: &DeadlineRules,
        actor: &ActorId,
        now: DateTime<Utc>,
    ) -> Result<(), DisputeError> {
        if self.judgment.is_some() {
            return Err(DisputeError::AlreadyDecided("judgment"));
        }
        expect_phase(self, "judge", ComplaintPhase::AwaitingJudgment)?;
        if self.relator.is_none() {
            return Err(DisputeError::Unauthorized(
                "a relator must be designated before judgment",
            ));
        }
        non_empty(rationale, "judgment rationale")?;
        check_tally_mode(self, &tally)?;

        self.judgment = Some(Judgment {
            decision,
            rationale: rationale.trim().to_string(),
            decided_at: now,
            tally,
            allows_appeal,
        });

        if allows_appeal {
            self.deadlines.appeal_due = Some(rules.due_date(DeadlineWindow::Appeal, now));
            self.phase = ComplaintPhase::AwaitingAppeal;
        } else {
            self.phase = ComplaintPhase::Judged;
        }

        self.audit.touch(now);
        self.history.append(
            now,
            OperationTag::Judge,
            actor,
            format!("merits {}", decision.label()),
            self.phase.label(),
        );
        Ok(())
    }

    /// Appeals are hard-gated by the stored due date: a late filing fails,
    /// it is never silently accepted.
    pub fn file_appeal(
        &mut self,
        rationale: &str,
        actor: &ActorId,
        now: DateTime<Utc>,
    ) -> Result<(), DisputeError> {
        expect_phase(self, "file appeal", ComplaintPhase::AwaitingAppeal)?;
        if let Some(due) = self.deadlines.appeal_due {
            if is_overdue(Some(due), now) {
                return Err(DisputeError::DeadlineExpired {
                    window: DeadlineWindow::Appeal.label(),
                    due,
                });
            }
        }
        non_empty(rationale, "appeal fundamentals")?;

        self.appeal = Some(Appeal {
            rationale: rationale.trim().to_string(),
            filed_at: now,
            judgment: None,
        });
        self.phase = ComplaintPhase::AppealFiled;
        self.audit.touch(now);
        self.history.append(
            now,
            OperationTag::FileAppeal,
            actor,
            "second instance requested",
            self.phase.label(),
        );
        Ok(())
    }

    /// Second-instance decision; terminal for the record.
    pub fn judge_appeal(
        &mut self,
        outcome: AppealOutcome,
        rationale: &str,
        tally: Option<VoteTally>,
        actor: &ActorId,
        now: DateTime<Utc>,
    ) -> Result<(), DisputeError> {
        if self
            .appeal
            .as_ref()
            .is_some_and(|appeal| appeal.judgment.is_some())
        {
            return Err(DisputeError::AlreadyDecided("appeal"));
        }
        expect_phase(self, "judge appeal", ComplaintPhase::AppealFiled)?;
        non_empty(rationale, "appeal rationale")?;
        check_tally_mode(self, &tally)?;

        let appeal = self
            .appeal
            .as_mut()
            .ok_or(DisputeError::NotFound("appeal"))?;
        appeal.judgment = Some(AppealJudgment {
            outcome,
            rationale: rationale.trim().to_string(),
            decided_at: now,
            tally,
        });
        self.phase = ComplaintPhase::AppealJudged;
        self.audit.touch(now);
        self.history.append(
            now,
            OperationTag::JudgeAppeal,
            actor,
            outcome.label(),
            self.phase.label(),
        );
        Ok(())
    }

    /// Archive from any non-terminal phase. Re-archiving an archived case is a
    /// no-op success so retried commands stay invisible in the trail. While a
    /// response window is still open only abandonment may close the case.
    pub fn archive(
        &mut self,
        reason: ArchiveReason,
        actor: &ActorId,
        now: DateTime<Utc>,
    ) -> Result<(), DisputeError> {
        if self.phase == ComplaintPhase::Archived {
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
        self.phase = ComplaintPhase::Archived;
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

    /// The only sanctioned backward move: restore the phase held at archive
    /// time. Decisions already on the record stay untouched.
    pub fn reopen(&mut self, actor: &ActorId, now: DateTime<Utc>) -> Result<(), DisputeError> {
        expect_phase(self, "reopen", ComplaintPhase::Archived)?;
        let record = self.archive.take().ok_or(DisputeError::NotFound("archive record"))?;

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

    /// Designate or replace the relator; reassignment is common and goes on
    /// the record. Closed to cases already judged or archived.
    pub fn assign_relator(
        &mut self,
        relator: Relator,
        actor: &ActorId,
        now: DateTime<Utc>,
    ) -> Result<(), DisputeError> {
        if self.judgment.is_some() || self.phase.is_terminal() {
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
        if self.phase == ComplaintPhase::Archived {
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

    /// Witnesses are listed during instruction; past the hearing the roster is
    /// closed.
    pub fn add_witness(
        &mut self,
        name: &str,
        actor: &ActorId,
        now: DateTime<Utc>,
    ) -> Result<(), DisputeError> {
        if self.phase.index() > ComplaintPhase::InstructionHearing.index() {
            return Err(DisputeError::PhaseViolation {
                operation: "add witness",
                phase: self.phase.label(),
            });
        }
        non_empty(name, "witness name")?;

        self.witnesses.push(Witness {
            name: name.trim().to_string(),
            summoned_at: None,
            attendance: None,
        });
        self.audit.touch(now);
        self.history.append(
            now,
            OperationTag::AddWitness,
            actor,
            format!("witness {} listed", name.trim()),
            self.phase.label(),
        );
        Ok(())
    }

    pub fn summon_witness(
        &mut self,
        index: usize,
        actor: &ActorId,
        now: DateTime<Utc>,
    ) -> Result<(), DisputeError> {
        let witness = self
            .witnesses
            .get_mut(index)
            .ok_or(DisputeError::NotFound("witness"))?;

        witness.summoned_at = Some(now);
        let note = format!("witness {} summoned", witness.name);
        self.audit.touch(now);
        self.history.append(
            now,
            OperationTag::SummonWitness,
            actor,
            note,
            self.phase.label(),
        );
        Ok(())
    }

    pub fn record_witness_attendance(
        &mut self,
        index: usize,
        attendance: WitnessAttendance,
        actor: &ActorId,
        now: DateTime<Utc>,
    ) -> Result<(), DisputeError> {
        let witness = self
            .witnesses
            .get_mut(index)
            .ok_or(DisputeError::NotFound("witness"))?;
        if witness.summoned_at.is_none() {
            return Err(DisputeError::InvalidInput(format!(
                "witness {} has not been summoned",
                witness.name
            )));
        }

        witness.attendance = Some(attendance);
        let note = format!(
            "witness {} {}",
            witness.name,
            match attendance {
                WitnessAttendance::Present => "attended",
                WitnessAttendance::Absent => "did not attend",
            }
        );
        self.audit.touch(now);
        self.history.append(
            now,
            OperationTag::RecordWitnessAttendance,
            actor,
            note,
            self.phase.label(),
        );
        Ok(())
    }
}
