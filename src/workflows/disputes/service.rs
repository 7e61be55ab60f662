//! Service facade composing the case aggregates with the storage,
//! notification, document, and clock collaborators.
//!
//! Every mutating operation is load → validate/mutate → versioned save, one
//! logical unit. Validation happens inside the aggregate before any field
//! changes, and the save carries the version read at load time, so nothing
//! partial is ever persisted and a concurrent writer surfaces as a retryable
//! conflict. Notifications go out only after the save succeeded.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Datelike, Utc};
use tracing::warn;

use super::contest::{ContestFiling, ResultContestCase};
use super::deadline::DeadlineRules;
use super::domain::{
    ArchiveReason, Attachment, CaseId, ComplaintCase, ComplaintFiling, DisputeError, DocumentId,
    Party, Relator, WitnessAttendance,
};
use super::history::ActorId;
use super::judgment::{AdmissibilityOutcome, AppealOutcome, MeritsDecision, VoteTally};
use super::repository::{
    Clock, ComplaintRepository, ContestRepository, DisputeNotification, DocumentMetadata,
    DocumentStore, DocumentStoreError, NotificationKind, NotificationPublisher, StorageError,
};

/// Parameters of a first-instance judgment command.
#[derive(Debug, Clone)]
pub struct JudgeCommand {
    pub decision: MeritsDecision,
    pub rationale: String,
    pub tally: Option<VoteTally>,
    pub allows_appeal: bool,
}

/// Parameters of a second-instance (appeal) judgment command.
#[derive(Debug, Clone)]
pub struct JudgeAppealCommand {
    pub outcome: AppealOutcome,
    pub rationale: String,
    pub tally: Option<VoteTally>,
}

/// Error raised by the dispute service.
#[derive(Debug, thiserror::Error)]
pub enum DisputeServiceError {
    #[error(transparent)]
    Dispute(#[from] DisputeError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Document(#[from] DocumentStoreError),
}

pub struct DisputeService<R, S, N, D, C> {
    complaints: Arc<R>,
    contests: Arc<S>,
    notifier: Arc<N>,
    documents: Arc<D>,
    clock: Arc<C>,
    rules: DeadlineRules,
    complaint_sequence: AtomicU64,
    contest_sequence: AtomicU64,
}

impl<R, S, N, D, C> DisputeService<R, S, N, D, C>
where
    R: ComplaintRepository + 'static,
    S: ContestRepository + 'static,
    N: NotificationPublisher + 'static,
    D: DocumentStore + 'static,
    C: Clock + 'static,
{
    pub fn new(
        complaints: Arc<R>,
        contests: Arc<S>,
        notifier: Arc<N>,
        documents: Arc<D>,
        clock: Arc<C>,
        rules: DeadlineRules,
    ) -> Self {
        Self {
            complaints,
            contests,
            notifier,
            documents,
            clock,
            rules,
            complaint_sequence: AtomicU64::new(1),
            contest_sequence: AtomicU64::new(1),
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn rules(&self) -> &DeadlineRules {
        &self.rules
    }

    // --- complaint process -------------------------------------------------

    pub fn file_complaint(
        &self,
        filing: ComplaintFiling,
        actor: &ActorId,
    ) -> Result<ComplaintCase, DisputeServiceError> {
        let now = self.clock.now();
        let sequence = self.complaint_sequence.fetch_add(1, Ordering::Relaxed);
        let id = CaseId(format!("den-{sequence:06}"));
        let protocol = format!("DEN-{}-{sequence:06}", now.year());

        let case = ComplaintCase::file(id, sequence, protocol, filing, actor, now)?;
        let stored = self.complaints.insert(case)?;

        self.notify(&stored.id, NotificationKind::CaseFiled, &stored.protocol);
        Ok(stored)
    }

    pub fn get_complaint(&self, id: &CaseId) -> Result<ComplaintCase, DisputeServiceError> {
        Ok(self.complaints.fetch(id)?.ok_or(StorageError::NotFound)?)
    }

    pub fn begin_admissibility_review(
        &self,
        id: &CaseId,
        actor: &ActorId,
    ) -> Result<ComplaintCase, DisputeServiceError> {
        self.mutate_complaint(id, |case, now| case.begin_admissibility_review(actor, now))
    }

    pub fn conclude_admissibility_review(
        &self,
        id: &CaseId,
        outcome: AdmissibilityOutcome,
        rationale: &str,
        actor: &ActorId,
    ) -> Result<ComplaintCase, DisputeServiceError> {
        let rules = self.rules;
        let stored = self.mutate_complaint(id, |case, now| {
            case.conclude_admissibility_review(outcome, rationale, &rules, actor, now)
        })?;
        self.notify(
            &stored.id,
            NotificationKind::AdmissibilityDecided,
            &stored.protocol,
        );
        Ok(stored)
    }

    pub fn notify_for_defense(
        &self,
        id: &CaseId,
        actor: &ActorId,
    ) -> Result<ComplaintCase, DisputeServiceError> {
        let stored = self.mutate_complaint(id, |case, now| case.notify_for_defense(actor, now))?;
        self.notify(
            &stored.id,
            NotificationKind::DefenseRequested,
            &stored.protocol,
        );
        Ok(stored)
    }

    pub fn receive_defense(
        &self,
        id: &CaseId,
        text: &str,
        actor: &ActorId,
    ) -> Result<ComplaintCase, DisputeServiceError> {
        self.mutate_complaint(id, |case, now| case.receive_defense(text, actor, now))
    }

    pub fn open_evidence_production(
        &self,
        id: &CaseId,
        actor: &ActorId,
    ) -> Result<ComplaintCase, DisputeServiceError> {
        let rules = self.rules;
        self.mutate_complaint(id, |case, now| {
            case.open_evidence_production(&rules, actor, now)
        })
    }

    pub fn close_evidence_production(
        &self,
        id: &CaseId,
        actor: &ActorId,
    ) -> Result<ComplaintCase, DisputeServiceError> {
        self.mutate_complaint(id, |case, now| case.close_evidence_production(actor, now))
    }

    pub fn schedule_hearing(
        &self,
        id: &CaseId,
        date: DateTime<Utc>,
        actor: &ActorId,
    ) -> Result<ComplaintCase, DisputeServiceError> {
        let stored = self.mutate_complaint(id, |case, now| case.schedule_hearing(date, actor, now))?;
        self.notify(
            &stored.id,
            NotificationKind::HearingScheduled,
            &stored.protocol,
        );
        Ok(stored)
    }

    pub fn record_hearing(
        &self,
        id: &CaseId,
        summary: &str,
        actor: &ActorId,
    ) -> Result<ComplaintCase, DisputeServiceError> {
        let rules = self.rules;
        self.mutate_complaint(id, |case, now| {
            case.record_hearing(summary, &rules, actor, now)
        })
    }

    pub fn receive_final_allegations(
        &self,
        id: &CaseId,
        text: &str,
        actor: &ActorId,
    ) -> Result<ComplaintCase, DisputeServiceError> {
        self.mutate_complaint(id, |case, now| {
            case.receive_final_allegations(text, actor, now)
        })
    }

    pub fn judge(
        &self,
        id: &CaseId,
        command: JudgeCommand,
        actor: &ActorId,
    ) -> Result<ComplaintCase, DisputeServiceError> {
        let rules = self.rules;
        let stored = self.mutate_complaint(id, |case, now| {
            case.judge(
                command.decision,
                &command.rationale,
                command.tally,
                command.allows_appeal,
                &rules,
                actor,
                now,
            )
        })?;
        self.notify(&stored.id, NotificationKind::Judged, &stored.protocol);
        Ok(stored)
    }

    pub fn file_appeal(
        &self,
        id: &CaseId,
        rationale: &str,
        actor: &ActorId,
    ) -> Result<ComplaintCase, DisputeServiceError> {
        let stored = self.mutate_complaint(id, |case, now| case.file_appeal(rationale, actor, now))?;
        self.notify(&stored.id, NotificationKind::AppealFiled, &stored.protocol);
        Ok(stored)
    }

    pub fn judge_appeal(
        &self,
        id: &CaseId,
        command: JudgeAppealCommand,
        actor: &ActorId,
    ) -> Result<ComplaintCase, DisputeServiceError> {
        let stored = self.mutate_complaint(id, |case, now| {
            case.judge_appeal(command.outcome, &command.rationale, command.tally, actor, now)
        })?;
        self.notify(&stored.id, NotificationKind::AppealJudged, &stored.protocol);
        Ok(stored)
    }

    pub fn archive_complaint(
        &self,
        id: &CaseId,
        reason: ArchiveReason,
        actor: &ActorId,
    ) -> Result<ComplaintCase, DisputeServiceError> {
        let stored = self.mutate_complaint(id, |case, now| case.archive(reason, actor, now))?;
        self.notify(&stored.id, NotificationKind::Archived, &stored.protocol);
        Ok(stored)
    }

    pub fn reopen_complaint(
        &self,
        id: &CaseId,
        actor: &ActorId,
    ) -> Result<ComplaintCase, DisputeServiceError> {
        self.mutate_complaint(id, |case, now| case.reopen(actor, now))
    }

    pub fn assign_relator(
        &self,
        id: &CaseId,
        relator: Relator,
        actor: &ActorId,
    ) -> Result<ComplaintCase, DisputeServiceError> {
        self.mutate_complaint(id, |case, now| case.assign_relator(relator, actor, now))
    }

    pub fn add_witness(
        &self,
        id: &CaseId,
        name: &str,
        actor: &ActorId,
    ) -> Result<ComplaintCase, DisputeServiceError> {
        self.mutate_complaint(id, |case, now| case.add_witness(name, actor, now))
    }

    pub fn summon_witness(
        &self,
        id: &CaseId,
        index: usize,
        actor: &ActorId,
    ) -> Result<ComplaintCase, DisputeServiceError> {
        self.mutate_complaint(id, |case, now| case.summon_witness(index, actor, now))
    }

    pub fn record_witness_attendance(
        &self,
        id: &CaseId,
        index: usize,
        attendance: WitnessAttendance,
        actor: &ActorId,
    ) -> Result<ComplaintCase, DisputeServiceError> {
        self.mutate_complaint(id, |case, now| {
            case.record_witness_attendance(index, attendance, actor, now)
        })
    }

    /// Store the document bytes first so the attachment can reference a
    /// durable id, then record it on the case.
    pub fn attach_complaint_document(
        &self,
        id: &CaseId,
        metadata: DocumentMetadata,
        bytes: Vec<u8>,
        actor: &ActorId,
    ) -> Result<ComplaintCase, DisputeServiceError> {
        let document_id = self.documents.store(id, &metadata, bytes)?;
        self.mutate_complaint(id, |case, now| {
            case.attach_document(
                Attachment {
                    document_id,
                    name: metadata.name.clone(),
                    category: metadata.category,
                    uploaded_by: actor.clone(),
                    uploaded_at: now,
                },
                actor,
                now,
            )
        })
    }

    // --- result-contest process --------------------------------------------

    pub fn file_contest(
        &self,
        filing: ContestFiling,
        actor: &ActorId,
    ) -> Result<ResultContestCase, DisputeServiceError> {
        let now = self.clock.now();
        let sequence = self.contest_sequence.fetch_add(1, Ordering::Relaxed);
        let id = CaseId(format!("imp-{sequence:06}"));
        let protocol = format!("IMP-{}-{sequence:06}", now.year());

        let case = ResultContestCase::file(id, sequence, protocol, filing, actor, now)?;
        let stored = self.contests.insert(case)?;

        self.notify(&stored.id, NotificationKind::CaseFiled, &stored.protocol);
        Ok(stored)
    }

    pub fn get_contest(&self, id: &CaseId) -> Result<ResultContestCase, DisputeServiceError> {
        Ok(self.contests.fetch(id)?.ok_or(StorageError::NotFound)?)
    }

    pub fn open_allegations(
        &self,
        id: &CaseId,
        actor: &ActorId,
    ) -> Result<ResultContestCase, DisputeServiceError> {
        let rules = self.rules;
        self.mutate_contest(id, |case, now| case.open_allegations(&rules, actor, now))
    }

    pub fn submit_allegation(
        &self,
        id: &CaseId,
        author: Party,
        text: &str,
        actor: &ActorId,
    ) -> Result<ResultContestCase, DisputeServiceError> {
        self.mutate_contest(id, |case, now| {
            case.submit_allegation(author, text, actor, now)
        })
    }

    pub fn judge_allegations(
        &self,
        id: &CaseId,
        decision: MeritsDecision,
        rationale: &str,
        tally: Option<VoteTally>,
        actor: &ActorId,
    ) -> Result<ResultContestCase, DisputeServiceError> {
        let rules = self.rules;
        let stored = self.mutate_contest(id, |case, now| {
            case.judge_allegations(decision, rationale, tally, &rules, actor, now)
        })?;
        self.notify(
            &stored.id,
            NotificationKind::AllegationsJudged,
            &stored.protocol,
        );
        Ok(stored)
    }

    pub fn file_recourse(
        &self,
        id: &CaseId,
        rationale: &str,
        actor: &ActorId,
    ) -> Result<ResultContestCase, DisputeServiceError> {
        self.mutate_contest(id, |case, now| case.file_recourse(rationale, actor, now))
    }

    pub fn open_counter_allegations(
        &self,
        id: &CaseId,
        actor: &ActorId,
    ) -> Result<ResultContestCase, DisputeServiceError> {
        let rules = self.rules;
        self.mutate_contest(id, |case, now| {
            case.open_counter_allegations(&rules, actor, now)
        })
    }

    pub fn submit_counter_allegation(
        &self,
        id: &CaseId,
        author: Party,
        text: &str,
        actor: &ActorId,
    ) -> Result<ResultContestCase, DisputeServiceError> {
        self.mutate_contest(id, |case, now| {
            case.submit_counter_allegation(author, text, actor, now)
        })
    }

    pub fn judge_recourse(
        &self,
        id: &CaseId,
        decision: MeritsDecision,
        rationale: &str,
        tally: Option<VoteTally>,
        actor: &ActorId,
    ) -> Result<ResultContestCase, DisputeServiceError> {
        let stored = self.mutate_contest(id, |case, now| {
            case.judge_recourse(decision, rationale, tally, actor, now)
        })?;
        self.notify(
            &stored.id,
            NotificationKind::RecourseJudged,
            &stored.protocol,
        );
        Ok(stored)
    }

    pub fn finalize_without_recourse(
        &self,
        id: &CaseId,
        actor: &ActorId,
    ) -> Result<ResultContestCase, DisputeServiceError> {
        self.mutate_contest(id, |case, now| case.finalize_without_recourse(actor, now))
    }

    pub fn archive_contest(
        &self,
        id: &CaseId,
        reason: ArchiveReason,
        actor: &ActorId,
    ) -> Result<ResultContestCase, DisputeServiceError> {
        let stored = self.mutate_contest(id, |case, now| case.archive(reason, actor, now))?;
        self.notify(&stored.id, NotificationKind::Archived, &stored.protocol);
        Ok(stored)
    }

    pub fn reopen_contest(
        &self,
        id: &CaseId,
        actor: &ActorId,
    ) -> Result<ResultContestCase, DisputeServiceError> {
        self.mutate_contest(id, |case, now| case.reopen(actor, now))
    }

    pub fn assign_contest_relator(
        &self,
        id: &CaseId,
        relator: Relator,
        actor: &ActorId,
    ) -> Result<ResultContestCase, DisputeServiceError> {
        self.mutate_contest(id, |case, now| case.assign_relator(relator, actor, now))
    }

    pub fn attach_contest_document(
        &self,
        id: &CaseId,
        metadata: DocumentMetadata,
        bytes: Vec<u8>,
        actor: &ActorId,
    ) -> Result<ResultContestCase, DisputeServiceError> {
        let document_id = self.documents.store(id, &metadata, bytes)?;
        self.mutate_contest(id, |case, now| {
            case.attach_document(
                Attachment {
                    document_id,
                    name: metadata.name.clone(),
                    category: metadata.category,
                    uploaded_by: actor.clone(),
                    uploaded_at: now,
                },
                actor,
                now,
            )
        })
    }

    pub fn fetch_document(&self, id: &DocumentId) -> Result<Vec<u8>, DisputeServiceError> {
        Ok(self.documents.fetch(id)?)
    }

    // --- internals ----------------------------------------------------------

    fn mutate_complaint<F>(&self, id: &CaseId, mutate: F) -> Result<ComplaintCase, DisputeServiceError>
    where
        F: FnOnce(&mut ComplaintCase, DateTime<Utc>) -> Result<(), DisputeError>,
    {
        let mut case = self.complaints.fetch(id)?.ok_or(StorageError::NotFound)?;
        let expected = case.version;
        let now = self.clock.now();
        mutate(&mut case, now)?;
        Ok(self.complaints.save(case, expected)?)
    }

    fn mutate_contest<F>(
        &self,
        id: &CaseId,
        mutate: F,
    ) -> Result<ResultContestCase, DisputeServiceError>
    where
        F: FnOnce(&mut ResultContestCase, DateTime<Utc>) -> Result<(), DisputeError>,
    {
        let mut case = self.contests.fetch(id)?.ok_or(StorageError::NotFound)?;
        let expected = case.version;
        let now = self.clock.now();
        mutate(&mut case, now)?;
        Ok(self.contests.save(case, expected)?)
    }

    fn notify(&self, case_id: &CaseId, kind: NotificationKind, protocol: &str) {
        let mut details = BTreeMap::new();
        details.insert("protocol".to_string(), protocol.to_string());
        let notification = DisputeNotification {
            case_id: case_id.clone(),
            kind,
            details,
        };
        if let Err(error) = self.notifier.publish(notification) {
            warn!(case = %case_id.0, kind = kind.label(), %error, "notification dispatch failed");
        }
    }
}
