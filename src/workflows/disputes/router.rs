//! HTTP surface for the dispute workflows: one endpoint per engine operation,
//! JSON in, case summary out, with the error taxonomy mapped onto status
//! codes (conflict for phase/decision violations, unprocessable for bad input
//! or lapsed windows, forbidden for structural authorization failures).

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;

use super::contest::{ContestFiling, ResultContestCase};
use super::domain::{
    ArchiveReason, AttachmentCategory, CaseId, ComplaintCase, ComplaintFiling, DecisionMode,
    DisputeError, Party, Relator, Respondent, WitnessAttendance,
};
use super::history::ActorId;
use super::judgment::{AdmissibilityOutcome, AppealOutcome, MeritsDecision, VoteTally};
use super::repository::{
    Clock, ComplaintRepository, ContestRepository, DocumentMetadata, DocumentStore,
    DocumentStoreError, NotificationPublisher, StorageError,
};
use super::service::{DisputeService, DisputeServiceError, JudgeAppealCommand, JudgeCommand};

type Service<R, S, N, D, C> = Arc<DisputeService<R, S, N, D, C>>;

/// Router builder exposing the dispute operations.
pub fn dispute_router<R, S, N, D, C>(service: Service<R, S, N, D, C>) -> Router
where
    R: ComplaintRepository + 'static,
    S: ContestRepository + 'static,
    N: NotificationPublisher + 'static,
    D: DocumentStore + 'static,
    C: Clock + 'static,
{
    Router::new()
        .route(
            "/api/v1/disputes/complaints",
            post(file_complaint::<R, S, N, D, C>),
        )
        .route(
            "/api/v1/disputes/complaints/:id",
            get(get_complaint::<R, S, N, D, C>),
        )
        .route(
            "/api/v1/disputes/complaints/:id/admissibility/begin",
            post(begin_admissibility::<R, S, N, D, C>),
        )
        .route(
            "/api/v1/disputes/complaints/:id/admissibility/conclude",
            post(conclude_admissibility::<R, S, N, D, C>),
        )
        .route(
            "/api/v1/disputes/complaints/:id/defense/notify",
            post(notify_for_defense::<R, S, N, D, C>),
        )
        .route(
            "/api/v1/disputes/complaints/:id/defense",
            post(receive_defense::<R, S, N, D, C>),
        )
        .route(
            "/api/v1/disputes/complaints/:id/evidence/open",
            post(open_evidence::<R, S, N, D, C>),
        )
        .route(
            "/api/v1/disputes/complaints/:id/evidence/close",
            post(close_evidence::<R, S, N, D, C>),
        )
        .route(
            "/api/v1/disputes/complaints/:id/hearing/schedule",
            post(schedule_hearing::<R, S, N, D, C>),
        )
        .route(
            "/api/v1/disputes/complaints/:id/hearing/record",
            post(record_hearing::<R, S, N, D, C>),
        )
        .route(
            "/api/v1/disputes/complaints/:id/final-allegations",
            post(receive_final_allegations::<R, S, N, D, C>),
        )
        .route(
            "/api/v1/disputes/complaints/:id/judgment",
            post(judge::<R, S, N, D, C>),
        )
        .route(
            "/api/v1/disputes/complaints/:id/appeal",
            post(file_appeal::<R, S, N, D, C>),
        )
        .route(
            "/api/v1/disputes/complaints/:id/appeal/judgment",
            post(judge_appeal::<R, S, N, D, C>),
        )
        .route(
            "/api/v1/disputes/complaints/:id/archive",
            post(archive_complaint::<R, S, N, D, C>),
        )
        .route(
            "/api/v1/disputes/complaints/:id/reopen",
            post(reopen_complaint::<R, S, N, D, C>),
        )
        .route(
            "/api/v1/disputes/complaints/:id/relator",
            post(assign_relator::<R, S, N, D, C>),
        )
        .route(
            "/api/v1/disputes/complaints/:id/witnesses",
            post(add_witness::<R, S, N, D, C>),
        )
        .route(
            "/api/v1/disputes/complaints/:id/witnesses/summon",
            post(summon_witness::<R, S, N, D, C>),
        )
        .route(
            "/api/v1/disputes/complaints/:id/witnesses/attendance",
            post(record_witness_attendance::<R, S, N, D, C>),
        )
        .route(
            "/api/v1/disputes/complaints/:id/documents",
            post(attach_complaint_document::<R, S, N, D, C>),
        )
        .route(
            "/api/v1/disputes/contests",
            post(file_contest::<R, S, N, D, C>),
        )
        .route(
            "/api/v1/disputes/contests/:id",
            get(get_contest::<R, S, N, D, C>),
        )
        .route(
            "/api/v1/disputes/contests/:id/allegations/open",
            post(open_allegations::<R, S, N, D, C>),
        )
        .route(
            "/api/v1/disputes/contests/:id/allegations",
            post(submit_allegation::<R, S, N, D, C>),
        )
        .route(
            "/api/v1/disputes/contests/:id/allegations/judgment",
            post(judge_allegations::<R, S, N, D, C>),
        )
        .route(
            "/api/v1/disputes/contests/:id/recourse",
            post(file_recourse::<R, S, N, D, C>),
        )
        .route(
            "/api/v1/disputes/contests/:id/counter-allegations/open",
            post(open_counter_allegations::<R, S, N, D, C>),
        )
        .route(
            "/api/v1/disputes/contests/:id/counter-allegations",
            post(submit_counter_allegation::<R, S, N, D, C>),
        )
        .route(
            "/api/v1/disputes/contests/:id/recourse/judgment",
            post(judge_recourse::<R, S, N, D, C>),
        )
        .route(
            "/api/v1/disputes/contests/:id/finalize",
            post(finalize_without_recourse::<R, S, N, D, C>),
        )
        .route(
            "/api/v1/disputes/contests/:id/archive",
            post(archive_contest::<R, S, N, D, C>),
        )
        .route(
            "/api/v1/disputes/contests/:id/reopen",
            post(reopen_contest::<R, S, N, D, C>),
        )
        .route(
            "/api/v1/disputes/contests/:id/relator",
            post(assign_contest_relator::<R, S, N, D, C>),
        )
        .route(
            "/api/v1/disputes/contests/:id/documents",
            post(attach_contest_document::<R, S, N, D, C>),
        )
        .with_state(service)
}

// --- request payloads -------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct ActorBody {
    actor: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FileComplaintRequest {
    actor: String,
    filer: Party,
    respondent: Respondent,
    description: String,
    #[serde(default)]
    confidential: bool,
    decision_mode: DecisionMode,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ConcludeAdmissibilityRequest {
    actor: String,
    admissible: bool,
    rationale: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TextBody {
    actor: String,
    text: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ScheduleHearingRequest {
    actor: String,
    /// RFC 3339; offsets are normalized to UTC during deserialization.
    date: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RecordHearingRequest {
    actor: String,
    summary: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TallyRequest {
    favor: u8,
    against: u8,
    abstention: u8,
    recused: u8,
    quorum_present: u8,
}

impl TallyRequest {
    fn into_tally(self) -> Result<VoteTally, DisputeError> {
        VoteTally::new(
            self.favor,
            self.against,
            self.abstention,
            self.recused,
            self.quorum_present,
        )
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct JudgeRequest {
    actor: String,
    decision: MeritsDecision,
    rationale: String,
    tally: Option<TallyRequest>,
    #[serde(default)]
    allows_appeal: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AppealRequest {
    actor: String,
    rationale: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct JudgeAppealRequest {
    actor: String,
    outcome: AppealOutcome,
    rationale: String,
    tally: Option<TallyRequest>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ArchiveRequest {
    actor: String,
    reason: ArchiveReason,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RelatorRequest {
    actor: String,
    registration: String,
    name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WitnessRequest {
    actor: String,
    name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WitnessIndexRequest {
    actor: String,
    index: usize,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WitnessAttendanceRequest {
    actor: String,
    index: usize,
    attendance: WitnessAttendance,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AttachmentRequest {
    actor: String,
    name: String,
    category: AttachmentCategory,
    content_type: String,
    content: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FileContestRequest {
    actor: String,
    contestant: Party,
    contested_result: String,
    description: String,
    #[serde(default)]
    confidential: bool,
    decision_mode: DecisionMode,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AllegationRequest {
    actor: String,
    author: Party,
    text: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ContestJudgeRequest {
    actor: String,
    decision: MeritsDecision,
    rationale: String,
    tally: Option<TallyRequest>,
}

// --- response plumbing ------------------------------------------------------

fn error_response(error: DisputeServiceError) -> Response {
    let (status, retryable) = match &error {
        DisputeServiceError::Dispute(dispute) => match dispute {
            DisputeError::PhaseViolation { .. } | DisputeError::AlreadyDecided(_) => {
                (StatusCode::CONFLICT, false)
            }
            DisputeError::DeadlineExpired { .. } | DisputeError::InvalidInput(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, false)
            }
            DisputeError::Unauthorized(_) => (StatusCode::FORBIDDEN, false),
            DisputeError::NotFound(_) => (StatusCode::NOT_FOUND, false),
        },
        DisputeServiceError::Storage(storage) => match storage {
            StorageError::NotFound => (StatusCode::NOT_FOUND, false),
            StorageError::Conflict => (StatusCode::CONFLICT, false),
            StorageError::VersionConflict => (StatusCode::CONFLICT, true),
            StorageError::Unavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, true),
        },
        DisputeServiceError::Document(document) => match document {
            DocumentStoreError::NotFound => (StatusCode::NOT_FOUND, false),
            DocumentStoreError::Unavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, true),
        },
    };

    let payload = json!({
        "error": error.to_string(),
        "retryable": retryable,
    });
    (status, Json(payload)).into_response()
}

fn tally_from(request: Option<TallyRequest>) -> Result<Option<VoteTally>, DisputeServiceError> {
    request
        .map(TallyRequest::into_tally)
        .transpose()
        .map_err(DisputeServiceError::from)
}

// --- complaint handlers -----------------------------------------------------

async fn file_complaint<R, S, N, D, C>(
    State(service): State<Service<R, S, N, D, C>>,
    Json(request): Json<FileComplaintRequest>,
) -> Response
where
    R: ComplaintRepository + 'static,
    S: ContestRepository + 'static,
    N: NotificationPublisher + 'static,
    D: DocumentStore + 'static,
    C: Clock + 'static,
{
    let actor = ActorId(request.actor);
    let filing = ComplaintFiling {
        filer: request.filer,
        respondent: request.respondent,
        description: request.description,
        confidential: request.confidential,
        decision_mode: request.decision_mode,
    };
    match service.file_complaint(filing, &actor) {
        Ok(case) => {
            let summary = case.summary(service.now());
            (StatusCode::CREATED, Json(summary)).into_response()
        }
        Err(error) => error_response(error),
    }
}

async fn get_complaint<R, S, N, D, C>(
    State(service): State<Service<R, S, N, D, C>>,
    Path(id): Path<String>,
) -> Response
where
    R: ComplaintRepository + 'static,
    S: ContestRepository + 'static,
    N: NotificationPublisher + 'static,
    D: DocumentStore + 'static,
    C: Clock + 'static,
{
    match service.get_complaint(&CaseId(id)) {
        Ok(case) => {
            let summary = case.summary(service.now());
            (StatusCode::OK, Json(summary)).into_response()
        }
        Err(error) => error_response(error),
    }
}

async fn begin_admissibility<R, S, N, D, C>(
    State(service): State<Service<R, S, N, D, C>>,
    Path(id): Path<String>,
    Json(request): Json<ActorBody>,
) -> Response
where
    R: ComplaintRepository + 'static,
    S: ContestRepository + 'static,
    N: NotificationPublisher + 'static,
    D: DocumentStore + 'static,
    C: Clock + 'static,
{
    respond_complaint(
        &service,
        service.begin_admissibility_review(&CaseId(id), &ActorId(request.actor)),
    )
}

async fn conclude_admissibility<R, S, N, D, C>(
    State(service): State<Service<R, S, N, D, C>>,
    Path(id): Path<String>,
    Json(request): Json<ConcludeAdmissibilityRequest>,
) -> Response
where
    R: ComplaintRepository + 'static,
    S: ContestRepository + 'static,
    N: NotificationPublisher + 'static,
    D: DocumentStore + 'static,
    C: Clock + 'static,
{
    let outcome = if request.admissible {
        AdmissibilityOutcome::Admitted
    } else {
        AdmissibilityOutcome::NotAdmitted
    };
    respond_complaint(
        &service,
        service.conclude_admissibility_review(
            &CaseId(id),
            outcome,
            &request.rationale,
            &ActorId(request.actor),
        ),
    )
}

async fn notify_for_defense<R, S, N, D, C>(
    State(service): State<Service<R, S, N, D, C>>,
    Path(id): Path<String>,
    Json(request): Json<ActorBody>,
) -> Response
where
    R: ComplaintRepository + 'static,
    S: ContestRepository + 'static,
    N: NotificationPublisher + 'static,
    D: DocumentStore + 'static,
    C: Clock + 'static,
{
    respond_complaint(
        &service,
        service.notify_for_defense(&CaseId(id), &ActorId(request.actor)),
    )
}

async fn receive_defense<R, S, N, D, C>(
    State(service): State<Service<R, S, N, D, C>>,
    Path(id): Path<String>,
    Json(request): Json<TextBody>,
) -> Response
where
    R: ComplaintRepository + 'static,
    S: ContestRepository + 'static,
    N: NotificationPublisher + 'static,
    D: DocumentStore + 'static,
    C: Clock + 'static,
{
    respond_complaint(
        &service,
        service.receive_defense(&CaseId(id), &request.text, &ActorId(request.actor)),
    )
}

async fn open_evidence<R, S, N, D, C>(
    State(service): State<Service<R, S, N, D, C>>,
    Path(id): Path<String>,
    Json(request): Json<ActorBody>,
) -> Response
where
    R: ComplaintRepository + 'static,
    S: ContestRepository + 'static,
    N: NotificationPublisher + 'static,
    D: DocumentStore + 'static,
    C: Clock + 'static,
{
    respond_complaint(
        &service,
        service.open_evidence_production(&CaseId(id), &ActorId(request.actor)),
    )
}

async fn close_evidence<R, S, N, D, C>(
    State(service): State<Service<R, S, N, D, C>>,
    Path(id): Path<String>,
    Json(request): Json<ActorBody>,
) -> Response
where
    R: ComplaintRepository + 'static,
    S: ContestRepository + 'static,
    N: NotificationPublisher + 'static,
    D: DocumentStore + 'static,
    C: Clock + 'static,
{
    respond_complaint(
        &service,
        service.close_evidence_production(&CaseId(id), &ActorId(request.actor)),
    )
}

async fn schedule_hearing<R, S, N, D, C>(
    State(service): State<Service<R, S, N, D, C>>,
    Path(id): Path<String>,
    Json(request): Json<ScheduleHearingRequest>,
) -> Response
where
    R: ComplaintRepository + 'static,
    S: ContestRepository + 'static,
    N: NotificationPublisher + 'static,
    D: DocumentStore + 'static,
    C: Clock + 'static,
{
    respond_complaint(
        &service,
        service.schedule_hearing(&CaseId(id), request.date, &ActorId(request.actor)),
    )
}

async fn record_hearing<R, S, N, D, C>(
    State(service): State<Service<R, S, N, D, C>>,
    Path(id): Path<String>,
    Json(request): Json<RecordHearingRequest>,
) -> Response
where
    R: ComplaintRepository + 'static,
    S: ContestRepository + 'static,
    N: NotificationPublisher + 'static,
    D: DocumentStore + 'static,
    C: Clock + 'static,
{
    respond_complaint(
        &service,
        service.record_hearing(&CaseId(id), &request.summary, &ActorId(request.actor)),
    )
}

async fn receive_final_allegations<R, S, N, D, C>(
    State(service): State<Service<R, S, N, D, C>>,
    Path(id): Path<String>,
    Json(request): Json<TextBody>,
) -> Response
where
    R: ComplaintRepository + 'static,
    S: ContestRepository + 'static,
    N: NotificationPublisher + 'static,
    D: DocumentStore + 'static,
    C: Clock + 'static,
{
    respond_complaint(
        &service,
        service.receive_final_allegations(&CaseId(id), &request.text, &ActorId(request.actor)),
    )
}

async fn judge<R, S, N, D, C>(
    State(service): State<Service<R, S, N, D, C>>,
    Path(id): Path<String>,
    Json(request): Json<JudgeRequest>,
) -> Response
where
    R: ComplaintRepository + 'static,
    S: ContestRepository + 'static,
    N: NotificationPublisher + 'static,
    D: DocumentStore + 'static,
    C: Clock + 'static,
{
    let tally = match tally_from(request.tally) {
        Ok(tally) => tally,
        Err(error) => return error_response(error),
    };
    let command = JudgeCommand {
        decision: request.decision,
        rationale: request.rationale,
        tally,
        allows_appeal: request.allows_appeal,
    };
    respond_complaint(
        &service,
        service.judge(&CaseId(id), command, &ActorId(request.actor)),
    )
}

async fn file_appeal<R, S, N, D, C>(
    State(service): State<Service<R, S, N, D, C>>,
    Path(id): Path<String>,
    Json(request): Json<AppealRequest>,
) -> Response
where
    R: ComplaintRepository + 'static,
    S: ContestRepository + 'static,
    N: NotificationPublisher + 'static,
    D: DocumentStore + 'static,
    C: Clock + 'static,
{
    respond_complaint(
        &service,
        service.file_appeal(&CaseId(id), &request.rationale, &ActorId(request.actor)),
    )
}

async fn judge_appeal<R, S, N, D, C>(
    State(service): State<Service<R, S, N, D, C>>,
    Path(id): Path<String>,
    Json(request): Json<JudgeAppealRequest>,
) -> Response
where
    R: ComplaintRepository + 'static,
    S: ContestRepository + 'static,
    N: NotificationPublisher + 'static,
    D: DocumentStore + 'static,
    C: Clock + 'static,
{
    let tally = match tally_from(request.tally) {
        Ok(tally) => tally,
        Err(error) => return error_response(error),
    };
    let command = JudgeAppealCommand {
        outcome: request.outcome,
        rationale: request.rationale,
        tally,
    };
    respond_complaint(
        &service,
        service.judge_appeal(&CaseId(id), command, &ActorId(request.actor)),
    )
}

async fn archive_complaint<R, S, N, D, C>(
    State(service): State<Service<R, S, N, D, C>>,
    Path(id): Path<String>,
    Json(request): Json<ArchiveRequest>,
) -> Response
where
    R: ComplaintRepository + 'static,
    S: ContestRepository + 'static,
    N: NotificationPublisher + 'static,
    D: DocumentStore + 'static,
    C: Clock + 'static,
{
    respond_complaint(
        &service,
        service.archive_complaint(&CaseId(id), request.reason, &ActorId(request.actor)),
    )
}

async fn reopen_complaint<R, S, N, D, C>(
    State(service): State<Service<R, S, N, D, C>>,
    Path(id): Path<String>,
    Json(request): Json<ActorBody>,
) -> Response
where
    R: ComplaintRepository + 'static,
    S: ContestRepository + 'static,
    N: NotificationPublisher + 'static,
    D: DocumentStore + 'static,
    C: Clock + 'static,
{
    respond_complaint(
        &service,
        service.reopen_complaint(&CaseId(id), &ActorId(request.actor)),
    )
}

async fn assign_relator<R, S, N, D, C>(
    State(service): State<Service<R, S, N, D, C>>,
    Path(id): Path<String>,
    Json(request): Json<RelatorRequest>,
) -> Response
where
    R: ComplaintRepository + 'static,
    S: ContestRepository + 'static,
    N: NotificationPublisher + 'static,
    D: DocumentStore + 'static,
    C: Clock + 'static,
{
    let relator = Relator {
        registration: request.registration,
        name: request.name,
    };
    respond_complaint(
        &service,
        service.assign_relator(&CaseId(id), relator, &ActorId(request.actor)),
    )
}

async fn add_witness<R, S, N, D, C>(
    State(service): State<Service<R, S, N, D, C>>,
    Path(id): Path<String>,
    Json(request): Json<WitnessRequest>,
) -> Response
where
    R: ComplaintRepository + 'static,
    S: ContestRepository + 'static,
    N: NotificationPublisher + 'static,
    D: DocumentStore + 'static,
    C: Clock + 'static,
{
    respond_complaint(
        &service,
        service.add_witness(&CaseId(id), &request.name, &ActorId(request.actor)),
    )
}

async fn summon_witness<R, S, N, D, C>(
    State(service): State<Service<R, S, N, D, C>>,
    Path(id): Path<String>,
    Json(request): Json<WitnessIndexRequest>,
) -> Response
where
    R: ComplaintRepository + 'static,
    S: ContestRepository + 'static,
    N: NotificationPublisher + 'static,
    D: DocumentStore + 'static,
    C: Clock + 'static,
{
    respond_complaint(
        &service,
        service.summon_witness(&CaseId(id), request.index, &ActorId(request.actor)),
    )
}

async fn record_witness_attendance<R, S, N, D, C>(
    State(service): State<Service<R, S, N, D, C>>,
    Path(id): Path<String>,
    Json(request): Json<WitnessAttendanceRequest>,
) -> Response
where
    R: ComplaintRepository + 'static,
    S: ContestRepository + 'static,
    N: NotificationPublisher + 'static,
    D: DocumentStore + 'static,
    C: Clock + 'static,
{
    respond_complaint(
        &service,
        service.record_witness_attendance(
            &CaseId(id),
            request.index,
            request.attendance,
            &ActorId(request.actor),
        ),
    )
}

async fn attach_complaint_document<R, S, N, D, C>(
    State(service): State<Service<R, S, N, D, C>>,
    Path(id): Path<String>,
    Json(request): Json<AttachmentRequest>,
) -> Response
where
    R: ComplaintRepository + 'static,
    S: ContestRepository + 'static,
    N: NotificationPublisher + 'static,
    D: DocumentStore + 'static,
    C: Clock + 'static,
{
    let metadata = DocumentMetadata {
        name: request.name,
        category: request.category,
        content_type: request.content_type,
    };
    respond_complaint(
        &service,
        service.attach_complaint_document(
            &CaseId(id),
            metadata,
            request.content.into_bytes(),
            &ActorId(request.actor),
        ),
    )
}

// --- contest handlers -------------------------------------------------------

async fn file_contest<R, S, N, D, C>(
    State(service): State<Service<R, S, N, D, C>>,
    Json(request): Json<FileContestRequest>,
) -> Response
where
    R: ComplaintRepository + 'static,
    S: ContestRepository + 'static,
    N: NotificationPublisher + 'static,
    D: DocumentStore + 'static,
    C: Clock + 'static,
{
    let actor = ActorId(request.actor);
    let filing = ContestFiling {
        contestant: request.contestant,
        contested_result: request.contested_result,
        description: request.description,
        confidential: request.confidential,
        decision_mode: request.decision_mode,
    };
    match service.file_contest(filing, &actor) {
        Ok(case) => {
            let summary = case.summary(service.now());
            (StatusCode::CREATED, Json(summary)).into_response()
        }
        Err(error) => error_response(error),
    }
}

async fn get_contest<R, S, N, D, C>(
    State(service): State<Service<R, S, N, D, C>>,
    Path(id): Path<String>,
) -> Response
where
    R: ComplaintRepository + 'static,
    S: ContestRepository + 'static,
    N: NotificationPublisher + 'static,
    D: DocumentStore + 'static,
    C: Clock + 'static,
{
    respond_contest(&service, service.get_contest(&CaseId(id)))
}

async fn open_allegations<R, S, N, D, C>(
    State(service): State<Service<R, S, N, D, C>>,
    Path(id): Path<String>,
    Json(request): Json<ActorBody>,
) -> Response
where
    R: ComplaintRepository + 'static,
    S: ContestRepository + 'static,
    N: NotificationPublisher + 'static,
    D: DocumentStore + 'static,
    C: Clock + 'static,
{
    respond_contest(
        &service,
        service.open_allegations(&CaseId(id), &ActorId(request.actor)),
    )
}

async fn submit_allegation<R, S, N, D, C>(
    State(service): State<Service<R, S, N, D, C>>,
    Path(id): Path<String>,
    Json(request): Json<AllegationRequest>,
) -> Response
where
    R: ComplaintRepository + 'static,
    S: ContestRepository + 'static,
    N: NotificationPublisher + 'static,
    D: DocumentStore + 'static,
    C: Clock + 'static,
{
    respond_contest(
        &service,
        service.submit_allegation(
            &CaseId(id),
            request.author,
            &request.text,
            &ActorId(request.actor),
        ),
    )
}

async fn judge_allegations<R, S, N, D, C>(
    State(service): State<Service<R, S, N, D, C>>,
    Path(id): Path<String>,
    Json(request): Json<ContestJudgeRequest>,
) -> Response
where
    R: ComplaintRepository + 'static,
    S: ContestRepository + 'static,
    N: NotificationPublisher + 'static,
    D: DocumentStore + 'static,
    C: Clock + 'static,
{
    let tally = match tally_from(request.tally) {
        Ok(tally) => tally,
        Err(error) => return error_response(error),
    };
    respond_contest(
        &service,
        service.judge_allegations(
            &CaseId(id),
            request.decision,
            &request.rationale,
            tally,
            &ActorId(request.actor),
        ),
    )
}

async fn file_recourse<R, S, N, D, C>(
    State(service): State<Service<R, S, N, D, C>>,
    Path(id): Path<String>,
    Json(request): Json<AppealRequest>,
) -> Response
where
    R: ComplaintRepository + 'static,
    S: ContestRepository + 'static,
    N: NotificationPublisher + 'static,
    D: DocumentStore + 'static,
    C: Clock + 'static,
{
    respond_contest(
        &service,
        service.file_recourse(&CaseId(id), &request.rationale, &ActorId(request.actor)),
    )
}

async fn open_counter_allegations<R, S, N, D, C>(
    State(service): State<Service<R, S, N, D, C>>,
    Path(id): Path<String>,
    Json(request): Json<ActorBody>,
) -> Response
where
    R: ComplaintRepository + 'static,
    S: ContestRepository + 'static,
    N: NotificationPublisher + 'static,
    D: DocumentStore + 'static,
    C: Clock + 'static,
{
    respond_contest(
        &service,
        service.open_counter_allegations(&CaseId(id), &ActorId(request.actor)),
    )
}

async fn submit_counter_allegation<R, S, N, D, C>(
    State(service): State<Service<R, S, N, D, C>>,
    Path(id): Path<String>,
    Json(request): Json<AllegationRequest>,
) -> Response
where
    R: ComplaintRepository + 'static,
    S: ContestRepository + 'static,
    N: NotificationPublisher + 'static,
    D: DocumentStore + 'static,
    C: Clock + 'static,
{
    respond_contest(
        &service,
        service.submit_counter_allegation(
            &CaseId(id),
            request.author,
            &request.text,
            &ActorId(request.actor),
        ),
    )
}

async fn judge_recourse<R, S, N, D, C>(
    State(service): State<Service<R, S, N, D, C>>,
    Path(id): Path<String>,
    Json(request): Json<ContestJudgeRequest>,
) -> Response
where
    R: ComplaintRepository + 'static,
    S: ContestRepository + 'static,
    N: NotificationPublisher + 'static,
    D: DocumentStore + 'static,
    C: Clock + 'static,
{
    let tally = match tally_from(request.tally) {
        Ok(tally) => tally,
        Err(error) => return error_response(error),
    };
    respond_contest(
        &service,
        service.judge_recourse(
            &CaseId(id),
            request.decision,
            &request.rationale,
            tally,
            &ActorId(request.actor),
        ),
    )
}

async fn finalize_without_recourse<R, S, N, D, C>(
    State(service): State<Service<R, S, N, D, C>>,
    Path(id): Path<String>,
    Json(request): Json<ActorBody>,
) -> Response
where
    R: ComplaintRepository + 'static,
    S: ContestRepository + 'static,
    N: NotificationPublisher + 'static,
    D: DocumentStore + 'static,
    C: Clock + 'static,
{
    respond_contest(
        &service,
        service.finalize_without_recourse(&CaseId(id), &ActorId(request.actor)),
    )
}

async fn archive_contest<R, S, N, D, C>(
    State(service): State<Service<R, S, N, D, C>>,
    Path(id): Path<String>,
    Json(request): Json<ArchiveRequest>,
) -> Response
where
    R: ComplaintRepository + 'static,
    S: ContestRepository + 'static,
    N: NotificationPublisher + 'static,
    D: DocumentStore + 'static,
    C: Clock + 'static,
{
    respond_contest(
        &service,
        service.archive_contest(&CaseId(id), request.reason, &ActorId(request.actor)),
    )
}

async fn reopen_contest<R, S, N, D, C>(
    State(service): State<Service<R, S, N, D, C>>,
    Path(id): Path<String>,
    Json(request): Json<ActorBody>,
) -> Response
where
    R: ComplaintRepository + 'static,
    S: ContestRepository + 'static,
    N: NotificationPublisher + 'static,
    D: DocumentStore + 'static,
    C: Clock + 'static,
{
    respond_contest(
        &service,
        service.reopen_contest(&CaseId(id), &ActorId(request.actor)),
    )
}

async fn assign_contest_relator<R, S, N, D, C>(
    State(service): State<Service<R, S, N, D, C>>,
    Path(id): Path<String>,
    Json(request): Json<RelatorRequest>,
) -> Response
where
    R: ComplaintRepository + 'static,
    S: ContestRepository + 'static,
    N: NotificationPublisher + 'static,
    D: DocumentStore + 'static,
    C: Clock + 'static,
{
    let relator = Relator {
        registration: request.registration,
        name: request.name,
    };
    respond_contest(
        &service,
        service.assign_contest_relator(&CaseId(id), relator, &ActorId(request.actor)),
    )
}

async fn attach_contest_document<R, S, N, D, C>(
    State(service): State<Service<R, S, N, D, C>>,
    Path(id): Path<String>,
    Json(request): Json<AttachmentRequest>,
) -> Response
where
    R: ComplaintRepository + 'static,
    S: ContestRepository + 'static,
    N: NotificationPublisher + 'static,
    D: DocumentStore + 'static,
    C: Clock + 'static,
{
    let metadata = DocumentMetadata {
        name: request.name,
        category: request.category,
        content_type: request.content_type,
    };
    respond_contest(
        &service,
        service.attach_contest_document(
            &CaseId(id),
            metadata,
            request.content.into_bytes(),
            &ActorId(request.actor),
        ),
    )
}

// --- shared response helpers ------------------------------------------------

fn respond_complaint<R, S, N, D, C>(
    service: &Service<R, S, N, D, C>,
    result: Result<ComplaintCase, DisputeServiceError>,
) -> Response
where
    R: ComplaintRepository + 'static,
    S: ContestRepository + 'static,
    N: NotificationPublisher + 'static,
    D: DocumentStore + 'static,
    C: Clock + 'static,
{
    match result {
        Ok(case) => {
            let summary = case.summary(service.now());
            (StatusCode::OK, Json(summary)).into_response()
        }
        Err(error) => error_response(error),
    }
}

fn respond_contest<R, S, N, D, C>(
    service: &Service<R, S, N, D, C>,
    result: Result<ResultContestCase, DisputeServiceError>,
) -> Response
where
    R: ComplaintRepository + 'static,
    S: ContestRepository + 'static,
    N: NotificationPublisher + 'static,
    D: DocumentStore + 'static,
    C: Clock + 'static,
{
    match result {
        Ok(case) => {
            let summary = case.summary(service.now());
            (StatusCode::OK, Json(summary)).into_response()
        }
        Err(error) => error_response(error),
    }
}
