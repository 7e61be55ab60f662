use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use super::common::{actor, build_service, dispute_router_with, filing, read_json_body, ts};
use crate::workflows::disputes::judgment::AdmissibilityOutcome;

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("request builds")
}

fn file_complaint_body() -> Value {
    json!({
        "actor": "clerk-01",
        "filer": { "registration": "A-20981", "name": "Rodrigo Lima" },
        "respondent": { "kind": "slate", "slate_id": "slate-07" },
        "description": "Irregular campaign material distributed at the polling site",
        "decision_mode": "sole_relator"
    })
}

#[tokio::test]
async fn filing_a_complaint_returns_created_with_summary() {
    let harness = build_service(ts(2026, 3, 2));
    let router = dispute_router_with(&harness);

    let response = router
        .oneshot(post_json("/api/v1/disputes/complaints", file_complaint_body()))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json_body(response).await;
    assert_eq!(body["phase_label"], "received");
    assert_eq!(body["protocol"], "DEN-2026-000001");
    assert_eq!(body["history_entries"], 1);
}

#[tokio::test]
async fn unknown_case_maps_to_not_found() {
    let harness = build_service(ts(2026, 3, 2));
    let router = dispute_router_with(&harness);

    let response = router
        .oneshot(get("/api/v1/disputes/complaints/den-404404"))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn wrong_phase_operation_maps_to_conflict() {
    let harness = build_service(ts(2026, 3, 2));
    let case = harness
        .service
        .file_complaint(filing(), &actor())
        .expect("filed");
    let router = dispute_router_with(&harness);

    // Defense cannot arrive before the case is admitted.
    let response = router
        .oneshot(post_json(
            &format!("/api/v1/disputes/complaints/{}/defense", case.id.0),
            json!({ "actor": "clerk-01", "text": "premature defense" }),
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = read_json_body(response).await;
    assert_eq!(body["retryable"], false);
}

#[tokio::test]
async fn empty_rationale_maps_to_unprocessable() {
    let harness = build_service(ts(2026, 3, 2));
    let case = harness
        .service
        .file_complaint(filing(), &actor())
        .expect("filed");
    harness
        .service
        .begin_admissibility_review(&case.id, &actor())
        .expect("review opens");
    let router = dispute_router_with(&harness);

    let response = router
        .oneshot(post_json(
            &format!(
                "/api/v1/disputes/complaints/{}/admissibility/conclude",
                case.id.0
            ),
            json!({ "actor": "relator-01", "admissible": true, "rationale": "  " }),
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn judgment_without_relator_maps_to_forbidden() {
    let harness = build_service(ts(2026, 3, 2));
    let case = harness
        .service
        .file_complaint(filing(), &actor())
        .expect("filed");
    let id = case.id.clone();
    let actor = actor();
    harness
        .service
        .begin_admissibility_review(&id, &actor)
        .expect("ok");
    harness
        .service
        .conclude_admissibility_review(&id, AdmissibilityOutcome::Admitted, "met", &actor)
        .expect("ok");
    harness
        .service
        .receive_defense(&id, "defense", &actor)
        .expect("ok");
    harness
        .service
        .open_evidence_production(&id, &actor)
        .expect("ok");
    harness
        .service
        .close_evidence_production(&id, &actor)
        .expect("ok");
    let hearing_at = harness.service.now() + chrono::Duration::days(4);
    harness
        .service
        .schedule_hearing(&id, hearing_at, &actor)
        .expect("ok");
    harness.clock.set(hearing_at);
    harness
        .service
        .record_hearing(&id, "heard", &actor)
        .expect("ok");
    harness
        .service
        .receive_final_allegations(&id, "closing", &actor)
        .expect("ok");

    let router = dispute_router_with(&harness);
    let response = router
        .oneshot(post_json(
            &format!("/api/v1/disputes/complaints/{}/judgment", id.0),
            json!({
                "actor": "relator-01",
                "decision": "upheld",
                "rationale": "conduct proven",
                "allows_appeal": false
            }),
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn overfull_tally_maps_to_unprocessable() {
    let harness = build_service(ts(2026, 3, 2));
    let case = harness
        .service
        .file_complaint(filing(), &actor())
        .expect("filed");
    let router = dispute_router_with(&harness);

    let response = router
        .oneshot(post_json(
            &format!("/api/v1/disputes/complaints/{}/judgment", case.id.0),
            json!({
                "actor": "relator-01",
                "decision": "upheld",
                "rationale": "conduct proven",
                "tally": {
                    "favor": 5, "against": 3, "abstention": 1,
                    "recused": 0, "quorum_present": 7
                },
                "allows_appeal": false
            }),
        ))
        .await
        .expect("router responds");

    // The tally is validated before the case is even loaded.
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn archive_endpoint_is_idempotent() {
    let harness = build_service(ts(2026, 3, 2));
    let case = harness
        .service
        .file_complaint(filing(), &actor())
        .expect("filed");
    let uri = format!("/api/v1/disputes/complaints/{}/archive", case.id.0);
    let body = json!({ "actor": "clerk-01", "reason": "withdrawn" });

    let first = dispute_router_with(&harness)
        .oneshot(post_json(&uri, body.clone()))
        .await
        .expect("router responds");
    assert_eq!(first.status(), StatusCode::OK);

    let second = dispute_router_with(&harness)
        .oneshot(post_json(&uri, body))
        .await
        .expect("router responds");
    assert_eq!(second.status(), StatusCode::OK);

    let stored = harness.service.get_complaint(&case.id).expect("present");
    assert_eq!(stored.summary(harness.service.now()).archive_reason, Some("withdrawn"));
}

#[tokio::test]
async fn contest_endpoints_cover_the_filing_round_trip() {
    let harness = build_service(ts(2026, 4, 6));
    let router = dispute_router_with(&harness);

    let response = router
        .oneshot(post_json(
            "/api/v1/disputes/contests",
            json!({
                "actor": "clerk-01",
                "contestant": { "registration": "A-33107", "name": "Marina Duarte" },
                "contested_result": "second round tally",
                "description": "Totals diverge from the published bulletin",
                "decision_mode": "sole_relator"
            }),
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json_body(response).await;
    assert_eq!(body["protocol"], "IMP-2026-000001");

    let fetched = dispute_router_with(&harness)
        .oneshot(get("/api/v1/disputes/contests/imp-000001"))
        .await
        .expect("router responds");
    assert_eq!(fetched.status(), StatusCode::OK);
    let body = read_json_body(fetched).await;
    assert_eq!(body["phase_label"], "filed");
}
