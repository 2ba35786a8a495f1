//! # API REST
//!
//! REST API over the archival engine.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - Mapping archival errors to status codes and JSON error bodies
//!
//! Handlers hold no business state; every route is a thin call into
//! [`mpr_core::ArchivalService`]. Operations may block on the per-patient lock, so they run on
//! tokio's blocking pool.

#![warn(rust_2018_idioms)]

pub mod dto;
pub mod error;

use axum::{
    extract::{Path as AxumPath, State},
    response::Json,
    routing::{get, post},
    Router,
};
use mpr_core::{
    ArchivalResult, ArchivalService, CoreConfig, EntityRef, RecordId, StoreError, YamlFileStore,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use dto::{
    AncestorRes, ArchiveRes, CheckRes, CommitReq, CommitRes, ErrorRes, HealthRes, ProbeRes,
    ViolationRes,
};
use error::ApiError;

/// Application state shared across REST API handlers
#[derive(Clone, Debug)]
pub struct AppState {
    service: ArchivalService,
}

impl AppState {
    pub fn new(service: ArchivalService) -> Self {
        Self { service }
    }

    /// State backed by the YAML file store under the configured data directory.
    pub fn open(cfg: Arc<CoreConfig>) -> Result<Self, StoreError> {
        let store = YamlFileStore::open(cfg)?;
        Ok(Self::new(ArchivalService::new(Arc::new(store))))
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(health, archive_record, probe_restore, commit_restore, check_patient),
    components(schemas(
        HealthRes,
        ArchiveRes,
        AncestorRes,
        ProbeRes,
        CommitReq,
        CommitRes,
        ViolationRes,
        CheckRes,
        ErrorRes,
    ))
)]
pub struct ApiDoc;

/// Builds the complete REST application, Swagger UI included.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/records/:entity_type/:id/archive", post(archive_record))
        .route(
            "/records/:entity_type/:id/restore",
            get(probe_restore).post(commit_restore),
        )
        .route("/patients/:id/check", get(check_patient))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Runs a service call on the blocking pool.
async fn run<T, F>(state: AppState, op: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&ArchivalService) -> ArchivalResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(move || op(&state.service))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .map_err(ApiError::from)
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "MPR REST API is alive".into(),
    })
}

#[utoipa::path(
    post,
    path = "/records/{entity_type}/{id}/archive",
    params(
        ("entity_type" = String, Path, description = "patient, medical-history, representative, consultation or prescription"),
        ("id" = String, Path, description = "Record UUID")
    ),
    responses(
        (status = 200, description = "Record archived", body = ArchiveRes),
        (status = 400, description = "Invalid entity type or id", body = ErrorRes),
        (status = 404, description = "Record not found", body = ErrorRes),
        (status = 503, description = "Storage failure; safe to retry", body = ErrorRes)
    )
)]
/// Archive a record and everything it owns
///
/// Archiving an already archived record succeeds with `archived_count` 0.
#[axum::debug_handler]
async fn archive_record(
    State(state): State<AppState>,
    AxumPath((entity_type, id)): AxumPath<(String, String)>,
) -> Result<Json<ArchiveRes>, ApiError> {
    let target = EntityRef::parse(&entity_type, &id)?;
    let outcome = run(state, move |svc| svc.archive(target)).await?;
    Ok(Json(outcome.into()))
}

#[utoipa::path(
    get,
    path = "/records/{entity_type}/{id}/restore",
    params(
        ("entity_type" = String, Path, description = "Entity type"),
        ("id" = String, Path, description = "Record UUID")
    ),
    responses(
        (status = 200, description = "Whether restoring needs confirmation", body = ProbeRes),
        (status = 400, description = "Invalid entity type or id", body = ErrorRes),
        (status = 404, description = "Record not found", body = ErrorRes),
        (status = 503, description = "Storage failure; safe to retry", body = ErrorRes)
    )
)]
/// Probe a restore without changing anything
#[axum::debug_handler]
async fn probe_restore(
    State(state): State<AppState>,
    AxumPath((entity_type, id)): AxumPath<(String, String)>,
) -> Result<Json<ProbeRes>, ApiError> {
    let target = EntityRef::parse(&entity_type, &id)?;
    let outcome = run(state, move |svc| svc.probe(target)).await?;
    Ok(Json(outcome.into()))
}

#[utoipa::path(
    post,
    path = "/records/{entity_type}/{id}/restore",
    params(
        ("entity_type" = String, Path, description = "Entity type"),
        ("id" = String, Path, description = "Record UUID")
    ),
    request_body = CommitReq,
    responses(
        (status = 200, description = "Record restored", body = CommitRes),
        (status = 400, description = "Invalid entity type or id", body = ErrorRes),
        (status = 404, description = "Record not found", body = ErrorRes),
        (status = 409, description = "An ancestor is archived and cascade was not requested", body = ErrorRes),
        (status = 500, description = "Consistency invariant violated after restore", body = ErrorRes),
        (status = 503, description = "Storage failure; safe to retry", body = ErrorRes)
    )
)]
/// Restore a record
///
/// With an archived ancestor the whole patient record is restored, but only when `cascade`
/// is true.
#[axum::debug_handler]
async fn commit_restore(
    State(state): State<AppState>,
    AxumPath((entity_type, id)): AxumPath<(String, String)>,
    Json(req): Json<CommitReq>,
) -> Result<Json<CommitRes>, ApiError> {
    let target = EntityRef::parse(&entity_type, &id)?;
    let outcome = run(state, move |svc| svc.commit(target, req.cascade)).await?;
    Ok(Json(outcome.into()))
}

#[utoipa::path(
    get,
    path = "/patients/{id}/check",
    params(("id" = String, Path, description = "Patient UUID")),
    responses(
        (status = 200, description = "Consistency report", body = CheckRes),
        (status = 400, description = "Invalid id", body = ErrorRes),
        (status = 404, description = "Patient not found", body = ErrorRes),
        (status = 503, description = "Storage failure; safe to retry", body = ErrorRes)
    )
)]
/// Run the consistency checker over one patient
#[axum::debug_handler]
async fn check_patient(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<CheckRes>, ApiError> {
    let patient_id = RecordId::parse(&id).map_err(mpr_core::ArchivalError::from)?;
    let violations = run(state, move |svc| svc.check(patient_id)).await?;
    Ok(Json(CheckRes {
        patient_id: patient_id.to_string(),
        violations: violations.iter().map(ViolationRes::from).collect(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use mpr_core::{InMemoryStore, PatientTree, PatientTreeBuilder, PersistenceAdapter};
    use tower::ServiceExt;

    fn test_app() -> (Router, Arc<InMemoryStore>, PatientTree) {
        let tree = PatientTreeBuilder::named("Ada Lovelace")
            .unwrap()
            .representative("Grace Hopper")
            .unwrap()
            .consultation("C1")
            .consultation("C2")
            .build();
        let store = Arc::new(InMemoryStore::with_records(tree.records().iter().cloned()));
        let state = AppState::new(ArchivalService::new(store.clone()));
        (router(state), store, tree)
    }

    fn record_uri(entity: EntityRef, action: &str) -> String {
        format!("/records/{}/{}/{}", entity.entity_type, entity.id, action)
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    #[tokio::test]
    async fn health_is_ok() {
        let (app, _, _) = test_app();
        let (status, body) = send(&app, get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
    }

    #[tokio::test]
    async fn archive_probe_and_cascading_restore() {
        let (app, store, tree) = test_app();
        let c1 = tree.consultation_refs()[0];

        let (status, body) = send(
            &app,
            post_json(&record_uri(tree.patient_ref(), "archive"), serde_json::json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["archived_count"], 5);

        let (status, body) = send(&app, get(&record_uri(c1, "restore"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["needs_confirmation"], true);
        assert_eq!(body["ancestor"]["entity_type"], "patient");
        assert_eq!(body["ancestor"]["id"], tree.patient_id().to_string());
        assert_eq!(body["ancestor"]["name"], "Ada Lovelace");

        let (status, body) = send(
            &app,
            post_json(&record_uri(c1, "restore"), serde_json::json!({ "cascade": false })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "ancestor_archived");
        assert_eq!(body["ancestor"]["entity_type"], "patient");
        assert_eq!(body["retryable"], false);

        let (status, body) = send(
            &app,
            post_json(&record_uri(c1, "restore"), serde_json::json!({ "cascade": true })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["restored_count"], 5);
        assert_eq!(body["scope"], "subtree");
        assert_eq!(body["remaining_inactive"], 0);
        assert!(store.all().iter().all(|r| r.is_active()));
    }

    #[tokio::test]
    async fn unknown_record_is_404() {
        let (app, _, _) = test_app();
        let missing = EntityRef::new(mpr_core::EntityType::Consultation, RecordId::new());
        let (status, body) = send(&app, get(&record_uri(missing, "restore"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "not_found");
    }

    #[tokio::test]
    async fn bad_type_or_id_is_400() {
        let (app, _, tree) = test_app();
        let uri = format!("/records/doctor/{}/restore", tree.patient_id());
        let (status, body) = send(&app, get(&uri)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "invalid_input");

        let (status, _) = send(&app, get("/records/patient/not-a-uuid/restore")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, get("/patients/XYZ/check")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn storage_failure_is_503_and_retryable() {
        let (app, store, tree) = test_app();
        store.fail_update_after(2);

        let uri = record_uri(tree.patient_ref(), "archive");
        let (status, body) = send(&app, post_json(&uri, serde_json::json!({}))).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["code"], "operation_failed");
        assert_eq!(body["retryable"], true);
        assert_eq!(body["rows_changed"], 2);

        let (status, body) = send(&app, post_json(&uri, serde_json::json!({}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["archived_count"], 3);
    }

    #[tokio::test]
    async fn retried_escalation_reports_records_left_archived() {
        let (app, store, tree) = test_app();
        let archive = record_uri(tree.patient_ref(), "archive");
        let (status, _) = send(&app, post_json(&archive, serde_json::json!({}))).await;
        assert_eq!(status, StatusCode::OK);

        store.fail_update_after(2);
        let c2 = record_uri(tree.consultation_refs()[1], "restore");
        let (status, body) =
            send(&app, post_json(&c2, serde_json::json!({ "cascade": true }))).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["rows_changed"], 2);

        let (status, body) =
            send(&app, post_json(&c2, serde_json::json!({ "cascade": true }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["scope"], "target");
        assert_eq!(body["restored_count"], 1);
        assert_eq!(body["remaining_inactive"], 2);
    }

    #[tokio::test]
    async fn invariant_violation_is_500_with_distinct_code() {
        let (app, store, tree) = test_app();
        store
            .update(tree.history_ref(), &mpr_core::RecordPatch::set_active(false))
            .unwrap();

        let (status, body) = send(
            &app,
            post_json(
                &record_uri(tree.representative_refs()[0], "restore"),
                serde_json::json!({ "cascade": false }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], "invariant_violation");
        assert_eq!(body["violations"].as_array().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn check_reports_violations() {
        let (app, store, tree) = test_app();
        let uri = format!("/patients/{}/check", tree.patient_id());

        let (status, body) = send(&app, get(&uri)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["violations"].as_array().map(Vec::len), Some(0));

        store
            .update(tree.patient_ref(), &mpr_core::RecordPatch::set_active(false))
            .unwrap();
        let (_, body) = send(&app, get(&uri)).await;
        assert_eq!(body["violations"].as_array().map(Vec::len), Some(4));
        assert_eq!(body["violations"][0]["inactive_ancestor_type"], "patient");
    }
}
