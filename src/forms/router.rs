use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::registry::{RegistryError, SessionId, SessionRegistry, SharedSession};
use super::session::{AdvanceOutcome, FormSession, SessionError, SessionStatus};
use super::submission::{FormSubmitter, SubmissionReceipt};
use super::validation::ValidationReport;
use super::value::FieldValue;
use super::walker::{ActiveField, EditEffect};

/// Shared state behind the session endpoints.
#[derive(Clone)]
pub struct FormsState {
    pub registry: Arc<SessionRegistry>,
    pub submitter: Arc<dyn FormSubmitter>,
}

/// Router exposing the session lifecycle over HTTP.
pub fn session_router(
    registry: Arc<SessionRegistry>,
    submitter: Arc<dyn FormSubmitter>,
) -> Router {
    Router::new()
        .route("/api/v1/sessions", post(create_handler))
        .route(
            "/api/v1/sessions/:session_id",
            get(status_handler).delete(discard_handler),
        )
        .route("/api/v1/sessions/:session_id/fields", put(edit_handler))
        .route("/api/v1/sessions/:session_id/advance", post(advance_handler))
        .route("/api/v1/sessions/:session_id/retreat", post(retreat_handler))
        .route("/api/v1/sessions/:session_id/jump", post(jump_handler))
        .route("/api/v1/sessions/:session_id/submit", post(submit_handler))
        .route("/api/v1/sessions/:session_id/restart", post(restart_handler))
        .route("/api/v1/sessions/:session_id/review", get(review_handler))
        .with_state(FormsState {
            registry,
            submitter,
        })
}

/// What the presentation layer needs to render the current step.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub session_id: SessionId,
    pub status: SessionStatus,
    pub step: usize,
    pub step_count: usize,
    pub step_title: String,
    pub progress_percent: f64,
    pub fields: Vec<ActiveField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<ValidationReport>,
}

impl SessionView {
    pub fn new(session_id: SessionId, session: &FormSession) -> Self {
        Self {
            session_id,
            status: session.status(),
            step: session.current_step(),
            step_count: session.schema().step_count(),
            step_title: session.current_step_title().to_string(),
            progress_percent: session.progress_percent(),
            fields: session.active_fields(),
            errors: session.last_report().cloned(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct EditRequest {
    pub(crate) path: String,
    #[serde(default)]
    pub(crate) value: FieldValue,
}

#[derive(Debug, Deserialize)]
pub(crate) struct JumpRequest {
    pub(crate) step: usize,
}

#[derive(Debug, Serialize)]
struct EditResponse {
    effect: EditEffect,
    session: SessionView,
}

#[derive(Debug, Serialize)]
struct AdvanceResponse {
    #[serde(flatten)]
    outcome: AdvanceOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<String>,
    session: SessionView,
}

#[derive(Debug, Serialize)]
struct SubmitResponse {
    receipt: SubmissionReceipt,
    session: SessionView,
}

pub(crate) async fn create_handler(State(state): State<FormsState>) -> Response {
    let (id, session) = state.registry.create();
    let session = session.lock().await;
    let view = SessionView::new(id, &session);
    (StatusCode::CREATED, axum::Json(view)).into_response()
}

pub(crate) async fn status_handler(
    State(state): State<FormsState>,
    Path(session_id): Path<String>,
) -> Response {
    let id = SessionId(session_id);
    let shared = match lookup(&state, &id) {
        Ok(shared) => shared,
        Err(response) => return response,
    };

    let session = shared.lock().await;
    (StatusCode::OK, axum::Json(SessionView::new(id, &session))).into_response()
}

pub(crate) async fn discard_handler(
    State(state): State<FormsState>,
    Path(session_id): Path<String>,
) -> Response {
    match state.registry.remove(&SessionId(session_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => registry_error_response(error),
    }
}

pub(crate) async fn restart_handler(
    State(state): State<FormsState>,
    Path(session_id): Path<String>,
) -> Response {
    let id = SessionId(session_id);
    let shared = match lookup(&state, &id) {
        Ok(shared) => shared,
        Err(response) => return response,
    };

    let mut session = shared.lock().await;
    session.restart();
    (StatusCode::OK, axum::Json(SessionView::new(id, &session))).into_response()
}

pub(crate) async fn edit_handler(
    State(state): State<FormsState>,
    Path(session_id): Path<String>,
    axum::Json(request): axum::Json<EditRequest>,
) -> Response {
    let id = SessionId(session_id);
    let shared = match lookup(&state, &id) {
        Ok(shared) => shared,
        Err(response) => return response,
    };

    let mut session = shared.lock().await;
    match session.edit(&request.path, request.value) {
        Ok(effect) => {
            let session = SessionView::new(id, &session);
            (StatusCode::OK, axum::Json(EditResponse { effect, session })).into_response()
        }
        Err(error) => session_error_response(error),
    }
}

pub(crate) async fn advance_handler(
    State(state): State<FormsState>,
    Path(session_id): Path<String>,
) -> Response {
    let id = SessionId(session_id);
    let shared = match lookup(&state, &id) {
        Ok(shared) => shared,
        Err(response) => return response,
    };

    let mut session = shared.lock().await;
    match session.advance() {
        Ok(outcome) => {
            let (status, summary) = match &outcome {
                AdvanceOutcome::Advanced { .. } => (StatusCode::OK, None),
                AdvanceOutcome::Rejected(rejection) => {
                    (StatusCode::UNPROCESSABLE_ENTITY, rejection.summary())
                }
            };
            let body = AdvanceResponse {
                outcome,
                summary,
                session: SessionView::new(id, &session),
            };
            (status, axum::Json(body)).into_response()
        }
        Err(error) => session_error_response(error),
    }
}

pub(crate) async fn retreat_handler(
    State(state): State<FormsState>,
    Path(session_id): Path<String>,
) -> Response {
    let id = SessionId(session_id);
    let shared = match lookup(&state, &id) {
        Ok(shared) => shared,
        Err(response) => return response,
    };

    let mut session = shared.lock().await;
    match session.retreat() {
        Ok(_) => (StatusCode::OK, axum::Json(SessionView::new(id, &session))).into_response(),
        Err(error) => session_error_response(error),
    }
}

pub(crate) async fn jump_handler(
    State(state): State<FormsState>,
    Path(session_id): Path<String>,
    axum::Json(request): axum::Json<JumpRequest>,
) -> Response {
    let id = SessionId(session_id);
    let shared = match lookup(&state, &id) {
        Ok(shared) => shared,
        Err(response) => return response,
    };

    let mut session = shared.lock().await;
    match session.jump_to(request.step) {
        Ok(_) => (StatusCode::OK, axum::Json(SessionView::new(id, &session))).into_response(),
        Err(error) => session_error_response(error),
    }
}

pub(crate) async fn submit_handler(
    State(state): State<FormsState>,
    Path(session_id): Path<String>,
) -> Response {
    let id = SessionId(session_id);
    let shared = match lookup(&state, &id) {
        Ok(shared) => shared,
        Err(response) => return response,
    };

    let mut session = shared.lock().await;
    match session.submit(state.submitter.as_ref()).await {
        Ok(receipt) => {
            let body = SubmitResponse {
                receipt,
                session: SessionView::new(id, &session),
            };
            (StatusCode::OK, axum::Json(body)).into_response()
        }
        Err(error) => session_error_response(error),
    }
}

pub(crate) async fn review_handler(
    State(state): State<FormsState>,
    Path(session_id): Path<String>,
) -> Response {
    let id = SessionId(session_id);
    let shared = match lookup(&state, &id) {
        Ok(shared) => shared,
        Err(response) => return response,
    };

    let session = shared.lock().await;
    (StatusCode::OK, axum::Json(session.review())).into_response()
}

fn lookup(state: &FormsState, id: &SessionId) -> Result<SharedSession, Response> {
    state.registry.get(id).map_err(registry_error_response)
}

fn registry_error_response(error: RegistryError) -> Response {
    let status = match &error {
        RegistryError::NotFound(_) => StatusCode::NOT_FOUND,
    };

    let payload = json!({
        "error": error.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}

fn session_error_response(error: SessionError) -> Response {
    let status = match &error {
        SessionError::IllegalTransition { .. } | SessionError::StepOutOfRange { .. } => {
            StatusCode::CONFLICT
        }
        SessionError::UnknownField(_) | SessionError::NotEditable(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        SessionError::Submission(_) => StatusCode::BAD_GATEWAY,
    };

    let payload = json!({
        "error": error.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::schema::FormSchema;
    use crate::forms::submission::InMemorySubmitter;
    use crate::forms::validation::ValidationConfig;
    use axum::body::Body;
    use axum::http::{header, Request};
    use serde_json::Value;
    use tower::ServiceExt;

    fn router_with(submitter: Arc<dyn FormSubmitter>) -> (Router, Arc<SessionRegistry>) {
        let schema = FormSchema::property_listing().expect("bundled schema");
        let registry = Arc::new(SessionRegistry::new(
            Arc::new(schema),
            ValidationConfig::default(),
        ));
        (session_router(Arc::clone(&registry), submitter), registry)
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request builds")
    }

    fn empty_request(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .expect("request builds")
    }

    async fn read_json(response: Response) -> Value {
        let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("body readable");
        serde_json::from_slice(&body).expect("json body")
    }

    #[tokio::test]
    async fn create_returns_first_step_view() {
        let (router, _) = router_with(Arc::new(InMemorySubmitter::new()));
        let response = router
            .oneshot(empty_request("POST", "/api/v1/sessions"))
            .await
            .expect("router responds");

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = read_json(response).await;
        assert_eq!(body["session_id"], "session-000001");
        assert_eq!(body["status"]["state"], "editing");
        assert_eq!(body["step_title"], "Personal Details");
        assert_eq!(body["fields"][0]["path"], "firstName");
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let (router, _) = router_with(Arc::new(InMemorySubmitter::new()));
        let response = router
            .oneshot(empty_request("GET", "/api/v1/sessions/session-424242"))
            .await
            .expect("router responds");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn rejected_advance_is_unprocessable_with_summary() {
        let (router, registry) = router_with(Arc::new(InMemorySubmitter::new()));
        let (id, _) = registry.create();

        let response = router
            .oneshot(empty_request("POST", &format!("/api/v1/sessions/{id}/advance")))
            .await
            .expect("router responds");

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = read_json(response).await;
        assert_eq!(body["outcome"], "rejected");
        assert!(body["summary"]
            .as_str()
            .expect("summary present")
            .starts_with("Please fill in the following required fields: First Name"));
        assert_eq!(
            body["session"]["errors"]["field_errors"]["email"],
            "Please enter your email address"
        );
    }

    #[tokio::test]
    async fn edit_reports_cleared_dependents() {
        let (router, registry) = router_with(Arc::new(InMemorySubmitter::new()));
        let (id, shared) = registry.create();
        {
            let mut session = shared.lock().await;
            session.set_field("propertyType", "Residential");
            session.set_field("category", "Villa");
        }

        let response = router
            .oneshot(json_request(
                "PUT",
                &format!("/api/v1/sessions/{id}/fields"),
                json!({ "path": "propertyType", "value": "Commercial" }),
            ))
            .await
            .expect("router responds");

        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["effect"]["cleared"], json!(["category", "subCategory"]));
    }

    #[tokio::test]
    async fn unknown_field_and_illegal_jump_map_to_client_errors() {
        let (router, registry) = router_with(Arc::new(InMemorySubmitter::new()));
        let (id, _) = registry.create();

        let response = router
            .clone()
            .oneshot(json_request(
                "PUT",
                &format!("/api/v1/sessions/{id}/fields"),
                json!({ "path": "nickname", "value": "x" }),
            ))
            .await
            .expect("router responds");
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let response = router
            .oneshot(json_request(
                "POST",
                &format!("/api/v1/sessions/{id}/jump"),
                json!({ "step": 0 }),
            ))
            .await
            .expect("router responds");
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn failed_submission_is_bad_gateway() {
        let (router, registry) = router_with(Arc::new(InMemorySubmitter::rejecting("offline")));
        let (id, shared) = registry.create();
        {
            let mut session = shared.lock().await;
            session.edit("firstName", "Lina").expect("edit");
            session.edit("lastName", "Haddad").expect("edit");
            session.edit("email", "lina@example.com").expect("edit");
            session.edit("contact.countryCode", "+966").expect("edit");
            session.edit("contact.phone", "5551234").expect("edit");
            assert!(session.advance().expect("advance").is_advanced());
            session.edit("propertyType", "Commercial").expect("edit");
            session.edit("category", "Retail").expect("edit");
            session.edit("price", "950000").expect("edit");
            session.edit("listingType", "Sale").expect("edit");
            assert!(session.advance().expect("advance").is_advanced());
            session.edit("date", "2026-11-01").expect("edit");
            session.edit("agreeToTerms", true).expect("edit");
            assert!(session.advance().expect("advance").is_advanced());
        }

        let response = router
            .oneshot(empty_request("POST", &format!("/api/v1/sessions/{id}/submit")))
            .await
            .expect("router responds");
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(shared.lock().await.status(), SessionStatus::Reviewing);
    }

    #[tokio::test]
    async fn delete_releases_the_session() {
        let (router, registry) = router_with(Arc::new(InMemorySubmitter::new()));
        for _ in 0..3 {
            let response = router
                .clone()
                .oneshot(empty_request("POST", "/api/v1/sessions"))
                .await
                .expect("router responds");
            assert_eq!(response.status(), StatusCode::CREATED);
        }
        assert_eq!(registry.len(), 3);

        let response = router
            .clone()
            .oneshot(empty_request("DELETE", "/api/v1/sessions/session-000001"))
            .await
            .expect("router responds");
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(registry.len(), 2);

        let response = router
            .clone()
            .oneshot(empty_request("DELETE", "/api/v1/sessions/session-000001"))
            .await
            .expect("router responds");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = router
            .oneshot(empty_request("GET", "/api/v1/sessions/session-000001"))
            .await
            .expect("router responds");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn restart_discards_values_and_returns_to_first_step() {
        let (router, registry) = router_with(Arc::new(InMemorySubmitter::new()));
        let (id, shared) = registry.create();
        {
            let mut session = shared.lock().await;
            session.edit("firstName", "Lina").expect("edit");
            session.edit("lastName", "Haddad").expect("edit");
            session.edit("email", "lina@example.com").expect("edit");
            session.edit("contact.countryCode", "+966").expect("edit");
            session.edit("contact.phone", "5551234").expect("edit");
            assert!(session.advance().expect("advance").is_advanced());
        }

        let response = router
            .clone()
            .oneshot(empty_request("POST", &format!("/api/v1/sessions/{id}/restart")))
            .await
            .expect("router responds");
        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["step"], 0);
        assert_eq!(body["fields"][0]["path"], "firstName");
        assert!(shared.lock().await.state().is_empty());
        assert_eq!(registry.len(), 1);

        let response = router
            .oneshot(empty_request("POST", "/api/v1/sessions/session-000099/restart"))
            .await
            .expect("router responds");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
