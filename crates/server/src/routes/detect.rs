use crate::error::{ServerError, ServerResult};
use crate::state::ServerState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use cascade::{DetectionReport, Submission};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

/// Request to check one submission against the corpus.
#[derive(Debug, Deserialize)]
pub struct DetectRequest {
    /// Student who submitted the code
    pub student_id: String,

    /// Assignment the submission belongs to
    pub assignment_id: String,

    /// Submission ID (optional, generated if not provided)
    #[serde(default)]
    pub submission_id: Option<String>,

    /// Source code to check
    pub code: String,

    /// Source language (optional)
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_language() -> String {
    "python".to_string()
}

/// Run one submission through the detection cascade and index it.
///
/// Returns 201 with the assigned submission ID and the verified matches.
/// A submission never matches itself: it is indexed only after its own
/// search completes.
pub async fn detect_submission(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<DetectRequest>,
) -> ServerResult<impl IntoResponse> {
    if request.code.trim().is_empty() {
        return Err(ServerError::BadRequest("code must not be empty".into()));
    }
    if request.student_id.trim().is_empty() {
        return Err(ServerError::BadRequest(
            "student_id must not be empty".into(),
        ));
    }

    let submission_id = request
        .submission_id
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let mut submission = Submission::new(&submission_id, &request.code, &request.language);
    submission
        .metadata
        .insert("student_id".to_string(), request.student_id);
    submission
        .metadata
        .insert("assignment_id".to_string(), request.assignment_id);

    let report: DetectionReport = state.engine.detect(&submission).await?;
    Ok((StatusCode::CREATED, Json(report)))
}
