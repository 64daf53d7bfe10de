//! HTTP handlers, one per tutor operation

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use tracing::error;

use crate::error::TutorError;
use crate::remediation::FeedbackEntry;
use crate::server::ServerState;

/// Lesson request
#[derive(Debug, Deserialize)]
pub struct LessonRequest {
    pub grade: String,
    pub lesson: String,
}

/// Feedback request
#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    #[serde(default)]
    pub grade: String,
    pub lesson: String,
    #[serde(default)]
    pub feedback: Vec<FeedbackEntry>,
    /// Sent by the client for its own navigation; not used here
    #[serde(default, rename = "subtopicPath")]
    pub subtopic_path: Vec<serde_json::Value>,
}

/// Feedback response
#[derive(Debug, Serialize)]
pub struct FeedbackResponse {
    pub status: &'static str,
    pub subtopics: Vec<crate::tree::ConceptNode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(rename = "subtopicPath", skip_serializing_if = "Option::is_none")]
    pub subtopic_path: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Map a core error onto a status code and JSON body
fn error_response(e: TutorError) -> Response {
    match e {
        TutorError::NotFound(message) => {
            (StatusCode::NOT_FOUND, Json(json!({ "error": message }))).into_response()
        }
        TutorError::Generation(message) => {
            error!("Generation failed: {}", message);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "detail": format!("Gemini API error: {}", message) })),
            )
                .into_response()
        }
        other => {
            error!("Request failed: {}", other);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": other.to_string() })),
            )
                .into_response()
        }
    }
}

/// Generate a new lesson, replacing any stored session
pub async fn lesson_handler(
    State(state): State<ServerState>,
    Json(req): Json<LessonRequest>,
) -> Response {
    match state.tutor.start_lesson(&req.lesson, &req.grade).await {
        Ok(plan) => (StatusCode::OK, Json(plan)).into_response(),
        Err(e) => error_response(e),
    }
}

/// Record feedback and expand "not understood" concepts.
///
/// Only the first expanded concept is returned; the rest are visible through
/// the review endpoints.
pub async fn feedback_handler(
    State(state): State<ServerState>,
    Json(req): Json<FeedbackRequest>,
) -> Response {
    let report = match state
        .tutor
        .submit_feedback(&req.lesson, &req.grade, &req.feedback)
        .await
    {
        Ok(report) => report,
        Err(e) => return error_response(e),
    };

    let response = match report.first {
        Some(first) => FeedbackResponse {
            status: "success",
            subtopics: first.subtopics,
            parent_id: Some(first.parent_id),
            subtopic_path: Some(first.path),
            message: None,
        },
        None => FeedbackResponse {
            status: "success",
            subtopics: Vec::new(),
            parent_id: None,
            subtopic_path: None,
            message: Some("No more not understood ideas.".to_string()),
        },
    };

    (StatusCode::OK, Json(response)).into_response()
}

/// Every "not understood" concept, shallow first
pub async fn full_explain_handler(State(state): State<ServerState>) -> Response {
    match state.tutor.list_misunderstood() {
        Ok(misunderstood) => Json(json!({ "misunderstood": misunderstood })).into_response(),
        Err(e) => error_response(e),
    }
}

/// Quiz over every "not understood" concept
pub async fn arranged_quiz_handler(State(state): State<ServerState>) -> Response {
    match state.tutor.arrange_quiz() {
        Ok(quiz) => Json(json!({ "quiz": quiz })).into_response(),
        Err(e) => error_response(e),
    }
}

/// Simple re-explanations for the last incorrect answers
pub async fn very_simple_explain_handler(State(state): State<ServerState>) -> Response {
    match state.tutor.simplify_incorrect().await {
        Ok(explanations) => {
            Json(json!({ "very_simple_explanations": explanations })).into_response()
        }
        Err(e) => error_response(e),
    }
}

/// Grade quiz answers keyed by concept id
pub async fn evaluate_quiz_handler(
    State(state): State<ServerState>,
    Json(answers): Json<HashMap<String, String>>,
) -> Response {
    match state.tutor.evaluate(&answers) {
        Ok(evaluation) => (StatusCode::OK, Json(evaluation)).into_response(),
        Err(e) => error_response(e),
    }
}

/// Health check
pub async fn ping_handler() -> impl IntoResponse {
    Json(json!({ "msg": "pong" }))
}
