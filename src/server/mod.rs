//! Web server exposing the tutor over JSON

pub mod http;

use anyhow::{Context, Result};
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::Config;
use crate::tutor::Tutor;

/// Shared server state
#[derive(Clone)]
pub struct ServerState {
    pub config: Arc<Config>,
    pub tutor: Arc<Tutor>,
}

/// All routes, with CORS open and request tracing
pub fn router(state: ServerState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let static_dir = state.config.server.static_dir.clone();

    Router::new()
        .route("/api/lesson", post(http::lesson_handler))
        .route("/api/feedback", post(http::feedback_handler))
        .route("/api/full_explain", get(http::full_explain_handler))
        .route("/api/full_arranged_quiz", get(http::arranged_quiz_handler))
        .route("/api/very_simple_explain", post(http::very_simple_explain_handler))
        .route("/api/evaluate_quiz", post(http::evaluate_quiz_handler))
        .route("/ping", get(http::ping_handler))
        .route_service("/", ServeFile::new(static_dir.join("index.html")))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the web server
pub async fn start(config: Config, host: Option<String>, port: Option<u16>) -> Result<()> {
    let tutor = Tutor::from_config(&config)?;

    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", host, port))?;

    let state = ServerState {
        config: Arc::new(config),
        tutor: Arc::new(tutor),
    };
    let app = router(state);

    info!("Listening on http://{}", addr);
    println!("Mastery tutor listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::MockTextGenerator;
    use crate::store::{IncorrectAnswerLog, MemorySessionRepository};
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    const LESSON: &str = r#"Here you go: {"introduction": "Fractions are parts.", "topics": [
        {"concept": "Halves", "question": "Half of 4?", "options": ["1", "2", "3"], "correct_answer": "B"},
        {"concept": "Thirds", "options": ["a", "b", "c"], "correct_answer": "A"}
    ]}"#;

    fn app(mock: MockTextGenerator, dir: &tempfile::TempDir) -> Router {
        let mut config = Config::default();
        config.server.static_dir = dir.path().to_path_buf();
        let tutor = Tutor::new(
            Arc::new(mock),
            Arc::new(MemorySessionRepository::new()),
            IncorrectAnswerLog::new(dir.path().join("false-Q.json")),
        );
        router(ServerState {
            config: Arc::new(config),
            tutor: Arc::new(tutor),
        })
    }

    fn post(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_ping() {
        let dir = tempfile::tempdir().unwrap();
        let response = app(MockTextGenerator::new(), &dir).oneshot(get("/ping")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({"msg": "pong"}));
    }

    #[tokio::test]
    async fn test_review_routes_without_session_are_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(MockTextGenerator::new(), &dir);

        for request in [
            get("/api/full_explain"),
            get("/api/full_arranged_quiz"),
            post("/api/evaluate_quiz", json!({})),
            post("/api/very_simple_explain", json!({})),
        ] {
            let response = app.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND);
            assert!(json_body(response).await["error"].is_string());
        }
    }

    #[tokio::test]
    async fn test_lesson_generation_failure_is_500_with_detail() {
        let dir = tempfile::tempdir().unwrap();
        let mut mock = MockTextGenerator::new();
        mock.expect_generate()
            .returning(|_| Err(anyhow::anyhow!("upstream unavailable")));

        let response = app(mock, &dir)
            .oneshot(post("/api/lesson", json!({"grade": "4", "lesson": "Fractions"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await;
        assert!(body["detail"].as_str().unwrap().contains("upstream unavailable"));
    }

    #[tokio::test]
    async fn test_lesson_feedback_and_quiz_flow() {
        let dir = tempfile::tempdir().unwrap();
        let mut mock = MockTextGenerator::new();
        mock.expect_generate()
            .withf(|p: &str| p.contains("\"topics\""))
            .returning(|_| Ok(LESSON.to_string()));
        mock.expect_generate()
            .withf(|p: &str| p.contains("simpler subtopics"))
            .times(1)
            .returning(|_| Ok(r#"[{"concept": "Cut in two"}, {"concept": "Equal parts"}]"#.to_string()));
        let app = app(mock, &dir);

        let response = app
            .clone()
            .oneshot(post("/api/lesson", json!({"grade": "4", "lesson": "Fractions"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let lesson = json_body(response).await;
        assert_eq!(lesson["introduction"], "Fractions are parts.");
        assert_eq!(lesson["topics"][0]["id"], "1");
        assert_eq!(lesson["topics"][1]["options"].as_array().unwrap().len(), 3);

        let response = app
            .clone()
            .oneshot(post(
                "/api/feedback",
                json!({
                    "grade": "4",
                    "lesson": "Fractions",
                    "feedback": [{"id": "1", "feedback": "not understood"}],
                    "subtopicPath": []
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let feedback = json_body(response).await;
        assert_eq!(feedback["status"], "success");
        assert_eq!(feedback["parent_id"], "1");
        assert_eq!(feedback["subtopicPath"], json!(["1"]));
        assert_eq!(feedback["subtopics"][1]["id"], "12");

        let response = app.clone().oneshot(get("/api/full_arranged_quiz")).await.unwrap();
        let quiz = json_body(response).await;
        assert_eq!(quiz["quiz"].as_array().unwrap().len(), 1);
        assert_eq!(quiz["quiz"][0]["correct_answer"], "B");

        let response = app
            .clone()
            .oneshot(post("/api/evaluate_quiz", json!({"1": "B"})))
            .await
            .unwrap();
        assert_eq!(json_body(response).await["status"], "complete");
    }

    #[tokio::test]
    async fn test_feedback_with_nothing_pending() {
        let dir = tempfile::tempdir().unwrap();
        let mut mock = MockTextGenerator::new();
        mock.expect_generate().times(1).returning(|_| Ok(LESSON.to_string()));
        let app = app(mock, &dir);

        app.clone()
            .oneshot(post("/api/lesson", json!({"grade": "4", "lesson": "Fractions"})))
            .await
            .unwrap();

        let response = app
            .oneshot(post(
                "/api/feedback",
                json!({"lesson": "Fractions", "feedback": [{"id": 2, "feedback": "understood"}]}),
            ))
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body["status"], "success");
        assert_eq!(body["message"], "No more not understood ideas.");
        assert_eq!(body["subtopics"], json!([]));
    }

    #[tokio::test]
    async fn test_feedback_skips_entry_without_verdict() {
        let dir = tempfile::tempdir().unwrap();
        let mut mock = MockTextGenerator::new();
        mock.expect_generate()
            .withf(|p: &str| p.contains("\"topics\""))
            .returning(|_| Ok(LESSON.to_string()));
        mock.expect_generate()
            .withf(|p: &str| p.contains("simpler subtopics") && p.contains("Thirds"))
            .times(1)
            .returning(|_| Ok(r#"[{"concept": "One of three"}]"#.to_string()));
        let app = app(mock, &dir);

        app.clone()
            .oneshot(post("/api/lesson", json!({"grade": "4", "lesson": "Fractions"})))
            .await
            .unwrap();

        let response = app
            .oneshot(post(
                "/api/feedback",
                json!({
                    "lesson": "Fractions",
                    "feedback": [{"id": "1"}, {"id": "2", "feedback": "not understood"}]
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "success");
        assert_eq!(body["parent_id"], "2");
        assert_eq!(body["subtopics"][0]["id"], "21");
    }

    #[tokio::test]
    async fn test_index_served_from_static_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<h1>tutor</h1>").unwrap();

        let response = app(MockTextGenerator::new(), &dir).oneshot(get("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"<h1>tutor</h1>");
    }
}
