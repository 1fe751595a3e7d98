//! Axum router configuration with middleware.
//!
//! Middleware: CORS (any origin), request tracing. Request bodies are not
//! size-capped; message content has no length limit.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/chat", post(handlers::chat::chat))
        .route("/sessions", get(handlers::session::list_sessions))
        .route("/history/{session_id}", get(handlers::session::get_history))
        .route("/health", get(health_check))
        .layer(DefaultBodyLimit::disable())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health - Simple liveness check.
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tower::ServiceExt;

    use parley_core::llm::box_provider::BoxLlmProvider;
    use parley_core::llm::provider::LlmProvider;
    use parley_infra::sqlite::pool::DatabasePool;
    use parley_types::config::GlobalConfig;
    use parley_types::llm::{
        CompletionRequest, CompletionResponse, LlmError, MessageRole, Usage,
    };

    /// Answers title prompts with a fixed title and numbers its replies.
    struct StubProvider {
        fail: bool,
        replies: AtomicUsize,
    }

    impl LlmProvider for StubProvider {
        fn name(&self) -> &str {
            "stub"
        }

        async fn complete(
            &self,
            request: &CompletionRequest,
        ) -> Result<CompletionResponse, LlmError> {
            if self.fail {
                return Err(LlmError::Unreachable("connection refused".to_string()));
            }

            let is_title = request
                .messages
                .first()
                .is_some_and(|m| m.role == MessageRole::System);
            let content = if is_title {
                "Greeting Chat".to_string()
            } else {
                let n = self.replies.fetch_add(1, Ordering::SeqCst) + 1;
                format!("reply {n}")
            };

            Ok(CompletionResponse {
                content,
                model: "stub".to_string(),
                stop_reason: None,
                usage: Usage::default(),
            })
        }
    }

    async fn test_app(fail: bool) -> (Router, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("api.db").display());
        let pool = DatabasePool::new(&url).await.unwrap();
        let provider = BoxLlmProvider::new(StubProvider {
            fail,
            replies: AtomicUsize::new(0),
        });

        let state = AppState::from_parts(pool, provider, GlobalConfig::default());
        (build_router(state), dir)
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn post_chat(body: &str) -> Request<Body> {
        Request::post("/chat")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn first_chat_creates_session_and_history() {
        let (app, _dir) = test_app(false).await;

        let (status, body) = send(
            &app,
            post_chat(r#"{"session_id":"s1","message":"hello"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "reply": "reply 1" }));

        let (status, sessions) = send(&app, get("/sessions")).await;
        assert_eq!(status, StatusCode::OK);
        let sessions = sessions.as_array().unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0]["session_id"], "s1");
        assert_eq!(sessions[0]["title"], "Greeting Chat");
        assert!(sessions[0]["created_at"].is_string());

        let (_, history) = send(&app, get("/history/s1")).await;
        let history = history.as_array().unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0]["role"], "user");
        assert_eq!(history[0]["content"], "hello");
        assert_eq!(history[1]["role"], "assistant");
        assert_eq!(history[1]["content"], "reply 1");
    }

    #[tokio::test]
    async fn follow_up_appends_and_keeps_title() {
        let (app, _dir) = test_app(false).await;

        send(&app, post_chat(r#"{"session_id":"s1","message":"hello"}"#)).await;
        let (status, body) =
            send(&app, post_chat(r#"{"session_id":"s1","message":"again"}"#)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["reply"], "reply 2");

        let (_, history) = send(&app, get("/history/s1")).await;
        let contents: Vec<&str> = history
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["content"].as_str().unwrap())
            .collect();
        assert_eq!(contents, vec!["hello", "reply 1", "again", "reply 2"]);

        let (_, sessions) = send(&app, get("/sessions")).await;
        let sessions = sessions.as_array().unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0]["title"], "Greeting Chat");
    }

    #[tokio::test]
    async fn multi_megabyte_message_is_accepted() {
        let (app, _dir) = test_app(false).await;
        let message = "a".repeat(3 * 1024 * 1024);
        let body = json!({ "session_id": "s1", "message": &message }).to_string();

        let (status, response) = send(&app, post_chat(&body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(response["reply"], "reply 1");

        let (_, history) = send(&app, get("/history/s1")).await;
        assert_eq!(history[0]["content"].as_str().unwrap().len(), message.len());
    }

    #[tokio::test]
    async fn sessions_lists_one_entry_per_id() {
        let (app, _dir) = test_app(false).await;

        for id in ["a", "b", "c"] {
            let body = format!(r#"{{"session_id":"{id}","message":"hi"}}"#);
            let (status, _) = send(&app, post_chat(&body)).await;
            assert_eq!(status, StatusCode::OK);
        }

        let (_, sessions) = send(&app, get("/sessions")).await;
        let ids: Vec<&str> = sessions
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["session_id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn invalid_requests_are_rejected_without_writes() {
        let (app, _dir) = test_app(false).await;

        for body in [
            r#"{"message":"hi"}"#,
            r#"{"session_id":"s1"}"#,
            r#"{"session_id":"s1","message":""}"#,
            r#"{"session_id":"","message":"hi"}"#,
            "not json",
        ] {
            let (status, response) = send(&app, post_chat(body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "body: {body}");
            assert_eq!(response["error"], "session_id and message required");
        }

        let (_, sessions) = send(&app, get("/sessions")).await;
        assert_eq!(sessions, json!([]));
        let (_, history) = send(&app, get("/history/s1")).await;
        assert_eq!(history, json!([]));
    }

    #[tokio::test]
    async fn model_failure_returns_500_and_persists_nothing() {
        let (app, _dir) = test_app(true).await;

        let (status, body) =
            send(&app, post_chat(r#"{"session_id":"s1","message":"hello"}"#)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "LLM not responding" }));

        let (_, sessions) = send(&app, get("/sessions")).await;
        assert_eq!(sessions, json!([]));
    }

    #[tokio::test]
    async fn unknown_history_is_empty() {
        let (app, _dir) = test_app(false).await;

        let (status, body) = send(&app, get("/history/never-used")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let (app, _dir) = test_app(false).await;

        let (status, body) = send(&app, get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }
}
