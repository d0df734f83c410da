//! API routes

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::conversation::{Language, Message};
use crate::core::API_KEY_REQUIRED;
use crate::AppState;

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Debug, Serialize)]
struct StatusResponse {
    ready: bool,
    model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    notice: Option<&'static str>,
    memory: bool,
    translator: bool,
    agent: bool,
    language: Language,
}

#[derive(Debug, Serialize)]
struct LanguageInfo {
    name: &'static str,
    tag: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
    pub turns: Vec<Message>,
}

#[derive(Debug, Deserialize)]
pub struct LanguageRequest {
    pub language: String,
}

#[derive(Debug, Serialize)]
struct HistoryResponse {
    language: Language,
    turns: Vec<Message>,
}

/// Errors returned to API clients
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{}", API_KEY_REQUIRED)]
    NotConfigured,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

fn parse_language(raw: &str) -> Result<Language, ApiError> {
    raw.parse::<Language>()
        .map_err(|e| ApiError::BadRequest(e.to_string()))
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    let language = state.session.read().await.language;
    let response = match state.orchestrator {
        Some(ref engine) => StatusResponse {
            ready: true,
            model: state.config.sutra_model.clone(),
            notice: None,
            memory: engine.memory().is_enabled(),
            translator: engine.memory().translator().is_enabled(),
            agent: engine.strategy_names().contains(&"agent"),
            language,
        },
        None => StatusResponse {
            ready: false,
            model: state.config.sutra_model.clone(),
            notice: Some(API_KEY_REQUIRED),
            memory: false,
            translator: false,
            agent: false,
            language,
        },
    };
    Json(response)
}

async fn languages() -> Json<Vec<LanguageInfo>> {
    Json(
        Language::ALL
            .iter()
            .map(|lang| LanguageInfo {
                name: lang.name(),
                tag: lang.tag(),
            })
            .collect(),
    )
}

async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let engine = state.orchestrator.as_ref().ok_or(ApiError::NotConfigured)?;

    if request.message.trim().is_empty() {
        return Err(ApiError::BadRequest("message must not be empty".to_string()));
    }
    let language = request.language.as_deref().map(parse_language).transpose()?;

    let _turn = state.turn_lock.lock().await;

    // The turn runs on a copy so readers are not blocked behind the model call
    let mut working = {
        let mut session = state.session.write().await;
        if let Some(language) = language {
            session.language = language;
        }
        session.clone()
    };
    let before = working.turns.len();

    let reply = engine.handle_turn(&mut working, &request.message).await;

    let mut session = state.session.write().await;
    session.turns.extend(working.turns.drain(before..));

    Ok(Json(ChatResponse {
        reply,
        turns: session.turns.clone(),
    }))
}

async fn history(State(state): State<AppState>) -> Json<HistoryResponse> {
    let session = state.session.read().await;
    Json(HistoryResponse {
        language: session.language,
        turns: session.turns.clone(),
    })
}

async fn clear_history(State(state): State<AppState>) -> StatusCode {
    state.session.write().await.clear();
    tracing::info!("chat history cleared");
    StatusCode::NO_CONTENT
}

async fn set_language(
    State(state): State<AppState>,
    Json(request): Json<LanguageRequest>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let language = parse_language(&request.language)?;
    let mut session = state.session.write().await;
    session.language = language;
    Ok(Json(HistoryResponse {
        language,
        turns: session.turns.clone(),
    }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/v1/status", get(status))
        .route("/v1/languages", get(languages))
        .route("/v1/chat", post(chat))
        .route("/v1/history", get(history).delete(clear_history))
        .route("/v1/language", put(set_language))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, Persona};
    use crate::conversation::SessionContext;
    use crate::core::{DirectStrategy, MemoryGateway, ReplyStrategy, TurnOrchestrator};
    use crate::providers::{OpenAICompatConfig, OpenAICompatProvider};
    use crate::test_support::spawn_stub;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::Value;
    use std::sync::Arc;
    use tokio::sync::{Mutex, RwLock};
    use tower::ServiceExt;

    fn state(orchestrator: Option<TurnOrchestrator>) -> AppState {
        AppState {
            config: Arc::new(Config::default()),
            orchestrator: orchestrator.map(Arc::new),
            session: Arc::new(RwLock::new(SessionContext::new("u", Language::English))),
            turn_lock: Arc::new(Mutex::new(())),
        }
    }

    async fn echo_orchestrator() -> TurnOrchestrator {
        let completions = Router::new().route(
            "/chat/completions",
            post(|Json(body): Json<Value>| async move {
                let system = body["messages"][0]["content"].as_str().unwrap_or_default();
                let lang = if system.contains("in hindi.") { "hindi" } else { "other" };
                let user = body["messages"][1]["content"].as_str().unwrap_or_default();
                Json(json!({ "choices": [{ "message": { "content": format!("{lang}: {user}") } }] }))
            }),
        );
        let base = spawn_stub(completions).await;
        let provider = OpenAICompatProvider::new(OpenAICompatConfig::sutra("k").with_base_url(base)).unwrap();
        let direct: Arc<dyn ReplyStrategy> = Arc::new(DirectStrategy::new(Arc::new(provider), Persona::builtin()));
        TurnOrchestrator::new(MemoryGateway::disabled(), vec![direct])
    }

    async fn send(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_health() {
        let app = router().with_state(state(None));
        let (status, body) = send(app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_missing_key_notice() {
        let app = router().with_state(state(None));

        let (status, body) = send(app.clone(), "GET", "/v1/status", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ready"], false);
        assert_eq!(body["notice"], API_KEY_REQUIRED);

        let (status, body) = send(app, "POST", "/v1/chat", Some(json!({ "message": "Hello" }))).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"], API_KEY_REQUIRED);
    }

    #[tokio::test]
    async fn test_chat_appends_turns() {
        let app = router().with_state(state(Some(echo_orchestrator().await)));

        let (status, body) = send(app.clone(), "POST", "/v1/chat", Some(json!({ "message": "Hello" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["reply"], "other: Hello");
        assert_eq!(body["turns"].as_array().unwrap().len(), 2);
        assert_eq!(body["turns"][0]["role"], "user");
        assert_eq!(body["turns"][1]["role"], "assistant");

        let (_, body) = send(
            app.clone(),
            "POST",
            "/v1/chat",
            Some(json!({ "message": "Namaste", "language": "Hindi" })),
        )
        .await;
        assert_eq!(body["reply"], "hindi: Namaste");

        let (_, body) = send(app.clone(), "GET", "/v1/history", None).await;
        assert_eq!(body["language"], "hindi");
        assert_eq!(body["turns"].as_array().unwrap().len(), 4);

        let (status, _) = send(app.clone(), "DELETE", "/v1/history", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (_, body) = send(app, "GET", "/v1/history", None).await;
        assert!(body["turns"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_chat_keeps_message_untrimmed() {
        let app = router().with_state(state(Some(echo_orchestrator().await)));

        let (status, body) = send(app, "POST", "/v1/chat", Some(json!({ "message": "  Hello \n" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["reply"], "other:   Hello \n");
        assert_eq!(body["turns"][0]["content"], "  Hello \n");
    }

    #[tokio::test]
    async fn test_reads_do_not_wait_for_a_running_turn() {
        let completions = Router::new().route(
            "/chat/completions",
            post(|| async {
                tokio::time::sleep(std::time::Duration::from_secs(2)).await;
                Json(json!({ "choices": [{ "message": { "content": "slow hello" } }] }))
            }),
        );
        let base = spawn_stub(completions).await;
        let provider = OpenAICompatProvider::new(OpenAICompatConfig::sutra("k").with_base_url(base)).unwrap();
        let direct: Arc<dyn ReplyStrategy> = Arc::new(DirectStrategy::new(Arc::new(provider), Persona::builtin()));
        let engine = TurnOrchestrator::new(MemoryGateway::disabled(), vec![direct]);
        let app = router().with_state(state(Some(engine)));

        let turn = tokio::spawn(send(app.clone(), "POST", "/v1/chat", Some(json!({ "message": "Hello" }))));
        tokio::time::sleep(std::time::Duration::from_millis(300)).await;

        let quick = std::time::Duration::from_millis(500);
        let (status, _) = tokio::time::timeout(quick, send(app.clone(), "GET", "/v1/status", None))
            .await
            .expect("status answered during the turn");
        assert_eq!(status, StatusCode::OK);
        let (_, body) = tokio::time::timeout(quick, send(app.clone(), "GET", "/v1/history", None))
            .await
            .expect("history answered during the turn");
        assert!(body["turns"].as_array().unwrap().is_empty());

        let (_, body) = turn.await.unwrap();
        assert_eq!(body["reply"], "slow hello");
        let (_, body) = send(app, "GET", "/v1/history", None).await;
        assert_eq!(body["turns"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_chat_rejects_bad_input() {
        let app = router().with_state(state(Some(echo_orchestrator().await)));

        let (status, _) = send(app.clone(), "POST", "/v1/chat", Some(json!({ "message": "   " }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(
            app,
            "POST",
            "/v1/chat",
            Some(json!({ "message": "hi", "language": "klingon" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("klingon"));
    }

    #[tokio::test]
    async fn test_language_endpoints() {
        let app = router().with_state(state(None));

        let (_, body) = send(app.clone(), "GET", "/v1/languages", None).await;
        let langs = body.as_array().unwrap();
        assert_eq!(langs.len(), 9);
        assert_eq!(langs[0]["name"], "English");
        assert_eq!(langs[8]["tag"], "bihari");

        let (status, body) = send(app.clone(), "PUT", "/v1/language", Some(json!({ "language": "kannada" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["language"], "kannada");

        let (status, _) = send(app, "PUT", "/v1/language", Some(json!({ "language": "xx" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
