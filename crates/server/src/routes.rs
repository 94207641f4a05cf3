use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::Stream;
use tracing::info;
use uuid::Uuid;

use crate::health;
use crate::state::{ApiError, AppState, ChatTurn};

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/session", post(create_session))
        .route("/chat", post(chat))
        .route("/chat/stream", get(chat_stream))
        .route("/history", get(history))
        .route("/health", get(health::health))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub user_id: String,
}

#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    pub session_id: String,
}

pub async fn create_session(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateSessionRequest>,
) -> Result<Json<CreateSessionResponse>, ApiError> {
    let session_id = Uuid::new_v4().to_string();

    state
        .conversations
        .write()
        .map_err(|_| ApiError::lock_poisoned(&session_id))?
        .insert(session_id.clone(), Vec::new());

    let profile = state
        .registry
        .read()
        .map_err(|_| ApiError::lock_poisoned(&session_id))?
        .find_by_username(&request.user_id);

    state
        .sessions
        .write()
        .map_err(|_| ApiError::lock_poisoned(&session_id))?
        .init(&session_id, profile.as_ref());

    info!(
        event_name = "system.session.created",
        session_id = %session_id,
        user_id = %request.user_id,
        profile_attached = profile.is_some(),
        "session created"
    );

    Ok(Json(CreateSessionResponse { session_id }))
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub session_id: String,
    pub user_id: String,
    pub message: String,
    #[serde(default)]
    pub metadata: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub answer: String,
}

pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let answer =
        answer_message(&state, &request.session_id, &request.user_id, &request.message).await?;
    Ok(Json(ChatResponse { answer }))
}

#[derive(Debug, Deserialize)]
pub struct ChatStreamParams {
    pub session_id: String,
    pub user_id: String,
    /// User message.
    pub q: String,
}

pub async fn chat_stream(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ChatStreamParams>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let answer = answer_message(&state, &params.session_id, &params.user_id, &params.q).await?;

    let (tx, rx) = tokio::sync::mpsc::channel::<Result<Event, Infallible>>(16);
    tokio::spawn(async move {
        for delta in stream_chunks(&answer) {
            let event = Event::default().data(json!({ "delta": delta }).to_string());
            if tx.send(Ok(event)).await.is_err() {
                return;
            }
        }
        let event = Event::default().data(json!({ "final": answer }).to_string());
        let _ = tx.send(Ok(event)).await;
    });

    Ok(Sse::new(ReceiverStream::new(rx)).keep_alive(KeepAlive::default()))
}

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub session_id: String,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub messages: Vec<ChatTurn>,
}

pub async fn history(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let conversations =
        state.conversations.read().map_err(|_| ApiError::lock_poisoned(&params.session_id))?;
    let messages = conversations
        .get(&params.session_id)
        .cloned()
        .ok_or_else(|| ApiError::unknown_session(&params.session_id))?;

    Ok(Json(HistoryResponse { messages }))
}

/// Shared chat path: validate the session, record the user turn, run the
/// agent, record the assistant turn.
async fn answer_message(
    state: &AppState,
    session_id: &str,
    user_id: &str,
    message: &str,
) -> Result<String, ApiError> {
    {
        let mut conversations =
            state.conversations.write().map_err(|_| ApiError::lock_poisoned(session_id))?;
        let turns =
            conversations.get_mut(session_id).ok_or_else(|| ApiError::unknown_session(session_id))?;
        turns.push(ChatTurn::user(message));
    }

    let reply = state
        .runtime
        .handle_message(session_id, user_id, message)
        .await
        .map_err(|error| ApiError(error.into_interface(session_id)))?;

    info!(
        event_name = "system.chat.answered",
        session_id,
        agent = reply.agent.as_str(),
        "chat message answered"
    );

    let mut conversations =
        state.conversations.write().map_err(|_| ApiError::lock_poisoned(session_id))?;
    if let Some(turns) = conversations.get_mut(session_id) {
        turns.push(ChatTurn::assistant(reply.text.clone()));
    }

    Ok(reply.text)
}

/// Split an answer into word-group deltas for the SSE stream.
pub fn stream_chunks(answer: &str) -> Vec<String> {
    const WORDS_PER_CHUNK: usize = 6;

    let words: Vec<&str> = answer.split_whitespace().collect();
    words.chunks(WORDS_PER_CHUNK).map(|chunk| format!("{} ", chunk.join(" "))).collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::extract::{Query, State};
    use axum::Json;
    use funda_core::config::AppConfig;
    use funda_core::errors::InterfaceError;

    use crate::bootstrap::bootstrap_with_config;
    use crate::state::AppState;

    use super::{
        chat, create_session, history, stream_chunks, ChatRequest, CreateSessionRequest,
        HistoryParams,
    };

    fn app_state() -> Arc<AppState> {
        bootstrap_with_config(AppConfig::default()).expect("bootstrap succeeds").state
    }

    async fn open_session(state: &Arc<AppState>, user_id: &str) -> String {
        let Json(response) = create_session(
            State(state.clone()),
            Json(CreateSessionRequest { user_id: user_id.to_string() }),
        )
        .await
        .expect("session created");
        response.session_id
    }

    #[tokio::test]
    async fn create_session_attaches_known_profile_to_session_state() {
        let state = app_state();
        let session_id = open_session(&state, "alice").await;

        let session = state.sessions.read().expect("lock").get(&session_id);
        assert_eq!(session["user_profile"]["uid"], "U1001");
        assert!(session.contains_key("pricing"));
        assert!(session.contains_key("entitlements"));
    }

    #[tokio::test]
    async fn create_session_for_unknown_user_still_creates_state() {
        let state = app_state();
        let session_id = open_session(&state, "nobody-here").await;

        let session = state.sessions.read().expect("lock").get(&session_id);
        assert!(session.contains_key("created_at"));
        assert!(!session.contains_key("user_profile"));
    }

    #[tokio::test]
    async fn chat_rejects_unknown_session_with_not_found() {
        let state = app_state();
        let error = chat(
            State(state),
            Json(ChatRequest {
                session_id: "missing".to_string(),
                user_id: "alice".to_string(),
                message: "hello".to_string(),
                metadata: None,
            }),
        )
        .await
        .err()
        .expect("unknown session should fail");

        assert!(matches!(error.0, InterfaceError::NotFound { .. }));
    }

    #[tokio::test]
    async fn chat_appends_history_in_order() {
        let state = app_state();
        let session_id = open_session(&state, "alice").await;

        let Json(response) = chat(
            State(state.clone()),
            Json(ChatRequest {
                session_id: session_id.clone(),
                user_id: "alice".to_string(),
                message: "show me my account statement".to_string(),
                metadata: None,
            }),
        )
        .await
        .expect("chat answered");
        assert!(response.answer.contains("account statement"));

        let Json(history_response) =
            history(State(state), Query(HistoryParams { session_id }))
                .await
                .expect("history exists");

        assert_eq!(history_response.messages.len(), 2);
        assert_eq!(history_response.messages[0].role, "user");
        assert_eq!(history_response.messages[1].role, "assistant");
        assert_eq!(history_response.messages[1].content, response.answer);
    }

    #[tokio::test]
    async fn history_rejects_unknown_session() {
        let state = app_state();
        let error = history(
            State(state),
            Query(HistoryParams { session_id: "missing".to_string() }),
        )
        .await
        .err()
        .expect("unknown session should fail");

        assert!(matches!(error.0, InterfaceError::NotFound { .. }));
    }

    #[test]
    fn stream_chunks_cover_the_full_answer() {
        let answer = "one two three four five six seven eight";
        let chunks = stream_chunks(answer);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0], "one two three four five six ");
        assert_eq!(chunks[1], "seven eight ");

        let rejoined: String = chunks.concat();
        assert_eq!(rejoined.split_whitespace().collect::<Vec<_>>().join(" "), answer);
    }

    #[test]
    fn stream_chunks_of_empty_answer_are_empty() {
        assert!(stream_chunks("").is_empty());
    }
}
