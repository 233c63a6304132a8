//! In-memory fake of the MAX platform API.
//!
//! Covers the endpoints the client's end-to-end tests exercise. Every route
//! requires the configured token in the `Authorization` header; failures use
//! the platform's `{"code": ..., "message": ...}` error shape.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use axum::{
    extract::{Path, Query, Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const DEFAULT_TOKEN: &str = "test-token";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Chat {
    pub chat_id: i64,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub mid: String,
    pub chat_id: i64,
    pub text: String,
}

#[derive(Debug, Default)]
pub struct Platform {
    pub chats: BTreeMap<i64, Chat>,
    pub messages: Vec<Message>,
    pub pins: HashMap<i64, String>,
    pub subscriptions: Vec<String>,
}

impl Platform {
    fn seeded() -> Self {
        let mut platform = Platform::default();
        for (chat_id, title) in [(1, "General"), (2, "Random")] {
            platform.chats.insert(
                chat_id,
                Chat {
                    chat_id,
                    title: title.to_string(),
                    kind: "chat".to_string(),
                },
            );
        }
        platform
    }

    fn chat(&self, chat_id: i64) -> Result<&Chat, ApiFailure> {
        self.chats.get(&chat_id).ok_or_else(|| ApiFailure::not_found("Chat not found"))
    }

    fn message_index(&self, mid: &str) -> Result<usize, ApiFailure> {
        self.messages
            .iter()
            .position(|m| m.mid == mid)
            .ok_or_else(|| ApiFailure::not_found("Message not found"))
    }
}

#[derive(Clone)]
pub struct AppState {
    token: Arc<str>,
    db: Arc<RwLock<Platform>>,
}

/// Error response in the platform's JSON shape.
#[derive(Debug)]
pub struct ApiFailure {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiFailure {
    fn not_found(message: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            code: "not.found",
            message: message.to_string(),
        }
    }

    fn bad_request(message: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code: "proto.payload",
            message: message.to_string(),
        }
    }

    fn unauthorized() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            code: "verify.token",
            message: "Invalid access_token".to_string(),
        }
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        (self.status, Json(json!({"code": self.code, "message": self.message}))).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiFailure>;

fn success() -> Json<Value> {
    Json(json!({"success": true}))
}

pub fn app() -> Router {
    app_with_token(DEFAULT_TOKEN)
}

pub fn app_with_token(token: &str) -> Router {
    let state = AppState {
        token: Arc::from(token),
        db: Arc::new(RwLock::new(Platform::seeded())),
    };
    Router::new()
        .route("/me", get(get_me))
        .route("/chats", get(list_chats))
        .route("/chats/{id}", get(get_chat).patch(update_chat).delete(delete_chat))
        .route("/chats/{id}/actions", post(send_action))
        .route("/chats/{id}/pin", get(get_pin).put(pin_message).delete(unpin_message))
        .route(
            "/messages",
            get(list_messages).post(send_message).put(edit_message).delete(delete_message),
        )
        .route(
            "/subscriptions",
            get(list_subscriptions).post(subscribe).delete(unsubscribe),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_token))
        .with_state(state)
}

pub async fn run_with_token(listener: TcpListener, token: &str) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_token(token)).await
}

async fn require_token(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let presented = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    if presented != Some(&*state.token) {
        tracing::debug!(path = %request.uri().path(), "rejecting request with bad token");
        return ApiFailure::unauthorized().into_response();
    }
    next.run(request).await
}

async fn get_me() -> Json<Value> {
    Json(json!({
        "user_id": 100,
        "name": "Mock Bot",
        "username": "mock_bot",
        "is_bot": true
    }))
}

#[derive(Deserialize)]
struct Paging {
    count: Option<usize>,
}

async fn list_chats(State(state): State<AppState>, Query(paging): Query<Paging>) -> Json<Value> {
    let db = state.db.read().await;
    let chats: Vec<&Chat> = db.chats.values().take(paging.count.unwrap_or(50)).collect();
    Json(json!({"chats": chats, "marker": null}))
}

async fn get_chat(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Chat> {
    let db = state.db.read().await;
    let chat = db.chat(id)?.clone();
    Ok(Json(chat))
}

#[derive(Deserialize)]
struct ChatPatch {
    title: Option<String>,
}

async fn update_chat(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<ChatPatch>,
) -> ApiResult<Chat> {
    let mut db = state.db.write().await;
    let chat = db
        .chats
        .get_mut(&id)
        .ok_or_else(|| ApiFailure::not_found("Chat not found"))?;
    if let Some(title) = input.title {
        chat.title = title;
    }
    Ok(Json(chat.clone()))
}

async fn delete_chat(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Value> {
    let mut db = state.db.write().await;
    db.chats
        .remove(&id)
        .map(|_| success())
        .ok_or_else(|| ApiFailure::not_found("Chat not found"))
}

#[derive(Deserialize)]
struct ChatAction {
    action: Option<String>,
}

async fn send_action(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<ChatAction>,
) -> ApiResult<Value> {
    let db = state.db.read().await;
    db.chat(id)?;
    match input.action.as_deref() {
        Some(
            "typing_on" | "sending_photo" | "sending_video" | "sending_audio" | "sending_file"
            | "mark_seen",
        ) => Ok(success()),
        _ => Err(ApiFailure::bad_request("Unknown action")),
    }
}

async fn get_pin(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Option<Value>> {
    let db = state.db.read().await;
    db.chat(id)?;
    let pinned = db
        .pins
        .get(&id)
        .and_then(|mid| db.messages.iter().find(|m| &m.mid == mid))
        .map(|message| json!({"message": message}));
    Ok(Json(pinned))
}

#[derive(Deserialize)]
struct PinRequest {
    message_id: String,
}

async fn pin_message(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<PinRequest>,
) -> ApiResult<Value> {
    let mut db = state.db.write().await;
    db.chat(id)?;
    db.message_index(&input.message_id)?;
    db.pins.insert(id, input.message_id);
    Ok(success())
}

async fn unpin_message(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Value> {
    let mut db = state.db.write().await;
    db.chat(id)?;
    db.pins.remove(&id);
    Ok(success())
}

#[derive(Deserialize)]
struct MessageFilter {
    chat_id: Option<i64>,
}

async fn list_messages(
    State(state): State<AppState>,
    Query(filter): Query<MessageFilter>,
) -> Json<Value> {
    let db = state.db.read().await;
    let messages: Vec<&Message> = db
        .messages
        .iter()
        .filter(|m| filter.chat_id.map_or(true, |chat_id| m.chat_id == chat_id))
        .collect();
    Json(json!({"messages": messages}))
}

#[derive(Deserialize)]
struct NewMessage {
    chat_id: i64,
    text: String,
}

async fn send_message(
    State(state): State<AppState>,
    Json(input): Json<NewMessage>,
) -> ApiResult<Value> {
    let mut db = state.db.write().await;
    db.chat(input.chat_id)?;
    let message = Message {
        mid: format!("mid.{}", Uuid::new_v4().simple()),
        chat_id: input.chat_id,
        text: input.text,
    };
    db.messages.push(message.clone());
    Ok(Json(json!({"message": message})))
}

#[derive(Deserialize)]
struct EditMessage {
    message_id: String,
    text: String,
}

async fn edit_message(
    State(state): State<AppState>,
    Json(input): Json<EditMessage>,
) -> ApiResult<Value> {
    let mut db = state.db.write().await;
    let index = db.message_index(&input.message_id)?;
    db.messages[index].text = input.text;
    Ok(success())
}

#[derive(Deserialize)]
struct MessageRef {
    message_id: String,
}

async fn delete_message(
    State(state): State<AppState>,
    Json(input): Json<MessageRef>,
) -> ApiResult<Value> {
    let mut db = state.db.write().await;
    let index = db.message_index(&input.message_id)?;
    db.messages.remove(index);
    db.pins.retain(|_, mid| *mid != input.message_id);
    Ok(success())
}

async fn list_subscriptions(State(state): State<AppState>) -> Json<Value> {
    let db = state.db.read().await;
    let subscriptions: Vec<Value> = db
        .subscriptions
        .iter()
        .map(|url| json!({"url": url}))
        .collect();
    Json(json!({"subscriptions": subscriptions}))
}

#[derive(Deserialize)]
struct Subscription {
    url: String,
}

async fn subscribe(
    State(state): State<AppState>,
    Json(input): Json<Subscription>,
) -> ApiResult<Value> {
    if !input.url.starts_with("https://") {
        return Err(ApiFailure::bad_request("Webhook URL must use https"));
    }
    let mut db = state.db.write().await;
    if !db.subscriptions.contains(&input.url) {
        db.subscriptions.push(input.url);
    }
    Ok(success())
}

async fn unsubscribe(
    State(state): State<AppState>,
    Json(input): Json<Subscription>,
) -> ApiResult<Value> {
    let mut db = state.db.write().await;
    db.subscriptions.retain(|url| *url != input.url);
    Ok(success())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_serializes_kind_as_type() {
        let chat = Chat {
            chat_id: 1,
            title: "General".to_string(),
            kind: "chat".to_string(),
        };
        let json = serde_json::to_value(&chat).unwrap();
        assert_eq!(json, json!({"chat_id": 1, "title": "General", "type": "chat"}));
    }

    #[test]
    fn seeded_platform_has_two_chats() {
        let platform = Platform::seeded();
        assert_eq!(platform.chats.len(), 2);
        assert_eq!(platform.chat(1).unwrap().title, "General");
        assert!(platform.chat(99).is_err());
    }

    #[test]
    fn failures_render_platform_error_shape() {
        let response = ApiFailure::unauthorized().into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn new_message_requires_chat_and_text() {
        let result: Result<NewMessage, _> = serde_json::from_str(r#"{"text":"hi"}"#);
        assert!(result.is_err());
        let input: NewMessage = serde_json::from_str(r#"{"chat_id":1,"text":"hi"}"#).unwrap();
        assert_eq!(input.chat_id, 1);
    }
}
