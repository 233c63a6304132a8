//! Endpoint methods of the MAX Bot API.
//!
//! Each method maps to exactly one HTTP endpoint and does nothing but
//! describe the call for `MaxClient::execute`. Parameters and bodies are
//! passed through as JSON objects; see the platform documentation for the
//! fields each endpoint accepts.

use serde_json::Value;

use crate::client::MaxClient;
use crate::error::ApiError;
use crate::http::HttpMethod;
use crate::query::encode_segment;
use crate::types::{ApiRequest, Payload};

fn get(path: impl Into<String>) -> ApiRequest {
    ApiRequest::new(HttpMethod::Get, path)
}

fn post(path: impl Into<String>) -> ApiRequest {
    ApiRequest::new(HttpMethod::Post, path)
}

fn put(path: impl Into<String>) -> ApiRequest {
    ApiRequest::new(HttpMethod::Put, path)
}

fn patch(path: impl Into<String>) -> ApiRequest {
    ApiRequest::new(HttpMethod::Patch, path)
}

fn delete(path: impl Into<String>) -> ApiRequest {
    ApiRequest::new(HttpMethod::Delete, path)
}

impl MaxClient {
    // -----------------------------------------------------------------------
    // Bot
    // -----------------------------------------------------------------------

    /// `GET /me` — information about the current bot.
    pub fn get_me(&self) -> Result<Payload, ApiError> {
        self.execute_object(&get("/me"))
    }

    // -----------------------------------------------------------------------
    // Chats
    // -----------------------------------------------------------------------

    /// `GET /chats` — chats the bot participates in.
    pub fn get_chats(&self, params: &Payload) -> Result<Payload, ApiError> {
        self.execute_object(&get("/chats").query(params.clone()))
    }

    pub fn get_chat(&self, chat_id: i64) -> Result<Payload, ApiError> {
        self.execute_object(&get(format!("/chats/{chat_id}")))
    }

    pub fn update_chat(&self, chat_id: i64, payload: &Payload) -> Result<Payload, ApiError> {
        self.execute_object(&patch(format!("/chats/{chat_id}")).body(payload.clone()))
    }

    pub fn delete_chat(&self, chat_id: i64) -> Result<Payload, ApiError> {
        self.execute_object(&delete(format!("/chats/{chat_id}")))
    }

    /// `POST /chats/{id}/actions`. Keys in `extra` override `action`.
    pub fn send_chat_action(
        &self,
        chat_id: i64,
        action: &str,
        extra: &Payload,
    ) -> Result<Payload, ApiError> {
        let mut body = Payload::new();
        body.insert("action".to_string(), Value::String(action.to_string()));
        body.extend(extra.clone());
        self.execute_object(&post(format!("/chats/{chat_id}/actions")).body(body))
    }

    /// `GET /chats/{id}/pin`. `None` when nothing is pinned.
    pub fn get_pinned_message(&self, chat_id: i64) -> Result<Option<Payload>, ApiError> {
        self.execute(&get(format!("/chats/{chat_id}/pin")))
    }

    pub fn pin_message(&self, chat_id: i64, payload: &Payload) -> Result<Payload, ApiError> {
        self.execute_object(&put(format!("/chats/{chat_id}/pin")).body(payload.clone()))
    }

    pub fn unpin_message(&self, chat_id: i64) -> Result<Payload, ApiError> {
        self.execute_object(&delete(format!("/chats/{chat_id}/pin")))
    }

    // -----------------------------------------------------------------------
    // Members
    // -----------------------------------------------------------------------

    pub fn get_bot_membership(&self, chat_id: i64) -> Result<Payload, ApiError> {
        self.execute_object(&get(format!("/chats/{chat_id}/members/me")))
    }

    pub fn leave_chat(&self, chat_id: i64) -> Result<Payload, ApiError> {
        self.execute_object(&delete(format!("/chats/{chat_id}/members/me")))
    }

    pub fn get_chat_admins(&self, chat_id: i64) -> Result<Payload, ApiError> {
        self.execute_object(&get(format!("/chats/{chat_id}/members/admins")))
    }

    pub fn assign_chat_admins(&self, chat_id: i64, payload: &Payload) -> Result<Payload, ApiError> {
        self.execute_object(&post(format!("/chats/{chat_id}/members/admins")).body(payload.clone()))
    }

    pub fn remove_chat_admin(&self, chat_id: i64, user_id: i64) -> Result<Payload, ApiError> {
        self.execute_object(&delete(format!("/chats/{chat_id}/members/admins/{user_id}")))
    }

    pub fn get_chat_members(&self, chat_id: i64, params: &Payload) -> Result<Payload, ApiError> {
        self.execute_object(&get(format!("/chats/{chat_id}/members")).query(params.clone()))
    }

    pub fn add_chat_members(&self, chat_id: i64, payload: &Payload) -> Result<Payload, ApiError> {
        self.execute_object(&post(format!("/chats/{chat_id}/members")).body(payload.clone()))
    }

    pub fn remove_chat_members(
        &self,
        chat_id: i64,
        payload: &Payload,
    ) -> Result<Payload, ApiError> {
        self.execute_object(&delete(format!("/chats/{chat_id}/members")).body(payload.clone()))
    }

    // -----------------------------------------------------------------------
    // Subscriptions and updates
    // -----------------------------------------------------------------------

    pub fn get_subscriptions(&self) -> Result<Payload, ApiError> {
        self.execute_object(&get("/subscriptions"))
    }

    pub fn create_subscription(&self, payload: &Payload) -> Result<Payload, ApiError> {
        self.execute_object(&post("/subscriptions").body(payload.clone()))
    }

    pub fn delete_subscription(&self, payload: &Payload) -> Result<Payload, ApiError> {
        self.execute_object(&delete("/subscriptions").body(payload.clone()))
    }

    /// `GET /updates` — long polling; pass `marker`, `limit`, `timeout`, `types`.
    pub fn get_updates(&self, params: &Payload) -> Result<Payload, ApiError> {
        self.execute_object(&get("/updates").query(params.clone()))
    }

    pub fn create_upload(&self, payload: &Payload) -> Result<Payload, ApiError> {
        self.execute_object(&post("/uploads").body(payload.clone()))
    }

    // -----------------------------------------------------------------------
    // Messages
    // -----------------------------------------------------------------------

    pub fn get_messages(&self, params: &Payload) -> Result<Payload, ApiError> {
        self.execute_object(&get("/messages").query(params.clone()))
    }

    pub fn send_message(&self, payload: &Payload) -> Result<Payload, ApiError> {
        self.execute_object(&post("/messages").body(payload.clone()))
    }

    pub fn edit_message(&self, payload: &Payload) -> Result<Payload, ApiError> {
        self.execute_object(&put("/messages").body(payload.clone()))
    }

    pub fn delete_message(&self, payload: &Payload) -> Result<Payload, ApiError> {
        self.execute_object(&delete("/messages").body(payload.clone()))
    }

    pub fn get_message(&self, message_id: &str) -> Result<Payload, ApiError> {
        self.execute_object(&get(format!("/messages/{}", encode_segment(message_id))))
    }

    pub fn get_video(&self, video_token: &str) -> Result<Payload, ApiError> {
        self.execute_object(&get(format!("/videos/{}", encode_segment(video_token))))
    }

    /// `POST /answers` — reply to a callback button press.
    pub fn answer_callback(&self, payload: &Payload) -> Result<Payload, ApiError> {
        self.execute_object(&post("/answers").body(payload.clone()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use crate::config::ClientConfig;
    use crate::http::{HttpMethod, HttpRequest};
    use crate::transport::StubTransport;

    use super::*;

    fn stubbed(status: u16, body: &str) -> (MaxClient, Arc<StubTransport>) {
        let stub = Arc::new(StubTransport::new(status, body));
        let client = MaxClient::with_config(
            ClientConfig::new("token")
                .with_base_uri("https://example.com")
                .with_shared_transport(stub.clone()),
        )
        .unwrap();
        (client, stub)
    }

    fn payload(value: Value) -> Payload {
        value.as_object().cloned().unwrap()
    }

    fn sent(stub: &StubTransport) -> HttpRequest {
        stub.last_request().expect("no request was dispatched")
    }

    #[test]
    fn get_me_sends_auth_and_accept_headers() {
        let (client, stub) = stubbed(200, "{}");
        client.get_me().unwrap();
        let req = sent(&stub);
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "https://example.com/me");
        assert_eq!(req.header("Authorization"), Some("token"));
        assert_eq!(req.header("Accept"), Some("application/json"));
        assert_eq!(req.header("Content-Type"), None);
    }

    #[test]
    fn empty_object_response_is_empty_map() {
        let (client, _) = stubbed(200, "{}");
        assert_eq!(client.get_chat(7).unwrap(), Payload::new());
    }

    #[test]
    fn pinned_message_can_be_null() {
        let (client, stub) = stubbed(200, "null");
        assert_eq!(client.get_pinned_message(1).unwrap(), None);
        assert_eq!(sent(&stub).url, "https://example.com/chats/1/pin");
    }

    #[test]
    fn pinned_message_empty_body_is_empty_map() {
        let (client, _) = stubbed(200, "");
        assert_eq!(client.get_pinned_message(1).unwrap(), Some(Payload::new()));
    }

    #[test]
    fn error_status_raises_api_error() {
        let (client, _) = stubbed(400, r#"{"message":"Invalid"}"#);
        let err = client.get_chats(&Payload::new()).unwrap_err();
        assert!(matches!(err, ApiError::Api { status: 400, .. }));
        assert_eq!(err.to_string(), "Invalid");
        assert_eq!(err.code(), 400);
    }

    #[test]
    fn send_message_encodes_payload() {
        let (client, stub) = stubbed(200, r#"{"message_id":"1"}"#);
        let result = client
            .send_message(&payload(json!({"chat_id": 1, "text": "Hello"})))
            .unwrap();
        assert_eq!(Value::Object(result), json!({"message_id": "1"}));

        let req = sent(&stub);
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "https://example.com/messages");
        assert_eq!(req.header("Content-Type"), Some("application/json"));
        let body: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, json!({"chat_id": 1, "text": "Hello"}));
    }

    #[test]
    fn get_chats_encodes_query() {
        let (client, stub) = stubbed(200, "{}");
        client.get_chats(&payload(json!({"limit": 10}))).unwrap();
        assert_eq!(sent(&stub).url, "https://example.com/chats?limit=10");

        client.get_chats(&Payload::new()).unwrap();
        assert_eq!(sent(&stub).url, "https://example.com/chats");
    }

    #[test]
    fn send_chat_action_merges_extra() {
        let (client, stub) = stubbed(200, r#"{"success":true}"#);
        client
            .send_chat_action(5, "typing_on", &payload(json!({"note": "x"})))
            .unwrap();
        let req = sent(&stub);
        assert_eq!(req.url, "https://example.com/chats/5/actions");
        let body: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, json!({"action": "typing_on", "note": "x"}));
    }

    #[test]
    fn send_chat_action_extra_wins() {
        let (client, stub) = stubbed(200, "{}");
        client
            .send_chat_action(5, "typing_on", &payload(json!({"action": "mark_seen"})))
            .unwrap();
        let body: Value = serde_json::from_str(sent(&stub).body.as_deref().unwrap()).unwrap();
        assert_eq!(body, json!({"action": "mark_seen"}));
    }

    #[test]
    fn delete_with_body_keeps_body() {
        let (client, stub) = stubbed(200, r#"{"success":true}"#);
        client
            .remove_chat_members(3, &payload(json!({"user_ids": [1, 2]})))
            .unwrap();
        let req = sent(&stub);
        assert_eq!(req.method, HttpMethod::Delete);
        assert_eq!(req.url, "https://example.com/chats/3/members");
        assert!(req.body.is_some());
    }

    #[test]
    fn string_ids_are_path_encoded() {
        let (client, stub) = stubbed(200, "{}");
        client.get_message("mid.abc/1").unwrap();
        assert_eq!(sent(&stub).url, "https://example.com/messages/mid.abc%2F1");
        client.get_video("tok en").unwrap();
        assert_eq!(sent(&stub).url, "https://example.com/videos/tok%20en");
    }

    #[test]
    fn null_result_is_decode_failure_for_object_endpoints() {
        let (client, _) = stubbed(200, "null");
        assert!(matches!(client.get_me(), Err(ApiError::Decode(_))));
    }
}
