#![cfg(feature = "ureq-transport")]

//! End-to-end tests against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then drives the client through
//! its default ureq transport. This checks that the assembled requests
//! (methods, headers, bodies on PATCH/PUT/DELETE) survive a real HTTP stack
//! and that status classification works on real responses.

use std::time::Duration;

use max_api::{ApiError, ClientConfig, ErrorKind, MaxClient, Payload};
use serde_json::{json, Value};

const TOKEN: &str = "integration-token";

/// Start the mock server on a random port and return its base URI.
fn start_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run_with_token(listener, TOKEN).await
        })
        .unwrap();
    });

    format!("http://{addr}/")
}

fn client(base_uri: &str, token: &str) -> MaxClient {
    MaxClient::with_config(ClientConfig::new(token).with_base_uri(base_uri)).unwrap()
}

fn payload(value: Value) -> Payload {
    value.as_object().cloned().unwrap()
}

#[test]
fn messaging_lifecycle() {
    let base = start_server();
    let client = client(&base, TOKEN);

    // Step 1: bot info.
    let me = client.get_me().unwrap();
    assert_eq!(me["is_bot"], true);

    // Step 2: list chats with a query parameter.
    let chats = client.get_chats(&payload(json!({"count": 1}))).unwrap();
    assert_eq!(chats["chats"].as_array().unwrap().len(), 1);

    // Step 3: rename a chat through PATCH.
    let chat = client
        .update_chat(1, &payload(json!({"title": "Renamed"})))
        .unwrap();
    assert_eq!(chat["title"], "Renamed");
    assert_eq!(client.get_chat(1).unwrap()["title"], "Renamed");

    // Step 4: nothing pinned yet.
    assert_eq!(client.get_pinned_message(1).unwrap(), None);

    // Step 5: send a message.
    let sent = client
        .send_message(&payload(json!({"chat_id": 1, "text": "Hello"})))
        .unwrap();
    let mid = sent["message"]["mid"].as_str().unwrap().to_string();

    // Step 6: edit it through PUT.
    client
        .edit_message(&payload(json!({"message_id": mid, "text": "Hello, world"})))
        .unwrap();
    let messages = client.get_messages(&payload(json!({"chat_id": 1}))).unwrap();
    assert_eq!(messages["messages"][0]["text"], "Hello, world");

    // Step 7: pin it.
    client
        .pin_message(1, &payload(json!({"message_id": mid})))
        .unwrap();
    let pinned = client.get_pinned_message(1).unwrap().unwrap();
    assert_eq!(pinned["message"]["mid"], mid.as_str());

    // Step 8: typing indicator.
    let result = client.send_chat_action(1, "typing_on", &Payload::new()).unwrap();
    assert_eq!(result["success"], true);

    // Step 9: DELETE with a body removes the message and its pin.
    client
        .delete_message(&payload(json!({"message_id": mid})))
        .unwrap();
    assert_eq!(client.get_pinned_message(1).unwrap(), None);

    // Step 10: unpin is idempotent.
    client.unpin_message(1).unwrap();
}

#[test]
fn subscriptions_lifecycle() {
    let base = start_server();
    let client = client(&base, TOKEN);
    let hook = payload(json!({"url": "https://bot.example.com/hook"}));

    assert_eq!(client.get_subscriptions().unwrap()["subscriptions"], json!([]));
    client.create_subscription(&hook).unwrap();
    assert_eq!(
        client.get_subscriptions().unwrap()["subscriptions"],
        json!([{"url": "https://bot.example.com/hook"}])
    );
    client.delete_subscription(&hook).unwrap();
    assert_eq!(client.get_subscriptions().unwrap()["subscriptions"], json!([]));
}

#[test]
fn server_errors_carry_status_message_and_payload() {
    let base = start_server();
    let client = client(&base, TOKEN);

    let err = client.get_chat(404).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Api);
    assert_eq!(err.code(), 404);
    assert_eq!(err.to_string(), "Chat not found");
    assert_eq!(err.payload()["code"], "not.found");

    let err = client
        .send_chat_action(1, "dancing", &Payload::new())
        .unwrap_err();
    assert!(matches!(err, ApiError::Api { status: 400, .. }));
}

#[test]
fn wrong_token_is_rejected() {
    let base = start_server();
    let err = client(&base, "not-the-token").get_me().unwrap_err();
    assert_eq!(err.code(), 401);
    assert_eq!(err.to_string(), "Invalid access_token");
}

#[test]
fn unreachable_server_is_transport_failure() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let err = client(&format!("http://127.0.0.1:{port}"), TOKEN)
        .get_me()
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TransportFailure);
}

#[test]
fn zero_and_sub_second_timeouts_reach_the_server() {
    let base = start_server();
    for timeout in [Duration::ZERO, Duration::from_millis(500)] {
        let config = ClientConfig::new(TOKEN)
            .with_base_uri(base.as_str())
            .with_timeout(timeout);
        let me = MaxClient::with_config(config).unwrap().get_me().unwrap();
        assert_eq!(me["is_bot"], true, "timeout {timeout:?}");
    }
}
