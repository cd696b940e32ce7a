//! Shared helpers for notifier integration tests.

#![allow(dead_code)]

use std::time::Duration;

use media_webhooks::{ProcessedHook, WebhookConfig, WebhookInfo};
use media_webhooks_events::{Room, WebhookEvent};
use serde_json::Value;
use tokio::sync::mpsc;
use wiremock::{MockServer, Request};

pub const API_KEY: &str = "api-key";
pub const API_SECRET: &str = "api-secret";

/// Config pointing at the mock server with fast retries.
pub fn notifier_config(server: &MockServer) -> WebhookConfig {
    WebhookConfig::new(format!("{}/webhook", server.uri()))
        .keys(API_KEY, API_SECRET)
        .retry_wait(Duration::from_millis(1), Duration::from_millis(5))
        .max_retries(2)
        .timeout(Duration::from_secs(5))
}

/// A processed hook that forwards every outcome into a channel.
pub fn outcome_channel() -> (ProcessedHook, mpsc::UnboundedReceiver<WebhookInfo>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let hook: ProcessedHook = std::sync::Arc::new(move |info: &WebhookInfo| {
        let _ = tx.send(info.clone());
    });
    (hook, rx)
}

/// Waits for the next delivery outcome.
pub async fn next_outcome(rx: &mut mpsc::UnboundedReceiver<WebhookInfo>) -> WebhookInfo {
    tokio::time::timeout(Duration::from_secs(10), rx.recv())
        .await
        .expect("timed out waiting for webhook outcome")
        .expect("outcome channel closed")
}

/// An event attached to a room.
pub fn room_event(event: &str, room_sid: &str) -> WebhookEvent {
    WebhookEvent::new(event).with_room(Room::new(room_sid, format!("room-{room_sid}")))
}

/// Bodies of all requests the server received, in arrival order.
pub async fn received_bodies(server: &MockServer) -> Vec<Value> {
    received(server)
        .await
        .iter()
        .map(|r| serde_json::from_slice(&r.body).expect("body is not json"))
        .collect()
}

pub async fn received(server: &MockServer) -> Vec<Request> {
    server.received_requests().await.unwrap_or_default()
}

pub fn auth_header(request: &Request) -> String {
    request
        .headers
        .get("authorization")
        .expect("missing authorization header")
        .to_str()
        .unwrap()
        .to_string()
}
