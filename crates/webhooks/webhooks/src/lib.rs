//! # Media Webhooks
//!
//! Webhook delivery for media platform events providing:
//! - Event filtering by name
//! - Per-room ordered delivery over a bounded, partitioned worker pool
//! - Signed requests (HS256 token binding a SHA-256 digest of the body)
//! - Retries with exponential backoff
//! - Drop accounting reported to the endpoint
//! - Verification of incoming webhooks
//!
//! ## Example
//!
//! ```rust,ignore
//! use media_webhooks::{UrlNotifier, WebhookConfig};
//! use media_webhooks_events::{event_names, Room, WebhookEvent};
//!
//! let notifier = UrlNotifier::new(
//!     WebhookConfig::new("https://example.com/webhook").keys("api-key", "api-secret"),
//! )?;
//!
//! let event = WebhookEvent::new(event_names::ROOM_STARTED)
//!     .with_room(Room::new("RM_1", "standup"));
//! notifier.queue_notify(event);
//!
//! // Send everything still queued before exiting.
//! notifier.stop(false).await;
//! ```

mod client;
mod error;
mod filter;
mod info;
mod notifier;
pub mod pool;
mod receiver;
mod retry;

pub use client::{HttpClientParams, RetryingClient, WEBHOOK_CONTENT_TYPE};
pub use error::{WebhookError, WebhookResult};
pub use filter::{EventFilter, FilterParams};
pub use info::WebhookInfo;
pub use notifier::{
    Disposition, FieldsHook, ProcessedHook, QueuedNotifier, UrlNotifier, WebhookConfig,
};
pub use pool::QueuePool;
pub use receiver::{WebhookReceiver, AUTH_HEADER};
pub use retry::{ExponentialBackoff, RetryStrategy};
