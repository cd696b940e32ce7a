//! URL notifier: filters, queues, signs and delivers events to one endpoint.

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use media_webhooks_events::WebhookEvent;
use media_webhooks_token::{sha256_base64, AccessToken, TOKEN_VALIDITY};
use serde::{Deserialize, Serialize};
use tracing::Instrument;

use crate::client::{HttpClientParams, RetryingClient};
use crate::error::{WebhookError, WebhookResult};
use crate::filter::{EventFilter, FilterParams};
use crate::info::WebhookInfo;
use crate::pool::{QueuePool, DEFAULT_NUM_WORKERS, DEFAULT_QUEUE_SIZE};

/// Partition key for events that carry no room context.
const DEFAULT_PARTITION_KEY: &str = "default";

/// Called once per event with its delivery outcome.
pub type ProcessedHook = Arc<dyn Fn(&WebhookInfo) + Send + Sync>;

/// Called before the processed hook to annotate the outcome.
pub type FieldsHook = Arc<dyn Fn(&mut WebhookInfo) + Send + Sync>;

/// Notifier configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    /// Endpoint receiving every event.
    pub url: String,
    /// API key, sent as the token issuer.
    pub api_key: String,
    /// API secret used to sign tokens.
    pub api_secret: String,
    /// Queue depth per partition.
    pub queue_size: usize,
    /// Shortest wait between retries, in milliseconds.
    pub retry_wait_min_ms: u64,
    /// Longest wait between retries, in milliseconds.
    pub retry_wait_max_ms: u64,
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Per-request timeout in milliseconds. Zero disables the timeout.
    pub timeout_ms: u64,
    /// Event names to deliver or skip.
    pub filter: FilterParams,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key: String::new(),
            api_secret: String::new(),
            queue_size: DEFAULT_QUEUE_SIZE,
            retry_wait_min_ms: 1_000,
            retry_wait_max_ms: 30_000,
            max_retries: 4,
            timeout_ms: 30_000,
            filter: FilterParams::default(),
        }
    }
}

impl WebhookConfig {
    /// Creates a configuration for `url` with default settings.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Sets the signing key pair.
    pub fn keys(mut self, api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self.api_secret = api_secret.into();
        self
    }

    /// Sets the queue depth per partition.
    pub fn queue_size(mut self, size: usize) -> Self {
        self.queue_size = size;
        self
    }

    /// Sets the retry wait bounds.
    pub fn retry_wait(mut self, min: Duration, max: Duration) -> Self {
        self.retry_wait_min_ms = duration_ms(min);
        self.retry_wait_max_ms = duration_ms(max);
        self
    }

    /// Sets the maximum retries.
    pub fn max_retries(mut self, max: u32) -> Self {
        self.max_retries = max;
        self
    }

    /// Sets the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = duration_ms(timeout);
        self
    }

    /// Sets the event filter.
    pub fn filter(mut self, filter: FilterParams) -> Self {
        self.filter = filter;
        self
    }

    /// Returns the HTTP client settings.
    pub fn http_params(&self) -> HttpClientParams {
        HttpClientParams {
            retry_wait_min: Duration::from_millis(self.retry_wait_min_ms),
            retry_wait_max: Duration::from_millis(self.retry_wait_max_ms),
            max_retries: self.max_retries,
            timeout: (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms)),
        }
    }
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// What `queue_notify` did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// The filter rejected the event. Nothing was queued or counted.
    Filtered,
    /// The event is waiting in its partition.
    Queued,
    /// The partition was full. The event was counted as dropped.
    Dropped,
}

/// A notifier that queues events for background delivery.
#[async_trait]
pub trait QueuedNotifier: Send + Sync {
    /// Queues an event without blocking.
    fn queue_notify(&self, event: WebhookEvent) -> Disposition;

    /// Stops delivery. `force` abandons queued events, otherwise they are
    /// sent before this returns.
    async fn stop(&self, force: bool);
}

/// Settings that may change while deliveries are in flight. Replaced as a
/// whole on every write.
#[derive(Clone, Default)]
struct Settings {
    api_key: String,
    api_secret: String,
    filter: EventFilter,
    processed_hook: Option<ProcessedHook>,
}

struct Inner {
    url: String,
    client: RetryingClient,
    settings: RwLock<Arc<Settings>>,
    /// Drops not yet reported to the endpoint.
    dropped: AtomicI32,
    fields_hook: Option<FieldsHook>,
}

/// Delivers events to a single URL.
///
/// Events are partitioned by room: events for one room are sent one at a
/// time in the order they were queued, different rooms are sent
/// concurrently. A full partition drops the event instead of blocking, and
/// the number of drops is reported to the endpoint in the `numDropped`
/// field of the next event sent.
pub struct UrlNotifier {
    inner: Arc<Inner>,
    pool: QueuePool,
}

impl UrlNotifier {
    /// Creates a notifier and starts its workers.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(config: WebhookConfig) -> WebhookResult<Self> {
        Self::build(config, None)
    }

    /// Creates a notifier whose outcomes pass through `hook` before they
    /// reach the processed hook.
    pub fn with_fields_hook(config: WebhookConfig, hook: FieldsHook) -> WebhookResult<Self> {
        Self::build(config, Some(hook))
    }

    fn build(config: WebhookConfig, fields_hook: Option<FieldsHook>) -> WebhookResult<Self> {
        if config.url.is_empty() {
            return Err(WebhookError::ConfigError("webhook url is required".to_string()));
        }

        let client = RetryingClient::new(&config.http_params())?;
        let settings = Settings {
            api_key: config.api_key,
            api_secret: config.api_secret,
            filter: EventFilter::new(&config.filter),
            processed_hook: None,
        };

        let inner = Arc::new(Inner {
            url: config.url,
            client,
            settings: RwLock::new(Arc::new(settings)),
            dropped: AtomicI32::new(0),
            fields_hook,
        });

        Ok(Self {
            inner,
            pool: QueuePool::new(DEFAULT_NUM_WORKERS, config.queue_size),
        })
    }

    /// Returns the endpoint URL.
    pub fn url(&self) -> &str {
        &self.inner.url
    }

    /// Replaces the signing key pair.
    pub fn set_keys(&self, api_key: impl Into<String>, api_secret: impl Into<String>) {
        let (api_key, api_secret) = (api_key.into(), api_secret.into());
        self.inner.update_settings(|s| {
            s.api_key = api_key;
            s.api_secret = api_secret;
        });
    }

    /// Replaces the event filter.
    pub fn set_filter(&self, params: &FilterParams) {
        let filter = EventFilter::new(params);
        self.inner.update_settings(|s| s.filter = filter);
    }

    /// Registers the hook receiving every delivery outcome, replacing any
    /// previous one.
    pub fn register_processed_hook(&self, hook: ProcessedHook) {
        self.inner.update_settings(|s| s.processed_hook = Some(hook));
    }

    /// Returns the drops that the next send will report.
    pub fn pending_drops(&self) -> i32 {
        self.inner.dropped.load(Ordering::SeqCst)
    }

    /// Returns the number of events waiting for a worker.
    pub fn queued(&self) -> usize {
        self.pool.queued()
    }

    /// Queues an event for delivery.
    ///
    /// Never blocks. Filtered events have no side effects; dropped events
    /// are counted and reported to the processed hook right away.
    pub fn queue_notify(&self, event: WebhookEvent) -> Disposition {
        let settings = self.inner.settings();
        if !settings.filter.is_allowed(&event.event) {
            return Disposition::Filtered;
        }

        let key = event.room_key().unwrap_or(DEFAULT_PARTITION_KEY).to_string();
        let span = tracing::info_span!(
            "webhook",
            event = %event.event,
            id = %event.id,
            url = %self.inner.url,
            room = %key,
        );

        let mut info = WebhookInfo::for_event(&event, &self.inner.url);
        let mut task_info = info.clone();
        task_info.queued_at = Some(Utc::now());
        let enqueued = Instant::now();

        let inner = Arc::clone(&self.inner);
        let task = async move { inner.deliver(event, task_info, enqueued).await };
        if self.pool.submit(&key, Box::pin(task.instrument(span.clone()))) {
            return Disposition::Queued;
        }

        self.inner.dropped.fetch_add(1, Ordering::SeqCst);
        span.in_scope(|| tracing::info!("dropped webhook"));

        // never queued or sent, so every timing stays zero
        info.is_dropped = true;
        self.inner.report(info);
        Disposition::Dropped
    }

    /// Stops the workers. See [`QueuedNotifier::stop`].
    pub async fn stop(&self, force: bool) {
        if force {
            self.pool.kill().await;
        } else {
            self.pool.drain().await;
        }
    }
}

#[async_trait]
impl QueuedNotifier for UrlNotifier {
    fn queue_notify(&self, event: WebhookEvent) -> Disposition {
        UrlNotifier::queue_notify(self, event)
    }

    async fn stop(&self, force: bool) {
        UrlNotifier::stop(self, force).await
    }
}

impl Inner {
    fn settings(&self) -> Arc<Settings> {
        let guard = self.settings.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    fn update_settings(&self, update: impl FnOnce(&mut Settings)) {
        let mut guard = self.settings.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = Settings::clone(&guard);
        update(&mut next);
        *guard = Arc::new(next);
    }

    async fn deliver(&self, mut event: WebhookEvent, mut info: WebhookInfo, enqueued: Instant) {
        info.queue_duration = enqueued.elapsed();
        info.sent_at = Some(Utc::now());
        let started = Instant::now();

        let result = self.send(&mut event).await;

        info.send_duration = started.elapsed();
        info.num_dropped = event.num_dropped;
        match result {
            Ok(()) => {
                tracing::info!(
                    queue_duration = ?info.queue_duration,
                    send_duration = ?info.send_duration,
                    num_dropped = event.num_dropped,
                    "sent webhook"
                );
            }
            Err(err) => {
                // the drops this event carried were not delivered either
                self.dropped.fetch_add(event.num_dropped.saturating_add(1), Ordering::SeqCst);
                tracing::warn!(
                    error = %err,
                    queue_duration = ?info.queue_duration,
                    send_duration = ?info.send_duration,
                    num_dropped = event.num_dropped,
                    "failed to send webhook"
                );
                info.send_error = Some(err.to_string());
            }
        }

        self.report(info);
    }

    async fn send(&self, event: &mut WebhookEvent) -> WebhookResult<()> {
        event.num_dropped = self.dropped.swap(0, Ordering::SeqCst);
        let body = event.to_wire()?;

        let token = {
            let settings = self.settings();
            AccessToken::new(settings.api_key.as_str(), settings.api_secret.as_str())
                .with_valid_for(TOKEN_VALIDITY)
                .with_sha256(sha256_base64(&body))
                .to_jwt()?
        };

        self.client.post(&self.url, &body, &token).await
    }

    fn report(&self, mut info: WebhookInfo) {
        let Some(hook) = self.settings().processed_hook.clone() else {
            return;
        };
        if let Some(fields_hook) = &self.fields_hook {
            fields_hook(&mut info);
        }
        hook(&info);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use media_webhooks_events::{event_names, Room};
    use std::sync::Mutex;

    fn collecting_hook() -> (ProcessedHook, Arc<Mutex<Vec<WebhookInfo>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let hook: ProcessedHook =
            Arc::new(move |info: &WebhookInfo| sink.lock().unwrap().push(info.clone()));
        (hook, seen)
    }

    #[test]
    fn test_config_defaults() {
        let config = WebhookConfig::default();
        assert_eq!(config.queue_size, 100);
        assert_eq!(config.max_retries, 4);

        let params = config.http_params();
        assert_eq!(params.retry_wait_min, Duration::from_secs(1));
        assert_eq!(params.retry_wait_max, Duration::from_secs(30));
        assert_eq!(params.timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_config_builder() {
        let config = WebhookConfig::new("http://localhost/hook")
            .keys("key", "secret")
            .queue_size(5)
            .retry_wait(Duration::from_millis(10), Duration::from_millis(50))
            .max_retries(1)
            .timeout(Duration::ZERO);

        assert_eq!(config.url, "http://localhost/hook");
        assert_eq!(config.api_key, "key");
        assert_eq!(config.retry_wait_min_ms, 10);
        assert_eq!(config.retry_wait_max_ms, 50);
        assert_eq!(config.http_params().timeout, None);
    }

    #[test]
    fn test_config_deserialize_partial() {
        let config: WebhookConfig = serde_json::from_str(
            r#"{"url": "http://localhost/hook", "filter": {"exclude_events": ["track_published"]}}"#,
        )
        .unwrap();
        assert_eq!(config.queue_size, DEFAULT_QUEUE_SIZE);
        assert_eq!(config.filter.exclude_events, vec!["track_published".to_string()]);
    }

    #[tokio::test]
    async fn test_empty_url_is_rejected() {
        let err = UrlNotifier::new(WebhookConfig::default()).err().unwrap();
        assert!(matches!(err, WebhookError::ConfigError(_)));
    }

    #[tokio::test]
    async fn test_filtered_event_has_no_side_effects() {
        let config = WebhookConfig::new("http://127.0.0.1:9/hook")
            .keys("key", "secret")
            .filter(FilterParams::new().exclude([event_names::TRACK_PUBLISHED]));
        let notifier = UrlNotifier::new(config).unwrap();
        let (hook, seen) = collecting_hook();
        notifier.register_processed_hook(hook);

        let event =
            WebhookEvent::new(event_names::TRACK_PUBLISHED).with_room(Room::new("RM_1", "a"));
        assert_eq!(notifier.queue_notify(event), Disposition::Filtered);
        assert_eq!(notifier.queued(), 0);

        notifier.stop(true).await;
        assert!(seen.lock().unwrap().is_empty());
        assert_eq!(notifier.pending_drops(), 0);
    }

    #[tokio::test]
    async fn test_set_filter_applies_to_later_events() {
        let config = WebhookConfig::new("http://127.0.0.1:9/hook").keys("k", "s");
        let notifier = UrlNotifier::new(config).unwrap();
        notifier.set_filter(&FilterParams::new().include([event_names::ROOM_STARTED]));

        let event = WebhookEvent::new(event_names::ROOM_FINISHED);
        assert_eq!(notifier.queue_notify(event), Disposition::Filtered);
        notifier.stop(true).await;
    }

    #[tokio::test]
    async fn test_send_fails_without_keys() {
        let config = WebhookConfig::new("http://127.0.0.1:9/hook").max_retries(0);
        let notifier = UrlNotifier::new(config).unwrap();

        let mut event = WebhookEvent::new(event_names::ROOM_STARTED);
        let err = notifier.inner.send(&mut event).await.unwrap_err();
        assert!(matches!(err, WebhookError::Signing(_)));
        notifier.stop(true).await;
    }

    #[tokio::test]
    async fn test_dropped_event_is_reported_synchronously() {
        let config = WebhookConfig::new("http://127.0.0.1:9/hook").keys("k", "s").queue_size(1);
        let notifier = UrlNotifier::new(config).unwrap();
        let (hook, seen) = collecting_hook();
        notifier.register_processed_hook(hook);

        let room = Room::new("RM_1", "standup");
        let first = WebhookEvent::new(event_names::PARTICIPANT_JOINED).with_room(room.clone());
        let second = WebhookEvent::new(event_names::PARTICIPANT_LEFT).with_room(room);
        let second_id = second.id.clone();

        // Workers cannot run between these calls on a current-thread runtime.
        assert_eq!(notifier.queue_notify(first), Disposition::Queued);
        assert_eq!(notifier.queue_notify(second), Disposition::Dropped);
        assert_eq!(notifier.pending_drops(), 1);

        {
            let seen = seen.lock().unwrap();
            assert_eq!(seen.len(), 1);
            assert_eq!(seen[0].event_id, second_id);
            assert!(seen[0].is_dropped);
            assert!(seen[0].queued_at.is_none());
            assert_eq!(seen[0].queue_duration, Duration::ZERO);
            assert_eq!(seen[0].send_duration, Duration::ZERO);
            assert!(seen[0].sent_at.is_none());
        }

        notifier.stop(true).await;
    }
}
