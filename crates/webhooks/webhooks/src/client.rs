//! HTTP delivery with bounded retries.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, RETRY_AFTER};
use reqwest::{Response, StatusCode};

use crate::error::{WebhookError, WebhookResult};
use crate::retry::{ExponentialBackoff, RetryStrategy};

/// Content type of webhook bodies. Receivers must verify the signature
/// before handing the body to a general purpose parser.
pub const WEBHOOK_CONTENT_TYPE: &str = "application/webhook+json";

/// Retry and timeout settings for the HTTP client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpClientParams {
    /// Shortest wait between attempts.
    pub retry_wait_min: Duration,
    /// Longest wait between attempts.
    pub retry_wait_max: Duration,
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Per-request timeout.
    pub timeout: Option<Duration>,
}

impl Default for HttpClientParams {
    fn default() -> Self {
        Self {
            retry_wait_min: Duration::from_secs(1),
            retry_wait_max: Duration::from_secs(30),
            max_retries: 4,
            timeout: Some(Duration::from_secs(30)),
        }
    }
}

/// POSTs signed webhook bodies, retrying transient failures.
pub struct RetryingClient {
    client: reqwest::Client,
    strategy: Box<dyn RetryStrategy>,
}

impl RetryingClient {
    /// Creates a client from params.
    pub fn new(params: &HttpClientParams) -> WebhookResult<Self> {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("media-webhooks/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = params.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| WebhookError::ConfigError(format!("Failed to build HTTP client: {e}")))?;

        let strategy = ExponentialBackoff::new()
            .base(params.retry_wait_min)
            .max_delay(params.retry_wait_max)
            .max_retries(params.max_retries);

        Ok(Self::with_strategy(client, strategy))
    }

    /// Creates a client with a custom retry strategy.
    pub fn with_strategy(client: reqwest::Client, strategy: impl RetryStrategy + 'static) -> Self {
        Self {
            client,
            strategy: Box::new(strategy),
        }
    }

    /// Sends `body` to `url` with `token` in the authorization header.
    ///
    /// Connection failures, timeouts, 429 and 5xx (except 501) are retried
    /// and fail once retries run out. Any other status ends the send: the
    /// endpoint answered, so the request counts as delivered.
    pub async fn post(&self, url: &str, body: &[u8], token: &str) -> WebhookResult<()> {
        let mut retry = 0;
        loop {
            let result = self
                .client
                .post(url)
                .header(AUTHORIZATION, token)
                .header(CONTENT_TYPE, WEBHOOK_CONTENT_TYPE)
                .body(body.to_vec())
                .send()
                .await;

            let (error, retry_after) = match result {
                Ok(response) if response.status().is_success() => {
                    // body is not used, read it so the connection can be reused
                    let _ = response.bytes().await;
                    return Ok(());
                }
                Ok(response) => {
                    let status = response.status();
                    if !is_retryable_status(status) {
                        tracing::warn!(
                            url,
                            status = status.as_u16(),
                            "webhook endpoint rejected request"
                        );
                        let _ = response.bytes().await;
                        return Ok(());
                    }
                    let retry_after = parse_retry_after(&response);
                    (
                        WebhookError::HttpStatus {
                            status: status.as_u16(),
                        },
                        retry_after,
                    )
                }
                Err(err) if err.is_builder() => return Err(err.into()),
                Err(err) => (WebhookError::from(err), None),
            };

            let Some(backoff) = self.strategy.next_delay(retry) else {
                tracing::debug!(
                    url,
                    max_retries = self.strategy.retry_limit(),
                    error = %error,
                    "giving up on webhook request"
                );
                return Err(WebhookError::MaxRetriesExceeded {
                    attempts: retry + 1,
                    last_error: error.to_string(),
                });
            };
            let delay = retry_after
                .map(|wait| wait.min(self.strategy.delay_cap()))
                .unwrap_or(backoff);

            tracing::debug!(
                url,
                retry = retry + 1,
                ?delay,
                error = %error,
                "retrying webhook request"
            );
            tokio::time::sleep(delay).await;
            retry += 1;
        }
    }
}

fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS
        || (status.is_server_error() && status != StatusCode::NOT_IMPLEMENTED)
}

/// Reads a `Retry-After` header given in seconds on 429 and 503 responses.
fn parse_retry_after(response: &Response) -> Option<Duration> {
    let status = response.status();
    if status != StatusCode::TOO_MANY_REQUESTS && status != StatusCode::SERVICE_UNAVAILABLE {
        return None;
    }
    response
        .headers()
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fast_client(max_retries: u32) -> RetryingClient {
        RetryingClient::new(&HttpClientParams {
            retry_wait_min: Duration::from_millis(1),
            retry_wait_max: Duration::from_millis(5),
            max_retries,
            timeout: Some(Duration::from_secs(5)),
        })
        .unwrap()
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(is_retryable_status(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(is_retryable_status(StatusCode::BAD_GATEWAY));
        assert!(is_retryable_status(StatusCode::SERVICE_UNAVAILABLE));
        assert!(is_retryable_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(!is_retryable_status(StatusCode::NOT_IMPLEMENTED));
        assert!(!is_retryable_status(StatusCode::BAD_REQUEST));
        assert!(!is_retryable_status(StatusCode::UNAUTHORIZED));
    }

    #[tokio::test]
    async fn test_post_sets_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .and(header("authorization", "token-1"))
            .and(header("content-type", WEBHOOK_CONTENT_TYPE))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let url = format!("{}/hook", server.uri());
        fast_client(2).post(&url, b"{}", "token-1").await.unwrap();
    }

    #[tokio::test]
    async fn test_server_errors_exhaust_retries() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(3)
            .mount(&server)
            .await;

        let err = fast_client(2).post(&server.uri(), b"{}", "t").await.unwrap_err();
        match err {
            WebhookError::MaxRetriesExceeded { attempts, last_error } => {
                assert_eq!(attempts, 3);
                assert!(last_error.contains("500"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_client_errors_end_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400))
            .expect(1)
            .mount(&server)
            .await;

        fast_client(3).post(&server.uri(), b"{}", "t").await.unwrap();
    }

    #[tokio::test]
    async fn test_not_implemented_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(501))
            .expect(1)
            .mount(&server)
            .await;

        fast_client(3).post(&server.uri(), b"{}", "t").await.unwrap();
    }

    #[tokio::test]
    async fn test_recovers_after_transient_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        fast_client(4).post(&server.uri(), b"{}", "t").await.unwrap();
        assert_eq!(server.received_requests().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        // Reserve a port, then close the listener so nothing is accepting.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let err = fast_client(1).post(&url, b"{}", "t").await.unwrap_err();
        match err {
            WebhookError::MaxRetriesExceeded { attempts, .. } => assert_eq!(attempts, 2),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
