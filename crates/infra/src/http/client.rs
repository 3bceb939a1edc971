use std::time::Duration;

use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response};
use spatialbias_domain::constants::DEFAULT_API_TIMEOUT_SECS;
use spatialbias_domain::SpatialBiasError;
use tracing::{debug, warn};

use crate::errors::InfraError;

const USER_AGENT: &str = concat!("spatialbias/", env!("CARGO_PKG_VERSION"));

/// reqwest wrapper shared by the API client and the identity provider.
///
/// Single attempt by default. The API client counts its own attempts
/// (401 replay), so only identity-provider calls opt into transport retry.
#[derive(Clone)]
pub struct HttpClient {
    inner: ReqwestClient,
    attempts: usize,
    backoff: Duration,
}

impl HttpClient {
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Client with default timeout and a single attempt
    pub fn new() -> Result<Self, SpatialBiasError> {
        Self::builder().build()
    }

    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.inner.request(method, url)
    }

    /// Send `builder`, resending on 5xx and transport failures while
    /// attempts remain. The last response is returned as-is.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, SpatialBiasError> {
        let mut attempt = 1;
        loop {
            let request = builder
                .try_clone()
                .ok_or_else(|| SpatialBiasError::Internal("streaming body cannot be resent".into()))?
                .build()
                .map_err(network_error)?;
            let url = request.url().clone();
            let last = attempt >= self.attempts;

            match self.inner.execute(request).await {
                Ok(response) if response.status().is_server_error() && !last => {
                    warn!(attempt, %url, status = %response.status(), "Server error, resending");
                }
                Ok(response) => {
                    debug!(attempt, %url, status = %response.status(), "HTTP response");
                    return Ok(response);
                }
                Err(err) if is_transient(&err) && !last => {
                    warn!(attempt, %url, error = %err, "Transport failure, resending");
                }
                Err(err) => return Err(network_error(err)),
            }

            tokio::time::sleep(self.delay_before(attempt)).await;
            attempt += 1;
        }
    }

    /// Execute once, keeping the raw reqwest error so callers can tell a
    /// timeout from other failures
    pub async fn execute(&self, builder: RequestBuilder) -> Result<Response, reqwest::Error> {
        let request = builder.build()?;
        debug!(method = %request.method(), url = %request.url(), "HTTP request");
        self.inner.execute(request).await
    }

    // Doubling backoff, capped at 8x the base delay.
    fn delay_before(&self, attempt: usize) -> Duration {
        let factor = 1u32 << attempt.saturating_sub(1).min(3);
        self.backoff.saturating_mul(factor)
    }
}

fn network_error(err: reqwest::Error) -> SpatialBiasError {
    InfraError::from(err).into()
}

fn is_transient(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}

#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    attempts: usize,
    backoff: Duration,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_API_TIMEOUT_SECS),
            attempts: 1,
            backoff: Duration::from_millis(200),
        }
    }
}

impl HttpClientBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Total attempts including the first; at least one
    pub fn max_attempts(mut self, attempts: usize) -> Self {
        self.attempts = attempts.max(1);
        self
    }

    pub fn backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn build(self) -> Result<HttpClient, SpatialBiasError> {
        let inner = ReqwestClient::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
            .no_proxy()
            .build()
            .map_err(network_error)?;

        Ok(HttpClient { inner, attempts: self.attempts, backoff: self.backoff })
    }
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use reqwest::StatusCode;
    use wiremock::matchers::{header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn resending(attempts: usize) -> HttpClient {
        HttpClient::builder()
            .backoff(Duration::from_millis(5))
            .max_attempts(attempts)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn single_attempt_returns_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpClient::new().unwrap();
        let response = client.send(client.request(Method::POST, server.uri())).await.unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn form_post_is_resent_after_server_error() {
        let server = MockServer::start().await;
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        Mock::given(method("POST"))
            .respond_with(move |_: &wiremock::Request| -> ResponseTemplate {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    ResponseTemplate::new(502)
                } else {
                    ResponseTemplate::new(200)
                }
            })
            .expect(2)
            .mount(&server)
            .await;

        let client = resending(2);
        let response = client
            .send(client.request(Method::POST, server.uri()).form(&[("grant_type", "refresh_token")]))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].body, b"grant_type=refresh_token");
    }

    #[tokio::test]
    async fn client_errors_are_not_resent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400))
            .expect(1)
            .mount(&server)
            .await;

        let client = resending(3);
        let response = client.send(client.request(Method::POST, server.uri())).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn requests_identify_the_client() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("user-agent", USER_AGENT))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpClient::new().unwrap();
        let response = client.execute(client.request(Method::GET, server.uri())).await.unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn unreachable_host_is_a_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = resending(2);
        let result = client.send(client.request(Method::GET, format!("http://{addr}"))).await;

        assert!(matches!(result, Err(SpatialBiasError::Network(_))), "got {result:?}");
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let client = resending(1);

        assert_eq!(client.delay_before(1), Duration::from_millis(5));
        assert_eq!(client.delay_before(2), Duration::from_millis(10));
        assert_eq!(client.delay_before(9), Duration::from_millis(40));
    }
}
