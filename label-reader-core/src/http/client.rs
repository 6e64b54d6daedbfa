//! HTTP client trait and implementations.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use url::Url;

use crate::error::FetchError;

/// A response as seen by the fetcher: status plus decoded body.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Trait for HTTP clients, enabling mockability in tests.
///
/// Implementations perform exactly one request. `Err` means the request
/// never produced a response (connect failure, timeout); a response with a
/// non-success status is `Ok`.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn get(
        &self,
        url: &Url,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<HttpResponse, FetchError>;
}

#[async_trait]
impl<T: HttpClient + ?Sized> HttpClient for Arc<T> {
    async fn get(
        &self,
        url: &Url,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<HttpResponse, FetchError> {
        (**self).get(url, user_agent, timeout).await
    }
}

/// Production client backed by a shared reqwest connection pool.
#[derive(Clone)]
pub struct ReqwestClient {
    inner: Arc<reqwest::Client>,
}

impl ReqwestClient {
    pub fn new() -> Result<Self, FetchError> {
        let inner = reqwest::Client::builder().build()?;
        Ok(Self {
            inner: Arc::new(inner),
        })
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn get(
        &self,
        url: &Url,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<HttpResponse, FetchError> {
        let response = self
            .inner
            .get(url.clone())
            .header(reqwest::header::USER_AGENT, user_agent)
            .timeout(timeout)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(HttpResponse { status, body })
    }
}

/// Mock response for testing.
#[derive(Clone, Debug)]
pub enum MockResponse {
    /// 200 with this body.
    Body(String),
    /// A response with this (usually non-success) status and an empty body.
    Status(u16),
    /// No response at all, as if the host were down.
    Failure(String),
}

/// A request the mock saw, with the (possibly paused) tokio clock reading.
#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub url: String,
    pub user_agent: String,
    pub at: Instant,
}

/// Mock HTTP client for testing.
///
/// Responses are matched by URL substring in registration order; the first
/// registered fragment contained in the request URL wins. Unmatched requests
/// get the default response, which is a 404 unless overridden.
pub struct MockClient {
    responses: Vec<(String, MockResponse)>,
    default_response: MockResponse,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockClient {
    /// Create a new empty mock client.
    pub fn new() -> Self {
        Self {
            responses: Vec::new(),
            default_response: MockResponse::Status(404),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A mock where every request fails as if the network were down.
    pub fn offline() -> Self {
        Self::new().with_default(MockResponse::Failure("network down".to_string()))
    }

    /// Add a response for URLs containing `url_fragment`.
    pub fn with_response(mut self, url_fragment: &str, response: MockResponse) -> Self {
        self.responses.push((url_fragment.to_string(), response));
        self
    }

    /// Add a 200 response body for URLs containing `url_fragment`.
    pub fn with_body(self, url_fragment: &str, body: &str) -> Self {
        self.with_response(url_fragment, MockResponse::Body(body.to_string()))
    }

    /// Set the response for unmatched URLs.
    pub fn with_default(mut self, response: MockResponse) -> Self {
        self.default_response = response;
        self
    }

    /// Every request made so far, in order.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Number of requests whose URL contains `url_fragment`.
    pub fn requests_matching(&self, url_fragment: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.url.contains(url_fragment))
            .count()
    }
}

impl Default for MockClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for MockClient {
    async fn get(
        &self,
        url: &Url,
        user_agent: &str,
        _timeout: Duration,
    ) -> Result<HttpResponse, FetchError> {
        self.requests.lock().unwrap().push(RecordedRequest {
            url: url.to_string(),
            user_agent: user_agent.to_string(),
            at: Instant::now(),
        });

        let response = self
            .responses
            .iter()
            .find(|(fragment, _)| url.as_str().contains(fragment.as_str()))
            .map(|(_, response)| response)
            .unwrap_or(&self.default_response);

        match response {
            MockResponse::Body(body) => Ok(HttpResponse {
                status: 200,
                body: body.clone(),
            }),
            MockResponse::Status(status) => Ok(HttpResponse {
                status: *status,
                body: String::new(),
            }),
            MockResponse::Failure(e) => Err(FetchError::Unreachable(e.clone())),
        }
    }
}
