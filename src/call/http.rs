// ABOUTME: reqwest-backed outbound call for JSON provider APIs.
// ABOUTME: Maps non-success statuses to CallError::Api so 429s classify as retryable.

use std::time::Duration;

use serde_json::Value;

use super::{CallError, CallFuture};

/// Default per-request timeout. Provider endpoints are slow under load;
/// the lock TTL must stay above this.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// One outbound HTTP call against the provider's REST API.
///
/// `HttpCall` is cheap to clone and produces a fresh request each time
/// [`HttpCall::future`] is invoked, which is what lets the dispatcher retry
/// rate-limited attempts.
#[derive(Debug, Clone)]
pub struct HttpCall {
    http: reqwest::Client,
    method: reqwest::Method,
    url: String,
    bearer: Option<String>,
    body: Option<Value>,
    timeout: Duration,
}

impl HttpCall {
    /// Create a GET call for the given URL.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(reqwest::Method::GET, url)
    }

    /// Create a POST call for the given URL.
    pub fn post(url: impl Into<String>) -> Self {
        Self::new(reqwest::Method::POST, url)
    }

    /// Create a PATCH call for the given URL.
    pub fn patch(url: impl Into<String>) -> Self {
        Self::new(reqwest::Method::PATCH, url)
    }

    fn new(method: reqwest::Method, url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            method,
            url: url.into(),
            bearer: None,
            body: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Use a shared reqwest client instead of a per-call one.
    pub fn with_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    /// Attach a bearer token.
    pub fn bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    /// Attach a JSON body.
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Override the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Execute the call once.
    ///
    /// Non-success statuses become [`CallError::Api`] with the response body
    /// as the message, so a 429 (or a quota message in the body) is
    /// classified as retryable by the dispatcher.
    pub async fn execute(&self) -> Result<Value, CallError> {
        let mut request = self
            .http
            .request(self.method.clone(), &self.url)
            .timeout(self.timeout)
            .header("Content-Type", "application/json");

        if let Some(token) = &self.bearer {
            request = request.header("Authorization", format!("Bearer {}", token));
        }
        if let Some(body) = &self.body {
            request = request.json(body);
        }

        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(CallError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }

    /// Produce a boxed future suitable for [`Dispatcher::enqueue`]'s work
    /// factory: `|| call.future()`.
    ///
    /// [`Dispatcher::enqueue`]: crate::dispatch::Dispatcher::enqueue
    pub fn future(&self) -> CallFuture {
        let call = self.clone();
        Box::pin(async move { call.execute().await })
    }
}
