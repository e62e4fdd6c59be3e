//! Retrying HTTP transport for the PesaPal API.
//!
//! Every gateway call goes through [`Transport::send`]: up to [`RetryPolicy::max_attempts`] tries with
//! linearly growing pauses, a per-attempt timeout, and a one-time escalation from the primary base URL
//! to a fallback when the primary drops connections. A completed HTTP exchange is handed back whatever
//! its status code; interpreting the envelope is the caller's job.

use std::{error::Error as StdError, io, time::Duration};

use log::*;
use reqwest::{header::HeaderValue, Client, Method};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

/// How a failed attempt is classified. Drives the retry and fallback decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The attempt exceeded the per-attempt timeout.
    Timeout,
    /// The connection was refused, reset, or dropped mid-exchange.
    ConnectionReset,
    /// Any other transport failure (DNS, TLS, malformed response framing).
    Other,
}

/// A single failed attempt, as reported by a [`SendOnce`] implementation.
#[derive(Debug, Clone)]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
}

impl Failure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }
}

/// Raised once the retry budget is exhausted. Carries the classification of the last attempt.
#[derive(Debug, Clone, Error)]
#[error("Request failed after {attempts} attempt(s): {message}")]
pub struct TransportError {
    pub kind: FailureKind,
    pub attempts: u32,
    pub message: String,
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts across both base URLs.
    pub max_attempts: u32,
    /// The pause before attempt `n + 1` is `n * base_delay`.
    pub base_delay: Duration,
    /// Budget for a single attempt. A timed-out attempt counts against `max_attempts`.
    pub request_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 3, base_delay: Duration::from_millis(500), request_timeout: Duration::from_secs(30) }
    }
}

impl RetryPolicy {
    /// The pause after the n-th failed attempt (1-based).
    pub fn backoff(&self, failed_attempts: u32) -> Duration {
        self.base_delay * failed_attempts
    }
}

/// A gateway-bound request, described independently of the HTTP client so tests can stub the wire.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    pub path: &'static str,
    pub query: Vec<(&'static str, String)>,
    pub bearer: Option<String>,
    pub body: Option<Value>,
}

impl OutboundRequest {
    pub fn get(path: &'static str) -> Self {
        Self { method: Method::GET, path, query: Vec::new(), bearer: None, body: None }
    }

    pub fn post(path: &'static str, body: Value) -> Self {
        Self { method: Method::POST, path, query: Vec::new(), bearer: None, body: Some(body) }
    }

    pub fn with_query(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.query.push((key, value.into()));
        self
    }

    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }
}

/// A completed HTTP exchange, any status code included.
#[derive(Debug, Clone)]
pub struct WireResponse {
    pub status: u16,
    pub body: String,
}

impl WireResponse {
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

/// The single-attempt send operation. [`HttpSender`] is the production implementation; tests
/// substitute failing or counting stubs.
#[allow(async_fn_in_trait)]
pub trait SendOnce {
    async fn send_once(&self, base: &str, request: &OutboundRequest) -> Result<WireResponse, Failure>;
}

#[derive(Debug, Clone)]
pub struct HttpSender {
    client: Client,
    timeout: Duration,
}

impl HttpSender {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let mut headers = reqwest::header::HeaderMap::with_capacity(1);
        headers.insert("Accept", HeaderValue::from_static("application/json"));
        let client = Client::builder().default_headers(headers).user_agent("Makao Payment Gateway Client").build()?;
        Ok(Self { client, timeout })
    }
}

impl SendOnce for HttpSender {
    async fn send_once(&self, base: &str, request: &OutboundRequest) -> Result<WireResponse, Failure> {
        let url = join_url(base, request.path);
        let mut req = self.client.request(request.method.clone(), url).timeout(self.timeout);
        if !request.query.is_empty() {
            req = req.query(&request.query);
        }
        if let Some(token) = &request.bearer {
            req = req.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            req = req.json(body);
        }
        let response = req.send().await.map_err(classify_reqwest_error)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(classify_reqwest_error)?;
        Ok(WireResponse { status, body })
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

fn classify_reqwest_error(e: reqwest::Error) -> Failure {
    let kind = if e.is_timeout() {
        FailureKind::Timeout
    } else if e.is_connect() {
        FailureKind::ConnectionReset
    } else {
        classify_source_chain(&e)
    };
    Failure::new(kind, e.to_string())
}

/// Walks the error source chain looking for an I/O error that pins down the failure class.
fn classify_source_chain(e: &(dyn StdError + 'static)) -> FailureKind {
    let mut source = Some(e);
    while let Some(err) = source {
        if let Some(io_err) = err.downcast_ref::<io::Error>() {
            return classify_io_kind(io_err.kind());
        }
        source = err.source();
    }
    FailureKind::Other
}

fn classify_io_kind(kind: io::ErrorKind) -> FailureKind {
    match kind {
        io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::ConnectionRefused
        | io::ErrorKind::BrokenPipe => FailureKind::ConnectionReset,
        io::ErrorKind::TimedOut => FailureKind::Timeout,
        _ => FailureKind::Other,
    }
}

/// The base URL in use for an attempt. Escalation from primary to fallback happens at most once
/// per call and is never undone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    Primary,
    Fallback,
}

#[derive(Debug, Clone)]
pub struct Transport<S> {
    sender: S,
    primary: String,
    fallback: Option<String>,
    policy: RetryPolicy,
}

pub type HttpTransport = Transport<HttpSender>;

impl<S: SendOnce> Transport<S> {
    pub fn new(sender: S, primary: impl Into<String>, fallback: Option<String>, policy: RetryPolicy) -> Self {
        Self { sender, primary: primary.into(), fallback, policy }
    }

    pub async fn send(&self, request: &OutboundRequest) -> Result<WireResponse, TransportError> {
        let mut route = Route::Primary;
        let mut last: Option<Failure> = None;
        for attempt in 1..=self.policy.max_attempts {
            if attempt > 1 {
                tokio::time::sleep(self.policy.backoff(attempt - 1)).await;
            }
            let base = self.base_for(route);
            trace!("{} {} attempt {attempt}/{} via {base}", request.method, request.path, self.policy.max_attempts);
            match self.sender.send_once(base, request).await {
                Ok(response) => {
                    if attempt > 1 {
                        debug!("{} {} succeeded on attempt {attempt}", request.method, request.path);
                    }
                    return Ok(response);
                },
                Err(failure) => {
                    warn!(
                        "{} {} attempt {attempt}/{} failed ({:?}): {}",
                        request.method, request.path, self.policy.max_attempts, failure.kind, failure.message
                    );
                    if route == Route::Primary && failure.kind == FailureKind::ConnectionReset && self.fallback.is_some()
                    {
                        info!("Switching to the fallback gateway URL for the remaining attempts");
                        route = Route::Fallback;
                    }
                    last = Some(failure);
                },
            }
        }
        let failure = last.unwrap_or_else(|| Failure::new(FailureKind::Other, "no attempts were made"));
        Err(TransportError { kind: failure.kind, attempts: self.policy.max_attempts, message: failure.message })
    }

    fn base_for(&self, route: Route) -> &str {
        match route {
            Route::Primary => &self.primary,
            Route::Fallback => self.fallback.as_deref().unwrap_or(&self.primary),
        }
    }
}
