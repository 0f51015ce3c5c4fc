//! Transport adapter between descriptors and the pooled reqwest client.
//!
//! # Design
//! `Transport` wraps one `reqwest::Client`; clones share its connection pool.
//! `execute` turns an `HttpRequest` into a wire request, races the round trip
//! against the caller's `Context`, and reads the full body into an
//! `HttpResponse`. The wire response is owned by the round-trip future, so
//! the connection is handed back to the pool (or closed) whichever way the
//! call ends: success, body-read failure, cancellation or deadline.
//!
//! reqwest's pool has no cap on open connections, so `Transport` bounds
//! in-flight round trips itself: one semaphore for the whole transport and
//! one per `host:port`. Permits live inside the round-trip future and are
//! released with it.
//!
//! Reconfiguration takes `&mut self` and rebuilds the client. Calls already
//! holding a borrow of the transport cannot observe a half-applied change.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::Url;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::context::Context;
use crate::error::{ApiError, TransportError};
use crate::http::{HttpRequest, HttpResponse};

/// Connection and pool settings for a `Transport`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportOptions {
    /// Upper bound for a whole request, connect to last body byte. `None`
    /// leaves only the per-call `Context` deadline.
    pub timeout: Option<Duration>,
    pub connect_timeout: Duration,
    /// TCP keep-alive probe interval.
    pub keep_alive: Duration,
    /// How long an idle pooled connection is kept before it is closed.
    pub pool_idle_timeout: Option<Duration>,
    pub pool_max_idle_per_host: usize,
    /// Round trips in flight across all hosts. Callers beyond it wait.
    pub max_connections: usize,
    /// Round trips in flight to a single `host:port`.
    pub max_connections_per_host: usize,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(10)),
            connect_timeout: Duration::from_secs(10),
            keep_alive: Duration::from_secs(10),
            pool_idle_timeout: Some(Duration::from_secs(90)),
            pool_max_idle_per_host: 100,
            max_connections: 100,
            max_connections_per_host: 100,
        }
    }
}

fn build_client(options: &TransportOptions) -> Result<reqwest::Client, reqwest::Error> {
    let mut builder = reqwest::Client::builder()
        .connect_timeout(options.connect_timeout)
        .tcp_keepalive(options.keep_alive)
        .pool_idle_timeout(options.pool_idle_timeout)
        .pool_max_idle_per_host(options.pool_max_idle_per_host);
    if let Some(timeout) = options.timeout {
        builder = builder.timeout(timeout);
    }
    builder.build()
}

/// Connection caps shared by every clone of a `Transport`.
#[derive(Debug)]
struct Limits {
    total: Arc<Semaphore>,
    per_host_max: usize,
    per_host: Mutex<HashMap<String, Arc<Semaphore>>>,
}

impl Limits {
    fn new(options: &TransportOptions) -> Self {
        Self {
            total: Arc::new(Semaphore::new(options.max_connections.max(1))),
            per_host_max: options.max_connections_per_host.max(1),
            per_host: Mutex::new(HashMap::new()),
        }
    }

    fn host_semaphore(&self, url: &Url) -> Arc<Semaphore> {
        let key = format!(
            "{}:{}",
            url.host_str().unwrap_or_default(),
            url.port_or_known_default().unwrap_or_default()
        );
        let mut per_host = self
            .per_host
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        per_host
            .entry(key)
            .or_insert_with(|| Arc::new(Semaphore::new(self.per_host_max)))
            .clone()
    }

    /// Host permit first, so callers queued on a busy host do not hold
    /// transport-wide permits while they wait.
    async fn acquire(
        &self,
        url: &Url,
    ) -> Result<(OwnedSemaphorePermit, OwnedSemaphorePermit), ApiError> {
        let host = self
            .host_semaphore(url)
            .acquire_owned()
            .await
            .map_err(|e| TransportError::Other(e.to_string()))?;
        let total = self
            .total
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| TransportError::Other(e.to_string()))?;
        Ok((host, total))
    }
}

/// Executes `HttpRequest` descriptors over a shared connection pool.
#[derive(Debug, Clone)]
pub struct Transport {
    inner: reqwest::Client,
    options: TransportOptions,
    limits: Arc<Limits>,
}

impl Transport {
    pub fn new(options: TransportOptions) -> Result<Self, ApiError> {
        let inner = build_client(&options).map_err(|e| ApiError::Build(e.to_string()))?;
        let limits = Arc::new(Limits::new(&options));
        Ok(Self {
            inner,
            options,
            limits,
        })
    }

    pub fn options(&self) -> &TransportOptions {
        &self.options
    }

    /// Replace the request timeout for every later call on this transport.
    pub fn set_timeout(&mut self, timeout: Duration) {
        let options = TransportOptions {
            timeout: Some(timeout),
            ..self.options.clone()
        };
        self.set_transport_options(options);
    }

    /// Rebuild the pooled client with new options. On failure the previous
    /// client and options stay in effect.
    pub fn set_transport_options(&mut self, options: TransportOptions) {
        match build_client(&options) {
            Ok(client) => {
                self.inner = client;
                self.limits = Arc::new(Limits::new(&options));
                self.options = options;
            }
            Err(e) => {
                warn!(error = %e, "failed to rebuild HTTP client, keeping previous options");
            }
        }
    }

    /// Execute `request` under `ctx`.
    ///
    /// Fails with `MalformedRequest` before anything is sent if the location
    /// or a header is invalid. An elapsed deadline yields
    /// `TransportError::DeadlineExceeded`, a fired token
    /// `TransportError::Cancelled`.
    pub async fn execute(
        &self,
        request: HttpRequest,
        ctx: &Context,
    ) -> Result<HttpResponse, ApiError> {
        let wire = self.build_wire_request(request)?;
        let method = wire.method().clone();
        let url = wire.url().clone();

        if ctx.is_cancelled() {
            debug!(%method, %url, "context cancelled before dispatch");
            return Err(TransportError::Cancelled.into());
        }
        if ctx.deadline().is_some_and(|d| d <= Instant::now()) {
            debug!(%method, %url, "deadline elapsed before dispatch");
            return Err(TransportError::DeadlineExceeded.into());
        }

        let started = Instant::now();
        let outcome: Result<HttpResponse, ApiError> = tokio::select! {
            biased;
            _ = ctx.token().cancelled() => Err(TransportError::Cancelled.into()),
            _ = ctx.deadline_elapsed() => Err(TransportError::DeadlineExceeded.into()),
            result = self.round_trip(wire) => result,
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &outcome {
            Ok(response) => {
                debug!(%method, %url, status = response.status, elapsed_ms, "request completed")
            }
            Err(e) => debug!(%method, %url, error = %e, elapsed_ms, "request failed"),
        }
        outcome
    }

    fn build_wire_request(&self, request: HttpRequest) -> Result<reqwest::Request, ApiError> {
        let url = build_url(&request)?;
        let default_json =
            request.body.as_ref().is_some_and(|b| !b.is_empty()) && !request.has_content_type();

        // Names are sorted so that keys differing only in case resolve the
        // same way on every call; `insert` keeps one value per name.
        let mut entries: Vec<(&String, &String)> = request.headers.iter().collect();
        entries.sort();
        let mut headers = HeaderMap::with_capacity(entries.len() + 1);
        for (name, value) in entries {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ApiError::MalformedRequest(format!("header {name:?}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| ApiError::MalformedRequest(format!("header {name}: {e}")))?;
            headers.insert(name, value);
        }
        if default_json && !headers.contains_key(CONTENT_TYPE) {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }

        let mut builder = self
            .inner
            .request(request.method.into(), url)
            .headers(headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }
        builder
            .build()
            .map_err(|e| ApiError::MalformedRequest(e.to_string()))
    }

    async fn round_trip(&self, request: reqwest::Request) -> Result<HttpResponse, ApiError> {
        let _permits = self.limits.acquire(request.url()).await?;
        let response = self.inner.execute(request).await?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let bytes = response.bytes().await?;
        let body = String::from_utf8_lossy(&bytes).into_owned();
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

/// Parse the request location and append its query parameters, URL-encoded
/// and sorted by key.
pub fn build_url(request: &HttpRequest) -> Result<Url, ApiError> {
    let mut url = Url::parse(&request.url)
        .map_err(|e| ApiError::MalformedRequest(format!("{e} for {}", request.url)))?;
    if !request.query.is_empty() {
        let mut pairs: Vec<(&String, &String)> = request.query.iter().collect();
        pairs.sort();
        url.query_pairs_mut().extend_pairs(pairs);
    }
    Ok(url)
}
