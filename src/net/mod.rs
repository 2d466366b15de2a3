//! Network plumbing: transport, pacing and bounded fetches.
//!
//! This module provides the networking infrastructure for reelquotes:
//!
//! - **Transport**: the [`Transport`] seam, with a reqwest-backed
//!   [`HttpTransport`] sharing one pooled client per process
//! - **Pacing**: a per-lane [`Pacer`] enforcing a politeness delay between
//!   consecutive calls to the same provider endpoint
//! - **Bounded fetches**: a [`Fetcher`] that paces, applies a hard timeout
//!   and parses into a typed schema, collapsing any failure to `None`
//!
//! Calls are never retried. A failed or timed-out call contributes zero
//! candidates and the pipeline carries on.
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use reelquotes::net::{Fetcher, HttpTransport, Lane};
//!
//! # async fn example() {
//! let fetcher = Fetcher::new(Arc::new(HttpTransport::default()), Duration::from_secs(5));
//! let lane = Lane::new("reddit.search", Duration::from_millis(300));
//!
//! let listing: Option<serde_json::Value> = fetcher
//!     .json(&lane, "https://www.reddit.com/search.json?q=Dune")
//!     .await;
//! # }
//! ```

use async_trait::async_trait;
use bytes::Bytes;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use reqwest::{Client, header::HeaderMap};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::config::DEFAULT_USER_AGENT;
use crate::error::{Error, Result};

/// Global HTTP client instance.
///
/// Configured with connection pooling and compression support. Deadlines are
/// enforced per call by [`Fetcher`]; the client timeout is only a backstop.
static CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .timeout(Duration::from_secs(30))
        .pool_max_idle_per_host(10)
        .gzip(true)
        .brotli(true)
        .build()
        .expect("Failed to build HTTP client")
});

/// Raw GET access to providers.
///
/// Implemented by [`HttpTransport`] for real traffic. Tests substitute a
/// canned-response implementation.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetches `url` and returns the response body.
    ///
    /// # Errors
    ///
    /// * [`Error::Network`] - For connection-level failures
    /// * [`Error::Http`] - For non-success status codes
    async fn get(&self, provider: &str, url: &str) -> Result<Bytes>;
}

/// reqwest-backed [`Transport`].
#[derive(Clone, Debug)]
pub struct HttpTransport {
    headers: HeaderMap,
}

impl HttpTransport {
    /// Creates a transport sending the given user agent and JSON accept header.
    pub fn new(user_agent: &str) -> Self {
        Self {
            headers: HeaderMap::new(),
        }
        .with_header("User-Agent", user_agent)
        .with_header("Accept", "application/json")
    }

    /// Adds a custom header to all requests made through this transport.
    /// Invalid names or values are ignored.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            name.parse::<reqwest::header::HeaderName>(),
            value.parse::<reqwest::header::HeaderValue>(),
        ) {
            self.headers.insert(name, value);
        }
        self
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new(DEFAULT_USER_AGENT)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, provider: &str, url: &str) -> Result<Bytes> {
        let response = CLIENT.get(url).headers(self.headers.clone()).send().await?;

        if !response.status().is_success() {
            return Err(Error::http(provider, response.status().as_u16()));
        }

        Ok(response.bytes().await?)
    }
}

/// A named request stream with its own politeness delay.
///
/// A call on a lane starts at least `delay` after the previous call on the
/// same lane finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lane {
    pub name: String,
    pub delay: Duration,
}

impl Lane {
    pub fn new(name: impl Into<String>, delay: Duration) -> Self {
        Self {
            name: name.into(),
            delay,
        }
    }
}

/// Per-lane pacing to avoid triggering provider rate limits.
///
/// The pacer tracks when each lane's last call finished and sleeps until the
/// lane's delay has elapsed since then. One pacer is created per pipeline run, so pacing state
/// never outlives a request.
#[derive(Debug, Default)]
pub struct Pacer {
    last_request: Mutex<HashMap<String, Instant>>,
}

impl Pacer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits if necessary before allowing a call on `lane`.
    pub async fn wait(&self, lane: &Lane) {
        let now = Instant::now();
        let wait_duration = {
            let last_map = self.last_request.lock();
            last_map.get(&lane.name).and_then(|&last| {
                let elapsed = now.duration_since(last);
                (elapsed < lane.delay).then(|| lane.delay - elapsed)
            })
        };

        if let Some(duration) = wait_duration {
            tokio::time::sleep(duration).await;
        }
    }

    /// Marks the end of a call on `lane`. The next [`wait`](Self::wait)
    /// counts its delay from here, however long the call took.
    pub fn done(&self, lane: &Lane) {
        self.last_request
            .lock()
            .insert(lane.name.clone(), Instant::now());
    }
}

/// Paced, deadline-bounded, typed fetches.
///
/// Every call goes through the [`Pacer`], is cancelled after `timeout`, and
/// is parsed into `T`. Any failure is logged and returned as `None`, which
/// callers treat as "zero results from this source".
pub struct Fetcher {
    transport: Arc<dyn Transport>,
    pacer: Pacer,
    timeout: Duration,
}

impl Fetcher {
    pub fn new(transport: Arc<dyn Transport>, timeout: Duration) -> Self {
        Self {
            transport,
            pacer: Pacer::new(),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Fetches and parses `url`, returning `None` on any failure.
    pub async fn json<T>(&self, lane: &Lane, url: &str) -> Option<T>
    where
        T: DeserializeOwned,
    {
        match self.try_json(lane, url).await {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(lane = %lane.name, url, error = %e, "provider fetch failed");
                None
            }
        }
    }

    /// Fetches and parses `url`, reporting why it failed.
    ///
    /// # Errors
    ///
    /// * [`Error::Timeout`] - The call exceeded the deadline
    /// * [`Error::Json`] - The payload does not match `T`
    /// * Any error from the [`Transport`]
    pub async fn try_json<T>(&self, lane: &Lane, url: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        self.pacer.wait(lane).await;
        debug!(lane = %lane.name, url, "fetching");

        let result = tokio::time::timeout(self.timeout, self.transport.get(&lane.name, url)).await;
        self.pacer.done(lane);

        let bytes = result.map_err(|_| Error::timeout(&lane.name, self.timeout))??;

        serde_json::from_slice(&bytes).map_err(Into::into)
    }
}
