//! Common test utilities
//!
//! Shared functionality used across all test modules: an offline
//! [`Transport`] serving canned payloads, and JSON builders for provider
//! responses.

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use reelquotes::error::{Error, Result};
use reelquotes::net::Transport;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

#[allow(dead_code)]
pub const TEST_TITLE: &str = "Dune";
#[allow(dead_code)]
pub const TEST_YEAR: &str = "2021";

/// What a route answers with.
#[derive(Debug, Clone)]
pub enum Reply {
    Json(Value),
    Raw(&'static str),
    Status(u16),
    /// Sleeps before answering, to exercise deadlines
    Slow(Duration, Value),
}

/// A transport answering from a routing table.
///
/// Routes are URL substrings checked in insertion order; the first match
/// wins. Unmatched URLs answer 404. Every call is recorded with its time.
#[derive(Default)]
pub struct StubTransport {
    routes: Vec<(String, Reply)>,
    calls: Mutex<Vec<(String, Instant)>>,
}

#[allow(dead_code)]
impl StubTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, pattern: &str, reply: Reply) -> Self {
        self.routes.push((pattern.to_string(), reply));
        self
    }

    pub fn json(self, pattern: &str, body: Value) -> Self {
        self.route(pattern, Reply::Json(body))
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().iter().map(|(url, _)| url.clone()).collect()
    }

    pub fn call_times(&self) -> Vec<(String, Instant)> {
        self.calls.lock().clone()
    }

    pub fn calls_matching(&self, pattern: &str) -> usize {
        self.calls.lock().iter().filter(|(url, _)| url.contains(pattern)).count()
    }
}

#[async_trait]
impl Transport for StubTransport {
    async fn get(&self, provider: &str, url: &str) -> Result<Bytes> {
        self.calls.lock().push((url.to_string(), Instant::now()));

        let reply = self
            .routes
            .iter()
            .find(|(pattern, _)| url.contains(pattern.as_str()))
            .map(|(_, reply)| reply.clone());

        match reply {
            Some(Reply::Json(body)) => Ok(Bytes::from(body.to_string())),
            Some(Reply::Raw(body)) => Ok(Bytes::from_static(body.as_bytes())),
            Some(Reply::Status(status)) => Err(Error::http(provider, status)),
            Some(Reply::Slow(delay, body)) => {
                tokio::time::sleep(delay).await;
                Ok(Bytes::from(body.to_string()))
            }
            None => Err(Error::http(provider, 404)),
        }
    }
}

/// A post listing as returned by the search endpoints.
#[allow(dead_code)]
pub fn post_listing(posts: Vec<Value>) -> Value {
    let children: Vec<Value> = posts
        .into_iter()
        .map(|data| json!({ "kind": "t3", "data": data }))
        .collect();
    json!({ "kind": "Listing", "data": { "children": children } })
}

#[allow(dead_code)]
pub fn empty_listing() -> Value {
    post_listing(Vec::new())
}

/// A post with the fields the pipeline reads.
#[allow(dead_code)]
pub fn post(id: &str, title: &str, selftext: &str, ups: i64, num_comments: u64) -> Value {
    json!({
        "id": id,
        "title": title,
        "selftext": selftext,
        "author": format!("op_{}", id),
        "ups": ups,
        "num_comments": num_comments,
        "permalink": format!("/r/movies/comments/{}/thread/", id),
        "stickied": false,
        "created_utc": 1_634_860_800.0
    })
}

/// A thread detail payload: `[post listing, comment listing]`.
#[allow(dead_code)]
pub fn thread(comments: Vec<Value>) -> Value {
    let children: Vec<Value> = comments
        .into_iter()
        .map(|data| json!({ "kind": "t1", "data": data }))
        .collect();
    json!([
        empty_listing(),
        { "kind": "Listing", "data": { "children": children } }
    ])
}

#[allow(dead_code)]
pub fn comment(id: &str, author: &str, body: &str, ups: i64) -> Value {
    json!({
        "id": id,
        "author": author,
        "body": body,
        "ups": ups,
        "stickied": false,
        "created_utc": 1_634_947_200.0
    })
}

/// The URL fragment of a post's thread fetch.
#[allow(dead_code)]
pub fn thread_route(id: &str) -> String {
    format!("/comments/{}/thread.json", id)
}
