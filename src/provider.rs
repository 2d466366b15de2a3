//! Review provider trait and collection.
//!
//! This module defines the [`ReviewProvider`] trait implemented by the review
//! listing and ratings aggregator clients, and the [`Providers`] collection the
//! review pipeline walks through. Providers are always queried one after
//! another, never concurrently, to respect the upstream rate limits.
//!
//! # Examples
//!
//! ```rust
//! use reelquotes::prelude::*;
//! use reelquotes::net::Fetcher;
//! use async_trait::async_trait;
//!
//! struct Critics;
//!
//! #[async_trait]
//! impl ReviewProvider for Critics {
//!     fn id(&self) -> &'static str { "critics" }
//!     fn name(&self) -> &'static str { "Critics" }
//!
//!     async fn reviews(
//!         &self,
//!         _fetcher: &Fetcher,
//!         _query: &ReviewQuery,
//!     ) -> Option<Vec<QuoteCandidate>> {
//!         Some(vec![])
//!     }
//! }
//!
//! let mut providers = Providers::new();
//! providers.add(Critics);
//! assert_eq!(providers.list_ids(), vec!["critics"]);
//! ```

use async_trait::async_trait;
use std::collections::HashMap;
use tracing::{debug, info};

use crate::{
    net::Fetcher,
    types::{QuoteCandidate, ReviewQuery},
};

/// Trait that all review providers implement.
///
/// # Implementation Guidelines
///
/// - Issue requests through the supplied [`Fetcher`] so pacing and deadlines apply
/// - Never fail: return `None` for "could not reach the provider" and
///   `Some(vec![])` for "reached it, nothing there"
/// - Return `None` without any network call when the query lacks the key the
///   provider needs (e.g. no canonical id)
#[async_trait]
pub trait ReviewProvider: Send + Sync {
    /// Short, lowercase identifier.
    fn id(&self) -> &'static str;

    /// Human-readable name, used in the `sources` summary.
    fn name(&self) -> &'static str;

    /// Label for the summary line, e.g. `reviews` or `ratings`.
    fn unit(&self) -> &'static str {
        "reviews"
    }

    /// Fetches candidates for the query.
    async fn reviews(&self, fetcher: &Fetcher, query: &ReviewQuery) -> Option<Vec<QuoteCandidate>>;
}

/// What a single provider contributed to a run.
#[derive(Debug, Clone)]
pub struct ProviderOutcome {
    pub id: &'static str,
    /// Summary line such as `TMDB (3 reviews)`; `None` when nothing was found
    pub summary: Option<String>,
    pub candidates: Vec<QuoteCandidate>,
}

/// An ordered collection of review providers.
pub struct Providers {
    providers: Vec<Box<dyn ReviewProvider>>,
    by_id: HashMap<String, usize>,
}

impl Providers {
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
            by_id: HashMap::new(),
        }
    }

    /// Appends a provider. Providers are queried in insertion order.
    pub fn add(&mut self, provider: impl ReviewProvider + 'static) -> &mut Self {
        let id = provider.id().to_string();
        let index = self.providers.len();
        self.providers.push(Box::new(provider));
        self.by_id.insert(id, index);
        self
    }

    pub fn get(&self, id: &str) -> Option<&dyn ReviewProvider> {
        self.by_id
            .get(id)
            .and_then(|&index| self.providers.get(index))
            .map(|p| p.as_ref())
    }

    pub fn list_ids(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.id()).collect()
    }

    /// Queries every provider in order, one at a time.
    pub async fn collect_all(&self, fetcher: &Fetcher, query: &ReviewQuery) -> Vec<ProviderOutcome> {
        let mut outcomes = Vec::with_capacity(self.providers.len());

        for provider in &self.providers {
            let candidates = provider.reviews(fetcher, query).await.unwrap_or_default();
            let summary = if candidates.is_empty() {
                debug!(provider = provider.id(), "no candidates");
                None
            } else {
                info!(provider = provider.id(), count = candidates.len(), "found candidates");
                Some(format!(
                    "{} ({} {})",
                    provider.name(),
                    candidates.len(),
                    provider.unit()
                ))
            };
            outcomes.push(ProviderOutcome {
                id: provider.id(),
                summary,
                candidates,
            });
        }

        outcomes
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl Default for Providers {
    fn default() -> Self {
        Self::new()
    }
}
