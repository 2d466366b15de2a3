//! Response assembly: merge, cap, annotate, and never fail.
//!
//! The assembler turns ranked real results plus any synthesized fallback into
//! a [`ResponseEnvelope`]. [`respond`] wraps a whole pipeline run so that
//! errors, and even panics, become an empty envelope with an `error` field
//! instead of a failed request.

use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use tracing::error;

use crate::{
    error::{Error, Result},
    types::{DebugInfo, QuoteCandidate, ResponseEnvelope, ResultsField},
};

/// Counters collected while a pipeline runs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunStats {
    pub candidates_seen: usize,
    pub candidates_kept: usize,
    pub unique_candidates: usize,
    pub search_queries: Vec<String>,
    pub sources_used: Vec<String>,
}

impl RunStats {
    /// Records a contributing source lane once.
    pub fn source_used(&mut self, lane: &str) {
        if !self.sources_used.iter().any(|s| s == lane) {
            self.sources_used.push(lane.to_string());
        }
    }
}

/// Builds envelopes with a fixed output cap and text length.
#[derive(Debug, Clone, Copy)]
pub struct ResponseAssembler {
    field: ResultsField,
    max_results: usize,
    max_text_len: usize,
}

impl ResponseAssembler {
    pub fn new(field: ResultsField, max_results: usize, max_text_len: usize) -> Self {
        Self {
            field,
            max_results,
            max_text_len,
        }
    }

    /// Merges `real` (already ranked) with `synthetic`, in that order, and
    /// applies the output cap.
    ///
    /// Synthetic candidates are appended as-is: they are never deduplicated
    /// against real ones.
    pub fn assemble(
        &self,
        real: Vec<QuoteCandidate>,
        synthetic: Vec<QuoteCandidate>,
        stats: RunStats,
        sources: Option<Vec<String>>,
    ) -> ResponseEnvelope {
        let results: Vec<_> = real
            .into_iter()
            .chain(synthetic)
            .take(self.max_results)
            .map(|c| c.into_ranked(self.max_text_len))
            .collect();

        let synthetic_results = results.iter().filter(|r| r.synthetic).count();
        let debug = DebugInfo {
            candidates_seen: stats.candidates_seen,
            candidates_kept: stats.candidates_kept,
            unique_candidates: stats.unique_candidates,
            real_results: results.len() - synthetic_results,
            synthetic_results,
            search_queries: stats.search_queries,
            sources_used: stats.sources_used,
            has_fallback: synthetic_results > 0,
        };

        ResponseEnvelope {
            field: self.field,
            results,
            debug: Some(debug),
            error: None,
            sources,
        }
    }
}

/// Runs a pipeline future and converts any failure into an error envelope.
///
/// Missing input keeps its descriptive message. Any other error, and any
/// panic, is logged and replaced by `generic_error`.
///
/// ```rust
/// use reelquotes::assemble::respond;
/// use reelquotes::types::{ResponseEnvelope, ResultsField};
/// use reelquotes::Error;
///
/// # async fn example() {
/// let envelope = respond(ResultsField::Quotes, "unavailable", async {
///     Err::<ResponseEnvelope, _>(Error::Other("boom".to_string()))
/// })
/// .await;
///
/// assert!(envelope.results.is_empty());
/// assert_eq!(envelope.error.as_deref(), Some("unavailable"));
/// # }
/// ```
pub async fn respond<F>(field: ResultsField, generic_error: &str, run: F) -> ResponseEnvelope
where
    F: Future<Output = Result<ResponseEnvelope>>,
{
    match AssertUnwindSafe(run).catch_unwind().await {
        Ok(Ok(envelope)) => envelope,
        Ok(Err(Error::MissingInput(msg))) => ResponseEnvelope::failed(field, msg),
        Ok(Err(e)) => {
            error!(field = field.as_str(), error = %e, "pipeline failed");
            ResponseEnvelope::failed(field, generic_error)
        }
        Err(_) => {
            error!(field = field.as_str(), "pipeline panicked");
            ResponseEnvelope::failed(field, generic_error)
        }
    }
}
