//! Aggregation, deduplication and ranking of candidates.
//!
//! Candidates from every provider are collected into one `Vec` and processed
//! with the [`CandidateListExt`] extension methods:
//!
//! - [`retain_relevant`](CandidateListExt::retain_relevant) - Quality filter
//!   OR-combined with structural relevance signals
//! - [`dedupe_by_identity`](CandidateListExt::dedupe_by_identity) - First
//!   occurrence per provider id (or content key when there is no id)
//! - [`dedupe_by_content`](CandidateListExt::dedupe_by_content) - First
//!   occurrence per author + text prefix
//! - [`sort_by_score`](CandidateListExt::sort_by_score) - Stable, descending
//!
//! # Examples
//!
//! ```rust
//! use reelquotes::rank::CandidateListExt;
//! use reelquotes::types::{QuoteCandidate, SourceKind};
//!
//! let post = |id: &str, ups: i64| {
//!     QuoteCandidate::new(SourceKind::DiscussionPost, "reddit", "")
//!         .with_id(id)
//!         .with_score(ups)
//! };
//!
//! let ranked = vec![post("a", 5), post("b", 50), post("a", 99), post("c", 50)]
//!     .dedupe_by_identity()
//!     .sort_by_score();
//!
//! let ids: Vec<_> = ranked.iter().map(|c| c.id.clone().unwrap()).collect();
//! assert_eq!(ids, vec!["b", "c", "a"]);
//! ```

use std::collections::HashSet;

use crate::{config::RelevancePolicy, filter::QualityFilter, types::QuoteCandidate};

/// Characters of text used by the content key.
pub const CONTENT_KEY_CHARS: usize = 50;

/// Identity of a candidate for deduplication.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DedupeKey {
    /// Provider-native id, scoped by provider
    Native(String, String),
    /// Author + normalized text prefix
    Content(String, String),
}

impl DedupeKey {
    /// Provider id when present, else the content key.
    pub fn identity(candidate: &QuoteCandidate) -> Self {
        match candidate.id.as_deref().filter(|id| !id.is_empty()) {
            Some(id) => DedupeKey::Native(candidate.provider.clone(), id.to_string()),
            None => Self::content(candidate),
        }
    }

    /// Author plus the first [`CONTENT_KEY_CHARS`] characters of text,
    /// lowercased with whitespace runs collapsed so near-identical fragments
    /// collide.
    pub fn content(candidate: &QuoteCandidate) -> Self {
        let prefix: String = candidate
            .text
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase()
            .chars()
            .take(CONTENT_KEY_CHARS)
            .collect();
        DedupeKey::Content(candidate.author_or_anon().to_lowercase(), prefix)
    }
}

/// Decides whether a discussion post is worth expanding.
///
/// A post is relevant when its body passes the quality filter, or when any
/// signal enabled in the [`RelevancePolicy`] fires.
#[derive(Debug, Clone)]
pub struct RelevanceJudge<'a> {
    filter: &'a QualityFilter,
    policy: &'a RelevancePolicy,
    first_word: Option<String>,
}

impl<'a> RelevanceJudge<'a> {
    pub fn new(filter: &'a QualityFilter, policy: &'a RelevancePolicy, term: &str) -> Self {
        Self {
            filter,
            policy,
            first_word: term.split_whitespace().next().map(str::to_lowercase),
        }
    }

    pub fn is_relevant(&self, post: &QuoteCandidate) -> bool {
        if self.filter.accepts(&post.text) {
            return true;
        }

        if self
            .policy
            .min_comments
            .is_some_and(|min| post.comment_count >= min)
        {
            return true;
        }

        let title = post.title.as_deref();
        if self.policy.accept_decent_title && self.filter.accepts_opt(title) {
            return true;
        }

        if self.policy.title_matches_term {
            if let (Some(title), Some(word)) = (title, self.first_word.as_deref()) {
                return title.to_lowercase().contains(word);
            }
        }

        false
    }
}

/// Extension methods for candidate lists.
pub trait CandidateListExt {
    /// Keeps only candidates the judge considers relevant.
    fn retain_relevant(self, judge: &RelevanceJudge<'_>) -> Self;

    /// Keeps the first candidate per [`DedupeKey::identity`].
    fn dedupe_by_identity(self) -> Self;

    /// Keeps the first candidate per [`DedupeKey::content`].
    fn dedupe_by_content(self) -> Self;

    /// Sorts by score, highest first. Ties keep their encounter order.
    fn sort_by_score(self) -> Self;

    /// Drops stickied entries and entries failing the filter, then keeps the
    /// `n` best-scoring.
    fn best_comments(self, filter: &QualityFilter, n: usize) -> Self;
}

impl CandidateListExt for Vec<QuoteCandidate> {
    fn retain_relevant(mut self, judge: &RelevanceJudge<'_>) -> Self {
        self.retain(|c| judge.is_relevant(c));
        self
    }

    fn dedupe_by_identity(mut self) -> Self {
        let mut seen = HashSet::new();
        self.retain(|c| seen.insert(DedupeKey::identity(c)));
        self
    }

    fn dedupe_by_content(mut self) -> Self {
        let mut seen = HashSet::new();
        self.retain(|c| seen.insert(DedupeKey::content(c)));
        self
    }

    fn sort_by_score(mut self) -> Self {
        // `sort_by` is stable
        self.sort_by(|a, b| b.score.cmp(&a.score));
        self
    }

    fn best_comments(mut self, filter: &QualityFilter, n: usize) -> Self {
        self.retain(|c| !c.stickied && filter.accepts(&c.text));
        let mut best = self.sort_by_score();
        best.truncate(n);
        best
    }
}
