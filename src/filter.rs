//! The quality filter: is this text fragment usable?
//!
//! A [`QualityFilter`] is compiled once from a [`FilterPolicy`] and then
//! applied, unchanged, to every fragment from every provider in a run.
//!
//! A fragment is rejected when, after trimming, it is:
//!
//! - empty, shorter than `min_len` or longer than `max_len` characters
//! - matching any spam pattern (anywhere, case-insensitive)
//! - starting with an automated-removal marker (case-insensitive)
//! - carrying an `http(s)://` link while shorter than `link_min_len`
//!
//! # Examples
//!
//! ```rust
//! use reelquotes::config::FilterPolicy;
//! use reelquotes::filter::QualityFilter;
//!
//! let filter = QualityFilter::new(&FilterPolicy::default()).unwrap();
//!
//! assert!(filter.accepts("The sandworm sequence alone is worth the ticket."));
//! assert!(!filter.accepts("too short"));
//! assert!(!filter.accepts("[removed] by the moderators of this community"));
//! assert!(!filter.accepts_opt(None));
//! ```

use regex::Regex;

use crate::{config::FilterPolicy, error::Result};

/// Compiled accept/reject predicate over candidate text.
#[derive(Debug, Clone)]
pub struct QualityFilter {
    min_len: usize,
    max_len: usize,
    link_min_len: usize,
    spam: Option<Regex>,
    removal: Option<Regex>,
    link: Regex,
}

impl QualityFilter {
    /// Compiles the policy.
    ///
    /// # Errors
    ///
    /// [`Error::Config`](crate::Error::Config) if a pattern does not compile.
    pub fn new(policy: &FilterPolicy) -> Result<Self> {
        Ok(Self {
            min_len: policy.min_len,
            max_len: policy.max_len,
            link_min_len: policy.link_min_len,
            spam: alternation(&policy.spam_patterns, false)?,
            removal: alternation(&policy.removal_markers, true)?,
            link: Regex::new(r"(?i)https?://")?,
        })
    }

    /// Returns `true` when the fragment is usable.
    pub fn accepts(&self, text: &str) -> bool {
        let t = text.trim();
        if t.is_empty() {
            return false;
        }

        let len = t.chars().count();
        if len < self.min_len || len > self.max_len {
            return false;
        }

        if self.spam.as_ref().is_some_and(|re| re.is_match(t)) {
            return false;
        }

        if self.removal.as_ref().is_some_and(|re| re.is_match(t)) {
            return false;
        }

        // Link-only posts are almost always self-promotion.
        if len < self.link_min_len && self.link.is_match(t) {
            return false;
        }

        true
    }

    /// Same as [`accepts`](Self::accepts), treating a missing text as rejected.
    pub fn accepts_opt(&self, text: Option<&str>) -> bool {
        text.is_some_and(|t| self.accepts(t))
    }
}

/// Builds one case-insensitive alternation out of a pattern list.
fn alternation(patterns: &[String], anchored: bool) -> Result<Option<Regex>> {
    let parts: Vec<&str> = patterns
        .iter()
        .map(|p| p.as_str())
        .filter(|p| !p.is_empty())
        .collect();
    if parts.is_empty() {
        return Ok(None);
    }

    let anchor = if anchored { "^" } else { "" };
    let source = format!("(?i){}(?:{})", anchor, parts.join("|"));
    Ok(Some(Regex::new(&source)?))
}
