//! Immutable configuration loaded once at process start.
//!
//! Every tunable threshold of the pipelines lives here: the quality filter's
//! denylists, the relevance OR-rule, result caps, pacing delays and the
//! fallback policy. A [`Config`] is built once (usually by
//! [`Config::from_env`]) and shared read-only, typically behind an `Arc`.
//!
//! # Examples
//!
//! ```rust
//! use reelquotes::config::{Config, QuoteConfig};
//!
//! let config = Config::default();
//! assert_eq!(config.quotes.max_results, 6);
//! assert_eq!(config.quotes.filter.min_len, 15);
//!
//! let strict = QuoteConfig {
//!     max_results: 3,
//!     ..QuoteConfig::default()
//! };
//! assert_eq!(strict.max_results, 3);
//! ```

use std::time::Duration;
use tracing::warn;

/// Default user agent sent to every provider.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (compatible; reelquotes/0.1)";

/// Default address of the HTTP surface.
pub const DEFAULT_BIND: &str = "0.0.0.0:3000";

/// Thresholds of the quality filter.
///
/// Patterns are regular expressions matched case-insensitively. Lengths are
/// counted in characters on the trimmed text.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterPolicy {
    pub min_len: usize,
    pub max_len: usize,
    /// Rejected anywhere in the text
    pub spam_patterns: Vec<String>,
    /// Rejected at the start of the text
    pub removal_markers: Vec<String>,
    /// Text containing an `http(s)://` link needs at least this many characters
    pub link_min_len: usize,
}

impl Default for FilterPolicy {
    fn default() -> Self {
        Self {
            min_len: 15,
            max_len: 800,
            spam_patterns: vec![
                "buy followers".to_string(),
                "crypto".to_string(),
                "bitcoin".to_string(),
                "promo code".to_string(),
            ],
            removal_markers: vec![
                "AutoModerator".to_string(),
                "removed".to_string(),
                "deleted".to_string(),
                r"\[removed\]".to_string(),
                r"\[deleted\]".to_string(),
            ],
            link_min_len: 80,
        }
    }
}

/// Structural relevance signals OR-combined with the quality filter when
/// deciding whether a discussion post is worth expanding.
///
/// A post is kept when its body passes the filter, or when any enabled signal
/// fires.
#[derive(Debug, Clone, PartialEq)]
pub struct RelevancePolicy {
    /// Keep posts with at least this many comments. `None` disables the signal.
    pub min_comments: Option<u64>,
    /// Keep posts whose title passes the quality filter.
    pub accept_decent_title: bool,
    /// Keep posts whose title contains the first word of the search term.
    pub title_matches_term: bool,
}

impl Default for RelevancePolicy {
    fn default() -> Self {
        Self {
            min_comments: Some(1),
            accept_decent_title: true,
            title_matches_term: true,
        }
    }
}

/// When and how placeholder content is generated.
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackPolicy {
    /// Synthesis triggers when fewer real results than this survive.
    pub min_real_results: usize,
    /// Number of fragments synthesized.
    pub count: usize,
    /// Rating (0-10) assumed when the caller gives none.
    pub default_rating: f64,
    /// Ratings at or above this pick the positive bucket.
    pub positive_cutoff: f64,
    /// Ratings at or below this pick the negative bucket.
    pub negative_cutoff: f64,
    /// Maximum score perturbation, in score points. Zero gives fixed scores.
    pub score_jitter: f64,
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        Self {
            min_real_results: 2,
            count: 2,
            default_rating: 7.0,
            positive_cutoff: 8.0,
            negative_cutoff: 5.0,
            score_jitter: 10.0,
        }
    }
}

/// Settings of the discussion-quote pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteConfig {
    pub filter: FilterPolicy,
    pub relevance: RelevancePolicy,
    pub fallback: FallbackPolicy,
    /// Upper bound on planned queries.
    pub max_queries: usize,
    /// Global search time windows, tried in order until one yields posts.
    pub time_windows: Vec<String>,
    /// Curated communities searched for every query, in priority order.
    pub communities: Vec<String>,
    pub global_search_limit: u32,
    pub community_search_limit: u32,
    pub thread_comment_limit: u32,
    /// Posts expanded into their comment threads.
    pub max_posts: usize,
    /// Comments kept per post.
    pub comments_per_post: usize,
    /// Quote production stops at this many quotes.
    pub max_quotes: usize,
    /// Final output cap.
    pub max_results: usize,
    /// Characters kept from each quote.
    pub max_text_len: usize,
    pub timeout: Duration,
    pub global_search_delay: Duration,
    pub community_search_delay: Duration,
    pub thread_delay: Duration,
}

impl Default for QuoteConfig {
    fn default() -> Self {
        Self {
            filter: FilterPolicy::default(),
            relevance: RelevancePolicy::default(),
            fallback: FallbackPolicy::default(),
            max_queries: 6,
            time_windows: vec!["year".to_string(), "all".to_string(), "month".to_string()],
            communities: vec![
                "movies".to_string(),
                "television".to_string(),
                "MarvelStudios".to_string(),
            ],
            global_search_limit: 10,
            community_search_limit: 8,
            thread_comment_limit: 30,
            max_posts: 6,
            comments_per_post: 2,
            max_quotes: 8,
            max_results: 6,
            max_text_len: 300,
            timeout: Duration::from_secs(5),
            global_search_delay: Duration::from_millis(300),
            community_search_delay: Duration::from_millis(200),
            thread_delay: Duration::from_millis(100),
        }
    }
}

/// Settings of the review pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewConfig {
    /// Applied to every review and rating; longer reviews are allowed here
    /// because they are truncated on output.
    pub filter: FilterPolicy,
    pub fallback: FallbackPolicy,
    /// Reviews taken from the listing endpoint.
    pub max_listing_reviews: usize,
    /// Rating assumed for a listing review without one (0-10).
    pub default_review_rating: f64,
    pub max_results: usize,
    pub max_text_len: usize,
    pub timeout: Duration,
    pub provider_delay: Duration,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            filter: FilterPolicy {
                max_len: 20_000,
                ..FilterPolicy::default()
            },
            fallback: FallbackPolicy::default(),
            max_listing_reviews: 4,
            default_review_rating: 7.0,
            max_results: 6,
            max_text_len: 400,
            timeout: Duration::from_secs(5),
            provider_delay: Duration::ZERO,
        }
    }
}

/// Provider credentials and process-level settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Credentials {
    pub tmdb_api_key: Option<String>,
    pub omdb_api_key: Option<String>,
    pub user_agent: String,
    pub bind: String,
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            tmdb_api_key: None,
            omdb_api_key: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            bind: DEFAULT_BIND.to_string(),
        }
    }
}

/// Complete configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub credentials: Credentials,
    pub quotes: QuoteConfig,
    pub reviews: ReviewConfig,
}

impl Config {
    /// Builds the configuration from the process environment.
    ///
    /// Reads `TMDB_API_KEY`, `OMDB_API_KEY`, `REELQUOTES_USER_AGENT` and
    /// `REELQUOTES_BIND`. A missing API key disables the matching provider.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// ```rust
    /// use reelquotes::config::Config;
    ///
    /// let config = Config::from_lookup(|key| match key {
    ///     "OMDB_API_KEY" => Some("abc123".to_string()),
    ///     _ => None,
    /// });
    /// assert_eq!(config.credentials.omdb_api_key.as_deref(), Some("abc123"));
    /// assert!(config.credentials.tmdb_api_key.is_none());
    /// ```
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let tmdb_api_key = read("TMDB_API_KEY");
        if tmdb_api_key.is_none() {
            warn!("TMDB_API_KEY not set, review listing disabled");
        }
        let omdb_api_key = read("OMDB_API_KEY");
        if omdb_api_key.is_none() {
            warn!("OMDB_API_KEY not set, ratings aggregator disabled");
        }

        Self {
            credentials: Credentials {
                tmdb_api_key,
                omdb_api_key,
                user_agent: read("REELQUOTES_USER_AGENT")
                    .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
                bind: read("REELQUOTES_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string()),
            },
            ..Self::default()
        }
    }
}
