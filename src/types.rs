//! Core data types for queries, candidates, ranked results and responses.
//!
//! This module defines the fundamental data structures used throughout reelquotes:
//!
//! - [`ReviewQuery`] - What the caller asked for (title, year, media type, ids)
//! - [`QuoteCandidate`] - A raw post, comment or review fetched from a provider
//! - [`RankedResult`] - A filtered, deduplicated, score-sorted output entry
//! - [`ResponseEnvelope`] - The JSON body handed back to the caller
//!
//! Everything here is request-local: created, transformed and dropped within
//! a single pipeline run.
//!
//! # Examples
//!
//! ```rust
//! use reelquotes::types::{MediaType, ReviewQueryBuilder};
//!
//! let query = ReviewQueryBuilder::default()
//!     .term("Dune")
//!     .year(Some("2021".to_string()))
//!     .media_type(Some(MediaType::Movie))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(query.term, "Dune");
//! assert!(query.tmdb_id.is_none());
//! ```

use derive_builder::Builder;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// Placeholder author used when a provider omits one.
pub const ANONYMOUS_AUTHOR: &str = "anon";

/// Kind of work being looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    Tv,
}

impl MediaType {
    /// Parses the inbound `type` parameter. Unknown values yield `None`.
    ///
    /// ```rust
    /// use reelquotes::types::MediaType;
    ///
    /// assert_eq!(MediaType::parse("tv"), Some(MediaType::Tv));
    /// assert_eq!(MediaType::parse(" Movie "), Some(MediaType::Movie));
    /// assert_eq!(MediaType::parse("podcast"), None);
    /// ```
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "movie" => Some(MediaType::Movie),
            "tv" => Some(MediaType::Tv),
            _ => None,
        }
    }

    /// Path segment used by the review listing endpoint.
    pub fn tmdb_segment(self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Tv => "tv",
        }
    }

    /// Value of the `type` parameter understood by the ratings aggregator.
    pub fn omdb_type(self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Tv => "series",
        }
    }
}

/// Parameters of a single lookup.
///
/// Built with the generated `ReviewQueryBuilder`, or directly from a term.
///
/// # Fields
///
/// * `term` - Title or free-text search term (may be empty when an id is given)
/// * `year` - Release year, passed through verbatim
/// * `media_type` - Movie or TV
/// * `imdb_id` - External identifier searched as its own query
/// * `tmdb_id` - Canonical id for the review listing
/// * `rating_hint` - Known rating on a 0-10 scale, used by fallback synthesis
/// * `genres` - Genre names, used by fallback synthesis
#[derive(Debug, Clone, Default, Builder)]
#[builder(setter(into))]
pub struct ReviewQuery {
    #[builder(default)]
    pub term: String,
    #[builder(default)]
    pub year: Option<String>,
    #[builder(default)]
    pub media_type: Option<MediaType>,
    #[builder(default)]
    pub imdb_id: Option<String>,
    #[builder(default)]
    pub tmdb_id: Option<String>,
    #[builder(default)]
    pub rating_hint: Option<f64>,
    #[builder(default)]
    pub genres: Vec<String>,
}

impl ReviewQuery {
    /// Trimmed search term.
    pub fn term(&self) -> &str {
        self.term.trim()
    }

    /// Year, if present and not blank.
    pub fn year(&self) -> Option<&str> {
        non_blank(self.year.as_deref())
    }

    /// External identifier, if present and not blank.
    pub fn imdb_id(&self) -> Option<&str> {
        non_blank(self.imdb_id.as_deref())
    }

    /// Canonical review-listing id, if present and not blank.
    pub fn tmdb_id(&self) -> Option<&str> {
        non_blank(self.tmdb_id.as_deref())
    }

    /// Name used when talking about the work in synthesized text.
    pub fn display_title(&self) -> &str {
        if !self.term().is_empty() {
            self.term()
        } else {
            self.imdb_id().or(self.tmdb_id()).unwrap_or_default()
        }
    }
}

impl From<&str> for ReviewQuery {
    fn from(term: &str) -> Self {
        ReviewQuery {
            term: term.to_string(),
            ..Default::default()
        }
    }
}

impl From<String> for ReviewQuery {
    fn from(term: String) -> Self {
        ReviewQuery {
            term,
            ..Default::default()
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Where a candidate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    DiscussionPost,
    DiscussionComment,
    Review,
    AggregateRating,
    Synthetic,
}

/// A raw post, comment or review before filtering.
///
/// Candidates are created by the provider fetchers, pass through the quality
/// filter and the ranker, and end up as [`RankedResult`]s.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteCandidate {
    /// Provider-native unique id, when the provider has one
    pub id: Option<String>,
    /// Body text
    pub text: String,
    /// Post title (discussion posts only)
    pub title: Option<String>,
    /// Author name as reported by the provider
    pub author: Option<String>,
    /// Provider-native popularity score (upvotes, 0-100 rating)
    pub score: i64,
    pub kind: SourceKind,
    /// Permalink or URL
    pub link: String,
    /// Creation date or release year
    pub date: Option<String>,
    pub comment_count: u64,
    pub stickied: bool,
    /// Provider label shown to the caller
    pub provider: String,
    /// Search lane that produced the candidate, e.g. `global-year` or `r/movies`
    pub lane: Option<String>,
}

impl QuoteCandidate {
    /// Creates a candidate with the given kind, provider label and text.
    pub fn new(kind: SourceKind, provider: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: None,
            text: text.into(),
            title: None,
            author: None,
            score: 0,
            kind,
            link: String::new(),
            date: None,
            comment_count: 0,
            stickied: false,
            provider: provider.into(),
            lane: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the author. Blank names are treated as missing.
    pub fn with_author(mut self, author: Option<String>) -> Self {
        self.author = author.filter(|a| !a.trim().is_empty());
        self
    }

    pub fn with_score(mut self, score: i64) -> Self {
        self.score = score;
        self
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = link.into();
        self
    }

    pub fn with_date(mut self, date: Option<String>) -> Self {
        self.date = date;
        self
    }

    pub fn with_comment_count(mut self, count: u64) -> Self {
        self.comment_count = count;
        self
    }

    pub fn with_stickied(mut self, stickied: bool) -> Self {
        self.stickied = stickied;
        self
    }

    pub fn with_lane(mut self, lane: impl Into<String>) -> Self {
        self.lane = Some(lane.into());
        self
    }

    /// Author name, or [`ANONYMOUS_AUTHOR`] when the provider gave none.
    pub fn author_or_anon(&self) -> &str {
        self.author.as_deref().unwrap_or(ANONYMOUS_AUTHOR)
    }

    pub fn is_synthetic(&self) -> bool {
        self.kind == SourceKind::Synthetic
    }

    /// Converts the candidate into its public output shape, truncating the
    /// text to `max_chars` characters.
    pub fn into_ranked(self, max_chars: usize) -> RankedResult {
        let synthetic = self.is_synthetic();
        RankedResult {
            text: truncate_chars(self.text.trim(), max_chars),
            author: self.author.unwrap_or_else(|| ANONYMOUS_AUTHOR.to_string()),
            score: self.score,
            link: self.link,
            source: self.provider,
            date: self.date,
            synthetic,
        }
    }
}

/// Returns at most the first `max_chars` characters of `text`.
///
/// ```rust
/// use reelquotes::types::truncate_chars;
///
/// assert_eq!(truncate_chars("ação", 2), "aç");
/// assert_eq!(truncate_chars("short", 50), "short");
/// ```
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => text[..end].to_string(),
        None => text.to_string(),
    }
}

/// A filtered, deduplicated, score-sorted entry ready for output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedResult {
    pub text: String,
    pub author: String,
    pub score: i64,
    pub link: String,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// True for generated placeholder content
    pub synthetic: bool,
}

/// Name of the result array in the response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultsField {
    Quotes,
    Reviews,
}

impl ResultsField {
    pub fn as_str(self) -> &'static str {
        match self {
            ResultsField::Quotes => "quotes",
            ResultsField::Reviews => "reviews",
        }
    }
}

/// Diagnostic counters attached to every successful response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugInfo {
    /// Candidates returned by all providers
    pub candidates_seen: usize,
    /// Candidates that passed the quality filter or a relevance signal
    pub candidates_kept: usize,
    /// Candidates left after deduplication
    pub unique_candidates: usize,
    pub real_results: usize,
    pub synthetic_results: usize,
    /// Decoded query strings that were sent to providers.
    ///
    /// Serialized as `searchQueries`, the key existing frontends read for the
    /// list of queries used. There is no separate `queriesUsed` key.
    pub search_queries: Vec<String>,
    /// Provider lanes that contributed at least one candidate
    pub sources_used: Vec<String>,
    pub has_fallback: bool,
}

/// The response body.
///
/// Serialized as `{ "<quotes|reviews>": [...], "debug"?, "error"?, "sources"? }`.
/// Transport status is always success; failures travel in `error`.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseEnvelope {
    pub field: ResultsField,
    pub results: Vec<RankedResult>,
    pub debug: Option<DebugInfo>,
    pub error: Option<String>,
    pub sources: Option<Vec<String>>,
}

impl ResponseEnvelope {
    /// An empty envelope carrying an error description.
    pub fn failed(field: ResultsField, error: impl Into<String>) -> Self {
        Self {
            field,
            results: Vec::new(),
            debug: None,
            error: Some(error.into()),
            sources: match field {
                ResultsField::Reviews => Some(Vec::new()),
                ResultsField::Quotes => None,
            },
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

impl Serialize for ResponseEnvelope {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry(self.field.as_str(), &self.results)?;
        if let Some(sources) = &self.sources {
            map.serialize_entry("sources", sources)?;
        }
        if let Some(debug) = &self.debug {
            map.serialize_entry("debug", debug)?;
        }
        if let Some(error) = &self.error {
            map.serialize_entry("error", error)?;
        }
        map.end()
    }
}
