use chrono::DateTime;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::{
    config::QuoteConfig,
    net::{Fetcher, Lane},
    types::{QuoteCandidate, SourceKind},
};

/// Listing wrapper (`{ kind: "Listing", data: { children: [...] } }`)
#[derive(Debug, Deserialize)]
struct Listing<T> {
    data: Option<ListingData<T>>,
}

#[derive(Debug, Deserialize)]
struct ListingData<T> {
    #[serde(default = "Vec::new")]
    children: Vec<Thing<T>>,
}

/// One `{ kind, data }` entry of a listing
#[derive(Debug, Deserialize)]
struct Thing<T> {
    data: Option<T>,
}

impl<T> Listing<T> {
    fn into_items(self) -> Vec<T> {
        self.data
            .map(|d| d.children.into_iter().filter_map(|c| c.data).collect())
            .unwrap_or_default()
    }
}

/// Post fields used by the pipeline
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PostData {
    id: Option<String>,
    title: Option<String>,
    selftext: Option<String>,
    author: Option<String>,
    ups: Option<i64>,
    num_comments: Option<u64>,
    permalink: Option<String>,
    stickied: Option<bool>,
    created_utc: Option<f64>,
}

/// Comment fields used by the pipeline. "more" placeholders parse too, with
/// every field empty.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CommentData {
    id: Option<String>,
    body: Option<String>,
    author: Option<String>,
    ups: Option<i64>,
    stickied: Option<bool>,
    created_utc: Option<f64>,
}

/// Reddit client for keyword search, community search and thread detail.
///
/// All three endpoints are public JSON listings. Each has its own pacing
/// lane so that, for example, a burst of thread fetches does not delay the
/// next keyword search.
///
/// # Examples
///
/// ```rust
/// use reelquotes::config::QuoteConfig;
/// use reelquotes::sources::RedditSource;
///
/// let reddit = RedditSource::new(&QuoteConfig::default());
/// assert_eq!(
///     reddit.thread_link("r/movies/comments/abc/dune/"),
///     "https://www.reddit.com/r/movies/comments/abc/dune"
/// );
/// ```
pub struct RedditSource {
    base_url: String,
    global_lane: Lane,
    community_lane: Lane,
    thread_lane: Lane,
    global_limit: u32,
    community_limit: u32,
    thread_limit: u32,
}

impl RedditSource {
    /// Create a new Reddit source using the limits and delays of `config`
    pub fn new(config: &QuoteConfig) -> Self {
        Self {
            base_url: "https://www.reddit.com".to_string(),
            global_lane: Lane::new("reddit.search", config.global_search_delay),
            community_lane: Lane::new("reddit.community", config.community_search_delay),
            thread_lane: Lane::new("reddit.thread", config.thread_delay),
            global_limit: config.global_search_limit,
            community_limit: config.community_search_limit,
            thread_limit: config.thread_comment_limit,
        }
    }

    pub fn id(&self) -> &'static str {
        "reddit"
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Site-wide search for `query` (already percent-encoded) in a time window
    pub async fn search_global(
        &self,
        fetcher: &Fetcher,
        query: &str,
        window: &str,
    ) -> Option<Vec<QuoteCandidate>> {
        let url = format!(
            "{}/search.json?q={}&sort=top&t={}&limit={}&raw_json=1",
            self.base_url, query, window, self.global_limit
        );
        let lane = format!("global-{}", window);
        self.search(fetcher, &self.global_lane, &url, &lane).await
    }

    /// Search restricted to one community
    pub async fn search_community(
        &self,
        fetcher: &Fetcher,
        query: &str,
        community: &str,
    ) -> Option<Vec<QuoteCandidate>> {
        let url = format!(
            "{}/r/{}/search.json?q={}&restrict_sr=1&sort=top&t=all&limit={}&raw_json=1",
            self.base_url, community, query, self.community_limit
        );
        let lane = format!("r/{}", community);
        self.search(fetcher, &self.community_lane, &url, &lane).await
    }

    /// Fetch the top-level comments of the thread at `link`
    ///
    /// `link` is the absolute thread link produced by [`thread_link`](Self::thread_link).
    /// Returns `None` when the fetch fails or the payload is not the usual
    /// `[post listing, comment listing]` pair.
    pub async fn fetch_thread(&self, fetcher: &Fetcher, link: &str) -> Option<Vec<QuoteCandidate>> {
        let url = format!("{}.json?limit={}&raw_json=1", link, self.thread_limit);
        let payload: Vec<Value> = fetcher.json(&self.thread_lane, &url).await?;

        let comments = payload.into_iter().nth(1)?;
        let listing: Listing<CommentData> = match serde_json::from_value(comments) {
            Ok(listing) => listing,
            Err(e) => {
                debug!(url = %url, error = %e, "unexpected comment listing");
                return None;
            }
        };

        Some(
            listing
                .into_items()
                .into_iter()
                .filter_map(|c| self.map_comment(c, link))
                .collect(),
        )
    }

    /// Absolute thread link for a permalink, with trailing slashes removed
    /// and a leading slash ensured
    pub fn thread_link(&self, permalink: &str) -> String {
        let trimmed = permalink.trim().trim_end_matches('/');
        if trimmed.starts_with('/') {
            format!("{}{}", self.base_url, trimmed)
        } else {
            format!("{}/{}", self.base_url, trimmed)
        }
    }

    async fn search(
        &self,
        fetcher: &Fetcher,
        lane: &Lane,
        url: &str,
        label: &str,
    ) -> Option<Vec<QuoteCandidate>> {
        let listing: Listing<PostData> = fetcher.json(lane, url).await?;
        let posts: Vec<QuoteCandidate> = listing
            .into_items()
            .into_iter()
            .map(|p| self.map_post(p, label))
            .collect();
        debug!(lane = label, count = posts.len(), "search returned posts");
        Some(posts)
    }

    /// Map a post to a candidate; posts without a permalink get an empty link
    fn map_post(&self, post: PostData, label: &str) -> QuoteCandidate {
        let link = post
            .permalink
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .map(|p| self.thread_link(p))
            .unwrap_or_default();

        let mut candidate = QuoteCandidate::new(
            SourceKind::DiscussionPost,
            self.id(),
            post.selftext.unwrap_or_default(),
        )
        .with_author(post.author)
        .with_score(post.ups.unwrap_or(0))
        .with_link(link)
        .with_date(post.created_utc.and_then(utc_date))
        .with_comment_count(post.num_comments.unwrap_or(0))
        .with_stickied(post.stickied.unwrap_or(false))
        .with_lane(label);

        if let Some(id) = post.id {
            candidate = candidate.with_id(id);
        }
        if let Some(title) = post.title {
            candidate = candidate.with_title(title);
        }
        candidate
    }

    /// Map a comment to a candidate; placeholders without a body are skipped
    fn map_comment(&self, comment: CommentData, link: &str) -> Option<QuoteCandidate> {
        let body = comment.body?;
        let mut candidate = QuoteCandidate::new(SourceKind::DiscussionComment, self.id(), body)
            .with_author(comment.author)
            .with_score(comment.ups.unwrap_or(0))
            .with_link(link)
            .with_date(comment.created_utc.and_then(utc_date))
            .with_stickied(comment.stickied.unwrap_or(false))
            .with_lane("thread");

        if let Some(id) = comment.id {
            candidate = candidate.with_id(id);
        }
        Some(candidate)
    }
}

/// Formats a unix timestamp as `YYYY-MM-DD`
fn utc_date(timestamp: f64) -> Option<String> {
    DateTime::from_timestamp(timestamp as i64, 0).map(|dt| dt.format("%Y-%m-%d").to_string())
}
