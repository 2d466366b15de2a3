use async_trait::async_trait;
use chrono::DateTime;
use serde::Deserialize;
use url::Url;

use crate::{
    config::ReviewConfig,
    net::{Fetcher, Lane},
    provider::ReviewProvider,
    types::{MediaType, QuoteCandidate, ReviewQuery, SourceKind, truncate_chars},
};

/// Review listing response
#[derive(Debug, Deserialize)]
struct TmdbReviewsResponse {
    #[serde(default)]
    results: Vec<TmdbReview>,
}

#[derive(Debug, Deserialize)]
struct TmdbReview {
    id: Option<String>,
    author: Option<String>,
    author_details: Option<TmdbAuthorDetails>,
    #[serde(default)]
    content: String,
    created_at: Option<String>,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TmdbAuthorDetails {
    rating: Option<f64>,
}

/// TMDB review listing, keyed by the canonical TMDB id.
///
/// Review ratings are on a 0-10 scale and are reported as 0-100 scores.
pub struct TmdbSource {
    api_key: String,
    api_base: String,
    lane: Lane,
    max_reviews: usize,
    default_rating: f64,
}

impl TmdbSource {
    /// Create a new TMDB source
    pub fn new(api_key: impl Into<String>, config: &ReviewConfig) -> Self {
        Self {
            api_key: api_key.into(),
            api_base: "https://api.themoviedb.org/3".to_string(),
            lane: Lane::new("tmdb", config.provider_delay),
            max_reviews: config.max_listing_reviews,
            default_rating: config.default_review_rating,
        }
    }

    fn reviews_url(&self, tmdb_id: &str, media: MediaType) -> Option<String> {
        let url = Url::parse_with_params(
            &format!(
                "{}/{}/{}/reviews",
                self.api_base,
                media.tmdb_segment(),
                urlencoding::encode(tmdb_id)
            ),
            &[
                ("api_key", self.api_key.as_str()),
                ("language", "en-US"),
                ("page", "1"),
            ],
        )
        .ok()?;
        Some(url.into())
    }

    fn map_review(&self, review: TmdbReview, tmdb_id: &str, media: MediaType) -> QuoteCandidate {
        let rating = review
            .author_details
            .and_then(|d| d.rating)
            .unwrap_or(self.default_rating);
        let link = review.url.filter(|u| !u.is_empty()).unwrap_or_else(|| {
            format!(
                "https://www.themoviedb.org/{}/{}/reviews",
                media.tmdb_segment(),
                tmdb_id
            )
        });

        let mut candidate = QuoteCandidate::new(SourceKind::Review, self.name(), review.content)
            .with_author(review.author.or_else(|| Some("TMDB user".to_string())))
            .with_score((rating * 10.0).round() as i64)
            .with_link(link)
            .with_date(review.created_at.as_deref().and_then(review_date));

        if let Some(id) = review.id {
            candidate = candidate.with_id(id);
        }
        candidate
    }
}

#[async_trait]
impl ReviewProvider for TmdbSource {
    fn id(&self) -> &'static str {
        "tmdb"
    }

    fn name(&self) -> &'static str {
        "TMDB"
    }

    async fn reviews(&self, fetcher: &Fetcher, query: &ReviewQuery) -> Option<Vec<QuoteCandidate>> {
        let tmdb_id = query.tmdb_id()?;
        let media = query.media_type.unwrap_or(MediaType::Movie);
        let url = self.reviews_url(tmdb_id, media)?;

        let response: TmdbReviewsResponse = fetcher.json(&self.lane, &url).await?;
        Some(
            response
                .results
                .into_iter()
                .take(self.max_reviews)
                .map(|r| self.map_review(r, tmdb_id, media))
                .collect(),
        )
    }
}

/// `YYYY-MM-DD` part of an RFC 3339 timestamp
fn review_date(raw: &str) -> Option<String> {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(dt) => Some(dt.format("%Y-%m-%d").to_string()),
        Err(_) => Some(truncate_chars(raw, 10)).filter(|d| !d.is_empty()),
    }
}
