use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::{
    config::ReviewConfig,
    net::{Fetcher, Lane},
    provider::ReviewProvider,
    types::{MediaType, QuoteCandidate, ReviewQuery, SourceKind},
};

/// Title lookup response
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct OmdbResponse {
    response: Option<String>,
    error: Option<String>,
    ratings: Vec<OmdbRating>,
    plot: Option<String>,
    year: Option<String>,
    #[serde(rename = "imdbID")]
    imdb_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OmdbRating {
    source: String,
    value: String,
}

/// A rating source reinterpreted as a review.
#[derive(Debug, Clone, PartialEq)]
pub struct RatingReview {
    pub author: &'static str,
    pub score: i64,
    pub text: String,
}

/// OMDb ratings aggregator, keyed by title and year.
///
/// OMDb returns aggregate ratings rather than reviews. Each known rating
/// source becomes one synthetic review:
///
/// | Source | Value format | Score |
/// |---|---|---|
/// | Internet Movie Database | `7.8/10` | 78 |
/// | Rotten Tomatoes | `83%` | 83 |
/// | Metacritic | `74/100` | 74 |
pub struct OmdbSource {
    api_key: String,
    api_base: String,
    lane: Lane,
}

impl OmdbSource {
    /// Create a new OMDb source
    pub fn new(api_key: impl Into<String>, config: &ReviewConfig) -> Self {
        Self {
            api_key: api_key.into(),
            api_base: "https://www.omdbapi.com/".to_string(),
            lane: Lane::new("omdb", config.provider_delay),
        }
    }

    fn lookup_url(&self, title: &str, year: Option<&str>, media: MediaType) -> Option<String> {
        let mut params = vec![
            ("apikey", self.api_key.as_str()),
            ("t", title),
            ("type", media.omdb_type()),
        ];
        if let Some(year) = year {
            params.push(("y", year));
        }
        Url::parse_with_params(&self.api_base, &params)
            .ok()
            .map(Into::into)
    }

    /// Reinterprets one named rating. Unknown sources and unparsable values
    /// yield `None`.
    ///
    /// ```rust
    /// use reelquotes::sources::OmdbSource;
    ///
    /// let review = OmdbSource::interpret_rating("Internet Movie Database", "8.0/10", None).unwrap();
    /// assert_eq!(review.score, 80);
    ///
    /// let review = OmdbSource::interpret_rating("Rotten Tomatoes", "83%", Some("A noble son...")).unwrap();
    /// assert_eq!(review.score, 83);
    /// assert!(review.text.ends_with("A noble son..."));
    ///
    /// assert!(OmdbSource::interpret_rating("Metacritic", "N/A", None).is_none());
    /// ```
    pub fn interpret_rating(source: &str, value: &str, plot: Option<&str>) -> Option<RatingReview> {
        let plot = plot.map(str::trim).filter(|p| !p.is_empty() && *p != "N/A");
        let with_plot = |lead: String| match plot {
            Some(plot) => format!("{} {}", lead, plot),
            None => lead,
        };
        let numerator = |v: &str| v.split('/').next()?.trim().parse::<f64>().ok();

        match source {
            "Internet Movie Database" => {
                let score = (numerator(value)? * 10.0).round() as i64;
                Some(RatingReview {
                    author: "IMDb average",
                    score,
                    text: with_plot(format!("Overall IMDb user rating: {}.", value)),
                })
            }
            "Rotten Tomatoes" => {
                let score = value.trim().trim_end_matches('%').parse::<f64>().ok()?.round() as i64;
                Some(RatingReview {
                    author: "Rotten Tomatoes",
                    score,
                    text: with_plot(format!(
                        "Critical consensus: {}% of critics recommend it.",
                        score
                    )),
                })
            }
            "Metacritic" => {
                let score = numerator(value)?.round() as i64;
                Some(RatingReview {
                    author: "Metacritic",
                    score,
                    text: format!("Metascore: {}. Based on professional reviews.", value),
                })
            }
            _ => None,
        }
    }
}

#[async_trait]
impl ReviewProvider for OmdbSource {
    fn id(&self) -> &'static str {
        "omdb"
    }

    fn name(&self) -> &'static str {
        "OMDb"
    }

    fn unit(&self) -> &'static str {
        "ratings"
    }

    async fn reviews(&self, fetcher: &Fetcher, query: &ReviewQuery) -> Option<Vec<QuoteCandidate>> {
        let title = query.term();
        if title.is_empty() {
            return None;
        }
        let media = query.media_type.unwrap_or(MediaType::Movie);
        let url = self.lookup_url(title, query.year(), media)?;

        let data: OmdbResponse = fetcher.json(&self.lane, &url).await?;
        if data.response.as_deref() == Some("False") {
            debug!(title, error = ?data.error, "no OMDb match");
            return Some(Vec::new());
        }

        let link = data
            .imdb_id
            .as_deref()
            .map(|id| format!("https://www.imdb.com/title/{}/", id))
            .unwrap_or_default();

        Some(
            data.ratings
                .iter()
                .filter_map(|r| Self::interpret_rating(&r.source, &r.value, data.plot.as_deref()))
                .map(|r| {
                    QuoteCandidate::new(SourceKind::AggregateRating, self.name(), r.text)
                        .with_author(Some(r.author.to_string()))
                        .with_score(r.score)
                        .with_link(link.clone())
                        .with_date(data.year.clone())
                })
                .collect(),
        )
    }
}
