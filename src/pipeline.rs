//! The two handler variants built on the shared core.
//!
//! - [`QuotePipeline`] searches the discussion platform, expands the most
//!   popular threads into their best comments and answers with `quotes`.
//! - [`ReviewPipeline`] asks the review providers (listing + ratings
//!   aggregator) and answers with `reviews` and a `sources` summary.
//!
//! Both run strictly sequentially within a request, create their pacing state
//! per run, and fall back to synthesized fragments when too few real results
//! survive. Use [`respond`](QuotePipeline::respond) to get an envelope that is
//! never an error; [`run`](QuotePipeline::run) exposes the underlying
//! `Result`.
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use reelquotes::config::Config;
//! use reelquotes::net::HttpTransport;
//! use reelquotes::pipeline::QuotePipeline;
//! use reelquotes::types::ReviewQueryBuilder;
//!
//! # async fn example() -> reelquotes::Result<()> {
//! let config = Config::from_env();
//! let transport = Arc::new(HttpTransport::new(&config.credentials.user_agent));
//! let pipeline = QuotePipeline::new(config.quotes.clone(), transport)?;
//!
//! let query = ReviewQueryBuilder::default().term("Dune").build().unwrap();
//! let envelope = pipeline.respond(&query).await;
//! println!("{}", serde_json::to_string_pretty(&envelope)?);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use tracing::{debug, info};

use crate::{
    assemble::{ResponseAssembler, RunStats, respond},
    config::{Config, QuoteConfig, ReviewConfig},
    error::{Error, Result},
    fallback::FallbackSynthesizer,
    filter::QualityFilter,
    net::{Fetcher, Transport},
    planner::QueryPlanner,
    provider::Providers,
    rank::{CandidateListExt, RelevanceJudge},
    types::{QuoteCandidate, ResponseEnvelope, ResultsField, ReviewQuery},
};

#[cfg(feature = "source-reddit")]
use crate::sources::RedditSource;

/// Error shown when the quote pipeline fails unexpectedly.
pub const QUOTES_UNAVAILABLE: &str = "Discussion search temporarily unavailable";

/// Error shown when the review pipeline fails unexpectedly.
pub const REVIEWS_UNAVAILABLE: &str = "Review service temporarily unavailable";

/// Discussion quotes: search → posts → threads → comments.
#[cfg(feature = "source-reddit")]
pub struct QuotePipeline {
    config: QuoteConfig,
    filter: QualityFilter,
    planner: QueryPlanner,
    reddit: RedditSource,
    transport: Arc<dyn Transport>,
}

#[cfg(feature = "source-reddit")]
impl QuotePipeline {
    /// Builds the pipeline, compiling the quality filter once.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] if a filter pattern is invalid.
    pub fn new(config: QuoteConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        Ok(Self {
            filter: QualityFilter::new(&config.filter)?,
            planner: QueryPlanner::new(config.max_queries),
            reddit: RedditSource::new(&config),
            config,
            transport,
        })
    }

    pub fn config(&self) -> &QuoteConfig {
        &self.config
    }

    /// Runs the pipeline, converting every failure into an error envelope.
    pub async fn respond(&self, query: &ReviewQuery) -> ResponseEnvelope {
        respond(ResultsField::Quotes, QUOTES_UNAVAILABLE, self.run(query)).await
    }

    /// Runs the pipeline.
    ///
    /// # Errors
    ///
    /// [`Error::MissingInput`] when the query has neither a term nor an
    /// identifier. Provider failures are not errors; they yield no candidates.
    pub async fn run(&self, query: &ReviewQuery) -> Result<ResponseEnvelope> {
        let plan = self.planner.plan(query);
        if plan.is_empty() {
            return Err(Error::missing_input("No search term or identifier provided"));
        }

        let fetcher = Fetcher::new(self.transport.clone(), self.config.timeout);
        let mut stats = RunStats {
            search_queries: plan.decoded(),
            ..RunStats::default()
        };

        let posts = self.collect_posts(&fetcher, plan.encoded(), &mut stats).await;
        stats.candidates_seen = posts.len();

        let posts = posts.dedupe_by_identity();
        stats.unique_candidates = posts.len();

        let judge = RelevanceJudge::new(&self.filter, &self.config.relevance, query.term());
        let mut top = posts.retain_relevant(&judge).sort_by_score();
        stats.candidates_kept = top.len();
        top.truncate(self.config.max_posts);
        info!(kept = stats.candidates_kept, expanding = top.len(), "posts after filtering");

        let quotes = self.collect_quotes(&fetcher, top).await;
        let real = quotes.dedupe_by_content().sort_by_score();

        let synth = FallbackSynthesizer::new(&self.config.fallback);
        let synthetic = if synth.needed(real.len()) {
            info!(real = real.len(), "too few quotes, generating fallback content");
            synth.synthesize(query)
        } else {
            Vec::new()
        };

        let assembler = ResponseAssembler::new(
            ResultsField::Quotes,
            self.config.max_results,
            self.config.max_text_len,
        );
        Ok(assembler.assemble(real, synthetic, stats, None))
    }

    /// Global search (first time window with hits) then community search,
    /// for every planned query, one call at a time.
    async fn collect_posts(
        &self,
        fetcher: &Fetcher,
        queries: &[String],
        stats: &mut RunStats,
    ) -> Vec<QuoteCandidate> {
        let mut posts = Vec::new();

        for query in queries {
            debug!(query = %query, "searching");

            for window in &self.config.time_windows {
                let found = self
                    .reddit
                    .search_global(fetcher, query, window)
                    .await
                    .unwrap_or_default();
                if !found.is_empty() {
                    stats.source_used(&format!("global-{}", window));
                    posts.extend(found);
                    break;
                }
            }

            for community in &self.config.communities {
                let found = self
                    .reddit
                    .search_community(fetcher, query, community)
                    .await
                    .unwrap_or_default();
                if !found.is_empty() {
                    stats.source_used(&format!("r/{}", community));
                    posts.extend(found);
                }
            }
        }

        info!(total = posts.len(), "posts collected");
        posts
    }

    /// Expands posts into quotes, stopping once `max_quotes` is reached.
    async fn collect_quotes(&self, fetcher: &Fetcher, posts: Vec<QuoteCandidate>) -> Vec<QuoteCandidate> {
        let mut quotes = Vec::new();

        for post in posts {
            if quotes.len() >= self.config.max_quotes {
                break;
            }
            if post.link.is_empty() {
                continue;
            }

            let comments = self
                .reddit
                .fetch_thread(fetcher, &post.link)
                .await
                .map(|c| c.best_comments(&self.filter, self.config.comments_per_post))
                .unwrap_or_default();

            if comments.is_empty() {
                if self.filter.accepts(&post.text) {
                    quotes.push(post);
                }
                continue;
            }

            for comment in comments {
                if quotes.len() >= self.config.max_quotes {
                    break;
                }
                quotes.push(comment);
            }
        }

        quotes
    }
}

/// Reviews: listing provider + ratings aggregator.
pub struct ReviewPipeline {
    config: ReviewConfig,
    filter: QualityFilter,
    providers: Providers,
    transport: Arc<dyn Transport>,
}

impl ReviewPipeline {
    /// Builds the pipeline over an explicit provider list.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] if a filter pattern is invalid.
    pub fn new(config: ReviewConfig, providers: Providers, transport: Arc<dyn Transport>) -> Result<Self> {
        Ok(Self {
            filter: QualityFilter::new(&config.filter)?,
            config,
            providers,
            transport,
        })
    }

    /// Builds the pipeline with every provider that has credentials.
    pub fn from_config(config: &Config, transport: Arc<dyn Transport>) -> Result<Self> {
        #[allow(unused_mut)]
        let mut providers = Providers::new();

        #[cfg(feature = "source-tmdb")]
        if let Some(key) = &config.credentials.tmdb_api_key {
            providers.add(crate::sources::TmdbSource::new(key.clone(), &config.reviews));
        }

        #[cfg(feature = "source-omdb")]
        if let Some(key) = &config.credentials.omdb_api_key {
            providers.add(crate::sources::OmdbSource::new(key.clone(), &config.reviews));
        }

        Self::new(config.reviews.clone(), providers, transport)
    }

    pub fn providers(&self) -> &Providers {
        &self.providers
    }

    /// Runs the pipeline, converting every failure into an error envelope.
    pub async fn respond(&self, query: &ReviewQuery) -> ResponseEnvelope {
        respond(ResultsField::Reviews, REVIEWS_UNAVAILABLE, self.run(query)).await
    }

    /// Runs the pipeline.
    ///
    /// # Errors
    ///
    /// [`Error::MissingInput`] when the query has neither a title nor a TMDB id.
    pub async fn run(&self, query: &ReviewQuery) -> Result<ResponseEnvelope> {
        if query.term().is_empty() && query.tmdb_id().is_none() {
            return Err(Error::missing_input("Title or TMDB id required"));
        }
        info!(title = query.term(), year = ?query.year(), "searching reviews");

        let fetcher = Fetcher::new(self.transport.clone(), self.config.timeout);
        let mut stats = RunStats {
            search_queries: Self::describe(query),
            ..RunStats::default()
        };
        let mut sources = Vec::new();
        let mut candidates = Vec::new();

        for outcome in self.providers.collect_all(&fetcher, query).await {
            if let Some(summary) = outcome.summary {
                stats.source_used(outcome.id);
                sources.push(summary);
            }
            candidates.extend(outcome.candidates);
        }
        stats.candidates_seen = candidates.len();

        candidates.retain(|c| self.filter.accepts(&c.text));
        stats.candidates_kept = candidates.len();

        let real = candidates
            .dedupe_by_identity()
            .dedupe_by_content()
            .sort_by_score();
        stats.unique_candidates = real.len();

        let synth = FallbackSynthesizer::new(&self.config.fallback);
        let synthetic = if synth.needed(real.len()) {
            let generated = synth.synthesize(query);
            info!(count = generated.len(), "generated contextual reviews");
            sources.push(format!("Synthetic ({})", generated.len()));
            generated
        } else {
            Vec::new()
        };

        let assembler = ResponseAssembler::new(
            ResultsField::Reviews,
            self.config.max_results,
            self.config.max_text_len,
        );
        Ok(assembler.assemble(real, synthetic, stats, Some(sources)))
    }

    /// Human-readable description of what was looked up.
    fn describe(query: &ReviewQuery) -> Vec<String> {
        let mut lookups = Vec::new();
        match (query.term(), query.year()) {
            ("", _) => {}
            (term, Some(year)) => lookups.push(format!("{} ({})", term, year)),
            (term, None) => lookups.push(term.to_string()),
        }
        if let Some(id) = query.tmdb_id() {
            lookups.push(format!("tmdb:{}", id));
        }
        lookups
    }
}
