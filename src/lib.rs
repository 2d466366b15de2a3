//! # reelquotes - Audience opinion aggregation for films and series
//!
//! reelquotes collects short audience opinions about a title from public
//! discussion threads, review listings and ratings aggregators, ranks and
//! deduplicates them, and returns a capped list ready for display. When too
//! few real opinions are found it adds clearly marked synthetic fragments so
//! the consumer never shows an empty panel.
//!
//! ## Features
//!
//! - **Two pipelines**: discussion quotes ([`QuotePipeline`]) and reviews
//!   ([`ReviewPipeline`]) over one shared core
//! - **Polite fetching**: strictly sequential calls with per-lane pacing and
//!   a per-call timeout
//! - **Fault tolerant**: a failing provider contributes nothing, and a failing
//!   run still answers with an envelope carrying an `error` field
//! - **Configurable policy**: quality filter, relevance signals, caps and
//!   fallback thresholds live in [`config`]
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use reelquotes::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> reelquotes::Result<()> {
//!     let config = Config::from_env();
//!     let transport = Arc::new(HttpTransport::new(&config.credentials.user_agent));
//!     let reviews = ReviewPipeline::from_config(&config, transport)?;
//!
//!     let query = ReviewQueryBuilder::default()
//!         .term("Dune")
//!         .year(Some("2021".to_string()))
//!         .tmdb_id(Some("438631".to_string()))
//!         .build()
//!         .unwrap();
//!
//!     let envelope = reviews.respond(&query).await;
//!     println!("{} reviews", envelope.results.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`types`]: Queries, candidates, ranked results and the response envelope
//! - [`config`]: Policies, limits and credentials
//! - [`filter`]: Text quality filter
//! - [`planner`]: Search query expansion
//! - [`net`]: Transport seam, pacing and bounded JSON fetches
//! - [`provider`]: Review provider trait and collection
//! - [`sources`]: Provider clients
//! - [`rank`]: Relevance, deduplication and ordering
//! - [`fallback`]: Synthetic fragments
//! - [`assemble`]: Envelope construction and failure conversion
//! - [`pipeline`]: The handler variants
//! - [`error`]: Error handling

pub mod assemble;
pub mod config;
pub mod error;
pub mod fallback;
pub mod filter;
pub mod net;
pub mod pipeline;
pub mod planner;
pub mod provider;
pub mod rank;
pub mod sources;
pub mod types;

/// Prelude module for convenient imports.
///
/// ```rust
/// use reelquotes::prelude::*;
///
/// let query: ReviewQuery = "Arrival".into();
/// assert_eq!(query.term(), "Arrival");
/// ```
pub mod prelude {
    pub use crate::{
        config::Config,
        net::{Fetcher, HttpTransport, Transport},
        pipeline::ReviewPipeline,
        provider::{ProviderOutcome, Providers, ReviewProvider},
        rank::CandidateListExt,
        types::{
            MediaType, QuoteCandidate, RankedResult, ResponseEnvelope, ResultsField, ReviewQuery,
            ReviewQueryBuilder, SourceKind,
        },
    };

    #[cfg(feature = "source-reddit")]
    pub use crate::pipeline::QuotePipeline;
}

pub use error::{Error, Result};
#[cfg(feature = "source-reddit")]
pub use pipeline::QuotePipeline;
pub use pipeline::ReviewPipeline;
pub use provider::{Providers, ReviewProvider};
pub use types::{QuoteCandidate, ResponseEnvelope, ReviewQuery};
