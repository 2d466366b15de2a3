//! Provider client implementations with conditional compilation support.
//!
//! Each provider is behind its own feature flag so minimal builds only pull
//! in what they query.
//!
//! # Feature Flags
//!
//! - `source-reddit` - Discussion search and thread detail ([`RedditSource`])
//! - `source-tmdb` - Review listing by TMDB id ([`TmdbSource`])
//! - `source-omdb` - Ratings aggregator by title and year ([`OmdbSource`])
//! - `all-sources` - Enables all providers (default)
//!
//! # Examples
//!
//! Build with only the review providers:
//! ```bash
//! cargo build --no-default-features --features "source-tmdb,source-omdb"
//! ```

#[cfg(feature = "source-reddit")]
pub mod reddit;

#[cfg(feature = "source-tmdb")]
pub mod tmdb;

#[cfg(feature = "source-omdb")]
pub mod omdb;

#[cfg(feature = "source-reddit")]
pub use reddit::RedditSource;

#[cfg(feature = "source-tmdb")]
pub use tmdb::TmdbSource;

#[cfg(feature = "source-omdb")]
pub use omdb::{OmdbSource, RatingReview};
