//! Query planning: which search strings to send, in which order.
//!
//! The planner turns a [`ReviewQuery`] into a [`SearchQuery`], an ordered list of
//! percent-encoded query strings. The bare term goes first because it has the
//! best chance of a hit, followed by a term+year variant, type-qualified
//! variants, and finally the external identifier on its own.
//!
//! # Examples
//!
//! ```rust
//! use reelquotes::planner::QueryPlanner;
//! use reelquotes::types::{MediaType, ReviewQueryBuilder};
//!
//! let query = ReviewQueryBuilder::default()
//!     .term("Dune")
//!     .year(Some("2021".to_string()))
//!     .media_type(Some(MediaType::Movie))
//!     .build()
//!     .unwrap();
//!
//! let plan = QueryPlanner::new(6).plan(&query);
//! assert_eq!(plan.decoded(), vec!["Dune", "Dune 2021", "Dune movie"]);
//! assert_eq!(plan.encoded()[1], "Dune%202021");
//! ```

use crate::types::{MediaType, ReviewQuery};

/// Ordered, immutable list of percent-encoded query strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    queries: Vec<String>,
}

impl SearchQuery {
    /// Encoded query strings, in planned order.
    pub fn encoded(&self) -> &[String] {
        &self.queries
    }

    /// Query strings decoded back to plain text, for diagnostics.
    pub fn decoded(&self) -> Vec<String> {
        self.queries
            .iter()
            .map(|q| {
                urlencoding::decode(q)
                    .map(|s| s.into_owned())
                    .unwrap_or_else(|_| q.clone())
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.queries.iter().map(String::as_str)
    }
}

/// Builds [`SearchQuery`] plans, bounded by a fixed maximum length.
#[derive(Debug, Clone, Copy)]
pub struct QueryPlanner {
    max_queries: usize,
}

impl QueryPlanner {
    pub fn new(max_queries: usize) -> Self {
        Self { max_queries }
    }

    /// Plans the queries for a lookup.
    ///
    /// Returns an empty plan when the query has neither a term nor an
    /// external identifier.
    pub fn plan(&self, query: &ReviewQuery) -> SearchQuery {
        let mut plain: Vec<String> = Vec::new();
        let term = query.term();

        if !term.is_empty() {
            plain.push(term.to_string());

            if let Some(year) = query.year() {
                plain.push(format!("{} {}", term, year));
            }

            match query.media_type {
                Some(MediaType::Movie) => plain.push(format!("{} movie", term)),
                Some(MediaType::Tv) => {
                    plain.push(format!("{} series", term));
                    plain.push(format!("{} show", term));
                }
                None => {}
            }
        }

        if let Some(imdb) = query.imdb_id() {
            plain.push(imdb.to_string());
        }

        // The identifier must survive the cap, so trim type variants first.
        if plain.len() > self.max_queries {
            let id = query.imdb_id().map(str::to_string);
            let keep = self.max_queries.saturating_sub(usize::from(id.is_some()));
            plain.truncate(keep);
            plain.extend(id.filter(|_| self.max_queries > 0));
        }

        SearchQuery {
            queries: plain
                .iter()
                .map(|q| urlencoding::encode(q).into_owned())
                .collect(),
        }
    }
}

impl Default for QueryPlanner {
    fn default() -> Self {
        Self::new(6)
    }
}
