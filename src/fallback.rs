//! Fallback synthesis of placeholder opinions.
//!
//! When too few real results survive ranking, the pipelines add a small number
//! of templated fragments so the caller never renders an empty panel. The text
//! comes from one of three tone buckets, chosen by comparing a rating (the
//! caller's hint or a default) against two cutoffs. Every generated candidate
//! has [`SourceKind::Synthetic`] so consumers can tell it apart from real
//! content.
//!
//! Template selection is deterministic; only the score is perturbed.
//!
//! # Examples
//!
//! ```rust
//! use reelquotes::config::FallbackPolicy;
//! use reelquotes::fallback::{FallbackSynthesizer, Tone};
//!
//! let policy = FallbackPolicy { score_jitter: 0.0, ..FallbackPolicy::default() };
//! let synth = FallbackSynthesizer::new(&policy);
//!
//! assert_eq!(synth.tone(Some(8.4)), Tone::Positive);
//! assert_eq!(synth.tone(None), Tone::Mixed);
//!
//! let fragments = synth.synthesize(&"Dune".into());
//! assert_eq!(fragments.len(), 2);
//! assert!(fragments.iter().all(|c| c.is_synthetic()));
//! assert!(fragments[0].text.contains("Dune"));
//! assert_eq!(fragments[0].score, 70);
//! ```

use rand::Rng;

use crate::{
    config::FallbackPolicy,
    types::{MediaType, QuoteCandidate, ReviewQuery, SourceKind},
};

/// Provider label carried by generated candidates.
pub const SYNTHETIC_PROVIDER: &str = "synthetic";

/// Placeholder author names, assigned in order.
pub const AUTHOR_POOL: [&str; 3] = ["CinephileRegular", "CuriousViewer", "QualityFan"];

/// Tone bucket of the templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Positive,
    Mixed,
    Negative,
}

/// The templates of a tone bucket, filled in for `title`.
///
/// Always returns three fragments in a fixed order.
pub fn templates(tone: Tone, title: &str, media: Option<MediaType>, genre: Option<&str>) -> Vec<String> {
    let tv = media == Some(MediaType::Tv);
    let (work, works, unit) = if tv {
        ("series", "shows", "Every episode")
    } else {
        ("movie", "movies", "The whole movie")
    };
    let genre = genre.map(str::trim).filter(|g| !g.is_empty());

    match tone {
        Tone::Positive => vec![
            format!("{} beat my expectations. {} keeps an engaging pace from start to finish.", title, unit),
            format!(
                "Finally a {} {} worth the time. {} delivers everything it promises.",
                genre.unwrap_or("quality"),
                work,
                title
            ),
            format!("{} is one of those {} you binge without noticing the hours go by. Recommended!", title, works),
        ],
        Tone::Mixed => vec![
            format!(
                "{} is decent, but some ideas deserved more room. {} better than others.",
                title,
                if tv { "Some seasons are" } else { "Some stretches are" }
            ),
            format!("Went into {} with moderate expectations and left satisfied. Not revolutionary, but it delivers.", title),
            format!("{} has brilliant moments mixed with a few stumbles. Overall, worth the experience.", title),
        ],
        Tone::Negative => vec![
            format!("What a letdown {} was. It had everything going for it, but the {} never lives up to its potential.", title, work),
            format!(
                "{} starts strong and loses steam. {} leave a lot to be desired.",
                title,
                if tv { "The later seasons" } else { "The third act and ending" }
            ),
            format!("Finished {} out of stubbornness more than enjoyment. There are far better {} to spend your time on.", title, works),
        ],
    }
}

/// Generates templated candidates according to a [`FallbackPolicy`].
#[derive(Debug, Clone, Copy)]
pub struct FallbackSynthesizer<'a> {
    policy: &'a FallbackPolicy,
}

impl<'a> FallbackSynthesizer<'a> {
    pub fn new(policy: &'a FallbackPolicy) -> Self {
        Self { policy }
    }

    /// Whether `real_results` is below the synthesis threshold.
    pub fn needed(&self, real_results: usize) -> bool {
        real_results < self.policy.min_real_results
    }

    /// The tone bucket for a rating hint on a 0-10 scale.
    pub fn tone(&self, rating: Option<f64>) -> Tone {
        let rating = self.rating(rating);
        if rating >= self.policy.positive_cutoff {
            Tone::Positive
        } else if rating <= self.policy.negative_cutoff {
            Tone::Negative
        } else {
            Tone::Mixed
        }
    }

    fn rating(&self, hint: Option<f64>) -> f64 {
        hint.filter(|r| r.is_finite())
            .unwrap_or(self.policy.default_rating)
    }

    /// Generates `policy.count` candidates for the query.
    pub fn synthesize(&self, query: &ReviewQuery) -> Vec<QuoteCandidate> {
        let title = query.display_title();
        let rating = self.rating(query.rating_hint);
        let tone = self.tone(query.rating_hint);
        let genre = query.genres.first().map(String::as_str);
        let link = format!(
            "https://letterboxd.com/search/{}/",
            urlencoding::encode(title)
        );

        let mut rng = rand::rng();
        templates(tone, title, query.media_type, genre)
            .into_iter()
            .take(self.policy.count)
            .enumerate()
            .map(|(index, text)| {
                let jitter = if self.policy.score_jitter > 0.0 {
                    rng.random_range(-self.policy.score_jitter..=self.policy.score_jitter)
                } else {
                    0.0
                };
                let score = (rating * 10.0 + jitter).round().clamp(0.0, 100.0) as i64;
                let author = AUTHOR_POOL[index % AUTHOR_POOL.len()];

                QuoteCandidate::new(SourceKind::Synthetic, SYNTHETIC_PROVIDER, text)
                    .with_author(Some(author.to_string()))
                    .with_score(score)
                    .with_link(link.clone())
                    .with_date(query.year().map(str::to_string))
            })
            .collect()
    }
}
