//! Integration tests for reelquotes
//!
//! End-to-end pipeline runs against canned provider payloads. Time is paused
//! so pacing delays and deadlines elapse instantly.

#![cfg(all(feature = "source-reddit", feature = "source-tmdb", feature = "source-omdb"))]

use async_trait::async_trait;
use reelquotes::config::{QuoteConfig, ReviewConfig};
use reelquotes::net::Lane;
use reelquotes::prelude::*;
use reelquotes::sources::{OmdbSource, TmdbSource};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

mod common;
use common::{
    Reply, StubTransport, TEST_TITLE, TEST_YEAR, comment, empty_listing, post, post_listing, thread,
    thread_route,
};

fn dune_query() -> ReviewQuery {
    ReviewQueryBuilder::default()
        .term(TEST_TITLE)
        .year(Some(TEST_YEAR.to_string()))
        .media_type(Some(MediaType::Movie))
        .build()
        .unwrap()
}

fn quotes(stub: &Arc<StubTransport>) -> QuotePipeline {
    QuotePipeline::new(QuoteConfig::default(), stub.clone()).unwrap()
}

fn reviews(stub: &Arc<StubTransport>, providers: Providers) -> ReviewPipeline {
    ReviewPipeline::new(ReviewConfig::default(), providers, stub.clone()).unwrap()
}

fn review_providers() -> Providers {
    let config = ReviewConfig::default();
    let mut providers = Providers::new();
    providers.add(TmdbSource::new("test-key", &config));
    providers.add(OmdbSource::new("test-key", &config));
    providers
}

struct PanickingProvider;

#[async_trait]
impl ReviewProvider for PanickingProvider {
    fn id(&self) -> &'static str {
        "panic"
    }

    fn name(&self) -> &'static str {
        "Panic"
    }

    async fn reviews(&self, _fetcher: &Fetcher, _query: &ReviewQuery) -> Option<Vec<QuoteCandidate>> {
        panic!("provider blew up");
    }
}

#[cfg(test)]
mod quote_pipeline_tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_empty_listings_trigger_fallback() {
        let stub = StubTransport::new()
            .json("search.json", empty_listing())
            .into_arc();

        let envelope = quotes(&stub).respond(&dune_query()).await;

        assert!(!envelope.is_error());
        assert_eq!(envelope.results.len(), 2);
        assert!(envelope.results.iter().all(|r| r.synthetic));
        assert!(envelope.results.iter().all(|r| r.text.contains("Dune")));

        let debug = envelope.debug.unwrap();
        assert_eq!(&debug.search_queries[..2], &["Dune", "Dune 2021"]);
        assert_eq!(debug.real_results, 0);
        assert!(debug.has_fallback);
        assert_eq!(stub.calls_matching("/comments/"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_post_without_body_or_comments_is_dropped() {
        let stub = StubTransport::new()
            .json(
                "www.reddit.com/search.json?q=Dune%202021&",
                post_listing(vec![post("b1", "Thoughts?", "", 12, 0)]),
            )
            .json("search.json", empty_listing())
            .json(&thread_route("b1"), thread(vec![]))
            .into_arc();

        let envelope = quotes(&stub).respond(&dune_query()).await;

        let debug = envelope.debug.unwrap();
        assert_eq!(debug.candidates_seen, 1);
        assert_eq!(debug.candidates_kept, 0);
        assert_eq!(stub.calls_matching("/comments/b1/"), 0);
        assert!(envelope.results.iter().all(|r| r.synthetic));
    }

    #[tokio::test(start_paused = true)]
    async fn test_near_identical_comments_collapse() {
        let stub = StubTransport::new()
            .json(
                "www.reddit.com/search.json",
                post_listing(vec![
                    post("p1", "Dune (2021) discussion", "", 100, 40),
                    post("p2", "Dune rewatch thread", "", 50, 12),
                ]),
            )
            .json("search.json", empty_listing())
            .json(
                &thread_route("p1"),
                thread(vec![
                    comment("c1", "critic", "Honestly the best adaptation anyone could have hoped for, bravo", 30),
                    comment("c2", "other", "The pacing in the second half felt rushed to me", 20),
                ]),
            )
            .json(
                &thread_route("p2"),
                thread(vec![comment(
                    "c3",
                    "critic",
                    "Honestly the best adaptation anyone could have hoped for!!",
                    25,
                )]),
            )
            .into_arc();

        let envelope = quotes(&stub).respond(&dune_query()).await;

        assert_eq!(envelope.results.len(), 2);
        assert_eq!(envelope.results.iter().filter(|r| r.author == "critic").count(), 1);
        assert!(envelope.results.iter().all(|r| !r.synthetic));
        assert_eq!(envelope.results[0].score, 30);
        assert_eq!(
            envelope.results[0].link,
            "https://www.reddit.com/r/movies/comments/p1/thread"
        );
        assert_eq!(envelope.results[0].date.as_deref(), Some("2021-10-23"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_thread_failure_falls_back_to_post_body() {
        let body = "Saw it twice in IMAX and the sound design still rattled my bones.";
        let stub = StubTransport::new()
            .json(
                "www.reddit.com/search.json",
                post_listing(vec![
                    post("f1", "Dune in IMAX", body, 80, 5),
                    post("f2", "Dune score appreciation", "Hans Zimmer went all out with the throat singing.", 60, 3),
                ]),
            )
            .json("search.json", empty_listing())
            .route(&thread_route("f1"), Reply::Status(503))
            .json(
                &thread_route("f2"),
                thread(vec![json!({
                    "id": "sticky",
                    "author": "AutoModerator",
                    "body": "Please remember to keep spoilers tagged in this thread.",
                    "ups": 1,
                    "stickied": true
                })]),
            )
            .into_arc();

        let envelope = quotes(&stub).respond(&dune_query()).await;

        assert_eq!(envelope.results.len(), 2);
        assert_eq!(envelope.results[0].text, body);
        assert_eq!(envelope.results[0].author, "op_f1");
        assert!(envelope.results[1].text.starts_with("Hans Zimmer"));
        assert!(!envelope.debug.unwrap().has_fallback);
    }

    #[tokio::test(start_paused = true)]
    async fn test_output_cap_and_early_exit() {
        let posts: Vec<_> = (0..6)
            .map(|i| post(&format!("m{}", i), "Dune megathread", "", 100 - i, 50))
            .collect();
        let mut stub = StubTransport::new()
            .json("www.reddit.com/search.json", post_listing(posts))
            .json("search.json", empty_listing());
        for i in 0..6 {
            stub = stub.json(
                &thread_route(&format!("m{}", i)),
                thread(vec![
                    comment(&format!("m{}a", i), &format!("fan{}a", i), &format!("Comment number {} about the worldbuilding", i), 40),
                    comment(&format!("m{}b", i), &format!("fan{}b", i), &format!("Reply number {} about the casting choices", i), 30),
                    comment(&format!("m{}c", i), &format!("fan{}c", i), &format!("Another take {} on the visual effects", i), 20),
                ]),
            );
        }
        let stub = stub.into_arc();

        let envelope = quotes(&stub).respond(&dune_query()).await;

        assert_eq!(envelope.results.len(), 6);
        // 2 comments per post, 8 quotes reached after 4 threads
        assert_eq!(stub.calls_matching("thread.json"), 4);
        let scores: Vec<_> = envelope.results.iter().map(|r| r.score).collect();
        assert!(scores.windows(2).all(|w| w[0] >= w[1]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_window_with_hits_stops_window_search() {
        let stub = StubTransport::new()
            .json("www.reddit.com/search.json?q=Dune&sort=top&t=year", empty_listing())
            .json(
                "www.reddit.com/search.json?q=Dune&sort=top&t=all",
                post_listing(vec![post("w1", "Dune thoughts", "", 10, 2)]),
            )
            .json("search.json", empty_listing())
            .into_arc();

        let query: ReviewQuery = TEST_TITLE.into();
        let envelope = quotes(&stub).respond(&query).await;

        assert_eq!(stub.calls_matching("q=Dune&sort=top&t=month"), 0);
        assert_eq!(stub.calls_matching("restrict_sr=1"), 3);
        assert_eq!(envelope.debug.unwrap().sources_used, vec!["global-all"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_input_makes_no_calls() {
        let stub = StubTransport::new().into_arc();

        let envelope = quotes(&stub).respond(&ReviewQuery::default()).await;

        assert!(envelope.results.is_empty());
        assert_eq!(envelope.error.as_deref(), Some("No search term or identifier provided"));
        assert!(stub.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_payloads_are_zero_results() {
        let stub = StubTransport::new()
            .route("search.json", Reply::Raw("<html>rate limited</html>"))
            .into_arc();

        let envelope = quotes(&stub).respond(&dune_query()).await;

        assert!(!envelope.is_error());
        assert!(envelope.results.iter().all(|r| r.synthetic));
        assert_eq!(envelope.debug.unwrap().candidates_seen, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_calls_are_sequential_and_paced() {
        let stub = StubTransport::new()
            .json("search.json", empty_listing())
            .into_arc();

        let query: ReviewQuery = TEST_TITLE.into();
        quotes(&stub).respond(&query).await;

        let community: Vec<_> = stub
            .call_times()
            .into_iter()
            .filter(|(url, _)| url.contains("/r/"))
            .map(|(_, at)| at)
            .collect();
        assert_eq!(community.len(), 3);
        for pair in community.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_millis(200));
        }
    }
}

#[cfg(test)]
mod review_pipeline_tests {
    use super::*;

    fn tmdb_reviews() -> serde_json::Value {
        json!({
            "id": 438631,
            "page": 1,
            "results": [
                {
                    "id": "r1",
                    "author": "Chris",
                    "author_details": { "rating": 8.0 },
                    "content": "A patient, enormous film that trusts its audience. ".repeat(20),
                    "created_at": "2021-10-22T12:00:00.000Z",
                    "url": "https://www.themoviedb.org/review/r1"
                },
                {
                    "id": "r2",
                    "author": null,
                    "author_details": { "rating": null },
                    "content": "Beautiful to look at, a little cold at heart.",
                    "created_at": "2021-11-02T08:30:00.000Z"
                },
                {
                    "id": "r3",
                    "author": "Ana",
                    "author_details": { "rating": 9.0 },
                    "content": "The best blockbuster of the decade so far.",
                    "created_at": "2022-01-05"
                },
                {
                    "id": "r4",
                    "author": "Ben",
                    "author_details": { "rating": 6.0 },
                    "content": "Half a story, and it shows in the last act.",
                    "created_at": "2022-02-01T00:00:00Z"
                },
                {
                    "id": "r5",
                    "author": "Extra",
                    "author_details": { "rating": 10.0 },
                    "content": "This one is past the listing limit and never used.",
                    "created_at": "2022-03-01T00:00:00Z"
                }
            ]
        })
    }

    fn omdb_ratings() -> serde_json::Value {
        json!({
            "Title": "Dune",
            "Year": "2021",
            "Plot": "A noble family becomes embroiled in a war for control over the galaxy's most valuable asset.",
            "imdbID": "tt1160419",
            "Ratings": [
                { "Source": "Internet Movie Database", "Value": "8.0/10" },
                { "Source": "Rotten Tomatoes", "Value": "93%" },
                { "Source": "Metacritic", "Value": "74/100" }
            ],
            "Response": "True"
        })
    }

    fn dune_with_id() -> ReviewQuery {
        ReviewQuery {
            tmdb_id: Some("438631".to_string()),
            ..dune_query()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_reviews_merge_rank_and_cap() {
        let stub = StubTransport::new()
            .json("/movie/438631/reviews", tmdb_reviews())
            .json("omdbapi.com", omdb_ratings())
            .into_arc();

        let envelope = reviews(&stub, review_providers()).respond(&dune_with_id()).await;

        assert!(!envelope.is_error());
        assert_eq!(
            envelope.sources.as_deref(),
            Some(&["TMDB (4 reviews)".to_string(), "OMDb (3 ratings)".to_string()][..])
        );
        assert_eq!(envelope.results.len(), 6);

        let scores: Vec<_> = envelope.results.iter().map(|r| r.score).collect();
        assert_eq!(scores, vec![93, 90, 80, 80, 74, 70]);
        assert_eq!(envelope.results[0].author, "Rotten Tomatoes");
        assert_eq!(envelope.results[0].link, "https://www.imdb.com/title/tt1160419/");
        assert_eq!(envelope.results[0].date.as_deref(), Some("2021"));

        let chris = envelope.results.iter().find(|r| r.author == "Chris").unwrap();
        assert_eq!(chris.text.chars().count(), 400);
        assert_eq!(chris.date.as_deref(), Some("2021-10-22"));

        let anonymous = envelope.results.iter().find(|r| r.score == 70).unwrap();
        assert_eq!(anonymous.author, "TMDB user");
        assert_eq!(anonymous.link, "https://www.themoviedb.org/movie/438631/reviews");

        assert!(envelope.results.iter().all(|r| !r.synthetic));
        assert!(stub.calls()[1].contains("y=2021"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_low_quality_reviews_are_filtered() {
        let stub = StubTransport::new()
            .json(
                "/movie/438631/reviews",
                json!({
                    "id": 438631,
                    "results": [
                        {
                            "id": "q1",
                            "author": "Chris",
                            "author_details": { "rating": 8.0 },
                            "content": "A patient, enormous film that trusts its audience.",
                            "created_at": "2021-10-22T12:00:00.000Z"
                        },
                        {
                            "id": "q2",
                            "author": "gone",
                            "author_details": { "rating": 9.0 },
                            "content": "[deleted]",
                            "created_at": "2021-10-23T12:00:00.000Z"
                        },
                        {
                            "id": "q3",
                            "author": "seller",
                            "author_details": { "rating": 10.0 },
                            "content": "Cheap tickets with promo code DUNE at https://x.y",
                            "created_at": "2021-10-24T12:00:00.000Z"
                        }
                    ]
                }),
            )
            .into_arc();

        let envelope = reviews(&stub, review_providers()).respond(&dune_with_id()).await;

        assert!(!envelope.is_error());
        let real: Vec<_> = envelope.results.iter().filter(|r| !r.synthetic).collect();
        assert_eq!(real.len(), 1);
        assert_eq!(real[0].author, "Chris");
        assert!(envelope.results.iter().all(|r| !r.text.contains("[deleted]")));
        assert!(envelope.results.iter().all(|r| !r.text.contains("promo code")));

        let debug = envelope.debug.unwrap();
        assert_eq!(debug.candidates_seen, 3);
        assert_eq!(debug.candidates_kept, 1);
        assert!(debug.candidates_kept < debug.candidates_seen);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ratings_false_response_yields_nothing() {
        let stub = StubTransport::new()
            .json("omdbapi.com", json!({ "Response": "False", "Error": "Movie not found!" }))
            .into_arc();

        let source = OmdbSource::new("test-key", &ReviewConfig::default());
        let fetcher = Fetcher::new(stub.clone(), Duration::from_secs(5));
        let found = source.reviews(&fetcher, &dune_query()).await;
        assert_eq!(found, Some(Vec::new()));

        let envelope = reviews(&stub, review_providers()).respond(&dune_query()).await;
        assert!(!envelope.is_error());
        assert!(envelope.results.iter().all(|r| r.synthetic));
        assert_eq!(envelope.sources, Some(vec!["Synthetic (2)".to_string()]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_listing_needs_canonical_id() {
        let stub = StubTransport::new()
            .json("omdbapi.com", omdb_ratings())
            .into_arc();

        let envelope = reviews(&stub, review_providers()).respond(&dune_query()).await;

        assert_eq!(stub.calls_matching("themoviedb"), 0);
        assert_eq!(envelope.results.len(), 3);
        assert_eq!(envelope.sources, Some(vec!["OMDb (3 ratings)".to_string()]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_provider_times_out() {
        let stub = StubTransport::new()
            .route("omdbapi.com", Reply::Slow(Duration::from_secs(30), omdb_ratings()))
            .into_arc();

        let start = tokio::time::Instant::now();
        let envelope = reviews(&stub, review_providers()).respond(&dune_query()).await;
        let elapsed = start.elapsed();

        assert!(elapsed >= Duration::from_secs(5));
        assert!(elapsed < Duration::from_secs(30));
        assert!(!envelope.is_error());
        assert!(envelope.results.iter().all(|r| r.synthetic));
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_title_and_id() {
        let stub = StubTransport::new().into_arc();
        let query = ReviewQuery {
            year: Some("2021".to_string()),
            ..Default::default()
        };

        let envelope = reviews(&stub, review_providers()).respond(&query).await;

        assert_eq!(envelope.error.as_deref(), Some("Title or TMDB id required"));
        assert_eq!(envelope.sources, Some(Vec::new()));
        assert!(stub.calls().is_empty());

        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["reviews"], json!([]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_panic_becomes_generic_error() {
        let stub = StubTransport::new().into_arc();
        let mut providers = Providers::new();
        providers.add(PanickingProvider);

        let envelope = reviews(&stub, providers).respond(&dune_query()).await;

        assert!(envelope.results.is_empty());
        assert_eq!(envelope.error.as_deref(), Some("Review service temporarily unavailable"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fallback_uses_rating_hint() {
        let stub = StubTransport::new().into_arc();
        let query = ReviewQuery {
            term: "Cats".to_string(),
            rating_hint: Some(2.8),
            genres: vec!["Musical".to_string()],
            ..Default::default()
        };

        let envelope = reviews(&stub, review_providers()).respond(&query).await;

        assert_eq!(envelope.results.len(), 2);
        assert!(envelope.results[0].text.contains("letdown"));
        assert!(envelope.results.iter().all(|r| r.score <= 38));
    }
}

#[cfg(test)]
mod fetcher_tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_pacer_spaces_same_lane_only() {
        let stub = StubTransport::new()
            .json("example.test", json!({ "ok": true }))
            .into_arc();
        let fetcher = Fetcher::new(stub.clone(), Duration::from_secs(5));
        let slow = Lane::new("slow", Duration::from_millis(300));
        let other = Lane::new("other", Duration::from_millis(300));

        let _: Option<serde_json::Value> = fetcher.json(&slow, "https://example.test/1").await;
        let _: Option<serde_json::Value> = fetcher.json(&other, "https://example.test/2").await;
        let _: Option<serde_json::Value> = fetcher.json(&slow, "https://example.test/3").await;

        let times: Vec<_> = stub.call_times().into_iter().map(|(_, at)| at).collect();
        assert!(times[1] - times[0] < Duration::from_millis(300));
        assert!(times[2] - times[0] >= Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_counts_from_end_of_slow_call() {
        let stub = StubTransport::new()
            .route("late", Reply::Slow(Duration::from_secs(1), json!({ "ok": true })))
            .route("hung", Reply::Slow(Duration::from_secs(10), json!({ "ok": true })))
            .json("example.test", json!({ "ok": true }))
            .into_arc();
        let fetcher = Fetcher::new(stub.clone(), Duration::from_secs(2));
        let lane = Lane::new("reddit.search", Duration::from_millis(300));

        let _: Option<serde_json::Value> = fetcher.json(&lane, "https://example.test/late").await;
        let _: Option<serde_json::Value> = fetcher.json(&lane, "https://example.test/hung").await;
        let _: Option<serde_json::Value> = fetcher.json(&lane, "https://example.test/next").await;

        let times: Vec<_> = stub.call_times().into_iter().map(|(_, at)| at).collect();
        assert_eq!(times.len(), 3);
        // 1s response, then the full delay
        assert!(times[1] - times[0] >= Duration::from_millis(1300));
        // cut off at the 2s deadline, then the full delay
        assert!(times[2] - times[1] >= Duration::from_millis(2300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_errors_are_reported() {
        let stub = StubTransport::new()
            .route("gone", Reply::Status(410))
            .route("slow", Reply::Slow(Duration::from_secs(10), json!({})))
            .into_arc();
        let fetcher = Fetcher::new(stub.clone(), Duration::from_secs(1));
        let lane = Lane::new("test", Duration::ZERO);

        let gone = fetcher.try_json::<serde_json::Value>(&lane, "https://x.test/gone").await;
        assert!(matches!(gone, Err(reelquotes::Error::Http { status: 410, .. })));

        let slow = fetcher.try_json::<serde_json::Value>(&lane, "https://x.test/slow").await;
        assert!(matches!(slow, Err(reelquotes::Error::Timeout { .. })));

        let missing: Option<serde_json::Value> = fetcher.json(&lane, "https://x.test/missing").await;
        assert!(missing.is_none());
    }
}
