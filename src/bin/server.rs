//! reelquotes server - HTTP surface for the quote and review pipelines
//!
//! Exposes `GET /api/reddit` and `GET /api/reviews`. Both always answer 200
//! with a JSON envelope; failures are reported through its `error` field.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{Method, StatusCode, header},
    response::IntoResponse,
    routing::get,
};
use color_eyre::{eyre::Result, install};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reelquotes::prelude::*;

const QUOTES_CACHE: &str = "s-maxage=300, stale-while-revalidate=300";
const REVIEWS_CACHE: &str = "s-maxage=600, stale-while-revalidate=600";

struct AppState {
    quotes: QuotePipeline,
    reviews: ReviewPipeline,
}

/// Query string of `/api/reddit`.
#[derive(Debug, Default, Deserialize)]
struct QuoteParams {
    q: Option<String>,
    year: Option<String>,
    #[serde(rename = "type")]
    media_type: Option<String>,
    imdb: Option<String>,
}

impl QuoteParams {
    fn into_query(self) -> ReviewQuery {
        ReviewQuery {
            term: self.q.unwrap_or_default(),
            year: self.year,
            media_type: self.media_type.as_deref().and_then(MediaType::parse),
            imdb_id: self.imdb,
            ..Default::default()
        }
    }
}

/// Query string of `/api/reviews`.
#[derive(Debug, Default, Deserialize)]
struct ReviewParams {
    title: Option<String>,
    year: Option<String>,
    #[serde(rename = "type")]
    media_type: Option<String>,
    tmdb_id: Option<String>,
    imdb_id: Option<String>,
    rating: Option<String>,
    genres: Option<String>,
}

impl ReviewParams {
    fn into_query(self) -> ReviewQuery {
        ReviewQuery {
            term: self.title.unwrap_or_default(),
            year: self.year,
            media_type: self.media_type.as_deref().and_then(MediaType::parse),
            imdb_id: self.imdb_id,
            tmdb_id: self.tmdb_id,
            rating_hint: self.rating.and_then(|r| r.trim().parse().ok()),
            genres: self
                .genres
                .map(|g| {
                    g.split(',')
                        .map(str::trim)
                        .filter(|g| !g.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    install()?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    let transport = Arc::new(HttpTransport::new(&config.credentials.user_agent));
    let state = Arc::new(AppState {
        quotes: QuotePipeline::new(config.quotes.clone(), transport.clone())?,
        reviews: ReviewPipeline::from_config(&config, transport)?,
    });
    info!(providers = ?state.reviews.providers().list_ids(), "review providers ready");

    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(&config.credentials.bind).await?;
    info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn create_app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/api/reddit", get(quotes_handler).options(preflight))
        .route("/api/reviews", get(reviews_handler).options(preflight))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn quotes_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<QuoteParams>,
) -> impl IntoResponse {
    let envelope = state.quotes.respond(&params.into_query()).await;
    ([(header::CACHE_CONTROL, QUOTES_CACHE)], Json(envelope))
}

async fn reviews_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ReviewParams>,
) -> impl IntoResponse {
    let envelope = state.reviews.respond(&params.into_query()).await;
    ([(header::CACHE_CONTROL, REVIEWS_CACHE)], Json(envelope))
}

async fn preflight() -> StatusCode {
    StatusCode::OK
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutting down");
    }
}
