use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use finapp_feeds::{IndexLevel, SelicPoint, Ticker};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::AppState;

const DEFAULT_SELIC_POINTS: u32 = 30;

#[derive(Serialize)]
struct TickerResponse {
    line: String,
    usd_brl: Option<Decimal>,
    indices: Vec<IndexLevel>,
}

#[derive(Debug, Default, Deserialize)]
struct SelicQuery {
    last: Option<u32>,
}

#[derive(Serialize)]
struct SelicResponse {
    /// False when the feed is off or the call failed.
    available: bool,
    series: Vec<SelicPoint>,
}

/// Never fails: unavailable feeds show up as `n/d` and null prices.
async fn ticker(State(state): State<AppState>) -> Json<TickerResponse> {
    let (usd_brl, indices) = tokio::join!(
        state.feeds.usd_brl(),
        state.feeds.index_levels(&state.config.index_symbols)
    );
    let ticker = Ticker::new(state.today(), usd_brl);
    Json(TickerResponse {
        line: ticker.line(),
        usd_brl,
        indices,
    })
}

async fn selic(State(state): State<AppState>, Query(query): Query<SelicQuery>) -> Json<SelicResponse> {
    let series = state
        .feeds
        .selic_series(query.last.unwrap_or(DEFAULT_SELIC_POINTS))
        .await;
    Json(SelicResponse {
        available: !series.is_empty(),
        series,
    })
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/market/ticker", get(ticker))
        .route("/api/market/selic", get(selic))
}
