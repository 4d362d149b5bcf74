use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::{FeedClient, FeedError};

/// SGS series 432: SELIC target rate, % a.a.
pub const SELIC_SERIES: u32 = 432;
const MAX_POINTS: u32 = 120;

#[derive(Debug, Deserialize)]
struct RawPoint {
    data: String,
    valor: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelicPoint {
    pub date: NaiveDate,
    pub rate: Decimal,
}

/// Parses an SGS JSON array (`[{"data":"dd/mm/yyyy","valor":"10,50"}]`).
/// Values may use either decimal separator.
pub fn parse_selic_series(body: &str) -> Result<Vec<SelicPoint>, FeedError> {
    let raw: Vec<RawPoint> =
        serde_json::from_str(body).map_err(|e| FeedError::Payload(e.to_string()))?;
    raw.into_iter()
        .map(|p| {
            let date = NaiveDate::parse_from_str(p.data.trim(), "%d/%m/%Y")
                .map_err(|_| FeedError::Payload(format!("bad date {}", p.data)))?;
            let rate = Decimal::from_str(&p.valor.trim().replace(',', "."))
                .map_err(|_| FeedError::Payload(format!("bad value {}", p.valor)))?;
            Ok(SelicPoint { date, rate })
        })
        .collect()
}

impl FeedClient {
    /// The last `points` observations, oldest first. Empty on failure.
    pub async fn selic_series(&self, points: u32) -> Vec<SelicPoint> {
        if !self.is_enabled() || points == 0 {
            return Vec::new();
        }
        let url = format!(
            "{}/dados/serie/bcdata.sgs.{}/dados/ultimos/{}?formato=json",
            self.bcb_base(),
            SELIC_SERIES,
            points.min(MAX_POINTS)
        );
        let result = match self.get_text(&url).await {
            Ok(body) => parse_selic_series(&body),
            Err(e) => Err(e),
        };
        match result {
            Ok(mut series) => {
                series.sort_by_key(|p| p.date);
                series
            }
            Err(e) => {
                tracing::warn!(series = SELIC_SERIES, error = %e, "SELIC series unavailable");
                Vec::new()
            }
        }
    }
}
