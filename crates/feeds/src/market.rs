use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;

use crate::{FeedClient, FeedError};

pub const USD_BRL_SYMBOL: &str = "USDBRL=X";

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    regular_market_price: Option<f64>,
    previous_close: Option<f64>,
    chart_previous_close: Option<f64>,
}

/// Last price and previous close from a chart response.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartQuote {
    pub price: Decimal,
    pub previous_close: Option<Decimal>,
}

fn to_decimal(value: f64) -> Option<Decimal> {
    Decimal::from_f64(value).map(|d| d.round_dp(4))
}

pub fn parse_chart_quote(body: &str) -> Result<ChartQuote, FeedError> {
    let envelope: ChartEnvelope =
        serde_json::from_str(body).map_err(|e| FeedError::Payload(e.to_string()))?;
    let meta = envelope
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .map(|r| r.meta)
        .ok_or_else(|| FeedError::Payload("empty chart result".into()))?;
    let price = meta
        .regular_market_price
        .and_then(to_decimal)
        .ok_or_else(|| FeedError::Payload("missing regularMarketPrice".into()))?;
    Ok(ChartQuote {
        price,
        previous_close: meta
            .previous_close
            .or(meta.chart_previous_close)
            .and_then(to_decimal),
    })
}

/// One row of the market panel. `price` is `None` when the feed failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexLevel {
    pub symbol: String,
    pub price: Option<Decimal>,
    pub change_pct: Option<Decimal>,
}

impl IndexLevel {
    fn unavailable(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            price: None,
            change_pct: None,
        }
    }

    fn from_quote(symbol: &str, quote: ChartQuote) -> Self {
        let change_pct = quote
            .previous_close
            .filter(|prev| !prev.is_zero())
            .map(|prev| ((quote.price - prev) / prev * Decimal::ONE_HUNDRED).round_dp(2));
        Self {
            symbol: symbol.to_string(),
            price: Some(quote.price),
            change_pct,
        }
    }
}

/// Chart endpoint for one symbol; `^BVSP` goes out as `%5EBVSP`.
fn chart_url(base: &str, symbol: &str) -> String {
    format!(
        "{base}/v8/finance/chart/{}?range=1d&interval=1d",
        urlencoding::encode(symbol)
    )
}

impl FeedClient {
    async fn quote(&self, symbol: &str) -> Result<ChartQuote, FeedError> {
        let url = chart_url(self.yahoo_base(), symbol);
        let body = self.get_text(&url).await?;
        parse_chart_quote(&body)
    }

    /// Current USD/BRL price, or `None` when the feed is off or unreachable.
    pub async fn usd_brl(&self) -> Option<Decimal> {
        if !self.is_enabled() {
            return None;
        }
        match self.quote(USD_BRL_SYMBOL).await {
            Ok(quote) => Some(quote.price),
            Err(e) => {
                tracing::warn!(symbol = USD_BRL_SYMBOL, error = %e, "quote unavailable");
                None
            }
        }
    }

    /// Levels for each symbol, fetched concurrently, in the order given.
    pub async fn index_levels(&self, symbols: &[String]) -> Vec<IndexLevel> {
        if !self.is_enabled() {
            return symbols.iter().map(|s| IndexLevel::unavailable(s)).collect();
        }

        let mut set = JoinSet::new();
        for (idx, symbol) in symbols.iter().enumerate() {
            let client = self.clone();
            let symbol = symbol.clone();
            set.spawn(async move {
                let level = match client.quote(&symbol).await {
                    Ok(quote) => IndexLevel::from_quote(&symbol, quote),
                    Err(e) => {
                        tracing::warn!(symbol = %symbol, error = %e, "quote unavailable");
                        IndexLevel::unavailable(&symbol)
                    }
                };
                (idx, level)
            });
        }

        let mut levels: Vec<Option<IndexLevel>> = vec![None; symbols.len()];
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((idx, level)) => levels[idx] = Some(level),
                Err(e) => tracing::warn!(error = %e, "quote task failed"),
            }
        }
        levels
            .into_iter()
            .zip(symbols)
            .map(|(level, symbol)| level.unwrap_or_else(|| IndexLevel::unavailable(symbol)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    const USD_BODY: &str = r#"{"chart":{"result":[{"meta":{"currency":"BRL","symbol":"USDBRL=X",
        "regularMarketPrice":5.4321,"chartPreviousClose":5.40}}],"error":null}}"#;

    #[test]
    fn parses_price_and_previous_close() {
        let quote = parse_chart_quote(USD_BODY).unwrap();
        assert_eq!(quote.price, Decimal::from_str("5.4321").unwrap());
        assert_eq!(quote.previous_close, Some(Decimal::from_str("5.4").unwrap()));
    }

    #[test]
    fn chart_url_encodes_index_symbols() {
        assert_eq!(
            chart_url("https://query1.finance.yahoo.com", "^BVSP"),
            "https://query1.finance.yahoo.com/v8/finance/chart/%5EBVSP?range=1d&interval=1d"
        );
        assert!(chart_url("http://x", USD_BRL_SYMBOL).contains("/chart/USDBRL%3DX?"));
    }

    #[test]
    fn error_payloads_are_rejected() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found"}}}"#;
        assert!(matches!(parse_chart_quote(body), Err(FeedError::Payload(_))));
        assert!(parse_chart_quote("<html>").is_err());
        let no_price = r#"{"chart":{"result":[{"meta":{"symbol":"X"}}]}}"#;
        assert!(parse_chart_quote(no_price).is_err());
    }

    #[test]
    fn change_is_relative_to_previous_close() {
        let quote = ChartQuote {
            price: Decimal::from(110),
            previous_close: Some(Decimal::from(100)),
        };
        let level = IndexLevel::from_quote("^BVSP", quote);
        assert_eq!(level.change_pct, Some(Decimal::from(10)));

        let flat = IndexLevel::from_quote(
            "^BVSP",
            ChartQuote {
                price: Decimal::from(5),
                previous_close: Some(Decimal::ZERO),
            },
        );
        assert_eq!(flat.change_pct, None);
    }
}
