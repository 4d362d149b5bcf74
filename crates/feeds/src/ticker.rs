use chrono::NaiveDate;
use finapp_core::Money;
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;

use crate::FeedClient;

const FOOTER: &str = "Finapp® | todos os direitos reservados.";

/// The header strip: today's date, the dollar quote and the footer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ticker {
    pub date: NaiveDate,
    pub usd_brl: Option<Decimal>,
}

impl Ticker {
    pub fn new(date: NaiveDate, usd_brl: Option<Decimal>) -> Self {
        Self { date, usd_brl }
    }

    pub fn line(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let usd = match self.usd_brl {
            Some(price) => Money::from_decimal(price).format_brl(),
            None => "n/d".to_string(),
        };
        write!(
            f,
            "{}  •  Dólar: {}  •  {}",
            self.date.format("%d/%m/%y"),
            usd,
            FOOTER
        )
    }
}

impl FeedClient {
    pub async fn ticker(&self, today: NaiveDate) -> Ticker {
        Ticker::new(today, self.usd_brl().await)
    }
}
