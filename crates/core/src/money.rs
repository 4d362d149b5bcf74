use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Neg, Sub};
use std::str::FromStr;

use crate::error::FinError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Money(Decimal);

impl Money {
    pub fn from_cents(cents: i64) -> Self {
        Money(Decimal::new(cents, 2))
    }

    pub fn to_cents(self) -> i64 {
        (self.0 * Decimal::from(100))
            .round()
            .to_i64()
            .unwrap_or(if self.0.is_sign_negative() { i64::MIN } else { i64::MAX })
    }

    pub fn from_decimal(decimal: Decimal) -> Self {
        Money(decimal.round_dp(2))
    }

    pub fn as_decimal(self) -> Decimal {
        self.0
    }

    pub fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    pub fn is_positive(self) -> bool {
        self.0 > Decimal::ZERO
    }

    pub fn abs(self) -> Self {
        Money(self.0.abs())
    }

    /// Brazilian notation: `R$ 1.234,56`, negatives as `-R$ 1.234,56`.
    pub fn format_brl(self) -> String {
        let cents = self.to_cents();
        let sign = if cents < 0 { "-" } else { "" };
        let cents = cents.unsigned_abs();
        let units = (cents / 100).to_string();
        let mut grouped = String::with_capacity(units.len() + units.len() / 3);
        for (i, ch) in units.chars().enumerate() {
            if i > 0 && (units.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(ch);
        }
        format!("{sign}R$ {grouped},{:02}", cents % 100)
    }

    /// Parses user-typed currency strings in either pt-BR (`R$ 1.234,56`) or
    /// US (`1,234.56`) notation. Accounting parentheses mean negative.
    pub fn parse(input: &str) -> Result<Money, FinError> {
        let invalid = || FinError::InvalidAmount(input.trim().to_string());

        let mut s = input.trim();
        let mut negative = false;
        if s.starts_with('(') && s.ends_with(')') && s.len() >= 2 {
            negative = true;
            s = s[1..s.len() - 1].trim();
        }
        if let Some(rest) = s.strip_prefix('-') {
            negative = !negative;
            s = rest.trim_start();
        }
        let s = s.strip_prefix("R$").unwrap_or(s);
        let s = s.trim_start();
        // "R$ -10,00" is seen in bank exports.
        let (s, negative) = match s.strip_prefix('-') {
            Some(rest) => (rest, !negative),
            None => (s, negative),
        };
        let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect();

        if compact.is_empty()
            || !compact.chars().all(|c| c.is_ascii_digit() || c == '.' || c == ',')
            || !compact.chars().any(|c| c.is_ascii_digit())
        {
            return Err(invalid());
        }

        let normalized = normalize_separators(&compact);
        let value = Decimal::from_str(&normalized).map_err(|_| invalid())?;
        let value = if negative { -value } else { value };
        Ok(Money::from_decimal(value))
    }
}

/// Rewrites a digits-and-separators string into `1234.56` form.
fn normalize_separators(s: &str) -> String {
    let last_dot = s.rfind('.');
    let last_comma = s.rfind(',');
    let dots = s.matches('.').count();
    let commas = s.matches(',').count();

    let decimal_sep = match (last_dot, last_comma) {
        (Some(d), Some(c)) => Some(if d > c { '.' } else { ',' }),
        (None, Some(_)) => (commas == 1).then_some(','),
        (Some(d), None) => {
            let digits_after = s.len() - d - 1;
            (dots == 1 && digits_after != 3).then_some('.')
        }
        (None, None) => None,
    };

    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '.' | ',' if Some(ch) == decimal_sep => out.push('.'),
            '.' | ',' => {}
            _ => out.push(ch),
        }
    }
    // A separator only counts as decimal if it is the last one of its kind.
    if let Some(sep) = decimal_sep {
        let positions: Vec<usize> = s.match_indices(sep).map(|(i, _)| i).collect();
        if positions.len() > 1 {
            return s.chars().filter(|c| c.is_ascii_digit()).collect();
        }
    }
    out
}

/// Accepts either a JSON number or a currency string such as `"R$ 1.234,56"`.
pub fn deserialize_amount<'de, D>(deserializer: D) -> Result<Money, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(serde_json::Number),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Decimal::from_str(&n.to_string())
            .or_else(|_| Decimal::from_scientific(&n.to_string()))
            .map(Money::from_decimal)
            .map_err(serde::de::Error::custom),
        Raw::Text(s) => Money::parse(&s).map_err(serde::de::Error::custom),
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_brl())
    }
}

impl FromStr for Money {
    type Err = FinError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Money::parse(s)
    }
}

impl Add for Money {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Money(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Money(self.0 - rhs.0)
    }
}

impl Neg for Money {
    type Output = Self;
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |a, b| a + b)
    }
}
