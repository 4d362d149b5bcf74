use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::account::non_blank;
use crate::error::FinError;
use crate::period::Month;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Periodicity {
    Monthly,
    Quarterly,
    Annual,
}

impl Periodicity {
    pub fn as_str(self) -> &'static str {
        match self {
            Periodicity::Monthly => "monthly",
            Periodicity::Quarterly => "quarterly",
            Periodicity::Annual => "annual",
        }
    }

    /// Whether an obligation with this periodicity falls due in `month`.
    /// Quarterly obligations are due in the first month of each quarter,
    /// annual ones in January.
    pub fn is_due_in(self, month: Month) -> bool {
        match self {
            Periodicity::Monthly => true,
            Periodicity::Quarterly => matches!(month.month(), 1 | 4 | 7 | 10),
            Periodicity::Annual => month.month() == 1,
        }
    }
}

impl fmt::Display for Periodicity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Periodicity {
    type Err = FinError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "monthly" | "mensal" => Ok(Periodicity::Monthly),
            "quarterly" | "trimestral" => Ok(Periodicity::Quarterly),
            "annual" | "yearly" | "anual" => Ok(Periodicity::Annual),
            other => Err(FinError::unknown("periodicity", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxObligation {
    pub id: i64,
    pub name: String,
    pub jurisdiction: Option<String>,
    pub code: Option<String>,
    pub periodicity: Option<Periodicity>,
    pub due_day: Option<u32>,
}

impl TaxObligation {
    /// The due date inside `month`, clamped to the month's length, if the
    /// obligation falls due that month. Obligations without a due day or
    /// periodicity never appear on the calendar.
    pub fn due_in_month(&self, month: Month) -> Option<NaiveDate> {
        let day = self.due_day?;
        let periodicity = self.periodicity?;
        periodicity
            .is_due_in(month)
            .then(|| month.clamped_day(day))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTaxObligation {
    pub name: String,
    #[serde(default)]
    pub jurisdiction: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub periodicity: Option<Periodicity>,
    #[serde(default)]
    pub due_day: Option<u32>,
}

impl NewTaxObligation {
    pub fn validate(mut self) -> Result<Self, FinError> {
        self.name = self.name.trim().to_string();
        if self.name.is_empty() {
            return Err(FinError::MissingField("name"));
        }
        if let Some(day) = self.due_day {
            if !(1..=31).contains(&day) {
                return Err(FinError::InvalidInput(format!(
                    "due_day must be between 1 and 31, got {day}"
                )));
            }
        }
        self.jurisdiction = non_blank(self.jurisdiction);
        self.code = non_blank(self.code);
        Ok(self)
    }
}
