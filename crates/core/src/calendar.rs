use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::account::non_blank;
use crate::error::FinError;
use crate::money::Money;
use crate::period::Month;
use crate::tax::TaxObligation;

/// Upper bound on loop iterations when expanding a rule into one month.
pub const MAX_OCCURRENCE_STEPS: u32 = 1000;

/// Largest accepted recurrence interval.
pub const MAX_INTERVAL: u32 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recurrence {
    #[default]
    None,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Recurrence {
    pub fn as_str(self) -> &'static str {
        match self {
            Recurrence::None => "none",
            Recurrence::Daily => "daily",
            Recurrence::Weekly => "weekly",
            Recurrence::Monthly => "monthly",
            Recurrence::Yearly => "yearly",
        }
    }
}

impl fmt::Display for Recurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Recurrence {
    type Err = FinError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" | "" => Ok(Recurrence::None),
            "daily" => Ok(Recurrence::Daily),
            "weekly" => Ok(Recurrence::Weekly),
            "monthly" => Ok(Recurrence::Monthly),
            "yearly" | "annual" => Ok(Recurrence::Yearly),
            other => Err(FinError::unknown("recurrence", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: i64,
    pub title: String,
    pub start_date: NaiveDate,
    pub recurrence: Recurrence,
    pub interval: u32,
    pub until: Option<NaiveDate>,
    pub amount: Option<Money>,
    pub notes: Option<String>,
}

enum Step {
    Days(i64),
    Months(u32),
}

impl CalendarEvent {
    /// Dates on which this event occurs inside `month`, ascending.
    pub fn occurrences_in(&self, month: Month) -> Vec<NaiveDate> {
        let first = month.first_day();
        let last = match self.until {
            Some(until) => until.min(month.last_day()),
            None => month.last_day(),
        };
        if self.start_date > last || first > last {
            return Vec::new();
        }

        let interval = self.interval.max(1);
        let step = match self.recurrence {
            Recurrence::None => return self.start_only(first),
            Recurrence::Daily => Step::Days(i64::from(interval)),
            Recurrence::Weekly => Step::Days(7 * i64::from(interval)),
            Recurrence::Monthly => Step::Months(interval),
            Recurrence::Yearly => match interval.checked_mul(12) {
                Some(months) => Step::Months(months),
                // The second occurrence would be past any representable date.
                None => return self.start_only(first),
            },
        };

        // Jump close to the month instead of walking from the start date.
        let mut n: u32 = match step {
            Step::Days(days) => {
                let behind = (first - self.start_date).num_days();
                if behind > 0 {
                    u32::try_from((behind + days - 1) / days).unwrap_or(u32::MAX)
                } else {
                    0
                }
            }
            Step::Months(months) => {
                let behind = months_between(self.start_date, first);
                if behind > 0 {
                    // One step early: clamping can pull a date back into range.
                    (u32::try_from(behind).unwrap_or(u32::MAX) / months).saturating_sub(1)
                } else {
                    0
                }
            }
        };

        let mut dates = Vec::new();
        for _ in 0..MAX_OCCURRENCE_STEPS {
            let Some(date) = self.nth_occurrence(&step, n) else {
                break;
            };
            if date > last {
                break;
            }
            if date >= first {
                dates.push(date);
            }
            n = match n.checked_add(1) {
                Some(next) => next,
                None => break,
            };
        }
        dates
    }

    /// The start date when it falls on or after `first`; the caller has
    /// already checked it is not past the month.
    fn start_only(&self, first: NaiveDate) -> Vec<NaiveDate> {
        if self.start_date >= first {
            vec![self.start_date]
        } else {
            Vec::new()
        }
    }

    /// The n-th occurrence counted from the anchor date. Month steps are
    /// always taken from the anchor so a 31st keeps returning to the 31st.
    fn nth_occurrence(&self, step: &Step, n: u32) -> Option<NaiveDate> {
        match *step {
            Step::Days(days) => self
                .start_date
                .checked_add_signed(chrono::Duration::days(days.checked_mul(i64::from(n))?)),
            Step::Months(months) => self
                .start_date
                .checked_add_months(Months::new(months.checked_mul(n)?)),
        }
    }
}

fn months_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (i64::from(to.year()) * 12 + i64::from(to.month0()))
        - (i64::from(from.year()) * 12 + i64::from(from.month0()))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCalendarEvent {
    pub title: String,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub recurrence: Recurrence,
    #[serde(default = "default_interval")]
    pub interval: u32,
    #[serde(default)]
    pub until: Option<NaiveDate>,
    #[serde(default)]
    pub amount: Option<Money>,
    #[serde(default)]
    pub notes: Option<String>,
}

fn default_interval() -> u32 {
    1
}

impl NewCalendarEvent {
    pub fn validate(mut self) -> Result<Self, FinError> {
        self.title = self.title.trim().to_string();
        if self.title.is_empty() {
            return Err(FinError::MissingField("title"));
        }
        if self.interval == 0 || self.interval > MAX_INTERVAL {
            return Err(FinError::InvalidInput(format!(
                "interval must be between 1 and {MAX_INTERVAL}"
            )));
        }
        if let Some(until) = self.until {
            if until < self.start_date {
                return Err(FinError::InvalidInput("until is before start_date".into()));
            }
        }
        self.notes = non_blank(self.notes);
        Ok(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Event,
    TaxDue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarEntry {
    pub date: NaiveDate,
    pub title: String,
    pub kind: EntryKind,
    pub source_id: i64,
    pub amount: Option<Money>,
}

/// Event occurrences and tax due dates for one month, sorted by date.
pub fn month_view(month: Month, events: &[CalendarEvent], taxes: &[TaxObligation]) -> Vec<CalendarEntry> {
    let mut entries: Vec<CalendarEntry> = events
        .iter()
        .flat_map(|ev| {
            ev.occurrences_in(month).into_iter().map(move |date| CalendarEntry {
                date,
                title: ev.title.clone(),
                kind: EntryKind::Event,
                source_id: ev.id,
                amount: ev.amount,
            })
        })
        .collect();

    entries.extend(taxes.iter().filter_map(|tax| {
        tax.due_in_month(month).map(|date| CalendarEntry {
            date,
            title: tax.name.clone(),
            kind: EntryKind::TaxDue,
            source_id: tax.id,
            amount: None,
        })
    }));

    entries.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.title.cmp(&b.title)));
    entries
}
