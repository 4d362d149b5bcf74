use serde::{Deserialize, Serialize};

use crate::error::FinError;
use crate::money::{deserialize_amount, Money};
use crate::period::Month;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayrollEntry {
    pub id: i64,
    pub period: Month,
    pub employee: String,
    pub gross: Money,
    pub charges: Money,
    pub benefits: Money,
    pub total: Money,
    pub paid: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPayrollEntry {
    /// `YYYY-MM`
    pub period: String,
    pub employee: String,
    #[serde(deserialize_with = "deserialize_amount")]
    pub gross: Money,
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub charges: Money,
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub benefits: Money,
    #[serde(default)]
    pub paid: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedPayroll {
    pub period: Month,
    pub employee: String,
    pub gross: Money,
    pub charges: Money,
    pub benefits: Money,
    pub total: Money,
    pub paid: bool,
}

impl NewPayrollEntry {
    pub fn validate(self) -> Result<ValidatedPayroll, FinError> {
        let period: Month = self.period.parse()?;
        let employee = self.employee.trim().to_string();
        if employee.is_empty() {
            return Err(FinError::MissingField("employee"));
        }
        for (field, value) in [
            ("gross", self.gross),
            ("charges", self.charges),
            ("benefits", self.benefits),
        ] {
            if value < Money::zero() {
                return Err(FinError::InvalidInput(format!("{field} cannot be negative")));
            }
        }
        if !self.gross.is_positive() {
            return Err(FinError::NonPositiveAmount);
        }

        Ok(ValidatedPayroll {
            period,
            employee,
            gross: self.gross,
            charges: self.charges,
            benefits: self.benefits,
            total: self.gross + self.charges + self.benefits,
            paid: self.paid,
        })
    }
}
