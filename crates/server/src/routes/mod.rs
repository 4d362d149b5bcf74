pub mod accounts;
pub mod calendar;
pub mod categories;
pub mod health;
pub mod market;
pub mod parties;
pub mod payroll;
pub mod reconciliation;
pub mod reports;
pub mod taxes;
pub mod transactions;

use axum::http::StatusCode;

use crate::error::{AppError, Result};

/// 204 when a delete hit a row, 404 otherwise.
pub(crate) fn deleted(found: bool, what: &'static str) -> Result<StatusCode> {
    if found {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(what))
    }
}
