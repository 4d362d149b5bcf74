use axum::{
    extract::{Query, State},
    response::Response,
    routing::get,
    Extension, Json, Router,
};
use chrono::NaiveDate;
use finapp_core::{DateRange, Money};
use finapp_storage::CategorySummary;
use serde::{Deserialize, Serialize};

use crate::auth::CurrentUser;
use crate::error::{AppError, Result};
use crate::export::{category_summary_csv, csv_response, CATEGORY_SUMMARY_FILE};
use crate::AppState;

/// Both bounds or neither; no bounds covers the whole ledger.
#[derive(Debug, Default, Deserialize)]
struct KpiQuery {
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
}

#[derive(Serialize)]
struct Kpis {
    income: Money,
    expenses: Money,
    balance: Money,
    income_formatted: String,
    expenses_formatted: String,
    balance_formatted: String,
}

impl KpiQuery {
    fn range(&self) -> Result<Option<DateRange>> {
        match (self.start, self.end) {
            (None, None) => Ok(None),
            (Some(start), Some(end)) if start <= end => Ok(Some(DateRange::new(start, end))),
            (Some(_), Some(_)) => Err(AppError::InvalidInput("start is after end".into())),
            _ => Err(AppError::InvalidInput(
                "start and end must be given together".into(),
            )),
        }
    }
}

async fn kpis(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<KpiQuery>,
) -> Result<Json<Kpis>> {
    let scope = user.scope_filter(state.config.enforce_scope);
    let totals = finapp_storage::kpi_totals(&state.pool, query.range()?, &scope).await?;
    Ok(Json(Kpis {
        income: totals.income,
        expenses: totals.expenses,
        balance: totals.balance,
        income_formatted: totals.income.format_brl(),
        expenses_formatted: totals.expenses.format_brl(),
        balance_formatted: totals.balance.format_brl(),
    }))
}

async fn categories(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Vec<CategorySummary>>> {
    let scope = user.scope_filter(state.config.enforce_scope);
    Ok(Json(finapp_storage::category_summary(&state.pool, &scope).await?))
}

async fn categories_csv(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Response> {
    let scope = user.scope_filter(state.config.enforce_scope);
    let rows = finapp_storage::category_summary(&state.pool, &scope).await?;
    Ok(csv_response(CATEGORY_SUMMARY_FILE, category_summary_csv(&rows)?))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/reports/kpis", get(kpis))
        .route("/api/reports/categories", get(categories))
        .route("/api/reports/categories.csv", get(categories_csv))
}
