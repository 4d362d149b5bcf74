use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, put},
    Json, Router,
};
use finapp_core::{NewPayrollEntry, PayrollEntry};

use super::deleted;
use crate::error::{AppError, Result};
use crate::AppState;

async fn list_payroll(State(state): State<AppState>) -> Result<Json<Vec<PayrollEntry>>> {
    Ok(Json(finapp_storage::list_payroll(&state.pool).await?))
}

async fn create_payroll(
    State(state): State<AppState>,
    Json(payload): Json<NewPayrollEntry>,
) -> Result<(StatusCode, Json<PayrollEntry>)> {
    let entry = payload.validate()?;
    let id = finapp_storage::create_payroll(&state.pool, &entry).await?;
    tracing::info!(id, period = %entry.period, "payroll entry created");
    Ok((
        StatusCode::CREATED,
        Json(PayrollEntry {
            id,
            period: entry.period,
            employee: entry.employee,
            gross: entry.gross,
            charges: entry.charges,
            benefits: entry.benefits,
            total: entry.total,
            paid: entry.paid,
        }),
    ))
}

async fn mark_paid(State(state): State<AppState>, Path(id): Path<i64>) -> Result<StatusCode> {
    if finapp_storage::mark_payroll_paid(&state.pool, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound("payroll entry"))
    }
}

async fn delete_payroll(State(state): State<AppState>, Path(id): Path<i64>) -> Result<StatusCode> {
    deleted(
        finapp_storage::delete_payroll(&state.pool, id).await?,
        "payroll entry",
    )
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/payroll", get(list_payroll).post(create_payroll))
        .route("/api/payroll/{id}", delete(delete_payroll))
        .route("/api/payroll/{id}/paid", put(mark_paid))
}
