use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use finapp_core::{NewTaxObligation, TaxObligation};

use super::deleted;
use crate::error::Result;
use crate::AppState;

async fn list_taxes(State(state): State<AppState>) -> Result<Json<Vec<TaxObligation>>> {
    Ok(Json(finapp_storage::list_taxes(&state.pool).await?))
}

async fn create_tax(
    State(state): State<AppState>,
    Json(payload): Json<NewTaxObligation>,
) -> Result<(StatusCode, Json<TaxObligation>)> {
    let tax = payload.validate()?;
    let id = finapp_storage::create_tax(&state.pool, &tax).await?;
    Ok((
        StatusCode::CREATED,
        Json(TaxObligation {
            id,
            name: tax.name,
            jurisdiction: tax.jurisdiction,
            code: tax.code,
            periodicity: tax.periodicity,
            due_day: tax.due_day,
        }),
    ))
}

async fn delete_tax(State(state): State<AppState>, Path(id): Path<i64>) -> Result<StatusCode> {
    deleted(finapp_storage::delete_tax(&state.pool, id).await?, "tax")
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/taxes", get(list_taxes).post(create_tax))
        .route("/api/taxes/{id}", delete(delete_tax))
}
