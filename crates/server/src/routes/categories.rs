use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use finapp_core::{Category, CategoryId, CategoryKind, NewCategory, TransactionType};
use serde::Deserialize;

use super::deleted;
use crate::error::Result;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
struct ListQuery {
    /// Only categories usable for this transaction type.
    for_type: Option<TransactionType>,
}

async fn list_categories(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Category>>> {
    let kinds = query.for_type.map(CategoryKind::for_transaction);
    Ok(Json(finapp_storage::list_categories(&state.pool, kinds).await?))
}

async fn create_category(
    State(state): State<AppState>,
    Json(payload): Json<NewCategory>,
) -> Result<(StatusCode, Json<Category>)> {
    let category = payload.validate()?;
    let id = finapp_storage::create_category(&state.pool, &category).await?;
    Ok((
        StatusCode::CREATED,
        Json(Category {
            id,
            name: category.name,
            parent_id: category.parent_id,
            kind: category.kind,
        }),
    ))
}

async fn delete_category(State(state): State<AppState>, Path(id): Path<i64>) -> Result<StatusCode> {
    deleted(
        finapp_storage::delete_category(&state.pool, CategoryId(id)).await?,
        "category",
    )
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/categories", get(list_categories).post(create_category))
        .route("/api/categories/{id}", delete(delete_category))
}
