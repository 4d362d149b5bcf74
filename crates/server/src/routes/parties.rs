use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use finapp_core::{FinError, NewParty, Party, PartyKind, Sector};
use serde::Deserialize;

use super::deleted;
use crate::error::{AppError, Result};
use crate::AppState;

#[derive(Debug, Deserialize)]
struct NewSector {
    name: String,
}

async fn list(state: &AppState, kind: PartyKind) -> Result<Json<Vec<Party>>> {
    Ok(Json(finapp_storage::list_parties(&state.pool, kind).await?))
}

async fn create(
    state: &AppState,
    kind: PartyKind,
    payload: NewParty,
) -> Result<(StatusCode, Json<Party>)> {
    let party = payload.validate()?;
    let id = finapp_storage::create_party(&state.pool, kind, &party).await?;
    Ok((
        StatusCode::CREATED,
        Json(Party {
            id,
            name: party.name,
            document: party.document,
            email: party.email,
            phone: party.phone,
        }),
    ))
}

async fn list_clients(State(state): State<AppState>) -> Result<Json<Vec<Party>>> {
    list(&state, PartyKind::Client).await
}

async fn create_client(
    State(state): State<AppState>,
    Json(payload): Json<NewParty>,
) -> Result<(StatusCode, Json<Party>)> {
    create(&state, PartyKind::Client, payload).await
}

async fn delete_client(State(state): State<AppState>, Path(id): Path<i64>) -> Result<StatusCode> {
    deleted(
        finapp_storage::delete_party(&state.pool, PartyKind::Client, id).await?,
        "client",
    )
}

async fn list_suppliers(State(state): State<AppState>) -> Result<Json<Vec<Party>>> {
    list(&state, PartyKind::Supplier).await
}

async fn create_supplier(
    State(state): State<AppState>,
    Json(payload): Json<NewParty>,
) -> Result<(StatusCode, Json<Party>)> {
    create(&state, PartyKind::Supplier, payload).await
}

async fn delete_supplier(State(state): State<AppState>, Path(id): Path<i64>) -> Result<StatusCode> {
    deleted(
        finapp_storage::delete_party(&state.pool, PartyKind::Supplier, id).await?,
        "supplier",
    )
}

async fn list_sectors(State(state): State<AppState>) -> Result<Json<Vec<Sector>>> {
    Ok(Json(finapp_storage::list_sectors(&state.pool).await?))
}

/// Sector names are unique.
async fn create_sector(
    State(state): State<AppState>,
    Json(payload): Json<NewSector>,
) -> Result<(StatusCode, Json<Sector>)> {
    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(FinError::MissingField("name").into());
    }
    let id = finapp_storage::create_sector(&state.pool, &name)
        .await?
        .ok_or(AppError::Duplicate)?;
    Ok((StatusCode::CREATED, Json(Sector { id, name })))
}

async fn delete_sector(State(state): State<AppState>, Path(id): Path<i64>) -> Result<StatusCode> {
    deleted(finapp_storage::delete_sector(&state.pool, id).await?, "sector")
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/clients", get(list_clients).post(create_client))
        .route("/api/clients/{id}", delete(delete_client))
        .route("/api/suppliers", get(list_suppliers).post(create_supplier))
        .route("/api/suppliers/{id}", delete(delete_supplier))
        .route("/api/sectors", get(list_sectors).post(create_sector))
        .route("/api/sectors/{id}", delete(delete_sector))
}
