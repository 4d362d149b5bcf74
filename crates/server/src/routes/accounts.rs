use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get},
    Extension, Json, Router,
};
use finapp_core::{statement_balance, Account, AccountId, Money, NewAccount};
use finapp_storage::TransactionView;
use serde::{Deserialize, Serialize};

use super::deleted;
use crate::auth::CurrentUser;
use crate::error::{AppError, Result};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
struct ListQuery {
    #[serde(default)]
    exclude_cards: bool,
}

#[derive(Serialize)]
struct Statement {
    account: Account,
    rows: Vec<TransactionView>,
    /// Income in, every other type out.
    balance: Money,
    balance_formatted: String,
}

async fn list_accounts(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Account>>> {
    let accounts = finapp_storage::list_accounts(&state.pool, query.exclude_cards).await?;
    Ok(Json(accounts))
}

async fn create_account(
    State(state): State<AppState>,
    Json(payload): Json<NewAccount>,
) -> Result<(StatusCode, Json<Account>)> {
    let account = payload.validate()?;
    let id = finapp_storage::create_account(&state.pool, &account).await?;
    let created = finapp_storage::get_account(&state.pool, id)
        .await?
        .ok_or(AppError::NotFound("account"))?;
    tracing::info!(%id, name = %created.name, "account created");
    Ok((StatusCode::CREATED, Json(created)))
}

async fn delete_account(State(state): State<AppState>, Path(id): Path<i64>) -> Result<StatusCode> {
    deleted(
        finapp_storage::delete_account(&state.pool, AccountId(id)).await?,
        "account",
    )
}

async fn account_statement(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<Statement>> {
    let scope = user.scope_filter(state.config.enforce_scope);
    let account = finapp_storage::get_account(&state.pool, AccountId(id))
        .await?
        .filter(|a| scope.allows_account(a.id))
        .ok_or(AppError::NotFound("account"))?;
    let rows = finapp_storage::account_statement(&state.pool, account.id, &scope).await?;
    let balance = statement_balance(
        rows.iter()
            .map(|r| (r.transaction.trx_type, r.transaction.amount)),
    );

    Ok(Json(Statement {
        account,
        rows,
        balance,
        balance_formatted: balance.format_brl(),
    }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/accounts", get(list_accounts).post(create_account))
        .route("/api/accounts/{id}", delete(delete_account))
        .route("/api/accounts/{id}/statement", get(account_statement))
}
