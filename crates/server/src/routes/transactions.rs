use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Extension, Json, Router,
};
use chrono::NaiveDate;
use finapp_core::{
    DateRange, NewTransaction, TransactionFilter, TransactionId, TransactionStatus,
    TransactionType, ValidatedTransaction,
};
use finapp_storage::{is_previewable_image, ScopeFilter, TransactionView};
use serde::Deserialize;

use super::deleted;
use crate::auth::CurrentUser;
use crate::error::{AppError, Result};
use crate::export::{csv_response, transactions_csv, TRANSACTIONS_FILE};
use crate::AppState;

/// Listing filter. Missing dates default to the current year so far; a
/// missing type or status means all of them.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    #[serde(rename = "type")]
    pub trx_type: Option<TransactionType>,
    pub status: Option<TransactionStatus>,
}

impl ListQuery {
    pub fn into_filter(self, today: NaiveDate) -> Result<TransactionFilter> {
        let default = DateRange::year_to_date(today);
        let range = DateRange::new(
            self.start.unwrap_or(default.start),
            self.end.unwrap_or(default.end),
        );
        if range.start > range.end {
            return Err(AppError::InvalidInput(format!(
                "start {} is after end {}",
                range.start, range.end
            )));
        }
        Ok(TransactionFilter {
            range,
            trx_type: self.trx_type,
            status: self.status,
        })
    }
}

#[derive(Debug, Deserialize)]
struct StatusUpdate {
    status: TransactionStatus,
}

/// Rows outside the caller's scope are reported as missing.
async fn load(state: &AppState, scope: &ScopeFilter, id: i64) -> Result<TransactionView> {
    finapp_storage::get_transaction(&state.pool, TransactionId(id), scope)
        .await?
        .ok_or(AppError::NotFound("transaction"))
}

async fn list_transactions(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<TransactionView>>> {
    let filter = query.into_filter(state.today())?;
    let scope = user.scope_filter(state.config.enforce_scope);
    Ok(Json(
        finapp_storage::list_transactions(&state.pool, &filter, &scope).await?,
    ))
}

async fn export_transactions(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<ListQuery>,
) -> Result<Response> {
    let filter = query.into_filter(state.today())?;
    let scope = user.scope_filter(state.config.enforce_scope);
    let rows = finapp_storage::list_transactions(&state.pool, &filter, &scope).await?;
    Ok(csv_response(TRANSACTIONS_FILE, transactions_csv(&rows)?))
}

async fn recent_transactions(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Vec<TransactionView>>> {
    let scope = user.scope_filter(state.config.enforce_scope);
    Ok(Json(
        finapp_storage::recent_transactions(&state.pool, &scope).await?,
    ))
}

/// Account-bound users always book to their own account.
async fn create_transaction(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<NewTransaction>,
) -> Result<(StatusCode, Json<TransactionView>)> {
    let scope = user.scope_filter(state.config.enforce_scope);
    let bound_account = if state.config.enforce_scope {
        user.0.account_id
    } else {
        None
    };
    let tx = ValidatedTransaction::validate(payload, bound_account)?;
    if !scope.allows(tx.account_id, Some(&tx.sector)) {
        return Err(AppError::InvalidInput(format!(
            "sector '{}' is outside your scope",
            tx.sector
        )));
    }
    let id = finapp_storage::insert_transaction(&state.pool, &tx).await?;
    tracing::info!(%id, kind = %tx.trx_type, amount = %tx.amount, "transaction saved");
    Ok((StatusCode::CREATED, Json(load(&state, &scope, id.0).await?)))
}

async fn get_transaction(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<TransactionView>> {
    let scope = user.scope_filter(state.config.enforce_scope);
    Ok(Json(load(&state, &scope, id).await?))
}

async fn delete_transaction(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    let scope = user.scope_filter(state.config.enforce_scope);
    load(&state, &scope, id).await?;
    deleted(
        finapp_storage::delete_transaction(&state.pool, TransactionId(id)).await?,
        "transaction",
    )
}

async fn update_status(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(payload): Json<StatusUpdate>,
) -> Result<Json<TransactionView>> {
    let scope = user.scope_filter(state.config.enforce_scope);
    load(&state, &scope, id).await?;
    if !finapp_storage::set_status(&state.pool, TransactionId(id), payload.status).await? {
        return Err(AppError::NotFound("transaction"));
    }
    Ok(Json(load(&state, &scope, id).await?))
}

/// Multipart upload; the first part carrying a file name is the receipt.
async fn upload_attachment(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    mut multipart: Multipart,
) -> Result<Json<TransactionView>> {
    let scope = user.scope_filter(state.config.enforce_scope);
    load(&state, &scope, id).await?;

    let bad_upload = |e: axum::extract::multipart::MultipartError| {
        AppError::InvalidInput(format!("upload: {e}"))
    };
    let mut upload = None;
    while let Some(field) = multipart.next_field().await.map_err(bad_upload)? {
        let Some(name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let data = field.bytes().await.map_err(bad_upload)?;
        upload = Some((name, data));
        break;
    }
    let (name, data) = upload.ok_or_else(|| AppError::InvalidInput("no file in upload".into()))?;

    let now = chrono::Local::now().naive_local();
    let stored = state.attachments.save(&name, &data, now).await?;
    finapp_storage::set_attachment(&state.pool, TransactionId(id), &stored).await?;
    Ok(Json(load(&state, &scope, id).await?))
}

/// Images are served inline for preview, everything else as a download.
async fn download_attachment(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Response> {
    let scope = user.scope_filter(state.config.enforce_scope);
    let view = load(&state, &scope, id).await?;
    let stored = view
        .transaction
        .attachment_path
        .ok_or(AppError::NotFound("attachment"))?;
    let file = state.attachments.read(&stored).await?;

    let disposition = if is_previewable_image(&file.file_name) {
        "inline"
    } else {
        "attachment"
    };
    Ok((
        [
            (header::CONTENT_TYPE, file.content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("{disposition}; filename=\"{}\"", file.file_name),
            ),
        ],
        file.data,
    )
        .into_response())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/transactions",
            get(list_transactions).post(create_transaction),
        )
        .route("/api/transactions/recent", get(recent_transactions))
        .route("/api/transactions/export.csv", get(export_transactions))
        .route(
            "/api/transactions/{id}",
            get(get_transaction).delete(delete_transaction),
        )
        .route("/api/transactions/{id}/status", put(update_status))
        .route(
            "/api/transactions/{id}/attachment",
            post(upload_attachment).get(download_attachment),
        )
}
