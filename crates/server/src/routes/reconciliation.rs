use axum::{
    extract::{Path, State},
    routing::{get, post},
    Extension, Json, Router,
};
use finapp_core::{Account, AccountId, FinError, TransactionId, ValidatedTransaction};
use finapp_import::{
    assign_external_ids, import_csv, plan_statement, AutoMatchEngine, CsvImportProfile, ImportPlan,
    LedgerCandidate, MatchResult, StatementLine,
};
use finapp_storage::{ScopeFilter, TransactionView};
use serde::{Deserialize, Serialize};

use crate::auth::CurrentUser;
use crate::error::{AppError, Result};
use crate::AppState;

/// A bank or card statement export posted as text.
#[derive(Debug, Deserialize)]
pub struct StatementUpload {
    pub account_id: AccountId,
    #[serde(default)]
    pub profile: CsvImportProfile,
    pub content: String,
}

#[derive(Serialize)]
struct StatementPreview {
    account: Account,
    lines: Vec<StatementLine>,
    matches: Vec<MatchResult>,
    to_reconcile: usize,
    to_insert: usize,
    skipped: usize,
    /// Lines already imported by an earlier run.
    duplicates: usize,
}

#[derive(Debug, Default, Serialize)]
struct ImportSummary {
    reconciled: usize,
    inserted: usize,
    /// Lines already imported by an earlier run.
    duplicates: usize,
    skipped: usize,
}

struct Analysis {
    account: Account,
    lines: Vec<StatementLine>,
    matches: Vec<MatchResult>,
    plan: ImportPlan,
}

/// Parses the statement and matches the lines not imported before against
/// the account's open entries.
async fn analyse(state: &AppState, scope: &ScopeFilter, upload: StatementUpload) -> Result<Analysis> {
    let account = finapp_storage::get_account(&state.pool, upload.account_id)
        .await?
        .filter(|a| scope.allows_account(a.id))
        .ok_or(AppError::NotFound("account"))?;
    let lines = import_csv(upload.content.as_bytes(), &upload.profile)?;

    let known = finapp_storage::existing_external_ids(
        &state.pool,
        &assign_external_ids(account.id, &lines),
    )
    .await?;
    let ledger: Vec<LedgerCandidate> =
        finapp_storage::open_entries_for_account(&state.pool, account.id, scope)
            .await?
            .iter()
            .map(|v| LedgerCandidate::from_transaction(&v.transaction))
            .collect();

    let (matches, plan) =
        plan_statement(&AutoMatchEngine::default(), &account, &lines, &ledger, &known);
    Ok(Analysis {
        account,
        lines,
        matches,
        plan,
    })
}

async fn pending(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Vec<TransactionView>>> {
    let scope = user.scope_filter(state.config.enforce_scope);
    Ok(Json(
        finapp_storage::pending_reconciliation(&state.pool, &scope).await?,
    ))
}

async fn reconcile(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<TransactionView>> {
    let tx_id = TransactionId(id);
    let scope = user.scope_filter(state.config.enforce_scope);
    if finapp_storage::get_transaction(&state.pool, tx_id, &scope).await?.is_none()
        || !finapp_storage::reconcile_transaction(&state.pool, tx_id, state.today()).await?
    {
        return Err(FinError::NotReconcilable(id).into());
    }
    tracing::info!(%tx_id, "transaction reconciled");
    finapp_storage::get_transaction(&state.pool, tx_id, &scope)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound("transaction"))
}

async fn preview_statement(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(upload): Json<StatementUpload>,
) -> Result<Json<StatementPreview>> {
    let scope = user.scope_filter(state.config.enforce_scope);
    let analysis = analyse(&state, &scope, upload).await?;
    Ok(Json(StatementPreview {
        to_reconcile: analysis.plan.reconcile.len(),
        to_insert: analysis.plan.insert.len(),
        skipped: analysis.plan.skipped.len(),
        duplicates: analysis.plan.duplicates.len(),
        account: analysis.account,
        lines: analysis.lines,
        matches: analysis.matches,
    }))
}

/// Applies the whole plan in one database transaction.
async fn import_statement(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(upload): Json<StatementUpload>,
) -> Result<Json<ImportSummary>> {
    let scope = user.scope_filter(state.config.enforce_scope);
    let Analysis { account, plan, .. } = analyse(&state, &scope, upload).await?;
    let today = state.today();

    let mut summary = ImportSummary {
        skipped: plan.skipped.len(),
        duplicates: plan.duplicates.len(),
        ..ImportSummary::default()
    };
    let mut db_tx = state.pool.begin().await?;
    for settlement in &plan.reconcile {
        if finapp_storage::settle_from_statement(
            &mut *db_tx,
            settlement.tx_id,
            today,
            &settlement.external_id,
        )
        .await?
        {
            summary.reconciled += 1;
        }
    }
    for new in plan.insert {
        let validated = ValidatedTransaction::validate(new, Some(account.id))?;
        match finapp_storage::insert_if_new(&mut *db_tx, &validated).await? {
            Some(_) => summary.inserted += 1,
            None => summary.duplicates += 1,
        }
    }
    db_tx.commit().await?;

    tracing::info!(
        account = %account.id,
        reconciled = summary.reconciled,
        inserted = summary.inserted,
        duplicates = summary.duplicates,
        "statement imported"
    );
    Ok(Json(summary))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/reconciliation/pending", get(pending))
        .route("/api/reconciliation/statement", post(preview_statement))
        .route("/api/reconciliation/import", post(import_statement))
        .route("/api/reconciliation/{id}", post(reconcile))
}
