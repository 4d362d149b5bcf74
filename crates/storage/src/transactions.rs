use std::collections::HashSet;

use chrono::NaiveDate;
use finapp_core::{
    AccountId, CategoryId, Money, PaymentMethod, Transaction, TransactionFilter, TransactionId,
    TransactionStatus, ValidatedTransaction,
};
use serde::Serialize;
use sqlx::{Executor, QueryBuilder, Sqlite};

use crate::db::{decode_text, DbPool};
use crate::scope::ScopeFilter;

/// Rows returned by the pending reconciliation list.
pub const PENDING_LIMIT: i64 = 200;
pub const RECENT_LIMIT: i64 = 10;

const SELECT_VIEW: &str = r#"
    SELECT t.id, t.trx_date, t.due_date, t.paid_date, t.type AS trx_type, t.sector,
           t.cost_center_id, t.category_id, t.account_id, t.card_id, t.method,
           t.doc_number, t.counterparty, t.description, t.amount_cents, t.status,
           t.tags, t.origin, t.external_id, t.attachment_path,
           c.name AS category_name, a.name AS account_name
    FROM transactions t
    LEFT JOIN categories c ON c.id = t.category_id
    LEFT JOIN accounts a ON a.id = t.account_id
"#;

#[derive(sqlx::FromRow)]
struct TransactionRow {
    id: i64,
    trx_date: NaiveDate,
    due_date: Option<NaiveDate>,
    paid_date: Option<NaiveDate>,
    trx_type: String,
    sector: Option<String>,
    cost_center_id: Option<i64>,
    category_id: Option<i64>,
    account_id: Option<i64>,
    card_id: Option<i64>,
    method: Option<String>,
    doc_number: Option<String>,
    counterparty: Option<String>,
    description: Option<String>,
    amount_cents: i64,
    status: String,
    tags: Option<String>,
    origin: String,
    external_id: Option<String>,
    attachment_path: Option<String>,
    category_name: Option<String>,
    account_name: Option<String>,
}

/// A stored transaction with the names of its category and account.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionView {
    #[serde(flatten)]
    pub transaction: Transaction,
    pub category_name: Option<String>,
    pub account_name: Option<String>,
}

impl TryFrom<TransactionRow> for TransactionView {
    type Error = sqlx::Error;

    fn try_from(r: TransactionRow) -> Result<Self, Self::Error> {
        let method: Option<PaymentMethod> = r.method.as_deref().map(decode_text).transpose()?;
        Ok(TransactionView {
            transaction: Transaction {
                id: TransactionId(r.id),
                trx_date: r.trx_date,
                trx_type: decode_text(&r.trx_type)?,
                amount: Money::from_cents(r.amount_cents),
                due_date: r.due_date,
                paid_date: r.paid_date,
                sector: r.sector,
                cost_center_id: r.cost_center_id,
                category_id: r.category_id.map(CategoryId),
                account_id: r.account_id.map(AccountId),
                card_id: r.card_id.map(AccountId),
                method,
                doc_number: r.doc_number,
                counterparty: r.counterparty,
                description: r.description,
                status: decode_text(&r.status)?,
                tags: r.tags,
                origin: decode_text(&r.origin)?,
                external_id: r.external_id,
                attachment_path: r.attachment_path,
            },
            category_name: r.category_name,
            account_name: r.account_name,
        })
    }
}

fn into_views(rows: Vec<TransactionRow>) -> Result<Vec<TransactionView>, sqlx::Error> {
    rows.into_iter().map(TransactionView::try_from).collect()
}

const INSERT_SQL: &str = r#"
    INSERT INTO transactions (
        trx_date, due_date, paid_date, type, sector, cost_center_id, category_id,
        account_id, card_id, method, doc_number, counterparty, description,
        amount_cents, status, tags, origin, external_id
    ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
"#;

fn bind_insert<'q>(
    sql: &'q str,
    tx: &'q ValidatedTransaction,
) -> sqlx::query::Query<'q, Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
    sqlx::query(sql)
        .bind(tx.trx_date)
        .bind(tx.due_date)
        .bind(tx.paid_date)
        .bind(tx.trx_type.as_str())
        .bind(&tx.sector)
        .bind(tx.cost_center_id)
        .bind(tx.category_id.map(|c| c.0))
        .bind(tx.account_id.map(|a| a.0))
        .bind(tx.card_id.map(|a| a.0))
        .bind(tx.method.map(|m| m.as_str()))
        .bind(&tx.doc_number)
        .bind(&tx.counterparty)
        .bind(&tx.description)
        .bind(tx.amount.to_cents())
        .bind(tx.status.as_str())
        .bind(&tx.tags)
        .bind(tx.origin.as_str())
        .bind(&tx.external_id)
}

/// Generic over the executor so statement imports can run inside one
/// database transaction.
pub async fn insert_transaction<'e, E>(
    executor: E,
    tx: &ValidatedTransaction,
) -> Result<TransactionId, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = bind_insert(INSERT_SQL, tx).execute(executor).await?;
    let id = TransactionId(result.last_insert_rowid());
    tracing::debug!(%id, kind = %tx.trx_type, cents = tx.amount.to_cents(), "inserted transaction");
    Ok(id)
}

/// Inserts unless a row with the same `external_id` already exists.
/// Returns `None` for a duplicate.
pub async fn insert_if_new<'e, E>(
    executor: E,
    tx: &ValidatedTransaction,
) -> Result<Option<TransactionId>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("{INSERT_SQL} ON CONFLICT(external_id) DO NOTHING");
    let result = bind_insert(&sql, tx).execute(executor).await?;
    if result.rows_affected() == 0 {
        return Ok(None);
    }
    Ok(Some(TransactionId(result.last_insert_rowid())))
}

/// `None` when the row is missing or outside `scope`.
pub async fn get_transaction(
    pool: &DbPool,
    id: TransactionId,
    scope: &ScopeFilter,
) -> Result<Option<TransactionView>, sqlx::Error> {
    let mut qb = QueryBuilder::<Sqlite>::new(SELECT_VIEW);
    qb.push(" WHERE t.id = ").push_bind(id.0);
    scope.push_conditions(&mut qb);
    let row = qb.build_query_as::<TransactionRow>().fetch_optional(pool).await?;
    row.map(TransactionView::try_from).transpose()
}

/// Filtered listing, newest first.
pub async fn list_transactions(
    pool: &DbPool,
    filter: &TransactionFilter,
    scope: &ScopeFilter,
) -> Result<Vec<TransactionView>, sqlx::Error> {
    let mut qb = QueryBuilder::<Sqlite>::new(SELECT_VIEW);
    qb.push(" WHERE t.trx_date BETWEEN ")
        .push_bind(filter.range.start)
        .push(" AND ")
        .push_bind(filter.range.end);
    if let Some(ty) = filter.trx_type {
        qb.push(" AND t.type = ").push_bind(ty.as_str());
    }
    if let Some(status) = filter.status {
        qb.push(" AND t.status = ").push_bind(status.as_str());
    }
    scope.push_conditions(&mut qb);
    qb.push(" ORDER BY t.trx_date DESC, t.id DESC");

    let rows = qb.build_query_as::<TransactionRow>().fetch_all(pool).await?;
    into_views(rows)
}

/// The last entries by insertion order.
pub async fn recent_transactions(pool: &DbPool, scope: &ScopeFilter) -> Result<Vec<TransactionView>, sqlx::Error> {
    let mut qb = QueryBuilder::<Sqlite>::new(SELECT_VIEW);
    qb.push(" WHERE 1=1");
    scope.push_conditions(&mut qb);
    qb.push(" ORDER BY t.id DESC LIMIT ").push_bind(RECENT_LIMIT);

    let rows = qb.build_query_as::<TransactionRow>().fetch_all(pool).await?;
    into_views(rows)
}

/// Every transaction booked to `account`, newest first.
pub async fn account_statement(
    pool: &DbPool,
    account: AccountId,
    scope: &ScopeFilter,
) -> Result<Vec<TransactionView>, sqlx::Error> {
    let mut qb = QueryBuilder::<Sqlite>::new(SELECT_VIEW);
    qb.push(" WHERE t.account_id = ").push_bind(account.0);
    scope.push_conditions(&mut qb);
    qb.push(" ORDER BY t.trx_date DESC, t.id DESC");

    let rows = qb.build_query_as::<TransactionRow>().fetch_all(pool).await?;
    into_views(rows)
}

/// Every planned or paid entry on `account`. Unlike
/// [`pending_reconciliation`] this is not capped, since statement matching
/// needs all candidates.
pub async fn open_entries_for_account(
    pool: &DbPool,
    account: AccountId,
    scope: &ScopeFilter,
) -> Result<Vec<TransactionView>, sqlx::Error> {
    let mut qb = QueryBuilder::<Sqlite>::new(SELECT_VIEW);
    qb.push(" WHERE t.status IN ('planned','paid') AND t.account_id = ")
        .push_bind(account.0);
    scope.push_conditions(&mut qb);
    qb.push(" ORDER BY t.trx_date DESC, t.id DESC");

    let rows = qb.build_query_as::<TransactionRow>().fetch_all(pool).await?;
    into_views(rows)
}

/// The subset of `ids` already stored as some row's `external_id`.
pub async fn existing_external_ids(pool: &DbPool, ids: &[String]) -> Result<HashSet<String>, sqlx::Error> {
    let mut found = HashSet::new();
    // Stay well under SQLite's bound-parameter limit.
    for chunk in ids.chunks(500) {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT external_id FROM transactions WHERE external_id IN (");
        let mut list = qb.separated(", ");
        for id in chunk {
            list.push_bind(id.clone());
        }
        list.push_unseparated(")");
        let rows = qb.build_query_as::<(String,)>().fetch_all(pool).await?;
        found.extend(rows.into_iter().map(|(id,)| id));
    }
    Ok(found)
}

/// Planned or paid entries waiting to be reconciled.
pub async fn pending_reconciliation(
    pool: &DbPool,
    scope: &ScopeFilter,
) -> Result<Vec<TransactionView>, sqlx::Error> {
    let mut qb = QueryBuilder::<Sqlite>::new(SELECT_VIEW);
    qb.push(" WHERE t.status IN ('planned','paid')");
    scope.push_conditions(&mut qb);
    qb.push(" ORDER BY t.trx_date DESC, t.id DESC LIMIT ").push_bind(PENDING_LIMIT);

    let rows = qb.build_query_as::<TransactionRow>().fetch_all(pool).await?;
    into_views(rows)
}

/// Marks a planned or paid entry as reconciled on `today`. Returns `false`
/// when the row is missing or already settled another way.
pub async fn reconcile_transaction<'e, E>(
    executor: E,
    id: TransactionId,
    today: NaiveDate,
) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        "UPDATE transactions SET status = 'reconciled', paid_date = ? WHERE id = ? AND status IN ('planned','paid')",
    )
    .bind(today)
    .bind(id.0)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Reconciles an open entry from a statement line and records the line's
/// external id on it, unless the entry already carries one.
pub async fn settle_from_statement<'e, E>(
    executor: E,
    id: TransactionId,
    today: NaiveDate,
    external_id: &str,
) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        "UPDATE transactions SET status = 'reconciled', paid_date = ?, external_id = COALESCE(external_id, ?) \
         WHERE id = ? AND status IN ('planned','paid')",
    )
    .bind(today)
    .bind(external_id)
    .bind(id.0)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn set_status(pool: &DbPool, id: TransactionId, status: TransactionStatus) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE transactions SET status = ? WHERE id = ?")
        .bind(status.as_str())
        .bind(id.0)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn set_attachment(pool: &DbPool, id: TransactionId, path: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE transactions SET attachment_path = ? WHERE id = ?")
        .bind(path)
        .bind(id.0)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete_transaction(pool: &DbPool, id: TransactionId) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM transactions WHERE id = ?")
        .bind(id.0)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
