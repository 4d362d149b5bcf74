use finapp_core::{DEFAULT_ACCOUNTS, DEFAULT_CATEGORIES, DEFAULT_SECTORS};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

pub type DbPool = Pool<Sqlite>;

pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_millis(4000);

/// Opens (creating if needed) the database file, applies the schema and
/// seeds empty tables.
pub async fn create_db(
    path: &Path,
    busy_timeout: Duration,
    max_connections: u32,
) -> Result<DbPool, sqlx::Error> {
    tracing::info!(path = %path.display(), "opening database");

    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(busy_timeout)
        .pragma("temp_store", "MEMORY");

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections.max(1))
        .connect_with(options)
        .await?;

    run_migrations(&pool).await?;
    seed_minimums(&pool).await?;

    Ok(pool)
}

/// In-memory database with the full schema. Single connection, since every
/// new in-memory connection would be a separate database.
pub async fn create_memory_db() -> Result<DbPool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    run_migrations(&pool).await?;
    seed_minimums(&pool).await?;

    Ok(pool)
}

async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS accounts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            kind TEXT NOT NULL CHECK (kind IN ('bank','cash','card')),
            institution TEXT,
            number TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS categories (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            parent_id INTEGER,
            kind TEXT NOT NULL CHECK (kind IN ('expense','income','tax','payroll'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS transactions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            trx_date TEXT NOT NULL,
            due_date TEXT,
            paid_date TEXT,
            type TEXT NOT NULL CHECK (type IN ('expense','income','transfer','tax','payroll','card')),
            sector TEXT,
            cost_center_id INTEGER,
            category_id INTEGER,
            account_id INTEGER,
            card_id INTEGER,
            method TEXT,
            doc_number TEXT,
            counterparty TEXT,
            description TEXT,
            amount_cents INTEGER NOT NULL CHECK (amount_cents > 0),
            status TEXT NOT NULL CHECK (status IN ('planned','paid','overdue','reconciled','canceled')),
            tags TEXT,
            origin TEXT NOT NULL DEFAULT 'manual' CHECK (origin IN ('manual','bank','card','import')),
            external_id TEXT UNIQUE,
            attachment_path TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions(trx_date)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_transactions_account ON transactions(account_id)")
        .execute(pool)
        .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS payroll (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            period TEXT NOT NULL,
            employee TEXT NOT NULL,
            gross_cents INTEGER NOT NULL,
            charges_cents INTEGER NOT NULL DEFAULT 0,
            benefits_cents INTEGER NOT NULL DEFAULT 0,
            total_cents INTEGER NOT NULL,
            paid INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS taxes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            jurisdiction TEXT,
            code TEXT,
            periodicity TEXT CHECK (periodicity IN ('monthly','quarterly','annual')),
            due_day INTEGER CHECK (due_day BETWEEN 1 AND 31)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            role TEXT NOT NULL DEFAULT 'user' CHECK (role IN ('user','admin')),
            account_id INTEGER,
            sectors TEXT NOT NULL DEFAULT '',
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS calendar_events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            start_date TEXT NOT NULL,
            recurrence TEXT NOT NULL DEFAULT 'none'
                CHECK (recurrence IN ('none','daily','weekly','monthly','yearly')),
            interval INTEGER NOT NULL DEFAULT 1 CHECK (interval >= 1),
            until_date TEXT,
            amount_cents INTEGER,
            notes TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    for table in ["clients", "suppliers"] {
        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                document TEXT,
                email TEXT,
                phone TEXT
            )
            "#
        ))
        .execute(pool)
        .await?;
    }

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sectors (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn is_empty(pool: &DbPool, table: &str) -> Result<bool, sqlx::Error> {
    let (count,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await?;
    Ok(count == 0)
}

/// Inserts the default accounts, categories and sectors, each only when its
/// table is still empty.
pub async fn seed_minimums(pool: &DbPool) -> Result<(), sqlx::Error> {
    if is_empty(pool, "accounts").await? {
        for (name, kind, institution, number) in DEFAULT_ACCOUNTS {
            sqlx::query("INSERT INTO accounts (name, kind, institution, number) VALUES (?, ?, ?, ?)")
                .bind(*name)
                .bind(kind.as_str())
                .bind(if institution.is_empty() { None } else { Some(*institution) })
                .bind(if number.is_empty() { None } else { Some(*number) })
                .execute(pool)
                .await?;
        }
        tracing::info!(count = DEFAULT_ACCOUNTS.len(), "seeded default accounts");
    }

    if is_empty(pool, "categories").await? {
        for (name, kind) in DEFAULT_CATEGORIES {
            sqlx::query("INSERT INTO categories (name, parent_id, kind) VALUES (?, NULL, ?)")
                .bind(*name)
                .bind(kind.as_str())
                .execute(pool)
                .await?;
        }
        tracing::info!(count = DEFAULT_CATEGORIES.len(), "seeded default categories");
    }

    if is_empty(pool, "sectors").await? {
        for name in DEFAULT_SECTORS {
            sqlx::query("INSERT OR IGNORE INTO sectors (name) VALUES (?)")
                .bind(*name)
                .execute(pool)
                .await?;
        }
    }

    Ok(())
}

/// Turns a stored enum text into its domain value, surfacing bad rows as
/// decode errors.
pub(crate) fn decode_text<T>(raw: &str) -> Result<T, sqlx::Error>
where
    T: FromStr<Err = finapp_core::FinError>,
{
    raw.parse::<T>().map_err(|e| sqlx::Error::Decode(Box::new(e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_db_creates_file_and_seeds_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("finapp.db");

        let pool = create_db(&path, DEFAULT_BUSY_TIMEOUT, 2).await.unwrap();
        assert!(path.exists());

        let (accounts,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM accounts")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(accounts, 2);

        seed_minimums(&pool).await.unwrap();
        let (categories,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM categories")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(categories, DEFAULT_CATEGORIES.len() as i64);
        pool.close().await;

        // Reopening runs the idempotent schema again without reseeding.
        let pool = create_db(&path, DEFAULT_BUSY_TIMEOUT, 1).await.unwrap();
        let (sectors,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sectors")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(sectors, DEFAULT_SECTORS.len() as i64);
    }

    #[tokio::test]
    async fn check_constraints_reject_bad_rows() {
        let pool = create_memory_db().await.unwrap();
        let bad_amount = sqlx::query(
            "INSERT INTO transactions (trx_date, type, amount_cents, status) VALUES ('2024-01-01', 'expense', 0, 'paid')",
        )
        .execute(&pool)
        .await;
        assert!(bad_amount.is_err());

        let bad_type = sqlx::query(
            "INSERT INTO transactions (trx_date, type, amount_cents, status) VALUES ('2024-01-01', 'refund', 10, 'paid')",
        )
        .execute(&pool)
        .await;
        assert!(bad_type.is_err());
    }
}
