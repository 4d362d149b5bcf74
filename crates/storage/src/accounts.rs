use finapp_core::{Account, AccountId, AccountKind, NewAccount};

use crate::db::{decode_text, DbPool};

type AccountRow = (i64, String, String, Option<String>, Option<String>);

fn account_from_row(r: AccountRow) -> Result<Account, sqlx::Error> {
    Ok(Account {
        id: AccountId(r.0),
        name: r.1,
        kind: decode_text::<AccountKind>(&r.2)?,
        institution: r.3,
        number: r.4,
    })
}

/// Accounts ordered by name. Card accounts are left out of pickers that
/// only accept bank or cash accounts.
pub async fn list_accounts(pool: &DbPool, exclude_cards: bool) -> Result<Vec<Account>, sqlx::Error> {
    let sql = if exclude_cards {
        "SELECT id, name, kind, institution, number FROM accounts WHERE kind != 'card' ORDER BY name"
    } else {
        "SELECT id, name, kind, institution, number FROM accounts ORDER BY name"
    };
    let rows = sqlx::query_as::<_, AccountRow>(sql).fetch_all(pool).await?;
    rows.into_iter().map(account_from_row).collect()
}

pub async fn get_account(pool: &DbPool, id: AccountId) -> Result<Option<Account>, sqlx::Error> {
    let row = sqlx::query_as::<_, AccountRow>(
        "SELECT id, name, kind, institution, number FROM accounts WHERE id = ?",
    )
    .bind(id.0)
    .fetch_optional(pool)
    .await?;
    row.map(account_from_row).transpose()
}

pub async fn create_account(pool: &DbPool, account: &NewAccount) -> Result<AccountId, sqlx::Error> {
    let result = sqlx::query("INSERT INTO accounts (name, kind, institution, number) VALUES (?, ?, ?, ?)")
        .bind(&account.name)
        .bind(account.kind.as_str())
        .bind(&account.institution)
        .bind(&account.number)
        .execute(pool)
        .await?;
    Ok(AccountId(result.last_insert_rowid()))
}

/// Returns `false` when no such account exists. Transactions keep their
/// dangling `account_id`.
pub async fn delete_account(pool: &DbPool, id: AccountId) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM accounts WHERE id = ?")
        .bind(id.0)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
