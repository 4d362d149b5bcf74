use finapp_core::{NewParty, Party, PartyKind, Sector};

use crate::db::DbPool;

/// Clients or suppliers, ordered by name.
pub async fn list_parties(pool: &DbPool, kind: PartyKind) -> Result<Vec<Party>, sqlx::Error> {
    let sql = format!(
        "SELECT id, name, document, email, phone FROM {} ORDER BY name",
        kind.table()
    );
    let rows = sqlx::query_as::<_, (i64, String, Option<String>, Option<String>, Option<String>)>(&sql)
        .fetch_all(pool)
        .await?;
    Ok(rows
        .into_iter()
        .map(|r| Party {
            id: r.0,
            name: r.1,
            document: r.2,
            email: r.3,
            phone: r.4,
        })
        .collect())
}

pub async fn create_party(pool: &DbPool, kind: PartyKind, party: &NewParty) -> Result<i64, sqlx::Error> {
    let sql = format!(
        "INSERT INTO {} (name, document, email, phone) VALUES (?, ?, ?, ?)",
        kind.table()
    );
    let result = sqlx::query(&sql)
        .bind(&party.name)
        .bind(&party.document)
        .bind(&party.email)
        .bind(&party.phone)
        .execute(pool)
        .await?;
    Ok(result.last_insert_rowid())
}

pub async fn delete_party(pool: &DbPool, kind: PartyKind, id: i64) -> Result<bool, sqlx::Error> {
    let sql = format!("DELETE FROM {} WHERE id = ?", kind.table());
    let result = sqlx::query(&sql).bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}

pub async fn list_sectors(pool: &DbPool) -> Result<Vec<Sector>, sqlx::Error> {
    let rows = sqlx::query_as::<_, (i64, String)>("SELECT id, name FROM sectors ORDER BY name")
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(|(id, name)| Sector { id, name }).collect())
}

/// Returns `None` when a sector with the same name exists.
pub async fn create_sector(pool: &DbPool, name: &str) -> Result<Option<i64>, sqlx::Error> {
    let result = sqlx::query("INSERT INTO sectors (name) VALUES (?) ON CONFLICT(name) DO NOTHING")
        .bind(name)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Ok(None);
    }
    Ok(Some(result.last_insert_rowid()))
}

pub async fn delete_sector(pool: &DbPool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM sectors WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
