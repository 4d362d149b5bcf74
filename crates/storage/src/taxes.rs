use finapp_core::{NewTaxObligation, Periodicity, TaxObligation};

use crate::db::{decode_text, DbPool};

type TaxRow = (i64, String, Option<String>, Option<String>, Option<String>, Option<i64>);

pub async fn list_taxes(pool: &DbPool) -> Result<Vec<TaxObligation>, sqlx::Error> {
    let rows = sqlx::query_as::<_, TaxRow>(
        "SELECT id, name, jurisdiction, code, periodicity, due_day FROM taxes ORDER BY name",
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|r| {
            let periodicity: Option<Periodicity> = r.4.as_deref().map(decode_text).transpose()?;
            Ok(TaxObligation {
                id: r.0,
                name: r.1,
                jurisdiction: r.2,
                code: r.3,
                periodicity,
                due_day: r.5.and_then(|d| u32::try_from(d).ok()),
            })
        })
        .collect()
}

pub async fn create_tax(pool: &DbPool, tax: &NewTaxObligation) -> Result<i64, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO taxes (name, jurisdiction, code, periodicity, due_day) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&tax.name)
    .bind(&tax.jurisdiction)
    .bind(&tax.code)
    .bind(tax.periodicity.map(|p| p.as_str()))
    .bind(tax.due_day.map(i64::from))
    .execute(pool)
    .await?;
    Ok(result.last_insert_rowid())
}

pub async fn delete_tax(pool: &DbPool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM taxes WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
