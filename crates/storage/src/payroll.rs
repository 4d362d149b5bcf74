use finapp_core::{Money, Month, PayrollEntry, ValidatedPayroll};

use crate::db::{decode_text, DbPool};

type PayrollRow = (i64, String, String, i64, i64, i64, i64, bool);

/// Newest period first, then by employee.
pub async fn list_payroll(pool: &DbPool) -> Result<Vec<PayrollEntry>, sqlx::Error> {
    let rows = sqlx::query_as::<_, PayrollRow>(
        "SELECT id, period, employee, gross_cents, charges_cents, benefits_cents, total_cents, paid
         FROM payroll ORDER BY period DESC, employee ASC",
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|r| {
            let period: Month = decode_text(&r.1)?;
            Ok(PayrollEntry {
                id: r.0,
                period,
                employee: r.2,
                gross: Money::from_cents(r.3),
                charges: Money::from_cents(r.4),
                benefits: Money::from_cents(r.5),
                total: Money::from_cents(r.6),
                paid: r.7,
            })
        })
        .collect()
}

pub async fn create_payroll(pool: &DbPool, entry: &ValidatedPayroll) -> Result<i64, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO payroll (period, employee, gross_cents, charges_cents, benefits_cents, total_cents, paid)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(entry.period.to_string())
    .bind(&entry.employee)
    .bind(entry.gross.to_cents())
    .bind(entry.charges.to_cents())
    .bind(entry.benefits.to_cents())
    .bind(entry.total.to_cents())
    .bind(entry.paid)
    .execute(pool)
    .await?;
    Ok(result.last_insert_rowid())
}

pub async fn mark_payroll_paid(pool: &DbPool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE payroll SET paid = 1 WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete_payroll(pool: &DbPool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM payroll WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
