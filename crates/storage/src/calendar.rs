use chrono::NaiveDate;
use finapp_core::{CalendarEvent, Money, NewCalendarEvent, Recurrence};

use crate::db::{decode_text, DbPool};

type EventRow = (i64, String, NaiveDate, String, i64, Option<NaiveDate>, Option<i64>, Option<String>);

pub async fn list_events(pool: &DbPool) -> Result<Vec<CalendarEvent>, sqlx::Error> {
    let rows = sqlx::query_as::<_, EventRow>(
        "SELECT id, title, start_date, recurrence, interval, until_date, amount_cents, notes
         FROM calendar_events ORDER BY start_date, id",
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|r| {
            Ok(CalendarEvent {
                id: r.0,
                title: r.1,
                start_date: r.2,
                recurrence: decode_text::<Recurrence>(&r.3)?,
                interval: u32::try_from(r.4).unwrap_or(1).max(1),
                until: r.5,
                amount: r.6.map(Money::from_cents),
                notes: r.7,
            })
        })
        .collect()
}

pub async fn create_event(pool: &DbPool, event: &NewCalendarEvent) -> Result<i64, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO calendar_events (title, start_date, recurrence, interval, until_date, amount_cents, notes)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&event.title)
    .bind(event.start_date)
    .bind(event.recurrence.as_str())
    .bind(i64::from(event.interval))
    .bind(event.until)
    .bind(event.amount.map(Money::to_cents))
    .bind(&event.notes)
    .execute(pool)
    .await?;
    Ok(result.last_insert_rowid())
}

pub async fn delete_event(pool: &DbPool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM calendar_events WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
