use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use finapp_core::{month_view, CalendarEntry, CalendarEvent, Month, NewCalendarEvent};
use serde::Serialize;

use super::deleted;
use crate::error::Result;
use crate::AppState;

#[derive(Serialize)]
struct MonthView {
    month: Month,
    entries: Vec<CalendarEntry>,
}

async fn list_events(State(state): State<AppState>) -> Result<Json<Vec<CalendarEvent>>> {
    Ok(Json(finapp_storage::list_events(&state.pool).await?))
}

async fn create_event(
    State(state): State<AppState>,
    Json(payload): Json<NewCalendarEvent>,
) -> Result<(StatusCode, Json<CalendarEvent>)> {
    let event = payload.validate()?;
    let id = finapp_storage::create_event(&state.pool, &event).await?;
    Ok((
        StatusCode::CREATED,
        Json(CalendarEvent {
            id,
            title: event.title,
            start_date: event.start_date,
            recurrence: event.recurrence,
            interval: event.interval,
            until: event.until,
            amount: event.amount,
            notes: event.notes,
        }),
    ))
}

async fn delete_event(State(state): State<AppState>, Path(id): Path<i64>) -> Result<StatusCode> {
    deleted(finapp_storage::delete_event(&state.pool, id).await?, "event")
}

/// Event occurrences and tax due dates for one month.
async fn month(
    State(state): State<AppState>,
    Path((year, month)): Path<(i32, u32)>,
) -> Result<Json<MonthView>> {
    let month = Month::new(year, month)?;
    let events = finapp_storage::list_events(&state.pool).await?;
    let taxes = finapp_storage::list_taxes(&state.pool).await?;
    Ok(Json(MonthView {
        month,
        entries: month_view(month, &events, &taxes),
    }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/calendar/events", get(list_events).post(create_event))
        .route("/api/calendar/events/{id}", delete(delete_event))
        .route("/api/calendar/{year}/{month}", get(month))
}
