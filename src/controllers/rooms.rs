use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use super::{AppJson, AppPath};
use crate::error::{AppError, AppResult};
use crate::models::{CreateRoom, Room, UpdateRoom};
use crate::services::availability::{self, DateRange};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/rooms", get(list_rooms).post(create_room))
        .route("/rooms/available", get(available_rooms))
        .route(
            "/rooms/{id}",
            get(get_room).put(update_room).delete(delete_room),
        )
}

/* ---------- helpers ---------- */

#[derive(Debug, Deserialize)]
struct AvailabilityQuery {
    start_date: Option<String>,
    end_date: Option<String>,
}

impl AvailabilityQuery {
    fn into_range(self) -> AppResult<DateRange> {
        let (Some(start), Some(end)) = (self.start_date, self.end_date) else {
            return Err(AppError::Validation(
                "start_date and end_date query params are required".to_string(),
            ));
        };
        DateRange::new(parse_date("start_date", &start)?, parse_date("end_date", &end)?)
    }
}

fn parse_date(name: &str, raw: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::Validation(format!("{name} must be a date in YYYY-MM-DD format")))
}

/* ---------- ROOMS ---------- */

// GET /rooms
async fn list_rooms(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<Room>>> {
    Ok(Json(Room::list(&state.db.pool).await?))
}

// GET /rooms/available?start_date=YYYY-MM-DD&end_date=YYYY-MM-DD
async fn available_rooms(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AvailabilityQuery>,
) -> AppResult<Json<Vec<Room>>> {
    let range = params.into_range()?;
    let rooms = availability::list_available_rooms(&state.db.pool, range).await?;
    tracing::debug!(start = %range.start, end = %range.end, count = rooms.len(), "available rooms");
    Ok(Json(rooms))
}

// GET /rooms/:id
async fn get_room(
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<Room>> {
    Room::find(&state.db.pool, id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Room"))
}

// POST /rooms
async fn create_room(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<CreateRoom>,
) -> AppResult<(StatusCode, Json<Room>)> {
    let req = req.normalized();
    req.validate()?;

    let room = Room::create(&state.db.pool, &req).await?;
    tracing::info!(room_id = room.id, number = %room.number, "room created");
    Ok((StatusCode::CREATED, Json(room)))
}

// PUT /rooms/:id
async fn update_room(
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<i64>,
    AppJson(req): AppJson<UpdateRoom>,
) -> AppResult<Json<Room>> {
    let patch = req.into_patch()?;
    Room::update(&state.db.pool, id, &patch)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Room"))
}

// DELETE /rooms/:id
async fn delete_room(
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<i64>,
) -> AppResult<StatusCode> {
    Room::delete(&state.db.pool, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(start: Option<&str>, end: Option<&str>) -> AvailabilityQuery {
        AvailabilityQuery {
            start_date: start.map(str::to_string),
            end_date: end.map(str::to_string),
        }
    }

    #[test]
    fn both_dates_are_required() {
        let err = query(Some("2024-07-01"), None).into_range().unwrap_err();
        assert_eq!(err.to_string(), "start_date and end_date query params are required");
    }

    #[test]
    fn dates_must_parse_and_be_ordered() {
        assert!(query(Some("July 1"), Some("2024-07-03")).into_range().is_err());
        assert!(query(Some("2024-07-03"), Some("2024-07-01")).into_range().is_err());

        let range = query(Some("2024-07-01"), Some("2024-07-03")).into_range().unwrap();
        assert_eq!(range.start, NaiveDate::from_ymd_opt(2024, 7, 1).unwrap());
        assert_eq!(range.end, NaiveDate::from_ymd_opt(2024, 7, 3).unwrap());
    }
}
