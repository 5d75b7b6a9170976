use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use std::sync::Arc;

use super::{AppJson, AppPath};
use crate::error::{AppError, AppResult};
use crate::models::{Booking, CreateBooking, UpdateBooking};
use crate::services::bookings;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/bookings", get(list_bookings).post(create_booking))
        .route(
            "/bookings/{id}",
            get(get_booking).put(update_booking).delete(cancel_booking),
        )
}

// GET /bookings
async fn list_bookings(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<Booking>>> {
    Ok(Json(Booking::list(&state.db.pool).await?))
}

// GET /bookings/:id
async fn get_booking(
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<Booking>> {
    Booking::find(&state.db.pool, id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Booking"))
}

// POST /bookings
async fn create_booking(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<CreateBooking>,
) -> AppResult<(StatusCode, Json<Booking>)> {
    let booking = bookings::create_booking(&state, req).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

// PUT /bookings/:id
async fn update_booking(
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<i64>,
    AppJson(req): AppJson<UpdateBooking>,
) -> AppResult<Json<Booking>> {
    Ok(Json(bookings::update_booking(&state, id, req).await?))
}

// DELETE /bookings/:id - отмена, строка остаётся
async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<Booking>> {
    Ok(Json(bookings::cancel_booking(&state, id).await?))
}
