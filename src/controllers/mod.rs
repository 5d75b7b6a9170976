pub mod bookings;
pub mod clients;
pub mod rooms;

use axum::{
    extract::{FromRequest, FromRequestParts},
    response::{IntoResponse, Response},
    Router,
};
use serde::Serialize;
use std::sync::Arc;

use crate::error::AppError;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(clients::routes())
        .merge(rooms::routes())
        .merge(bookings::routes())
}

/// `Json` whose rejections come back as `{"error": ...}` with 400.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

impl<T: Serialize> IntoResponse for AppJson<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

/// `Path` whose rejections come back as `{"error": ...}` with 400.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct AppPath<T>(pub T);
