//! Booking writes: create, update and cancel.
//!
//! Writes that can produce an overlap run inside one transaction that holds
//! the room's advisory lock from the overlap check until commit, so two
//! requests for the same room cannot both pass the check. Client enrichment
//! happens before the transaction is opened; its failure aborts the request
//! with nothing written.

use tracing::info;
use validator::Validate;

use crate::database;
use crate::error::{AppError, AppResult};
use crate::models::booking::{BookingChanges, NewBooking};
use crate::models::{Booking, CreateBooking, Room, UpdateBooking};
use crate::services::availability::{self, DateRange};
use crate::services::lifecycle::BookingStatus;
use crate::services::update_builder::{FieldValue, Patch};
use crate::AppState;

/// Columns a booking update may write, in placeholder order. The client
/// snapshot columns are only set together with `client_id`.
pub const UPDATABLE_FIELDS: [&str; 9] = [
    "client_id",
    "client_name",
    "client_email",
    "client_phone",
    "is_vip",
    "room_id",
    "start_date",
    "end_date",
    "status",
];

fn overlap_conflict() -> AppError {
    AppError::Conflict("Room is already booked for these dates".to_string())
}

pub async fn create_booking(state: &AppState, req: CreateBooking) -> AppResult<Booking> {
    req.validate()?;
    let range = DateRange::new(req.start_date, req.end_date)?;
    let status = BookingStatus::initial(req.status);

    let client = state.directory.fetch(req.client_id).await?;

    let mut tx = state.db.pool.begin().await?;

    if !Room::exists(&mut *tx, req.room_id).await? {
        return Err(AppError::not_found("Room"));
    }

    if status.is_active() {
        database::lock_room(&mut *tx, req.room_id).await?;
        if availability::has_overlap(&mut *tx, req.room_id, range, &BookingStatus::ACTIVE, None).await? {
            return Err(overlap_conflict());
        }
    }

    let booking = Booking::insert(
        &mut *tx,
        &NewBooking {
            client_id: req.client_id,
            client,
            room_id: req.room_id,
            start_date: range.start,
            end_date: range.end,
            status,
        },
    )
    .await?;

    tx.commit().await?;

    info!(
        booking_id = booking.id,
        room_id = booking.room_id,
        client_id = booking.client_id,
        status = %booking.status,
        "booking created"
    );
    Ok(booking)
}

pub async fn update_booking(state: &AppState, id: i64, req: UpdateBooking) -> AppResult<Booking> {
    let changes = req.into_changes()?;
    if changes.is_empty() {
        return Err(AppError::Validation("No fields to update".to_string()));
    }
    if let (Some(start), Some(end)) = (changes.start_date, changes.end_date) {
        DateRange::new(start, end)?;
    }

    let snapshot = match changes.client_id {
        Some(client_id) => Some(state.directory.fetch(client_id).await?),
        None => None,
    };

    let mut tx = state.db.pool.begin().await?;

    let current = Booking::find_for_update(&mut *tx, id)
        .await?
        .ok_or_else(|| AppError::not_found("Booking"))?;

    if changes.affects_availability() {
        let room_id = changes.room_id.unwrap_or(current.room_id);
        let range = DateRange::new(
            changes.start_date.unwrap_or(current.start_date),
            changes.end_date.unwrap_or(current.end_date),
        )?;
        let status = changes.status.unwrap_or(current.status);

        if changes.room_id.is_some() && !Room::exists(&mut *tx, room_id).await? {
            return Err(AppError::not_found("Room"));
        }

        if status.is_active() {
            database::lock_room(&mut *tx, room_id).await?;
            if availability::has_overlap(&mut *tx, room_id, range, &BookingStatus::ACTIVE, Some(id)).await? {
                return Err(overlap_conflict());
            }
        }
    }

    let mut patch = Patch::new();
    if let (Some(client_id), Some(client)) = (changes.client_id, snapshot) {
        patch
            .set("client_id", FieldValue::Integer(client_id))
            .set("client_name", FieldValue::Text(client.name))
            .set("client_email", FieldValue::Text(client.email))
            .set("is_vip", FieldValue::Boolean(client.is_vip));
        match client.phone {
            Some(phone) => patch.set("client_phone", FieldValue::Text(phone)),
            None => patch.clear("client_phone"),
        };
    }
    apply_schedule_changes(&mut patch, &changes);

    let booking = crate::models::update_by_id::<Booking, _>(
        &mut *tx,
        "bookings",
        &UPDATABLE_FIELDS,
        &patch,
        &["updated_at = CURRENT_TIMESTAMP"],
        id,
    )
    .await?
    .ok_or_else(|| AppError::not_found("Booking"))?;

    tx.commit().await?;

    info!(booking_id = id, status = %booking.status, "booking updated");
    Ok(booking)
}

fn apply_schedule_changes(patch: &mut Patch, changes: &BookingChanges) {
    if let Some(room_id) = changes.room_id {
        patch.set("room_id", FieldValue::Integer(room_id));
    }
    if let Some(start) = changes.start_date {
        patch.set("start_date", FieldValue::Date(start));
    }
    if let Some(end) = changes.end_date {
        patch.set("end_date", FieldValue::Date(end));
    }
    if let Some(status) = changes.status {
        patch.set("status", FieldValue::Text(status.as_str().to_string()));
    }
}

/// Soft cancel: the row stays, only the status moves.
pub async fn cancel_booking(state: &AppState, id: i64) -> AppResult<Booking> {
    let mut tx = state.db.pool.begin().await?;

    let current = Booking::find_for_update(&mut *tx, id)
        .await?
        .ok_or_else(|| AppError::not_found("Booking"))?;

    let next = current.status.cancel()?;
    let booking = Booking::set_status(&mut *tx, id, next).await?;

    tx.commit().await?;

    info!(booking_id = id, from = %current.status, to = %next, "booking cancelled");
    Ok(booking)
}
