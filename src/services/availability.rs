//! Inclusive date-range overlap and room availability.
//!
//! [`DateRange::overlaps`] and [`overlap_clause`] are the two renditions of
//! the same predicate; every conflict check goes through one of them.

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::{PgConnection, PgPool};

use crate::error::AppError;
use crate::models::Room;
use crate::services::lifecycle::BookingStatus;

/// `[start, end]`, both days included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, AppError> {
        if start > end {
            return Err(AppError::Validation(
                "start_date must be before or equal to end_date".to_string(),
            ));
        }
        Ok(Self { start, end })
    }

    /// Ranges sharing at least one day overlap, so a stay ending on the day
    /// another begins is a conflict.
    pub fn overlaps(&self, other: &DateRange) -> bool {
        !(self.end < other.start || self.start > other.end)
    }
}

/// SQL form of [`DateRange::overlaps`] against booking alias `b`.
pub fn overlap_clause(start_param: usize, end_param: usize) -> String {
    format!("NOT (b.end_date < ${start_param} OR b.start_date > ${end_param})")
}

fn status_names(statuses: &[BookingStatus]) -> Vec<String> {
    statuses.iter().map(|s| s.as_str().to_string()).collect()
}

/// True when an existing booking of `room_id` with a status in
/// `active_statuses` overlaps `range`. `exclude_booking` skips the booking
/// being edited.
pub async fn has_overlap(
    conn: &mut PgConnection,
    room_id: i64,
    range: DateRange,
    active_statuses: &[BookingStatus],
    exclude_booking: Option<i64>,
) -> Result<bool, sqlx::Error> {
    let sql = format!(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM bookings b
            WHERE b.room_id = $1
              AND b.status = ANY($4)
              AND ($5::BIGINT IS NULL OR b.id <> $5)
              AND {}
        )
        "#,
        overlap_clause(2, 3)
    );

    sqlx::query_scalar::<_, bool>(&sql)
        .bind(room_id)
        .bind(range.start)
        .bind(range.end)
        .bind(status_names(active_statuses))
        .bind(exclude_booking)
        .fetch_one(conn)
        .await
}

/// Rooms with no active booking overlapping `range`.
pub async fn list_available_rooms(pool: &PgPool, range: DateRange) -> Result<Vec<Room>, sqlx::Error> {
    let sql = format!(
        r#"
        SELECT r.*
        FROM rooms r
        WHERE NOT EXISTS (
            SELECT 1 FROM bookings b
            WHERE b.room_id = r.id
              AND b.status = ANY($3)
              AND {}
        )
        ORDER BY r.id
        "#,
        overlap_clause(1, 2)
    );

    sqlx::query_as::<_, Room>(&sql)
        .bind(range.start)
        .bind(range.end)
        .bind(status_names(&BookingStatus::ACTIVE))
        .fetch_all(pool)
        .await
}
