use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection, PgPool};
use validator::Validate;

use super::patch;
use crate::error::{AppError, AppResult, FieldError};
use crate::services::client_directory::ClientSnapshot;
use crate::services::lifecycle::BookingStatus;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Booking {
    pub id: i64,
    pub client_id: i64,
    pub client_name: String,
    pub client_email: String,
    pub client_phone: Option<String>,
    pub is_vip: bool,
    pub room_id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[sqlx(try_from = "String")]
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// POST /bookings
#[derive(Debug, Deserialize, Validate)]
pub struct CreateBooking {
    #[validate(range(min = 1, message = "client_id must be a positive integer"))]
    pub client_id: i64,
    #[validate(range(min = 1, message = "room_id must be a positive integer"))]
    pub room_id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: Option<BookingStatus>,
}

// PUT /bookings/:id
#[derive(Debug, Default, Deserialize)]
pub struct UpdateBooking {
    #[serde(default, deserialize_with = "patch::nullable")]
    pub client_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "patch::nullable")]
    pub room_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "patch::nullable")]
    pub start_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "patch::nullable")]
    pub end_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "patch::nullable")]
    pub status: Option<Option<BookingStatus>>,
}

/// Validated booking update; `None` fields are left as they are.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookingChanges {
    pub client_id: Option<i64>,
    pub room_id: Option<i64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status: Option<BookingStatus>,
}

impl BookingChanges {
    pub fn is_empty(&self) -> bool {
        *self == BookingChanges::default()
    }

    /// Whether the change can create an overlap with another booking.
    pub fn affects_availability(&self) -> bool {
        self.room_id.is_some()
            || self.start_date.is_some()
            || self.end_date.is_some()
            || self.status.is_some()
    }
}

fn not_null<T>(field: &'static str, value: Option<Option<T>>, errors: &mut Vec<FieldError>) -> Option<T> {
    match value {
        Some(None) => {
            errors.push(FieldError::new(field, format!("{field} cannot be null")));
            None
        }
        Some(v) => v,
        None => None,
    }
}

fn positive(field: &'static str, value: Option<i64>, errors: &mut Vec<FieldError>) -> Option<i64> {
    match value {
        Some(v) if v < 1 => {
            errors.push(FieldError::new(field, format!("{field} must be a positive integer")));
            None
        }
        other => other,
    }
}

impl UpdateBooking {
    pub fn into_changes(self) -> AppResult<BookingChanges> {
        let mut errors = Vec::new();

        let client_id = not_null("client_id", self.client_id, &mut errors);
        let client_id = positive("client_id", client_id, &mut errors);
        let room_id = not_null("room_id", self.room_id, &mut errors);
        let room_id = positive("room_id", room_id, &mut errors);
        let changes = BookingChanges {
            client_id,
            room_id,
            start_date: not_null("start_date", self.start_date, &mut errors),
            end_date: not_null("end_date", self.end_date, &mut errors),
            status: not_null("status", self.status, &mut errors),
        };

        if !errors.is_empty() {
            return Err(AppError::InvalidFields(errors));
        }
        Ok(changes)
    }
}

/// Row values for an insert, after enrichment.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub client_id: i64,
    pub client: ClientSnapshot,
    pub room_id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: BookingStatus,
}

impl Booking {
    pub async fn list(pool: &PgPool) -> Result<Vec<Booking>, sqlx::Error> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings ORDER BY created_at DESC, id DESC")
            .fetch_all(pool)
            .await
    }

    pub async fn find(pool: &PgPool, id: i64) -> Result<Option<Booking>, sqlx::Error> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Reads a booking and row-locks it for the rest of the transaction.
    pub async fn find_for_update(
        conn: &mut PgConnection,
        id: i64,
    ) -> Result<Option<Booking>, sqlx::Error> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    pub async fn insert(conn: &mut PgConnection, new: &NewBooking) -> Result<Booking, sqlx::Error> {
        sqlx::query_as::<_, Booking>(
            r#"
            INSERT INTO bookings (client_id, client_name, client_email, client_phone, is_vip,
                                  room_id, start_date, end_date, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(new.client_id)
        .bind(&new.client.name)
        .bind(&new.client.email)
        .bind(&new.client.phone)
        .bind(new.client.is_vip)
        .bind(new.room_id)
        .bind(new.start_date)
        .bind(new.end_date)
        .bind(new.status.as_str())
        .fetch_one(conn)
        .await
    }

    pub async fn set_status(
        conn: &mut PgConnection,
        id: i64,
        status: BookingStatus,
    ) -> Result<Booking, sqlx::Error> {
        sqlx::query_as::<_, Booking>(
            r#"
            UPDATE bookings
            SET status = $1,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $2
            RETURNING *
            "#,
        )
        .bind(status.as_str())
        .bind(id)
        .fetch_one(conn)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_accepts_iso_dates_and_optional_status() {
        let req: CreateBooking = serde_json::from_str(
            r#"{"client_id": 1, "room_id": 5, "start_date": "2024-06-01", "end_date": "2024-06-05"}"#,
        )
        .unwrap();
        assert!(req.validate().is_ok());
        assert_eq!(req.status, None);

        let req: CreateBooking = serde_json::from_str(
            r#"{"client_id": 1, "room_id": 5, "start_date": "2024-06-01", "end_date": "2024-06-05", "status": "CONFIRMED"}"#,
        )
        .unwrap();
        assert_eq!(req.status, Some(BookingStatus::Confirmed));
    }

    #[test]
    fn create_rejects_unknown_status_and_bad_ids() {
        assert!(serde_json::from_str::<CreateBooking>(
            r#"{"client_id": 1, "room_id": 5, "start_date": "2024-06-01", "end_date": "2024-06-05", "status": "BOOKED"}"#,
        )
        .is_err());

        let req: CreateBooking = serde_json::from_str(
            r#"{"client_id": 0, "room_id": -3, "start_date": "2024-06-01", "end_date": "2024-06-05"}"#,
        )
        .unwrap();
        let errors = req.validate().unwrap_err();
        assert_eq!(errors.field_errors().len(), 2);
    }

    #[test]
    fn update_with_only_unknown_fields_is_empty() {
        let req: UpdateBooking = serde_json::from_str(r#"{"note": "late arrival"}"#).unwrap();
        let changes = req.into_changes().unwrap();
        assert!(changes.is_empty());
        assert!(!changes.affects_availability());
    }

    #[test]
    fn update_rejects_nulls() {
        let req: UpdateBooking =
            serde_json::from_str(r#"{"room_id": null, "status": null, "client_id": 0}"#).unwrap();
        match req.into_changes() {
            Err(AppError::InvalidFields(errors)) => {
                let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(fields, vec!["client_id", "room_id", "status"]);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn client_only_update_does_not_touch_availability() {
        let req: UpdateBooking = serde_json::from_str(r#"{"client_id": 12}"#).unwrap();
        let changes = req.into_changes().unwrap();
        assert_eq!(changes.client_id, Some(12));
        assert!(!changes.affects_availability());
    }
}
