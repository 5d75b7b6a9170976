use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection, PgPool};
use std::borrow::Cow;
use validator::{Validate, ValidationError};

use super::patch::{self, PatchBuilder};
use crate::error::AppResult;
use crate::services::update_builder::{FieldValue, Patch};

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Room {
    pub id: i64,
    pub number: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub room_type: Option<String>,
    pub capacity: Option<i32>,
    pub price_per_night: Option<Decimal>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

fn non_negative_price(price: &Decimal) -> Result<(), ValidationError> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(ValidationError::new("non_negative")
            .with_message(Cow::Borrowed("price_per_night must not be negative")));
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateRoom {
    #[validate(length(min = 1, message = "number must not be empty"))]
    pub number: String,
    #[serde(rename = "type")]
    pub room_type: Option<String>,
    #[validate(range(min = 1, message = "capacity must be at least 1"))]
    pub capacity: Option<i32>,
    #[validate(custom(function = "non_negative_price"))]
    pub price_per_night: Option<Decimal>,
    pub description: Option<String>,
}

impl CreateRoom {
    pub fn normalized(self) -> Self {
        Self {
            number: self.number.trim().to_string(),
            room_type: patch::blank_to_none(self.room_type),
            capacity: self.capacity,
            price_per_night: self.price_per_night,
            description: patch::blank_to_none(self.description),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateRoom {
    #[serde(default, deserialize_with = "patch::nullable")]
    pub number: Option<Option<String>>,
    #[serde(default, rename = "type", deserialize_with = "patch::nullable")]
    pub room_type: Option<Option<String>>,
    #[serde(default, deserialize_with = "patch::nullable")]
    pub capacity: Option<Option<i32>>,
    #[serde(default, deserialize_with = "patch::nullable")]
    pub price_per_night: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "patch::nullable")]
    pub description: Option<Option<String>>,
}

impl UpdateRoom {
    pub fn into_patch(self) -> AppResult<Patch> {
        let mut builder = PatchBuilder::new();
        builder
            .required("number", self.number, patch::non_empty_text)
            .nullable("type", self.room_type, patch::text)
            .nullable("capacity", self.capacity, |c| {
                if c < 1 {
                    return Err("must be at least 1");
                }
                Ok(FieldValue::Int4(c))
            })
            .nullable("price_per_night", self.price_per_night, |p| {
                non_negative_price(&p).map_err(|_| "must not be negative")?;
                Ok(FieldValue::Decimal(p))
            })
            .nullable("description", self.description, patch::text);
        builder.finish()
    }
}

impl Room {
    pub const UPDATABLE_FIELDS: [&'static str; 5] =
        ["number", "type", "capacity", "price_per_night", "description"];

    pub async fn list(pool: &PgPool) -> Result<Vec<Room>, sqlx::Error> {
        sqlx::query_as::<_, Room>("SELECT * FROM rooms ORDER BY id")
            .fetch_all(pool)
            .await
    }

    pub async fn find(pool: &PgPool, id: i64) -> Result<Option<Room>, sqlx::Error> {
        sqlx::query_as::<_, Room>("SELECT * FROM rooms WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn exists(conn: &mut PgConnection, id: i64) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM rooms WHERE id = $1)")
            .bind(id)
            .fetch_one(conn)
            .await
    }

    pub async fn create(pool: &PgPool, new: &CreateRoom) -> Result<Room, sqlx::Error> {
        sqlx::query_as::<_, Room>(
            r#"
            INSERT INTO rooms (number, type, capacity, price_per_night, description)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&new.number)
        .bind(&new.room_type)
        .bind(new.capacity)
        .bind(new.price_per_night)
        .bind(&new.description)
        .fetch_one(pool)
        .await
    }

    pub async fn update(pool: &PgPool, id: i64, patch: &Patch) -> AppResult<Option<Room>> {
        super::update_by_id(pool, "rooms", &Self::UPDATABLE_FIELDS, patch, &[], id).await
    }

    pub async fn delete(pool: &PgPool, id: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM rooms WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use rust_decimal::prelude::FromPrimitive;

    #[test]
    fn price_accepts_string_or_number() {
        let a: CreateRoom = serde_json::from_str(r#"{"number": "101", "price_per_night": "120.50"}"#).unwrap();
        let b: CreateRoom = serde_json::from_str(r#"{"number": "101", "price_per_night": 120.5}"#).unwrap();
        assert_eq!(a.price_per_night, b.price_per_night);
        assert_eq!(a.price_per_night, Decimal::from_f64(120.5));
    }

    #[test]
    fn create_validation_covers_number_capacity_and_price() {
        let req: CreateRoom = serde_json::from_str(
            r#"{"number": "  ", "type": "suite", "capacity": 0, "price_per_night": "-1"}"#,
        )
        .unwrap();
        let errors = req.normalized().validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("number"));
        assert!(fields.contains_key("capacity"));
        assert!(fields.contains_key("price_per_night"));
    }

    #[test]
    fn zero_price_and_missing_optionals_are_fine() {
        let req: CreateRoom =
            serde_json::from_str(r#"{"number": "7", "price_per_night": 0, "description": ""}"#).unwrap();
        let req = req.normalized();
        assert!(req.validate().is_ok());
        assert_eq!(req.description, None);
        assert_eq!(req.room_type, None);
    }

    #[test]
    fn update_uses_type_wire_name_and_allows_clearing() {
        let req: UpdateRoom =
            serde_json::from_str(r#"{"type": null, "capacity": 2, "description": " quiet "}"#).unwrap();
        let patch = req.into_patch().unwrap();

        assert_eq!(patch.get("type"), Some(&None));
        assert_eq!(patch.get("capacity"), Some(&Some(FieldValue::Int4(2))));
        assert_eq!(
            patch.get("description"),
            Some(&Some(FieldValue::Text(" quiet ".into())))
        );
    }

    #[test]
    fn update_rejects_bad_values() {
        let req: UpdateRoom =
            serde_json::from_str(r#"{"number": null, "capacity": 0, "price_per_night": "-0.01"}"#)
                .unwrap();
        match req.into_patch() {
            Err(AppError::InvalidFields(errors)) => assert_eq!(errors.len(), 3),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn room_serializes_type_field() {
        let room = Room {
            id: 1,
            number: "101".into(),
            room_type: Some("double".into()),
            capacity: Some(2),
            price_per_night: None,
            description: None,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&room).unwrap();
        assert_eq!(json["type"], "double");
        assert!(json.get("room_type").is_none());
    }
}
