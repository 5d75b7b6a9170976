use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use validator::Validate;

use super::patch::{self, PatchBuilder};
use crate::error::AppResult;
use crate::services::update_builder::Patch;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Client {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub is_vip: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateClient {
    #[validate(length(min = 1, message = "full_name must not be empty"))]
    pub full_name: String,
    #[validate(email(message = "email must be a valid email address"))]
    pub email: String,
    pub phone: Option<String>,
    pub is_vip: Option<bool>,
}

impl CreateClient {
    pub fn normalized(self) -> Self {
        Self {
            full_name: self.full_name.trim().to_string(),
            email: patch::normalize_email(&self.email),
            phone: patch::blank_to_none(self.phone),
            is_vip: self.is_vip,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateClient {
    #[serde(default, deserialize_with = "patch::nullable")]
    pub full_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "patch::nullable")]
    pub email: Option<Option<String>>,
    #[serde(default, deserialize_with = "patch::nullable")]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "patch::nullable")]
    pub is_vip: Option<Option<bool>>,
}

impl UpdateClient {
    pub fn into_patch(self) -> AppResult<Patch> {
        let mut builder = PatchBuilder::new();
        builder
            .required("full_name", self.full_name, patch::non_empty_text)
            .required("email", self.email, patch::email)
            .nullable("phone", self.phone, patch::text)
            .required("is_vip", self.is_vip, patch::boolean);
        builder.finish()
    }
}

impl Client {
    pub const UPDATABLE_FIELDS: [&'static str; 4] = ["full_name", "email", "phone", "is_vip"];

    pub async fn list(pool: &PgPool) -> Result<Vec<Client>, sqlx::Error> {
        sqlx::query_as::<_, Client>("SELECT * FROM clients ORDER BY id")
            .fetch_all(pool)
            .await
    }

    pub async fn find(pool: &PgPool, id: i64) -> Result<Option<Client>, sqlx::Error> {
        sqlx::query_as::<_, Client>("SELECT * FROM clients WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn create(pool: &PgPool, new: &CreateClient) -> Result<Client, sqlx::Error> {
        sqlx::query_as::<_, Client>(
            r#"
            INSERT INTO clients (full_name, email, phone, is_vip)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&new.full_name)
        .bind(&new.email)
        .bind(&new.phone)
        .bind(new.is_vip.unwrap_or(false))
        .fetch_one(pool)
        .await
    }

    pub async fn update(pool: &PgPool, id: i64, patch: &Patch) -> AppResult<Option<Client>> {
        super::update_by_id(pool, "clients", &Self::UPDATABLE_FIELDS, patch, &[], id).await
    }

    /// Unconditional; deleting a missing id is not an error.
    pub async fn delete(pool: &PgPool, id: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM clients WHERE id = $1")
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
    use crate::services::update_builder::FieldValue;

    #[test]
    fn create_payload_is_normalized_before_validation() {
        let req: CreateClient = serde_json::from_str(
            r#"{"full_name": "  Ada Lovelace ", "email": " ADA@Example.com", "phone": "  "}"#,
        )
        .unwrap();
        let req = req.normalized();

        assert!(req.validate().is_ok());
        assert_eq!(req.full_name, "Ada Lovelace");
        assert_eq!(req.email, "ada@example.com");
        assert_eq!(req.phone, None);
    }

    #[test]
    fn blank_name_and_bad_email_are_rejected() {
        let req = CreateClient {
            full_name: "   ".into(),
            email: "nope".into(),
            phone: None,
            is_vip: None,
        }
        .normalized();

        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("full_name"));
        assert!(fields.contains_key("email"));
    }

    #[test]
    fn update_payload_builds_patch_with_clearing() {
        let req: UpdateClient =
            serde_json::from_str(r#"{"phone": null, "is_vip": true, "unknown": 1}"#).unwrap();
        let patch = req.into_patch().unwrap();

        assert_eq!(patch.get("phone"), Some(&None));
        assert_eq!(patch.get("is_vip"), Some(&Some(FieldValue::Boolean(true))));
        assert!(!patch.contains("full_name"));
        assert!(!patch.contains("unknown"));
    }

    #[test]
    fn update_rejects_null_name_and_invalid_email() {
        let req: UpdateClient =
            serde_json::from_str(r#"{"full_name": null, "email": "x@"}"#).unwrap();

        match req.into_patch() {
            Err(AppError::InvalidFields(errors)) => {
                let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(fields, vec!["full_name", "email"]);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
