//! Turning partial-update JSON bodies into a validated [`Patch`].
//!
//! Update payloads use `Option<Option<T>>` fields: outer `None` means the key
//! was absent, `Some(None)` means an explicit `null`.

use serde::{Deserialize, Deserializer};
use validator::ValidateEmail;

use crate::error::{AppError, FieldError};
use crate::services::update_builder::{FieldValue, Patch};

/// `deserialize_with` target that keeps an explicit `null` distinct from a
/// missing key. Use together with `#[serde(default)]`.
pub fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Accumulates field values and per-field errors.
#[derive(Debug, Default)]
pub struct PatchBuilder {
    patch: Patch,
    errors: Vec<FieldError>,
}

impl PatchBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Column that cannot be cleared: `null` is rejected.
    pub fn required<T>(
        &mut self,
        field: &'static str,
        value: Option<Option<T>>,
        convert: impl FnOnce(T) -> Result<FieldValue, &'static str>,
    ) -> &mut Self {
        match value {
            None => {}
            Some(None) => self.reject(field, "cannot be null"),
            Some(Some(v)) => self.apply(field, v, convert),
        }
        self
    }

    /// Column that may be cleared with `null`.
    pub fn nullable<T>(
        &mut self,
        field: &'static str,
        value: Option<Option<T>>,
        convert: impl FnOnce(T) -> Result<FieldValue, &'static str>,
    ) -> &mut Self {
        match value {
            None => {}
            Some(None) => {
                self.patch.clear(field);
            }
            Some(Some(v)) => self.apply(field, v, convert),
        }
        self
    }

    fn apply<T>(
        &mut self,
        field: &'static str,
        value: T,
        convert: impl FnOnce(T) -> Result<FieldValue, &'static str>,
    ) {
        match convert(value) {
            Ok(v) => {
                self.patch.set(field, v);
            }
            Err(msg) => self.reject(field, msg),
        }
    }

    pub fn reject(&mut self, field: &'static str, message: &str) {
        self.errors.push(FieldError::new(field, format!("{field} {message}")));
    }

    pub fn finish(self) -> Result<Patch, AppError> {
        if self.errors.is_empty() {
            Ok(self.patch)
        } else {
            Err(AppError::InvalidFields(self.errors))
        }
    }
}

// --- converters ---

pub fn text(value: String) -> Result<FieldValue, &'static str> {
    Ok(FieldValue::Text(value))
}

pub fn non_empty_text(value: String) -> Result<FieldValue, &'static str> {
    if value.trim().is_empty() {
        return Err("must not be empty");
    }
    Ok(FieldValue::Text(value))
}

pub fn email(value: String) -> Result<FieldValue, &'static str> {
    let normalized = normalize_email(&value);
    if !normalized.validate_email() {
        return Err("must be a valid email address");
    }
    Ok(FieldValue::Text(normalized))
}

pub fn boolean(value: bool) -> Result<FieldValue, &'static str> {
    Ok(FieldValue::Boolean(value))
}

pub fn normalize_email(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Trims and maps blank strings to `None`.
pub fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
