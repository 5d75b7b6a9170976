//! Partial-update statement builder.
//!
//! Given an allow-list of columns and a [`Patch`], produces the `SET` list of
//! a parameterized `UPDATE` and the values to bind, in placeholder order.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{postgres::PgArguments, query::QueryAs, Postgres};
use std::collections::HashMap;

/// A bindable column value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Int4(i32),
    Boolean(bool),
    Decimal(Decimal),
    Date(NaiveDate),
}

impl FieldValue {
    fn trimmed(self) -> Self {
        match self {
            FieldValue::Text(s) => FieldValue::Text(s.trim().to_string()),
            other => other,
        }
    }
}

/// Field name -> new value. A present `None` clears the column; a field
/// missing from the map is left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Patch {
    fields: HashMap<&'static str, Option<FieldValue>>,
}

impl Patch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, field: &'static str, value: FieldValue) -> &mut Self {
        self.fields.insert(field, Some(value));
        self
    }

    pub fn clear(&mut self, field: &'static str) -> &mut Self {
        self.fields.insert(field, None);
        self
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&Option<FieldValue>> {
        self.fields.get(field)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateQuery {
    pub assignments: Vec<String>,
    pub values: Vec<FieldValue>,
    /// First placeholder index not used by `assignments`.
    pub next_index: usize,
}

impl UpdateQuery {
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// `UPDATE <table> SET ... WHERE id = $N RETURNING *`, where `$N` is
    /// `next_index`. The id must be bound after `values`.
    pub fn to_sql(&self, table: &str, extra_assignments: &[&str]) -> String {
        let mut set: Vec<&str> = self.assignments.iter().map(String::as_str).collect();
        set.extend_from_slice(extra_assignments);
        format!(
            "UPDATE {table} SET {} WHERE id = ${} RETURNING *",
            set.join(", "),
            self.next_index
        )
    }
}

/// Builds assignments for every allowed field present in `patch`, in the
/// order of `allowed_fields`.
pub fn build(allowed_fields: &[&str], patch: &Patch, start_index: usize) -> UpdateQuery {
    let mut assignments = Vec::new();
    let mut values = Vec::new();
    let mut idx = start_index;

    for &field in allowed_fields {
        match patch.get(field) {
            None => continue,
            Some(None) => assignments.push(format!("{field} = NULL")),
            Some(Some(value)) => {
                assignments.push(format!("{field} = ${idx}"));
                values.push(value.clone().trimmed());
                idx += 1;
            }
        }
    }

    UpdateQuery { assignments, values, next_index: idx }
}

/// Binds builder values onto a query in placeholder order.
pub fn bind_values<'q, O>(
    mut query: QueryAs<'q, Postgres, O, PgArguments>,
    values: Vec<FieldValue>,
) -> QueryAs<'q, Postgres, O, PgArguments> {
    for value in values {
        query = match value {
            FieldValue::Text(v) => query.bind(v),
            FieldValue::Integer(v) => query.bind(v),
            FieldValue::Int4(v) => query.bind(v),
            FieldValue::Boolean(v) => query.bind(v),
            FieldValue::Decimal(v) => query.bind(v),
            FieldValue::Date(v) => query.bind(v),
        };
    }
    query
}
