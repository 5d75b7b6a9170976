pub mod booking;
pub mod client;
pub mod patch;
pub mod room;

pub use booking::{Booking, CreateBooking, UpdateBooking};
pub use client::{Client, CreateClient, UpdateClient};
pub use room::{CreateRoom, Room, UpdateRoom};

use sqlx::{postgres::PgRow, FromRow, PgExecutor};

use crate::error::{AppError, AppResult};
use crate::services::update_builder::{self, Patch};

/// Runs a builder-generated `UPDATE <table> ... WHERE id = $N RETURNING *`.
/// `Ok(None)` when no row has that id.
pub(crate) async fn update_by_id<'c, T, E>(
    executor: E,
    table: &str,
    allowed_fields: &[&str],
    patch: &Patch,
    extra_assignments: &[&str],
    id: i64,
) -> AppResult<Option<T>>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    E: PgExecutor<'c>,
{
    let query = update_builder::build(allowed_fields, patch, 1);
    if query.is_empty() {
        return Err(AppError::Validation("No fields to update".to_string()));
    }

    let sql = query.to_sql(table, extra_assignments);
    tracing::debug!(%sql, "partial update");

    let row = update_builder::bind_values(sqlx::query_as::<_, T>(&sql), query.values)
        .bind(id)
        .fetch_optional(executor)
        .await?;
    Ok(row)
}
