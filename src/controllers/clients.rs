use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use std::sync::Arc;
use validator::Validate;

use super::{AppJson, AppPath};
use crate::error::{AppError, AppResult};
use crate::models::{Client, CreateClient, UpdateClient};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/clients", get(list_clients).post(create_client))
        .route(
            "/clients/{id}",
            get(get_client).put(update_client).delete(delete_client),
        )
}

// GET /clients
async fn list_clients(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<Client>>> {
    Ok(Json(Client::list(&state.db.pool).await?))
}

// GET /clients/:id
async fn get_client(
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<Client>> {
    Client::find(&state.db.pool, id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Client"))
}

// POST /clients
async fn create_client(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<CreateClient>,
) -> AppResult<(StatusCode, Json<Client>)> {
    let req = req.normalized();
    req.validate()?;

    let client = Client::create(&state.db.pool, &req).await?;
    tracing::info!(client_id = client.id, "client created");
    Ok((StatusCode::CREATED, Json(client)))
}

// PUT /clients/:id
async fn update_client(
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<i64>,
    AppJson(req): AppJson<UpdateClient>,
) -> AppResult<Json<Client>> {
    let patch = req.into_patch()?;
    Client::update(&state.db.pool, id, &patch)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Client"))
}

// DELETE /clients/:id
async fn delete_client(
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<i64>,
) -> AppResult<StatusCode> {
    let deleted = Client::delete(&state.db.pool, id).await?;
    tracing::debug!(client_id = id, deleted, "client delete");
    Ok(StatusCode::NO_CONTENT)
}
