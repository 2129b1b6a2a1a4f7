use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::Failure;
use crate::gateway::AppState;

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterUserRequest {
    pub username: String,
    pub email: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(handle_register))
        .route("/", get(handle_list))
        .route("/:username", get(handle_get))
}

async fn handle_register(
    State(state): State<AppState>,
    Json(req): Json<RegisterUserRequest>,
) -> Result<impl IntoResponse, Failure> {
    let pool = state
        .store
        .ensure_ready()
        .await
        .map_err(|e| state.failure(e))?;

    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (username, email)
        VALUES ($1, $2)
        RETURNING *
        "#,
    )
    .bind(&req.username)
    .bind(&req.email)
    .fetch_one(pool)
    .await
    .map_err(|e| state.failure(e))?;

    Ok((StatusCode::CREATED, Json(user)))
}

async fn handle_list(State(state): State<AppState>) -> Result<impl IntoResponse, Failure> {
    let pool = state
        .store
        .ensure_ready()
        .await
        .map_err(|e| state.failure(e))?;

    let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at DESC")
        .fetch_all(pool)
        .await
        .map_err(|e| state.failure(e))?;

    Ok(Json(users))
}

async fn handle_get(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, Failure> {
    let pool = state
        .store
        .ensure_ready()
        .await
        .map_err(|e| state.failure(e))?;

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
        .bind(&username)
        .fetch_optional(pool)
        .await
        .map_err(|e| state.failure(e))?;

    match user {
        Some(user) => Ok(Json(user)),
        None => Err(state.not_found(format!("user `{}` not found", username))),
    }
}
