use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::FromRow;

use crate::error::Failure;
use crate::gateway::AppState;

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct FileRecord {
    pub id: i64,
    pub name: String,
    pub language: String,
    pub content: String,
    pub owner: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct SaveFileRequest {
    pub name: String,
    pub language: String,
    pub content: String,
    pub owner: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateFileRequest {
    pub content: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(handle_list).post(handle_save))
        .route(
            "/:id",
            get(handle_get).put(handle_update).delete(handle_delete),
        )
}

async fn handle_save(
    State(state): State<AppState>,
    Json(req): Json<SaveFileRequest>,
) -> Result<impl IntoResponse, Failure> {
    let pool = state
        .store
        .ensure_ready()
        .await
        .map_err(|e| state.failure(e))?;

    let file = sqlx::query_as::<_, FileRecord>(
        r#"
        INSERT INTO files (name, language, content, owner)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(&req.name)
    .bind(&req.language)
    .bind(&req.content)
    .bind(&req.owner)
    .fetch_one(pool)
    .await
    .map_err(|e| state.failure(e))?;

    Ok((StatusCode::CREATED, Json(file)))
}

async fn handle_list(State(state): State<AppState>) -> Result<impl IntoResponse, Failure> {
    let pool = state
        .store
        .ensure_ready()
        .await
        .map_err(|e| state.failure(e))?;

    let files =
        sqlx::query_as::<_, FileRecord>("SELECT * FROM files ORDER BY updated_at DESC")
            .fetch_all(pool)
            .await
            .map_err(|e| state.failure(e))?;

    Ok(Json(files))
}

async fn handle_get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, Failure> {
    let pool = state
        .store
        .ensure_ready()
        .await
        .map_err(|e| state.failure(e))?;

    let file = sqlx::query_as::<_, FileRecord>("SELECT * FROM files WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| state.failure(e))?;

    match file {
        Some(file) => Ok(Json(file)),
        None => Err(state.not_found(format!("file {} not found", id))),
    }
}

async fn handle_update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateFileRequest>,
) -> Result<impl IntoResponse, Failure> {
    let pool = state
        .store
        .ensure_ready()
        .await
        .map_err(|e| state.failure(e))?;

    let file = sqlx::query_as::<_, FileRecord>(
        r#"
        UPDATE files
        SET content = $2, updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(&req.content)
    .fetch_optional(pool)
    .await
    .map_err(|e| state.failure(e))?;

    match file {
        Some(file) => Ok(Json(file)),
        None => Err(state.not_found(format!("file {} not found", id))),
    }
}

async fn handle_delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, Failure> {
    let pool = state
        .store
        .ensure_ready()
        .await
        .map_err(|e| state.failure(e))?;

    let result = sqlx::query("DELETE FROM files WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| state.failure(e))?;

    if result.rows_affected() == 0 {
        return Err(state.not_found(format!("file {} not found", id)));
    }

    Ok(Json(json!({ "success": true })))
}
