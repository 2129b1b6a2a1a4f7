use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::config::Mode;

/// What production callers see instead of internal error detail.
pub const GENERIC_FAILURE: &str = "Something went wrong!";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to connect to backing store: {0}")]
    Connect(String),
}

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("execution engine request failed: {0}")]
    Transport(String),
    #[error("execution engine returned status {status}: {detail}")]
    Upstream { status: u16, detail: String },
}

/// Centralized failure envelope. Every handler error funnels through here so
/// the `{success, message}` shape and the mode gate stay in one place.
#[derive(Debug)]
pub struct Failure {
    status: StatusCode,
    detail: String,
    mode: Mode,
}

impl Failure {
    pub fn internal(mode: Mode, detail: impl ToString) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            detail: detail.to_string(),
            mode,
        }
    }

    pub fn not_found(mode: Mode, detail: impl ToString) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            detail: detail.to_string(),
            mode,
        }
    }
}

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!("request failed: {}", self.detail);
        }
        let message = if self.status.is_server_error() && self.mode == Mode::Production {
            GENERIC_FAILURE.to_string()
        } else {
            self.detail
        };
        (
            self.status,
            Json(json!({ "success": false, "message": message })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn development_envelope_carries_detail() {
        let response = Failure::internal(Mode::Development, "pool refused").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "pool refused");
    }

    #[tokio::test]
    async fn production_envelope_hides_detail() {
        let response = Failure::internal(Mode::Production, "pool refused").into_response();
        let body = body_json(response).await;
        assert_eq!(body["message"], GENERIC_FAILURE);
    }

    #[tokio::test]
    async fn not_found_is_not_mode_gated() {
        let response = Failure::not_found(Mode::Production, "file 42 not found").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["message"], "file 42 not found");
    }
}
