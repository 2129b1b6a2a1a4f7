use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{header, Method, StatusCode};
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tower::ServiceExt;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::cors::{self, OriginPolicy};
use crate::db::ConnectionManager;
use crate::error::Failure;
use crate::execute::{ExecutionProxy, ExecutionRequest};
use crate::{files, users};

/// Terminal diagnostic routes. These never touch the backing store, so the
/// one-shot adapter skips the readiness precondition for them.
const DIAGNOSTIC_PATHS: [&str; 3] = ["/health", "/", "/favicon.ico"];

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: Arc<ConnectionManager>,
    pub policy: Arc<OriginPolicy>,
    pub proxy: Arc<ExecutionProxy>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let store = Arc::new(ConnectionManager::new(&config.database_url));
        let policy = Arc::new(OriginPolicy::new(config.frontend_url.as_deref()));
        let proxy = Arc::new(ExecutionProxy::new(&config.engine_url));
        Self {
            config,
            store,
            policy,
            proxy,
        }
    }

    pub fn failure(&self, err: impl ToString) -> Failure {
        Failure::internal(self.config.mode, err)
    }

    pub fn not_found(&self, detail: impl ToString) -> Failure {
        Failure::not_found(self.config.mode, detail)
    }
}

/// The single request pipeline both invocation shapes share. Middleware order:
/// trace, CORS guard, route dispatch, static assets as the fallback.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1/user", users::router())
        .nest("/api/v1/file", files::router())
        .route("/api/run", post(handle_run))
        .route("/health", get(handle_health))
        .route("/favicon.ico", get(handle_favicon))
        .route("/", get(handle_root))
        .fallback_service(ServeDir::new(&state.config.static_dir))
        .layer(middleware::from_fn_with_state(state.clone(), cors::enforce))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Continuous-listener shape: bind once, keep the pipeline resident.
pub async fn serve(state: AppState) -> anyhow::Result<()> {
    if let Err(err) = state.store.ensure_ready().await {
        // Not fatal: requests retry through the connection manager.
        tracing::error!("Backing store connection failed at startup: {}", err);
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], state.config.port));
    let app = build_router(state);

    tracing::info!("codeboard-api listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// One-shot shape: a handler-per-call adapter over the same pipeline, for
/// hosts that give no guarantee the process outlives a single request.
#[derive(Clone)]
pub struct Gateway {
    router: Router,
    state: AppState,
}

impl Gateway {
    pub fn new(state: AppState) -> Self {
        let router = build_router(state.clone());
        Self { router, state }
    }

    /// Ensures the backing-store precondition, then delegates to the pipeline.
    /// Diagnostic routes and pre-flight requests skip the precondition: both
    /// terminate before anything store-backed runs.
    pub async fn handle(&self, request: Request) -> Response {
        if request.method() != Method::OPTIONS
            && !DIAGNOSTIC_PATHS.contains(&request.uri().path())
        {
            if let Err(err) = self.state.store.ensure_ready().await {
                return self.state.failure(err).into_response();
            }
        }

        match self.router.clone().oneshot(request).await {
            Ok(response) => response,
            Err(infallible) => match infallible {},
        }
    }
}

async fn handle_run(
    State(state): State<AppState>,
    Json(request): Json<ExecutionRequest>,
) -> Response {
    match state.proxy.execute(&request).await {
        Ok(payload) => (
            [(header::CONTENT_TYPE, "application/json")],
            payload,
        )
            .into_response(),
        Err(err) => {
            tracing::error!("Execution proxy failed: {}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": err.to_string() })),
            )
                .into_response()
        }
    }
}

async fn handle_health(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({ "status": "ok", "environment": state.config.mode.as_str() }))
}

async fn handle_favicon() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn handle_root() -> &'static str {
    "API is running"
}
