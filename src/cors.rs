use axum::extract::{Request, State};
use axum::http::header::{self, HeaderValue};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::gateway::AppState;

pub const POLICY_VIOLATION_MESSAGE: &str =
    "The CORS policy for this site does not allow access from the specified origin.";

pub const ALLOWED_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";
pub const ALLOWED_HEADERS: &str =
    "Content-Type, Authorization, X-Requested-With, Accept, Origin";

/// Origins that are always allowed so local frontends work without config.
const DEV_ORIGINS: [&str; 4] = [
    "http://localhost:3000",
    "http://localhost:5173",
    "http://127.0.0.1:5173",
    "http://127.0.0.1:3000",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(&'static str),
}

/// Immutable allow-list, assembled once at startup.
#[derive(Debug, Clone)]
pub struct OriginPolicy {
    allowed: Vec<String>,
}

impl OriginPolicy {
    pub fn new(frontend_url: Option<&str>) -> Self {
        let mut allowed = Vec::with_capacity(DEV_ORIGINS.len() + 1);
        if let Some(url) = frontend_url {
            let url = url.trim_end_matches('/');
            if !url.is_empty() {
                allowed.push(url.to_string());
            }
        }
        allowed.extend(DEV_ORIGINS.iter().map(|origin| origin.to_string()));
        Self { allowed }
    }

    /// Absent origin means a non-browser client; those are always allowed.
    pub fn evaluate(&self, origin: Option<&str>) -> Decision {
        match origin {
            None => Decision::Allow,
            Some(origin) if self.allowed.iter().any(|entry| entry == origin) => Decision::Allow,
            Some(_) => Decision::Deny(POLICY_VIOLATION_MESSAGE),
        }
    }
}

/// CORS middleware: runs before routing for every request. Denies disallowed
/// origins, answers pre-flight requests terminally for any path, and echoes
/// the origin back on allowed responses.
pub async fn enforce(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let origin = req
        .headers()
        .get(header::ORIGIN)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    if let Decision::Deny(reason) = state.policy.evaluate(origin.as_deref()) {
        tracing::warn!(
            "Rejected cross-origin request from {}",
            origin.as_deref().unwrap_or("<unknown>")
        );
        return (
            StatusCode::FORBIDDEN,
            Json(json!({ "success": false, "message": reason })),
        )
            .into_response();
    }

    if req.method() == Method::OPTIONS {
        return preflight_response(origin.as_deref());
    }

    let mut response = next.run(req).await;
    if let Some(origin) = origin {
        apply_allow_headers(response.headers_mut(), &origin);
    }
    response
}

fn preflight_response(origin: Option<&str>) -> Response {
    let mut response = StatusCode::NO_CONTENT.into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOWED_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOWED_HEADERS),
    );
    if let Some(origin) = origin {
        apply_allow_headers(headers, origin);
    }
    response
}

fn apply_allow_headers(headers: &mut HeaderMap, origin: &str) {
    if let Ok(value) = HeaderValue::from_str(origin) {
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, value);
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
            HeaderValue::from_static("true"),
        );
        headers.append(header::VARY, HeaderValue::from_static("Origin"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_origin_is_allowed() {
        let policy = OriginPolicy::new(None);
        assert_eq!(policy.evaluate(None), Decision::Allow);
    }

    #[test]
    fn configured_frontend_origin_is_allowed() {
        let policy = OriginPolicy::new(Some("https://codeboard.example"));
        assert_eq!(
            policy.evaluate(Some("https://codeboard.example")),
            Decision::Allow
        );
    }

    #[test]
    fn frontend_origin_trailing_slash_is_normalized() {
        let policy = OriginPolicy::new(Some("https://codeboard.example/"));
        assert_eq!(
            policy.evaluate(Some("https://codeboard.example")),
            Decision::Allow
        );
    }

    #[test]
    fn development_defaults_are_always_present() {
        let policy = OriginPolicy::new(None);
        assert_eq!(policy.evaluate(Some("http://localhost:5173")), Decision::Allow);
        assert_eq!(policy.evaluate(Some("http://127.0.0.1:3000")), Decision::Allow);
    }

    #[test]
    fn unlisted_origin_is_denied_with_fixed_reason() {
        let policy = OriginPolicy::new(Some("https://codeboard.example"));
        assert_eq!(
            policy.evaluate(Some("https://evil.example")),
            Decision::Deny(POLICY_VIOLATION_MESSAGE)
        );
    }
}
