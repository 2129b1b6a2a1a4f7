use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::ProxyError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionFile {
    pub name: String,
    pub content: String,
}

/// Payload forwarded verbatim to the execution engine. Language and version
/// are not validated here; the engine owns that contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRequest {
    pub language: String,
    pub version: String,
    pub files: Vec<ExecutionFile>,
}

/// Stateless pass-through to the external execution engine. No retries, no
/// caching; the shared client is only for connection pooling.
pub struct ExecutionProxy {
    client: reqwest::Client,
    engine_url: String,
}

impl ExecutionProxy {
    pub fn new(engine_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            engine_url: engine_url.to_string(),
        }
    }

    /// Forwards the request and relays the upstream payload unmodified.
    pub async fn execute(&self, request: &ExecutionRequest) -> Result<Bytes, ProxyError> {
        let response = self
            .client
            .post(&self.engine_url)
            .json(request)
            .send()
            .await
            .map_err(|e| ProxyError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| ProxyError::Transport(e.to_string()))?;

        if !status.is_success() {
            let detail = String::from_utf8_lossy(&body).trim().to_string();
            let detail = if detail.is_empty() {
                status.to_string()
            } else {
                detail
            };
            return Err(ProxyError::Upstream {
                status: status.as_u16(),
                detail,
            });
        }

        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_to_engine_wire_shape() {
        let request = ExecutionRequest {
            language: "python".into(),
            version: "3.10".into(),
            files: vec![ExecutionFile {
                name: "a.py".into(),
                content: "print(1)".into(),
            }],
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "language": "python",
                "version": "3.10",
                "files": [{ "name": "a.py", "content": "print(1)" }]
            })
        );
    }

    #[test]
    fn upstream_error_keeps_status_and_detail() {
        let err = ProxyError::Upstream {
            status: 503,
            detail: "engine overloaded".into(),
        };
        let message = err.to_string();
        assert!(message.contains("503"));
        assert!(message.contains("engine overloaded"));
    }
}
