use crate::config::Config;
use crate::error::UpstreamErrorKind;
use crate::server::AppState;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use reqwest::header::AUTHORIZATION;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, warn};

/// Maximum upstream attempts per inbound request
pub const MAX_ATTEMPTS: u32 = 3;

/// Fixed delay between consecutive attempts, no backoff, no jitter
pub const RETRY_DELAY: Duration = Duration::from_secs(1);

/// One failed upstream attempt
enum AttemptError {
    /// The upstream answered with a non-success status; body kept for diagnostics
    Upstream { status: u16, details: Value },
    /// The request never produced a response
    Transport(reqwest::Error),
}

/// Relay to the upstream chat-completion endpoint with bounded retry.
///
/// Stateless between invocations; the upstream URL is injected so tests can
/// point it at a local listener.
pub struct ChatProxy {
    client: reqwest::Client,
    upstream_url: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl ChatProxy {
    pub fn new(config: &Config, client: reqwest::Client) -> Self {
        Self::with_upstream(
            client,
            config.chat_api_url.clone(),
            config.chat_api_key.clone(),
            Duration::from_secs(config.chat_timeout_secs),
        )
    }

    pub fn with_upstream(
        client: reqwest::Client,
        upstream_url: String,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Self {
        ChatProxy {
            client,
            upstream_url,
            api_key,
            timeout,
        }
    }

    /// Forward a chat-completion payload upstream.
    ///
    /// Issues at most [`MAX_ATTEMPTS`] attempts with [`RETRY_DELAY`] between
    /// them; both transport failures and upstream error statuses count as
    /// failed attempts. Returns the response status and JSON body to hand
    /// back to the client.
    pub async fn forward(&self, payload: &Value) -> (StatusCode, Value) {
        let Some(api_key) = &self.api_key else {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({
                    "error": t!("proxy.missing_chat_key"),
                    "code": "missing_api_key",
                }),
            );
        };

        let mut last_error = None;
        for attempt in 1..=MAX_ATTEMPTS {
            if attempt > 1 {
                sleep(RETRY_DELAY).await;
            }

            match self.attempt(api_key, payload).await {
                Ok(body) => return (StatusCode::OK, body),
                Err(err) => {
                    match &err {
                        AttemptError::Upstream { status, .. } => {
                            warn!(
                                "Chat upstream attempt {}/{} failed with HTTP {}",
                                attempt, MAX_ATTEMPTS, status
                            );
                        }
                        AttemptError::Transport(e) => {
                            warn!(
                                "Chat upstream attempt {}/{} failed: {}",
                                attempt, MAX_ATTEMPTS, e
                            );
                        }
                    }
                    last_error = Some(err);
                }
            }
        }

        // All attempts exhausted; last_error is always set here
        match last_error {
            Some(AttemptError::Upstream { status, details }) => {
                let kind = UpstreamErrorKind::Status(status);
                error!("Chat upstream kept failing with HTTP {}", status);
                (
                    StatusCode::from_u16(kind.status())
                        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                    json!({
                        "error": kind.message(),
                        "status": status,
                        "details": details,
                    }),
                )
            }
            Some(AttemptError::Transport(e)) => {
                let kind = UpstreamErrorKind::classify(&e);
                error!("Chat upstream unreachable: {}", e);
                let body = match kind {
                    UpstreamErrorKind::TimedOut => json!({
                        "error": kind.message(),
                        "message": t!("proxy.timed_out_detail"),
                    }),
                    UpstreamErrorKind::Unreachable => json!({
                        "error": kind.message(),
                        "message": t!("proxy.unreachable_detail"),
                    }),
                    _ => json!({
                        "error": kind.message(),
                        "message": e.to_string(),
                    }),
                };
                (
                    StatusCode::from_u16(kind.status())
                        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                    body,
                )
            }
            None => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": t!("proxy.internal_error") }),
            ),
        }
    }

    async fn attempt(&self, api_key: &str, payload: &Value) -> Result<Value, AttemptError> {
        let response = self
            .client
            .post(&self.upstream_url)
            .header(AUTHORIZATION, format!("Bearer {}", api_key))
            .json(payload)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(AttemptError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let details = match response.text().await {
                Ok(text) => serde_json::from_str(&text).unwrap_or(Value::String(text)),
                Err(_) => Value::Null,
            };
            return Err(AttemptError::Upstream {
                status: status.as_u16(),
                details,
            });
        }

        response.json::<Value>().await.map_err(AttemptError::Transport)
    }
}

/// `POST /api/chat`: validate the inbound payload, then relay it upstream
pub async fn chat_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    let payload: Value = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": t!("proxy.invalid_body"),
                    "details": e.to_string(),
                })),
            );
        }
    };

    let (status, body) = state.chat_proxy.forward(&payload).await;
    (status, Json(body))
}

/// Answer for any method other than POST on the chat route
pub async fn method_not_allowed() -> (StatusCode, Json<Value>) {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({ "error": t!("proxy.method_not_allowed") })),
    )
}
