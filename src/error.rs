use miette::{Diagnostic, Result};
use thiserror::Error;

/// Main error type for the application
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("Environment error: {0}")]
    #[diagnostic(code(kalenda::environment))]
    Environment(String),

    #[error("Configuration error: {0}")]
    #[diagnostic(code(kalenda::config))]
    Config(String),

    #[error("Chat API error: {0}")]
    #[diagnostic(code(kalenda::chat_api))]
    ChatApi(String),

    #[error("Map API error: {0}")]
    #[diagnostic(code(kalenda::map_api))]
    MapApi(String),

    #[error("Event store error: {0}")]
    #[diagnostic(code(kalenda::store))]
    Store(String),

    #[error(transparent)]
    #[diagnostic(code(kalenda::io))]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(kalenda::serialization))]
    Serialization(String),

    #[error("Other error: {0}")]
    #[diagnostic(code(kalenda::other))]
    Other(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Type alias for Result with our Error type
pub type AppResult<T> = Result<T, Error>;

/// Helper to create environment errors
pub fn env_error(var: &str) -> Error {
    Error::Environment(format!("Missing environment variable: {}", var))
}

/// Helper to create configuration errors
#[allow(dead_code)]
pub fn config_error(message: &str) -> Error {
    Error::Config(message.to_string())
}

/// Helper to create chat API errors
pub fn chat_api_error(message: &str) -> Error {
    Error::ChatApi(message.to_string())
}

/// Helper to create map API errors
pub fn map_api_error(message: &str) -> Error {
    Error::MapApi(message.to_string())
}

/// Helper to create event store errors
pub fn store_error(message: &str) -> Error {
    Error::Store(message.to_string())
}

/// Classification of a failed upstream call.
///
/// Every kind maps to exactly one HTTP status and one localized message,
/// so the proxy's error taxonomy is testable without the network layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamErrorKind {
    /// The upstream answered with a non-success HTTP status
    Status(u16),
    /// The per-attempt timeout elapsed before a response arrived
    TimedOut,
    /// Connection refused or host not found
    Unreachable,
    /// Any other transport failure
    Other,
}

impl UpstreamErrorKind {
    /// Classify a reqwest transport error
    pub fn classify(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            UpstreamErrorKind::TimedOut
        } else if err.is_connect() {
            UpstreamErrorKind::Unreachable
        } else if let Some(status) = err.status() {
            UpstreamErrorKind::Status(status.as_u16())
        } else {
            UpstreamErrorKind::Other
        }
    }

    /// HTTP status code reported to the client
    pub fn status(&self) -> u16 {
        match self {
            UpstreamErrorKind::Status(status) => *status,
            UpstreamErrorKind::TimedOut => 504,
            UpstreamErrorKind::Unreachable => 503,
            UpstreamErrorKind::Other => 500,
        }
    }

    /// Localized user-facing message for this kind
    pub fn message(&self) -> String {
        match self {
            UpstreamErrorKind::Status(502) => t!("proxy.upstream_unavailable"),
            UpstreamErrorKind::Status(429) => t!("proxy.rate_limited"),
            UpstreamErrorKind::Status(401) => t!("proxy.invalid_credential"),
            UpstreamErrorKind::Status(403) => t!("proxy.forbidden"),
            UpstreamErrorKind::Status(_) => t!("proxy.upstream_failed"),
            UpstreamErrorKind::TimedOut => t!("proxy.timed_out"),
            UpstreamErrorKind::Unreachable => t!("proxy.unreachable"),
            UpstreamErrorKind::Other => t!("proxy.internal_error"),
        }
        .into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_is_total() {
        assert_eq!(UpstreamErrorKind::Status(502).status(), 502);
        assert_eq!(UpstreamErrorKind::Status(429).status(), 429);
        assert_eq!(UpstreamErrorKind::Status(418).status(), 418);
        assert_eq!(UpstreamErrorKind::TimedOut.status(), 504);
        assert_eq!(UpstreamErrorKind::Unreachable.status(), 503);
        assert_eq!(UpstreamErrorKind::Other.status(), 500);
    }

    #[test]
    fn known_statuses_get_specific_messages() {
        rust_i18n::set_locale("en");
        let generic = UpstreamErrorKind::Status(500).message();
        for kind in [
            UpstreamErrorKind::Status(502),
            UpstreamErrorKind::Status(429),
            UpstreamErrorKind::Status(401),
            UpstreamErrorKind::Status(403),
        ] {
            assert_ne!(kind.message(), generic, "{:?}", kind);
        }
        // Unknown statuses fall back to the generic message
        assert_eq!(UpstreamErrorKind::Status(418).message(), generic);
    }
}
