use reqwest::StatusCode;
use thiserror::Error;

/// Failures that end a run before MoCA could be enabled
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("missing environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("invalid gateway url {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("failed to acquire authorization tokens: login returned {0}")]
    AuthorizationFailed(StatusCode),

    #[error(
        "failed to locate csrfp_token from client cookies. ensure valid credentials were used"
    )]
    MissingCsrfToken,

    #[error("received invalid status response from gateway: {0}")]
    MalformedStatus(String),
}
