use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Message shown for every failed login, whatever the cause.
pub const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Message shown when the advice provider fails.
pub const ADVICE_UNAVAILABLE: &str = "Failed to get financial advice";

#[derive(Debug, Error)]
pub enum Error {
    // Auth Errors
    #[error("{}", INVALID_CREDENTIALS)]
    InvalidCredentials,
    #[error("no auth token found")]
    AuthFailNoToken,
    #[error("auth token wrong format")]
    AuthFailTokenWrongFormat,
    #[error("auth token invalid or expired")]
    AuthFailInvalidToken,
    #[error("auth context missing")]
    AuthFailCtxNotInRequestExt,

    // Model Errors
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    NotFound(String),

    // Upstream
    #[error("advice provider unavailable: {0}")]
    UpstreamUnavailable(String),

    // Generic
    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = core::result::Result<T, Error>;

impl Error {
    pub fn status(&self) -> StatusCode {
        match self {
            Error::InvalidCredentials | Error::Validation(_) | Error::Conflict(_) => {
                StatusCode::BAD_REQUEST
            }
            Error::AuthFailNoToken | Error::AuthFailTokenWrongFormat | Error::AuthFailInvalidToken => {
                StatusCode::UNAUTHORIZED
            }
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
            Error::AuthFailCtxNotInRequestExt | Error::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Text safe to hand back to a client.
    pub fn client_message(&self) -> String {
        match self {
            Error::AuthFailNoToken => "No auth token found".to_string(),
            Error::AuthFailTokenWrongFormat => "Auth token wrong format".to_string(),
            Error::AuthFailInvalidToken => "Token is not valid".to_string(),
            Error::AuthFailCtxNotInRequestExt | Error::Internal(_) => "Server error".to_string(),
            Error::UpstreamUnavailable(_) => ADVICE_UNAVAILABLE.to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("{}", self);
        }

        let body = Json(json!({ "message": self.client_message() }));

        (status, body).into_response()
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Internal(err.to_string())
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Error::Internal(format!("database: {}", err))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Internal(format!("io: {}", err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Internal(format!("json: {}", err))
    }
}

impl From<bcrypt::BcryptError> for Error {
    fn from(err: bcrypt::BcryptError) -> Self {
        Error::Internal(format!("password hashing: {}", err))
    }
}

impl From<crate::core::auth::token::TokenError> for Error {
    fn from(err: crate::core::auth::token::TokenError) -> Self {
        use crate::core::auth::token::TokenError;
        match err {
            TokenError::Sign(e) => Error::Internal(format!("token signing: {}", e)),
            TokenError::Invalid(_) | TokenError::Expired => Error::AuthFailInvalidToken,
        }
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Error::Internal(format!("blocking task: {}", err))
    }
}
