use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use thiserror::Error;

use crate::script::ScriptError;

pub type AreasResult<T> = Result<T, AreasError>;

#[derive(Debug, Error)]
pub enum AreasError {
    #[error("Missing required environment variable {0}")]
    MissingEnv(&'static str),

    #[error("Invalid value {value:?} for {name}: {reason}")]
    InvalidEnv {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Failed to get data from external API: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to get data from external API (status {0})")]
    Upstream(u16),

    #[error("Rate limit reached")]
    RateLimited,

    #[error("Invalid request: {0}")]
    Rejection(String),

    #[error("Script error: {0}")]
    Script(#[from] ScriptError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AreasError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingEnv(_) | Self::InvalidEnv { .. } | Self::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Http(_)
            | Self::Upstream(_)
            | Self::RateLimited
            | Self::Rejection(_)
            | Self::Script(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<PathRejection> for AreasError {
    fn from(rejection: PathRejection) -> Self {
        Self::Rejection(rejection.body_text())
    }
}

impl From<JsonRejection> for AreasError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Rejection(rejection.body_text())
    }
}

impl IntoResponse for AreasError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, "request rejected");
        }
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}
