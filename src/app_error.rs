use std::sync::OnceLock;

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::{config::Environment, domain::DomainError};

static HIDE_INTERNAL_ERRORS: OnceLock<bool> = OnceLock::new();

/// Decides once per process whether 500 responses carry the error chain.
///
/// Until this is called internal errors are hidden.
pub fn init(environment: Environment) {
    let _ = HIDE_INTERNAL_ERRORS.set(environment == Environment::Production);
}

fn hide_internal_errors() -> bool {
    HIDE_INTERNAL_ERRORS.get().copied().unwrap_or(true)
}

/// Standard response envelope shared by every endpoint.
#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct StdResponse<T, M> {
    pub data: Option<T>,
    pub message: Option<M>,
}

impl<T, M> IntoResponse for StdResponse<T, M>
where
    T: Serialize,
    M: Serialize,
{
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    ForbiddenResource(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::ForbiddenResource(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(message) => Self::BadRequest(message),
            DomainError::NotFound(what) => Self::NotFound(format!("{what} not found")),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = match &self {
            Self::Other(err) => {
                tracing::error!(error = ?err, "Request failed");
                if hide_internal_errors() {
                    "Internal server error".to_string()
                } else {
                    format!("{err:#}")
                }
            }
            other => other.to_string(),
        };

        let body = StdResponse::<(), String> {
            data: None,
            message: Some(message),
        };

        (status, Json(body)).into_response()
    }
}
