use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("upstream {status} unavailable: {message}")]
    UpstreamUnavailable { status: u16, message: String },

    #[error("upstream request timed out")]
    NetworkTimeout,

    #[error("missing configuration: {0}")]
    ConfigurationMissing(&'static str),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::UpstreamUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            AppError::NetworkTimeout => StatusCode::GATEWAY_TIMEOUT,
            AppError::ConfigurationMissing(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The sentence shown to API clients. Upstream bodies never leak through here.
    pub fn public_message(&self) -> String {
        match self {
            AppError::UpstreamUnavailable { .. } => {
                "The marketplace service is currently unavailable. Please try again later."
                    .to_string()
            }
            AppError::NetworkTimeout => {
                "The marketplace took too long to respond. Please try again.".to_string()
            }
            AppError::ConfigurationMissing(key) => {
                format!("Marketplace API is not configured: {key} is missing.")
            }
            AppError::BadRequest(msg) => msg.clone(),
            AppError::Internal(_) => "Something went wrong while processing the search.".to_string(),
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            return AppError::NetworkTimeout;
        }
        // connection refused, DNS or a broken body count as the remote being down
        AppError::UpstreamUnavailable {
            status: e.status().map(|s| s.as_u16()).unwrap_or(0),
            message: e.to_string(),
        }
    }
}

impl From<rust_xlsxwriter::XlsxError> for AppError {
    fn from(e: rust_xlsxwriter::XlsxError) -> Self {
        AppError::Internal(format!("workbook: {e}"))
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::warn!(error = %self, "request rejected");
        }
        let body = ErrorBody {
            success: false,
            error: self.public_message(),
        };
        (status, Json(body)).into_response()
    }
}
