use axum::extract::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;
use std::string::FromUtf8Error;
use thiserror::Error;

#[derive(Debug, Serialize, Error)]
#[serde(tag = "error", content = "details", rename_all = "snake_case")]
pub enum MetricsError {
    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Label error: {0}")]
    Label(String),
}

impl From<FromUtf8Error> for MetricsError {
    fn from(error: FromUtf8Error) -> Self {
        Self::Encoding(format!("Exposition is not valid UTF-8: {error}"))
    }
}

#[derive(Debug, Error, Serialize)]
#[serde(tag = "error", content = "details", rename_all = "snake_case")]
pub enum MetricsHandlerError {
    #[error("Cannot encode metrics: {0}")]
    Encoding(String),
}

impl From<MetricsError> for MetricsHandlerError {
    fn from(error: MetricsError) -> Self {
        Self::Encoding(error.to_string())
    }
}

impl IntoResponse for MetricsHandlerError {
    fn into_response(self) -> axum::response::Response {
        let status_code = match self {
            Self::Encoding(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status_code, Json(self)).into_response()
    }
}
