use crate::config::ConfigError;
use crate::llm::LlmError;
use crate::market::DataSourceError;
use crate::telemetry::TelemetryError;
use crate::workflows::fundamental::AnalysisError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Model(LlmError),
    Analysis(AnalysisError),
    DataSource(DataSourceError),
    BadRequest(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Model(err) => write!(f, "model client error: {}", err),
            AppError::Analysis(err) => write!(f, "{}", err),
            AppError::DataSource(err) => write!(f, "{}", err),
            AppError::BadRequest(message) => f.write_str(message),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Model(err) => Some(err),
            AppError::Analysis(err) => Some(err),
            AppError::DataSource(err) => Some(err),
            AppError::BadRequest(_) => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Analysis(AnalysisError::NotCached { .. }) => StatusCode::NOT_FOUND,
            AppError::Analysis(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::DataSource(DataSourceError::UnknownCode { .. }) => StatusCode::NOT_FOUND,
            AppError::DataSource(DataSourceError::InvalidCode { .. }) => StatusCode::BAD_REQUEST,
            AppError::DataSource(_) => StatusCode::BAD_GATEWAY,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_)
            | AppError::Model(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        error_response(status, self.to_string())
    }
}

/// `{ "success": false, "error": ... }` with the given status.
pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    let body = Json(json!({ "success": false, "error": message.into() }));
    (status, body).into_response()
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<LlmError> for AppError {
    fn from(value: LlmError) -> Self {
        Self::Model(value)
    }
}

impl From<AnalysisError> for AppError {
    fn from(value: AnalysisError) -> Self {
        Self::Analysis(value)
    }
}

impl From<DataSourceError> for AppError {
    fn from(value: DataSourceError) -> Self {
        Self::DataSource(value)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(format!("请求体无效: {}", rejection.body_text()))
    }
}
