//! HTTP error mapping for the operations boundary.
//!
//! Absent records map to 404, rejected input and exhausted backup
//! candidates to 400, state conflicts to 409, and store or partial
//! activation failures to 500.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use charterops_monitor::MonitorError;
use charterops_rules::{ActivationError, DetectorError, DutyError};
use charterops_storage::StoreError;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest { message: String, errors: Vec<String> },
    Conflict(String),
    Internal(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest {
            message: message.into(),
            errors: Vec::new(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::NotFound(message) => ErrorBody {
                code: "NOT_FOUND",
                message,
                errors: Vec::new(),
            },
            ApiError::BadRequest { message, errors } => ErrorBody {
                code: "BAD_REQUEST",
                message,
                errors,
            },
            ApiError::Conflict(message) => ErrorBody {
                code: "CONFLICT",
                message,
                errors: Vec::new(),
            },
            ApiError::Internal(message) => {
                tracing::error!(error = %message, "request failed");
                ErrorBody {
                    code: "INTERNAL_ERROR",
                    message,
                    errors: Vec::new(),
                }
            }
        };
        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        if err.is_not_found() {
            ApiError::NotFound(err.to_string())
        } else {
            ApiError::Internal(err.to_string())
        }
    }
}

impl From<DutyError> for ApiError {
    fn from(err: DutyError) -> Self {
        match err {
            DutyError::CrewNotFound(_) => ApiError::NotFound(err.to_string()),
            DutyError::Validation(_) => ApiError::bad_request(err.to_string()),
            DutyError::AlreadyResting(_) | DutyError::NotResting(_) => {
                ApiError::Conflict(err.to_string())
            }
            DutyError::Store(e) => e.into(),
        }
    }
}

impl From<DetectorError> for ApiError {
    fn from(err: DetectorError) -> Self {
        match err {
            DetectorError::FlightNotFound(_) => ApiError::NotFound(err.to_string()),
            DetectorError::Store(e) => e.into(),
        }
    }
}

impl From<ActivationError> for ApiError {
    fn from(err: ActivationError) -> Self {
        match err {
            ActivationError::FlightNotFound(_) | ActivationError::PlanNotFound(_) => {
                ApiError::NotFound(err.to_string())
            }
            ActivationError::InvalidPlan(_) | ActivationError::NoAvailablePlans => {
                ApiError::bad_request(err.to_string())
            }
            ActivationError::Exhausted { errors } => ApiError::BadRequest {
                message: "no backup plan could be activated".to_string(),
                errors,
            },
            ActivationError::Partial(e) => ApiError::Internal(e.to_string()),
            ActivationError::Duty(e) => e.into(),
            ActivationError::Store(e) => e.into(),
        }
    }
}

impl From<MonitorError> for ApiError {
    fn from(err: MonitorError) -> Self {
        match err {
            MonitorError::FlightNotFound(_) | MonitorError::AlertNotFound(_) => {
                ApiError::NotFound(err.to_string())
            }
            MonitorError::Detector(e) => e.into(),
            MonitorError::Duty(e) => e.into(),
            MonitorError::Backup(e) => e.into(),
            MonitorError::Store(e) => e.into(),
        }
    }
}
