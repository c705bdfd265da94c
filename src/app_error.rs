use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::services::ServiceError;

/// Standard response envelope shared by every endpoint.
#[derive(Serialize, ToSchema, Debug)]
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
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Same envelope with an explicit status code, used for `201 Created`.
pub struct Created<T, M>(pub StdResponse<T, M>);

impl<T, M> IntoResponse for Created<T, M>
where
    T: Serialize,
    M: Serialize,
{
    fn into_response(self) -> Response {
        (StatusCode::CREATED, Json(self.0)).into_response()
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found")]
    NotFound,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("{0} is unreachable")]
    ServiceUnreachable(String),

    #[error("Upstream failure: {0}")]
    BadGateway(String),

    /// 500 with a message that is safe to show to the user.
    #[error("{0}")]
    Internal(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::NotFound => (StatusCode::NOT_FOUND, "Not found".to_string()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::ServiceUnreachable(service) => (
                StatusCode::SERVICE_UNAVAILABLE,
                format!("{service} is unreachable"),
            ),
            AppError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::Other(err) => {
                tracing::error!("Internal server error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (
            status,
            Json(StdResponse::<(), String> {
                data: None,
                message: Some(message),
            }),
        )
            .into_response()
    }
}

impl From<ServiceError> for AppError {
    /// Maps the domain taxonomy onto HTTP. Users only see generic wording; the specific
    /// class is logged here (or at the point of failure for payment errors).
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(msg) => AppError::BadRequest(msg),
            ServiceError::NotFound(what) => {
                tracing::debug!("{} not found", what);
                AppError::NotFound
            }
            ServiceError::AmountMismatch { .. } => AppError::BadRequest(err.to_string()),
            ServiceError::SignatureMismatch => {
                AppError::BadRequest("Payment verification failed".into())
            }
            ServiceError::PaymentProvider(_) => {
                AppError::BadGateway("Payment could not be initiated".into())
            }
            ServiceError::Persistence(source) => {
                tracing::error!("Persistence failure: {:?}", source);
                AppError::Internal("Order could not be processed".into())
            }
            ServiceError::ReconciliationAmbiguous { .. } => AppError::Internal(
                "Payment received but not yet recorded; support will confirm your order".into(),
            ),
        }
    }
}
