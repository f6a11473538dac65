use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use openback::OpenPaymentsError;

use crate::metrics::ERRORS_TOTAL;

/// Errors surfaced by HTTP handlers. Each maps to one status code and a
/// `{success: false, error, message}` body.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    OpenPayments(#[from] OpenPaymentsError),

    #[error("item {0} not found")]
    ItemNotFound(u64),

    #[error("invalid request body: {0}")]
    InvalidBody(String),
}

impl ApiError {
    pub fn tag(&self) -> &'static str {
        match self {
            ApiError::OpenPayments(e) => e.tag(),
            ApiError::ItemNotFound(_) => "item_not_found",
            ApiError::InvalidBody(_) => "invalid_body",
        }
    }

    /// Message safe to show callers. Transport and internal details stay in the logs.
    fn public_message(&self) -> String {
        match self {
            ApiError::OpenPayments(OpenPaymentsError::UpstreamUnavailable(_)) => {
                "Open Payments server unreachable".to_string()
            }
            ApiError::OpenPayments(OpenPaymentsError::Serialization(_)) => {
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::OpenPayments(e) => match e {
                OpenPaymentsError::InvalidInput(_) => StatusCode::BAD_REQUEST,
                OpenPaymentsError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
                OpenPaymentsError::GrantContinuationFailed(_) => StatusCode::FORBIDDEN,
                OpenPaymentsError::QuoteInvalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
                OpenPaymentsError::UpstreamRejected { .. } => StatusCode::FAILED_DEPENDENCY,
                OpenPaymentsError::ProtocolMismatch(_) => StatusCode::BAD_GATEWAY,
                OpenPaymentsError::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                OpenPaymentsError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::ItemNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidBody(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, status = status.as_u16(), "request failed");
        } else {
            tracing::warn!(error = %self, status = status.as_u16(), "request rejected");
        }
        ERRORS_TOTAL.with_label_values(&[self.tag()]).inc();

        HttpResponse::build(status).json(serde_json::json!({
            "success": false,
            "error": self.tag(),
            "message": self.public_message(),
        }))
    }
}
