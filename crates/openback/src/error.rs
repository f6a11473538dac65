use thiserror::Error;

/// Errors returned by Open Payments operations.
#[derive(Debug, Error)]
pub enum OpenPaymentsError {
    /// Local validation failed. No remote call was made.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The authorization server answered with a grant that does not match
    /// the requested interaction mode.
    #[error("protocol mismatch: {0}")]
    ProtocolMismatch(String),

    #[error("grant continuation failed: {0}")]
    GrantContinuationFailed(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("invalid quote: {0}")]
    QuoteInvalid(String),

    /// The remote server refused the request for a reason outside the
    /// other categories (unknown wallet address, rejected grant request).
    #[error("upstream rejected request ({status}): {message}")]
    UpstreamRejected { status: u16, message: String },

    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl OpenPaymentsError {
    /// Stable machine-readable tag used in HTTP error bodies and metrics.
    pub fn tag(&self) -> &'static str {
        match self {
            OpenPaymentsError::InvalidInput(_) => "invalid_input",
            OpenPaymentsError::ProtocolMismatch(_) => "protocol_mismatch",
            OpenPaymentsError::GrantContinuationFailed(_) => "grant_continuation_failed",
            OpenPaymentsError::Unauthorized(_) => "unauthorized",
            OpenPaymentsError::QuoteInvalid(_) => "quote_invalid",
            OpenPaymentsError::UpstreamRejected { .. } => "upstream_rejected",
            OpenPaymentsError::UpstreamUnavailable(_) => "upstream_unavailable",
            OpenPaymentsError::Serialization(_) => "internal_error",
        }
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        OpenPaymentsError::InvalidInput(msg.into())
    }
}
