//! Shared error type across Catalog-BOT crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Invalid input / malformed request.
    BadRequest,
    /// Outcome event rejected by the aggregator.
    InvalidEvent,
    /// Auth failed.
    AuthFailed,
    /// Unsupported config version.
    UnsupportedVersion,
    /// Internal server error.
    Internal,
}

impl ClientCode {
    /// String representation used in JSON responses.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::BadRequest => "BAD_REQUEST",
            ClientCode::InvalidEvent => "INVALID_EVENT",
            ClientCode::AuthFailed => "AUTH_FAILED",
            ClientCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ClientCode::Internal => "INTERNAL",
        }
    }
}

/// Why an event was rejected. Used as a metrics label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Portal name is not one of catalog/parts/home_products.
    InvalidPortal,
    /// Source is neither `ui` nor `api`.
    InvalidSource,
    /// Latency is negative, non-finite or above one day.
    InvalidLatency,
}

impl RejectReason {
    /// Label value used for `catalogbot_events_rejected_total`.
    pub fn as_str(self) -> &'static str {
        match self {
            RejectReason::InvalidPortal => "invalid_portal",
            RejectReason::InvalidSource => "invalid_source",
            RejectReason::InvalidLatency => "invalid_latency",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, CatalogBotError>;

/// Unified error type used by core and gateway.
#[derive(Debug, Error)]
pub enum CatalogBotError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("invalid event ({}): {detail}", .reason.as_str())]
    InvalidEvent { reason: RejectReason, detail: String },
    #[error("auth failed")]
    AuthFailed,
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("internal: {0}")]
    Internal(String),
}

impl CatalogBotError {
    pub(crate) fn invalid(reason: RejectReason, detail: impl Into<String>) -> Self {
        CatalogBotError::InvalidEvent { reason, detail: detail.into() }
    }

    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            CatalogBotError::BadRequest(_) => ClientCode::BadRequest,
            CatalogBotError::InvalidEvent { .. } => ClientCode::InvalidEvent,
            CatalogBotError::AuthFailed => ClientCode::AuthFailed,
            CatalogBotError::UnsupportedVersion => ClientCode::UnsupportedVersion,
            CatalogBotError::Internal(_) => ClientCode::Internal,
        }
    }

    /// Rejection reason, only for `InvalidEvent`.
    pub fn reject_reason(&self) -> Option<RejectReason> {
        match self {
            CatalogBotError::InvalidEvent { reason, .. } => Some(*reason),
            _ => None,
        }
    }
}
