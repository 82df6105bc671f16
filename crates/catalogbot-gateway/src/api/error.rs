//! HTTP mapping for `CatalogBotError`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use catalogbot_core::error::{CatalogBotError, ClientCode};

/// Newtype so the core error can be returned from axum handlers.
#[derive(Debug)]
pub struct ApiError(pub CatalogBotError);

impl From<CatalogBotError> for ApiError {
    fn from(e: CatalogBotError) -> Self {
        ApiError(e)
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.0.client_code();
        let status = match code {
            ClientCode::BadRequest | ClientCode::InvalidEvent | ClientCode::UnsupportedVersion => {
                StatusCode::BAD_REQUEST
            }
            ClientCode::AuthFailed => StatusCode::UNAUTHORIZED,
            ClientCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(json!({
            "error": code.as_str(),
            "message": self.0.to_string(),
        }));
        (status, body).into_response()
    }
}
