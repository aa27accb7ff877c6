use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::domain::Error;

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::CardNotFound(_) | Error::CardInactive(_) => StatusCode::NOT_FOUND,
            Error::InvalidAmount { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Error::BadRequest(_) => StatusCode::BAD_REQUEST,
            Error::BalanceOverflow(_)
            | Error::DuplicateCard(_)
            | Error::Seed(_)
            | Error::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let body = json!({ "error": { "code": self.code(), "message": self.to_string() } });
        (self.status_code(), Json(body)).into_response()
    }
}
