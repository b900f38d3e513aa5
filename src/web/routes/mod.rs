pub mod agent_routes;
pub mod logistics_base_routes;
pub mod proxy_routes;
pub mod record_routes;
pub mod search_routes;
pub mod sequence_routes;
pub mod settings_routes;

use axum::body::Bytes;
use serde::de::DeserializeOwned;

use crate::web::AppError;

/// Parses an optional JSON body; an empty body yields `T::default()`.
pub(crate) fn parse_optional_json<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, AppError> {
    if is_blank(body) {
        return Ok(T::default());
    }
    parse_json_body(body)
}

/// Parses a required JSON body. Any failure is a 400 with the usual error envelope,
/// whatever the request's content type.
pub(crate) fn parse_json_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, AppError> {
    if is_blank(body) {
        return Err(AppError::InvalidInput("Request body is required".to_string()));
    }
    serde_json::from_slice(body).map_err(|e| AppError::InvalidInput(format!("Malformed JSON body: {e}")))
}

fn is_blank(body: &Bytes) -> bool {
    body.iter().all(u8::is_ascii_whitespace)
}
