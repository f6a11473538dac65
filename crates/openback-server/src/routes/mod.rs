pub mod health;
pub mod items;
pub mod payments;
pub mod wallet;

use actix_web::{web, HttpResponse};
use serde::Serialize;

use crate::error::ApiError;

/// Largest JSON body accepted by any route.
pub const JSON_LIMIT: usize = 64 * 1024;

/// JSON extractor config: size limit and malformed bodies reported as
/// `invalid_body` in the usual error shape.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(JSON_LIMIT)
        .error_handler(|err, _req| ApiError::InvalidBody(err.to_string()).into())
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default()
        .error_handler(|err, _req| ApiError::InvalidBody(err.to_string()).into())
}

/// `200 {success: true, data}`
pub(crate) fn success<T: Serialize>(data: T) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "data": data,
    }))
}
