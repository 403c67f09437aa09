use axum::http::{header::AUTHORIZATION, HeaderMap};

use crate::error::ApiError;

pub fn verify_bearer(headers: &HeaderMap, expected_key: &str) -> Result<(), ApiError> {
    let token = extract_bearer_token(headers)?;

    if token.trim() != expected_key {
        return Err(ApiError::Unauthorized("Invalid admin key"));
    }

    Ok(())
}

pub fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let Some(raw_header) = headers.get(AUTHORIZATION) else {
        return Err(ApiError::Unauthorized("Missing Authorization header"));
    };

    let Ok(value) = raw_header.to_str() else {
        return Err(ApiError::Unauthorized("Invalid Authorization header"));
    };

    value
        .strip_prefix("Bearer ")
        .ok_or(ApiError::Unauthorized("Authorization must use Bearer token"))
}
