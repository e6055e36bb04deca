//! # Request Extraction & Validation
//!
//! [`Validate`] for request DTOs and helpers that turn axum rejections into
//! [`AppError::BadRequest`].

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::Query;
use axum::Json;

use crate::error::AppError;

/// Longest accepted identity, in bytes.
pub const MAX_IDENTITY_LEN: usize = 255;

/// Business-rule checks beyond what serde enforces.
pub trait Validate {
    fn validate(&self) -> Result<(), String>;
}

pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    result
        .map(|Json(v)| v)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}

pub fn extract_validated_json<T: Validate>(
    result: Result<Json<T>, JsonRejection>,
) -> Result<T, AppError> {
    let value = extract_json(result)?;
    value.validate().map_err(AppError::BadRequest)?;
    Ok(value)
}

pub fn extract_query<T>(result: Result<Query<T>, QueryRejection>) -> Result<T, AppError> {
    result
        .map(|Query(v)| v)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}

pub fn validate_identity(identity: &str) -> Result<(), String> {
    if identity.trim().is_empty() {
        return Err("username must not be empty".to_string());
    }
    if identity.len() > MAX_IDENTITY_LEN {
        return Err(format!("username must not exceed {MAX_IDENTITY_LEN} bytes"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_rules() {
        assert!(validate_identity("alice").is_ok());
        assert!(validate_identity("").is_err());
        assert!(validate_identity("   ").is_err());
        assert!(validate_identity(&"a".repeat(MAX_IDENTITY_LEN + 1)).is_err());
    }
}
