//! # Request Validation Helpers
//!
//! Utilities for validating incoming request data using the `validator` crate.
//!
//! ## Overview
//!
//! This module provides:
//!
//! | Component | Purpose |
//! |-----------|---------|
//! | [`validate_request`] | Validate a struct implementing `Validate` |
//! | [`parse_and_validate`] | Parse JSON and validate in one step |
//!
//! ## How Validation Works
//!
//! We use the [`validator`](https://docs.rs/validator/) crate which provides
//! derive macros for declarative validation:
//!
//! ```rust,ignore
//! use validator::Validate;
//!
//! #[derive(Validate)]
//! struct CreateUser {
//!     #[validate(email)]
//!     email: String,
//!
//!     #[validate(length(min = 10))]
//!     password: String,
//! }
//! ```
//!
//! ## Validation Flow
//!
//! ```text
//! ┌──────────────┐     ┌───────────────┐     ┌──────────────┐
//! │ JSON Request │────►│ Deserialize   │────►│   Validate   │
//! │              │     │ (serde)       │     │  (validator) │
//! └──────────────┘     └───────────────┘     └──────┬───────┘
//!                                                   │
//!         ┌─────────────────────────────────────────┴───────┐
//!         │                                                 │
//!         ▼                                                 ▼
//! ┌───────────────┐                               ┌─────────────────┐
//! │   Success     │                               │ ValidationError │
//! │ (continue)    │                               │   (400 + details)│
//! └───────────────┘                               └─────────────────┘
//! ```
//!
//! ## Error Response Format
//!
//! When validation fails, the API returns a 400 Bad Request with details:
//!
//! ```json
//! {
//!   "code": "VALIDATION_ERROR",
//!   "message": "Validation error",
//!   "details": {
//!     "email": [
//!       { "code": "email", "message": "Invalid email format" }
//!     ],
//!     "password": [
//!       { "code": "length", "message": "Must be at least 10 characters" }
//!     ]
//!   }
//! }
//! ```
//!
//! ## Related Documentation
//!
//! - [`validator` crate](https://docs.rs/validator/)
//! - [`crate::errors::ApiError`] - Error handling
//! - [`_docs/development/development-standards.md`] - Validation guidelines

use crate::errors::ApiError;
use serde::de::DeserializeOwned;
use validator::Validate;

// =============================================================================
// Core Validation Functions
// =============================================================================

/// Validates a request DTO that implements `Validate`.
///
/// This is the primary validation function. Use it in handlers to
/// validate incoming data.
///
/// ## Example
///
/// ```rust,ignore
/// async fn create_user(body: Json<CreateUserDto>) -> Result<impl Responder, ApiError> {
///     validate_request(&body)?;  // Returns early if invalid
///     
///     // Continue with validated data
/// }
/// ```
///
/// ## Errors
///
/// Returns `ApiError::ValidationError` with field-level details if validation fails.
pub fn validate_request<T: Validate>(data: &T) -> Result<(), ApiError> {
    data.validate().map_err(ApiError::ValidationError)
}

/// Parses JSON string and validates in a single step.
///
/// Useful when you have raw JSON and need to parse + validate.
///
/// ## Example
///
/// ```rust,ignore
/// let json = r#"{"email": "user@example.com", "password": "secret"}"#;
/// let user: CreateUserDto = parse_and_validate(json)?;
/// ```
///
/// ## Errors
///
/// - `ApiError::BadRequest` if JSON parsing fails
/// - `ApiError::ValidationError` if validation fails
pub fn parse_and_validate<T: DeserializeOwned + Validate>(json: &str) -> Result<T, ApiError> {
    // Parse JSON
    let data: T = serde_json::from_str(json)
        .map_err(|e| ApiError::BadRequest { message: e.to_string() })?;

    // Validate
    validate_request(&data)?;

    Ok(data)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use validator::Validate;

    #[derive(Debug, Deserialize, Validate)]
    struct Sample {
        #[validate(email)]
        email: String,
        #[validate(length(min = 8))]
        password: String,
    }

    #[test]
    fn validate_request_passes_for_valid_data() {
        let sample = Sample { email: "ada@example.com".to_string(), password: "longenough".to_string() };
        assert!(validate_request(&sample).is_ok());
    }

    #[test]
    fn validate_request_rejects_invalid_data() {
        let sample = Sample { email: "not-an-email".to_string(), password: "short".to_string() };
        assert!(validate_request(&sample).is_err());
    }

    #[test]
    fn parse_and_validate_rejects_malformed_json() {
        let result: Result<Sample, _> = parse_and_validate("{not json");
        assert!(matches!(result, Err(ApiError::BadRequest { .. })));
    }

    #[test]
    fn parse_and_validate_rejects_validation_failure() {
        let json = r#"{"email":"bad","password":"short"}"#;
        let result: Result<Sample, _> = parse_and_validate(json);
        assert!(matches!(result, Err(ApiError::ValidationError(_))));
    }
}

