//! # Data Transfer Objects (DTOs)
//!
//! DTOs define the structure of data transferred between client and server.
//! They serve as the **API contract** and handle:
//!
//! - **Request validation**: Using the `validator` crate
//! - **Deserialization**: JSON → Rust structs via `serde`
//! - **Serialization**: Rust structs → JSON for responses
//!
//! ## DTO Categories
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                              DTOs                                       │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Request DTOs (input)              Response DTOs (output)               │
//! │  ───────────────────               ─────────────────────                │
//! │  - RegisterRequest                 - AuthResponseDto                    │
//! │  - LoginRequest                    - TokenResponseDto                   │
//! │  - RefreshTokenRequest             - UserProfileDto                     │
//! │  - LogoutRequest                   - TotpEnrollmentDto                  │
//! │  - VerifyEmailRequest              - TotpStatusDto                      │
//! │  - SendVerificationRequest         - MessageResponse                    │
//! │  - TotpLoginRequest                - HealthResponse                     │
//! │  - TotpConfirmRequest                                                   │
//! │  - TotpDisableRequest                                                   │
//! │  - ChangePasswordRequest                                                │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Validation Rules
//!
//! | Field        | Rules                                              |
//! |--------------|-----------------------------------------------------|
//! | `email`      | Valid email format, max 255 chars                   |
//! | `password`   | Min 8 chars, max 128 chars                          |
//! | `firstName`  | Non-blank, max 100 chars                            |
//! | `lastName`   | Non-blank, max 100 chars                            |
//! | `userType`   | Non-blank                                           |
//! | `countryCode`| Exactly 2 chars (ISO 3166-1 alpha-2)                |
//! | `token`      | Non-blank                                           |
//!
//! ## JSON Naming Convention
//!
//! All DTOs use `camelCase` for JSON serialization to match JavaScript
//! conventions on the frontend.
//!
//! ## Related Documentation
//!
//! - Validation module: [`shared::validation`]
//! - API handlers: [`super::handlers`]

use serde::{Deserialize, Serialize};
use validator::Validate;

// =============================================================================
// REGISTRATION
// =============================================================================

/// Request body for account registration.
///
/// # Example JSON
///
/// ```json
/// {
///   "email": "user@example.com",
///   "password": "SecurePass123!",
///   "firstName": "John",
///   "lastName": "Doe",
///   "userType": "individual",
///   "countryCode": "US"
/// }
/// ```
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email format"))]
    #[validate(length(max = 255, message = "Email too long"))]
    pub email: String,

    #[validate(length(min = 8, max = 128, message = "Password must be 8-128 characters"))]
    pub password: String,

    #[validate(length(min = 1, max = 100, message = "First name must be 1-100 characters"))]
    pub first_name: String,

    #[validate(length(min = 1, max = 100, message = "Last name must be 1-100 characters"))]
    pub last_name: String,

    #[validate(length(max = 32, message = "Phone too long"))]
    pub phone: Option<String>,

    #[validate(length(min = 1, max = 32, message = "User type is required"))]
    pub user_type: String,

    #[validate(length(equal = 2, message = "Country code must be an ISO 3166-1 alpha-2 code"))]
    pub country_code: String,
}

// =============================================================================
// LOGIN
// =============================================================================

/// Request body for login.
///
/// # Example JSON
///
/// ```json
/// {
///   "email": "user@example.com",
///   "password": "password123",
///   "deviceFingerprint": "a1b2c3..."
/// }
/// ```
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,

    pub device_fingerprint: Option<String>,
}

/// Request body for completing a login paused on a TOTP challenge.
///
/// # Example JSON
///
/// ```json
/// {
///   "challengeToken": "6f1c...",
///   "code": "123456"
/// }
/// ```
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TotpLoginRequest {
    #[validate(length(min = 1, message = "Challenge token is required"))]
    pub challenge_token: String,

    #[validate(length(min = 6, max = 6, message = "Code must be 6 digits"))]
    pub code: String,
}

// =============================================================================
// TOKEN REFRESH
// =============================================================================

/// Request body for token refresh.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}

// =============================================================================
// LOGOUT
// =============================================================================

/// Request body for logout. The access token is taken from the
/// `Authorization` header, not the body.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LogoutRequest {
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}

// =============================================================================
// EMAIL VERIFICATION
// =============================================================================

/// Query string for the emailed verification link: `GET /verify?token=...`.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct VerifyEmailRequest {
    #[validate(length(min = 1, message = "Token is required"))]
    pub token: String,
}

/// Request body for (re-)requesting a verification email for an account
/// that hasn't proven it's signed in yet.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SendVerificationRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

// =============================================================================
// TOTP ENROLLMENT
// =============================================================================

/// Request body for confirming TOTP enrollment or disabling TOTP.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TotpCodeRequest {
    #[validate(length(min = 6, max = 6, message = "Code must be 6 digits"))]
    pub code: String,
}

// =============================================================================
// PASSWORD CHANGE
// =============================================================================

/// Request body for changing the current account password.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,

    #[validate(length(min = 8, max = 128, message = "Password must be 8-128 characters"))]
    pub new_password: String,
}

// =============================================================================
// RESPONSE TYPES
// =============================================================================

/// Response containing authentication tokens and user profile, returned on
/// successful registration, login, or a completed TOTP step-up.
///
/// # Example JSON
///
/// ```json
/// {
///   "accessToken": "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...",
///   "refreshToken": "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...",
///   "tokenType": "Bearer",
///   "expiresIn": 900,
///   "user": {
///     "userId": "550e8400-e29b-41d4-a716-446655440000",
///     "email": "user@example.com",
///     "firstName": "John",
///     "lastName": "Doe",
///     "userType": "individual",
///     "emailVerified": false
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponseDto {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: UserProfileDto,
}

/// Response containing only tokens (for the refresh endpoint).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponseDto {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// User profile in API responses. Never carries the password digest or raw
/// ciphertext/blind-index columns.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfileDto {
    pub user_id: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub user_type: String,
    pub country_code: String,
    pub email_verified: bool,
    pub totp_enabled: bool,
    pub created_at: String,
}

/// Enrollment material returned when starting TOTP setup.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TotpEnrollmentDto {
    pub secret: String,
    pub provisioning_uri: String,
}

/// Whether the authenticated account has TOTP enabled.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TotpStatusDto {
    pub enabled: bool,
}

/// Generic message response for simple confirmations.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub timestamp: String,
}

// =============================================================================
// CONVERSIONS
// =============================================================================

use crate::domain::entities::UserProfile;

impl From<UserProfile> for UserProfileDto {
    fn from(profile: UserProfile) -> Self {
        Self {
            user_id: profile.user_id.to_string(),
            email: profile.email,
            phone: profile.phone,
            first_name: profile.first_name,
            last_name: profile.last_name,
            user_type: profile.user_type,
            country_code: profile.country_code,
            email_verified: profile.email_verified,
            totp_enabled: profile.totp_enabled,
            created_at: profile.created_at.to_rfc3339(),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_register() -> RegisterRequest {
        RegisterRequest {
            email: "test@example.com".to_string(),
            password: "password123".to_string(),
            first_name: "John".to_string(),
            last_name: "Doe".to_string(),
            phone: None,
            user_type: "individual".to_string(),
            country_code: "US".to_string(),
        }
    }

    #[test]
    fn test_register_request_valid() {
        assert!(sample_register().validate().is_ok());
    }

    #[test]
    fn test_register_request_invalid_email() {
        let mut request = sample_register();
        request.email = "not-an-email".to_string();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_register_request_short_password() {
        let mut request = sample_register();
        request.password = "short".to_string();
        let result = request.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().field_errors().contains_key("password"));
    }

    #[test]
    fn test_register_request_bad_country_code() {
        let mut request = sample_register();
        request.country_code = "USA".to_string();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_login_request_valid() {
        let request = LoginRequest {
            email: "test@example.com".to_string(),
            password: "password".to_string(),
            device_fingerprint: None,
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_totp_code_request_rejects_wrong_length() {
        let request = TotpCodeRequest { code: "12345".to_string() };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_message_response_new() {
        let response = MessageResponse::new("Test message");
        assert_eq!(response.message, "Test message");
    }

    #[test]
    fn test_json_serialization_camel_case() {
        let response = MessageResponse::new("Hello");
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("message"));
    }
}
