//! # Request Handlers
//!
//! HTTP request handlers that bridge the API layer with the service layer.
//! Each handler follows this pattern:
//!
//! 1. **Extract** request data using Actix extractors
//! 2. **Validate** input using the `validator` crate
//! 3. **Call** service layer methods
//! 4. **Transform** and return HTTP response
//!
//! ## Error Handling
//!
//! All handlers return `Result<HttpResponse, ApiError>`. The `ApiError` type
//! automatically converts to appropriate HTTP status codes via the
//! `ResponseError` trait implementation.
//!
//! ## Authentication
//!
//! Protected endpoints use the [`shared::auth::middleware::AuthenticatedUser`]
//! extractor, populated by the `authenticate` `from_fn` layer wrapping the
//! protected route scope — see [`super::routes`]. `logout` is the one
//! exception: it needs the raw access-token string (to blacklist its `jti`),
//! so it still reads the `Authorization` header directly via
//! [`extract_bearer_token`].
//!
//! ## Related Documentation
//!
//! - DTOs: [`super::dto`]
//! - Routes: [`super::routes`]
//! - Service: [`crate::service::AuthService`]
//! - Errors: [`shared::errors::ApiError`]

use actix_web::cookie::{time::Duration as CookieDuration, Cookie, SameSite};
use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use shared::{auth::middleware::AuthenticatedUser, errors::ApiError, validation};

use crate::AppState;

use super::dto::{
    AuthResponseDto, ChangePasswordRequest, HealthResponse, LoginRequest, LogoutRequest,
    MessageResponse, RefreshTokenRequest, RegisterRequest, SendVerificationRequest, TokenResponseDto,
    TotpCodeRequest, TotpEnrollmentDto, TotpLoginRequest, TotpStatusDto, UserProfileDto, VerifyEmailRequest,
};

// =============================================================================
// HEALTH CHECK
// =============================================================================

/// Health check endpoint for monitoring and load balancers.
///
/// # Route
///
/// `GET /health`
pub async fn health_check() -> HttpResponse {
    let response = HealthResponse {
        status: "healthy".to_string(),
        service: "identity-service".to_string(),
        timestamp: Utc::now().to_rfc3339(),
    };

    HttpResponse::Ok().json(response)
}

// =============================================================================
// REGISTRATION
// =============================================================================

/// Registers a new user account.
///
/// # Route
///
/// `POST /api/v1/auth/register`
pub async fn register(
    state: web::Data<AppState>,
    body: web::Json<RegisterRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    validation::validate_request(&body)?;

    let response = state
        .auth_service
        .register(
            &body.email,
            &body.password,
            &body.first_name,
            &body.last_name,
            body.phone.as_deref(),
            &body.user_type,
            &body.country_code,
        )
        .await?;

    let cookies = auth_cookies(
        &response.tokens.access_token,
        &response.tokens.refresh_token,
        response.tokens.expires_in,
        response.tokens.refresh_expires_in,
        state.cookie_secure,
    );

    let dto = AuthResponseDto {
        access_token: response.tokens.access_token,
        refresh_token: response.tokens.refresh_token,
        token_type: "Bearer".to_string(),
        expires_in: response.tokens.expires_in,
        user: response.user.into(),
    };

    let mut builder = HttpResponse::Created();
    for cookie in cookies {
        builder.cookie(cookie);
    }
    Ok(builder.json(dto))
}

// =============================================================================
// LOGIN
// =============================================================================

/// Authenticates a user and returns tokens, or pauses on TOTP step-up.
///
/// # Route
///
/// `POST /api/v1/auth/login`
pub async fn login(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    validation::validate_request(&body)?;

    let device_fingerprint = body.device_fingerprint.clone();
    let ip_address = req.connection_info().peer_addr().map(String::from);
    let user_agent = req
        .headers()
        .get("User-Agent")
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    let response = state
        .auth_service
        .login(&body.email, &body.password, device_fingerprint, ip_address, user_agent)
        .await?;

    let cookies = auth_cookies(
        &response.tokens.access_token,
        &response.tokens.refresh_token,
        response.tokens.expires_in,
        response.tokens.refresh_expires_in,
        state.cookie_secure,
    );

    let dto = AuthResponseDto {
        access_token: response.tokens.access_token,
        refresh_token: response.tokens.refresh_token,
        token_type: "Bearer".to_string(),
        expires_in: response.tokens.expires_in,
        user: response.user.into(),
    };

    let mut builder = HttpResponse::Ok();
    for cookie in cookies {
        builder.cookie(cookie);
    }
    Ok(builder.json(dto))
}

/// Completes a login paused on a TOTP challenge.
///
/// # Route
///
/// `POST /api/v1/auth/totp/login`
pub async fn verify_totp_login(
    state: web::Data<AppState>,
    body: web::Json<TotpLoginRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    validation::validate_request(&body)?;

    let response = state.auth_service.verify_totp_login(&body.challenge_token, &body.code).await?;

    let cookies = auth_cookies(
        &response.tokens.access_token,
        &response.tokens.refresh_token,
        response.tokens.expires_in,
        response.tokens.refresh_expires_in,
        state.cookie_secure,
    );

    let dto = AuthResponseDto {
        access_token: response.tokens.access_token,
        refresh_token: response.tokens.refresh_token,
        token_type: "Bearer".to_string(),
        expires_in: response.tokens.expires_in,
        user: response.user.into(),
    };

    let mut builder = HttpResponse::Ok();
    for cookie in cookies {
        builder.cookie(cookie);
    }
    Ok(builder.json(dto))
}

// =============================================================================
// TOKEN REFRESH
// =============================================================================

/// Refreshes tokens using a valid refresh token.
///
/// # Route
///
/// `POST /api/v1/auth/refresh`
///
/// Implements token rotation: the old refresh token is invalidated when a
/// new pair is issued.
pub async fn refresh_token(
    state: web::Data<AppState>,
    body: web::Json<RefreshTokenRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    validation::validate_request(&body)?;

    let tokens = state.auth_service.refresh_token(&body.refresh_token).await?;

    let cookies = auth_cookies(
        &tokens.access_token,
        &tokens.refresh_token,
        tokens.expires_in,
        tokens.refresh_expires_in,
        state.cookie_secure,
    );

    let dto = TokenResponseDto {
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        token_type: "Bearer".to_string(),
        expires_in: tokens.expires_in,
    };

    let mut builder = HttpResponse::Ok();
    for cookie in cookies {
        builder.cookie(cookie);
    }
    Ok(builder.json(dto))
}

// =============================================================================
// LOGOUT
// =============================================================================

/// Logs out the current session: blacklists the access token and revokes
/// the refresh record.
///
/// # Route
///
/// `POST /api/v1/auth/logout`
pub async fn logout(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<LogoutRequest>,
) -> Result<HttpResponse, ApiError> {
    let access_token = extract_bearer_token(&req)?;
    let claims = state.jwt_service.validate_access_token(&access_token)?;

    let body = body.into_inner();
    validation::validate_request(&body)?;

    state.auth_service.logout(claims.sub, &access_token, &body.refresh_token).await?;

    let mut builder = HttpResponse::Ok();
    for cookie in clear_auth_cookies(state.cookie_secure) {
        builder.cookie(cookie);
    }
    Ok(builder.json(MessageResponse::new("Logged out successfully")))
}

// =============================================================================
// USER PROFILE
// =============================================================================

/// Gets the authenticated user's profile.
///
/// # Route
///
/// `GET /api/v1/auth/me`
pub async fn get_profile(user: AuthenticatedUser, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let profile = state.auth_service.get_profile(user.user_id).await?;
    let dto: UserProfileDto = profile.into();
    Ok(HttpResponse::Ok().json(dto))
}

// =============================================================================
// EMAIL VERIFICATION
// =============================================================================

/// (Re-)sends a verification email for an account that hasn't confirmed
/// its address yet. Public: the caller has no session to authenticate
/// with until the address is verified.
///
/// # Route
///
/// `POST /api/v1/auth/send-verification`
pub async fn send_verification(
    state: web::Data<AppState>,
    body: web::Json<SendVerificationRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    validation::validate_request(&body)?;

    state.auth_service.send_verification(&body.email).await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("Verification email sent")))
}

/// Verifies a user's email address from the token in an emailed link.
///
/// # Route
///
/// `GET /api/v1/auth/verify`
pub async fn verify_email(
    state: web::Data<AppState>,
    query: web::Query<VerifyEmailRequest>,
) -> Result<HttpResponse, ApiError> {
    let query = query.into_inner();
    validation::validate_request(&query)?;

    state.auth_service.verify_email(&query.token).await?;

    Ok(HttpResponse::Ok().json(MessageResponse::new("Email verified successfully")))
}

// =============================================================================
// TOTP
// =============================================================================

/// Starts TOTP enrollment for the authenticated account.
///
/// # Route
///
/// `POST /api/v1/auth/totp/setup`
pub async fn setup_totp(user: AuthenticatedUser, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let enrollment = state.auth_service.setup_totp(user.user_id).await?;
    let dto = TotpEnrollmentDto { secret: enrollment.secret, provisioning_uri: enrollment.provisioning_uri };
    Ok(HttpResponse::Ok().json(dto))
}

/// Confirms TOTP enrollment, activating it.
///
/// # Route
///
/// `POST /api/v1/auth/totp/verify`
pub async fn confirm_totp(
    user: AuthenticatedUser,
    state: web::Data<AppState>,
    body: web::Json<TotpCodeRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    validation::validate_request(&body)?;

    state.auth_service.confirm_totp(user.user_id, &body.code).await?;

    Ok(HttpResponse::Ok().json(MessageResponse::new("Two-factor authentication enabled")))
}

/// Disables TOTP, requiring a current code as proof of possession.
///
/// # Route
///
/// `POST /api/v1/auth/totp/disable`
pub async fn disable_totp(
    user: AuthenticatedUser,
    state: web::Data<AppState>,
    body: web::Json<TotpCodeRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    validation::validate_request(&body)?;

    state.auth_service.disable_totp(user.user_id, &body.code).await?;

    Ok(HttpResponse::Ok().json(MessageResponse::new("Two-factor authentication disabled")))
}

/// Reports whether the authenticated account has TOTP enabled.
///
/// # Route
///
/// `GET /api/v1/auth/totp/status`
pub async fn totp_status(user: AuthenticatedUser, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let enabled = state.auth_service.totp_status(user.user_id).await?;
    Ok(HttpResponse::Ok().json(TotpStatusDto { enabled }))
}

// =============================================================================
// PASSWORD CHANGE
// =============================================================================

/// Changes the authenticated account's password and revokes every active
/// session.
///
/// # Route
///
/// `POST /api/v1/auth/change-password`
pub async fn change_password(
    user: AuthenticatedUser,
    state: web::Data<AppState>,
    body: web::Json<ChangePasswordRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    validation::validate_request(&body)?;

    state
        .auth_service
        .change_password(user.user_id, &body.current_password, &body.new_password)
        .await?;

    Ok(HttpResponse::Ok().json(MessageResponse::new("Password changed successfully")))
}

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Builds the `Set-Cookie` pair (`access_token`, `refresh_token`) for a
/// successful auth response. `Secure` mirrors the deployment flag; `SameSite`
/// is `None` when secure (cross-site API use behind TLS) and `Lax` otherwise
/// (plain-HTTP local development, where `SameSite=None` without `Secure` is
/// rejected by browsers).
fn auth_cookies(
    access_token: &str,
    refresh_token: &str,
    access_ttl_seconds: i64,
    refresh_ttl_seconds: i64,
    cookie_secure: bool,
) -> [Cookie<'static>; 2] {
    let same_site = if cookie_secure { SameSite::None } else { SameSite::Lax };

    let access = Cookie::build("access_token", access_token.to_string())
        .http_only(true)
        .secure(cookie_secure)
        .same_site(same_site)
        .path("/")
        .max_age(CookieDuration::seconds(access_ttl_seconds))
        .finish();

    let refresh = Cookie::build("refresh_token", refresh_token.to_string())
        .http_only(true)
        .secure(cookie_secure)
        .same_site(same_site)
        .path("/")
        .max_age(CookieDuration::seconds(refresh_ttl_seconds))
        .finish();

    [access, refresh]
}

/// Builds expired `Set-Cookie` headers that clear `access_token`/`refresh_token`.
fn clear_auth_cookies(cookie_secure: bool) -> [Cookie<'static>; 2] {
    let same_site = if cookie_secure { SameSite::None } else { SameSite::Lax };
    let expired = |name: &'static str| {
        Cookie::build(name, "")
            .http_only(true)
            .secure(cookie_secure)
            .same_site(same_site)
            .path("/")
            .max_age(CookieDuration::ZERO)
            .finish()
    };
    [expired("access_token"), expired("refresh_token")]
}

/// Extracts Bearer token from the Authorization header.
fn extract_bearer_token(req: &HttpRequest) -> Result<String, ApiError> {
    let auth_header = req
        .headers()
        .get("Authorization")
        .ok_or(ApiError::MissingAuth)?
        .to_str()
        .map_err(|_| ApiError::InvalidToken)?;

    if !auth_header.starts_with("Bearer ") {
        return Err(ApiError::InvalidToken);
    }

    let token = auth_header.trim_start_matches("Bearer ").to_string();

    if token.is_empty() {
        return Err(ApiError::InvalidToken);
    }

    Ok(token)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_extract_bearer_token_valid() {
        let req = TestRequest::default()
            .insert_header(("Authorization", "Bearer my_token_123"))
            .to_http_request();

        let result = extract_bearer_token(&req);
        assert!(result.is_ok());
        assert_eq!(result.unwrap(), "my_token_123");
    }

    #[test]
    fn test_extract_bearer_token_missing_header() {
        let req = TestRequest::default().to_http_request();
        assert!(extract_bearer_token(&req).is_err());
    }

    #[test]
    fn test_extract_bearer_token_wrong_scheme() {
        let req = TestRequest::default()
            .insert_header(("Authorization", "Basic dXNlcjpwYXNz"))
            .to_http_request();

        assert!(extract_bearer_token(&req).is_err());
    }

    #[test]
    fn test_extract_bearer_token_empty() {
        let req = TestRequest::default().insert_header(("Authorization", "Bearer ")).to_http_request();
        assert!(extract_bearer_token(&req).is_err());
    }
}
