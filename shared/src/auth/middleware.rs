//! # Authentication Middleware for Actix-web
//!
//! Extracts and validates JWT tokens from HTTP requests.
//!
//! ## Overview
//!
//! This module provides:
//!
//! | Component | Purpose | Usage |
//! |-----------|---------|-------|
//! | [`AuthMiddleware`] | Extract, validate, and blacklist-check a JWT | Service-level authentication |
//! | [`AuthenticatedUser`] | Extractor for handlers | Get current user in handlers |
//! | [`UserKind`] | Account kind enum | Carried in the token, no permission hierarchy |
//!
//! ## Authentication Flow
//!
//! ```text
//! ┌─────────┐     ┌──────────────┐     ┌─────────────┐     ┌─────────┐
//! │ Request │────►│ AuthMiddleware│────►│ Extract JWT │────►│ Validate│
//! └─────────┘     └──────────────┘     └─────────────┘     └────┬────┘
//!                                                                │
//!                 ┌──────────────┐     ┌─────────────┐     ┌────▼─────┐
//!                 │   Handler    │◄────│ Insert User │◄────│ Blacklist │
//!                 │(AuthenticUser)│     │ Extension   │     │  check    │
//!                 └──────────────┘     └─────────────┘     └──────────┘
//! ```
//!
//! A token that validates but whose `jti` has been blacklisted (logout, or
//! bulk-revoked on password change) is rejected here, not left to a later
//! layer — otherwise a logged-out token would keep authenticating until it
//! naturally expires.
//!
//! ## Usage Example
//!
//! ### Setup Middleware
//!
//! ```rust,ignore
//! use shared::auth::{AuthMiddleware, JwtService};
//! use shared::redis_client::RedisClient;
//! use std::sync::Arc;
//!
//! let jwt_service = Arc::new(JwtService::new(config.jwt));
//! let auth_middleware = AuthMiddleware::new(jwt_service, redis_client);
//!
//! // Apply to protected routes
//! App::new()
//!     .service(
//!         web::scope("/api")
//!             .wrap(auth_middleware)
//!             .route("/profile", web::get().to(get_profile))
//!     )
//! ```
//!
//! ### Use in Handlers
//!
//! ```rust,ignore
//! use shared::auth::AuthenticatedUser;
//!
//! // The user is automatically extracted from the validated token
//! async fn get_profile(user: AuthenticatedUser) -> impl Responder {
//!     format!("Hello, {}!", user.email)
//! }
//! ```
//!
//! ## Related Documentation
//!
//! - [`crate::auth::jwt`] - JWT token validation
//! - [`crate::errors::ApiError`] - Authentication errors

use crate::auth::jwt::{Claims, JwtService};
use crate::errors::ApiError;
use crate::redis_client::RedisClient;
use actix_web::{dev::ServiceRequest, Error, HttpMessage};
use std::sync::Arc;
use uuid::Uuid;

// =============================================================================
// Authenticated User
// =============================================================================

/// Represents an authenticated user extracted from a JWT.
///
/// This struct is inserted into request extensions after successful
/// authentication and can be extracted in handlers.
///
/// ## Fields
///
/// - `user_id`: The user's unique identifier (from JWT `sub` claim)
/// - `email`: User's email address (for display/logging)
/// - `user_type`: Account kind
///
/// ## Example
///
/// ```rust,ignore
/// async fn handler(user: AuthenticatedUser) -> impl Responder {
///     if user.user_type == UserKind::Admin {
///         // Admin-only branch
///     }
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    /// The user's unique identifier (UUID)
    pub user_id: Uuid,
    /// User's email address
    pub email: String,
    /// Account kind carried in the token
    pub user_type: UserKind,
}

// =============================================================================
// Account Kind
// =============================================================================

/// The kinds of accounts the platform distinguishes between.
///
/// There is no permission hierarchy between these — unlike a role ladder,
/// being an `Agent` does not imply `Individual` privileges. Authorization
/// decisions that need a specific kind check it directly (`user.user_type == UserKind::Admin`)
/// rather than going through a `has_permission`-style comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserKind {
    /// A natural person transacting on their own behalf.
    Individual,
    /// A business account accepting payments.
    Merchant,
    /// A third party acting on behalf of other accounts.
    Agent,
    /// Platform operator with administrative access.
    Admin,
}

impl UserKind {
    /// Parses an account kind from a string (case-insensitive).
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "individual" => Some(Self::Individual),
            "merchant" => Some(Self::Merchant),
            "agent" => Some(Self::Agent),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }

    /// Returns the string representation used in JWTs and storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Individual => "individual",
            Self::Merchant => "merchant",
            Self::Agent => "agent",
            Self::Admin => "admin",
        }
    }
}

/// Converts JWT claims to an authenticated user.
impl From<Claims> for AuthenticatedUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email,
            // Default to Individual if the claim is somehow unrecognized.
            user_type: UserKind::from_str(&claims.user_type).unwrap_or(UserKind::Individual),
        }
    }
}

// =============================================================================
// Auth Middleware
// =============================================================================

/// Middleware for JWT-based authentication.
///
/// This middleware:
/// 1. Extracts the JWT from the `Authorization` header
/// 2. Validates the token signature and claims
/// 3. Rejects the request if the token's `jti` is blacklisted
/// 4. Inserts the authenticated user into request extensions
///
/// ## Setup
///
/// ```rust,ignore
/// let jwt_service = Arc::new(JwtService::new(config.jwt));
/// let auth = AuthMiddleware::new(jwt_service, redis_client);
///
/// App::new()
///     .service(
///         web::scope("/api")
///             .wrap(auth)
///             .route("/protected", web::get().to(handler))
///     )
/// ```
#[derive(Clone)]
pub struct AuthMiddleware {
    /// JWT service for token validation
    jwt_service: Arc<JwtService>,
    /// Redis client used to check the token blacklist
    redis: RedisClient,
}

impl AuthMiddleware {
    /// Creates a new authentication middleware.
    ///
    /// ## Parameters
    ///
    /// - `jwt_service`: Shared JWT service for token validation
    /// - `redis`: Client used to check whether the token's `jti` was revoked
    pub fn new(jwt_service: Arc<JwtService>, redis: RedisClient) -> Self {
        Self { jwt_service, redis }
    }

    /// Extracts and validates the user from a request.
    ///
    /// This is the core authentication logic:
    /// 1. Get the `Authorization` header
    /// 2. Extract the Bearer token
    /// 3. Validate the JWT
    /// 4. Check the token hasn't been blacklisted (logout / password change)
    /// 5. Convert claims to `AuthenticatedUser`
    ///
    /// ## Errors
    ///
    /// - `ApiError::MissingAuth` - No Authorization header
    /// - `ApiError::InvalidToken` - Malformed token, invalid signature, or blacklisted
    /// - `ApiError::TokenExpired` - Token has expired
    pub async fn extract_user(&self, req: &ServiceRequest) -> Result<AuthenticatedUser, ApiError> {
        // Get Authorization header
        let auth_header = req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .ok_or(ApiError::MissingAuth)?;

        // Extract token from "Bearer <token>"
        let token = JwtService::extract_from_header(auth_header)?;

        // Validate token and get claims
        let claims = self.jwt_service.validate_access_token(token)?;

        // A blacklisted jti means the token was explicitly revoked (logout,
        // or bulk-revoked on password change) — treat it as invalid even
        // though the signature and expiry both still check out.
        if self.redis.is_token_blacklisted(&claims.jti.to_string()).await? {
            return Err(ApiError::InvalidToken);
        }

        Ok(AuthenticatedUser::from(claims))
    }

    /// Authenticates a request and stores the user in extensions.
    ///
    /// Call this from middleware to authenticate the request.
    /// The user will be available via the `AuthenticatedUser` extractor.
    ///
    /// ## Errors
    ///
    /// Returns authentication errors if the token is missing, invalid, or revoked.
    pub async fn authenticate(&self, req: &ServiceRequest) -> Result<(), ApiError> {
        let user = self.extract_user(req).await?;
        // Store in request extensions for later extraction
        req.extensions_mut().insert(user);
        Ok(())
    }
}

// =============================================================================
// Actix-web Extractor
// =============================================================================

/// Extractor for getting the authenticated user in handlers.
///
/// This implements Actix-web's `FromRequest` trait, allowing you to
/// simply add `AuthenticatedUser` as a handler parameter.
///
/// ## Example
///
/// ```rust,ignore
/// // User is automatically extracted from request extensions
/// async fn handler(user: AuthenticatedUser) -> impl Responder {
///     format!("Hello, {}!", user.email)
/// }
/// ```
///
/// ## Errors
///
/// Returns `ApiError::MissingAuth` if no user is in request extensions.
/// This happens if authentication middleware wasn't applied.
impl actix_web::FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = std::future::Ready<Result<Self, Self::Error>>;

    fn from_request(
        req: &actix_web::HttpRequest,
        _payload: &mut actix_web::dev::Payload,
    ) -> Self::Future {
        // Try to get the user from request extensions
        let result = req
            .extensions()
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| ApiError::MissingAuth.into());

        std::future::ready(result)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_kind_from_str() {
        // Case insensitive parsing
        assert_eq!(UserKind::from_str("individual"), Some(UserKind::Individual));
        assert_eq!(UserKind::from_str("MERCHANT"), Some(UserKind::Merchant));
        assert_eq!(UserKind::from_str("Agent"), Some(UserKind::Agent));
        assert_eq!(UserKind::from_str("Admin"), Some(UserKind::Admin));

        // Unknown kind returns None
        assert_eq!(UserKind::from_str("unknown"), None);
        assert_eq!(UserKind::from_str(""), None);
    }

    #[test]
    fn test_user_kind_as_str() {
        assert_eq!(UserKind::Individual.as_str(), "individual");
        assert_eq!(UserKind::Merchant.as_str(), "merchant");
        assert_eq!(UserKind::Agent.as_str(), "agent");
        assert_eq!(UserKind::Admin.as_str(), "admin");
    }

    #[test]
    fn test_authenticated_user_from_claims() {
        let claims = Claims {
            sub: Uuid::new_v4(),
            email: "test@example.com".to_string(),
            user_type: "merchant".to_string(),
            iss: "test".to_string(),
            aud: "test".to_string(),
            exp: 0,
            iat: 0,
            jti: Uuid::new_v4(),
            token_type: crate::auth::jwt::TokenType::Access,
        };

        let user = AuthenticatedUser::from(claims.clone());

        assert_eq!(user.user_id, claims.sub);
        assert_eq!(user.email, claims.email);
        assert_eq!(user.user_type, UserKind::Merchant);
    }

    #[test]
    fn test_unknown_user_type_defaults_to_individual() {
        let claims = Claims {
            sub: Uuid::new_v4(),
            email: "test@example.com".to_string(),
            user_type: "unknown_kind".to_string(),
            iss: "test".to_string(),
            aud: "test".to_string(),
            exp: 0,
            iat: 0,
            jti: Uuid::new_v4(),
            token_type: crate::auth::jwt::TokenType::Access,
        };

        let user = AuthenticatedUser::from(claims);

        assert_eq!(user.user_type, UserKind::Individual);
    }
}
