//! # Authentication and Authorization Module
//!
//! All authentication and authorization functionality for the identity
//! subsystem.
//!
//! ## Module Structure
//!
//! ```text
//! auth/
//! ├── jwt.rs        - JWT token generation and validation
//! ├── password.rs   - Secure password hashing with Argon2id
//! ├── totp.rs       - TOTP enrollment and verification
//! └── middleware.rs - Actix-web authentication middleware
//! ```
//!
//! ## Overview
//!
//! | Component | Purpose | See Also |
//! |-----------|---------|----------|
//! | [`JwtService`] | Generate and validate JWT tokens | [RFC 7519](https://tools.ietf.org/html/rfc7519) |
//! | [`PasswordHasher`] | Argon2id password hashing | [OWASP Password Storage](https://cheatsheetseries.owasp.org/cheatsheets/Password_Storage_Cheat_Sheet.html) |
//! | [`totp::TotpService`] | TOTP enrollment and verification | [RFC 6238](https://tools.ietf.org/html/rfc6238) |
//! | [`AuthMiddleware`] | Request authentication | Actix-web middleware docs |
//! | [`AuthenticatedUser`] | Extractor for authenticated user | Actix-web extractors |
//!
//! ## Security Implementation
//!
//! - **JWT with short-lived access tokens** (15 min default)
//! - **Refresh tokens for session continuity** (7 days default)
//! - **Argon2id password hashing** (OWASP recommended)
//! - **Optional TOTP second factor** on top of password login
//!
//! ## Token Flow
//!
//! ```text
//! ┌────────┐        ┌────────────┐        ┌────────────┐
//! │ Client │        │ Identity   │        │ Protected  │
//! └───┬────┘        │ API        │        │    API     │
//!     │             └─────┬──────┘        └─────┬──────┘
//!     │ POST /login       │                     │
//!     │ (email, password) │                     │
//!     │──────────────────>│                     │
//!     │                   │                     │
//!     │ {access_token,    │                     │
//!     │  refresh_token}   │                     │
//!     │<──────────────────│                     │
//!     │                   │                     │
//!     │ GET /resource     │                     │
//!     │ Authorization:    │                     │
//!     │ Bearer <access>   │                     │
//!     │────────────────────────────────────────>│
//!     │                   │                     │
//!     │ 200 OK {data}     │                     │
//!     │<────────────────────────────────────────│
//!     │                   │                     │
//!     │ (after 15 min)    │                     │
//!     │ POST /refresh     │                     │
//!     │ (refresh_token)   │                     │
//!     │──────────────────>│                     │
//!     │                   │                     │
//!     │ {new access_token,│                     │
//!     │  new refresh}     │                     │
//!     │<──────────────────│                     │
//! ```
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! use shared::auth::{JwtService, PasswordHasher, AuthenticatedUser};
//! use shared::config::AppConfig;
//!
//! // In your service initialization
//! let config = AppConfig::from_env()?;
//! let jwt_service = Arc::new(JwtService::new(config.jwt.clone()));
//! let password_hasher = PasswordHasher::new();
//!
//! // Login handler
//! async fn login(credentials: Credentials) -> ApiResult<TokenPair> {
//!     let user = user_repo.find_by_email(&credentials.email).await?;
//!
//!     if password_hasher.verify(&credentials.password, &user.password_hash)? {
//!         let tokens = jwt_service.generate_tokens(
//!             user.id,
//!             &user.email,
//!             &user.user_type
//!         )?;
//!         Ok(tokens)
//!     } else {
//!         Err(ApiError::InvalidCredentials)
//!     }
//! }
//!
//! // Protected handler (user extracted from JWT)
//! async fn get_profile(user: AuthenticatedUser) -> ApiResult<Profile> {
//!     profile_repo.find_by_user_id(user.user_id).await
//! }
//! ```

pub mod jwt;
pub mod middleware;
pub mod password;
pub mod totp;

// Re-export main types for convenient access
pub use jwt::{Claims, JwtService, TokenPair};
pub use middleware::{AuthMiddleware, AuthenticatedUser};
pub use password::PasswordHasher;
pub use totp::TotpService;
