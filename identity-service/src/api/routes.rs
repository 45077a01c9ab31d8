//! # Route Configuration
//!
//! Defines URL patterns and maps them to handler functions.
//!
//! ## Route Structure
//!
//! ```text
//! /
//! ├── health                           GET  → health_check
//! │
//! └── api/v1/auth/
//!     ├── register                     POST → register
//!     ├── login                        POST → login
//!     ├── totp/login                   POST → verify_totp_login
//!     ├── refresh                      POST → refresh_token
//!     ├── verify                       GET  → verify_email
//!     ├── send-verification            POST → send_verification
//!     │
//!     └── [authenticated]
//!         ├── me                       GET  → get_profile
//!         ├── logout                   POST → logout
//!         ├── change-password          POST → change_password
//!         └── totp/
//!             ├── setup                POST → setup_totp
//!             ├── verify               POST → confirm_totp
//!             ├── disable              POST → disable_totp
//!             └── status               GET  → totp_status
//! ```
//!
//! ## Versioning
//!
//! All auth endpoints are versioned under `/api/v1/`.
//!
//! ## Authentication
//!
//! The `[authenticated]` sub-scope is wrapped with
//! [`crate::middleware::authenticate::authenticate`], which validates the
//! bearer access token and populates the
//! [`shared::auth::middleware::AuthenticatedUser`] extractor. Everything
//! outside that scope is public.
//!
//! ## Related Documentation
//!
//! - Handler implementations: [`super::handlers`]
//! - Auth middleware: [`crate::middleware::authenticate`]

use actix_web::{middleware::from_fn, web};

use super::handlers;
use crate::middleware::authenticate::authenticate;

/// Configures all routes for the identity service.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(handlers::health_check)).service(
        web::scope("/api/v1/auth")
            // ─────────────────────────────────────────────────────────
            // Public routes
            // ─────────────────────────────────────────────────────────
            .route("/register", web::post().to(handlers::register))
            .route("/login", web::post().to(handlers::login))
            .route("/totp/login", web::post().to(handlers::verify_totp_login))
            .route("/refresh", web::post().to(handlers::refresh_token))
            .route("/verify", web::get().to(handlers::verify_email))
            .route("/send-verification", web::post().to(handlers::send_verification))
            // ─────────────────────────────────────────────────────────
            // Protected routes (require a valid access token)
            // ─────────────────────────────────────────────────────────
            .service(
                web::scope("")
                    .wrap(from_fn(authenticate))
                    .route("/me", web::get().to(handlers::get_profile))
                    .route("/logout", web::post().to(handlers::logout))
                    .route("/change-password", web::post().to(handlers::change_password))
                    .route("/totp/setup", web::post().to(handlers::setup_totp))
                    .route("/totp/verify", web::post().to(handlers::confirm_totp))
                    .route("/totp/disable", web::post().to(handlers::disable_totp))
                    .route("/totp/status", web::get().to(handlers::totp_status)),
            ),
    );
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    #[test]
    fn test_route_configuration_compiles() {
        assert!(true);
    }
}
