//! # Service Layer
//!
//! The service layer contains the core business logic for authentication
//! operations. It orchestrates between the repository layer (data access)
//! and the API layer (HTTP handling).
//!
//! ## Clean Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                            API Layer                                    │
//! │                    (HTTP handlers, DTOs)                                │
//! └───────────────────────────────┬─────────────────────────────────────────┘
//!                                 │
//!                                 │ Calls service methods
//!                                 ▼
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Service Layer                                  │
//! │  ┌────────────────────────────────────────────────────────────────────┐ │
//! │  │                       AuthService                                  │ │
//! │  │  ┌──────────────────────────────────────────────────────────────┐  │ │
//! │  │  │ Business Logic:                                              │  │ │
//! │  │  │ - User registration with validation                          │  │ │
//! │  │  │ - Login with password verification, optional TOTP step-up    │  │ │
//! │  │  │ - Token generation, rotation, and session revocation         │  │ │
//! │  │  │ - Email verification                                         │  │ │
//! │  │  │ - TOTP enrollment/confirmation/disable                       │  │ │
//! │  │  │ - Password change                                            │  │ │
//! │  │  └──────────────────────────────────────────────────────────────┘  │ │
//! │  └────────────────────────────────────────────────────────────────────┘ │
//! │  ┌────────────────────────────────────────────────────────────────────┐ │
//! │  │  AuditSink                     │  Mailer                           │ │
//! │  │  bounded queue + worker pool,  │  bounded queue + worker pool,     │ │
//! │  │  feeds AuditRepository         │  log-only verification sends     │ │
//! │  └────────────────────────────────────────────────────────────────────┘ │
//! └───────────────────────────────┬─────────────────────────────────────────┘
//!                                 │
//!                                 │ Uses repository + external services
//!                                 ▼
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │              Repository Layer          │    External Services          │
//! │            (Data persistence)          │  (JWT, Redis, Crypto, TOTP)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Service Responsibilities
//!
//! | Operation           | Validation                    | Side Effects                |
//! |---------------------|-------------------------------|-----------------------------|
//! | `register`          | Password strength             | Create user, queue email    |
//! | `login`             | Credentials, lockout, TOTP    | Update last_login, device    |
//! | `verify_totp_login` | Challenge token, TOTP code     | Completes the paused login   |
//! | `refresh_token`     | Token validity                | Rotate tokens                |
//! | `logout`            | —                              | Blacklist jti, revoke record |
//! | `verify_email`      | Token validity                | Update email_verified        |
//! | `setup_totp`        | Not already enabled            | Store encrypted secret       |
//! | `confirm_totp`      | TOTP code                      | Enable TOTP                  |
//! | `disable_totp`      | TOTP code                      | Disable TOTP                 |
//! | `change_password`   | Current password, new strength | Update password, revoke all  |
//!
//! ## Related Documentation
//!
//! - JWT handling: [`shared::auth::jwt`]
//! - Password hashing: [`shared::auth::password`]
//! - Encryption: [`shared::crypto`]
//! - Repository: [`crate::repository::traits::UserRepositoryTrait`]

pub mod audit_sink;
pub mod auth_service;
pub mod mailer;

pub use audit_sink::AuditSink;
pub use auth_service::AuthService;
pub use mailer::Mailer;
