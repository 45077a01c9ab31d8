//! # Repository Layer
//!
//! The repository layer provides data access abstractions for the identity
//! domain. It encapsulates all database operations, hiding SQL complexity from
//! the service layer.
//!
//! ## Clean Architecture Principles
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Service Layer                                  │
//! │                    (Business logic, validation)                         │
//! └───────────────────────────────┬─────────────────────────────────────────┘
//!                                 │
//!                                 │ Depends on UserRepositoryTrait /
//!                                 │ AuditRepositoryTrait, not a concrete type
//!                                 ▼
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Repository Layer                                 │
//! │  ┌────────────────────────────────────────────────────────────────────┐ │
//! │  │                    UserRepository                                  │ │
//! │  │  ┌──────────────────┐  ┌──────────────────┐  ┌──────────────────┐  │ │
//! │  │  │ User Operations  │  │ Token Operations │  │ Device Operations│  │ │
//! │  │  │ - create         │  │ - create_token   │  │ - upsert_device  │  │ │
//! │  │  │ - find_by_email  │  │ - find_token     │  │ - is_trusted     │  │ │
//! │  │  │ - find_by_id     │  │ - revoke_token   │  │                  │  │ │
//! │  │  │ - lockout/TOTP   │  │                  │  │                  │  │ │
//! │  │  └──────────────────┘  └──────────────────┘  └──────────────────┘  │ │
//! │  └────────────────────────────────────────────────────────────────────┘ │
//! │  ┌────────────────────────────────────────────────────────────────────┐ │
//! │  │                    AuditRepository                                 │ │
//! │  │  - insert (append-only)                                            │ │
//! │  └────────────────────────────────────────────────────────────────────┘ │
//! └───────────────────────────────────┬─────────────────────────────────────┘
//!                                     │
//!                                     │ sqlx queries
//!                                     ▼
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         PostgreSQL Database                             │
//! │     users │ verification_tokens │ refresh_records │ devices │ audit_entries │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Decisions
//!
//! 1. **Trait-backed**: [`traits::UserRepositoryTrait`] and
//!    [`traits::AuditRepositoryTrait`] sit between the service layer and the
//!    concrete `sqlx` structs, so `AuthService` can be unit-tested against
//!    mocks ([`mockall`]) instead of a live database.
//!
//! 2. **Connection Pool**: Repository holds a `PgPool` clone (Arc internally)
//!    for efficient connection sharing.
//!
//! 3. **Error Handling**: Database errors are mapped to [`shared::errors::ApiError`]
//!    for consistent HTTP responses.
//!
//! 4. **Soft Deletes**: All `users` queries filter by `deleted_at IS NULL`.

pub mod traits;
pub mod user_repository;

pub use traits::{AuditRepositoryTrait, UserRepositoryTrait};
pub use user_repository::{AuditRepository, UserRepository};
