//! # Domain Layer
//!
//! The domain layer contains the core business entities for the
//! authentication service. This layer is **framework-agnostic** and
//! represents the heart of the business logic.
//!
//! ## Clean Architecture Principles
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                         Domain Layer                              │
//! │  ┌─────────────────────────────────────────────────────────────┐  │
//! │  │                       Entities                              │  │
//! │  │  - User: account with encrypted PII and lockout state       │  │
//! │  │  - UserProfile: decrypted, safe-to-serialize user view      │  │
//! │  │  - VerificationToken, RefreshRecord: one-time/session tokens │  │
//! │  │  - Device: trusted-device tracking                          │  │
//! │  │  - AuditEntry: append-only audit record                     │  │
//! │  └─────────────────────────────────────────────────────────────┘  │
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Structure
//!
//! | Module     | Purpose                                           |
//! |------------|---------------------------------------------------|
//! | `entities` | Core domain entities mapped to database tables    |
//!
//! ## Design Decisions
//!
//! 1. **Entities vs DTOs**: Domain entities contain all database fields,
//!    while separate DTOs in the API layer handle request/response transformation.
//!
//! 2. **`FromRow` Derive**: Entities use sqlx's `FromRow` for automatic
//!    mapping from database rows, reducing boilerplate.
//!
//! 3. **Soft Deletes**: The `deleted_at` field enables soft deletion,
//!    preserving data for audit trails.

pub mod entities;

pub use entities::*;
