//! # Middleware
//!
//! Every layer is an `actix_web::middleware::from_fn` functional middleware
//! rather than a hand-rolled `Service`/`Transform` pair — the same style
//! `actix-web` ships and the workspace's existing `actix-web` dependency
//! already supports.
//!
//! ## Ordering (outermost first)
//!
//! ```text
//! correlation → cors → logging → rate_limit → security_headers → body_cap
//!   → idempotency → audit → [authenticate, protected scope only] → handler
//! ```
//!
//! `audit` submits its entry on the way back out, after the handler (and, on
//! the protected scope, `authenticate`) have run — so it can read
//! `AuthenticatedUser` off the response's request extensions. `authenticate`
//! is only applied to the protected route scope in `api/routes.rs`; every
//! other layer wraps the whole app from `main.rs`.

pub mod audit;
pub mod authenticate;
pub mod body_cap;
pub mod correlation;
pub mod idempotency;
pub mod rate_limit;
pub mod security_headers;
