//! # Identity Core - Authentication Service
//!
//! The **identity-service** is the core microservice responsible for user
//! authentication, session management, and second-factor enrollment for the
//! payments platform.
//!
//! ## Architecture Overview
//!
//! This service follows **Clean Architecture** principles with clear separation
//! between layers:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        HTTP Layer (api/)                        │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────────┐ │
//! │  │   routes    │  │  handlers   │  │    DTOs (Request/Res)   │ │
//! │  └──────┬──────┘  └──────┬──────┘  └────────────┬────────────┘ │
//! └─────────┼────────────────┼─────────────────────┼───────────────┘
//!           │                │                      │
//!           ▼                ▼                      ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Service Layer (service/)                     │
//! │  AuthService · AuditSink · Mailer                                │
//! └─────────────────────────────┼───────────────────────────────────┘
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                  Repository Layer (repository/)                 │
//! │  UserRepository · AuditRepository                                │
//! └─────────────────────────────┼───────────────────────────────────┘
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Domain Layer (domain/)                        │
//! │  Entities · Value Objects                                        │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Request Pipeline
//!
//! Every request passes through a stack of `from_fn` middleware layers
//! before reaching a handler:
//!
//! ```text
//! correlation → cors → logging → rate_limit → security_headers → body_cap
//!   → idempotency → [authenticate, protected routes only] → handler → audit
//! ```
//!
//! ## Security Features
//!
//! - **Encryption at rest**: email, phone, and TOTP secrets are sealed with
//!   AES-256-GCM ([`shared::crypto::CryptoBox`]); equality lookups use a
//!   keyed blind index rather than decrypting every row.
//! - **Password hashing**: Argon2id via [`shared::auth::password::PasswordHasher`].
//! - **JWT access tokens** (short-lived) plus **opaque, hashed, rotating
//!   refresh tokens** (longer-lived, revocable via database lookup).
//! - **Token blacklisting**: Redis-based, keyed by `jti`, checked on every
//!   authenticated request.
//! - **TOTP second factor** (RFC 6238) with step-up login.
//! - **Sliding-window rate limiting** with adaptive bans for repeat offenders.
//! - **Idempotency-key caching** for safe retries of mutating requests.
//!
//! ## Configuration
//!
//! Environment variables are loaded via [`shared::config::AppConfig`].
//!
//! ## Related Documentation
//!
//! - Authentication design: [`shared::auth`]
//! - JWT implementation: [`shared::auth::jwt`]
//! - Password security: [`shared::auth::password`]
//! - Encryption at rest: [`shared::crypto`]

use actix_cors::Cors;
use actix_web::{middleware as actix_middleware, web, App, HttpServer};
use shared::{
    auth::{jwt::JwtService, middleware::AuthMiddleware, password::PasswordHasher, totp::TotpService},
    config::AppConfig,
    crypto::CryptoBox,
    database, redis_client::RedisClient,
    tracing_config,
};
use std::sync::Arc;
use tracing::info;

mod api;
mod context;
mod domain;
mod middleware;
mod repository;
mod service;

use api::routes;
use repository::{AuditRepository, UserRepository};
use service::{AuditSink, AuthService, Mailer};

/// Shared application state injected into all request handlers and
/// middleware layers.
///
/// Wrapped in [`actix_web::web::Data`] and cloned per worker thread.
pub struct AppState {
    /// Authentication service with business logic for user operations
    pub auth_service: AuthService,
    /// JWT service for token operations, shared via Arc for efficiency
    pub jwt_service: Arc<JwtService>,
    /// Full application configuration, for middleware that needs tunables
    /// (rate limits, idempotency TTL) without a dedicated field.
    pub config: AppConfig,
    /// Redis client, shared with middleware that doesn't go through `AuthService`
    /// (rate limiting, idempotency caching).
    pub redis_client: RedisClient,
    /// Mirrors `config.cookie_secure` — whether HSTS should be sent.
    pub cookie_secure: bool,
    /// Applies JWT + blacklist validation for the protected route scope.
    pub auth_middleware: AuthMiddleware,
    /// Async audit log sink, submitted to from the tail middleware layer.
    pub audit_sink: AuditSink,
}

/// Application entry point and server initialization.
///
/// # Initialization Sequence
///
/// 1. Load configuration from environment variables
/// 2. Initialize structured logging/tracing
/// 3. Create PostgreSQL connection pool
/// 4. Create Redis client for caching/sessions
/// 5. Instantiate services with dependencies
/// 6. Configure and start HTTP server
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let config = AppConfig::from_env().expect("Failed to load configuration");

    tracing_config::init_tracing(&config.service_name, config.is_production());

    info!(
        service = %config.service_name,
        host = %config.server.host,
        port = %config.server.port,
        "Starting identity-service"
    );

    let db_pool = database::create_pool(&config.database)
        .await
        .expect("Failed to create database pool");

    let redis_client = RedisClient::new(&config.redis)
        .await
        .expect("Failed to connect to Redis");

    let jwt_service = Arc::new(JwtService::new(config.jwt.clone()));
    let password_hasher = Arc::new(PasswordHasher::new());

    let mut crypto = CryptoBox::new(
        config.crypto.key_id,
        &config.crypto.encryption_key_hex,
        &config.crypto.index_key_hex,
    )
    .expect("Failed to initialize encryption keyring");
    if let (Some(retired_hex), Some(retired_id)) =
        (config.crypto.retired_key_hex.as_deref(), config.crypto.retired_key_id)
    {
        crypto = crypto.with_retired_key(retired_id, retired_hex).expect("Failed to load retired encryption key");
    }
    let crypto = Arc::new(crypto);

    let totp = Arc::new(TotpService::new(
        config.totp.issuer.clone(),
        config.totp.digits,
        config.totp.step,
        config.totp.skew,
    ));

    let audit_sink = AuditSink::spawn(
        Arc::new(AuditRepository::new(db_pool.clone())),
        config.audit.queue_capacity,
        config.audit.worker_count,
    );
    let mailer = Mailer::spawn(config.mailer.queue_capacity, config.mailer.worker_count);

    let user_repository: Arc<dyn repository::UserRepositoryTrait> = Arc::new(UserRepository::new(db_pool.clone()));
    let auth_service = AuthService::new(
        user_repository,
        jwt_service.clone(),
        password_hasher,
        redis_client.clone(),
        config.jwt.clone(),
        crypto,
        totp,
        mailer,
    );

    let auth_middleware = AuthMiddleware::new(jwt_service.clone(), redis_client.clone());
    let cookie_secure = config.cookie_secure;

    let app_state = web::Data::new(AppState {
        auth_service,
        jwt_service,
        config,
        redis_client,
        cookie_secure,
        auth_middleware,
        audit_sink,
    });

    let db_pool = web::Data::new(db_pool);

    let server_host = app_state.config.server.host.clone();
    let server_port = app_state.config.server.port;

    info!("Server listening on {}:{}", server_host, server_port);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin() // TODO: restrict to known origins in production
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            // `.wrap()` calls stack innermost-first: the first call below
            // ends up closest to the handler, the last call ends up
            // outermost and therefore runs first on the way in. Read this
            // list bottom-to-top to see the actual request-processing
            // order: correlation id is assigned before anything logs or
            // CORS-checks the request, rate limiting happens before the
            // authenticated subrouter so unauthenticated floods are cheap,
            // and audit submission is the last thing touched before the
            // response leaves.
            .wrap(actix_middleware::from_fn(middleware::audit::audit))
            .wrap(actix_middleware::from_fn(middleware::idempotency::idempotency))
            .wrap(actix_middleware::from_fn(middleware::body_cap::body_cap))
            .wrap(actix_middleware::from_fn(middleware::security_headers::security_headers))
            .wrap(actix_middleware::from_fn(middleware::rate_limit::rate_limit))
            .wrap(tracing_actix_web::TracingLogger::default())
            .wrap(actix_middleware::Compress::default())
            .wrap(actix_middleware::Logger::default())
            .wrap(cors)
            .wrap(actix_middleware::from_fn(middleware::correlation::correlation))
            .app_data(app_state.clone())
            .app_data(db_pool.clone())
            .configure(routes::configure)
    })
    .bind((server_host, server_port))?
    .run()
    .await
}
