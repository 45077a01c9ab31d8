//! # Authentication Service
//!
//! Core business logic for the identity subsystem:
//! - Registration, login (with optional TOTP step-up), logout
//! - Token issuance, rotation, and session revocation
//! - Email verification
//! - TOTP enrollment/confirmation/disable
//! - Password change
//!
//! ## Security Model
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Token Architecture                              │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────────┐                      ┌─────────────────────────┐   │
//! │  │  Access Token   │                      │    Refresh Token        │   │
//! │  │  (JWT, 15 min)  │                      │    (Opaque, 7 days)     │   │
//! │  └────────┬────────┘                      └───────────┬─────────────┘   │
//! │           │                                           │                 │
//! │           │ Stored in:                                │ Stored in:      │
//! │           │ - Memory (frontend)                       │ - HttpOnly      │
//! │           │ - Authorization header                    │   cookie        │
//! │           │                                           │ - Database      │
//! │           │                                           │   (hashed)      │
//! │           ▼                                           ▼                 │
//! │  ┌─────────────────┐                      ┌─────────────────────────┐   │
//! │  │ Stateless       │                      │ Stateful (revocable)    │   │
//! │  │ verification    │                      │ via database lookup     │   │
//! │  └─────────────────┘                      └─────────────────────────┘   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every issued access token's `jti` is also tracked in an active-token Redis
//! set keyed by user id, so [`AuthService::change_password`] can blacklist an
//! entire user's live sessions in bulk without a `token_version` claim.
//!
//! ## Error Handling
//!
//! All methods return `Result<T, ApiError>`. Sensitive operations use
//! generic error messages to prevent enumeration: an unknown email and a
//! wrong password both return `InvalidCredentials`, and the unknown-email
//! path still runs a full password hash to avoid a timing tell.

use chrono::{Duration as ChronoDuration, Utc};
use sha2::{Digest, Sha256};
use shared::{
    auth::{jwt::JwtService, password::PasswordHasher, totp::TotpService, TokenPair},
    config::JwtConfig,
    crypto::{CryptoBox, CryptoError},
    errors::ApiError,
    redis_client::RedisClient,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    domain::entities::{DeviceSighting, NewRefreshRecord, NewUser, NewVerificationToken, User, UserProfile},
    repository::traits::UserRepositoryTrait,
    service::mailer::Mailer,
};

// =============================================================================
// SERVICE STRUCT
// =============================================================================

/// Core orchestration for every identity operation.
///
/// # Thread Safety
///
/// `AuthService` is `Send + Sync` and shared across Actix-web workers behind
/// an `Arc`-backed `Clone`: `repository` is a `dyn` trait object so it can be
/// swapped for a mock in tests, `JwtService`/`PasswordHasher`/`CryptoBox`/
/// `TotpService` are wrapped in `Arc`, and `RedisClient`/`Mailer` are
/// themselves cheap to clone.
#[derive(Clone)]
pub struct AuthService {
    repository: Arc<dyn UserRepositoryTrait>,
    jwt_service: Arc<JwtService>,
    password_hasher: Arc<PasswordHasher>,
    redis_client: RedisClient,
    jwt_config: JwtConfig,
    crypto: Arc<CryptoBox>,
    totp: Arc<TotpService>,
    mailer: Mailer,
}

/// Response returned after a completed authentication (registration, login,
/// or a successful TOTP step-up).
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    #[serde(flatten)]
    pub tokens: TokenPair,
    pub user: UserProfile,
}

/// Material returned from starting TOTP enrollment: the raw secret (shown
/// once, for manual entry) and the `otpauth://` URL for QR-code scanning.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TotpEnrollment {
    pub secret: String,
    pub provisioning_uri: String,
}

impl AuthService {
    const MAX_FAILED_ATTEMPTS: i32 = 5;
    const LOCK_MINUTES: i64 = 15;
    const VERIFICATION_TOKEN_TTL_HOURS: i64 = 24;
    const TOTP_CHALLENGE_TTL_SECS: u64 = 300;

    #[allow(clippy::too_many_arguments)]
    pub fn new(
        repository: Arc<dyn UserRepositoryTrait>,
        jwt_service: Arc<JwtService>,
        password_hasher: Arc<PasswordHasher>,
        redis_client: RedisClient,
        jwt_config: JwtConfig,
        crypto: Arc<CryptoBox>,
        totp: Arc<TotpService>,
        mailer: Mailer,
    ) -> Self {
        Self {
            repository,
            jwt_service,
            password_hasher,
            redis_client,
            jwt_config,
            crypto,
            totp,
            mailer,
        }
    }

    // =========================================================================
    // REGISTRATION
    // =========================================================================

    /// Registers a new account, issues a verification email, and returns an
    /// initial token pair — registration logs the user straight in.
    #[allow(clippy::too_many_arguments)]
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        first_name: &str,
        last_name: &str,
        phone: Option<&str>,
        user_type: &str,
        country_code: &str,
    ) -> Result<AuthResponse, ApiError> {
        shared::auth::password::PasswordValidator::validate(password)
            .map_err(|errors| ApiError::BadRequest { message: errors.join(", ") })?;

        let hashed_password = self.password_hasher.hash(password)?;
        let email_ciphertext = self.crypto.encrypt(email).map_err(Self::crypto_err)?;
        let email_blind_index = self.crypto.blind_index(email);
        let (phone_ciphertext, phone_blind_index) = match phone {
            Some(p) => (
                Some(self.crypto.encrypt(p).map_err(Self::crypto_err)?),
                Some(self.crypto.blind_index(p)),
            ),
            None => (None, None),
        };

        let new_user = NewUser {
            email_ciphertext,
            email_blind_index,
            phone_ciphertext,
            phone_blind_index,
            hashed_password,
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            user_type: user_type.to_string(),
            country_code: country_code.to_string(),
        };

        let user = self.repository.create(new_user).await?;

        info!(user_id = %user.user_id, "user registered");

        self.issue_verification_token(&user, email).await?;

        let tokens = self.generate_and_store_tokens(&user, None, None, None).await?;
        let profile = UserProfile::from_user(&user, email.to_string(), phone.map(str::to_string));

        Ok(AuthResponse { tokens, user: profile })
    }

    // =========================================================================
    // LOGIN
    // =========================================================================

    /// Authenticates with email and password.
    ///
    /// Returns `Err(ApiError::TotpRequired { challenge_token })` when the
    /// account has TOTP enabled; the caller completes the login via
    /// [`Self::verify_totp_login`].
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        device_fingerprint: Option<String>,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) -> Result<AuthResponse, ApiError> {
        let blind_index = self.crypto.blind_index(email);
        let user = match self.repository.find_by_email_blind_index(&blind_index).await? {
            Some(u) => u,
            None => {
                // Run a full hash so an unknown email takes the same time as
                // a known email with the wrong password.
                let _ = self.password_hasher.hash(password);
                warn!(email = %email, "login attempt for unknown email");
                return Err(ApiError::InvalidCredentials);
            }
        };

        if user.is_locked() {
            return Err(ApiError::AccountLocked { until: user.locked_until.unwrap() });
        }

        if !self.password_hasher.verify(password, &user.hashed_password)? {
            let attempts = self.repository.increment_failed_attempts(user.user_id).await?;
            if attempts >= Self::MAX_FAILED_ATTEMPTS {
                let until = Utc::now() + ChronoDuration::minutes(Self::LOCK_MINUTES);
                self.repository.lock_until(user.user_id, until).await?;
                warn!(user_id = %user.user_id, "account locked after repeated failed logins");
            } else {
                warn!(user_id = %user.user_id, attempts, "failed login attempt");
            }
            return Err(ApiError::InvalidCredentials);
        }

        self.repository.reset_failed_attempts(user.user_id).await?;

        if self.password_hasher.needs_upgrade(&user.hashed_password) {
            match self.password_hasher.hash(password) {
                Ok(rehashed) => {
                    if let Err(e) = self.repository.update_password(user.user_id, &rehashed).await {
                        warn!(user_id = %user.user_id, error = %e, "failed to persist rehashed password");
                    }
                }
                Err(e) => warn!(user_id = %user.user_id, error = %e, "failed to rehash password on upgrade"),
            }
        }

        if user.totp_enabled {
            let challenge_token = Self::generate_random_token();
            let packed = format!(
                "{}|{}|{}|{}",
                user.user_id,
                device_fingerprint.as_deref().unwrap_or(""),
                ip_address.as_deref().unwrap_or(""),
                user_agent.as_deref().unwrap_or(""),
            );
            self.redis_client
                .store_totp_challenge(&challenge_token, &packed, Duration::from_secs(Self::TOTP_CHALLENGE_TTL_SECS))
                .await?;
            return Err(ApiError::TotpRequired { challenge_token });
        }

        self.finish_login(user, device_fingerprint, ip_address, user_agent).await
    }

    /// Completes a login that was paused on [`ApiError::TotpRequired`].
    pub async fn verify_totp_login(&self, challenge_token: &str, code: &str) -> Result<AuthResponse, ApiError> {
        let packed = self
            .redis_client
            .consume_totp_challenge(challenge_token)
            .await?
            .ok_or(ApiError::InvalidToken)?;

        let mut parts = packed.splitn(4, '|');
        let user_id: Uuid = parts
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or(ApiError::InvalidToken)?;
        let device_fingerprint = parts.next().filter(|s| !s.is_empty()).map(str::to_string);
        let ip_address = parts.next().filter(|s| !s.is_empty()).map(str::to_string);
        let user_agent = parts.next().filter(|s| !s.is_empty()).map(str::to_string);

        let user = self.repository.find_by_id(user_id).await?.ok_or(ApiError::InvalidToken)?;
        let secret_ciphertext = user.totp_secret_ciphertext.as_ref().ok_or(ApiError::InvalidToken)?;
        let secret = self.crypto.decrypt(secret_ciphertext).map_err(Self::crypto_err)?;
        let email = self.crypto.decrypt(&user.email_ciphertext).map_err(Self::crypto_err)?;

        if !self.totp.verify(&email, &secret, code).map_err(Self::totp_err)? {
            return Err(ApiError::InvalidCredentials);
        }

        self.finish_login(user, device_fingerprint, ip_address, user_agent).await
    }

    async fn finish_login(
        &self,
        user: User,
        device_fingerprint: Option<String>,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) -> Result<AuthResponse, ApiError> {
        self.repository.update_last_login(user.user_id).await?;

        if let Some(fingerprint) = device_fingerprint.clone() {
            self.repository
                .upsert_device(DeviceSighting {
                    user_id: user.user_id,
                    fingerprint,
                    name: None,
                    ip_address: ip_address.clone(),
                    country_code: None,
                })
                .await?;
        }

        let tokens = self
            .generate_and_store_tokens(&user, device_fingerprint, ip_address, user_agent)
            .await?;

        info!(user_id = %user.user_id, "user logged in");

        let email = self.crypto.decrypt(&user.email_ciphertext).map_err(Self::crypto_err)?;
        let phone = user
            .phone_ciphertext
            .as_ref()
            .map(|c| self.crypto.decrypt(c))
            .transpose()
            .map_err(Self::crypto_err)?;
        let profile = UserProfile::from_user(&user, email, phone);

        Ok(AuthResponse { tokens, user: profile })
    }

    // =========================================================================
    // TOKEN REFRESH
    // =========================================================================

    /// Rotates a refresh token: the old one is revoked and a new pair issued.
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<TokenPair, ApiError> {
        let token_hash = Self::hash_token(refresh_token);

        let stored = self
            .repository
            .find_refresh_record(&token_hash)
            .await?
            .ok_or(ApiError::InvalidToken)?;

        if !stored.is_active() {
            return Err(ApiError::InvalidToken);
        }

        let user = self
            .repository
            .find_by_id(stored.user_id)
            .await?
            .ok_or(ApiError::InvalidToken)?;

        self.repository.revoke_refresh_record(stored.token_id).await?;

        info!(user_id = %user.user_id, "token refreshed");

        self.generate_and_store_tokens(
            &user,
            stored.device_fingerprint,
            stored.ip_address,
            stored.user_agent,
        )
        .await
    }

    // =========================================================================
    // LOGOUT
    // =========================================================================

    /// Revokes the current session: blacklists the access token's `jti` and
    /// the refresh record tied to it.
    pub async fn logout(&self, user_id: Uuid, access_token: &str, refresh_token: &str) -> Result<(), ApiError> {
        if let Ok(claims) = self.jwt_service.validate_access_token(access_token) {
            let ttl = Self::remaining_ttl(claims.exp);
            if let Err(e) = self.redis_client.blacklist_token(&claims.jti.to_string(), ttl).await {
                warn!(error = %e, "failed to blacklist access token on logout");
            }
        }

        let token_hash = Self::hash_token(refresh_token);
        if let Some(record) = self.repository.find_refresh_record(&token_hash).await? {
            self.repository.revoke_refresh_record(record.token_id).await?;
        }

        info!(user_id = %user_id, "user logged out");

        Ok(())
    }

    // =========================================================================
    // USER PROFILE
    // =========================================================================

    pub async fn get_profile(&self, user_id: Uuid) -> Result<UserProfile, ApiError> {
        let user = self
            .repository
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| ApiError::NotFound { resource: format!("user:{}", user_id) })?;

        let email = self.crypto.decrypt(&user.email_ciphertext).map_err(Self::crypto_err)?;
        let phone = user
            .phone_ciphertext
            .as_ref()
            .map(|c| self.crypto.decrypt(c))
            .transpose()
            .map_err(Self::crypto_err)?;

        Ok(UserProfile::from_user(&user, email, phone))
    }

    // =========================================================================
    // EMAIL VERIFICATION
    // =========================================================================

    /// Re-sends a verification link for an already-registered, unverified
    /// account, resolved by email rather than an authenticated session (the
    /// caller hasn't verified their address yet, so there's no token to
    /// authenticate with). No-op if the email is unknown or already
    /// verified, so the response never reveals whether an account exists.
    pub async fn send_verification(&self, email: &str) -> Result<(), ApiError> {
        let blind_index = self.crypto.blind_index(email);
        let Some(user) = self.repository.find_by_email_blind_index(&blind_index).await? else {
            return Ok(());
        };

        if user.email_verified {
            return Ok(());
        }

        self.issue_verification_token(&user, email).await
    }

    async fn issue_verification_token(&self, user: &User, email: &str) -> Result<(), ApiError> {
        let token = Self::generate_random_token();
        let token_hash = Self::hash_token(&token);
        let expires_at = Utc::now() + ChronoDuration::hours(Self::VERIFICATION_TOKEN_TTL_HOURS);

        self.repository
            .create_verification_token(NewVerificationToken {
                user_id: user.user_id,
                token_hash,
                expires_at,
            })
            .await?;

        let link = format!("https://app.identity-core.example/verify?token={}", token);
        self.mailer.send_verification(
            email,
            &link,
            Duration::from_secs(Self::VERIFICATION_TOKEN_TTL_HOURS as u64 * 3600),
        );

        Ok(())
    }

    /// Verifies email using a verification token, returning the user id.
    pub async fn verify_email(&self, token: &str) -> Result<Uuid, ApiError> {
        let token_hash = Self::hash_token(token);

        let record = self
            .repository
            .find_verification_token(&token_hash)
            .await?
            .ok_or_else(|| ApiError::BadRequest { message: "invalid verification token".to_string() })?;

        if record.is_expired() {
            self.repository.delete_verification_token(record.token_id).await?;
            return Err(ApiError::BadRequest { message: "verification token expired".to_string() });
        }

        self.repository.set_email_verified(record.user_id).await?;
        self.repository.delete_verification_token(record.token_id).await?;

        info!(user_id = %record.user_id, "email verified");

        Ok(record.user_id)
    }

    // =========================================================================
    // TOTP
    // =========================================================================

    /// Starts TOTP enrollment: generates a secret, stores it encrypted, and
    /// returns the provisioning material. The secret is not yet active —
    /// [`Self::confirm_totp`] must succeed first.
    pub async fn setup_totp(&self, user_id: Uuid) -> Result<TotpEnrollment, ApiError> {
        let user = self
            .repository
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| ApiError::NotFound { resource: format!("user:{}", user_id) })?;

        if user.totp_enabled {
            return Err(ApiError::Conflict { resource: "totp already enabled".to_string() });
        }

        let email = self.crypto.decrypt(&user.email_ciphertext).map_err(Self::crypto_err)?;
        let secret = TotpService::generate_secret();
        let provisioning_uri = self.totp.provisioning_uri(&email, &secret).map_err(Self::totp_err)?;

        let secret_ciphertext = self.crypto.encrypt(&secret).map_err(Self::crypto_err)?;
        self.repository.set_totp_secret(user_id, secret_ciphertext).await?;

        Ok(TotpEnrollment { secret, provisioning_uri })
    }

    /// Confirms enrollment with a code from the authenticator app, activating TOTP.
    pub async fn confirm_totp(&self, user_id: Uuid, code: &str) -> Result<(), ApiError> {
        let user = self
            .repository
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| ApiError::NotFound { resource: format!("user:{}", user_id) })?;

        let secret_ciphertext = user
            .totp_secret_ciphertext
            .as_ref()
            .ok_or_else(|| ApiError::BadRequest { message: "totp enrollment not started".to_string() })?;

        let secret = self.crypto.decrypt(secret_ciphertext).map_err(Self::crypto_err)?;
        let email = self.crypto.decrypt(&user.email_ciphertext).map_err(Self::crypto_err)?;

        if !self.totp.verify(&email, &secret, code).map_err(Self::totp_err)? {
            return Err(ApiError::BadRequest { message: "invalid code".to_string() });
        }

        self.repository.enable_totp(user_id).await?;
        info!(user_id = %user_id, "totp enabled");

        Ok(())
    }

    /// Disables TOTP, requiring a valid current code as proof of possession.
    pub async fn disable_totp(&self, user_id: Uuid, code: &str) -> Result<(), ApiError> {
        let user = self
            .repository
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| ApiError::NotFound { resource: format!("user:{}", user_id) })?;

        if !user.totp_enabled {
            return Ok(());
        }

        let secret_ciphertext = user.totp_secret_ciphertext.as_ref().ok_or(ApiError::InvalidToken)?;
        let secret = self.crypto.decrypt(secret_ciphertext).map_err(Self::crypto_err)?;
        let email = self.crypto.decrypt(&user.email_ciphertext).map_err(Self::crypto_err)?;

        if !self.totp.verify(&email, &secret, code).map_err(Self::totp_err)? {
            return Err(ApiError::InvalidCredentials);
        }

        self.repository.disable_totp(user_id).await?;
        info!(user_id = %user_id, "totp disabled");

        Ok(())
    }

    /// `true` if the account has TOTP enabled.
    pub async fn totp_status(&self, user_id: Uuid) -> Result<bool, ApiError> {
        let user = self
            .repository
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| ApiError::NotFound { resource: format!("user:{}", user_id) })?;
        Ok(user.totp_enabled)
    }

    // =========================================================================
    // PASSWORD CHANGE
    // =========================================================================

    /// Changes the account password and revokes every active session.
    pub async fn change_password(&self, user_id: Uuid, current_password: &str, new_password: &str) -> Result<(), ApiError> {
        let user = self
            .repository
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| ApiError::NotFound { resource: format!("user:{}", user_id) })?;

        if !self.password_hasher.verify(current_password, &user.hashed_password)? {
            return Err(ApiError::InvalidCredentials);
        }

        shared::auth::password::PasswordValidator::validate(new_password)
            .map_err(|errors| ApiError::BadRequest { message: errors.join(", ") })?;

        let hashed_password = self.password_hasher.hash(new_password)?;
        self.repository.update_password(user_id, &hashed_password).await?;

        let blacklist_ttl = Duration::from_secs(self.jwt_config.refresh_token_ttl_seconds);
        if let Err(e) = self
            .redis_client
            .blacklist_all_active_tokens(&user_id.to_string(), blacklist_ttl)
            .await
        {
            warn!(error = %e, "failed to revoke active sessions after password change");
        }

        info!(user_id = %user_id, "password changed");

        Ok(())
    }

    // =========================================================================
    // HELPER METHODS
    // =========================================================================

    /// Generates a token pair, tracks the access token's `jti` for bulk
    /// revocation, and stores the hashed refresh token.
    async fn generate_and_store_tokens(
        &self,
        user: &User,
        device_fingerprint: Option<String>,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) -> Result<TokenPair, ApiError> {
        let email = self.crypto.decrypt(&user.email_ciphertext).map_err(Self::crypto_err)?;
        let tokens = self.jwt_service.generate_tokens(user.user_id, &email, &user.user_type)?;

        if let Ok(claims) = self.jwt_service.validate_access_token(&tokens.access_token) {
            let ttl = Duration::from_secs(self.jwt_config.access_token_ttl_seconds);
            if let Err(e) = self
                .redis_client
                .track_active_token(&user.user_id.to_string(), &claims.jti.to_string(), ttl)
                .await
            {
                warn!(error = %e, "failed to track active token");
            }
        }

        let token_hash = Self::hash_token(&tokens.refresh_token);
        let expires_at = Utc::now() + ChronoDuration::seconds(self.jwt_config.refresh_token_ttl_seconds as i64);

        self.repository
            .create_refresh_record(NewRefreshRecord {
                user_id: user.user_id,
                token_hash,
                device_fingerprint,
                ip_address,
                user_agent,
                expires_at,
            })
            .await?;

        Ok(tokens)
    }

    /// Hashes a token using SHA-256, for deterministic refresh/verification lookups.
    fn hash_token(token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Generates a cryptographically secure random token.
    fn generate_random_token() -> String {
        use rand::Rng;
        let bytes: [u8; 32] = rand::thread_rng().gen();
        hex::encode(bytes)
    }

    /// Remaining lifetime of a token given its `exp` claim, floored at 1 second.
    fn remaining_ttl(exp: i64) -> Duration {
        let remaining = exp - Utc::now().timestamp();
        Duration::from_secs(remaining.max(1) as u64)
    }

    fn crypto_err(e: CryptoError) -> ApiError {
        ApiError::InternalError { message: format!("crypto error: {}", e) }
    }

    fn totp_err(e: shared::auth::totp::TotpError) -> ApiError {
        ApiError::InternalError { message: format!("totp error: {}", e) }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_token_deterministic() {
        let token = "test_token_123";
        assert_eq!(AuthService::hash_token(token), AuthService::hash_token(token));
    }

    #[test]
    fn test_hash_token_different_inputs() {
        assert_ne!(AuthService::hash_token("token1"), AuthService::hash_token("token2"));
    }

    #[test]
    fn test_generate_random_token_unique() {
        let token1 = AuthService::generate_random_token();
        let token2 = AuthService::generate_random_token();
        assert_ne!(token1, token2);
        assert_eq!(token1.len(), 64);
    }

    #[test]
    fn test_remaining_ttl_floors_at_one_second() {
        let expired = Utc::now().timestamp() - 3600;
        assert_eq!(AuthService::remaining_ttl(expired), Duration::from_secs(1));
    }

    #[test]
    fn test_remaining_ttl_future_expiry() {
        let exp = Utc::now().timestamp() + 900;
        let ttl = AuthService::remaining_ttl(exp);
        assert!(ttl.as_secs() <= 900 && ttl.as_secs() > 890);
    }
}
