//! # Domain Entities
//!
//! Core data structures for the identity/session subsystem: persisted rows,
//! their decrypted "view" counterparts, and the insert shapes used by the
//! repository layer.
//!
//! ## PII handling
//!
//! `email`, `phone`, and the TOTP secret are stored as ciphertext produced by
//! [`shared::crypto::CryptoBox`]; email and phone additionally carry a blind
//! index column for equality lookup, since the ciphertext itself is
//! non-deterministic (a fresh nonce every time) and can't be matched with
//! `WHERE`. The repository never holds key material — callers (the service
//! layer) encrypt/decrypt and compute the blind index before/after crossing
//! the repository boundary.
//!
//! The password digest is never encrypted; it is already a one-way hash and
//! encrypting it again would add cost without adding security.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

// =============================================================================
// User
// =============================================================================

/// A registered account. Mirrors the `users` table.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub user_id: Uuid,
    pub email_ciphertext: Vec<u8>,
    pub email_blind_index: String,
    pub phone_ciphertext: Option<Vec<u8>>,
    pub phone_blind_index: Option<String>,
    pub hashed_password: String,
    pub first_name: String,
    pub last_name: String,
    pub user_type: String,
    pub country_code: String,
    pub email_verified: bool,
    pub totp_secret_ciphertext: Option<Vec<u8>>,
    pub totp_enabled: bool,
    pub failed_attempts: i32,
    pub locked_until: Option<DateTime<Utc>>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl User {
    /// `true` if `locked_until` is set and still in the future.
    pub fn is_locked(&self) -> bool {
        self.locked_until.map(|until| until > Utc::now()).unwrap_or(false)
    }
}

/// Decrypted, safe-to-serialize view of a user. Never carries the password
/// digest or the raw ciphertext/blind-index columns.
///
/// Built by the service layer, which holds the [`shared::crypto::CryptoBox`]
/// needed to decrypt `email_ciphertext`/`phone_ciphertext` — the repository
/// has no way to produce this on its own.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub user_id: Uuid,
    pub email: String,
    pub phone: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub user_type: String,
    pub country_code: String,
    pub email_verified: bool,
    pub totp_enabled: bool,
    pub created_at: DateTime<Utc>,
}

impl UserProfile {
    /// Assembles the view from a stored row plus its decrypted fields.
    pub fn from_user(user: &User, email: String, phone: Option<String>) -> Self {
        Self {
            user_id: user.user_id,
            email,
            phone,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            user_type: user.user_type.clone(),
            country_code: user.country_code.clone(),
            email_verified: user.email_verified,
            totp_enabled: user.totp_enabled,
            created_at: user.created_at,
        }
    }
}

/// Insert shape for registration.
///
/// Password is already hashed and email/phone already encrypted and
/// blind-indexed by the time this reaches the repository — it has no key
/// material to do either itself.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email_ciphertext: Vec<u8>,
    pub email_blind_index: String,
    pub phone_ciphertext: Option<Vec<u8>>,
    pub phone_blind_index: Option<String>,
    pub hashed_password: String,
    pub first_name: String,
    pub last_name: String,
    pub user_type: String,
    pub country_code: String,
}

// =============================================================================
// Verification Token
// =============================================================================

/// Fingerprint of a one-time email-verification code. Mirrors
/// `verification_tokens`. Single-use: destroyed on successful verification
/// or once expired.
#[derive(Debug, Clone, FromRow)]
pub struct VerificationToken {
    pub token_id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl VerificationToken {
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

#[derive(Debug, Clone)]
pub struct NewVerificationToken {
    pub user_id: Uuid,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
}

// =============================================================================
// Refresh Record
// =============================================================================

/// Fingerprint of an issued refresh token. Mirrors `refresh_records`.
#[derive(Debug, Clone, FromRow)]
pub struct RefreshRecord {
    pub token_id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub device_fingerprint: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl RefreshRecord {
    pub fn is_active(&self) -> bool {
        self.revoked_at.is_none() && self.expires_at > Utc::now()
    }
}

#[derive(Debug, Clone)]
pub struct NewRefreshRecord {
    pub user_id: Uuid,
    pub token_hash: String,
    pub device_fingerprint: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub expires_at: DateTime<Utc>,
}

// =============================================================================
// Device
// =============================================================================

/// A (user, device fingerprint) pair with trust and last-seen state.
/// Mirrors `devices`. Upserted on every login; trust is never set `true`
/// implicitly by this core — only stored and queried.
#[derive(Debug, Clone, FromRow)]
pub struct Device {
    pub user_id: Uuid,
    pub fingerprint: String,
    pub name: Option<String>,
    pub trusted: bool,
    pub ip_address: Option<String>,
    pub country_code: Option<String>,
    pub last_seen_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct DeviceSighting {
    pub user_id: Uuid,
    pub fingerprint: String,
    pub name: Option<String>,
    pub ip_address: Option<String>,
    pub country_code: Option<String>,
}

// =============================================================================
// Audit Entry
// =============================================================================

/// Immutable, append-only audit record. Mirrors `audit_entries`.
#[derive(Debug, Clone, FromRow)]
pub struct AuditEntry {
    pub entry_id: Uuid,
    pub correlation_id: String,
    pub user_id: Option<Uuid>,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub status_code: i32,
    pub error_message: Option<String>,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Insert shape submitted to [`crate::service::audit_sink::AuditSink`].
#[derive(Debug, Clone)]
pub struct NewAuditEntry {
    pub correlation_id: String,
    pub user_id: Option<Uuid>,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub status_code: i32,
    pub error_message: Option<String>,
    pub metadata: serde_json::Value,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_user() -> User {
        User {
            user_id: Uuid::new_v4(),
            email_ciphertext: vec![1, 2, 3],
            email_blind_index: "idx".to_string(),
            phone_ciphertext: None,
            phone_blind_index: None,
            hashed_password: "$argon2id$...".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            user_type: "individual".to_string(),
            country_code: "GB".to_string(),
            email_verified: false,
            totp_secret_ciphertext: None,
            totp_enabled: false,
            failed_attempts: 0,
            locked_until: None,
            last_login_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        }
    }

    #[test]
    fn user_not_locked_without_locked_until() {
        assert!(!sample_user().is_locked());
    }

    #[test]
    fn user_locked_when_locked_until_is_future() {
        let mut user = sample_user();
        user.locked_until = Some(Utc::now() + Duration::minutes(5));
        assert!(user.is_locked());
    }

    #[test]
    fn user_not_locked_when_locked_until_is_past() {
        let mut user = sample_user();
        user.locked_until = Some(Utc::now() - Duration::minutes(5));
        assert!(!user.is_locked());
    }

    #[test]
    fn user_profile_never_carries_password_digest() {
        let user = sample_user();
        let profile = UserProfile::from_user(&user, "ada@example.com".to_string(), None);
        let json = serde_json::to_string(&profile).unwrap();
        assert!(!json.contains("argon2"));
        assert!(json.contains("ada@example.com"));
    }

    #[test]
    fn verification_token_expiry() {
        let mut token = VerificationToken {
            token_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            token_hash: "hash".to_string(),
            expires_at: Utc::now() + Duration::hours(1),
            created_at: Utc::now(),
        };
        assert!(!token.is_expired());
        token.expires_at = Utc::now() - Duration::seconds(1);
        assert!(token.is_expired());
    }

    #[test]
    fn refresh_record_inactive_once_revoked() {
        let mut record = RefreshRecord {
            token_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            token_hash: "hash".to_string(),
            device_fingerprint: None,
            ip_address: None,
            user_agent: None,
            expires_at: Utc::now() + Duration::days(30),
            created_at: Utc::now(),
            revoked_at: None,
        };
        assert!(record.is_active());
        record.revoked_at = Some(Utc::now());
        assert!(!record.is_active());
    }
}
