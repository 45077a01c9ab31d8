//! # User Repository
//!
//! `sqlx`-backed implementation of [`UserRepositoryTrait`] and
//! [`AuditRepositoryTrait`]. Encapsulates all database access for the
//! identity subsystem; the service layer never writes SQL directly.
//!
//! ## Conventions
//!
//! - One `FromRow` struct per table, parameterized queries throughout.
//! - Soft deletes: every `users` query filters `deleted_at IS NULL`.
//! - The repository never holds crypto key material — callers pass in
//!   already-encrypted ciphertext and pre-computed blind indexes.

use chrono::{DateTime, Utc};
use shared::errors::ApiError;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entities::{
    AuditEntry, Device, DeviceSighting, NewAuditEntry, NewRefreshRecord, NewUser,
    NewVerificationToken, RefreshRecord, User, VerificationToken,
};
use crate::repository::traits::{AuditRepositoryTrait, UserRepositoryTrait};

use async_trait::async_trait;

/// `sqlx`-backed repository for the `users`, `verification_tokens`,
/// `refresh_records`, and `devices` tables.
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Maps a unique-constraint violation on the email blind index to a
    /// domain-meaningful conflict; everything else is a database error.
    fn map_insert_error(err: sqlx::Error) -> ApiError {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.constraint() == Some("users_email_blind_index_key") {
                return ApiError::Conflict { resource: "email already registered".to_string() };
            }
        }
        ApiError::DatabaseError(err)
    }
}

#[async_trait]
impl UserRepositoryTrait for UserRepository {
    async fn create(&self, new_user: NewUser) -> Result<User, ApiError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (
                user_id, email_ciphertext, email_blind_index,
                phone_ciphertext, phone_blind_index, hashed_password,
                first_name, last_name, user_type, country_code,
                email_verified, totp_enabled, failed_attempts,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, false, false, 0, now(), now())
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new_user.email_ciphertext)
        .bind(&new_user.email_blind_index)
        .bind(&new_user.phone_ciphertext)
        .bind(&new_user.phone_blind_index)
        .bind(&new_user.hashed_password)
        .bind(&new_user.first_name)
        .bind(&new_user.last_name)
        .bind(&new_user.user_type)
        .bind(&new_user.country_code)
        .fetch_one(&self.pool)
        .await
        .map_err(Self::map_insert_error)
    }

    async fn find_by_email_blind_index(&self, blind_index: &str) -> Result<Option<User>, ApiError> {
        sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE email_blind_index = $1 AND deleted_at IS NULL",
        )
        .bind(blind_index)
        .fetch_optional(&self.pool)
        .await
        .map_err(ApiError::DatabaseError)
    }

    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>, ApiError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE user_id = $1 AND deleted_at IS NULL")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(ApiError::DatabaseError)
    }

    async fn update_password(&self, user_id: Uuid, hashed_password: &str) -> Result<(), ApiError> {
        sqlx::query("UPDATE users SET hashed_password = $1, updated_at = now() WHERE user_id = $2")
            .bind(hashed_password)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(ApiError::DatabaseError)?;
        Ok(())
    }

    async fn set_email_verified(&self, user_id: Uuid) -> Result<(), ApiError> {
        sqlx::query("UPDATE users SET email_verified = true, updated_at = now() WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(ApiError::DatabaseError)?;
        Ok(())
    }

    async fn set_totp_secret(&self, user_id: Uuid, secret_ciphertext: Vec<u8>) -> Result<(), ApiError> {
        sqlx::query(
            "UPDATE users SET totp_secret_ciphertext = $1, updated_at = now() WHERE user_id = $2",
        )
        .bind(secret_ciphertext)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(ApiError::DatabaseError)?;
        Ok(())
    }

    async fn enable_totp(&self, user_id: Uuid) -> Result<(), ApiError> {
        sqlx::query("UPDATE users SET totp_enabled = true, updated_at = now() WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(ApiError::DatabaseError)?;
        Ok(())
    }

    async fn disable_totp(&self, user_id: Uuid) -> Result<(), ApiError> {
        sqlx::query(
            "UPDATE users SET totp_enabled = false, totp_secret_ciphertext = NULL, updated_at = now() WHERE user_id = $1",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(ApiError::DatabaseError)?;
        Ok(())
    }

    async fn increment_failed_attempts(&self, user_id: Uuid) -> Result<i32, ApiError> {
        let row: (i32,) = sqlx::query_as(
            "UPDATE users SET failed_attempts = failed_attempts + 1, updated_at = now() WHERE user_id = $1 RETURNING failed_attempts",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(ApiError::DatabaseError)?;
        Ok(row.0)
    }

    async fn reset_failed_attempts(&self, user_id: Uuid) -> Result<(), ApiError> {
        sqlx::query(
            "UPDATE users SET failed_attempts = 0, locked_until = NULL, updated_at = now() WHERE user_id = $1",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(ApiError::DatabaseError)?;
        Ok(())
    }

    async fn lock_until(&self, user_id: Uuid, until: DateTime<Utc>) -> Result<(), ApiError> {
        sqlx::query("UPDATE users SET locked_until = $1, updated_at = now() WHERE user_id = $2")
            .bind(until)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(ApiError::DatabaseError)?;
        Ok(())
    }

    async fn update_last_login(&self, user_id: Uuid) -> Result<(), ApiError> {
        sqlx::query("UPDATE users SET last_login_at = now(), updated_at = now() WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(ApiError::DatabaseError)?;
        Ok(())
    }

    async fn upsert_device(&self, sighting: DeviceSighting) -> Result<Device, ApiError> {
        sqlx::query_as::<_, Device>(
            r#"
            INSERT INTO devices (user_id, fingerprint, name, trusted, ip_address, country_code, last_seen_at, created_at)
            VALUES ($1, $2, $3, false, $4, $5, now(), now())
            ON CONFLICT (user_id, fingerprint) DO UPDATE SET
                name = COALESCE(EXCLUDED.name, devices.name),
                ip_address = EXCLUDED.ip_address,
                country_code = COALESCE(EXCLUDED.country_code, devices.country_code),
                last_seen_at = now()
            RETURNING *
            "#,
        )
        .bind(sighting.user_id)
        .bind(&sighting.fingerprint)
        .bind(&sighting.name)
        .bind(&sighting.ip_address)
        .bind(&sighting.country_code)
        .fetch_one(&self.pool)
        .await
        .map_err(ApiError::DatabaseError)
    }

    async fn is_device_trusted(&self, user_id: Uuid, fingerprint: &str) -> Result<bool, ApiError> {
        let row: Option<(bool,)> = sqlx::query_as(
            "SELECT trusted FROM devices WHERE user_id = $1 AND fingerprint = $2",
        )
        .bind(user_id)
        .bind(fingerprint)
        .fetch_optional(&self.pool)
        .await
        .map_err(ApiError::DatabaseError)?;
        Ok(row.map(|(trusted,)| trusted).unwrap_or(false))
    }

    async fn create_verification_token(
        &self,
        token: NewVerificationToken,
    ) -> Result<VerificationToken, ApiError> {
        sqlx::query_as::<_, VerificationToken>(
            r#"
            INSERT INTO verification_tokens (token_id, user_id, token_hash, expires_at, created_at)
            VALUES ($1, $2, $3, $4, now())
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(token.user_id)
        .bind(&token.token_hash)
        .bind(token.expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(ApiError::DatabaseError)
    }

    async fn find_verification_token(
        &self,
        token_hash: &str,
    ) -> Result<Option<VerificationToken>, ApiError> {
        sqlx::query_as::<_, VerificationToken>(
            "SELECT * FROM verification_tokens WHERE token_hash = $1",
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(ApiError::DatabaseError)
    }

    async fn delete_verification_token(&self, token_id: Uuid) -> Result<(), ApiError> {
        sqlx::query("DELETE FROM verification_tokens WHERE token_id = $1")
            .bind(token_id)
            .execute(&self.pool)
            .await
            .map_err(ApiError::DatabaseError)?;
        Ok(())
    }

    async fn create_refresh_record(
        &self,
        record: NewRefreshRecord,
    ) -> Result<RefreshRecord, ApiError> {
        sqlx::query_as::<_, RefreshRecord>(
            r#"
            INSERT INTO refresh_records (
                token_id, user_id, token_hash, device_fingerprint,
                ip_address, user_agent, expires_at, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, now())
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(record.user_id)
        .bind(&record.token_hash)
        .bind(&record.device_fingerprint)
        .bind(&record.ip_address)
        .bind(&record.user_agent)
        .bind(record.expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(ApiError::DatabaseError)
    }

    async fn find_refresh_record(&self, token_hash: &str) -> Result<Option<RefreshRecord>, ApiError> {
        sqlx::query_as::<_, RefreshRecord>("SELECT * FROM refresh_records WHERE token_hash = $1")
            .bind(token_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(ApiError::DatabaseError)
    }

    async fn revoke_refresh_record(&self, token_id: Uuid) -> Result<(), ApiError> {
        sqlx::query("UPDATE refresh_records SET revoked_at = now() WHERE token_id = $1")
            .bind(token_id)
            .execute(&self.pool)
            .await
            .map_err(ApiError::DatabaseError)?;
        Ok(())
    }
}

/// `sqlx`-backed implementation of [`AuditRepositoryTrait`], drained by
/// [`crate::service::audit_sink::AuditSink`]'s worker pool.
#[derive(Clone)]
pub struct AuditRepository {
    pool: PgPool,
}

impl AuditRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditRepositoryTrait for AuditRepository {
    async fn insert(&self, entry: NewAuditEntry) -> Result<AuditEntry, ApiError> {
        sqlx::query_as::<_, AuditEntry>(
            r#"
            INSERT INTO audit_entries (
                entry_id, correlation_id, user_id, action, entity_type,
                entity_id, ip_address, user_agent, status_code,
                error_message, metadata, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, now())
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&entry.correlation_id)
        .bind(entry.user_id)
        .bind(&entry.action)
        .bind(&entry.entity_type)
        .bind(&entry.entity_id)
        .bind(&entry.ip_address)
        .bind(&entry.user_agent)
        .bind(entry.status_code)
        .bind(&entry.error_message)
        .bind(&entry.metadata)
        .fetch_one(&self.pool)
        .await
        .map_err(ApiError::DatabaseError)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_user_carries_no_plaintext_email_field() {
        let new_user = NewUser {
            email_ciphertext: vec![1, 2, 3],
            email_blind_index: "idx".to_string(),
            phone_ciphertext: None,
            phone_blind_index: None,
            hashed_password: "hash".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            user_type: "individual".to_string(),
            country_code: "GB".to_string(),
        };
        assert_eq!(new_user.email_blind_index, "idx");
    }

    #[test]
    fn device_sighting_allows_anonymous_country() {
        let sighting = DeviceSighting {
            user_id: Uuid::new_v4(),
            fingerprint: "fp-1".to_string(),
            name: None,
            ip_address: Some("203.0.113.4".to_string()),
            country_code: None,
        };
        assert!(sighting.country_code.is_none());
    }
}
