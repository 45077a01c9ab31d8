//! # Repository Traits
//!
//! Interface abstractions at the service/repository boundary, so
//! [`crate::service::auth_service::AuthService`] depends on a trait rather
//! than a concrete `sqlx`-backed struct. This breaks the handler → service →
//! repository call graph into independently testable units and lets
//! `AuthService`'s unit tests mock persistence instead of hitting Postgres.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::errors::ApiError;
use uuid::Uuid;

use crate::domain::entities::{
    AuditEntry, Device, DeviceSighting, NewAuditEntry, NewRefreshRecord, NewUser,
    NewVerificationToken, RefreshRecord, User, VerificationToken,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepositoryTrait: Send + Sync {
    async fn create(&self, new_user: NewUser) -> Result<User, ApiError>;
    async fn find_by_email_blind_index(&self, blind_index: &str) -> Result<Option<User>, ApiError>;
    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>, ApiError>;
    async fn update_password(&self, user_id: Uuid, hashed_password: &str) -> Result<(), ApiError>;
    async fn set_email_verified(&self, user_id: Uuid) -> Result<(), ApiError>;

    async fn set_totp_secret(&self, user_id: Uuid, secret_ciphertext: Vec<u8>) -> Result<(), ApiError>;
    async fn enable_totp(&self, user_id: Uuid) -> Result<(), ApiError>;
    async fn disable_totp(&self, user_id: Uuid) -> Result<(), ApiError>;

    async fn increment_failed_attempts(&self, user_id: Uuid) -> Result<i32, ApiError>;
    async fn reset_failed_attempts(&self, user_id: Uuid) -> Result<(), ApiError>;
    async fn lock_until(&self, user_id: Uuid, until: DateTime<Utc>) -> Result<(), ApiError>;
    async fn update_last_login(&self, user_id: Uuid) -> Result<(), ApiError>;

    async fn upsert_device(&self, sighting: DeviceSighting) -> Result<Device, ApiError>;
    async fn is_device_trusted(&self, user_id: Uuid, fingerprint: &str) -> Result<bool, ApiError>;

    async fn create_verification_token(
        &self,
        token: NewVerificationToken,
    ) -> Result<VerificationToken, ApiError>;
    async fn find_verification_token(
        &self,
        token_hash: &str,
    ) -> Result<Option<VerificationToken>, ApiError>;
    async fn delete_verification_token(&self, token_id: Uuid) -> Result<(), ApiError>;

    async fn create_refresh_record(
        &self,
        record: NewRefreshRecord,
    ) -> Result<RefreshRecord, ApiError>;
    async fn find_refresh_record(&self, token_hash: &str) -> Result<Option<RefreshRecord>, ApiError>;
    async fn revoke_refresh_record(&self, token_id: Uuid) -> Result<(), ApiError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuditRepositoryTrait: Send + Sync {
    async fn insert(&self, entry: NewAuditEntry) -> Result<AuditEntry, ApiError>;
}
