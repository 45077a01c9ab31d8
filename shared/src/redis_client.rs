//! # Redis Client for Caching and Session Management
//!
//! High-level Redis client for caching, session management, and rate limiting.
//!
//! ## Why Redis?
//!
//! Redis is an in-memory data store used for:
//!
//! | Use Case | Description |
//! |----------|-------------|
//! | **Caching** | Store frequently accessed data to reduce DB load |
//! | **Sessions** | Store refresh tokens and session data |
//! | **Rate Limiting** | Sliding window + adaptive ban per IP/user |
//! | **Token Blacklist** | Invalidate JWTs on logout or password change |
//! | **Idempotency** | Single-flight lock and replay cache for mutating requests |
//! | **TOTP challenges** | Short-lived tokens bridging password check and code check |
//!
//! ## Connection Management
//!
//! We use a `ConnectionManager` which automatically reconnects on failure.
//! This is more resilient than a simple connection for long-running services.
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                     Redis Client                                   │
//! ├───────────────────────────────────────────────────────────────────┤
//! │                                                                    │
//! │  ┌──────────────────┐                                             │
//! │  │ ConnectionManager │ ──── Auto-reconnect on failure             │
//! │  └────────┬─────────┘                                             │
//! │           │                                                        │
//! │           ▼                                                        │
//! │  ┌─────────────────┐                                              │
//! │  │   Redis Server   │                                              │
//! │  └─────────────────┘                                              │
//! │                                                                    │
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Key Naming Convention
//!
//! We use a hierarchical naming pattern for keys:
//!
//! | Pattern | Example | Purpose |
//! |---------|---------|---------|
//! | `blacklist:token:{jti}` | `blacklist:token:abc-123` | Invalidated JWTs |
//! | `active_tokens:{user_id}` | `active_tokens:user-1` | Set of live jtis, for logout-all |
//! | `ratelimit:{key}` | `ratelimit:1.2.3.4` | Sliding-window request timestamps |
//! | `idempotency:{method}:{key}` | `idempotency:POST:abc-123` | Single-flight lock / captured response |
//! | `totp_challenge:{token}` | `totp_challenge:6f1c...` | Pending user id during a TOTP step-up |
//! | `cache:{entity}:{id}` | `cache:user:123` | Entity caching |
//!
//! ## TTL (Time To Live)
//!
//! All session-related keys should have a TTL:
//!
//! | Key Type | Recommended TTL |
//! |----------|-----------------|
//! | Access token blacklist | Same as access token TTL (15 min) |
//! | Refresh token | Same as refresh token TTL (30 days) |
//! | Idempotency slot | Configurable, default 24 h |
//! | Cache entries | Varies by use case |
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! use shared::redis_client::RedisClient;
//! use shared::config::AppConfig;
//! use std::time::Duration;
//!
//! let config = AppConfig::from_env()?;
//! let redis = RedisClient::new(&config.redis).await?;
//!
//! // Store a value with TTL
//! redis.set("key", &"value", Some(Duration::from_secs(3600))).await?;
//!
//! // Retrieve a value
//! let value: Option<String> = redis.get("key").await?;
//!
//! // Token blacklisting for logout
//! redis.blacklist_token(&jti, Duration::from_secs(900)).await?;
//! ```
//!
//! ## Related Documentation
//!
//! - [`crate::config::RedisConfig`] - Connection configuration
//! - [`crate::auth::jwt`] - JWT token management

use crate::errors::ApiError;
use crate::config::RedisConfig;
use crate::rate_limit::RateLimitDecision;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::time::Duration;
use tracing::{info, warn};

/// Lua script implementing the sliding-window check atomically: trim expired
/// entries, reject if the window is full, otherwise record this request.
/// Returns `{allowed, count}` where `allowed` is 0 or 1.
const SLIDING_WINDOW_SCRIPT: &str = r#"
local key = KEYS[1]
local now = tonumber(ARGV[1])
local window = tonumber(ARGV[2])
local limit = tonumber(ARGV[3])
local member = ARGV[4]

redis.call('ZREMRANGEBYSCORE', key, '-inf', now - window)
local count = redis.call('ZCARD', key)
if count >= limit then
  return {0, count}
end
redis.call('ZADD', key, now, member)
redis.call('EXPIRE', key, window)
return {1, count + 1}
"#;

// =============================================================================
// Redis Client
// =============================================================================

/// Async Redis client with automatic reconnection.
///
/// This client wraps a `ConnectionManager` which handles connection
/// failures automatically. It's safe to clone and share across tasks.
///
/// ## Thread Safety
///
/// The client is `Clone + Send + Sync`. Cloning is cheap (just an Arc clone).
/// Each operation uses an async connection from the manager.
#[derive(Clone)]
pub struct RedisClient {
    /// Connection manager for automatic reconnection
    conn: ConnectionManager,
}

impl RedisClient {
    /// Creates a new Redis client and establishes connection.
    ///
    /// ## Parameters
    ///
    /// - `config`: Redis configuration (URL, pool size)
    ///
    /// ## Errors
    ///
    /// Returns `ApiError::RedisError` if:
    /// - URL is invalid
    /// - Redis server is unreachable
    /// - Authentication fails
    pub async fn new(config: &RedisConfig) -> Result<Self, ApiError> {
        info!(url = %config.url, "Connecting to Redis");

        // Parse connection URL and create client
        let client = redis::Client::open(config.url.as_str())
            .map_err(ApiError::RedisError)?;

        // Create connection manager (handles reconnection automatically)
        let conn = ConnectionManager::new(client)
            .await
            .map_err(ApiError::RedisError)?;

        info!("Redis connection established");

        Ok(Self { conn })
    }

    // =========================================================================
    // Basic Operations
    // =========================================================================

    /// Stores a value with optional TTL (Time To Live).
    ///
    /// The value is serialized to JSON before storage.
    ///
    /// ## Parameters
    ///
    /// - `key`: Redis key
    /// - `value`: Any serializable value
    /// - `ttl`: Optional expiration time (None = no expiration)
    ///
    /// ## Example
    ///
    /// ```rust,ignore
    /// // Store with 1 hour TTL
    /// redis.set("user:123", &user, Some(Duration::from_secs(3600))).await?;
    ///
    /// // Store without expiration
    /// redis.set("config:feature", &true, None).await?;
    /// ```
    pub async fn set<T: serde::Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> Result<(), ApiError> {
        // Serialize value to JSON
        let serialized = serde_json::to_string(value)
            .map_err(|e| ApiError::InternalError { message: e.to_string() })?;

        let mut conn = self.conn.clone();

        match ttl {
            Some(duration) => {
                // SET with expiration (SETEX)
                conn.set_ex::<_, _, ()>(key, &serialized, duration.as_secs())
                    .await
                    .map_err(ApiError::RedisError)?;
            }
            None => {
                // SET without expiration
                conn.set::<_, _, ()>(key, &serialized)
                    .await
                    .map_err(ApiError::RedisError)?;
            }
        }

        Ok(())
    }

    /// Retrieves and deserializes a value.
    ///
    /// ## Returns
    ///
    /// - `Ok(Some(value))` - Key exists and was deserialized
    /// - `Ok(None)` - Key doesn't exist
    /// - `Err(...)` - Redis error or deserialization failed
    ///
    /// ## Example
    ///
    /// ```rust,ignore
    /// let user: Option<User> = redis.get("user:123").await?;
    /// if let Some(user) = user {
    ///     // Cache hit
    /// }
    /// ```
    pub async fn get<T: serde::de::DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ApiError> {
        let mut conn = self.conn.clone();

        let value: Option<String> = conn.get(key).await.map_err(ApiError::RedisError)?;

        match value {
            Some(s) => {
                let deserialized = serde_json::from_str(&s)
                    .map_err(|e| ApiError::InternalError { message: e.to_string() })?;
                Ok(Some(deserialized))
            }
            None => Ok(None),
        }
    }

    /// Deletes a key.
    ///
    /// ## Returns
    ///
    /// - `true` - Key was deleted
    /// - `false` - Key didn't exist
    pub async fn delete(&self, key: &str) -> Result<bool, ApiError> {
        let mut conn = self.conn.clone();
        let deleted: i64 = conn.del(key).await.map_err(ApiError::RedisError)?;
        Ok(deleted > 0)
    }

    /// Checks if a key exists.
    pub async fn exists(&self, key: &str) -> Result<bool, ApiError> {
        let mut conn = self.conn.clone();
        conn.exists(key).await.map_err(ApiError::RedisError)
    }

    /// Increments a counter (atomic operation).
    ///
    /// Creates the key with value 1 if it doesn't exist.
    /// Useful for rate limiting and counters.
    ///
    /// ## Returns
    ///
    /// The new value after incrementing.
    pub async fn incr(&self, key: &str) -> Result<i64, ApiError> {
        let mut conn = self.conn.clone();
        conn.incr(key, 1).await.map_err(ApiError::RedisError)
    }

    /// Sets TTL on an existing key.
    ///
    /// ## Returns
    ///
    /// - `true` - TTL was set
    /// - `false` - Key doesn't exist
    pub async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, ApiError> {
        let mut conn = self.conn.clone();
        conn.expire(key, ttl.as_secs() as i64)
            .await
            .map_err(ApiError::RedisError)
    }

    /// Health check - verifies Redis is responding.
    pub async fn ping(&self) -> Result<(), ApiError> {
        let mut conn = self.conn.clone();
        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .map_err(ApiError::RedisError)?;
        Ok(())
    }

    // =========================================================================
    // Token Management (Authentication)
    // =========================================================================

    /// Adds a JWT to the blacklist (for logout).
    ///
    /// When a user logs out, we add their token's JTI (JWT ID) to a blacklist.
    /// Subsequent requests with that token are rejected.
    ///
    /// ## Parameters
    ///
    /// - `jti`: The JWT ID claim from the token
    /// - `ttl`: Should match the token's remaining lifetime
    ///
    /// ## Implementation Note
    ///
    /// We only need to blacklist until the token would have expired anyway.
    /// After that, the token is invalid regardless of the blacklist.
    pub async fn blacklist_token(&self, jti: &str, ttl: Duration) -> Result<(), ApiError> {
        let key = format!("blacklist:token:{}", jti);
        self.set(&key, &true, Some(ttl)).await
    }

    /// Checks if a token is blacklisted.
    ///
    /// Call this when validating JWTs to ensure they haven't been
    /// invalidated by logout.
    pub async fn is_token_blacklisted(&self, jti: &str) -> Result<bool, ApiError> {
        let key = format!("blacklist:token:{}", jti);
        self.exists(&key).await
    }

    /// Stores a refresh token reference.
    ///
    /// This allows us to track which refresh tokens are valid for a user.
    /// Used for single-device logout and session management.
    pub async fn store_refresh_token(
        &self,
        user_id: &str,
        token_id: &str,
        ttl: Duration,
    ) -> Result<(), ApiError> {
        let key = format!("refresh:{}:{}", user_id, token_id);
        self.set(&key, &true, Some(ttl)).await
    }

    /// Revokes all refresh tokens for a user (logout everywhere).
    ///
    /// This is used when a user wants to sign out of all devices.
    ///
    /// ## Note
    ///
    /// Uses KEYS command which is O(N). For production with many keys,
    /// consider using SCAN or a different data structure (e.g., a set
    /// of tokens per user).
    pub async fn revoke_all_refresh_tokens(&self, user_id: &str) -> Result<(), ApiError> {
        let mut conn = self.conn.clone();
        let pattern = format!("refresh:{}:*", user_id);
        
        // Find all matching keys
        let keys: Vec<String> = redis::cmd("KEYS")
            .arg(&pattern)
            .query_async(&mut conn)
            .await
            .map_err(ApiError::RedisError)?;

        // Delete all found keys
        if !keys.is_empty() {
            conn.del::<_, ()>(keys).await.map_err(ApiError::RedisError)?;
        }

        Ok(())
    }

    // =========================================================================
    // Session Revocation (active JTI set per user)
    // =========================================================================

    /// Records a token as active for its user so the whole set can be
    /// blacklisted in bulk on a password change.
    pub async fn track_active_token(&self, user_id: &str, jti: &str, ttl: Duration) -> Result<(), ApiError> {
        let key = format!("user_tokens:{}:{}", user_id, jti);
        self.set(&key, &true, Some(ttl)).await
    }

    /// Blacklists every token issued to a user. Used on password change to
    /// force re-authentication everywhere, mirroring `revoke_all_refresh_tokens`.
    pub async fn blacklist_all_active_tokens(&self, user_id: &str, blacklist_ttl: Duration) -> Result<(), ApiError> {
        let mut conn = self.conn.clone();
        let pattern = format!("user_tokens:{}:*", user_id);

        let keys: Vec<String> = redis::cmd("KEYS")
            .arg(&pattern)
            .query_async(&mut conn)
            .await
            .map_err(ApiError::RedisError)?;

        for key in keys {
            if let Some(jti) = key.rsplit(':').next() {
                self.blacklist_token(jti, blacklist_ttl).await?;
            }
        }

        Ok(())
    }

    // =========================================================================
    // Sliding Window Rate Limiting
    // =========================================================================

    /// Checks and records a request against a sliding window, with an
    /// adaptive ban layered on top.
    ///
    /// Order of operations: if a ban marker is present, reject immediately
    /// with its remaining TTL as `Retry-After`. Otherwise run the atomic
    /// window script; on rejection, bump a violation counter and escalate
    /// to a ban once `ban_threshold` violations have landed inside one
    /// `10 * window` period.
    ///
    /// Fails open (allows the request) if Redis itself is unreachable,
    /// since availability is preferred to a false denial.
    pub async fn check_rate_limit(
        &self,
        key: &str,
        limit: u32,
        window: Duration,
        ban_threshold: u32,
        ban_duration: Duration,
    ) -> Result<RateLimitDecision, ApiError> {
        let ban_key = format!("ratelimit:ban:{}", key);
        let mut conn = self.conn.clone();

        match conn.ttl::<_, i64>(&ban_key).await {
            Ok(remaining) if remaining > 0 => {
                return Ok(RateLimitDecision::banned(limit, Duration::from_secs(remaining as u64)));
            }
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "rate limit ban check failed, failing open");
                return Ok(RateLimitDecision::allowed(limit, limit));
            }
        }

        let window_key = format!("ratelimit:window:{}", key);
        let now_ms = chrono::Utc::now().timestamp_millis() as f64 / 1000.0;
        let member = format!("{now_ms}-{}", uuid::Uuid::new_v4());

        let script = redis::Script::new(SLIDING_WINDOW_SCRIPT);
        let result: Result<(i64, i64), redis::RedisError> = script
            .key(&window_key)
            .arg(now_ms)
            .arg(window.as_secs())
            .arg(limit)
            .arg(member)
            .invoke_async(&mut conn)
            .await;

        let (allowed, count) = match result {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "rate limit script failed, failing open");
                return Ok(RateLimitDecision::allowed(limit, limit));
            }
        };

        if allowed == 1 {
            let remaining = limit.saturating_sub(count as u32);
            return Ok(RateLimitDecision::allowed(limit, remaining));
        }

        let violations_key = format!("ratelimit:violations:{}", key);
        let violations = self.incr(&violations_key).await?;
        if violations == 1 {
            self.expire(&violations_key, window * 10).await?;
        }

        if violations as u32 >= ban_threshold {
            self.set(&ban_key, &true, Some(ban_duration)).await?;
            self.delete(&violations_key).await?;
            return Ok(RateLimitDecision::banned(limit, ban_duration));
        }

        Ok(RateLimitDecision::rejected(limit, window))
    }

    // =========================================================================
    // Idempotency Cache
    // =========================================================================

    /// Attempts to acquire the single-flight lock for an idempotency key.
    ///
    /// Returns `true` if this caller now owns the in-flight request and
    /// should proceed; `false` if another request already holds the lock
    /// (the caller should poll [`Self::get_idempotent_response`] instead).
    ///
    /// The lock value is the caller's correlation id, so a retry carrying
    /// the same correlation id can recognize its own in-flight lock via
    /// [`Self::idempotency_lock_holder`] and pass through instead of
    /// waiting on itself.
    pub async fn try_lock_idempotency_key(
        &self,
        method: &str,
        key: &str,
        correlation_id: &str,
        ttl: Duration,
    ) -> Result<bool, ApiError> {
        let redis_key = format!("idempotency:{}:{}", method, key);
        let mut conn = self.conn.clone();
        let acquired: bool = redis::cmd("SET")
            .arg(&redis_key)
            .arg(correlation_id)
            .arg("NX")
            .arg("EX")
            .arg(ttl.as_secs())
            .query_async::<Option<String>>(&mut conn)
            .await
            .map_err(ApiError::RedisError)?
            .is_some();
        Ok(acquired)
    }

    /// Returns the correlation id holding an idempotency key's lock, or
    /// `None` if the slot is empty or already holds a captured response
    /// (captured values are JSON objects; lock values are plain strings).
    pub async fn idempotency_lock_holder(&self, method: &str, key: &str) -> Result<Option<String>, ApiError> {
        let redis_key = format!("idempotency:{}:{}", method, key);
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(&redis_key).await.map_err(ApiError::RedisError)?;
        Ok(raw.filter(|v| !v.trim_start().starts_with('{')))
    }

    /// Captures the response status, headers, and body for an idempotency
    /// key once the in-flight request completes, so replays can be served
    /// byte-for-byte without re-executing it.
    pub async fn capture_idempotent_response(
        &self,
        method: &str,
        key: &str,
        status: u16,
        headers: &[(String, String)],
        body: &serde_json::Value,
        ttl: Duration,
    ) -> Result<(), ApiError> {
        let redis_key = format!("idempotency:{}:{}", method, key);
        let payload = serde_json::json!({ "status": status, "headers": headers, "body": body });
        self.set(&redis_key, &payload, Some(ttl)).await
    }

    /// Reads back a captured idempotent response, if the original request
    /// has finished. Returns `None` while still in-flight or if absent.
    pub async fn get_idempotent_response(
        &self,
        method: &str,
        key: &str,
    ) -> Result<Option<(u16, Vec<(String, String)>, serde_json::Value)>, ApiError> {
        let redis_key = format!("idempotency:{}:{}", method, key);
        let raw: Option<serde_json::Value> = self.get(&redis_key).await?;
        Ok(raw.and_then(|v| {
            let status = v.get("status")?.as_u64()? as u16;
            let headers: Vec<(String, String)> =
                v.get("headers").and_then(|h| serde_json::from_value(h.clone()).ok()).unwrap_or_default();
            let body = v.get("body")?.clone();
            Some((status, headers, body))
        }))
    }

    // =========================================================================
    // TOTP Login Challenges
    // =========================================================================

    /// Stores a short-lived challenge token for a login that passed the
    /// password check but still needs a TOTP code.
    pub async fn store_totp_challenge(&self, challenge_token: &str, user_id: &str, ttl: Duration) -> Result<(), ApiError> {
        let key = format!("totp_challenge:{}", challenge_token);
        self.set(&key, &user_id.to_string(), Some(ttl)).await
    }

    /// Consumes (reads and deletes) a TOTP challenge token, returning the
    /// pending user id if the challenge is still valid.
    pub async fn consume_totp_challenge(&self, challenge_token: &str) -> Result<Option<String>, ApiError> {
        let key = format!("totp_challenge:{}", challenge_token);
        let user_id: Option<String> = self.get(&key).await?;
        if user_id.is_some() {
            self.delete(&key).await?;
        }
        Ok(user_id)
    }

}

// Hide internal state in Debug output
impl std::fmt::Debug for RedisClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisClient").finish_non_exhaustive()
    }
}

