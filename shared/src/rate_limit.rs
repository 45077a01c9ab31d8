//! Pure types for sliding-window rate-limit decisions.
//!
//! The atomic accounting itself (sorted-set trim + count + add, one Lua
//! script per request) lives in [`crate::redis_client::RedisClient`]; this
//! module only holds the decision shape so call sites and tests don't need
//! to reach into Redis internals to reason about it.

use std::time::Duration;

/// Outcome of a single rate-limit check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub limit: u32,
    /// Remaining requests in the current window. Always 0 when rejected.
    pub remaining: u32,
    /// Present when the caller should back off, either because the window
    /// was exhausted or because an adaptive ban is active.
    pub retry_after: Option<Duration>,
}

impl RateLimitDecision {
    pub fn allowed(limit: u32, remaining: u32) -> Self {
        Self { allowed: true, limit, remaining, retry_after: None }
    }

    pub fn rejected(limit: u32, retry_after: Duration) -> Self {
        Self { allowed: false, limit, remaining: 0, retry_after: Some(retry_after) }
    }

    pub fn banned(limit: u32, ban_duration: Duration) -> Self {
        Self { allowed: false, limit, remaining: 0, retry_after: Some(ban_duration) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allowed_decision_has_no_retry_after() {
        let d = RateLimitDecision::allowed(10, 9);
        assert!(d.allowed);
        assert_eq!(d.remaining, 9);
        assert!(d.retry_after.is_none());
    }

    #[test]
    fn rejected_decision_carries_retry_after_and_zero_remaining() {
        let d = RateLimitDecision::rejected(10, Duration::from_secs(30));
        assert!(!d.allowed);
        assert_eq!(d.remaining, 0);
        assert_eq!(d.retry_after, Some(Duration::from_secs(30)));
    }

    #[test]
    fn banned_decision_carries_ban_duration() {
        let d = RateLimitDecision::banned(10, Duration::from_secs(900));
        assert!(!d.allowed);
        assert_eq!(d.retry_after, Some(Duration::from_secs(900)));
    }
}
