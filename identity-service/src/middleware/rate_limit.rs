//! Sliding-window rate limit keyed by client IP, backed by
//! [`shared::redis_client::RedisClient::check_rate_limit`]. Requests beyond
//! the adaptive ban threshold are rejected outright for the ban duration
//! without touching the sliding window again.
//!
//! `X-RateLimit-Limit` and `X-RateLimit-Remaining` are attached to every
//! response, allowed or not; `Retry-After` is attached only when rejected.

use actix_web::body::{EitherBody, MessageBody};
use actix_web::http::header::{HeaderName, HeaderValue};
use actix_web::middleware::Next;
use actix_web::{dev::ServiceRequest, dev::ServiceResponse, web, Error};
use shared::errors::ApiError;
use shared::rate_limit::RateLimitDecision;

use crate::AppState;

fn apply_headers<B>(res: &mut ServiceResponse<B>, decision: &RateLimitDecision) {
    let headers = res.response_mut().headers_mut();
    if let Ok(value) = HeaderValue::from_str(&decision.limit.to_string()) {
        headers.insert(HeaderName::from_static("x-ratelimit-limit"), value);
    }
    if let Ok(value) = HeaderValue::from_str(&decision.remaining.to_string()) {
        headers.insert(HeaderName::from_static("x-ratelimit-remaining"), value);
    }
    if let Some(retry_after) = decision.retry_after {
        if let Ok(value) = HeaderValue::from_str(&retry_after.as_secs().to_string()) {
            headers.insert(HeaderName::from_static("retry-after"), value);
        }
    }
}

pub async fn rate_limit<B>(req: ServiceRequest, next: Next<B>) -> Result<ServiceResponse<EitherBody<B>>, Error>
where
    B: MessageBody + 'static,
{
    let Some(state) = req.app_data::<web::Data<AppState>>().cloned() else {
        let res = next.call(req).await?;
        return Ok(res.map_into_left_body());
    };

    let client_ip = req
        .connection_info()
        .peer_addr()
        .map(str::to_string)
        .unwrap_or_else(|| "unknown".to_string());
    let key = format!("ip:{}", client_ip);

    let cfg = &state.config.rate_limit;
    let decision = state
        .redis_client
        .check_rate_limit(
            &key,
            cfg.limit,
            std::time::Duration::from_secs(cfg.window_seconds),
            cfg.ban_threshold,
            std::time::Duration::from_secs(cfg.ban_duration_seconds),
        )
        .await;

    let decision = match decision {
        Ok(d) => d,
        Err(_) => {
            // Fail open: Redis being unavailable should not take the service down.
            let res = next.call(req).await?;
            return Ok(res.map_into_left_body());
        }
    };

    if !decision.allowed {
        let retry_after = decision.retry_after.unwrap_or_default().as_secs();
        let err: Error = ApiError::TooManyRequests { retry_after_seconds: retry_after }.into();
        let mut res = req.error_response(err);
        apply_headers(&mut res, &decision);
        return Ok(res.map_into_right_body());
    }

    let mut res = next.call(req).await?;
    apply_headers(&mut res, &decision);
    Ok(res.map_into_left_body())
}
