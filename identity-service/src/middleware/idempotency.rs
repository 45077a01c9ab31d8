//! Idempotency-key single-flight caching for mutating requests.
//!
//! A request carrying an `Idempotency-Key` header acquires a short-lived
//! lock (`SET NX`) keyed by method + key, with the caller's correlation id
//! as the lock's value:
//!
//! - A concurrent request with a *different* correlation id polls, bounded
//!   by [`WAIT_BUDGET`], for the first request's captured response; if it
//!   never appears, it gets `409 DuplicateInFlight`.
//! - A request with the *same* correlation id (the caller retrying after a
//!   timeout) recognizes its own lock and passes straight through, so a
//!   caller can never deadlock against itself.
//! - Once the first request completes, its status, headers (e.g. the
//!   `Set-Cookie` pair issued by login/register), and body are captured and
//!   replayed byte-for-byte to any later request with the same key, for the
//!   lock TTL.
//!
//! Safe methods (GET/HEAD/OPTIONS) bypass entirely. Unsafe methods
//! (POST/PUT/PATCH/DELETE) require the header; a missing or oversized key is
//! a `400 Bad Request`.

use std::time::Duration;

use actix_web::body::{to_bytes, EitherBody, MessageBody};
use actix_web::http::Method;
use actix_web::middleware::Next;
use actix_web::{dev::ServiceRequest, dev::ServiceResponse, web, Error, HttpResponse};
use shared::errors::ApiError;

use crate::context::correlation_id;
use crate::AppState;

const HEADER_NAME: &str = "idempotency-key";
const MAX_KEY_LEN: usize = 128;
const WAIT_BUDGET: Duration = Duration::from_secs(5);
const POLL_INTERVAL: Duration = Duration::from_millis(100);

fn is_unsafe_method(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH | Method::DELETE)
}

/// `Content-Length`/`Content-Type` are recomputed by `HttpResponseBuilder::json`
/// when replaying, so the captured values would be stale or duplicated.
fn is_hop_by_hop(header_name: &str) -> bool {
    header_name.eq_ignore_ascii_case("content-length") || header_name.eq_ignore_ascii_case("content-type")
}

fn replay_response<B>(
    req: ServiceRequest,
    status: u16,
    headers: &[(String, String)],
    body: serde_json::Value,
) -> ServiceResponse<EitherBody<B>>
where
    B: MessageBody + 'static,
{
    let status = actix_web::http::StatusCode::from_u16(status).unwrap_or(actix_web::http::StatusCode::OK);
    let mut builder = HttpResponse::build(status);
    for (name, value) in headers {
        builder.insert_header((name.as_str(), value.as_str()));
    }
    let res = req.into_response(builder.json(body));
    res.map_into_right_body()
}

pub async fn idempotency<B>(req: ServiceRequest, next: Next<B>) -> Result<ServiceResponse<EitherBody<B>>, Error>
where
    B: MessageBody + 'static,
{
    let unsafe_method = is_unsafe_method(req.method());

    let key = req
        .headers()
        .get(HEADER_NAME)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let Some(key) = key else {
        if unsafe_method {
            let err: Error = ApiError::BadRequest { message: "Idempotency-Key header is required".to_string() }.into();
            let res = req.error_response(err);
            return Ok(res.map_into_right_body());
        }
        let res = next.call(req).await?;
        return Ok(res.map_into_left_body());
    };

    if unsafe_method && key.len() > MAX_KEY_LEN {
        let err: Error = ApiError::BadRequest { message: "Idempotency-Key exceeds 128 characters".to_string() }.into();
        let res = req.error_response(err);
        return Ok(res.map_into_right_body());
    }

    if !unsafe_method {
        let res = next.call(req).await?;
        return Ok(res.map_into_left_body());
    }

    let Some(state) = req.app_data::<web::Data<AppState>>().cloned() else {
        let res = next.call(req).await?;
        return Ok(res.map_into_left_body());
    };

    let method = req.method().as_str().to_string();
    let ttl = Duration::from_secs(state.config.idempotency.ttl_seconds);
    let caller_correlation_id = correlation_id(&req).unwrap_or_default();

    if let Ok(Some((status, headers, body))) = state.redis_client.get_idempotent_response(&method, &key).await {
        return Ok(replay_response(req, status, &headers, body));
    }

    match state
        .redis_client
        .try_lock_idempotency_key(&method, &key, &caller_correlation_id, ttl)
        .await
    {
        Ok(true) => {}
        Ok(false) => {
            let holder = state.redis_client.idempotency_lock_holder(&method, &key).await.ok().flatten();
            if holder.as_deref() == Some(caller_correlation_id.as_str()) {
                // Same caller retrying while its own first attempt is still in flight.
                let res = next.call(req).await?;
                return Ok(res.map_into_left_body());
            }

            let deadline = tokio::time::Instant::now() + WAIT_BUDGET;
            loop {
                if let Ok(Some((status, headers, body))) = state.redis_client.get_idempotent_response(&method, &key).await {
                    return Ok(replay_response(req, status, &headers, body));
                }
                if tokio::time::Instant::now() >= deadline {
                    break;
                }
                tokio::time::sleep(POLL_INTERVAL).await;
            }

            let err: Error = ApiError::DuplicateInFlight { retry_after_seconds: 1 }.into();
            let res = req.error_response(err);
            return Ok(res.map_into_right_body());
        }
        Err(_) => {
            // Cache outage: fail closed rather than risk a double-executed
            // mutation with no way to dedupe it.
            let err: Error = ApiError::ServiceUnavailable { service: "idempotency cache".to_string() }.into();
            let res = req.error_response(err);
            return Ok(res.map_into_right_body());
        }
    }

    let res = next.call(req).await?;
    let status = res.status();
    let (http_req, http_res) = res.into_parts();
    let http_res = http_res.map_into_boxed_body();
    let headers = http_res.headers().clone();
    let bytes = to_bytes(http_res.into_body()).await.unwrap_or_default();

    if !bytes.is_empty() {
        if let Ok(json) = serde_json::from_slice::<serde_json::Value>(&bytes) {
            let captured_headers: Vec<(String, String)> = headers
                .iter()
                .filter(|(name, _)| !is_hop_by_hop(name.as_str()))
                .filter_map(|(name, value)| Some((name.to_string(), value.to_str().ok()?.to_string())))
                .collect();
            let _ = state
                .redis_client
                .capture_idempotent_response(&method, &key, status.as_u16(), &captured_headers, &json, ttl)
                .await;
        }
    }

    let mut rebuilt = HttpResponse::build(status);
    for (name, value) in headers.iter() {
        rebuilt.insert_header((name.clone(), value.clone()));
    }

    let res = ServiceResponse::new(http_req, rebuilt.body(bytes));
    Ok(res.map_into_right_body())
}
