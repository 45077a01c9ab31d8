//! Assigns a correlation id to every request: carries over an inbound
//! `X-Request-ID` header if present, otherwise generates a fresh UUID.
//! Stashed in request extensions for [`crate::context::correlation_id`] and
//! echoed back on the response so a client can correlate retries.
//!
//! Opens a [`shared::request_span`] around the rest of the chain so every
//! log line emitted downstream carries the correlation id, method, and path.

use actix_web::body::MessageBody;
use actix_web::http::header::{HeaderName, HeaderValue};
use actix_web::middleware::Next;
use actix_web::{dev::ServiceRequest, dev::ServiceResponse, Error, HttpMessage};
use tracing::Instrument;

use crate::context::CorrelationId;

static HEADER_NAME: HeaderName = HeaderName::from_static("x-request-id");

pub async fn correlation<B>(req: ServiceRequest, next: Next<B>) -> Result<ServiceResponse<B>, Error>
where
    B: MessageBody + 'static,
{
    let inbound = req
        .headers()
        .get(&HEADER_NAME)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    let correlation_id = CorrelationId(inbound.unwrap_or_else(|| CorrelationId::generate().0));
    req.extensions_mut().insert(correlation_id.clone());

    let method = req.method().to_string();
    let path = req.path().to_string();
    let span = shared::request_span!(correlation_id.as_str(), method, path);

    let mut res = next.call(req).instrument(span).await?;

    if let Ok(value) = HeaderValue::from_str(correlation_id.as_str()) {
        res.headers_mut().insert(HEADER_NAME.clone(), value);
    }

    Ok(res)
}
