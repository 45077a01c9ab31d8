//! # Request Context
//!
//! Typed accessors into `ServiceRequest`/`HttpRequest` extensions, used by
//! the middleware chain to pass values between layers (correlation id set by
//! [`crate::middleware::correlation`], read by
//! [`crate::middleware::audit`]) without every layer agreeing on a shared,
//! stringly-typed map.

use actix_web::{dev::ServiceRequest, HttpMessage, HttpRequest};
use uuid::Uuid;

/// Correlation id assigned to a request by the correlation middleware,
/// either generated fresh or carried over from an inbound `X-Request-ID`
/// header.
#[derive(Debug, Clone)]
pub struct CorrelationId(pub String);

impl CorrelationId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Reads the correlation id from a `ServiceRequest`'s extensions.
///
/// Returns `None` if the correlation middleware wasn't applied ahead of the
/// caller in the chain.
pub fn correlation_id(req: &ServiceRequest) -> Option<String> {
    req.extensions().get::<CorrelationId>().map(|c| c.0.clone())
}

/// Reads the correlation id from an `HttpRequest` (handler-side).
pub fn correlation_id_from_request(req: &HttpRequest) -> Option<String> {
    req.extensions().get::<CorrelationId>().map(|c| c.0.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correlation_id_generates_a_valid_uuid() {
        let id = CorrelationId::generate();
        assert!(Uuid::parse_str(id.as_str()).is_ok());
    }
}
