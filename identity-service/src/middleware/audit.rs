//! Tail layer: submits one audit entry per request to
//! [`crate::service::audit_sink::AuditSink`] after the handler has run.
//!
//! Wraps the whole app (registered alongside the other app-level layers in
//! `main.rs`), outside the scope-level `authenticate` wrap — so
//! `AuthenticatedUser`, when present, is only visible on the response side,
//! once `next.call` has returned and the request has passed through
//! `authenticate` and the handler.

use actix_web::body::MessageBody;
use actix_web::middleware::Next;
use actix_web::{dev::ServiceRequest, dev::ServiceResponse, web, Error, HttpMessage};
use serde_json::json;

use crate::context::correlation_id;
use crate::domain::entities::NewAuditEntry;
use crate::AppState;
use shared::auth::AuthenticatedUser;

/// Health-check paths are filtered out before enqueue — they're polled
/// continuously by load balancers and carry no auditable action.
fn is_health_path(path: &str) -> bool {
    path == "/health"
}

pub async fn audit<B>(req: ServiceRequest, next: Next<B>) -> Result<ServiceResponse<B>, Error>
where
    B: MessageBody + 'static,
{
    let Some(state) = req.app_data::<web::Data<AppState>>().cloned() else {
        return next.call(req).await;
    };

    if is_health_path(req.path()) {
        return next.call(req).await;
    }

    let correlation_id = correlation_id(&req).unwrap_or_default();
    let action = format!("{} {}", req.method(), req.path());
    let ip_address = req.connection_info().peer_addr().map(str::to_string);
    let user_agent = req
        .headers()
        .get(actix_web::http::header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let res = next.call(req).await?;
    let status_code = res.status().as_u16() as i32;
    let user_id = res.request().extensions().get::<AuthenticatedUser>().map(|u| u.user_id);

    state.audit_sink.submit(NewAuditEntry {
        correlation_id,
        user_id,
        action,
        entity_type: "request".to_string(),
        entity_id: None,
        ip_address,
        user_agent,
        status_code,
        error_message: if status_code >= 400 { Some(res.status().to_string()) } else { None },
        metadata: json!({}),
    });

    Ok(res)
}
