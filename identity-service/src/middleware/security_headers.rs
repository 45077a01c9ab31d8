//! Adds standard defensive response headers. `Strict-Transport-Security` is
//! only sent when `cookie_secure` is set (i.e. the service is deployed
//! behind TLS) — sending HSTS over plain HTTP in local dev would pin
//! `localhost` to HTTPS in the browser.

use actix_web::body::MessageBody;
use actix_web::http::header::{HeaderName, HeaderValue};
use actix_web::middleware::Next;
use actix_web::{dev::ServiceRequest, dev::ServiceResponse, web, Error};

use crate::AppState;

pub async fn security_headers<B>(req: ServiceRequest, next: Next<B>) -> Result<ServiceResponse<B>, Error>
where
    B: MessageBody + 'static,
{
    let cookie_secure = req
        .app_data::<web::Data<AppState>>()
        .map(|state| state.cookie_secure)
        .unwrap_or(true);

    let mut res = next.call(req).await?;
    let headers = res.headers_mut();

    headers.insert(
        HeaderName::from_static("x-content-type-options"),
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(HeaderName::from_static("x-frame-options"), HeaderValue::from_static("DENY"));
    headers.insert(
        HeaderName::from_static("referrer-policy"),
        HeaderValue::from_static("no-referrer"),
    );

    if cookie_secure {
        headers.insert(
            HeaderName::from_static("strict-transport-security"),
            HeaderValue::from_static("max-age=63072000; includeSubDomains"),
        );
    }

    Ok(res)
}
