//! Rejects requests whose declared `Content-Length` exceeds a fixed cap,
//! before the body is read into memory. A missing or unparsable header is
//! let through — the framework's own body size limits still apply; this
//! layer only short-circuits the easy, cheap case.

use actix_web::body::{EitherBody, MessageBody};
use actix_web::middleware::Next;
use actix_web::{dev::ServiceRequest, dev::ServiceResponse, Error};
use shared::errors::ApiError;

const MAX_BODY_BYTES: usize = 1024 * 1024;

pub async fn body_cap<B>(req: ServiceRequest, next: Next<B>) -> Result<ServiceResponse<EitherBody<B>>, Error>
where
    B: MessageBody + 'static,
{
    let too_large = req
        .headers()
        .get(actix_web::http::header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok())
        .map(|len| len > MAX_BODY_BYTES)
        .unwrap_or(false);

    if too_large {
        let err: Error = ApiError::RequestTooLarge { max_bytes: MAX_BODY_BYTES }.into();
        let res = req.error_response(err);
        return Ok(res.map_into_right_body());
    }

    let res = next.call(req).await?;
    Ok(res.map_into_left_body())
}
