//! Applies [`shared::auth::middleware::AuthMiddleware`] as a functional
//! layer. `AuthMiddleware` itself only exposes an `authenticate` method
//! rather than implementing `Transform` — this is the `from_fn` adapter
//! that wires it into the protected route scope.

use actix_web::body::{EitherBody, MessageBody};
use actix_web::middleware::Next;
use actix_web::{dev::ServiceRequest, dev::ServiceResponse, web, Error};

use crate::AppState;

pub async fn authenticate<B>(req: ServiceRequest, next: Next<B>) -> Result<ServiceResponse<EitherBody<B>>, Error>
where
    B: MessageBody + 'static,
{
    let Some(state) = req.app_data::<web::Data<AppState>>().cloned() else {
        let res = next.call(req).await?;
        return Ok(res.map_into_left_body());
    };

    if let Err(e) = state.auth_middleware.authenticate(&req).await {
        let err: Error = e.into();
        let res = req.error_response(err);
        return Ok(res.map_into_right_body());
    }

    let res = next.call(req).await?;
    Ok(res.map_into_left_body())
}
