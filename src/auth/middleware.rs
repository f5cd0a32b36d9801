use crate::auth::auth::authenticate;
use crate::config::Config;
use crate::error::AppError;
use actix_web::middleware::Next;
use actix_web::{
    Error, HttpMessage, ResponseError,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    web::Data,
};

/// Authenticates every request of a protected scope and stores the caller
/// for the [`AuthUser`](crate::auth::auth::AuthUser) extractor. Failures are
/// answered with the usual `{"message": ...}` error body.
pub async fn auth_middleware(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let Some(config) = req.app_data::<Data<Config>>() else {
        tracing::error!("App config missing");
        return Ok(req.into_response(AppError::Internal.error_response()));
    };

    let auth_user = match authenticate(req.headers().get("Authorization"), &config.jwt_secret) {
        Ok(user) => user,
        Err(e) => {
            tracing::debug!(path = %req.path(), reason = %e, "Request not authenticated");
            return Ok(req.into_response(e.error_response()));
        }
    };

    tracing::debug!(
        user_id = auth_user.user_id,
        username = %auth_user.username,
        role = %auth_user.role,
        "Authenticated request"
    );
    req.extensions_mut().insert(auth_user);

    next.call(req).await
}
