use crate::auth::jwt::verify_token;
use crate::config::Config;
use crate::error::AppError;
use crate::model::role::Role;
use crate::service::context::ActorContext;
use actix_web::{
    FromRequest, HttpMessage, HttpRequest, dev::Payload, http::header::HeaderValue, web::Data,
};
use futures::future::{Ready, ready};

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
    pub username: String,
    pub role: Role,

    /// Present only if this user is linked to an employee record
    pub employee_id: Option<u64>,
    pub branch_id: Option<u64>,
}

/// Resolve the caller from the `Authorization: Bearer <token>` header.
pub fn authenticate(header: Option<&HeaderValue>, secret: &str) -> Result<AuthUser, AppError> {
    let value = header
        .ok_or(AppError::Unauthorized("Missing Authorization header"))?
        .to_str()
        .map_err(|_| AppError::Unauthorized("Invalid Authorization header encoding"))?;

    let token = value
        .strip_prefix("Bearer ")
        .ok_or(AppError::Unauthorized("Authorization header must start with Bearer"))?;

    let claims = verify_token(token, secret).map_err(|e| {
        tracing::debug!(error = %e, "Token rejected");
        AppError::Unauthorized("Invalid or expired token")
    })?;

    let role = Role::from_id(claims.role).ok_or(AppError::Unauthorized("Invalid role"))?;

    Ok(AuthUser {
        user_id: claims.user_id,
        username: claims.sub,
        role,
        employee_id: claims.employee_id,
        branch_id: claims.branch_id,
    })
}

impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // set by auth_middleware on protected scopes
        if let Some(user) = req.extensions().get::<AuthUser>() {
            return ready(Ok(user.clone()));
        }

        let Some(config) = req.app_data::<Data<Config>>() else {
            tracing::error!("App config missing");
            return ready(Err(AppError::Internal));
        };

        ready(authenticate(
            req.headers().get("Authorization"),
            &config.jwt_secret,
        ))
    }
}

impl AuthUser {
    /// Explicit actor context handed to workflow operations.
    pub fn context(&self) -> ActorContext {
        let actor = ActorContext {
            branch_id: self.branch_id,
            ..ActorContext::new(self.user_id, self.role)
        };
        match self.employee_id {
            Some(id) => actor.with_employee(id),
            None => actor,
        }
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(AppError::Forbidden("Admin only"))
        }
    }

    pub fn require_hr_or_admin(&self) -> Result<(), AppError> {
        if self.role.is_hr_or_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden("HR/Admin only"))
        }
    }

    pub fn require_employee(&self) -> Result<u64, AppError> {
        self.employee_id
            .ok_or(AppError::Forbidden("No employee profile"))
    }

    /// The caller's own employee id, or `requested` when HR/Admin asks on
    /// someone else's behalf.
    pub fn employee_scope(&self, requested: Option<u64>) -> Result<u64, AppError> {
        match requested {
            Some(id) if Some(id) != self.employee_id => {
                self.require_hr_or_admin()?;
                Ok(id)
            }
            _ => self.require_employee(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Claims, TokenType};
    use actix_web::{ResponseError, body::to_bytes, http::StatusCode};
    use jsonwebtoken::{EncodingKey, Header, encode};
    use std::time::{SystemTime, UNIX_EPOCH};

    const SECRET: &str = "test-secret";

    fn bearer(role: u8) -> HeaderValue {
        let exp = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs() as usize + 600;
        let claims = Claims {
            user_id: 9,
            sub: "hr.officer".into(),
            role,
            exp,
            jti: "jti-9".into(),
            token_type: TokenType::Access,
            employee_id: Some(90),
            branch_id: None,
        };
        let token =
            encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap();
        HeaderValue::from_str(&format!("Bearer {}", token)).unwrap()
    }

    #[test]
    fn bearer_token_resolves_the_caller() {
        let user = authenticate(Some(&bearer(2)), SECRET).unwrap();
        assert_eq!(user.user_id, 9);
        assert_eq!(user.role, Role::Hr);
        assert_eq!(user.employee_id, Some(90));
    }

    #[test]
    fn bad_credentials_are_unauthorized() {
        assert_eq!(
            authenticate(None, SECRET).unwrap_err(),
            AppError::Unauthorized("Missing Authorization header")
        );
        assert_eq!(
            authenticate(Some(&HeaderValue::from_static("Basic abc")), SECRET).unwrap_err(),
            AppError::Unauthorized("Authorization header must start with Bearer")
        );
        assert_eq!(
            authenticate(Some(&bearer(2)), "other-secret").unwrap_err(),
            AppError::Unauthorized("Invalid or expired token")
        );
        assert_eq!(
            authenticate(Some(&bearer(42)), SECRET).unwrap_err(),
            AppError::Unauthorized("Invalid role")
        );
    }

    #[actix_web::test]
    async fn unauthorized_body_uses_the_message_shape() {
        let err = authenticate(None, SECRET).unwrap_err();
        let resp = err.error_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body = to_bytes(resp.into_body()).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["message"], "Unauthorized: Missing Authorization header");
        assert!(value.get("error").is_none());
    }

    fn user(role: Role, employee_id: Option<u64>) -> AuthUser {
        AuthUser {
            user_id: 1,
            username: "u".into(),
            role,
            employee_id,
            branch_id: None,
        }
    }

    #[test]
    fn employees_only_see_their_own_records() {
        let guard = user(Role::Employee, Some(5));
        assert_eq!(guard.employee_scope(None), Ok(5));
        assert_eq!(guard.employee_scope(Some(5)), Ok(5));
        assert_eq!(guard.employee_scope(Some(6)), Err(AppError::Forbidden("HR/Admin only")));

        let hr = user(Role::Hr, None);
        assert_eq!(hr.employee_scope(Some(6)), Ok(6));
        assert_eq!(hr.employee_scope(None), Err(AppError::Forbidden("No employee profile")));
    }
}
