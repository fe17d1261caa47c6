/// JWT authentication middleware.
///
/// Extracts the bearer token from the Authorization header, validates it
/// (optionally against a role gate) and injects the decoded claims into
/// request extensions for handlers. A missing or malformed header is a 401,
/// never a 403.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;

use crate::auth::{authenticate, RoleGate};
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError};

pub struct JwtAuth {
    jwt_config: JwtSettings,
    gate: Option<RoleGate>,
}

impl JwtAuth {
    /// Authenticated-only: any valid token passes.
    pub fn new(jwt_config: JwtSettings) -> Self {
        Self {
            jwt_config,
            gate: None,
        }
    }

    /// Role-gated: the decoded role must pass the allow-list (admin always
    /// does).
    pub fn with_roles(jwt_config: JwtSettings, allowed: &'static [&'static str]) -> Self {
        Self {
            jwt_config,
            gate: Some(RoleGate::new(allowed)),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtAuthService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(JwtAuthService {
            service: Rc::new(service),
            jwt_config: self.jwt_config.clone(),
            gate: self.gate,
        }))
    }
}

pub struct JwtAuthService<S> {
    service: Rc<S>,
    jwt_config: JwtSettings,
    gate: Option<RoleGate>,
}

fn bearer_token(req: &ServiceRequest) -> Option<String> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

impl<S, B> Service<ServiceRequest> for JwtAuthService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let token = match bearer_token(&req) {
            Some(token) => token,
            None => {
                tracing::warn!(path = %req.path(), "Missing or malformed Authorization header");
                return Box::pin(async move {
                    Err(AppError::Auth(AuthError::MissingToken).into())
                });
            }
        };

        let outcome = match self.gate {
            Some(gate) => gate.check(&token, &self.jwt_config),
            None => authenticate(&token, &self.jwt_config),
        };

        match outcome {
            Ok(claims) => {
                tracing::debug!(
                    user_id = %claims.sub,
                    role = ?claims.role,
                    "Access token accepted"
                );
                req.extensions_mut().insert(claims);

                let service = self.service.clone();
                Box::pin(async move { service.call(req).await })
            }
            Err(e) => {
                tracing::warn!(path = %req.path(), error = %e, "Access token rejected");
                Box::pin(async move { Err(e.into()) })
            }
        }
    }
}
