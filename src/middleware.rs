use actix_service::{forward_ready, Service};
use actix_web::body::EitherBody;
use actix_web::dev::{ServiceRequest, ServiceResponse, Transform};
use actix_web::{web, Error, HttpMessage, ResponseError};
use futures::future::{ok, LocalBoxFuture, Ready};
use std::rc::Rc;

use crate::auth::{Claims, TokenService, TOKEN_COOKIE};
use crate::error::ApiError;
use crate::models::EmailQuery;

/// Guards a route behind the session cookie.
///
/// The token must verify and its `email` claim must equal the `email` query
/// parameter of the same request. On success the verified [`Claims`] are
/// stored in the request extensions.
pub struct AuthGuard {
    tokens: Rc<TokenService>,
}

impl AuthGuard {
    pub fn new(tokens: TokenService) -> Self {
        AuthGuard {
            tokens: Rc::new(tokens),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthGuard
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AuthGuardMiddleware<S>;
    type InitError = ();

    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AuthGuardMiddleware {
            service: Rc::new(service),
            tokens: self.tokens.clone(),
        })
    }
}

pub struct AuthGuardMiddleware<S> {
    service: Rc<S>,
    tokens: Rc<TokenService>,
}

impl<S, B> Service<ServiceRequest> for AuthGuardMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let tokens = self.tokens.clone();
        let service = self.service.clone();

        Box::pin(async move {
            match authorize(&tokens, &req) {
                Ok(claims) => {
                    req.extensions_mut().insert(claims);
                    service
                        .call(req)
                        .await
                        .map(ServiceResponse::map_into_left_body)
                }
                Err(err) => Ok(req
                    .into_response(err.error_response())
                    .map_into_right_body()),
            }
        })
    }
}

fn authorize(tokens: &TokenService, req: &ServiceRequest) -> Result<Claims, ApiError> {
    let token = match req.cookie(TOKEN_COOKIE) {
        Some(cookie) => cookie.value().to_string(),
        None => {
            log::debug!("Rejected {}: no session cookie", req.path());
            return Err(ApiError::Unauthorized);
        }
    };

    let claims = tokens.verify(&token).map_err(|e| {
        log::debug!("Rejected {}: {}", req.path(), e);
        ApiError::Unauthorized
    })?;

    let requested = web::Query::<EmailQuery>::from_query(req.query_string())
        .ok()
        .and_then(|query| query.into_inner().email);

    if requested.as_deref() != Some(claims.email.as_str()) {
        log::debug!("Rejected {}: identity mismatch for {}", req.path(), claims.email);
        return Err(ApiError::Forbidden);
    }

    Ok(claims)
}
