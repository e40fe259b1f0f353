//! Bearer token middleware.
//!
//! Wrap a scope with [`JwtMiddlewareFactory`] to require a valid access token on every route inside it. The verified
//! [`JwtClaims`] are stored in the request extensions, where handlers (via the `JwtClaims` extractor) and the ACL
//! middleware pick them up. Requests without a valid token are answered with 401 before reaching any handler.

use std::{pin::Pin, rc::Rc};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    Error,
    HttpMessage,
};
use futures::{
    future::{ok, Ready},
    Future,
};
use log::*;

use crate::{
    auth::{bearer_token, JwtClaims, TokenVerifier},
    errors::{AuthError, ServerError},
};

pub struct JwtMiddlewareFactory {
    verifier: Rc<TokenVerifier>,
}

impl JwtMiddlewareFactory {
    pub fn new(verifier: TokenVerifier) -> Self {
        Self { verifier: Rc::new(verifier) }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = JwtMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(JwtMiddlewareService { verifier: Rc::clone(&self.verifier), service: Rc::new(service) })
    }
}

pub struct JwtMiddlewareService<S> {
    verifier: Rc<TokenVerifier>,
    service: Rc<S>,
}

fn claims_from_request(req: &ServiceRequest, verifier: &TokenVerifier) -> Result<JwtClaims, AuthError> {
    let header = req.headers().get(AUTHORIZATION).ok_or(AuthError::MissingToken)?;
    let header = header
        .to_str()
        .map_err(|e| AuthError::PoorlyFormattedToken(format!("Authorization header is not valid text. {e}")))?;
    let token = bearer_token(header)?;
    verifier.verify(token)
}

impl<S, B> Service<ServiceRequest> for JwtMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let verifier = Rc::clone(&self.verifier);
        Box::pin(async move {
            let claims = claims_from_request(&req, &verifier).map_err(|e| {
                debug!("🔐️ Rejecting request to {}. {e}", req.path());
                ServerError::AuthenticationError(e)
            })?;
            req.extensions_mut().insert(claims);
            service.call(req).await
        })
    }
}
