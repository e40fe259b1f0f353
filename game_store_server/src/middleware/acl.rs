//! Access control list middleware for the game store server.
//! This middleware can be placed on any route or service that sits behind [`super::JwtMiddlewareFactory`].
//!
//! It checks the claims the JWT middleware attached to the request against the roles the route requires. Admins hold
//! every role. If the caller has all of them, the request continues; otherwise a 403 Forbidden response is returned.

use std::{pin::Pin, rc::Rc};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
    HttpMessage,
};
use futures::{
    future::{ok, Ready},
    Future,
};
use game_store_engine::db_types::Role;
use log::*;

use crate::{
    auth::JwtClaims,
    errors::{AuthError, ServerError},
};

pub struct AclMiddlewareFactory {
    required_roles: Vec<Role>,
}

impl AclMiddlewareFactory {
    pub fn new(required_roles: &[Role]) -> Self {
        AclMiddlewareFactory { required_roles: required_roles.to_vec() }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AclMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = AclMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AclMiddlewareService { required_roles: self.required_roles.clone(), service: Rc::new(service) })
    }
}

pub struct AclMiddlewareService<S> {
    required_roles: Vec<Role>,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AclMiddlewareService<S>
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
        let required_roles = self.required_roles.clone();
        Box::pin(async move {
            let jwt_claims = req
                .extensions()
                .get::<JwtClaims>()
                .ok_or_else(|| {
                    warn!("🔐️ No JWT claims found in request extensions");
                    ServerError::AuthenticationError(AuthError::MissingToken)
                })?
                .clone();
            if required_roles.iter().all(|role| jwt_claims.has_role(*role)) {
                service.call(req).await
            } else {
                info!("🔐️ {} ({}) was denied access to {}", jwt_claims.sub, jwt_claims.role, req.path());
                Err(ServerError::InsufficientPermissions("This action requires elevated privileges".into()).into())
            }
        })
    }
}
