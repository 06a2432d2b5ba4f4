/// Role gate middleware.
///
/// Runs after `AccessGuard` has attached a `CurrentIdentity`; compares
/// its role to the required one. A mismatch is the one rejection that is
/// externally distinct from credential failures (403 rather than 401).

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    error::ResponseError,
    Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;

use crate::error::{AppError, AuthError, CredentialFailure};
use crate::middleware::CurrentIdentity;
use crate::store::Role;

pub struct RequireRole {
    role: Role,
}

impl RequireRole {
    pub fn new(role: Role) -> Self {
        Self { role }
    }

    pub fn admin() -> Self {
        Self::new(Role::Admin)
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequireRole
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireRoleService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(RequireRoleService {
            service: Rc::new(service),
            role: self.role,
        }))
    }
}

pub struct RequireRoleService<S> {
    service: Rc<S>,
    role: Role,
}

impl<S, B> Service<ServiceRequest> for RequireRoleService<S>
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
        let attached_role = req
            .extensions()
            .get::<CurrentIdentity>()
            .map(|current| current.role);

        let outcome: Result<(), AppError> = match attached_role {
            // No identity attached means the guard never ran; treat it as
            // an unauthenticated request rather than a privilege problem.
            None => Err(AuthError::invalid(CredentialFailure::MissingToken).into()),
            Some(role) if role != self.role => Err(AuthError::InsufficientPrivileges.into()),
            Some(_) => Ok(()),
        };

        let service = Rc::clone(&self.service);

        Box::pin(async move {
            match outcome {
                Ok(()) => service
                    .call(req)
                    .await
                    .map(|res| res.map_into_left_body()),
                Err(err) => {
                    let response = err.error_response();
                    let (req, _) = req.into_parts();
                    Ok(ServiceResponse::new(req, response).map_into_right_body())
                }
            }
        })
    }
}
