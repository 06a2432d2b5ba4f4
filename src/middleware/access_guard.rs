/// Access-token guard middleware.
///
/// Authenticates the bearer credential on each request and attaches the
/// resolved identity (minus secrets) to request extensions for the route
/// handlers. The identity is re-read from the store on every request; no
/// caching, so a deleted identity is rejected immediately.
///
/// Missing token, failed verification, and unknown subject all produce
/// the same 401 body; only the logged cause differs.

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    error::ResponseError,
    web, Error, HttpMessage,
};
use chrono::{DateTime, Utc};
use futures::future::LocalBoxFuture;
use serde::Serialize;
use std::rc::Rc;
use uuid::Uuid;

use crate::auth::{extract_token, verify_token, TokenKeys, TokenKind, ACCESS_TRANSPORT};
use crate::error::{AppError, AuthError, CredentialFailure};
use crate::store::{Identity, IdentityStore, Role};

/// The authenticated caller, as attached to request extensions.
///
/// Deliberately excludes the password and refresh hashes so handlers
/// cannot leak them.
#[derive(Debug, Clone, Serialize)]
pub struct CurrentIdentity {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<&Identity> for CurrentIdentity {
    fn from(identity: &Identity) -> Self {
        Self {
            id: identity.id,
            username: identity.username.clone(),
            email: identity.email.clone(),
            role: identity.role,
            created_at: identity.created_at,
        }
    }
}

pub struct AccessGuard {
    keys: TokenKeys,
}

impl AccessGuard {
    pub fn new(keys: TokenKeys) -> Self {
        Self { keys }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AccessGuard
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = AccessGuardService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(AccessGuardService {
            service: Rc::new(service),
            keys: self.keys.clone(),
        }))
    }
}

pub struct AccessGuardService<S> {
    service: Rc<S>,
    keys: TokenKeys,
}

async fn authenticate(
    req: &ServiceRequest,
    keys: &TokenKeys,
) -> Result<CurrentIdentity, AppError> {
    let token = extract_token(req.request(), ACCESS_TRANSPORT)
        .ok_or_else(|| AuthError::invalid(CredentialFailure::MissingToken))?;

    let claims = verify_token(keys, TokenKind::Access, &token)
        .ok_or_else(|| AuthError::invalid(CredentialFailure::BadToken))?;
    let subject = claims.subject()?;

    let store = req
        .app_data::<web::Data<dyn IdentityStore>>()
        .ok_or_else(|| AppError::Internal("identity store not configured".to_string()))?;

    let identity = store
        .find_by_id(subject)
        .await?
        .ok_or_else(|| AuthError::invalid(CredentialFailure::UnknownIdentity))?;

    Ok(CurrentIdentity::from(&identity))
}

impl<S, B> Service<ServiceRequest> for AccessGuardService<S>
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
        let service = Rc::clone(&self.service);
        let keys = self.keys.clone();

        Box::pin(async move {
            match authenticate(&req, &keys).await {
                Ok(current) => {
                    tracing::debug!(identity_id = %current.id, "Access token validated");
                    req.extensions_mut().insert(current);
                    service
                        .call(req)
                        .await
                        .map(|res| res.map_into_left_body())
                }
                Err(err) => {
                    let response = err.error_response();
                    let (req, _) = req.into_parts();
                    Ok(ServiceResponse::new(req, response).map_into_right_body())
                }
            }
        })
    }
}
