/// Authentication Routes
///
/// Sign-up, sign-in, sign-out, token refresh, current-user lookup, and
/// the admin-gated route.

use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::auth::{
    extract_token, hash_secret, rotate_refresh_token, start_session, verify_secret, TokenKeys,
    TokenKind, REFRESH_TRANSPORT,
};
use crate::error::{AppError, AuthError, CredentialFailure, ValidationError};
use crate::middleware::CurrentIdentity;
use crate::store::{Identity, IdentityStore, NewIdentity, Role};
use crate::validators::{is_valid_email, is_valid_password, is_valid_username};

/// Sign-up request
#[derive(Deserialize)]
pub struct SignUpRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Sign-in request. The `email` field also accepts a username.
#[derive(Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

/// Externally visible identity representation.
///
/// Password and refresh hashes are excluded by construction.
#[derive(Serialize)]
pub struct IdentityResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub created_at: String,
}

impl From<&Identity> for IdentityResponse {
    fn from(identity: &Identity) -> Self {
        Self {
            id: identity.id.to_string(),
            username: identity.username.clone(),
            email: identity.email.clone(),
            role: identity.role,
            created_at: identity.created_at.to_rfc3339(),
        }
    }
}

impl From<&CurrentIdentity> for IdentityResponse {
    fn from(current: &CurrentIdentity) -> Self {
        Self {
            id: current.id.to_string(),
            username: current.username.clone(),
            email: current.email.clone(),
            role: current.role,
            created_at: current.created_at.to_rfc3339(),
        }
    }
}

/// Response carrying a fresh token pair alongside the identity.
#[derive(Serialize)]
pub struct AuthResponse {
    pub user: IdentityResponse,
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Response carrying only a rotated token pair.
#[derive(Serialize)]
pub struct TokenPairResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// POST /auth/sign-up
///
/// Register a new identity. Duplicate email or username fails before any
/// write; on success a token pair is issued for the new identity and the
/// refresh secret's hash is stored on it.
///
/// # Errors
/// - 400: Invalid username/email/password
/// - 409: Email or username already taken
/// - 500: Issuance or store failure
pub async fn sign_up(
    form: web::Json<SignUpRequest>,
    store: web::Data<dyn IdentityStore>,
    keys: web::Data<TokenKeys>,
) -> Result<HttpResponse, AppError> {
    let username = is_valid_username(&form.username)?;
    let email = is_valid_email(&form.email)?;
    is_valid_password(&form.password)?;

    // Existence checks run before anything is written.
    if store.find_by_email(&email).await?.is_some() {
        return Err(ValidationError::Duplicate("email".to_string()).into());
    }
    if store.find_by_username(&username).await?.is_some() {
        return Err(ValidationError::Duplicate("username".to_string()).into());
    }

    let password_hash = hash_secret(&form.password)?;

    let identity = store
        .insert(NewIdentity {
            username,
            email,
            password_hash,
            role: Role::Member,
            refresh_token_hash: None,
        })
        .await?;

    let pair = start_session(store.get_ref(), keys.get_ref(), identity.id).await?;

    tracing::info!(identity_id = %identity.id, "Identity registered");

    Ok(HttpResponse::Created().json(AuthResponse {
        user: IdentityResponse::from(&identity),
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
        token_type: "Bearer".to_string(),
        expires_in: keys.expiry_minutes(TokenKind::Access) * 60,
    }))
}

/// POST /auth/sign-in
///
/// Authenticate by email or username plus password. Unknown identity and
/// wrong password produce the same 401 response.
///
/// # Errors
/// - 400: Empty credentials
/// - 401: Unknown identity or wrong password (uniform)
/// - 500: Issuance or store failure
pub async fn sign_in(
    form: web::Json<SignInRequest>,
    store: web::Data<dyn IdentityStore>,
    keys: web::Data<TokenKeys>,
) -> Result<HttpResponse, AppError> {
    if form.email.trim().is_empty() {
        return Err(ValidationError::EmptyField("email".to_string()).into());
    }
    if form.password.is_empty() {
        return Err(ValidationError::EmptyField("password".to_string()).into());
    }

    // The identifier may be either unique field.
    let identifier = form.email.trim();
    let identity = match store.find_by_email(identifier).await? {
        Some(identity) => Some(identity),
        None => store.find_by_username(identifier).await?,
    };

    let identity = identity
        .ok_or_else(|| AuthError::invalid(CredentialFailure::UnknownIdentity))?;

    if !verify_secret(&form.password, &identity.password_hash) {
        return Err(AuthError::invalid(CredentialFailure::WrongPassword).into());
    }

    let pair = start_session(store.get_ref(), keys.get_ref(), identity.id).await?;

    tracing::info!(identity_id = %identity.id, "Identity signed in");

    Ok(HttpResponse::Ok().json(AuthResponse {
        user: IdentityResponse::from(&identity),
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
        token_type: "Bearer".to_string(),
        expires_in: keys.expiry_minutes(TokenKind::Access) * 60,
    }))
}

/// GET /auth/refresh-token
///
/// Rotate the presented refresh token. The token is read from the bearer
/// header, the `refreshToken` cookie, or the `x-refresh-token` header, in
/// that order. On success the previous token is invalidated server-side.
///
/// # Errors
/// - 401: Missing, invalid, expired, replayed, or concurrently rotated
///   token (uniform)
/// - 500: Issuance or store failure
pub async fn refresh_token(
    req: HttpRequest,
    store: web::Data<dyn IdentityStore>,
    keys: web::Data<TokenKeys>,
) -> Result<HttpResponse, AppError> {
    let presented = extract_token(&req, REFRESH_TRANSPORT);

    let pair = rotate_refresh_token(presented, store.get_ref(), keys.get_ref()).await?;

    Ok(HttpResponse::Ok().json(TokenPairResponse {
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
        token_type: "Bearer".to_string(),
        expires_in: keys.expiry_minutes(TokenKind::Access) * 60,
    }))
}

/// GET /auth/sign-out
///
/// Clears the stored refresh hash so the outstanding refresh token can no
/// longer be used. The access token stays valid until natural expiry.
/// Requires a valid access token.
pub async fn sign_out(
    current: web::ReqData<CurrentIdentity>,
    store: web::Data<dyn IdentityStore>,
) -> Result<HttpResponse, AppError> {
    store.set_refresh_hash(current.id, None).await?;

    tracing::info!(identity_id = %current.id, "Identity signed out");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Signed out successfully"
    })))
}

/// GET /auth/current-user
///
/// Echoes the identity resolved by the access guard.
pub async fn current_user(
    current: web::ReqData<CurrentIdentity>,
) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(IdentityResponse::from(&*current)))
}

/// GET /auth/admin-route
///
/// Reachable only with a valid access token and the ADMIN role.
pub async fn admin_route(
    current: web::ReqData<CurrentIdentity>,
) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(IdentityResponse::from(&*current)))
}
