mod auth;
mod health_check;

pub use auth::{
    admin_route, current_user, refresh_token, sign_in, sign_out, sign_up, AuthResponse,
    IdentityResponse, SignInRequest, SignUpRequest, TokenPairResponse,
};
pub use health_check::health_check;
