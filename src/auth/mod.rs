/// Authentication module
///
/// Token signing/verification over two RSA key pairs, pair issuance,
/// credential hashing, request token extraction, and the refresh-rotation
/// protocol.

mod claims;
mod extract;
mod jwt;
mod keys;
mod password;
mod refresh;

pub use claims::Claims;
pub use extract::extract_token;
pub use extract::ACCESS_TRANSPORT;
pub use extract::REFRESH_TRANSPORT;
pub use jwt::issue_token_pair;
pub use jwt::sign_token;
pub use jwt::verify_token;
pub use jwt::TokenPair;
pub use keys::TokenKeys;
pub use keys::TokenKind;
pub use password::hash_secret;
pub use password::verify_secret;
pub use refresh::rotate_refresh_token;
pub use refresh::start_session;
