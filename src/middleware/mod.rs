/// Middleware module
///
/// Request-level gates for authentication and authorization, plus the
/// request logger.

mod access_guard;
mod request_log;
mod require_role;

pub use access_guard::AccessGuard;
pub use access_guard::CurrentIdentity;
pub use request_log::RequestLog;
pub use require_role::RequireRole;
