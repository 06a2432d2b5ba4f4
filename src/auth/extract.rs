/// Token extraction from incoming requests.
///
/// Both token kinds travel over the same three conventions, checked in
/// order: `Authorization: Bearer`, a named cookie, a custom header. The
/// sources are an ordered list of extractor functions so a new transport
/// can be appended without touching the protocol logic.

use actix_web::HttpRequest;

/// Cookie and header names for one token kind.
#[derive(Debug, Clone, Copy)]
pub struct TokenTransport {
    pub cookie: &'static str,
    pub header: &'static str,
}

pub const ACCESS_TRANSPORT: TokenTransport = TokenTransport {
    cookie: "accessToken",
    header: "x-access-token",
};

pub const REFRESH_TRANSPORT: TokenTransport = TokenTransport {
    cookie: "refreshToken",
    header: "x-refresh-token",
};

type Extractor = fn(&HttpRequest, TokenTransport) -> Option<String>;

const EXTRACTORS: &[Extractor] = &[from_bearer_header, from_cookie, from_custom_header];

/// Returns the first token found, trying each source in order.
pub fn extract_token(req: &HttpRequest, transport: TokenTransport) -> Option<String> {
    EXTRACTORS
        .iter()
        .find_map(|extractor| extractor(req, transport))
}

fn from_bearer_header(req: &HttpRequest, _transport: TokenTransport) -> Option<String> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|token| token.to_string())
}

fn from_cookie(req: &HttpRequest, transport: TokenTransport) -> Option<String> {
    req.cookie(transport.cookie)
        .map(|cookie| cookie.value().to_string())
}

fn from_custom_header(req: &HttpRequest, transport: TokenTransport) -> Option<String> {
    req.headers()
        .get(transport.header)
        .and_then(|h| h.to_str().ok())
        .map(|token| token.to_string())
}
