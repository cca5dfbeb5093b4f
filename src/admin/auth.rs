use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::http::server::AppState;

/// Realm announced in the Basic challenge.
pub const REALM: &str = "caddyLander";

/// HTTP Basic check against the configured admin password. The username is
/// ignored; an empty configured password lets every request through.
pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let expected = &state.admin.password;
    if expected.is_empty() {
        return next.run(request).await;
    }

    if let Some(password) = basic_password(request.headers()) {
        if &password == expected {
            return next.run(request).await;
        }
    }

    tracing::warn!(path = %request.uri().path(), "Admin authentication failed");
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, format!("Basic realm=\"{}\"", REALM))],
    )
        .into_response()
}

/// Password half of a `Basic` Authorization header, if well-formed.
fn basic_password(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let encoded = value.strip_prefix("Basic ")?.trim();
    let decoded = String::from_utf8(STANDARD.decode(encoded).ok()?).ok()?;
    let (_user, password) = decoded.split_once(':')?;
    Some(password.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_basic_password_parsing() {
        let encoded = STANDARD.encode("admin:s3cret:with-colon");
        assert_eq!(
            basic_password(&headers(&format!("Basic {}", encoded))).as_deref(),
            Some("s3cret:with-colon")
        );

        assert_eq!(basic_password(&headers("Bearer token")), None);
        assert_eq!(basic_password(&headers("Basic !!!")), None);
        assert_eq!(
            basic_password(&headers(&format!("Basic {}", STANDARD.encode("nocolon")))),
            None
        );
        assert_eq!(basic_password(&HeaderMap::new()), None);
    }
}
