use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::StatusCode;
use axum::http::request::Parts;
use uuid::Uuid;

pub mod chat;
pub mod contact;
pub mod products;

pub const X_SESSION_ID: &str = "X-Session-ID";

/// Chat session the request belongs to, taken from the `X-Session-ID` header.
#[derive(Debug)]
pub struct ExtractSession(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for ExtractSession
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Self, (StatusCode, &'static str)> {
        let Some(header) = parts.headers.get(X_SESSION_ID) else {
            return Err((StatusCode::BAD_REQUEST, "`X-Session-ID` header is missing"));
        };

        header
            .to_str()
            .ok()
            .and_then(parse_session_id)
            .map(ExtractSession)
            .ok_or((StatusCode::BAD_REQUEST, "invalid session id"))
    }
}

/// Surrounding whitespace and letter case are not significant.
fn parse_session_id(raw: &str) -> Option<Uuid> {
    Uuid::parse_str(raw.trim()).ok()
}
