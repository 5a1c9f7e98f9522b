use axum::http::{header::AUTHORIZATION, HeaderMap};

use crate::ApiError;

/// Header mutating requests use to echo back the connection id announced in
/// the WebSocket `hello` event, so fan-out can skip the originating tab.
pub const CONNECTION_ID_HEADER: &str = "x-connection-id";

pub fn require_bearer(headers: &HeaderMap) -> Result<String, ApiError> {
    let value = headers
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .ok_or_else(|| ApiError::unauthorized("missing authorization header"))?;

    let mut parts = value.split_whitespace();
    let scheme = parts.next().unwrap_or("");
    if !scheme.eq_ignore_ascii_case("Bearer") {
        return Err(ApiError::unauthorized("invalid authorization scheme"));
    }

    let token = parts.next().unwrap_or("");
    if token.is_empty() {
        return Err(ApiError::unauthorized("missing bearer token"));
    }

    Ok(token.to_string())
}

/// The fan-out correlation id is optional; requests without it (or with a
/// non-UTF-8 value) simply get the full echo on all their connections.
pub fn origin_connection_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(CONNECTION_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
