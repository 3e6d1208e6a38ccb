use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::app::AppState;
use crate::auth;
use crate::error::ApiError;

/// Schemes accepted in the Authorization header
const SCHEMES: [&str; 2] = ["Token", "Bearer"];

/// Resolves the bearer token to a [`Caller`](crate::auth::Caller) and makes it
/// available to handlers as a request extension
pub async fn token_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let raw = extract_token_from_headers(request.headers()).map_err(ApiError::unauthorized)?;

    let caller = auth::resolve(state.store.as_ref(), &raw).await?;
    tracing::debug!("Resolved caller {} for {}", caller.id(), request.uri().path());

    request.extensions_mut().insert(caller);
    Ok(next.run(request).await)
}

/// Extract the raw token from `Authorization: Token <key>` or `Bearer <key>`
fn extract_token_from_headers(headers: &HeaderMap) -> Result<String, &'static str> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or("Authentication credentials were not provided.")?
        .to_str()
        .map_err(|_| "Invalid token header.")?;

    let (scheme, token) = value.trim().split_once(' ').ok_or("Invalid token header. No credentials provided.")?;
    if !SCHEMES.iter().any(|s| s.eq_ignore_ascii_case(scheme)) {
        return Err("Authentication credentials were not provided.");
    }

    let token = token.trim();
    if token.is_empty() || token.contains(' ') {
        return Err("Invalid token header. Token string should not contain spaces.");
    }
    Ok(token.to_string())
}
