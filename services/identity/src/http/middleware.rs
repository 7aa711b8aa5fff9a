//! Bearer token gate for the admin routes.

use super::AppState;
use crate::error::AuthError;
use crate::jwt::TokenError;
use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use tracing::debug;

/// Requires a valid access token in `Authorization: Bearer`.
///
/// Verified claims are stored in the request extensions.
pub async fn require_access_token(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| TokenError::Malformed("missing bearer token".to_string()))?;

    let claims = state.auth.issuer().verify_access(token).map_err(|e| {
        debug!(path = %request.uri().path(), error = %e, "Rejected bearer token");
        e
    })?;

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}
