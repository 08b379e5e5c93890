use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::auth::{cookie, AuthError, SessionUser};
use crate::error::ApiError;
use crate::state::AppState;

/// Session middleware for every mutating API route.
///
/// Accepts the token from `Authorization: Bearer` or the session cookie,
/// verifies it and injects [`SessionUser`] into the request extensions.
/// API clients always get a 401 JSON body, never a redirect.
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = cookie::session_token(request.headers()).ok_or(AuthError::MissingSession)?;
    let claims = state.sessions.verify(&token)?;

    request.extensions_mut().insert(SessionUser::from(claims));
    Ok(next.run(request).await)
}
