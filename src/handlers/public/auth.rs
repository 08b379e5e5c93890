// handlers/public/auth.rs - Google sign-in and logout
//
// These are browser routes: they answer with redirects and cookies rather
// than the JSON envelope.

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{AppendHeaders, IntoResponse, Response},
};
use serde::Deserialize;

use crate::auth::{self, cookie, AuthError};
use crate::error::ApiError;
use crate::state::AppState;

/// Where the browser lands after a successful sign-in
pub const AFTER_SIGN_IN: &str = "/dashboard";

// OAuth state cookie lives just long enough to complete the round trip
const STATE_COOKIE_MAX_AGE: i64 = 600;

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/**
 * GET /auth/login - Start the Google authorization-code flow
 *
 * Stores a random state value in a short-lived cookie and redirects the
 * browser to Google's consent screen.
 */
pub async fn login(State(state): State<AppState>) -> Result<Response, ApiError> {
    let google = state.google.as_ref().ok_or(AuthError::OAuthNotConfigured)?;

    let oauth_state = uuid::Uuid::new_v4().simple().to_string();
    let location = google.authorize_url(&oauth_state)?;

    Ok((
        StatusCode::FOUND,
        AppendHeaders([
            (
                header::SET_COOKIE,
                cookie::build(cookie::OAUTH_STATE_COOKIE, &oauth_state, STATE_COOKIE_MAX_AGE, state.secure_cookies()),
            ),
            (header::LOCATION, location.to_string()),
        ]),
    )
        .into_response())
}

/**
 * GET /auth/callback?code&state - Finish sign-in
 *
 * Verifies the state cookie, exchanges the code for the user's profile, runs
 * the sign-in callback (creating the user row on first sign-in) and sets the
 * session cookie.
 */
pub async fn callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<CallbackQuery>,
) -> Result<Response, ApiError> {
    let google = state.google.as_ref().ok_or(AuthError::OAuthNotConfigured)?;

    if let Some(error) = query.error {
        tracing::warn!("Sign-in cancelled by provider: {}", error);
        return Err(ApiError::unauthorized("Sign-in was cancelled"));
    }

    let expected = cookie::read(&headers, cookie::OAUTH_STATE_COOKIE);
    match (&expected, &query.state) {
        (Some(expected), Some(given)) if expected == given => {}
        _ => return Err(AuthError::StateMismatch.into()),
    }

    let code = query
        .code
        .filter(|code| !code.is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing authorization code"))?;

    let profile = google.exchange_code(&code).await?;
    let user = auth::sign_in(state.store(), &profile).await?;
    let token = state.sessions.issue(&user)?;

    let secure = state.secure_cookies();
    let max_age = state.sessions.lifetime().num_seconds();

    Ok((
        StatusCode::FOUND,
        AppendHeaders([
            (header::SET_COOKIE, cookie::build(cookie::SESSION_COOKIE, &token, max_age, secure)),
            (header::SET_COOKIE, cookie::clear(cookie::OAUTH_STATE_COOKIE, secure)),
            (header::LOCATION, AFTER_SIGN_IN.to_string()),
        ]),
    )
        .into_response())
}

/// POST /auth/logout - drop the session cookie
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        AppendHeaders([(header::SET_COOKIE, cookie::clear(cookie::SESSION_COOKIE, state.secure_cookies()))]),
        axum::Json(serde_json::json!({ "success": true, "data": { "signed_out": true } })),
    )
}
