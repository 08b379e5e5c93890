// Google OAuth 2.0 authorization-code flow
use serde::Deserialize;
use std::time::Duration;
use url::Url;

use super::AuthError;
use crate::config::GoogleOAuthConfig;

const AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

/// Fields of the OpenID userinfo response the sign-in callback needs.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleProfile {
    pub email: Option<String>,
    pub email_verified: Option<bool>,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Clone)]
pub struct GoogleOAuth {
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    token_url: String,
    userinfo_url: String,
    http: reqwest::Client,
}

impl GoogleOAuth {
    pub fn new(config: &GoogleOAuthConfig, public_base_url: &str, http: reqwest::Client) -> Self {
        Self {
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_uri: format!("{}/auth/callback", public_base_url.trim_end_matches('/')),
            token_url: TOKEN_URL.to_string(),
            userinfo_url: USERINFO_URL.to_string(),
            http,
        }
    }

    /// Point the token and userinfo calls somewhere else (local stub servers).
    pub fn with_endpoints(mut self, token_url: impl Into<String>, userinfo_url: impl Into<String>) -> Self {
        self.token_url = token_url.into();
        self.userinfo_url = userinfo_url.into();
        self
    }

    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    pub fn authorize_url(&self, state: &str) -> Result<Url, AuthError> {
        Url::parse_with_params(
            AUTHORIZE_URL,
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", "openid email profile"),
                ("state", state),
                ("prompt", "select_account"),
            ],
        )
        .map_err(|e| AuthError::OAuth(e.to_string()))
    }

    /// Trade the callback code for an access token and fetch the profile.
    pub async fn exchange_code(&self, code: &str) -> Result<GoogleProfile, AuthError> {
        let token: TokenResponse = self
            .http
            .post(&self.token_url)
            .timeout(Duration::from_secs(10))
            .form(&[
                ("code", code),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AuthError::OAuth(format!("token exchange: {}", e)))?
            .json()
            .await
            .map_err(|e| AuthError::OAuth(format!("token response: {}", e)))?;

        self.http
            .get(&self.userinfo_url)
            .timeout(Duration::from_secs(10))
            .bearer_auth(&token.access_token)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AuthError::OAuth(format!("userinfo: {}", e)))?
            .json::<GoogleProfile>()
            .await
            .map_err(|e| AuthError::OAuth(format!("userinfo response: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authorize_url_carries_state_and_redirect() {
        let config = GoogleOAuthConfig {
            client_id: "client-123".into(),
            client_secret: "secret".into(),
        };
        let oauth = GoogleOAuth::new(&config, "https://studio.example/", reqwest::Client::new());
        let url = oauth.authorize_url("xyz").unwrap();

        assert_eq!(url.host_str(), Some("accounts.google.com"));
        let pairs: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs["state"], "xyz");
        assert_eq!(pairs["client_id"], "client-123");
        assert_eq!(pairs["redirect_uri"], "https://studio.example/auth/callback");
        assert!(!url.as_str().contains("secret"));
    }
}
