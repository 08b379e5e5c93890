pub mod cookie;
pub mod google;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::database::models::User;
use crate::database::{DatabaseError, Store};

pub use google::{GoogleOAuth, GoogleProfile};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("AUTH_SECRET is not configured")]
    SecretNotConfigured,

    #[error("No session")]
    MissingSession,

    #[error("Invalid session: {0}")]
    InvalidSession(String),

    #[error("SESSION_EXPIRY_HOURS must be between 1 and {max}, got {0}", max = MAX_SESSION_HOURS)]
    InvalidLifetime(u64),

    #[error("Session token generation failed: {0}")]
    TokenGeneration(String),

    #[error("Google sign-in is not configured")]
    OAuthNotConfigured,

    #[error("OAuth state did not match")]
    StateMismatch,

    #[error("OAuth exchange failed: {0}")]
    OAuth(String),

    #[error("Sign-in profile has no verified email")]
    EmailMissing,

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Session token claims; `sub` is the user's email.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub sub: String,
    pub uid: i64,
    #[serde(default)]
    pub name: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn for_user(user: &User, lifetime: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: user.email.clone(),
            uid: user.id,
            name: user.name.clone(),
            iat: now.timestamp(),
            exp: (now + lifetime).timestamp(),
        }
    }
}

/// Signs and verifies session tokens with the HS256 secret.
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    lifetime: Duration,
}

/// Ten years; keeps `iat + lifetime` inside chrono's range.
pub const MAX_SESSION_HOURS: u64 = 24 * 365 * 10;

impl SessionKeys {
    pub fn new(secret: &str, expiry_hours: u64) -> Result<Self, AuthError> {
        if secret.trim().is_empty() {
            return Err(AuthError::SecretNotConfigured);
        }
        let lifetime = Some(expiry_hours)
            .filter(|hours| (1..=MAX_SESSION_HOURS).contains(hours))
            .and_then(|hours| i64::try_from(hours).ok())
            .and_then(Duration::try_hours)
            .ok_or(AuthError::InvalidLifetime(expiry_hours))?;

        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            lifetime,
        })
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    pub fn issue(&self, user: &User) -> Result<String, AuthError> {
        self.sign(&Claims::for_user(user, self.lifetime))
    }

    pub fn sign(&self, claims: &Claims) -> Result<String, AuthError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| AuthError::TokenGeneration(e.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::InvalidSession(e.to_string()))
    }
}

/// Authenticated user context placed in request extensions by the session middleware
#[derive(Debug, Clone, Serialize)]
pub struct SessionUser {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub expires_at: i64,
}

impl From<Claims> for SessionUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.uid,
            email: claims.sub,
            name: claims.name,
            expires_at: claims.exp,
        }
    }
}

/// Sign-in callback: a profile must carry an email; the user row is created on first sign-in.
pub async fn sign_in(store: &Store, profile: &GoogleProfile) -> Result<User, AuthError> {
    let email = match profile.email.as_deref().map(str::trim) {
        Some(email) if !email.is_empty() && profile.email_verified != Some(false) => email,
        _ => return Err(AuthError::EmailMissing),
    };
    let name = profile.name.as_deref().unwrap_or_default();
    let user = User::upsert_on_sign_in(store, email, name).await?;
    tracing::info!("Signed in {}", user.email);
    Ok(user)
}
