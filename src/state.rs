use std::sync::Arc;

use crate::auth::{AuthError, GoogleOAuth, SessionKeys};
use crate::config::AppConfig;
use crate::database::{DatabaseManager, Store};
use crate::notify::Notifier;

/// Everything a handler needs, built once at startup and cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseManager,
    pub sessions: SessionKeys,
    pub notifier: Notifier,
    pub google: Option<GoogleOAuth>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(
        db: DatabaseManager,
        config: AppConfig,
        notifier: Notifier,
        http: reqwest::Client,
    ) -> Result<Self, AuthError> {
        let sessions = SessionKeys::new(&config.security.auth_secret, config.security.session_expiry_hours)?;
        let google = config
            .security
            .google
            .as_ref()
            .map(|google| GoogleOAuth::new(google, &config.server.public_base_url, http));

        Ok(Self {
            db,
            sessions,
            notifier,
            google,
            config: Arc::new(config),
        })
    }

    pub fn store(&self) -> &Store {
        self.db.store()
    }

    /// Cookies get the Secure flag when the deployment requires HTTPS
    pub fn secure_cookies(&self) -> bool {
        self.config.security.require_https
    }
}
