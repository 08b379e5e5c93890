use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use thiserror::Error;

/// Read access to environment-style key/value settings.
///
/// The server reads the process environment; tests hand in a map.
pub trait EnvSource {
    fn get(&self, key: &str) -> Option<String>;

    /// First non-empty, trimmed value among `keys`.
    fn first_of(&self, keys: &[&str]) -> Option<String> {
        keys.iter()
            .filter_map(|key| self.get(key))
            .map(|value| value.trim().to_string())
            .find(|value| !value.is_empty())
    }
}

/// The real process environment (after `.env` has been loaded by `dotenvy`).
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

impl EnvSource for HashMap<&str, &str> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).map(|v| v.to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("{0} is not defined")]
    MissingCredential(&'static str),

    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub webhook: WebhookConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    /// Externally visible origin, used to build the OAuth redirect URI.
    pub public_base_url: String,
    /// Largest request body accepted; images travel base64-encoded inside JSON.
    pub max_body_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing)]
    pub auth_secret: String,
    pub session_expiry_hours: u64,
    pub cors_origins: Vec<String>,
    pub require_https: bool,
    pub google: Option<GoogleOAuthConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleOAuthConfig {
    pub client_id: String,
    #[serde(skip_serializing)]
    pub client_secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    pub url: Option<String>,
    #[serde(skip_serializing)]
    pub token: Option<String>,
    pub timeout_secs: u64,
    pub queue_capacity: usize,
}

impl WebhookConfig {
    /// Both endpoint and bearer token are needed before anything is sent.
    pub fn is_enabled(&self) -> bool {
        self.url.is_some() && self.token.is_some()
    }
}

impl AppConfig {
    /// Pick the preset named by `APP_ENV` and apply overrides.
    ///
    /// A value that is set but does not parse is an error, not a silent fallback.
    pub fn from_env(env: &impl EnvSource) -> Result<Self, ConfigError> {
        let environment = match env.get("APP_ENV").as_deref() {
            Some("production") | Some("prod") => Environment::Production,
            Some("staging") | Some("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides(env)
    }

    fn with_env_overrides(mut self, env: &impl EnvSource) -> Result<Self, ConfigError> {
        // Server overrides
        if let Some(v) = parsed(env, "STUDIO_API_PORT")?.or(parsed(env, "PORT")?) {
            self.server.port = v;
        }
        if let Some(v) = env.first_of(&["PUBLIC_BASE_URL"]) {
            self.server.public_base_url = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = parsed(env, "MAX_BODY_BYTES")? {
            self.server.max_body_bytes = v;
        }

        // Database overrides
        if let Some(v) = parsed(env, "DATABASE_MAX_CONNECTIONS")? {
            self.database.max_connections = v;
        }
        if let Some(v) = parsed(env, "DATABASE_CONNECTION_TIMEOUT")? {
            self.database.connection_timeout = v;
        }

        // Security overrides
        if let Some(v) = env.first_of(&["AUTH_SECRET"]) {
            self.security.auth_secret = v;
        }
        if let Some(v) = parsed(env, "SESSION_EXPIRY_HOURS")? {
            self.security.session_expiry_hours = v;
        }
        if let Some(v) = env.get("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Some(v) = parsed(env, "SECURITY_REQUIRE_HTTPS")? {
            self.security.require_https = v;
        }
        if let (Some(client_id), Some(client_secret)) = (
            env.first_of(&["GOOGLE_CLIENT_ID"]),
            env.first_of(&["GOOGLE_CLIENT_SECRET"]),
        ) {
            self.security.google = Some(GoogleOAuthConfig { client_id, client_secret });
        }

        // Webhook overrides
        if let Some(v) = env.first_of(&["WEBHOOK_URL"]) {
            self.webhook.url = Some(v);
        }
        if let Some(v) = env.first_of(&["WEBHOOK_TOKEN"]) {
            self.webhook.token = Some(v);
        }
        if let Some(v) = parsed(env, "WEBHOOK_TIMEOUT_SECS")? {
            self.webhook.timeout_secs = v;
        }
        if let Some(v) = parsed::<usize>(env, "WEBHOOK_QUEUE_CAPACITY")? {
            self.webhook.queue_capacity = v.max(1);
        }

        Ok(self)
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                port: 3000,
                public_base_url: "http://localhost:3000".to_string(),
                max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            },
            database: DatabaseConfig {
                max_connections: 5,
                connection_timeout: 30,
            },
            security: SecurityConfig {
                auth_secret: String::new(),
                session_expiry_hours: 24 * 7, // 1 week
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
                require_https: false,
                google: None,
            },
            webhook: WebhookConfig {
                url: None,
                token: None,
                timeout_secs: 10,
                queue_capacity: 256,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                port: 3000,
                public_base_url: "https://staging.example.com".to_string(),
                max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            },
            database: DatabaseConfig {
                max_connections: 10,
                connection_timeout: 10,
            },
            security: SecurityConfig {
                auth_secret: String::new(),
                session_expiry_hours: 24,
                cors_origins: vec!["https://staging.example.com".to_string()],
                require_https: true,
                google: None,
            },
            webhook: WebhookConfig {
                url: None,
                token: None,
                timeout_secs: 10,
                queue_capacity: 256,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                port: 3000,
                public_base_url: "https://app.example.com".to_string(),
                max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            },
            database: DatabaseConfig {
                max_connections: 10,
                connection_timeout: 5,
            },
            security: SecurityConfig {
                auth_secret: String::new(),
                session_expiry_hours: 24,
                cors_origins: vec!["https://app.example.com".to_string()],
                require_https: true,
                google: None,
            },
            webhook: WebhookConfig {
                url: None,
                token: None,
                timeout_secs: 5,
                queue_capacity: 1024,
            },
        }
    }
}

/// 16 MiB: a full-size phone photo after base64 inflation, plus the JSON around it.
pub const DEFAULT_MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

// Set-but-blank counts as unset
fn parsed<T: FromStr>(env: &impl EnvSource, key: &'static str) -> Result<Option<T>, ConfigError> {
    match env.first_of(&[key]) {
        None => Ok(None),
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}

// Process-wide config for the binaries; library code takes `&AppConfig` explicitly
pub static CONFIG: Lazy<Result<AppConfig, ConfigError>> = Lazy::new(|| AppConfig::from_env(&ProcessEnv));

pub fn config() -> Result<&'static AppConfig, ConfigError> {
    CONFIG.as_ref().map_err(Clone::clone)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.environment, Environment::Development);
        assert!(!config.security.require_https);
        assert!(!config.webhook.is_enabled());
    }

    #[test]
    fn test_app_env_selects_preset() {
        let env: HashMap<&str, &str> = HashMap::from([("APP_ENV", "prod")]);
        let config = AppConfig::from_env(&env).unwrap();
        assert_eq!(config.environment, Environment::Production);
        assert!(config.security.require_https);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("PORT", "8088"),
            ("AUTH_SECRET", "  s3cret  "),
            ("WEBHOOK_URL", "https://hooks.example.com/faq"),
            ("WEBHOOK_TOKEN", "tok"),
            ("SECURITY_CORS_ORIGINS", "https://a.example, https://b.example,"),
            ("PUBLIC_BASE_URL", "https://studio.example/"),
        ]);
        let config = AppConfig::from_env(&env).unwrap();
        assert_eq!(config.server.port, 8088);
        assert_eq!(config.security.auth_secret, "s3cret");
        assert!(config.webhook.is_enabled());
        assert_eq!(config.security.cors_origins.len(), 2);
        assert_eq!(config.server.public_base_url, "https://studio.example");
    }

    #[test]
    fn test_google_requires_both_values() {
        let env: HashMap<&str, &str> = HashMap::from([("GOOGLE_CLIENT_ID", "id")]);
        assert!(AppConfig::from_env(&env).unwrap().security.google.is_none());

        let env: HashMap<&str, &str> =
            HashMap::from([("GOOGLE_CLIENT_ID", "id"), ("GOOGLE_CLIENT_SECRET", "secret")]);
        assert!(AppConfig::from_env(&env).unwrap().security.google.is_some());
    }

    #[test]
    fn test_unparseable_values_are_rejected() {
        for (key, value) in [
            ("PORT", "abc"),
            ("MAX_BODY_BYTES", "-1"),
            ("SESSION_EXPIRY_HOURS", "a week"),
            ("SECURITY_REQUIRE_HTTPS", "yes"),
        ] {
            let env: HashMap<&str, &str> = HashMap::from([(key, value)]);
            match AppConfig::from_env(&env) {
                Err(ConfigError::Invalid { key: k, value: v }) => {
                    assert_eq!(k, key);
                    assert_eq!(v, value);
                }
                other => panic!("{}={} was accepted: {:?}", key, value, other.map(|c| c.server.port)),
            }
        }
    }

    #[test]
    fn test_body_limit_default_and_override() {
        let empty: HashMap<&str, &str> = HashMap::new();
        assert_eq!(AppConfig::from_env(&empty).unwrap().server.max_body_bytes, DEFAULT_MAX_BODY_BYTES);

        let env: HashMap<&str, &str> = HashMap::from([("MAX_BODY_BYTES", "1048576")]);
        assert_eq!(AppConfig::from_env(&env).unwrap().server.max_body_bytes, 1_048_576);
    }

    #[test]
    fn test_first_of_skips_blank_values() {
        let env: HashMap<&str, &str> = HashMap::from([("A", "   "), ("B", " value ")]);
        assert_eq!(env.first_of(&["A", "B"]).as_deref(), Some("value"));
        assert_eq!(env.first_of(&["C"]), None);
    }
}
