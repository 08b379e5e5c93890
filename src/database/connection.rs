use sqlx::sqlite::SqliteConnectOptions;
use std::fmt;
use std::str::FromStr;

use crate::config::{ConfigError, EnvSource};
use crate::database::manager::DatabaseError;

const URL_KEYS: &[&str] = &["PRIVATE_TURSO_DATABASE_URL", "TURSO_DATABASE_URL"];
const TOKEN_KEYS: &[&str] = &["PRIVATE_TURSO_AUTH_TOKEN", "TURSO_AUTH_TOKEN"];

/// Database location and token as read from the environment.
#[derive(Clone)]
pub struct DatabaseCredentials {
    pub url: String,
    pub auth_token: Option<String>,
}

impl DatabaseCredentials {
    pub fn new(url: impl Into<String>, auth_token: Option<String>) -> Self {
        Self { url: url.into(), auth_token }
    }

    /// A token is mandatory unless the URL points at a local file.
    pub fn from_env(env: &impl EnvSource) -> Result<Self, ConfigError> {
        let url = env
            .first_of(URL_KEYS)
            .ok_or(ConfigError::MissingCredential("PRIVATE_TURSO_DATABASE_URL"))?;
        let auth_token = env.first_of(TOKEN_KEYS);

        if auth_token.is_none() && !url.contains("file:") {
            return Err(ConfigError::MissingCredential("PRIVATE_TURSO_AUTH_TOKEN"));
        }

        Ok(Self { url, auth_token })
    }

    pub fn is_in_memory(&self) -> bool {
        is_memory_url(&self.url)
    }

    /// Work out which backend the URL names.
    ///
    /// `libsql://`, `http(s)://` and `ws(s)://` go to the hosted database and
    /// need the token; `file:`, `sqlite:` and the memory forms stay local.
    pub fn target(&self) -> Result<DatabaseTarget, DatabaseError> {
        let url = self.url.trim();

        if is_memory_url(url) {
            return SqliteConnectOptions::from_str("sqlite::memory:")
                .map(DatabaseTarget::Memory)
                .map_err(|e| DatabaseError::InvalidUrl(e.to_string()));
        }

        let lower = url.to_ascii_lowercase();
        if let Some(scheme) = REMOTE_SCHEMES.iter().find(|(scheme, _)| lower.starts_with(scheme)) {
            let auth_token = self
                .auth_token
                .clone()
                .filter(|t| !t.is_empty())
                .ok_or(ConfigError::MissingCredential("PRIVATE_TURSO_AUTH_TOKEN"))?;
            let base = redact(url);
            let rest = &base[scheme.0.len()..];
            if rest.trim_matches('/').is_empty() {
                return Err(DatabaseError::InvalidUrl(base));
            }
            return Ok(DatabaseTarget::Remote {
                url: format!("{}{}", scheme.1, rest),
                auth_token,
            });
        }

        let path = if let Some(rest) = url.strip_prefix("file:") {
            rest.strip_prefix("//").unwrap_or(rest)
        } else if let Some(rest) = url.strip_prefix("sqlite://") {
            rest
        } else if let Some(rest) = url.strip_prefix("sqlite:") {
            rest
        } else {
            return Err(DatabaseError::UnsupportedUrl(redact(url)));
        };

        let path = path.split('?').next().unwrap_or_default();
        if path.is_empty() {
            return Err(DatabaseError::InvalidUrl(url.to_string()));
        }

        Ok(DatabaseTarget::File(
            SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true)
                .foreign_keys(true),
        ))
    }
}

/// Where `DatabaseManager::connect` should point.
#[derive(Debug, Clone)]
pub enum DatabaseTarget {
    Memory(SqliteConnectOptions),
    File(SqliteConnectOptions),
    /// Hosted libSQL, `url` already rewritten to the HTTP form the client speaks
    Remote { url: String, auth_token: String },
}

// Scheme prefix and its HTTP equivalent for the libSQL client
const REMOTE_SCHEMES: &[(&str, &str)] = &[
    ("libsql://", "libsql://"),
    ("https://", "https://"),
    ("http://", "http://"),
    ("wss://", "https://"),
    ("ws://", "http://"),
];

fn is_memory_url(url: &str) -> bool {
    matches!(url.trim(), ":memory:" | "sqlite::memory:" | "file::memory:")
}

// Remote URLs may embed credentials in the query string
fn redact(url: &str) -> String {
    url.split('?').next().unwrap_or_default().to_string()
}

impl fmt::Debug for DatabaseCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseCredentials")
            .field("url", &redact(&self.url))
            .field("auth_token", &self.auth_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn missing_url_is_a_credential_error() {
        let env: HashMap<&str, &str> = HashMap::new();
        let err = DatabaseCredentials::from_env(&env).unwrap_err();
        assert_eq!(err.to_string(), "PRIVATE_TURSO_DATABASE_URL is not defined");
    }

    #[test]
    fn remote_url_requires_token() {
        let env: HashMap<&str, &str> =
            HashMap::from([("PRIVATE_TURSO_DATABASE_URL", "libsql://studio.turso.io")]);
        let err = DatabaseCredentials::from_env(&env).unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredential("PRIVATE_TURSO_AUTH_TOKEN")));
    }

    #[test]
    fn file_url_needs_no_token() {
        let env: HashMap<&str, &str> =
            HashMap::from([("PRIVATE_TURSO_DATABASE_URL", " file:local.db ")]);
        let creds = DatabaseCredentials::from_env(&env).unwrap();
        assert_eq!(creds.url, "file:local.db");
        assert!(creds.auth_token.is_none());
        assert!(matches!(creds.target(), Ok(DatabaseTarget::File(_))));
    }

    #[test]
    fn fallback_keys_are_read() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("TURSO_DATABASE_URL", "libsql://studio.turso.io"),
            ("TURSO_AUTH_TOKEN", "tok"),
        ]);
        let creds = DatabaseCredentials::from_env(&env).unwrap();
        assert_eq!(creds.auth_token.as_deref(), Some("tok"));
    }

    #[test]
    fn remote_urls_target_libsql_with_token() {
        let creds = DatabaseCredentials::new("libsql://studio.turso.io?authToken=abc", Some("t".into()));
        match creds.target().unwrap() {
            DatabaseTarget::Remote { url, auth_token } => {
                assert_eq!(url, "libsql://studio.turso.io");
                assert_eq!(auth_token, "t");
            }
            other => panic!("expected a remote target, got {:?}", other),
        }

        let creds = DatabaseCredentials::new("wss://studio.turso.io", Some("t".into()));
        assert!(matches!(
            creds.target().unwrap(),
            DatabaseTarget::Remote { url, .. } if url == "https://studio.turso.io"
        ));
    }

    #[test]
    fn remote_target_without_token_or_host_fails() {
        let creds = DatabaseCredentials::new("libsql://studio.turso.io", None);
        assert!(matches!(
            creds.target(),
            Err(DatabaseError::Config(ConfigError::MissingCredential(_)))
        ));

        let creds = DatabaseCredentials::new("https://", Some("t".into()));
        assert!(matches!(creds.target(), Err(DatabaseError::InvalidUrl(_))));

        let creds = DatabaseCredentials::new("postgres://db", Some("t".into()));
        assert!(matches!(creds.target(), Err(DatabaseError::UnsupportedUrl(_))));
    }

    #[test]
    fn memory_and_sqlite_forms() {
        assert!(DatabaseCredentials::new(":memory:", None).is_in_memory());
        assert!(matches!(
            DatabaseCredentials::new("sqlite::memory:", None).target(),
            Ok(DatabaseTarget::Memory(_))
        ));
        assert!(matches!(
            DatabaseCredentials::new("sqlite://data/studio.db", None).target(),
            Ok(DatabaseTarget::File(_))
        ));
        assert!(matches!(
            DatabaseCredentials::new("file:", None).target(),
            Err(DatabaseError::InvalidUrl(_))
        ));
    }

    #[test]
    fn debug_redacts_token() {
        let creds = DatabaseCredentials::new("libsql://x", Some("secret-token".into()));
        assert!(!format!("{:?}", creds).contains("secret-token"));
    }
}
