#![allow(dead_code)]

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::Value;

use studio_api::auth::SessionKeys;
use studio_api::config::AppConfig;
use studio_api::database::models::User;
use studio_api::database::{migrate, DatabaseCredentials, DatabaseManager};
use studio_api::notify::Notifier;
use studio_api::{app, AppState};

pub const TEST_SECRET: &str = "integration-test-secret";
pub const PNG: &str = "data:image/png;base64,iVBORw0KGgo=";

/// A server on its own port with its own in-memory database.
pub struct TestApp {
    pub port: u16,
    pub base_url: String,
    pub state: AppState,
    pub client: reqwest::Client,
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::development();
    config.security.auth_secret = TEST_SECRET.to_string();
    config
}

pub async fn test_state(config: AppConfig) -> Result<AppState> {
    let db = DatabaseManager::connect(&DatabaseCredentials::new(":memory:", None), &config.database).await?;
    migrate::ensure_schema(db.store()).await?;

    let http = reqwest::Client::new();
    let (notifier, _worker) = Notifier::spawn(&config.webhook, http.clone());
    Ok(AppState::new(db, config, notifier, http)?)
}

impl TestApp {
    pub async fn spawn() -> Result<Self> {
        Self::spawn_with(test_config()).await
    }

    pub async fn spawn_with(config: AppConfig) -> Result<Self> {
        Self::spawn_state(test_state(config).await?).await
    }

    pub async fn spawn_state(state: AppState) -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
        let router = app(state.clone());
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        let app = Self {
            port,
            base_url: format!("http://127.0.0.1:{}", port),
            state,
            client: reqwest::Client::new(),
        };
        app.wait_ready(Duration::from_secs(5)).await?;
        Ok(app)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if let Ok(resp) = self.client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Session token for a (created on demand) user
    pub async fn token(&self, email: &str) -> Result<String> {
        let user = User::upsert_on_sign_in(self.state.store(), email, "Test Admin").await?;
        Ok(SessionKeys::new(TEST_SECRET, 1)?.issue(&user)?)
    }

    pub async fn admin_token(&self) -> Result<String> {
        self.token("admin@studio.test").await
    }

    pub async fn list(&self, resource: &str) -> Result<Vec<Value>> {
        let res = self.client.get(self.url(&format!("/api/{}", resource))).send().await?;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = res.json().await?;
        assert_eq!(body["success"], true, "unexpected body: {}", body);
        Ok(body["data"].as_array().cloned().unwrap_or_default())
    }

    /// Send a JSON body with the given session token
    pub async fn send(
        &self,
        method: reqwest::Method,
        resource: &str,
        token: &str,
        body: &Value,
    ) -> Result<(StatusCode, Value)> {
        let res = self
            .client
            .request(method, self.url(&format!("/api/{}", resource)))
            .bearer_auth(token)
            .json(body)
            .send()
            .await?;
        let status = res.status();
        Ok((status, res.json().await?))
    }
}
