use anyhow::Context;
use serde_json::json;

use crate::auth::SessionKeys;
use crate::cli::{utils, OutputFormat};
use crate::config;
use crate::database::{migrate, models::User};

/// Mint a session token for scripting against the API
pub async fn handle(email: &str, name: Option<&str>, output_format: OutputFormat) -> anyhow::Result<()> {
    let security = &config::config()?.security;
    let keys = SessionKeys::new(&security.auth_secret, security.session_expiry_hours)
        .context("AUTH_SECRET must be set to mint sessions")?;

    let db = utils::connect().await?;
    migrate::ensure_schema(db.store()).await?;
    let user = User::upsert_on_sign_in(db.store(), email, name.unwrap_or_default()).await;
    db.close().await;
    let user = user?;

    let token = keys.issue(&user)?;

    match output_format {
        OutputFormat::Text => {
            println!("{}", token);
            Ok(())
        }
        OutputFormat::Json => utils::output_success(
            output_format,
            &format!("Session issued for {}", user.email),
            Some(json!({
                "token": token,
                "user": user,
                "expires_in": keys.lifetime().num_seconds()
            })),
        ),
    }
}
