use anyhow::Context;
use serde_json::{json, Value};

use crate::cli::OutputFormat;
use crate::config::{self, ProcessEnv};
use crate::database::DatabaseManager;

/// Output a success message in the appropriate format
pub fn output_success(output_format: OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let Some(data) = data {
                response["data"] = data;
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Open the configured database the same way the server does
pub async fn connect() -> anyhow::Result<DatabaseManager> {
    let config = config::config()?;
    DatabaseManager::from_env(&ProcessEnv, &config.database)
        .await
        .context("failed to open database (check PRIVATE_TURSO_DATABASE_URL)")
}
