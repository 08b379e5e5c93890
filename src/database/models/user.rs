use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::database::manager::DatabaseError;
use crate::database::store::{Row, Store};
use crate::validation::ValidationError;

const SELECT_BY_EMAIL: &str = "SELECT id, email, name, created_at FROM users WHERE email = ?";

// Format SQLite writes for CURRENT_TIMESTAMP
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Someone who has signed in to the dashboard at least once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub created_at: NaiveDateTime,
}

impl User {
    fn from_row(row: &Row) -> Result<Self, DatabaseError> {
        let created_at = row.text("created_at")?;
        Ok(User {
            id: row.integer("id")?,
            email: row.text("email")?,
            name: row.text("name")?,
            created_at: NaiveDateTime::parse_from_str(&created_at, TIMESTAMP_FORMAT).map_err(|_| {
                DatabaseError::Decode {
                    column: "created_at".to_string(),
                    expected: "TIMESTAMP",
                    found: "TEXT",
                }
            })?,
        })
    }

    pub async fn find_by_email(store: &Store, email: &str) -> Result<Option<User>, DatabaseError> {
        store
            .fetch_optional(SELECT_BY_EMAIL, vec![normalize_email(email).into()])
            .await?
            .as_ref()
            .map(User::from_row)
            .transpose()
    }

    pub async fn create(store: &Store, email: &str, name: &str) -> Result<User, DatabaseError> {
        let email = normalize_email(email);
        if email.is_empty() {
            return Err(ValidationError::field("email", "This field is required").into());
        }

        let result = store
            .execute(
                "INSERT INTO users (email, name) VALUES (?, ?)",
                vec![email.as_str().into(), name.trim().into()],
            )
            .await?;

        let id = result.last_insert_id;
        if result.rows_affected == 0 || id <= 0 {
            return Err(DatabaseError::NoInsertId("users"));
        }

        info!("Created user {} ({})", id, email);
        Self::find_by_email(store, &email)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("User {} not found", email)))
    }

    /// Sign-in callback: look the user up by email and create the row on first sign-in.
    pub async fn upsert_on_sign_in(store: &Store, email: &str, name: &str) -> Result<User, DatabaseError> {
        if let Some(user) = Self::find_by_email(store, email).await? {
            return Ok(user);
        }

        match Self::create(store, email, name).await {
            Ok(user) => Ok(user),
            // Lost a race with a concurrent first sign-in
            Err(e) if e.is_unique_violation() => Self::find_by_email(store, email)
                .await?
                .ok_or_else(|| DatabaseError::NotFound(format!("User {} not found", email))),
            Err(e) => Err(e),
        }
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}
