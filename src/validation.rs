// Field checks run before any write reaches the store
use std::collections::BTreeMap;

use serde_json::Value;
use thiserror::Error;

use crate::media::DataUri;

pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 5;

/// One or more rejected fields. Nothing was written when this is returned.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ValidationError {
    pub message: String,
    pub field_errors: BTreeMap<String, String>,
}

impl ValidationError {
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        let mut field_errors = BTreeMap::new();
        field_errors.insert(field.to_string(), message.clone());
        Self { message, field_errors }
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.field_errors.contains_key(field)
    }
}

/// Collects field errors so a client sees every problem in one response.
#[derive(Debug, Default)]
pub struct Validator {
    errors: BTreeMap<String, String>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    fn reject(&mut self, field: &str, message: impl Into<String>) {
        // Keep the first complaint per field
        self.errors.entry(field.to_string()).or_insert_with(|| message.into());
    }

    pub fn require_text(&mut self, field: &str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.reject(field, "This field is required");
        }
        self
    }

    pub fn require_rating(&mut self, field: &str, value: i64) -> &mut Self {
        if !(MIN_RATING..=MAX_RATING).contains(&value) {
            self.reject(
                field,
                format!("Rating must be an integer between {} and {}", MIN_RATING, MAX_RATING),
            );
        }
        self
    }

    pub fn require_flag(&mut self, field: &str, value: i64) -> &mut Self {
        if value != 0 && value != 1 {
            self.reject(field, "Must be 0 or 1");
        }
        self
    }

    /// `data:image/<subtype>;base64,<payload>` with a payload that decodes.
    pub fn require_image_data_uri(&mut self, field: &str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.reject(field, "This field is required");
        } else if let Err(e) = DataUri::parse_image(value) {
            self.reject(field, e.to_string());
        }
        self
    }

    /// `YYYY-MM-DD` or a full RFC 3339 timestamp.
    pub fn require_iso_date(&mut self, field: &str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.reject(field, "This field is required");
        } else if !is_iso_date(value) {
            self.reject(field, "Must be an ISO date (YYYY-MM-DD)");
        }
        self
    }

    /// Record an error found while coercing wire values.
    pub fn push(&mut self, error: ValidationError) -> &mut Self {
        for (field, message) in error.field_errors {
            self.reject(&field, message);
        }
        self
    }

    pub fn finish(self) -> Result<(), ValidationError> {
        if self.errors.is_empty() {
            return Ok(());
        }
        let message = match self.errors.iter().next() {
            Some((field, msg)) if self.errors.len() == 1 => format!("Invalid field '{}': {}", field, msg),
            _ => format!("{} fields are invalid", self.errors.len()),
        };
        Err(ValidationError { message, field_errors: self.errors })
    }
}

pub fn is_iso_date(value: &str) -> bool {
    let value = value.trim();
    chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
        || chrono::DateTime::parse_from_rfc3339(value).is_ok()
}

/// Strict integer from JSON: `3` passes, `3.5`, `"3"` and `true` do not.
pub fn json_integer(field: &str, value: Option<&Value>) -> Result<i64, ValidationError> {
    match value {
        None | Some(Value::Null) => Err(ValidationError::field(field, "This field is required")),
        Some(Value::Number(n)) => n
            .as_i64()
            .ok_or_else(|| ValidationError::field(field, "Must be an integer")),
        Some(_) => Err(ValidationError::field(field, "Must be an integer")),
    }
}

/// 0/1 flag from JSON, also accepting `true`/`false`.
pub fn json_flag(field: &str, value: Option<&Value>) -> Result<i64, ValidationError> {
    match value {
        Some(Value::Bool(b)) => Ok(i64::from(*b)),
        other => json_integer(field, other),
    }
}

/// Positive row id from a request body.
pub fn json_id(value: Option<&Value>) -> Result<i64, ValidationError> {
    let id = json_integer("id", value).map_err(|_| ValidationError::field("id", "ID is required"))?;
    if id <= 0 {
        return Err(ValidationError::field("id", "ID must be a positive integer"));
    }
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_and_blank_text_is_rejected() {
        let mut v = Validator::new();
        v.require_text("question", "").require_text("answer", "   ");
        let err = v.finish().unwrap_err();
        assert!(err.has_field("question"));
        assert!(err.has_field("answer"));
        assert_eq!(err.message, "2 fields are invalid");
    }

    #[test]
    fn rating_bounds_are_inclusive() {
        for ok in [1, 5] {
            let mut v = Validator::new();
            v.require_rating("rating", ok);
            assert!(v.finish().is_ok(), "rating {} should pass", ok);
        }
        for bad in [0, 6, -1] {
            let mut v = Validator::new();
            v.require_rating("rating", bad);
            assert!(v.finish().is_err(), "rating {} should fail", bad);
        }
    }

    #[test]
    fn fractional_and_string_ratings_are_not_integers() {
        assert!(json_integer("rating", Some(&json!(3.5))).is_err());
        assert!(json_integer("rating", Some(&json!("3"))).is_err());
        assert!(json_integer("rating", None).is_err());
        assert_eq!(json_integer("rating", Some(&json!(3))).unwrap(), 3);
    }

    #[test]
    fn flags_accept_booleans_and_bits() {
        assert_eq!(json_flag("isActive", Some(&json!(true))).unwrap(), 1);
        assert_eq!(json_flag("isActive", Some(&json!(0))).unwrap(), 0);
        let mut v = Validator::new();
        v.require_flag("isActive", 2);
        assert!(v.finish().is_err());
    }

    #[test]
    fn ids_must_be_positive() {
        assert!(json_id(Some(&json!(0))).is_err());
        assert!(json_id(Some(&json!("7"))).is_err());
        assert_eq!(json_id(Some(&json!(7))).unwrap(), 7);
    }

    #[test]
    fn iso_dates() {
        assert!(is_iso_date("2024-01-01"));
        assert!(is_iso_date("2024-01-01T10:00:00Z"));
        assert!(!is_iso_date("01/01/2024"));
        assert!(!is_iso_date("2024-13-01"));
    }

    #[test]
    fn image_must_be_a_data_uri() {
        let mut v = Validator::new();
        v.require_image_data_uri("image", "https://example.com/pot.png");
        assert!(v.finish().unwrap_err().has_field("image"));

        let mut v = Validator::new();
        v.require_image_data_uri("image", "data:image/png;base64,iVBORw0KGgo=");
        assert!(v.finish().is_ok());
    }
}
