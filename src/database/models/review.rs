use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::database::entity::{Entity, SqlValue};
use crate::database::manager::DatabaseError;
use crate::database::schema::{EntitySchema, REVIEWS};
use crate::database::store::Row;
use crate::validation::{json_integer, ValidationError, Validator};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Review {
    pub name: String,
    pub review: String,
    pub rating: i64,
    pub date: String,
    pub role: String,
}

/// `review_text` is the column name older dashboards still send.
#[derive(Debug, Deserialize)]
pub struct ReviewInput {
    #[serde(default)]
    pub name: String,
    #[serde(default, alias = "review_text")]
    pub review: String,
    #[serde(default)]
    pub rating: Option<Value>,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReviewView {
    pub id: i64,
    pub name: String,
    pub review: String,
    pub rating: i64,
    pub date: String,
    pub role: String,
}

impl Entity for Review {
    type Input = ReviewInput;
    type View = ReviewView;

    const SCHEMA: &'static EntitySchema = &REVIEWS;
    const LABEL: &'static str = "Review";

    fn from_input(input: ReviewInput) -> Result<Self, ValidationError> {
        let mut validator = Validator::new();

        // A non-integer rating gets its own message instead of the range one
        let rating = match json_integer("rating", input.rating.as_ref()) {
            Ok(rating) => rating,
            Err(e) => {
                validator.push(e);
                0
            }
        };

        let review = Review {
            name: input.name,
            review: input.review,
            rating,
            date: input.date.trim().to_string(),
            role: input.role.unwrap_or_default(),
        };
        review.check(&mut validator);
        validator.finish()?;
        Ok(review)
    }

    fn check(&self, validator: &mut Validator) {
        validator
            .require_text("name", &self.name)
            .require_text("review", &self.review)
            .require_rating("rating", self.rating)
            .require_iso_date("date", &self.date);
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![
            self.name.as_str().into(),
            self.review.as_str().into(),
            self.rating.into(),
            self.date.as_str().into(),
            self.role.as_str().into(),
        ]
    }

    fn from_row(row: &Row) -> Result<Self, DatabaseError> {
        Ok(Review {
            name: row.text("name")?,
            review: row.text("review")?,
            rating: row.integer("rating")?,
            date: row.text("date")?,
            role: row.text("role")?,
        })
    }

    fn into_view(self, id: i64) -> ReviewView {
        ReviewView {
            id,
            name: self.name,
            review: self.review,
            rating: self.rating,
            date: self.date,
            role: self.role,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn input(value: Value) -> ReviewInput {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn accepts_legacy_review_text() {
        let review = Review::from_input(input(json!({
            "name": "Ana",
            "review_text": "Lovely wheel class",
            "rating": 5,
            "date": "2024-03-02"
        })))
        .unwrap();
        assert_eq!(review.review, "Lovely wheel class");
        assert_eq!(review.role, "");
    }

    #[test]
    fn fractional_rating_reports_integer_message() {
        let err = Review::from_input(input(json!({
            "name": "Ana", "review": "ok", "rating": 3.5, "date": "2024-03-02"
        })))
        .unwrap_err();
        assert_eq!(err.field_errors["rating"], "Must be an integer");
    }

    #[test]
    fn out_of_range_ratings_are_rejected() {
        for rating in [0, 6] {
            let err = Review::from_input(input(json!({
                "name": "Ana", "review": "ok", "rating": rating, "date": "2024-03-02"
            })))
            .unwrap_err();
            assert!(err.has_field("rating"));
        }
    }

    #[test]
    fn date_must_be_iso() {
        let err = Review::from_input(input(json!({
            "name": "Ana", "review": "ok", "rating": 4, "date": "March 2nd"
        })))
        .unwrap_err();
        assert!(err.has_field("date"));
    }
}
