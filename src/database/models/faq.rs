use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::database::entity::{contains_markup, Entity, SqlValue};
use crate::database::manager::DatabaseError;
use crate::database::schema::{EntitySchema, FAQS};
use crate::database::store::Row;
use crate::validation::{ValidationError, Validator};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Faq {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Deserialize)]
pub struct FaqInput {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub answer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FaqView {
    pub id: i64,
    pub question: String,
    pub answer: String,
    #[serde(rename = "isHtml")]
    pub is_html: bool,
}

impl Entity for Faq {
    type Input = FaqInput;
    type View = FaqView;

    const SCHEMA: &'static EntitySchema = &FAQS;
    const LABEL: &'static str = "FAQ";
    const NOTIFIES: bool = true;

    fn from_input(input: FaqInput) -> Result<Self, ValidationError> {
        let faq = Faq {
            question: input.question,
            answer: input.answer,
        };
        faq.validate()?;
        Ok(faq)
    }

    fn check(&self, validator: &mut Validator) {
        validator
            .require_text("question", &self.question)
            .require_text("answer", &self.answer);
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![self.question.as_str().into(), self.answer.as_str().into()]
    }

    fn from_row(row: &Row) -> Result<Self, DatabaseError> {
        Ok(Faq {
            question: row.text("question")?,
            answer: row.text("answer")?,
        })
    }

    fn into_view(self, id: i64) -> FaqView {
        FaqView {
            id,
            is_html: contains_markup(&[&self.answer]),
            question: self.question,
            answer: self.answer,
        }
    }

    fn notification_fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert("question".into(), Value::String(self.question.clone()));
        fields.insert("answer".into(), Value::String(self.answer.clone()));
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_answers_are_flagged() {
        let faq = Faq { question: "Glaze?".into(), answer: "<p>Food safe</p>".into() };
        assert!(faq.into_view(1).is_html);

        let faq = Faq { question: "Kiln?".into(), answer: "Cone 6".into() };
        assert!(!faq.into_view(2).is_html);
    }

    #[test]
    fn question_alone_does_not_mark_html() {
        let faq = Faq { question: "Is 2 < 3?".into(), answer: "Yes".into() };
        assert!(!faq.into_view(1).is_html);
    }

    #[test]
    fn empty_answer_is_rejected() {
        let err = Faq::from_input(FaqInput { question: "Q".into(), answer: "".into() }).unwrap_err();
        assert!(err.has_field("answer"));
        assert!(!err.has_field("question"));
    }
}
