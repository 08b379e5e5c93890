use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::database::entity::{Entity, SqlValue};
use crate::database::manager::DatabaseError;
use crate::database::schema::{EntitySchema, CLASSES};
use crate::database::store::Row;
use crate::validation::{json_flag, ValidationError, Validator};

/// A class or workshop listing. `image` is kept as its data URI text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Class {
    pub name: String,
    pub description: String,
    pub image: String,
    pub url: String,
    pub is_active: i64,
}

#[derive(Debug, Deserialize)]
pub struct ClassInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub url: String,
    #[serde(default, rename = "isActive", alias = "is_active")]
    pub is_active: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClassView {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub image: String,
    pub url: String,
    #[serde(rename = "isActive")]
    pub is_active: bool,
}

impl Entity for Class {
    type Input = ClassInput;
    type View = ClassView;

    const SCHEMA: &'static EntitySchema = &CLASSES;
    const LABEL: &'static str = "Class";

    fn from_input(input: ClassInput) -> Result<Self, ValidationError> {
        let mut validator = Validator::new();

        // Required on every write; dashboards always send the toggle state
        let is_active = json_flag("isActive", input.is_active.as_ref()).unwrap_or_else(|e| {
            validator.push(e);
            0
        });

        let class = Class {
            name: input.name,
            description: input.description,
            image: input.image.trim().to_string(),
            url: input.url,
            is_active,
        };
        class.check(&mut validator);
        validator.finish()?;
        Ok(class)
    }

    fn check(&self, validator: &mut Validator) {
        validator
            .require_text("name", &self.name)
            .require_text("description", &self.description)
            .require_image_data_uri("image", &self.image)
            .require_text("url", &self.url)
            .require_flag("isActive", self.is_active);
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![
            self.name.as_str().into(),
            self.description.as_str().into(),
            self.image.as_str().into(),
            self.url.as_str().into(),
            self.is_active.into(),
        ]
    }

    fn from_row(row: &Row) -> Result<Self, DatabaseError> {
        Ok(Class {
            name: row.text("name")?,
            description: row.text("description")?,
            image: row.text("image")?,
            url: row.text("url")?,
            is_active: row.integer("is_active")?,
        })
    }

    fn into_view(self, id: i64) -> ClassView {
        ClassView {
            id,
            name: self.name,
            description: self.description,
            image: self.image,
            url: self.url,
            is_active: self.is_active != 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const PNG: &str = "data:image/png;base64,iVBORw0KGgo=";

    fn input(value: Value) -> ClassInput {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn boolean_and_bit_flags() {
        let base = json!({"name": "Wheel", "description": "Intro", "image": PNG, "url": "https://book.example/wheel"});

        let mut v = base.clone();
        v["isActive"] = json!(false);
        assert_eq!(Class::from_input(input(v)).unwrap().is_active, 0);

        let mut v = base.clone();
        v["isActive"] = json!(1);
        assert!(Class::from_input(input(v)).unwrap().into_view(1).is_active);

        let mut v = base;
        v["isActive"] = json!(2);
        assert!(Class::from_input(input(v)).unwrap_err().has_field("isActive"));
    }

    #[test]
    fn missing_flag_is_rejected() {
        let base = json!({"name": "Wheel", "description": "Intro", "image": PNG, "url": "https://book.example/wheel"});
        let err = Class::from_input(input(base.clone())).unwrap_err();
        assert!(err.has_field("isActive"));

        let mut v = base;
        v["isActive"] = Value::Null;
        assert!(Class::from_input(input(v)).unwrap_err().has_field("isActive"));
    }

    #[test]
    fn image_must_be_data_uri() {
        let err = Class::from_input(input(json!({
            "name": "Wheel", "description": "Intro", "image": "/img/wheel.png", "url": "u", "isActive": true
        })))
        .unwrap_err();
        assert!(err.has_field("image"));
    }

    #[test]
    fn repository_check_catches_bad_flag() {
        let class = Class {
            name: "n".into(),
            description: "d".into(),
            image: PNG.into(),
            url: "u".into(),
            is_active: 7,
        };
        assert!(class.validate().unwrap_err().has_field("isActive"));
    }
}
