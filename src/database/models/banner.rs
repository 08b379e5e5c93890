use serde::{Deserialize, Serialize};

use crate::database::entity::{contains_markup, Entity, SqlValue};
use crate::database::manager::DatabaseError;
use crate::database::schema::{EntitySchema, BANNERS};
use crate::database::store::Row;
use crate::validation::{ValidationError, Validator};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub title: String,
    pub subtitle: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct BannerInput {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BannerView {
    pub id: i64,
    pub title: String,
    pub subtitle: String,
    pub message: String,
    #[serde(rename = "isHtml")]
    pub is_html: bool,
}

impl Entity for Banner {
    type Input = BannerInput;
    type View = BannerView;

    const SCHEMA: &'static EntitySchema = &BANNERS;
    const LABEL: &'static str = "Banner";

    fn from_input(input: BannerInput) -> Result<Self, ValidationError> {
        let banner = Banner {
            title: input.title,
            subtitle: input.subtitle,
            message: input.message,
        };
        banner.validate()?;
        Ok(banner)
    }

    fn check(&self, validator: &mut Validator) {
        validator
            .require_text("title", &self.title)
            .require_text("subtitle", &self.subtitle)
            .require_text("message", &self.message);
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![
            self.title.as_str().into(),
            self.subtitle.as_str().into(),
            self.message.as_str().into(),
        ]
    }

    fn from_row(row: &Row) -> Result<Self, DatabaseError> {
        Ok(Banner {
            title: row.text("title")?,
            subtitle: row.text("subtitle")?,
            message: row.text("message")?,
        })
    }

    fn into_view(self, id: i64) -> BannerView {
        BannerView {
            id,
            is_html: contains_markup(&[&self.title, &self.subtitle, &self.message]),
            title: self.title,
            subtitle: self.subtitle,
            message: self.message,
        }
    }
}
