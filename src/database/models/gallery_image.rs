use serde::{Deserialize, Serialize};

use crate::database::entity::{Entity, SqlValue};
use crate::database::manager::DatabaseError;
use crate::database::schema::{EntitySchema, GALLERY_IMAGES};
use crate::database::store::Row;
use crate::media::DataUri;
use crate::validation::{ValidationError, Validator};

/// Gallery photo. Stored as raw bytes plus MIME type; clients see a data URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GalleryImage {
    pub filename: String,
    pub image: DataUri,
    pub title: String,
    pub alt: String,
}

#[derive(Debug, Deserialize)]
pub struct GalleryImageInput {
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub alt: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GalleryImageView {
    pub id: i64,
    pub filename: String,
    pub image: String,
    pub title: String,
    pub alt: String,
}

impl Entity for GalleryImage {
    type Input = GalleryImageInput;
    type View = GalleryImageView;

    const SCHEMA: &'static EntitySchema = &GALLERY_IMAGES;
    const LABEL: &'static str = "Gallery image";

    fn from_input(input: GalleryImageInput) -> Result<Self, ValidationError> {
        let mut validator = Validator::new();
        validator
            .require_text("filename", &input.filename)
            .require_image_data_uri("image", &input.image);
        validator.finish()?;

        let image = DataUri::parse_image(&input.image)
            .map_err(|e| ValidationError::field("image", e.to_string()))?;

        Ok(GalleryImage {
            filename: input.filename,
            image,
            title: input.title.unwrap_or_default(),
            alt: input.alt.unwrap_or_default(),
        })
    }

    fn check(&self, validator: &mut Validator) {
        validator.require_text("filename", &self.filename);
        if self.image.bytes.is_empty() || !self.image.mime_type.starts_with("image/") {
            validator.push(ValidationError::field("image", "Image must be non-empty image data"));
        }
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![
            self.filename.as_str().into(),
            SqlValue::Blob(self.image.bytes.clone()),
            self.image.mime_type.as_str().into(),
            self.title.as_str().into(),
            self.alt.as_str().into(),
        ]
    }

    fn from_row(row: &Row) -> Result<Self, DatabaseError> {
        Ok(GalleryImage {
            filename: row.text("filename")?,
            image: DataUri::new(
                row.text("mime_type")?,
                row.blob("image_data")?,
            ),
            title: row.text("title")?,
            alt: row.text("alt")?,
        })
    }

    fn into_view(self, id: i64) -> GalleryImageView {
        GalleryImageView {
            id,
            image: self.image.to_uri(),
            filename: self.filename,
            title: self.title,
            alt: self.alt,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_is_decoded_to_bytes() {
        let image = GalleryImage::from_input(GalleryImageInput {
            filename: "bowl.gif".into(),
            image: "data:image/gif;base64,R0lGODlh".into(),
            title: None,
            alt: Some("A bowl".into()),
        })
        .unwrap();
        assert_eq!(image.image.mime_type, "image/gif");
        assert_eq!(image.image.bytes, b"GIF89a");
        assert_eq!(image.title, "");

        let view = image.into_view(9);
        assert_eq!(view.image, "data:image/gif;base64,R0lGODlh");
    }

    #[test]
    fn missing_filename_and_image() {
        let err = GalleryImage::from_input(GalleryImageInput {
            filename: String::new(),
            image: String::new(),
            title: None,
            alt: None,
        })
        .unwrap_err();
        assert!(err.has_field("filename"));
        assert!(err.has_field("image"));
    }
}
