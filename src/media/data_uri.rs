use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::fmt;
use thiserror::Error;

const IMAGE_PREFIX: &str = "data:image/";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DataUriError {
    #[error("Image must be a valid base64-encoded image (data:image/*;base64,...)")]
    NotAnImage,

    #[error("Image data URI must use base64 encoding")]
    NotBase64,

    #[error("Image payload is not valid base64: {0}")]
    BadPayload(String),

    #[error("Image payload is empty")]
    Empty,
}

/// Decoded `data:` URI: MIME type plus raw bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct DataUri {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl DataUri {
    pub fn new(mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self { mime_type: mime_type.into(), bytes }
    }

    /// Parse `data:image/<subtype>[;params];base64,<payload>`.
    pub fn parse_image(uri: &str) -> Result<Self, DataUriError> {
        let uri = uri.trim();
        if !uri.starts_with(IMAGE_PREFIX) {
            return Err(DataUriError::NotAnImage);
        }

        let (header, payload) = uri["data:".len()..]
            .split_once(',')
            .ok_or(DataUriError::NotAnImage)?;

        let mut parts = header.split(';');
        let mime_type = parts.next().unwrap_or_default().trim().to_ascii_lowercase();
        if mime_type.len() <= "image/".len() {
            return Err(DataUriError::NotAnImage);
        }
        if !parts.any(|p| p.trim().eq_ignore_ascii_case("base64")) {
            return Err(DataUriError::NotBase64);
        }

        let bytes = STANDARD
            .decode(payload.trim())
            .map_err(|e| DataUriError::BadPayload(e.to_string()))?;
        if bytes.is_empty() {
            return Err(DataUriError::Empty);
        }

        Ok(Self { mime_type, bytes })
    }

    pub fn to_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.bytes))
    }

    /// File extension for extraction; jpg when the type is unrecognised.
    pub fn extension(&self) -> &'static str {
        extension_for_mime(&self.mime_type)
    }
}

pub fn extension_for_mime(mime_type: &str) -> &'static str {
    let mime = mime_type.to_ascii_lowercase();
    if mime.contains("png") {
        "png"
    } else if mime.contains("gif") {
        "gif"
    } else if mime.contains("webp") {
        "webp"
    } else if mime.contains("svg") {
        "svg"
    } else {
        "jpg"
    }
}

// Payloads can be megabytes; never dump them into logs
impl fmt::Debug for DataUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataUri")
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}
