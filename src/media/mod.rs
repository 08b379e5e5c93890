pub mod data_uri;
pub mod extract;

pub use data_uri::{extension_for_mime, DataUri, DataUriError};
pub use extract::{extract_gallery, sanitize_title, ManifestEntry};
