// Write gallery images out as static files plus a manifest
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;
use tracing::{info, warn};

use crate::database::models::GalleryImage;
use crate::database::Stored;

pub const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    pub id: i64,
    pub title: String,
    pub filename: String,
    pub mime_type: String,
    pub alt_text: String,
}

/// Lowercase, every run of non `[a-z0-9]` becomes one `-`, no leading or trailing `-`.
pub fn sanitize_title(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    for c in title.to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            out.push(c);
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }
    out.trim_matches('-').to_string()
}

/// `<sanitized title>-<id>.<ext>`; the title falls back to the filename stem, then `image-<id>`.
pub fn extracted_filename(id: i64, image: &GalleryImage) -> String {
    let stem = Path::new(&image.filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();

    let base = [image.title.as_str(), stem]
        .into_iter()
        .map(sanitize_title)
        .find(|s| !s.is_empty())
        .unwrap_or_else(|| format!("image-{}", id));

    format!("{}-{}.{}", base, id, image.image.extension())
}

/// Write every image into `out_dir` and a `manifest.json` describing them.
///
/// A file that cannot be written is logged and left out of the manifest.
pub fn extract_gallery(images: &[Stored<GalleryImage>], out_dir: &Path) -> io::Result<Vec<ManifestEntry>> {
    fs::create_dir_all(out_dir)?;

    let mut manifest = Vec::with_capacity(images.len());
    for stored in images {
        let image = &stored.entity;
        let filename = extracted_filename(stored.id, image);

        if let Err(e) = fs::write(out_dir.join(&filename), &image.image.bytes) {
            warn!("Failed to extract image {}: {}", stored.id, e);
            continue;
        }
        info!("Extracted {} ({} bytes)", filename, image.image.bytes.len());

        manifest.push(ManifestEntry {
            id: stored.id,
            title: image.title.clone(),
            filename,
            mime_type: image.image.mime_type.clone(),
            alt_text: image.alt.clone(),
        });
    }

    let json = serde_json::to_vec_pretty(&manifest).map_err(io::Error::other)?;
    fs::write(out_dir.join(MANIFEST_FILE), json)?;
    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::DataUri;

    fn image(filename: &str, title: &str, mime: &str) -> GalleryImage {
        GalleryImage {
            filename: filename.into(),
            image: DataUri::new(mime, vec![1, 2, 3]),
            title: title.into(),
            alt: "alt".into(),
        }
    }

    #[test]
    fn sanitizes_titles() {
        assert_eq!(sanitize_title("  Blue Glaze -- Mug! "), "blue-glaze-mug");
        assert_eq!(sanitize_title("Café Bowl"), "caf-bowl");
        assert_eq!(sanitize_title("***"), "");
    }

    #[test]
    fn filename_fallbacks() {
        assert_eq!(extracted_filename(4, &image("x.png", "Spring Vase", "image/png")), "spring-vase-4.png");
        assert_eq!(extracted_filename(5, &image("Kiln Day.jpeg", "", "image/jpeg")), "kiln-day-5.jpg");
        assert_eq!(extracted_filename(6, &image("", "", "image/webp")), "image-6-6.webp");
    }

    #[test]
    fn writes_files_and_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let images = vec![Stored { id: 2, entity: image("a.gif", "Plate", "image/gif") }];

        let manifest = extract_gallery(&images, dir.path()).unwrap();
        assert_eq!(manifest[0].filename, "plate-2.gif");
        assert_eq!(fs::read(dir.path().join("plate-2.gif")).unwrap(), vec![1, 2, 3]);

        let written: Vec<ManifestEntry> =
            serde_json::from_slice(&fs::read(dir.path().join(MANIFEST_FILE)).unwrap()).unwrap();
        assert_eq!(written, manifest);
        assert_eq!(written[0].alt_text, "alt");
    }
}
