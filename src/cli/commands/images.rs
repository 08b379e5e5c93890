use anyhow::Context;
use serde_json::json;
use std::path::Path;

use crate::cli::{utils, OutputFormat};
use crate::database::models::GalleryImage;
use crate::database::Repository;
use crate::media::extract_gallery;

pub async fn handle(out: &Path, output_format: OutputFormat) -> anyhow::Result<()> {
    let db = utils::connect().await?;
    let images = Repository::<GalleryImage>::new(db.store().clone()).list_all().await;
    db.close().await;
    let images = images.context("failed to read gallery images")?;

    if images.is_empty() {
        return utils::output_success(output_format, "No gallery images found", None);
    }

    let manifest = extract_gallery(&images, out)
        .with_context(|| format!("failed to write images to {}", out.display()))?;

    utils::output_success(
        output_format,
        &format!("Extracted {} of {} images to {}", manifest.len(), images.len(), out.display()),
        Some(json!({ "manifest": manifest })),
    )
}
