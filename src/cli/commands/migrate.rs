use serde_json::json;

use crate::cli::{utils, OutputFormat};
use crate::database::migrate;

pub async fn handle(output_format: OutputFormat) -> anyhow::Result<()> {
    let db = utils::connect().await?;
    let report = migrate::ensure_schema(db.store()).await;
    db.close().await;
    let report = report?;

    if output_format == OutputFormat::Text {
        if let Some(gallery) = &report.gallery {
            println!(
                "Gallery: {} rows converted to binary storage, {} skipped {:?}",
                gallery.converted,
                gallery.skipped.len(),
                gallery.skipped
            );
        }
        if let Some(reviews) = &report.reviews {
            println!(
                "Reviews: review_text renamed: {}, role added: {}",
                reviews.renamed_review_text, reviews.added_role
            );
        }
    }

    utils::output_success(
        output_format,
        &format!("Schema ready ({})", report.tables.join(", ")),
        Some(json!(report)),
    )
}
