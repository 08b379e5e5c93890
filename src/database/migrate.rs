//! Schema bootstrap.
//!
//! Kept apart from connecting so that it runs exactly once per process start
//! (server startup or `studio migrate`) instead of on every pool checkout.
//! Every statement is idempotent.

use serde::Serialize;
use tracing::{info, warn};

use crate::database::manager::DatabaseError;
use crate::database::schema::{self, EntitySchema, GALLERY_IMAGES, REVIEWS};
use crate::database::store::Store;
use crate::media::DataUri;

const SCHEMA_VERSIONS_DDL: &str = "CREATE TABLE IF NOT EXISTS schema_versions (\
    table_name TEXT PRIMARY KEY, \
    version INTEGER NOT NULL, \
    applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP)";

const LEGACY_GALLERY_TABLE: &str = "gallery_images_legacy";

#[derive(Debug, Default, Serialize)]
pub struct SchemaReport {
    pub tables: Vec<&'static str>,
    pub gallery: Option<GalleryConversion>,
    pub reviews: Option<ReviewsUpgrade>,
}

#[derive(Debug, Default, Serialize)]
pub struct GalleryConversion {
    pub converted: usize,
    pub skipped: Vec<i64>,
}

#[derive(Debug, Default, Serialize)]
pub struct ReviewsUpgrade {
    pub renamed_review_text: bool,
    pub added_role: bool,
}

/// Create every table that does not exist yet and record its version.
///
/// A version is only recorded once the table on disk carries every column the
/// current layout needs.
pub async fn ensure_schema(store: &Store) -> Result<SchemaReport, DatabaseError> {
    store.execute(SCHEMA_VERSIONS_DDL, vec![]).await?;

    let mut report = SchemaReport {
        gallery: convert_legacy_gallery(store).await?,
        reviews: upgrade_legacy_reviews(store).await?,
        ..Default::default()
    };

    for entity_schema in schema::ALL {
        store.execute(&entity_schema.create_table_sql(), vec![]).await?;
        verify_layout(store, entity_schema).await?;
        record_version(store, entity_schema).await?;
        report.tables.push(entity_schema.table);
    }

    info!("Schema ready: {} tables", report.tables.len());
    Ok(report)
}

async fn record_version(store: &Store, entity_schema: &EntitySchema) -> Result<(), DatabaseError> {
    store
        .execute(
            "INSERT INTO schema_versions (table_name, version) VALUES (?, ?) \
             ON CONFLICT(table_name) DO UPDATE SET version = excluded.version, applied_at = CURRENT_TIMESTAMP \
             WHERE schema_versions.version <> excluded.version",
            vec![entity_schema.table.into(), entity_schema.version.into()],
        )
        .await?;
    Ok(())
}

pub async fn recorded_version(store: &Store, table: &str) -> Result<Option<i64>, DatabaseError> {
    store
        .fetch_optional("SELECT version FROM schema_versions WHERE table_name = ?", vec![table.into()])
        .await?
        .map(|row| row.integer("version"))
        .transpose()
}

async fn table_columns(store: &Store, table: &str) -> Result<Vec<String>, DatabaseError> {
    store
        .fetch_all(&format!("PRAGMA table_info({})", table), vec![])
        .await?
        .iter()
        .map(|row| row.text("name"))
        .collect()
}

async fn verify_layout(store: &Store, entity_schema: &EntitySchema) -> Result<(), DatabaseError> {
    let columns = table_columns(store, entity_schema.table).await?;
    let missing: Vec<_> = entity_schema
        .column_names()
        .filter(|name| !columns.iter().any(|c| c == name))
        .collect();
    if missing.is_empty() {
        return Ok(());
    }
    Err(DatabaseError::Legacy(format!(
        "{} is missing column(s) {}; version {} not recorded",
        entity_schema.table,
        missing.join(", "),
        entity_schema.version
    )))
}

/// Bring an older `reviews` table up to the current layout in place.
///
/// Older deployments stored the body in `review_text` and had no `role`.
async fn upgrade_legacy_reviews(store: &Store) -> Result<Option<ReviewsUpgrade>, DatabaseError> {
    let columns = table_columns(store, REVIEWS.table).await?;
    if columns.is_empty() {
        return Ok(None);
    }

    let has = |name: &str| columns.iter().any(|c| c == name);
    let upgrade = ReviewsUpgrade {
        renamed_review_text: has("review_text") && !has("review"),
        added_role: !has("role"),
    };
    if !upgrade.renamed_review_text && !upgrade.added_role {
        return Ok(None);
    }

    info!("Upgrading {} to version {}", REVIEWS.table, REVIEWS.version);
    let mut tx = store.begin().await?;
    if upgrade.renamed_review_text {
        tx.execute(
            &format!("ALTER TABLE {} RENAME COLUMN review_text TO review", REVIEWS.table),
            vec![],
        )
        .await?;
    }
    if upgrade.added_role {
        tx.execute(
            &format!("ALTER TABLE {} ADD COLUMN role TEXT NOT NULL DEFAULT ''", REVIEWS.table),
            vec![],
        )
        .await?;
    }
    tx.commit().await?;

    Ok(Some(upgrade))
}

/// Move a text-column gallery table (data URI in `image`) to binary storage.
///
/// Only runs when `gallery_images` still has the old layout, so it happens at
/// most once. Ids are preserved; rows whose image does not decode are left in
/// the legacy table and reported.
async fn convert_legacy_gallery(store: &Store) -> Result<Option<GalleryConversion>, DatabaseError> {
    let columns = table_columns(store, GALLERY_IMAGES.table).await?;
    let is_legacy = columns.iter().any(|c| c == "image") && !columns.iter().any(|c| c == "image_data");
    if !is_legacy {
        return Ok(None);
    }

    if !table_columns(store, LEGACY_GALLERY_TABLE).await?.is_empty() {
        return Err(DatabaseError::Legacy(format!(
            "both {} and a text-layout {} exist; resolve manually",
            LEGACY_GALLERY_TABLE, GALLERY_IMAGES.table
        )));
    }

    info!("Converting {} to binary image storage", GALLERY_IMAGES.table);
    let has_title = columns.iter().any(|c| c == "title");
    let has_alt = columns.iter().any(|c| c == "alt");

    let mut tx = store.begin().await?;
    tx.execute(
        &format!("ALTER TABLE {} RENAME TO {}", GALLERY_IMAGES.table, LEGACY_GALLERY_TABLE),
        vec![],
    )
    .await?;
    tx.execute(&GALLERY_IMAGES.create_table_sql(), vec![]).await?;

    let rows = tx
        .fetch_all(
            &format!(
                "SELECT id, filename, image, {}, {} FROM {} ORDER BY id ASC",
                if has_title { "title" } else { "'' AS title" },
                if has_alt { "alt" } else { "'' AS alt" },
                LEGACY_GALLERY_TABLE
            ),
            vec![],
        )
        .await?;

    let insert = format!(
        "INSERT INTO {} (id, filename, image_data, mime_type, title, alt) VALUES (?, ?, ?, ?, ?, ?)",
        GALLERY_IMAGES.table
    );

    let mut conversion = GalleryConversion::default();
    for row in &rows {
        let id = row.integer("id")?;
        let uri = row.optional_text("image")?;
        let decoded = uri.as_deref().map(DataUri::parse_image);

        let image = match decoded {
            Some(Ok(image)) => image,
            Some(Err(e)) => {
                warn!("Skipping gallery image {}: {}", id, e);
                conversion.skipped.push(id);
                continue;
            }
            None => {
                warn!("Skipping gallery image {}: no image data", id);
                conversion.skipped.push(id);
                continue;
            }
        };

        tx.execute(
            &insert,
            vec![
                id.into(),
                row.optional_text("filename")?.unwrap_or_default().into(),
                image.bytes.into(),
                image.mime_type.into(),
                row.optional_text("title")?.unwrap_or_default().into(),
                row.optional_text("alt")?.unwrap_or_default().into(),
            ],
        )
        .await?;
        conversion.converted += 1;
    }

    tx.commit().await?;
    info!(
        "Gallery conversion finished: {} converted, {} skipped",
        conversion.converted,
        conversion.skipped.len()
    );
    Ok(Some(conversion))
}
