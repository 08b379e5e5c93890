// handlers/public/content.rs - GET /api/{resource}
//
// Listing is public: the marketing pages render this content for anonymous
// visitors. Writes live in handlers/protected/content.rs.

use axum::extract::State;

use crate::database::{Entity, Repository, Stored};
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// GET /api/{resource} - every record, oldest first
pub async fn list<E: Entity>(State(state): State<AppState>) -> ApiResult<Vec<E::View>> {
    let records = Repository::<E>::new(state.store().clone()).list_all().await?;
    tracing::debug!("Listed {} {} records", records.len(), E::SCHEMA.table);
    Ok(ApiResponse::success(records.into_iter().map(Stored::into_view).collect()))
}
