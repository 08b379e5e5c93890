// handlers/protected/content.rs - POST/PUT/DELETE /api/{resource}
//
// The record id travels in the JSON body for PUT and DELETE, not the path.

use axum::{extract::State, Extension};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::auth::SessionUser;
use crate::database::{Entity, Repository};
use crate::middleware::{ApiJson, ApiResponse, ApiResult};
use crate::notify::{Action, WebhookEvent};
use crate::state::AppState;
use crate::validation::json_id;

#[derive(Debug, Deserialize)]
pub struct UpdateRequest<I> {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(flatten)]
    pub fields: I,
}

#[derive(Debug, Deserialize)]
pub struct DeleteRequest {
    #[serde(default)]
    pub id: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct Deleted {
    pub id: i64,
    pub deleted: bool,
}

/// POST /api/{resource} - 201 with the stored record
pub async fn create<E: Entity>(
    State(state): State<AppState>,
    Extension(session): Extension<SessionUser>,
    ApiJson(input): ApiJson<E::Input>,
) -> ApiResult<E::View> {
    let entity = E::from_input(input)?;
    let id = Repository::<E>::new(state.store().clone()).create(&entity).await?;

    tracing::info!(user = %session.email, "Created {} {}", E::LABEL, id);
    if E::NOTIFIES {
        state
            .notifier
            .publish(WebhookEvent::new(id, Action::Create, entity.notification_fields()));
    }

    Ok(ApiResponse::created(entity.into_view(id)))
}

/// PUT /api/{resource} - body carries `id` plus the full field set
pub async fn update<E: Entity>(
    State(state): State<AppState>,
    Extension(session): Extension<SessionUser>,
    ApiJson(request): ApiJson<UpdateRequest<E::Input>>,
) -> ApiResult<E::View> {
    let id = json_id(request.id.as_ref())?;
    let entity = E::from_input(request.fields)?;
    let stored = Repository::<E>::new(state.store().clone()).update(id, &entity).await?;

    tracing::info!(user = %session.email, "Updated {} {}", E::LABEL, id);
    if E::NOTIFIES {
        state
            .notifier
            .publish(WebhookEvent::new(id, Action::Update, stored.entity.notification_fields()));
    }

    Ok(ApiResponse::success(stored.into_view()))
}

/// DELETE /api/{resource} - body `{id}`; unknown ids are 404
pub async fn delete<E: Entity>(
    State(state): State<AppState>,
    Extension(session): Extension<SessionUser>,
    ApiJson(request): ApiJson<DeleteRequest>,
) -> ApiResult<Deleted> {
    let id = json_id(request.id.as_ref())?;
    Repository::<E>::new(state.store().clone()).delete(id).await?;

    tracing::info!(user = %session.email, "Deleted {} {}", E::LABEL, id);
    if E::NOTIFIES {
        state.notifier.publish(WebhookEvent::deleted(id));
    }

    Ok(ApiResponse::success(Deleted { id, deleted: true }))
}
