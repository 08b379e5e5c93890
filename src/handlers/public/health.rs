use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET / - service description
pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Studio API",
            "version": version,
            "description": "Content API for the studio website",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "auth": "/auth/login, /auth/callback, /auth/logout (public - session acquisition)",
                "session": "/api/auth/session (protected)",
                "faqs": "/api/faqs (GET public, POST/PUT/DELETE protected)",
                "banners": "/api/banners (GET public, POST/PUT/DELETE protected)",
                "reviews": "/api/reviews (GET public, POST/PUT/DELETE protected)",
                "classes": "/api/classes (GET public, POST/PUT/DELETE protected)",
                "gallery_images": "/api/gallery_images (GET public, POST/PUT/DELETE protected)",
            }
        }
    }))
}

/// GET /health - database ping plus webhook delivery counters
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();
    let webhook = state.notifier.stats();

    match state.db.health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok",
                    "webhook": webhook
                }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": true,
                    "message": "Database unavailable",
                    "code": "SERVICE_UNAVAILABLE",
                    "data": {
                        "status": "degraded",
                        "timestamp": now,
                        "database": "unavailable",
                        "webhook": webhook
                    }
                })),
            )
        }
    }
}
