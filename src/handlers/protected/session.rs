use axum::Extension;

use crate::auth::SessionUser;
use crate::middleware::{ApiResponse, ApiResult};

/// GET /api/auth/session - who the current session belongs to
///
/// ```json
/// { "success": true, "data": { "id": 1, "email": "owner@example.com", "name": "Owner", "expires_at": 1735689600 } }
/// ```
pub async fn session(Extension(session): Extension<SessionUser>) -> ApiResult<SessionUser> {
    Ok(ApiResponse::success(session))
}
