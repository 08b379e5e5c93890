// handlers/protected/mod.rs - Protected handlers (session required)
//
// Every route here sits behind middleware::require_session, which rejects
// missing or invalid sessions with 401 JSON and injects SessionUser.

pub mod content;
pub mod session;

pub use content::{create, delete, update};
pub use session::session;
