// handlers/public/mod.rs - Public handlers (no session required)
//
// Service info, health, the browser sign-in flow and content listing.

pub mod auth;
pub mod content;
pub mod health;

pub use content::list;
pub use health::{health, root};
