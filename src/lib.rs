pub mod app;
pub mod auth;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod media;
pub mod middleware;
pub mod notify;
pub mod state;
pub mod telemetry;
pub mod validation;

pub use app::app;
pub use state::AppState;
