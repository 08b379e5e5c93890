// handlers/mod.rs - Two-tier handler layout
//
// Public (no session) → Protected (session middleware). Content resources are
// split across both: GET is public, writes are protected.

pub mod protected;
pub mod public;
