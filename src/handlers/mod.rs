// handlers/mod.rs - Two-tier handler layout
//
// Public (no auth) → Protected (JWT auth)
pub mod public;
pub mod protected;
