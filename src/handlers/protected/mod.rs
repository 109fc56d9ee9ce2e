// handlers/protected/mod.rs - Protected handlers (JWT authentication required)
//
// Every route here sits behind `jwt_auth_middleware`; handlers take the
// resulting `AuthAccount` as an extractor.

pub mod auth;  // Account management
pub mod books; // Book catalog under /c/books

pub use auth::*;
