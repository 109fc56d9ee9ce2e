// handlers/public/auth/mod.rs - Token acquisition endpoints (no auth required)

pub mod login;    // POST /login
pub mod register; // POST /register

pub use login::login_post;
pub use register::register_post;
