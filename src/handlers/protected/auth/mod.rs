// handlers/protected/auth/mod.rs - Account management for authenticated callers

pub mod change_password; // PATCH /change-password

pub use change_password::change_password_patch;
