use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Row of `Account`, with `account_id`/`account_role` aliased to `id`/`role`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Account {
    pub id: i32,
    pub firstname: String,
    pub lastname: String,
    pub username: String,
    pub email: String,
    pub phone: String,
    pub role: i32,
}

/// Validated registration input
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub firstname: String,
    pub lastname: String,
    pub username: String,
    pub email: String,
    pub phone: String,
    pub role: i32,
}
