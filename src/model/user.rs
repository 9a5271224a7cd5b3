use serde::{Deserialize, Serialize};

/// Admin dashboard account.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: u64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub name: String,
    pub role_id: u8,
}
