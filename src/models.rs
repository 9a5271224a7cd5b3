use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
pub struct LoginReqDto {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: u64,
    pub sub: String,
    /// Display name shown in the dashboard header
    pub name: String,
    pub role: u8, // role id
    pub exp: usize,
    pub jti: String,
}
