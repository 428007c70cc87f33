use serde::{Deserialize, Serialize};

use crate::models::user::User;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SearchUserPayload {
    pub keyword: String,
    pub exclude: Vec<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchUserResponse {
    pub users: Vec<User>,
}
