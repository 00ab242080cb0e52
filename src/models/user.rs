//! Session identity types

use serde::{Deserialize, Serialize};

use super::enums::Role;

/// Credentials exchanged for a bearer token
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoginResponse {
    pub token: String,
}

/// Identity of the signed-in user, from `GET /api/me`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
    pub role: Role,
}
