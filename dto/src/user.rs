use serde::{Deserialize, Serialize};

use crate::role::Role;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub email: String,
    pub role: Role,
}

#[derive(Clone, Serialize)]
pub struct CredentialsDto {
    pub email: String,
    pub password: String,
}

/// Response of a successful login
#[derive(Debug, Clone, Deserialize)]
pub struct AuthTokenDto {
    pub token: String,
    pub user: Option<UserDto>,
}

/// Response of a token verification
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyDto {
    pub user: UserDto,
}
