use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::repo_types::{NewUser, User};

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(rename = "mobile_no")]
    pub mobile: String,
}

#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    pub page: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponseData {
    pub data: UserResponse,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub mobile: String,
    pub status: String,
}

impl CreateUserRequest {
    pub fn into_model(self) -> NewUser {
        NewUser {
            user_id: self.user_id,
            mobile: self.mobile,
        }
    }
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            mobile: user.mobile,
            status: user.status.unwrap_or_default(),
        }
    }
}

impl From<User> for UserResponseData {
    fn from(user: User) -> Self {
        Self { data: user.into() }
    }
}
