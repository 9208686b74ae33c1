//! Request/response bodies that are specific to the HTTP surface.
//!
//! Signup and login bodies are `quill_auth::NewAccount` / `LoginRequest`.

use serde::{Deserialize, Serialize};

use quill_auth::{ProfileUpdate, Role};

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
}

/// Self-service profile edit. Unknown fields (email, password, role, ...) are
/// ignored, so a client cannot smuggle privileged changes through here.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub profile_image: Option<String>,
}

impl From<UpdateUserRequest> for ProfileUpdate {
    fn from(req: UpdateUserRequest) -> Self {
        ProfileUpdate {
            name: req.name,
            username: req.username,
            profile_image: req.profile_image,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RoleChangeRequest {
    pub role: Role,
}

#[derive(Debug, Deserialize)]
pub struct CreateBlogEntryRequest {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateBlogEntryRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
}
