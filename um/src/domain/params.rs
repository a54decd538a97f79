//! Parameters for creating and updating users

use serde::Serialize;

/// Parameters for creating a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserCreationParams {
    pub user_id: String,
    pub nickname: String,
    pub profile_url: Option<String>,
}

impl UserCreationParams {
    pub fn new(user_id: impl Into<String>, nickname: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            nickname: nickname.into(),
            profile_url: None,
        }
    }

    pub fn with_profile_url(mut self, profile_url: impl Into<String>) -> Self {
        self.profile_url = Some(profile_url.into());
        self
    }
}

/// Parameters for updating a user
///
/// The user id travels in the request path, so only the optional fields are
/// part of the body and absent fields are left untouched upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserUpdateParams {
    #[serde(skip)]
    pub user_id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_url: Option<String>,
}

impl UserUpdateParams {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            nickname: None,
            profile_url: None,
        }
    }

    pub fn with_nickname(mut self, nickname: impl Into<String>) -> Self {
        self.nickname = Some(nickname.into());
        self
    }

    pub fn with_profile_url(mut self, profile_url: impl Into<String>) -> Self {
        self.profile_url = Some(profile_url.into());
        self
    }
}
