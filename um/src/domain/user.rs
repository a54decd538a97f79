//! User entity and list page

use serde::{Deserialize, Serialize};

use crate::store::Entity;

/// A user as known to the remote API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub user_id: String,

    #[serde(default)]
    pub nickname: Option<String>,

    #[serde(default)]
    pub profile_url: Option<String>,
}

impl User {
    pub fn new(user_id: impl Into<String>, nickname: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            nickname: Some(nickname.into()),
            profile_url: None,
        }
    }

    /// True if the nickname equals `nickname` exactly
    pub fn has_nickname(&self, nickname: &str) -> bool {
        self.nickname.as_deref() == Some(nickname)
    }
}

impl Entity for User {
    fn id(&self) -> &str {
        &self.user_id
    }
}

/// One page of the user list endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPage {
    pub users: Vec<User>,

    /// Continuation token; empty when there are no more pages
    #[serde(default)]
    pub next: String,
}

impl UserPage {
    pub fn has_next(&self) -> bool {
        !self.next.is_empty()
    }
}
