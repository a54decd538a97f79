//! Application credentials

use std::fmt;

/// Identity of an application session: which application, and the token
/// used to authenticate against it
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub application_id: String,
    pub api_token: String,
}

impl Credentials {
    pub fn new(application_id: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            application_id: application_id.into(),
            api_token: api_token.into(),
        }
    }
}

// Keep the token out of logs
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("application_id", &self.application_id)
            .field("api_token", &"<redacted>")
            .finish()
    }
}
