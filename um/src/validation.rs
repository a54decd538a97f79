//! Parameter validation
//!
//! Field-level checks run before any request reaches the admission queue.

use tracing::debug;

use crate::config::ValidationConfig;
use crate::domain::{UserCreationParams, UserUpdateParams};
use crate::error::ManagerError;

fn invalid(reason: impl Into<String>) -> ManagerError {
    ManagerError::ValidationFailed(reason.into())
}

/// Validates user parameters against configured limits
#[derive(Debug, Clone, Default)]
pub struct Validator {
    config: ValidationConfig,
}

impl Validator {
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    pub fn user_id(&self, user_id: &str) -> Result<(), ManagerError> {
        if user_id.trim().is_empty() {
            return Err(invalid("user_id is empty"));
        }
        if user_id.chars().count() > self.config.max_user_id_len {
            return Err(invalid("user_id is too long"));
        }
        Ok(())
    }

    pub fn nickname(&self, nickname: Option<&str>, required: bool) -> Result<(), ManagerError> {
        match nickname {
            None if required => Err(invalid("nickname is empty")),
            None => Ok(()),
            Some(nickname) if required && nickname.trim().is_empty() => Err(invalid("nickname is empty")),
            Some(nickname) if nickname.chars().count() > self.config.max_nickname_len => {
                Err(invalid("nickname is too long"))
            }
            Some(_) => Ok(()),
        }
    }

    pub fn profile_url(&self, profile_url: Option<&str>) -> Result<(), ManagerError> {
        match profile_url {
            Some(url) if url.chars().count() > self.config.max_profile_url_len => {
                Err(invalid("profile_url is too long"))
            }
            _ => Ok(()),
        }
    }

    pub fn creation(&self, params: &UserCreationParams) -> Result<(), ManagerError> {
        debug!(user_id = %params.user_id, "Validator::creation: called");
        self.user_id(&params.user_id)?;
        self.nickname(Some(&params.nickname), true)?;
        self.profile_url(params.profile_url.as_deref())
    }

    pub fn update(&self, params: &UserUpdateParams) -> Result<(), ManagerError> {
        debug!(user_id = %params.user_id, "Validator::update: called");
        self.user_id(&params.user_id)?;
        self.nickname(params.nickname.as_deref(), false)?;
        self.profile_url(params.profile_url.as_deref())
    }

    /// Batch size only; each entry is validated when it is fanned out
    pub fn batch(&self, requested: usize) -> Result<(), ManagerError> {
        if requested > self.config.max_batch_size {
            debug!(requested, limit = self.config.max_batch_size, "Validator::batch: too many");
            return Err(ManagerError::BatchLimitExceeded {
                limit: self.config.max_batch_size,
                requested,
            });
        }
        Ok(())
    }
}
