//! Scoped cache for entities known to the current session
//!
//! A thread-safe identifier-to-entity map. Every read observes the most
//! recent completed write; writes are serialized behind a single exclusive
//! lock so concurrent upserts of different identifiers never lose updates.

mod cache;

pub use cache::{Entity, ScopedCache};

use crate::domain::User;

/// The user cache held by a session
pub type UserStore = ScopedCache<User>;

impl ScopedCache<User> {
    /// All cached users whose nickname equals `nickname`
    pub fn users_with_nickname(&self, nickname: &str) -> Vec<User> {
        self.filter(|user| user.has_nickname(nickname))
    }
}
