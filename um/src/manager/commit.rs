//! Cache write-back for successful responses

use crate::domain::{User, UserPage};
use crate::store::UserStore;

/// A successful response that knows how to record itself in the session cache
pub trait CacheCommit {
    fn commit(&self, store: &UserStore);
}

impl CacheCommit for User {
    fn commit(&self, store: &UserStore) {
        store.upsert(self.clone());
    }
}

impl CacheCommit for UserPage {
    fn commit(&self, store: &UserStore) {
        store.upsert_all(self.users.iter().cloned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_commit_upserts_every_user() {
        let store = UserStore::new();
        let page = UserPage {
            users: vec![User::new("a", "John"), User::new("b", "John")],
            next: String::new(),
        };

        page.commit(&store);
        assert_eq!(store.len(), 2);
        assert_eq!(store.users_with_nickname("John").len(), 2);
    }
}
