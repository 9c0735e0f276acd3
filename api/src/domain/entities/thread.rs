//! Thread domain entity

use serde::{Deserialize, Serialize};

/// A logical discussion: every entry sharing a parent identifier under one
/// account/repository, and the subscribers listening to it. Threads are
/// never persisted on their own - the composite key is what matters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Thread {
    pub account: String,
    pub repository: String,
    /// Parent identifier the entries hang off, e.g. a post slug.
    pub entry_id: String,
}

impl Thread {
    pub fn new(account: &str, repository: &str, entry_id: &str) -> Self {
        Self {
            account: account.to_string(),
            repository: repository.to_string(),
            entry_id: entry_id.to_string(),
        }
    }
}

impl std::fmt::Display for Thread {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}#{}", self.account, self.repository, self.entry_id)
    }
}
