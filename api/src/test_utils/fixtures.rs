//! Test fixtures
//!
//! Factory functions for creating test data with sensible defaults.

use crate::domain::entities::{Entry, Thread};
use crate::domain::ports::RepoScope;

/// Scope most tests operate under
pub fn test_scope() -> RepoScope {
    RepoScope::new("johndoe", "foobar", "master")
}

/// A thread under the test scope
pub fn test_thread() -> Thread {
    Thread::new("johndoe", "foobar", "my-first-post")
}

/// An entry ready to persist
pub fn test_entry(requires_moderation: bool) -> Entry {
    Entry {
        account: "johndoe".to_string(),
        repository: "foobar".to_string(),
        branch: "master".to_string(),
        path: "data/comments/entry-1.yml".to_string(),
        content: "_id: entry-1\nname: Jane\nmessage: Nice post!\n".to_string(),
        commit_message: "Add staticpost entry (my-first-post)".to_string(),
        requires_moderation,
        thread: test_thread(),
    }
}
