//! Entry domain entity
//!
//! An entry is one accepted submission on its way to becoming a committed
//! file. It has no persistence of its own - the resulting commit is its
//! only durable form.

use serde::Serialize;

use crate::domain::entities::Thread;
use crate::domain::ports::CommitRef;

/// One accepted submission destined to become a committed file
#[derive(Debug, Clone)]
pub struct Entry {
    pub account: String,
    pub repository: String,
    /// Branch the entry is committed to (or a review targets).
    pub branch: String,
    /// Repository path of the entry file.
    pub path: String,
    /// Serialized file content, already rendered from the submitted fields.
    pub content: String,
    pub commit_message: String,
    /// Route the entry through a review request instead of committing
    /// directly.
    pub requires_moderation: bool,
    /// The discussion thread the entry belongs to, for notification
    /// fan-out.
    pub thread: Thread,
}

/// Outcome of persisting an entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PersistResult {
    /// Committed directly to the target branch.
    Committed(CommitRef),
    /// Parked on a review request awaiting human approval.
    ReviewOpened { review_id: i64 },
}
