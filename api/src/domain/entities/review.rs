//! Review request entity and notification metadata
//!
//! A review request gates a moderated entry behind human approval. Its
//! lifecycle (open, then merged or closed without merge) is observed only
//! through inbound webhook events; a review whose events never arrive
//! stays logically open forever.
//!
//! The webhook event is all the context the merge side ever gets, so the
//! review description carries a machine-readable metadata block with the
//! thread identity and notification inputs. Merging the review hands that
//! block straight back to us.

use serde::{Deserialize, Serialize};

use crate::domain::entities::Thread;

/// An in-flight moderation review
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewRequest {
    /// Provider-assigned identifier (PR number / MR iid).
    pub id: i64,
    pub source_branch: String,
    pub target_branch: String,
}

const METADATA_OPEN: &str = "<!-- staticpost_notification:";
const METADATA_CLOSE: &str = "-->";

/// Notification context embedded in a review description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewMetadata {
    pub thread: Thread,
    /// The submitted fields, echoed for the notification template.
    pub fields: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_name: Option<String>,
}

impl ReviewMetadata {
    /// Render the metadata as an HTML comment for a review description.
    pub fn embed(&self) -> String {
        // A Value-bearing struct always serializes
        let json = serde_json::to_string(self).unwrap_or_default();
        format!("{}{}{}", METADATA_OPEN, json, METADATA_CLOSE)
    }

    /// Recover embedded metadata from a review description. Descriptions
    /// without a well-formed block yield `None`.
    pub fn extract(description: &str) -> Option<Self> {
        let start = description.find(METADATA_OPEN)? + METADATA_OPEN.len();
        let end = start + description[start..].find(METADATA_CLOSE)?;
        serde_json::from_str(description[start..end].trim()).ok()
    }
}
