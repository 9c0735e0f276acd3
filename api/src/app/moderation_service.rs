//! Moderation service
//!
//! The single entry point the submission pipeline calls once a submission
//! has been accepted: commit the entry directly, or park it on a review
//! request for a human to approve.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::app::notification::{NotifyOptions, SiteMetadata};
use crate::app::subscription_service::SubscriptionService;
use crate::domain::entities::{Entry, PersistResult, ReviewMetadata};
use crate::domain::ports::{HostingClient, MailAgent};
use crate::error::HostingError;

/// Prefix of every review branch this service creates. The webhook side
/// uses it to tell our reviews apart from ordinary pull requests.
pub const REVIEW_BRANCH_PREFIX: &str = "staticpost_";

pub struct ModerationService<M: MailAgent> {
    hosting: Box<dyn HostingClient>,
    subscriptions: Arc<SubscriptionService<M>>,
}

impl<M: MailAgent> ModerationService<M> {
    pub fn new(
        hosting: Box<dyn HostingClient>,
        subscriptions: Arc<SubscriptionService<M>>,
    ) -> Self {
        Self {
            hosting,
            subscriptions,
        }
    }

    /// Persist one entry. Hosting failures propagate unchanged - the
    /// submitter must see them and can safely resubmit. A notification
    /// failure never fails the submission.
    pub async fn persist(
        &self,
        entry: &Entry,
        fields: &serde_json::Value,
        options: &NotifyOptions,
        site: &SiteMetadata,
    ) -> Result<PersistResult, HostingError> {
        if entry.requires_moderation {
            let source_branch = review_branch_name();
            let body = review_body(entry, fields, options, site);

            let review = self
                .hosting
                .write_file_and_open_review(
                    &entry.path,
                    &entry.content,
                    &source_branch,
                    &entry.commit_message,
                    &body,
                )
                .await?;

            tracing::info!(
                account = %entry.account,
                repo = %entry.repository,
                review_id = review.id,
                source_branch = %review.source_branch,
                target_branch = %review.target_branch,
                "Review request opened for moderated entry"
            );

            // Subscribers hear nothing until the review merges
            Ok(PersistResult::ReviewOpened {
                review_id: review.id,
            })
        } else {
            let commit = self
                .hosting
                .write_file(
                    &entry.path,
                    &entry.content,
                    Some(&entry.branch),
                    Some(&entry.commit_message),
                )
                .await?;

            tracing::info!(
                account = %entry.account,
                repo = %entry.repository,
                path = %entry.path,
                branch = %entry.branch,
                "Entry committed"
            );

            if let Err(e) = self
                .subscriptions
                .notify_all(&entry.thread, fields, options, site)
                .await
            {
                tracing::warn!(error = %e, thread = %entry.thread, "Failed to notify thread subscribers");
            }

            Ok(PersistResult::Committed(commit))
        }
    }
}

/// Unique branch name for one review: time-based with a random tail so
/// concurrent submissions to the same repository cannot collide.
fn review_branch_name() -> String {
    let tail = Uuid::new_v4().simple().to_string();
    format!(
        "{}{}_{}",
        REVIEW_BRANCH_PREFIX,
        Utc::now().timestamp_millis(),
        &tail[..8]
    )
}

/// Review description: a human-readable listing of the submitted fields
/// followed by the embedded notification metadata the webhook side reads
/// back after the merge.
fn review_body(
    entry: &Entry,
    fields: &serde_json::Value,
    options: &NotifyOptions,
    site: &SiteMetadata,
) -> String {
    let mut listing = String::new();
    if let Some(map) = fields.as_object() {
        for (key, value) in map {
            let rendered = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            listing.push_str(&format!("**{}**: {}\n\n", key, rendered));
        }
    }

    let metadata = ReviewMetadata {
        thread: entry.thread.clone(),
        fields: fields.clone(),
        origin: options.origin.clone(),
        site_name: site.name.clone(),
    };

    format!(
        "Dear human,\n\nHere's a new entry for your approval.\n\nMerge the pull request to \
         accept it, or close it to send it away.\n\n---\n\n{}{}",
        listing,
        metadata.embed()
    )
}
