//! Review lifecycle event processing
//!
//! A review request transitions out of "open" exactly once - merged or
//! closed without merge - and we only ever learn about it from inbound
//! webhook events. A merge triggers the deferred notification fan-out;
//! everything else is discarded. Re-delivered merge events may notify
//! again: notification is best-effort and no dedup state is kept.

use crate::app::moderation_service::REVIEW_BRANCH_PREFIX;
use crate::app::notification::{NotifyOptions, SiteMetadata};
use crate::app::subscription_service::SubscriptionService;
use crate::domain::entities::ReviewMetadata;
use crate::domain::ports::MailAgent;

/// Provider-neutral review lifecycle event. Handlers normalize GitHub and
/// GitLab payloads into this before anything else looks at them.
#[derive(Debug, Clone)]
pub struct ReviewEvent {
    /// Normalized action; only "closed" carries meaning here.
    pub action: String,
    pub merged: bool,
    pub account: String,
    pub repository: String,
    pub source_branch: String,
    pub target_branch: String,
    pub review_id: i64,
    /// Review description, carrying the embedded notification metadata.
    pub description: String,
}

/// React to one review event.
pub async fn process_review_event<M: MailAgent>(
    event: &ReviewEvent,
    subscriptions: &SubscriptionService<M>,
) {
    if !event.source_branch.starts_with(REVIEW_BRANCH_PREFIX) {
        tracing::debug!(
            source_branch = %event.source_branch,
            "Ignoring review event for a foreign branch"
        );
        return;
    }

    if event.action != "closed" {
        tracing::debug!(action = %event.action, "Ignoring unhandled review action");
        return;
    }

    if !event.merged {
        tracing::info!(
            review_id = event.review_id,
            account = %event.account,
            repo = %event.repository,
            "Review closed without merge, entry discarded"
        );
        return;
    }

    let Some(metadata) = ReviewMetadata::extract(&event.description) else {
        tracing::warn!(
            review_id = event.review_id,
            account = %event.account,
            repo = %event.repository,
            "Merged review carries no notification metadata"
        );
        return;
    };

    let options = NotifyOptions {
        origin: metadata.origin.clone(),
    };
    let site = SiteMetadata {
        name: metadata.site_name.clone(),
    };

    match subscriptions
        .notify_all(&metadata.thread, &metadata.fields, &options, &site)
        .await
    {
        Ok(()) => tracing::info!(
            review_id = event.review_id,
            thread = %metadata.thread,
            "Subscribers notified for merged review"
        ),
        Err(e) => tracing::warn!(
            error = %e,
            review_id = event.review_id,
            "Failed to notify subscribers for merged review"
        ),
    }
}
