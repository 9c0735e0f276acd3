//! Application layer
//!
//! Contains use cases and service orchestration.
//! Services coordinate between domain entities, ports, and external systems.

pub mod moderation_service;
pub mod notification;
pub mod review_events;
pub mod subscription_service;

pub use moderation_service::{ModerationService, REVIEW_BRANCH_PREFIX};
pub use notification::{Notification, NotifyOptions, SiteMetadata};
pub use review_events::{process_review_event, ReviewEvent};
pub use subscription_service::SubscriptionService;
