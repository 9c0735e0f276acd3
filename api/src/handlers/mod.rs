//! HTTP handlers
//!
//! Axum request handlers for the API endpoints.

pub mod connect;
pub mod entries;
pub mod webhooks;

pub use connect::connect;
pub use entries::create_entry;
pub use webhooks::review_webhook;
