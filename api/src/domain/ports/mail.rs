//! Mail provider port trait
//!
//! The subscription subsystem keeps one mailing list per discussion thread
//! and sends one message per new reply; the provider fans the message out
//! to the list members and owns the unsubscribe surface.

use async_trait::async_trait;

use crate::error::MailError;

/// A mailing list known to the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailingList {
    pub address: String,
}

/// One outbound email
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Port trait for mailing-list operations
#[async_trait]
pub trait MailAgent: Send + Sync {
    /// Sending domain this agent is bound to (the part after `@` in list
    /// addresses).
    fn domain(&self) -> &str;

    /// Look a list up by address. Absent lists are `None`, not an error.
    async fn get_list(&self, address: &str) -> Result<Option<MailingList>, MailError>;

    /// Create a list. Creating a list that already exists is a success -
    /// this is what makes concurrent subscribes to a new thread safe.
    async fn create_list(&self, address: &str) -> Result<(), MailError>;

    /// Add a member to a list. Adding an existing member is a no-op
    /// success.
    async fn add_member(&self, list_address: &str, email: &str) -> Result<(), MailError>;

    /// Send one message; the provider expands list recipients itself.
    async fn send_message(&self, message: &OutboundMessage) -> Result<(), MailError>;
}
