//! Domain ports (traits)
//!
//! Port traits define interfaces that the domain layer requires.
//! Adapters provide concrete implementations of these traits.

pub mod hosting;
pub mod mail;

pub use hosting::{
    parse_document, CommitRef, Credential, FileContents, HostingClient, Invitation, RepoScope,
    Service, DEFAULT_COMMIT_MESSAGE,
};
pub use mail::{MailAgent, MailingList, OutboundMessage};
