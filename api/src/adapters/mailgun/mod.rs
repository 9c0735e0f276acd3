//! Mailgun adapter

mod client;

pub use client::MailgunClient;
