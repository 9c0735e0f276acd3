//! GitHub adapter

mod client;

pub use client::GitHubClient;
