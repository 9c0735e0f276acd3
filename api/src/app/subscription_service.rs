//! Thread subscription service
//!
//! Maps each discussion thread to exactly one mailing list and keeps both
//! ends idempotent: the list address is a deterministic digest of the
//! thread's composite key, list creation treats "already exists" as
//! success, and membership is an upsert.

use std::sync::Arc;

use sha2::{Digest, Sha256};

use crate::app::notification::{Notification, NotifyOptions, SiteMetadata};
use crate::domain::entities::Thread;
use crate::domain::ports::MailAgent;
use crate::error::MailError;

pub struct SubscriptionService<M: MailAgent> {
    mail: Arc<M>,
    from_address: String,
}

impl<M: MailAgent> SubscriptionService<M> {
    pub fn new(mail: Arc<M>, from_address: String) -> Self {
        Self { mail, from_address }
    }

    /// Deterministic list address for a thread. Hashing the composite key
    /// is what enforces "at most one list per thread" - every caller
    /// lands on the same address without coordination.
    pub fn list_address(&self, thread: &Thread) -> String {
        let digest = Sha256::digest(
            format!(
                "{}-{}-{}",
                thread.account, thread.repository, thread.entry_id
            )
            .as_bytes(),
        );
        let compound = hex::encode(digest);
        format!("{}@{}", &compound[..32], self.mail.domain())
    }

    /// Register `email` on the thread's list, creating the list first if
    /// this is the thread's first subscriber. Two racing subscribers may
    /// both attempt the create; the provider's idempotent create makes
    /// that safe.
    pub async fn subscribe(&self, thread: &Thread, email: &str) -> Result<(), MailError> {
        let address = self.list_address(thread);

        if self.mail.get_list(&address).await?.is_none() {
            self.mail.create_list(&address).await?;
            tracing::info!(thread = %thread, address = %address, "Mailing list created");
        }

        self.mail.add_member(&address, email).await?;
        tracing::info!(thread = %thread, "Subscriber registered");
        Ok(())
    }

    /// Notify everyone subscribed to a thread of a new reply. A thread
    /// with no list has no subscribers and nothing happens. One dispatch
    /// to the list address reaches all members; this service never
    /// iterates members itself.
    pub async fn notify_all(
        &self,
        thread: &Thread,
        fields: &serde_json::Value,
        options: &NotifyOptions,
        site: &SiteMetadata,
    ) -> Result<(), MailError> {
        let address = self.list_address(thread);
        let Some(list) = self.mail.get_list(&address).await? else {
            tracing::debug!(thread = %thread, "No subscription list, skipping notification");
            return Ok(());
        };

        let notification = Notification::new(self.mail.clone(), self.from_address.clone());
        notification.send(&list.address, fields, options, site).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockMailAgent;
    use serde_json::json;
    use std::collections::HashSet;

    fn service(mail: Arc<MockMailAgent>) -> SubscriptionService<MockMailAgent> {
        SubscriptionService::new(mail, "noreply@staticpost.local".to_string())
    }

    fn thread() -> Thread {
        Thread::new("johndoe", "foobar", "my-first-post")
    }

    #[test]
    fn list_address_is_deterministic() {
        let subscriptions = service(Arc::new(MockMailAgent::new("mg.example.com")));
        let first = subscriptions.list_address(&thread());
        let second = subscriptions.list_address(&thread());

        assert_eq!(first, second);
        assert!(first.ends_with("@mg.example.com"));
        assert_eq!(first.split('@').next().unwrap().len(), 32);
    }

    #[test]
    fn distinct_threads_get_distinct_addresses() {
        let subscriptions = service(Arc::new(MockMailAgent::new("mg.example.com")));

        let mut seen = HashSet::new();
        for i in 0..10_000 {
            let thread = Thread::new(
                &format!("account-{}", i % 100),
                &format!("repo-{}", i % 10),
                &format!("post-{}", i),
            );
            assert!(seen.insert(subscriptions.list_address(&thread)));
        }
    }

    #[tokio::test]
    async fn subscribing_twice_keeps_one_list_and_one_member() {
        let mail = Arc::new(MockMailAgent::new("mg.example.com"));
        let subscriptions = service(mail.clone());

        subscriptions.subscribe(&thread(), "a@b.com").await.unwrap();
        subscriptions.subscribe(&thread(), "a@b.com").await.unwrap();

        let address = subscriptions.list_address(&thread());
        assert_eq!(mail.list_count(), 1);
        assert_eq!(mail.members_of(&address), vec!["a@b.com".to_string()]);
        // The second subscribe saw the list and skipped the create
        assert_eq!(mail.created_lists().len(), 1);
    }

    #[tokio::test]
    async fn notify_without_subscribers_sends_nothing() {
        let mail = Arc::new(MockMailAgent::new("mg.example.com"));
        let subscriptions = service(mail.clone());

        subscriptions
            .notify_all(
                &thread(),
                &json!({}),
                &NotifyOptions::default(),
                &SiteMetadata::default(),
            )
            .await
            .unwrap();

        assert!(mail.sent().is_empty());
    }

    #[tokio::test]
    async fn notify_dispatches_once_to_the_list_address() {
        let mail = Arc::new(MockMailAgent::new("mg.example.com"));
        let subscriptions = service(mail.clone());
        subscriptions.subscribe(&thread(), "a@b.com").await.unwrap();

        subscriptions
            .notify_all(
                &thread(),
                &json!({"message": "hi"}),
                &NotifyOptions::default(),
                &SiteMetadata {
                    name: Some("Example Blog".to_string()),
                },
            )
            .await
            .unwrap();

        let messages = mail.sent();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].to, subscriptions.list_address(&thread()));
        assert!(messages[0].subject.contains("Example Blog"));
    }
}
