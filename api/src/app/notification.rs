//! Reply notification composer
//!
//! Renders the fixed "someone replied" email and hands it to the mail
//! agent. Dispatch is best-effort relative to entry persistence: failures
//! are logged here and never reach the caller.

use std::sync::Arc;

use crate::domain::ports::{MailAgent, OutboundMessage};

/// Submission options that shape the message body
#[derive(Debug, Clone, Default)]
pub struct NotifyOptions {
    /// Deep link back to the page the reply appeared on.
    pub origin: Option<String>,
}

/// What we know about the subscriber-facing site
#[derive(Debug, Clone, Default)]
pub struct SiteMetadata {
    pub name: Option<String>,
}

pub struct Notification<M: MailAgent> {
    mail: Arc<M>,
    from_address: String,
}

impl<M: MailAgent> Notification<M> {
    pub fn new(mail: Arc<M>, from_address: String) -> Self {
        Self { mail, from_address }
    }

    /// Render the message body. The unsubscribe placeholder is left
    /// verbatim for the mail provider to substitute per recipient.
    pub fn build_message(
        &self,
        _fields: &serde_json::Value,
        options: &NotifyOptions,
        site: &SiteMetadata,
    ) -> String {
        let site_part = site
            .name
            .as_ref()
            .map(|name| format!(" on <strong>{}</strong>", name))
            .unwrap_or_default();
        let origin_part = options
            .origin
            .as_ref()
            .map(|origin| format!("<a href=\"{}\">Click here</a> to see it. ", origin))
            .unwrap_or_default();

        format!(
            "<html>\n  <body>\n    Dear human,<br>\n    <br>\n    Someone replied to a comment \
             you subscribed to{}.<br>\n    <br>\n    {}If you do not wish to receive any further \
             notifications for this thread, <a href=\"%mailing_list_unsubscribe_url%\">click \
             here</a>.<br>\n  </body>\n</html>\n",
            site_part, origin_part
        )
    }

    /// Compose and dispatch one message. Failures are logged, not
    /// propagated.
    pub async fn send(
        &self,
        to: &str,
        fields: &serde_json::Value,
        options: &NotifyOptions,
        site: &SiteMetadata,
    ) {
        let subject = match &site.name {
            Some(name) => format!("New reply on \"{}\"", name),
            None => "New reply".to_string(),
        };

        let message = OutboundMessage {
            from: format!("staticpost <{}>", self.from_address),
            to: to.to_string(),
            subject,
            html: self.build_message(fields, options, site),
        };

        match self.mail.send_message(&message).await {
            Ok(()) => tracing::info!(to = %to, "Notification dispatched"),
            Err(e) => tracing::warn!(error = %e, to = %to, "Failed to dispatch notification"),
        }
    }
}
