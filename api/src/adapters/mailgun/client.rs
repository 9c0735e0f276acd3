//! Mailgun API client implementation
//!
//! Mailing lists are the unit of state here: one list per discussion
//! thread, members managed by the provider, message fan-out and the
//! unsubscribe surface included.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::domain::ports::{MailAgent, MailingList, OutboundMessage};
use crate::error::MailError;

/// `MailAgent` over the Mailgun v3 API
pub struct MailgunClient {
    http: Client,
    base_url: String,
    api_key: String,
    domain: String,
}

impl MailgunClient {
    pub fn new(base_url: String, api_key: String, domain: String) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            domain,
        }
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request.basic_auth("api", Some(&self.api_key))
    }

    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<(), MailError> {
        let status = response.status();

        if status.is_success() {
            Ok(())
        } else {
            let message = response.text().await.unwrap_or_default();
            Err(MailError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }
}

/// Response types from the Mailgun API
#[derive(Deserialize)]
struct GetListResponse {
    list: ListInfo,
}

#[derive(Deserialize)]
struct ListInfo {
    address: String,
}

#[async_trait]
impl MailAgent for MailgunClient {
    fn domain(&self) -> &str {
        &self.domain
    }

    async fn get_list(&self, address: &str) -> Result<Option<MailingList>, MailError> {
        let resp = self
            .authorize(self.http.get(self.api_url(&format!("/lists/{}", address))))
            .send()
            .await?;

        let status = resp.status();
        if status.as_u16() == 404 {
            return Ok(None);
        }
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(MailError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let list: GetListResponse = resp
            .json()
            .await
            .map_err(|e| MailError::Deserialization(e.to_string()))?;

        Ok(Some(MailingList {
            address: list.list.address,
        }))
    }

    async fn create_list(&self, address: &str) -> Result<(), MailError> {
        let resp = self
            .authorize(self.http.post(self.api_url("/lists")))
            .form(&[("address", address)])
            .send()
            .await?;

        let status = resp.status();
        if status.as_u16() == 400 {
            // Mailgun reports a duplicate list as a 400; two concurrent
            // subscribes to a brand-new thread both land here and both
            // must succeed.
            tracing::debug!(address = %address, "Mailing list already exists");
            return Ok(());
        }

        self.handle_empty_response(resp).await
    }

    async fn add_member(&self, list_address: &str, email: &str) -> Result<(), MailError> {
        let resp = self
            .authorize(
                self.http
                    .post(self.api_url(&format!("/lists/{}/members", list_address))),
            )
            .form(&[
                ("address", email),
                ("subscribed", "yes"),
                // upsert makes re-subscribing an existing member a no-op
                ("upsert", "yes"),
            ])
            .send()
            .await?;

        self.handle_empty_response(resp).await
    }

    async fn send_message(&self, message: &OutboundMessage) -> Result<(), MailError> {
        let resp = self
            .authorize(
                self.http
                    .post(self.api_url(&format!("/{}/messages", self.domain))),
            )
            .form(&[
                ("from", message.from.as_str()),
                ("to", message.to.as_str()),
                ("subject", message.subject.as_str()),
                ("html", message.html.as_str()),
            ])
            .send()
            .await?;

        self.handle_empty_response(resp).await
    }
}
