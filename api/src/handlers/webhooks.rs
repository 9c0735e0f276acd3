//! Webhook handlers
//!
//! Ingress for the review lifecycle events GitHub and GitLab push at us.
//! Each provider's payload is verified and normalized into a
//! [`ReviewEvent`] before the application layer sees it.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use crate::app::{process_review_event, ReviewEvent};
use crate::domain::ports::Service;
use crate::error::AppError;
use crate::AppState;

/// GitHub pull request webhook payload
#[derive(Debug, Deserialize)]
pub struct GitHubWebhookPayload {
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub pull_request: Option<GitHubPullRequest>,
    #[serde(default)]
    pub repository: Option<GitHubRepository>,
}

#[derive(Debug, Deserialize)]
pub struct GitHubPullRequest {
    pub number: i64,
    #[serde(default)]
    pub merged: bool,
    #[serde(default)]
    pub body: Option<String>,
    pub head: GitHubRef,
    pub base: GitHubRef,
}

#[derive(Debug, Deserialize)]
pub struct GitHubRef {
    #[serde(rename = "ref")]
    pub ref_name: String,
}

#[derive(Debug, Deserialize)]
pub struct GitHubRepository {
    pub name: String,
    pub owner: GitHubOwner,
}

#[derive(Debug, Deserialize)]
pub struct GitHubOwner {
    pub login: String,
}

/// GitLab merge request webhook payload
#[derive(Debug, Deserialize)]
pub struct GitLabWebhookPayload {
    #[serde(default)]
    pub object_kind: Option<String>,
    #[serde(default)]
    pub object_attributes: Option<GitLabMergeRequest>,
    #[serde(default)]
    pub project: Option<GitLabProject>,
}

#[derive(Debug, Deserialize)]
pub struct GitLabMergeRequest {
    pub iid: i64,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    pub source_branch: String,
    pub target_branch: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GitLabProject {
    pub path_with_namespace: String,
}

impl GitHubWebhookPayload {
    /// Normalize into a [`ReviewEvent`]. Payloads that are not pull
    /// request events yield `None`.
    pub fn to_review_event(&self) -> Option<ReviewEvent> {
        let action = self.action.as_ref()?;
        let pull_request = self.pull_request.as_ref()?;
        let repository = self.repository.as_ref()?;

        Some(ReviewEvent {
            action: action.clone(),
            merged: pull_request.merged,
            account: repository.owner.login.clone(),
            repository: repository.name.clone(),
            source_branch: pull_request.head.ref_name.clone(),
            target_branch: pull_request.base.ref_name.clone(),
            review_id: pull_request.number,
            description: pull_request.body.clone().unwrap_or_default(),
        })
    }
}

impl GitLabWebhookPayload {
    /// Normalize into a [`ReviewEvent`] using the GitHub action
    /// vocabulary: "merge" and "close" both become "closed", with the
    /// merged flag telling them apart.
    pub fn to_review_event(&self) -> Option<ReviewEvent> {
        if self.object_kind.as_deref() != Some("merge_request") {
            return None;
        }
        let attributes = self.object_attributes.as_ref()?;
        let project = self.project.as_ref()?;

        let (account, repository) = project.path_with_namespace.split_once('/')?;
        let action = attributes.action.as_deref()?;
        let (action, merged) = match action {
            "merge" => ("closed".to_string(), true),
            "close" => (
                "closed".to_string(),
                attributes.state.as_deref() == Some("merged"),
            ),
            other => (other.to_string(), false),
        };

        Some(ReviewEvent {
            action,
            merged,
            account: account.to_string(),
            repository: repository.to_string(),
            source_branch: attributes.source_branch.clone(),
            target_branch: attributes.target_branch.clone(),
            review_id: attributes.iid,
            description: attributes.description.clone().unwrap_or_default(),
        })
    }
}

/// Verify GitHub's HMAC-SHA256 signature over the raw body.
fn verify_github_signature(
    payload: &[u8],
    signature: Option<&str>,
    secret: &Option<String>,
) -> bool {
    let Some(secret) = secret else {
        // No secret configured, skip verification (development mode)
        tracing::warn!("Webhook secret not configured, skipping signature verification");
        return true;
    };

    let Some(sig_header) = signature else {
        tracing::warn!("No signature provided in webhook request");
        return false;
    };

    // GitHub sends the signature as "sha256=<hex>"
    let expected_hex = sig_header.strip_prefix("sha256=").unwrap_or(sig_header);

    type HmacSha256 = Hmac<Sha256>;
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => {
            tracing::error!("Invalid webhook secret key");
            return false;
        }
    };

    mac.update(payload);

    let expected_bytes = match hex::decode(expected_hex) {
        Ok(bytes) => bytes,
        Err(_) => {
            tracing::warn!("Invalid signature format");
            return false;
        }
    };

    mac.verify_slice(&expected_bytes).is_ok()
}

/// GitLab sends the shared secret back verbatim in a header.
fn verify_gitlab_token(token: Option<&str>, secret: &Option<String>) -> bool {
    let Some(secret) = secret else {
        tracing::warn!("Webhook secret not configured, skipping token verification");
        return true;
    };

    match token {
        Some(token) => token == secret,
        None => {
            tracing::warn!("No token provided in webhook request");
            false
        }
    }
}

/// POST /v1/webhook/:service
///
/// Handle review lifecycle events from a hosting provider.
pub async fn review_webhook(
    State(state): State<AppState>,
    Path(service): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    let service: Service = service
        .parse()
        .map_err(|e: String| AppError::BadRequest(e))?;

    let event = match service {
        Service::GitHub => {
            let signature = headers
                .get("X-Hub-Signature-256")
                .and_then(|h| h.to_str().ok());
            if !verify_github_signature(&body, signature, &state.config.webhook_secret) {
                tracing::warn!("Webhook signature verification failed");
                return Err(AppError::Unauthorized);
            }

            let payload: GitHubWebhookPayload = serde_json::from_slice(&body).map_err(|e| {
                tracing::warn!(error = %e, "Failed to parse webhook payload");
                AppError::BadRequest(format!("Invalid JSON: {}", e))
            })?;
            payload.to_review_event()
        }
        Service::GitLab => {
            let token = headers.get("X-Gitlab-Token").and_then(|h| h.to_str().ok());
            if !verify_gitlab_token(token, &state.config.webhook_secret) {
                tracing::warn!("Webhook token verification failed");
                return Err(AppError::Unauthorized);
            }

            let payload: GitLabWebhookPayload = serde_json::from_slice(&body).map_err(|e| {
                tracing::warn!(error = %e, "Failed to parse webhook payload");
                AppError::BadRequest(format!("Invalid JSON: {}", e))
            })?;
            payload.to_review_event()
        }
    };

    if let Some(event) = event {
        tracing::info!(
            service = %service,
            repo = %event.repository,
            review_id = event.review_id,
            action = %event.action,
            merged = event.merged,
            "Received review webhook"
        );
        process_review_event(&event, &state.subscriptions).await;
    } else {
        tracing::debug!(service = %service, "Ignoring webhook payload without review content");
    }

    Ok(StatusCode::OK)
}
