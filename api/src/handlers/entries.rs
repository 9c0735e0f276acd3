//! Entry submission handler
//!
//! The HTTP face of the submission pipeline. Validation and field
//! transformation live upstream of this service; here the submitted
//! fields are rendered into an entry file, the site's own configuration
//! decides moderation, and the moderation service does the rest.

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::adapters;
use crate::app::{ModerationService, NotifyOptions, SiteMetadata};
use crate::domain::entities::{Entry, PersistResult, Thread};
use crate::domain::ports::{HostingClient, RepoScope, Service};
use crate::error::AppError;
use crate::AppState;

/// Per-site configuration file read from the target repository.
pub const SITE_CONFIG_PATH: &str = ".staticpost.yml";

/// The slice of the site configuration this service consumes
#[derive(Debug, Deserialize)]
pub struct SiteConfig {
    /// Route entries through a review request. Sites must opt out
    /// explicitly.
    #[serde(default = "default_moderation")]
    pub moderation: bool,
    /// Human-facing site name used in notification email.
    #[serde(default)]
    pub name: Option<String>,
}

fn default_moderation() -> bool {
    true
}

/// Request body for a submission
#[derive(Debug, Deserialize)]
pub struct EntryRequest {
    pub fields: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub options: EntryOptions,
}

/// Submission options
#[derive(Debug, Default, Deserialize)]
pub struct EntryOptions {
    /// Parent entry the submission replies to (e.g. a post slug).
    /// Defaults to the path property when omitted.
    #[serde(default)]
    pub parent: Option<String>,
    /// URL of the page the submission came from.
    #[serde(default)]
    pub origin: Option<String>,
    /// Name of the field holding the submitter's email, set when they
    /// opted into reply notifications.
    #[serde(default)]
    pub subscribe: Option<String>,
    /// Short-lived OAuth token overriding the configured access token.
    #[serde(default)]
    pub oauth_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EntryResponse {
    pub success: bool,
    pub result: PersistResult,
}

/// POST /v1/entry/:service/:username/:repository/:branch/:property
///
/// Persist one accepted submission.
pub async fn create_entry(
    State(state): State<AppState>,
    Path((service, username, repository, branch, property)): Path<(
        String,
        String,
        String,
        String,
        String,
    )>,
    Json(request): Json<EntryRequest>,
) -> Result<Json<EntryResponse>, AppError> {
    let service: Service = service
        .parse()
        .map_err(|e: String| AppError::BadRequest(e))?;

    let scope = RepoScope::new(&username, &repository, &branch);
    let hosting = adapters::hosting_client(
        service,
        scope,
        request.options.oauth_token.clone(),
        &state.config,
    )?;

    let site_config = read_site_config(hosting.as_ref()).await?;

    let parent = request
        .options
        .parent
        .clone()
        .unwrap_or_else(|| property.clone());
    let thread = Thread::new(&username, &repository, &parent);

    // Opt-in subscription for the submitter. Registering is best-effort;
    // a mail-provider hiccup must not reject the submission.
    if let Some(field) = &request.options.subscribe {
        if let Some(email) = request.fields.get(field).and_then(|v| v.as_str()) {
            if let Err(e) = state.subscriptions.subscribe(&thread, email).await {
                tracing::warn!(error = %e, thread = %thread, "Failed to register subscription");
            }
        }
    }

    let entry_id = Uuid::new_v4().to_string();
    let content = render_entry_document(&entry_id, &request.fields)?;
    let entry = Entry {
        account: username,
        repository,
        branch,
        path: format!("data/{}/entry-{}.yml", property, entry_id),
        content,
        commit_message: format!("Add staticpost entry ({})", parent),
        requires_moderation: site_config.moderation,
        thread,
    };

    let fields = serde_json::Value::Object(request.fields);
    let options = NotifyOptions {
        origin: request.options.origin.clone(),
    };
    let site = SiteMetadata {
        name: site_config.name.clone(),
    };

    let moderation = ModerationService::new(hosting, state.subscriptions.clone());
    let result = moderation.persist(&entry, &fields, &options, &site).await?;

    Ok(Json(EntryResponse {
        success: true,
        result,
    }))
}

async fn read_site_config(hosting: &dyn HostingClient) -> Result<SiteConfig, AppError> {
    let value = hosting.read_file(SITE_CONFIG_PATH, None).await?;
    serde_json::from_value(value)
        .map_err(|e| AppError::BadRequest(format!("Invalid site configuration: {}", e)))
}

/// Serialize the submitted fields into the YAML entry document, stamped
/// with a generated id and submission date.
fn render_entry_document(
    entry_id: &str,
    fields: &serde_json::Map<String, serde_json::Value>,
) -> Result<String, AppError> {
    let mut document = serde_json::Map::new();
    document.insert(
        "_id".to_string(),
        serde_json::Value::String(entry_id.to_string()),
    );
    document.insert(
        "date".to_string(),
        serde_json::Value::String(Utc::now().to_rfc3339()),
    );
    for (key, value) in fields {
        document.insert(key.clone(), value.clone());
    }

    serde_yaml::to_string(&document)
        .map_err(|e| AppError::Internal(format!("Failed to render entry: {}", e)))
}
