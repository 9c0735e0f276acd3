//! Adapters layer
//!
//! Implementations of port traits for external systems.

pub mod github;
pub mod gitlab;
pub mod mailgun;

pub use github::GitHubClient;
pub use gitlab::GitLabClient;
pub use mailgun::MailgunClient;

use crate::config::Config;
use crate::domain::ports::{Credential, HostingClient, RepoScope, Service};
use crate::error::{HostingError, ProviderError};

/// Build the hosting client for one request. The provider is a closed set
/// selected here once; the credential comes from the request's OAuth token
/// or the configured personal token, and construction fails outright with
/// neither.
pub fn hosting_client(
    service: Service,
    scope: RepoScope,
    oauth_token: Option<String>,
    config: &Config,
) -> Result<Box<dyn HostingClient>, HostingError> {
    match service {
        Service::GitHub => {
            let credential = Credential::resolve(oauth_token, config.github_token.as_deref())?;
            Ok(Box::new(GitHubClient::new(
                config.github_api_url.clone(),
                scope,
                credential,
            )))
        }
        Service::GitLab => {
            let credential = Credential::resolve(oauth_token, config.gitlab_token.as_deref())?;
            Ok(Box::new(GitLabClient::new(
                config.gitlab_api_url.clone(),
                scope,
                credential,
            )))
        }
    }
}

/// Decode base64 file content as returned by provider content APIs.
/// GitHub wraps the payload in newlines, so whitespace is stripped first.
pub(crate) fn decode_file_content(encoded: &str) -> Result<String, ProviderError> {
    use base64::Engine;

    let compact: String = encoded.split_whitespace().collect();
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| ProviderError::Deserialization(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ProviderError::Deserialization(e.to_string()))
}
