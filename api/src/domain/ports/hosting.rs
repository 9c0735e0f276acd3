//! Git-hosting client port trait
//!
//! Defines the capability the rest of the crate depends on when talking to
//! a git-hosting provider. Two adapters implement it (GitHub, GitLab);
//! callers never see a concrete one.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::entities::{ReviewRequest, User};
use crate::error::HostingError;

/// Commit message used when a caller does not provide one.
pub const DEFAULT_COMMIT_MESSAGE: &str = "Add staticpost entry";

/// Supported git-hosting providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Service {
    GitHub,
    GitLab,
}

impl std::fmt::Display for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Service::GitHub => write!(f, "github"),
            Service::GitLab => write!(f, "gitlab"),
        }
    }
}

impl std::str::FromStr for Service {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "github" => Ok(Service::GitHub),
            "gitlab" => Ok(Service::GitLab),
            _ => Err(format!("Unknown service: {}", s)),
        }
    }
}

/// The account, repository and default branch one client instance is
/// scoped to. A client lives for a single logical request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoScope {
    pub username: String,
    pub repository: String,
    pub branch: String,
}

impl RepoScope {
    pub fn new(username: &str, repository: &str, branch: &str) -> Self {
        Self {
            username: username.to_string(),
            repository: repository.to_string(),
            branch: branch.to_string(),
        }
    }

    /// `owner/repository`, the form providers use in payloads.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.username, self.repository)
    }
}

/// Access token for one request
#[derive(Debug, Clone)]
pub enum Credential {
    /// Long-lived personal access token configured per process.
    Personal(String),
    /// Short-lived OAuth token supplied with a single request.
    OAuth(String),
}

impl Credential {
    /// Pick the credential for a request: an OAuth token on the request
    /// wins, else the configured personal token. With neither, the client
    /// cannot be constructed at all.
    pub fn resolve(
        oauth_token: Option<String>,
        configured: Option<&str>,
    ) -> Result<Self, HostingError> {
        if let Some(token) = oauth_token {
            return Ok(Credential::OAuth(token));
        }
        match configured {
            Some(token) if !token.is_empty() => Ok(Credential::Personal(token.to_string())),
            _ => Err(HostingError::MissingCredential),
        }
    }

    pub fn token(&self) -> &str {
        match self {
            Credential::Personal(token) | Credential::OAuth(token) => token,
        }
    }
}

/// A repository file in both parsed and raw form
#[derive(Debug, Clone)]
pub struct FileContents {
    pub parsed: serde_json::Value,
    pub raw: String,
}

/// Where a direct commit landed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitRef {
    pub path: String,
    pub branch: String,
    /// Commit sha when the provider reports one (GitLab's file API does not).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<String>,
}

/// A pending repository collaboration invitation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invitation {
    pub id: i64,
    /// Full name (`owner/repository`) of the inviting repository.
    pub repository: String,
}

/// Parse a repository document fetched from a provider. The extension
/// decides the format: `.json` is JSON, everything else is YAML.
pub fn parse_document(path: &str, raw: &str) -> Result<serde_json::Value, HostingError> {
    let is_json = std::path::Path::new(path)
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if is_json {
        serde_json::from_str(raw).map_err(|e| HostingError::Parse {
            path: path.to_string(),
            message: e.to_string(),
        })
    } else {
        serde_yaml::from_str(raw).map_err(|e| HostingError::Parse {
            path: path.to_string(),
            message: e.to_string(),
        })
    }
}

/// Port trait for git-hosting operations
#[async_trait]
pub trait HostingClient: Send + Sync + std::fmt::Debug {
    /// The account/repository/branch this client was constructed for.
    fn scope(&self) -> &RepoScope;

    /// Fetch a file at `ref_name` (default: the scope's branch) and parse
    /// it by extension.
    async fn read_file(
        &self,
        path: &str,
        ref_name: Option<&str>,
    ) -> Result<serde_json::Value, HostingError> {
        Ok(self.read_file_full(path, ref_name).await?.parsed)
    }

    /// Like `read_file`, also returning the raw text.
    async fn read_file_full(
        &self,
        path: &str,
        ref_name: Option<&str>,
    ) -> Result<FileContents, HostingError>;

    /// Create `path` on `branch` (default: the scope's branch) with
    /// `commit_message` (default: [`DEFAULT_COMMIT_MESSAGE`]).
    async fn write_file(
        &self,
        path: &str,
        content: &str,
        branch: Option<&str>,
        commit_message: Option<&str>,
    ) -> Result<CommitRef, HostingError>;

    /// Create `new_branch` off the scope's branch, commit `path` to it and
    /// open a review request back into the scope's branch. The four steps
    /// run strictly in order; the first failure aborts the rest and any
    /// partial state (an orphaned branch) is left in place.
    async fn write_file_and_open_review(
        &self,
        path: &str,
        content: &str,
        new_branch: &str,
        commit_title: &str,
        commit_body: &str,
    ) -> Result<ReviewRequest, HostingError>;

    /// Resolve the identity bound to the active credential.
    async fn get_current_user(&self) -> Result<User, HostingError>;

    /// List the acting user's pending collaboration invitations.
    async fn list_pending_invitations(&self) -> Result<Vec<Invitation>, HostingError>;

    /// Accept a collaboration invitation by id.
    async fn accept_invitation(&self, invitation_id: i64) -> Result<(), HostingError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_prefers_oauth_token() {
        let credential =
            Credential::resolve(Some("request-token".to_string()), Some("configured-token"))
                .unwrap();
        assert!(matches!(credential, Credential::OAuth(ref t) if t == "request-token"));
    }

    #[test]
    fn credential_falls_back_to_configured_token() {
        let credential = Credential::resolve(None, Some("configured-token")).unwrap();
        assert!(matches!(credential, Credential::Personal(ref t) if t == "configured-token"));
    }

    #[test]
    fn credential_missing_is_an_error() {
        assert!(matches!(
            Credential::resolve(None, None),
            Err(HostingError::MissingCredential)
        ));
        assert!(matches!(
            Credential::resolve(None, Some("")),
            Err(HostingError::MissingCredential)
        ));
    }

    #[test]
    fn parses_yaml_by_default() {
        let value = parse_document("path/to/file.yml", "name: My Site\nmoderation: false\n")
            .unwrap();
        assert_eq!(value["name"], "My Site");
        assert_eq!(value["moderation"], false);
    }

    #[test]
    fn parses_json_by_extension() {
        let value = parse_document("path/to/file.json", r#"{"name": "My Site"}"#).unwrap();
        assert_eq!(value["name"], "My Site");
    }

    #[test]
    fn malformed_document_is_a_parse_error() {
        let err = parse_document("file.yml", "{invalid: [yaml").unwrap_err();
        assert!(matches!(err, HostingError::Parse { ref path, .. } if path == "file.yml"));
    }

    #[test]
    fn service_parses_from_path_segment() {
        assert_eq!("github".parse::<Service>().unwrap(), Service::GitHub);
        assert_eq!("gitlab".parse::<Service>().unwrap(), Service::GitLab);
        assert!("bitbucket".parse::<Service>().is_err());
    }
}
