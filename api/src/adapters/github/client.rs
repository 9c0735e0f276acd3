//! GitHub API client implementation

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::adapters::decode_file_content;
use crate::domain::entities::{ReviewRequest, User};
use crate::domain::ports::{
    parse_document, CommitRef, Credential, FileContents, HostingClient, Invitation, RepoScope,
    Service, DEFAULT_COMMIT_MESSAGE,
};
use crate::error::{HostingError, ProviderError};

/// `HostingClient` over the GitHub REST v3 API
#[derive(Debug)]
pub struct GitHubClient {
    http: Client,
    base_url: String,
    scope: RepoScope,
    credential: Credential,
}

impl GitHubClient {
    pub fn new(base_url: String, scope: RepoScope, credential: Credential) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            scope,
            credential,
        }
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn repo_url(&self, rest: &str) -> String {
        self.api_url(&format!(
            "/repos/{}/{}{}",
            self.scope.username, self.scope.repository, rest
        ))
    }

    /// GitHub takes personal and OAuth tokens through the same header.
    fn auth_header(&self) -> String {
        format!("token {}", self.credential.token())
    }

    async fn handle_response<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ProviderError> {
        let status = response.status();

        if status.is_success() {
            response
                .json()
                .await
                .map_err(|e| ProviderError::Deserialization(e.to_string()))
        } else if status.as_u16() == 401 {
            Err(ProviderError::Unauthorized)
        } else {
            let message = response.text().await.unwrap_or_default();
            Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }

    async fn handle_empty_response(
        &self,
        response: reqwest::Response,
    ) -> Result<(), ProviderError> {
        let status = response.status();

        if status.is_success() {
            Ok(())
        } else if status.as_u16() == 401 {
            Err(ProviderError::Unauthorized)
        } else {
            let message = response.text().await.unwrap_or_default();
            Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }

    async fn fetch_raw_file(&self, path: &str, ref_name: &str) -> Result<String, ProviderError> {
        let resp = self
            .http
            .get(self.repo_url(&format!("/contents/{}", path)))
            .query(&[("ref", ref_name)])
            .header("Authorization", self.auth_header())
            .send()
            .await?;

        let contents: ContentsResponse = self.handle_response(resp).await?;
        decode_file_content(&contents.content)
    }

    async fn put_contents(
        &self,
        path: &str,
        content: &str,
        branch: &str,
        message: &str,
    ) -> Result<Option<String>, ProviderError> {
        use base64::Engine;
        let encoded = base64::engine::general_purpose::STANDARD.encode(content);

        let resp = self
            .http
            .put(self.repo_url(&format!("/contents/{}", path)))
            .header("Authorization", self.auth_header())
            .json(&PutContentsRequest {
                message,
                content: &encoded,
                branch,
            })
            .send()
            .await?;

        let created: PutContentsResponse = self.handle_response(resp).await?;
        Ok(created.commit.map(|c| c.sha))
    }

    async fn branch_head_sha(&self, branch: &str) -> Result<String, ProviderError> {
        let resp = self
            .http
            .get(self.repo_url(&format!("/branches/{}", branch)))
            .header("Authorization", self.auth_header())
            .send()
            .await?;

        let branch: BranchResponse = self.handle_response(resp).await?;
        Ok(branch.commit.sha)
    }

    async fn create_branch(&self, name: &str, sha: &str) -> Result<(), ProviderError> {
        let resp = self
            .http
            .post(self.repo_url("/git/refs"))
            .header("Authorization", self.auth_header())
            .json(&CreateRefRequest {
                ref_name: &format!("refs/heads/{}", name),
                sha,
            })
            .send()
            .await?;

        self.handle_empty_response(resp).await
    }

    async fn open_pull_request(
        &self,
        title: &str,
        body: &str,
        head: &str,
        base: &str,
    ) -> Result<i64, ProviderError> {
        let resp = self
            .http
            .post(self.repo_url("/pulls"))
            .header("Authorization", self.auth_header())
            .json(&CreatePullRequest {
                title,
                body,
                head,
                base,
            })
            .send()
            .await?;

        let pull: PullResponse = self.handle_response(resp).await?;
        Ok(pull.number)
    }
}

/// Request types for the GitHub API
#[derive(Serialize)]
struct PutContentsRequest<'a> {
    message: &'a str,
    content: &'a str,
    branch: &'a str,
}

#[derive(Serialize)]
struct CreateRefRequest<'a> {
    #[serde(rename = "ref")]
    ref_name: &'a str,
    sha: &'a str,
}

#[derive(Serialize)]
struct CreatePullRequest<'a> {
    title: &'a str,
    body: &'a str,
    head: &'a str,
    base: &'a str,
}

/// Response types from the GitHub API
#[derive(Deserialize)]
struct ContentsResponse {
    content: String,
}

#[derive(Deserialize)]
struct PutContentsResponse {
    #[serde(default)]
    commit: Option<CommitResponse>,
}

#[derive(Deserialize)]
struct CommitResponse {
    sha: String,
}

#[derive(Deserialize)]
struct BranchResponse {
    commit: CommitResponse,
}

#[derive(Deserialize)]
struct PullResponse {
    number: i64,
}

#[derive(Deserialize)]
struct UserResponse {
    login: String,
    email: Option<String>,
    name: Option<String>,
}

#[derive(Deserialize)]
struct InvitationResponse {
    id: i64,
    repository: InvitationRepository,
}

#[derive(Deserialize)]
struct InvitationRepository {
    full_name: String,
}

#[async_trait]
impl HostingClient for GitHubClient {
    fn scope(&self) -> &RepoScope {
        &self.scope
    }

    async fn read_file_full(
        &self,
        path: &str,
        ref_name: Option<&str>,
    ) -> Result<FileContents, HostingError> {
        let ref_name = ref_name.unwrap_or(&self.scope.branch);
        let raw = self
            .fetch_raw_file(path, ref_name)
            .await
            .map_err(|source| HostingError::Read {
                path: path.to_string(),
                source,
            })?;

        let parsed = parse_document(path, &raw)?;
        Ok(FileContents { parsed, raw })
    }

    async fn write_file(
        &self,
        path: &str,
        content: &str,
        branch: Option<&str>,
        commit_message: Option<&str>,
    ) -> Result<CommitRef, HostingError> {
        let branch = branch.unwrap_or(&self.scope.branch);
        let message = commit_message.unwrap_or(DEFAULT_COMMIT_MESSAGE);

        let sha = self
            .put_contents(path, content, branch, message)
            .await
            .map_err(|source| HostingError::Write {
                path: path.to_string(),
                source,
            })?;

        Ok(CommitRef {
            path: path.to_string(),
            branch: branch.to_string(),
            sha,
        })
    }

    async fn write_file_and_open_review(
        &self,
        path: &str,
        content: &str,
        new_branch: &str,
        commit_title: &str,
        commit_body: &str,
    ) -> Result<ReviewRequest, HostingError> {
        let base = self.scope.branch.clone();

        // Four steps, each depending on the previous one's result. The
        // first failure aborts the rest; an already-created branch is left
        // behind (inert, collectable by the repository owner).
        let sha = self
            .branch_head_sha(&base)
            .await
            .map_err(|source| HostingError::CreateReview { source })?;

        self.create_branch(new_branch, &sha)
            .await
            .map_err(|source| HostingError::CreateReview { source })?;

        self.put_contents(path, content, new_branch, commit_title)
            .await
            .map_err(|source| HostingError::CreateReview { source })?;

        let number = self
            .open_pull_request(commit_title, commit_body, new_branch, &base)
            .await
            .map_err(|source| HostingError::CreateReview { source })?;

        Ok(ReviewRequest {
            id: number,
            source_branch: new_branch.to_string(),
            target_branch: base,
        })
    }

    async fn get_current_user(&self) -> Result<User, HostingError> {
        let resp = self
            .http
            .get(self.api_url("/user"))
            .header("Authorization", self.auth_header())
            .send()
            .await
            .map_err(|e| HostingError::GetUser { source: e.into() })?;

        let user: UserResponse = self
            .handle_response(resp)
            .await
            .map_err(|source| HostingError::GetUser { source })?;

        Ok(User::new(
            Service::GitHub,
            &user.login,
            user.email.as_deref(),
            user.name.as_deref(),
        ))
    }

    async fn list_pending_invitations(&self) -> Result<Vec<Invitation>, HostingError> {
        let resp = self
            .http
            .get(self.api_url("/user/repository_invitations"))
            .header("Authorization", self.auth_header())
            .send()
            .await
            .map_err(|e| HostingError::Invitation { source: e.into() })?;

        let invitations: Vec<InvitationResponse> = self
            .handle_response(resp)
            .await
            .map_err(|source| HostingError::Invitation { source })?;

        Ok(invitations
            .into_iter()
            .map(|i| Invitation {
                id: i.id,
                repository: i.repository.full_name,
            })
            .collect())
    }

    async fn accept_invitation(&self, invitation_id: i64) -> Result<(), HostingError> {
        let resp = self
            .http
            .patch(self.api_url(&format!("/user/repository_invitations/{}", invitation_id)))
            .header("Authorization", self.auth_header())
            .send()
            .await
            .map_err(|e| HostingError::Invitation { source: e.into() })?;

        self.handle_empty_response(resp)
            .await
            .map_err(|source| HostingError::Invitation { source })
    }
}
