//! GitLab API client implementation

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use urlencoding::encode;

use crate::adapters::decode_file_content;
use crate::domain::entities::{ReviewRequest, User};
use crate::domain::ports::{
    parse_document, CommitRef, Credential, FileContents, HostingClient, Invitation, RepoScope,
    Service, DEFAULT_COMMIT_MESSAGE,
};
use crate::error::{HostingError, ProviderError};

/// `HostingClient` over the GitLab v4 API
#[derive(Debug)]
pub struct GitLabClient {
    http: Client,
    base_url: String,
    scope: RepoScope,
    credential: Credential,
}

impl GitLabClient {
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

    /// URL-encoded `owner/repository` project id.
    fn project_id(&self) -> String {
        encode(&format!("{}/{}", self.scope.username, self.scope.repository)).into_owned()
    }

    fn project_url(&self, rest: &str) -> String {
        self.api_url(&format!("/projects/{}{}", self.project_id(), rest))
    }

    /// GitLab distinguishes the two credential kinds: personal tokens go
    /// through `PRIVATE-TOKEN`, OAuth tokens through a bearer header.
    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.credential {
            Credential::Personal(token) => request.header("PRIVATE-TOKEN", token),
            Credential::OAuth(token) => {
                request.header("Authorization", format!("Bearer {}", token))
            }
        }
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
            .authorize(
                self.http
                    .get(self.project_url(&format!("/repository/files/{}", encode(path))))
                    .query(&[("ref", ref_name)]),
            )
            .send()
            .await?;

        let file: FileResponse = self.handle_response(resp).await?;
        decode_file_content(&file.content)
    }

    async fn create_file(
        &self,
        path: &str,
        content: &str,
        branch: &str,
        message: &str,
    ) -> Result<(), ProviderError> {
        use base64::Engine;
        let encoded = base64::engine::general_purpose::STANDARD.encode(content);

        let resp = self
            .authorize(
                self.http
                    .post(self.project_url(&format!("/repository/files/{}", encode(path))))
                    .json(&CreateFileRequest {
                        branch,
                        content: &encoded,
                        commit_message: message,
                        encoding: "base64",
                    }),
            )
            .send()
            .await?;

        self.handle_empty_response(resp).await
    }

    async fn branch_head_sha(&self, branch: &str) -> Result<String, ProviderError> {
        let resp = self
            .authorize(
                self.http
                    .get(self.project_url(&format!("/repository/branches/{}", encode(branch)))),
            )
            .send()
            .await?;

        let branch: BranchResponse = self.handle_response(resp).await?;
        Ok(branch.commit.id)
    }

    async fn create_branch(&self, name: &str, ref_sha: &str) -> Result<(), ProviderError> {
        let resp = self
            .authorize(
                self.http
                    .post(self.project_url("/repository/branches"))
                    .json(&CreateBranchRequest {
                        branch: name,
                        ref_name: ref_sha,
                    }),
            )
            .send()
            .await?;

        self.handle_empty_response(resp).await
    }

    async fn open_merge_request(
        &self,
        title: &str,
        description: &str,
        source_branch: &str,
        target_branch: &str,
    ) -> Result<i64, ProviderError> {
        let resp = self
            .authorize(self.http.post(self.project_url("/merge_requests")).json(
                &CreateMergeRequest {
                    source_branch,
                    target_branch,
                    title,
                    description,
                    remove_source_branch: true,
                },
            ))
            .send()
            .await?;

        let merge_request: MergeRequestResponse = self.handle_response(resp).await?;
        Ok(merge_request.iid)
    }
}

/// Request types for the GitLab API
#[derive(Serialize)]
struct CreateFileRequest<'a> {
    branch: &'a str,
    content: &'a str,
    commit_message: &'a str,
    encoding: &'a str,
}

#[derive(Serialize)]
struct CreateBranchRequest<'a> {
    branch: &'a str,
    #[serde(rename = "ref")]
    ref_name: &'a str,
}

#[derive(Serialize)]
struct CreateMergeRequest<'a> {
    source_branch: &'a str,
    target_branch: &'a str,
    title: &'a str,
    description: &'a str,
    remove_source_branch: bool,
}

/// Response types from the GitLab API
#[derive(Deserialize)]
struct FileResponse {
    content: String,
}

#[derive(Deserialize)]
struct BranchResponse {
    commit: CommitResponse,
}

#[derive(Deserialize)]
struct CommitResponse {
    id: String,
}

#[derive(Deserialize)]
struct MergeRequestResponse {
    iid: i64,
}

#[derive(Deserialize)]
struct UserResponse {
    username: String,
    email: Option<String>,
    name: Option<String>,
}

#[async_trait]
impl HostingClient for GitLabClient {
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

        self.create_file(path, content, branch, message)
            .await
            .map_err(|source| HostingError::Write {
                path: path.to_string(),
                source,
            })?;

        // GitLab's file API does not return the commit sha
        Ok(CommitRef {
            path: path.to_string(),
            branch: branch.to_string(),
            sha: None,
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

        let sha = self
            .branch_head_sha(&base)
            .await
            .map_err(|source| HostingError::CreateReview { source })?;

        self.create_branch(new_branch, &sha)
            .await
            .map_err(|source| HostingError::CreateReview { source })?;

        self.create_file(path, content, new_branch, commit_title)
            .await
            .map_err(|source| HostingError::CreateReview { source })?;

        let iid = self
            .open_merge_request(commit_title, commit_body, new_branch, &base)
            .await
            .map_err(|source| HostingError::CreateReview { source })?;

        Ok(ReviewRequest {
            id: iid,
            source_branch: new_branch.to_string(),
            target_branch: base,
        })
    }

    async fn get_current_user(&self) -> Result<User, HostingError> {
        let resp = self
            .authorize(self.http.get(self.api_url("/user")))
            .send()
            .await
            .map_err(|e| HostingError::GetUser { source: e.into() })?;

        let user: UserResponse = self
            .handle_response(resp)
            .await
            .map_err(|source| HostingError::GetUser { source })?;

        Ok(User::new(
            Service::GitLab,
            &user.username,
            user.email.as_deref(),
            user.name.as_deref(),
        ))
    }

    // GitLab has no repository-invitation API; the connect flow is a
    // GitHub feature and says so instead of pretending to succeed.

    async fn list_pending_invitations(&self) -> Result<Vec<Invitation>, HostingError> {
        Err(HostingError::Invitation {
            source: ProviderError::Api {
                status: 501,
                message: "the GitLab API does not expose repository collaboration invitations"
                    .to_string(),
            },
        })
    }

    async fn accept_invitation(&self, _invitation_id: i64) -> Result<(), HostingError> {
        Err(HostingError::Invitation {
            source: ProviderError::Api {
                status: 501,
                message: "the GitLab API does not expose repository collaboration invitations"
                    .to_string(),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_id_is_url_encoded() {
        let client = GitLabClient::new(
            "https://gitlab.com/api/v4".to_string(),
            RepoScope::new("johndoe", "foobar", "master"),
            Credential::Personal("t".to_string()),
        );
        assert_eq!(client.project_id(), "johndoe%2Ffoobar");
    }

    #[test]
    fn file_paths_keep_their_project_prefix() {
        let client = GitLabClient::new(
            "https://gitlab.com/api/v4/".to_string(),
            RepoScope::new("johndoe", "foobar", "master"),
            Credential::Personal("t".to_string()),
        );
        assert_eq!(
            client.project_url(&format!("/repository/files/{}", encode("path/to/file.yml"))),
            "https://gitlab.com/api/v4/projects/johndoe%2Ffoobar/repository/files/path%2Fto%2Ffile.yml"
        );
    }
}
