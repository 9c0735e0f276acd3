//! Mock implementations of port traits
//!
//! In-memory implementations that record calls and can be configured to
//! fail, so tests can verify behavior without touching the network.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::domain::entities::{ReviewRequest, User};
use crate::domain::ports::{
    parse_document, CommitRef, FileContents, HostingClient, Invitation, MailAgent, MailingList,
    OutboundMessage, RepoScope, Service,
};
use crate::error::{HostingError, MailError, ProviderError};

// ============================================================================
// Mock Hosting Client
// ============================================================================

/// Operations recorded by the mock hosting client, in call order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostingCall {
    ReadFile { path: String },
    WriteFile { path: String, branch: String },
    OpenReview { path: String, source_branch: String },
}

/// A mock hosting client backed by an in-memory file map
#[derive(Debug)]
pub struct MockHostingClient {
    scope: RepoScope,
    pub calls: Arc<RwLock<Vec<HostingCall>>>,
    files: Arc<RwLock<HashMap<String, String>>>,
    fail_reads: Arc<RwLock<bool>>,
    fail_writes: Arc<RwLock<bool>>,
    /// Descriptions passed to opened reviews, latest last.
    pub review_bodies: Arc<RwLock<Vec<String>>>,
    invitations: Arc<RwLock<Vec<Invitation>>>,
    pub accepted_invitations: Arc<RwLock<Vec<i64>>>,
    next_review_id: Arc<RwLock<i64>>,
}

impl MockHostingClient {
    pub fn new(scope: RepoScope) -> Self {
        Self {
            scope,
            calls: Arc::new(RwLock::new(Vec::new())),
            files: Arc::new(RwLock::new(HashMap::new())),
            fail_reads: Arc::new(RwLock::new(false)),
            fail_writes: Arc::new(RwLock::new(false)),
            review_bodies: Arc::new(RwLock::new(Vec::new())),
            invitations: Arc::new(RwLock::new(Vec::new())),
            accepted_invitations: Arc::new(RwLock::new(Vec::new())),
            next_review_id: Arc::new(RwLock::new(1)),
        }
    }

    /// Pre-populate a repository file
    pub fn with_file(self, path: &str, raw: &str) -> Self {
        {
            let mut files = self.files.write().unwrap();
            files.insert(path.to_string(), raw.to_string());
        }
        self
    }

    /// Pre-populate a pending invitation
    pub fn with_invitation(self, id: i64, repository: &str) -> Self {
        {
            let mut invitations = self.invitations.write().unwrap();
            invitations.push(Invitation {
                id,
                repository: repository.to_string(),
            });
        }
        self
    }

    /// Every read fails with a provider 500
    pub fn failing_reads(self) -> Self {
        *self.fail_reads.write().unwrap() = true;
        self
    }

    /// Every write (and review sequence) fails with a provider 500
    pub fn failing_writes(self) -> Self {
        *self.fail_writes.write().unwrap() = true;
        self
    }
}

#[async_trait]
impl HostingClient for MockHostingClient {
    fn scope(&self) -> &RepoScope {
        &self.scope
    }

    async fn read_file_full(
        &self,
        path: &str,
        _ref_name: Option<&str>,
    ) -> Result<FileContents, HostingError> {
        self.calls.write().unwrap().push(HostingCall::ReadFile {
            path: path.to_string(),
        });

        if *self.fail_reads.read().unwrap() {
            return Err(HostingError::Read {
                path: path.to_string(),
                source: ProviderError::Api {
                    status: 500,
                    message: "Mock failure".to_string(),
                },
            });
        }

        let raw = self.files.read().unwrap().get(path).cloned();
        let Some(raw) = raw else {
            return Err(HostingError::Read {
                path: path.to_string(),
                source: ProviderError::Api {
                    status: 404,
                    message: "Not Found".to_string(),
                },
            });
        };

        let parsed = parse_document(path, &raw)?;
        Ok(FileContents { parsed, raw })
    }

    async fn write_file(
        &self,
        path: &str,
        content: &str,
        branch: Option<&str>,
        _commit_message: Option<&str>,
    ) -> Result<CommitRef, HostingError> {
        let branch = branch.unwrap_or(&self.scope.branch).to_string();
        self.calls.write().unwrap().push(HostingCall::WriteFile {
            path: path.to_string(),
            branch: branch.clone(),
        });

        if *self.fail_writes.read().unwrap() {
            return Err(HostingError::Write {
                path: path.to_string(),
                source: ProviderError::Api {
                    status: 500,
                    message: "Mock failure".to_string(),
                },
            });
        }

        self.files
            .write()
            .unwrap()
            .insert(path.to_string(), content.to_string());

        Ok(CommitRef {
            path: path.to_string(),
            branch,
            sha: Some("abc123".to_string()),
        })
    }

    async fn write_file_and_open_review(
        &self,
        path: &str,
        content: &str,
        new_branch: &str,
        _commit_title: &str,
        commit_body: &str,
    ) -> Result<ReviewRequest, HostingError> {
        self.calls.write().unwrap().push(HostingCall::OpenReview {
            path: path.to_string(),
            source_branch: new_branch.to_string(),
        });

        if *self.fail_writes.read().unwrap() {
            return Err(HostingError::CreateReview {
                source: ProviderError::Api {
                    status: 500,
                    message: "Mock failure".to_string(),
                },
            });
        }

        self.files
            .write()
            .unwrap()
            .insert(path.to_string(), content.to_string());
        self.review_bodies
            .write()
            .unwrap()
            .push(commit_body.to_string());

        let id = {
            let mut next = self.next_review_id.write().unwrap();
            let current = *next;
            *next += 1;
            current
        };

        Ok(ReviewRequest {
            id,
            source_branch: new_branch.to_string(),
            target_branch: self.scope.branch.clone(),
        })
    }

    async fn get_current_user(&self) -> Result<User, HostingError> {
        Ok(User::new(
            Service::GitHub,
            "staticpost-bot",
            Some("bot@staticpost.local"),
            Some("Staticpost Bot"),
        ))
    }

    async fn list_pending_invitations(&self) -> Result<Vec<Invitation>, HostingError> {
        Ok(self.invitations.read().unwrap().clone())
    }

    async fn accept_invitation(&self, invitation_id: i64) -> Result<(), HostingError> {
        self.accepted_invitations
            .write()
            .unwrap()
            .push(invitation_id);
        Ok(())
    }
}

// ============================================================================
// Mock Mail Agent
// ============================================================================

/// A mock mail agent tracking lists, members and sent messages
pub struct MockMailAgent {
    domain: String,
    /// List address -> members
    lists: Arc<RwLock<HashMap<String, Vec<String>>>>,
    created: Arc<RwLock<Vec<String>>>,
    messages: Arc<RwLock<Vec<OutboundMessage>>>,
    should_fail: Arc<RwLock<bool>>,
}

impl MockMailAgent {
    pub fn new(domain: &str) -> Self {
        Self {
            domain: domain.to_string(),
            lists: Arc::new(RwLock::new(HashMap::new())),
            created: Arc::new(RwLock::new(Vec::new())),
            messages: Arc::new(RwLock::new(Vec::new())),
            should_fail: Arc::new(RwLock::new(false)),
        }
    }

    /// Every operation fails with a provider 500
    pub fn failing(self) -> Self {
        *self.should_fail.write().unwrap() = true;
        self
    }

    pub fn set_failing(&self, failing: bool) {
        *self.should_fail.write().unwrap() = failing;
    }

    pub fn sent(&self) -> Vec<OutboundMessage> {
        self.messages.read().unwrap().clone()
    }

    pub fn list_count(&self) -> usize {
        self.lists.read().unwrap().len()
    }

    pub fn members_of(&self, address: &str) -> Vec<String> {
        self.lists
            .read()
            .unwrap()
            .get(address)
            .cloned()
            .unwrap_or_default()
    }

    pub fn created_lists(&self) -> Vec<String> {
        self.created.read().unwrap().clone()
    }

    fn fail(&self) -> Result<(), MailError> {
        if *self.should_fail.read().unwrap() {
            Err(MailError::Api {
                status: 500,
                message: "Mock failure".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl MailAgent for MockMailAgent {
    fn domain(&self) -> &str {
        &self.domain
    }

    async fn get_list(&self, address: &str) -> Result<Option<MailingList>, MailError> {
        self.fail()?;
        Ok(self
            .lists
            .read()
            .unwrap()
            .contains_key(address)
            .then(|| MailingList {
                address: address.to_string(),
            }))
    }

    async fn create_list(&self, address: &str) -> Result<(), MailError> {
        self.fail()?;
        self.created.write().unwrap().push(address.to_string());
        // Creating an existing list is a no-op success
        self.lists
            .write()
            .unwrap()
            .entry(address.to_string())
            .or_default();
        Ok(())
    }

    async fn add_member(&self, list_address: &str, email: &str) -> Result<(), MailError> {
        self.fail()?;
        let mut lists = self.lists.write().unwrap();
        let Some(members) = lists.get_mut(list_address) else {
            return Err(MailError::Api {
                status: 404,
                message: format!("List '{}' not found", list_address),
            });
        };
        // Upsert semantics
        if !members.iter().any(|m| m == email) {
            members.push(email.to_string());
        }
        Ok(())
    }

    async fn send_message(&self, message: &OutboundMessage) -> Result<(), MailError> {
        self.fail()?;
        self.messages.write().unwrap().push(message.clone());
        Ok(())
    }
}
