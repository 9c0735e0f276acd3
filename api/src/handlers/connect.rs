//! Repository connect handler
//!
//! A site owner invites the service account as a collaborator, then hits
//! this endpoint to make the service accept the invitation.

use axum::extract::{Path, State};

use crate::adapters;
use crate::domain::ports::{RepoScope, Service};
use crate::error::AppError;
use crate::AppState;

/// GET /v1/connect/:service/:username/:repository
///
/// Accept the pending collaboration invitation for the repository.
pub async fn connect(
    State(state): State<AppState>,
    Path((service, username, repository)): Path<(String, String, String)>,
) -> Result<String, AppError> {
    let service: Service = service
        .parse()
        .map_err(|e: String| AppError::BadRequest(e))?;

    // Branch is irrelevant for the invitation flow
    let scope = RepoScope::new(&username, &repository, "main");
    let full_name = scope.full_name();
    let hosting = adapters::hosting_client(service, scope, None, &state.config)?;

    let invitations = hosting.list_pending_invitations().await?;
    let Some(invitation) = invitations.iter().find(|i| i.repository == full_name) else {
        return Err(AppError::NotFound("Invitation not found".to_string()));
    };

    hosting.accept_invitation(invitation.id).await?;

    let user = hosting.get_current_user().await?;
    tracing::info!(
        repo = %full_name,
        user = %user.login,
        "Collaboration invitation accepted"
    );

    Ok("OK!".to_string())
}
