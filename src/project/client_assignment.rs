//! Defines the endpoints for assigning and removing a project's client.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
// Must use axum_extra's Form since that parses an empty string as None instead
// of crashing like axum::Form.
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState,
    auth::{OrgMember, Session, current_org_member},
    endpoints,
    ids::{PartyId, ProjectId},
    notification::create_notification,
    project::core::{assign_client, get_project, remove_client},
};

/// The state needed to change a project's client assignment.
#[derive(Debug, Clone)]
pub struct ClientAssignmentState {
    /// The database connection for managing projects.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ClientAssignmentState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The form data for assigning a client.
#[derive(Debug, Deserialize)]
pub struct AssignClientForm {
    pub client_id: PartyId,
}

fn authorize(
    session: &Session,
    project_id: &ProjectId,
    connection: &Connection,
) -> Result<OrgMember, Response> {
    let member =
        current_org_member(session, connection).map_err(|error| error.into_alert_response())?;

    get_project(&member.org_id, project_id, connection)
        .map_err(|error| error.into_alert_response())?;

    Ok(member)
}

fn redirect_to_project(project_id: &ProjectId) -> Response {
    (
        HxRedirect(endpoints::format_endpoint(
            endpoints::PROJECT_VIEW,
            project_id,
        )),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}

/// A route handler for assigning a client to a project.
///
/// The party must be a client of the caller's organization; cross-org
/// assignment is rejected before any write.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn assign_client_endpoint(
    State(state): State<ClientAssignmentState>,
    Path(project_id): Path<ProjectId>,
    Extension(session): Extension<Session>,
    Form(form): Form<AssignClientForm>,
) -> Response {
    let connection = state
        .db_connection
        .lock()
        .expect("Could not acquire database lock");

    let member = match authorize(&session, &project_id, &connection) {
        Ok(member) => member,
        Err(response) => return response,
    };

    let assigned = match assign_client(&project_id, &form.client_id, &connection) {
        Ok(assigned) => assigned,
        Err(error) => return error.into_alert_response(),
    };

    if let Err(error) = create_notification(
        &member.org_id,
        &member.user.id,
        &format!("assigned a client to {}", assigned.project.name),
        &connection,
    ) {
        tracing::warn!("could not record activity for client assignment: {error}");
    }

    redirect_to_project(&project_id)
}

/// A route handler for clearing a project's client assignment.
///
/// Idempotent: removing an already clear assignment succeeds.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn remove_client_endpoint(
    State(state): State<ClientAssignmentState>,
    Path(project_id): Path<ProjectId>,
    Extension(session): Extension<Session>,
) -> Response {
    let connection = state
        .db_connection
        .lock()
        .expect("Could not acquire database lock");

    let member = match authorize(&session, &project_id, &connection) {
        Ok(member) => member,
        Err(response) => return response,
    };

    let removed = match remove_client(&project_id, &connection) {
        Ok(removed) => removed,
        Err(error) => return error.into_alert_response(),
    };

    if let Err(error) = create_notification(
        &member.org_id,
        &member.user.id,
        &format!("removed the client from {}", removed.project.name),
        &connection,
    ) {
        tracing::warn!("could not record activity for client removal: {error}");
    }

    redirect_to_project(&project_id)
}
