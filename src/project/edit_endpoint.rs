//! Defines the endpoint for editing an existing project.

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

use crate::{
    AppState,
    auth::{Session, current_org_member},
    endpoints,
    ids::ProjectId,
    project::{
        ProjectUpdate,
        core::{get_project, update_project},
        create_endpoint::ProjectForm,
    },
};

/// The state needed to edit a project.
#[derive(Debug, Clone)]
pub struct EditProjectState {
    /// The database connection for managing projects.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditProjectState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for overwriting a project's editable fields, redirects
/// to the project page on success.
///
/// Only the named fields are written; the running totals and client
/// assignment are untouched.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn edit_project_endpoint(
    State(state): State<EditProjectState>,
    Path(project_id): Path<ProjectId>,
    Extension(session): Extension<Session>,
    Form(form): Form<ProjectForm>,
) -> Response {
    let connection = state
        .db_connection
        .lock()
        .expect("Could not acquire database lock");

    let member = match current_org_member(&session, &connection) {
        Ok(member) => member,
        Err(error) => return error.into_alert_response(),
    };

    // Scope check before the write: the project must be visible to the
    // caller's organization.
    if let Err(error) = get_project(&member.org_id, &project_id, &connection) {
        return error.into_alert_response();
    }

    let update = ProjectUpdate {
        name: form.name.clone(),
        description: form.description.clone(),
        status: form.status,
        location: form.location.clone(),
        geolocation: form.geolocation(),
        est_completion: form.est_completion,
        budget: form.budget,
    };

    if let Err(error) = update_project(&project_id, update, &connection) {
        return error.into_alert_response();
    }

    (
        HxRedirect(endpoints::format_endpoint(
            endpoints::PROJECT_VIEW,
            &project_id,
        )),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::{Path, State}, http::StatusCode};
    use axum_extra::extract::Form;
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        auth::{PasswordHash, Session},
        db::initialize,
        organization::test_organization,
        project::{ProjectStatus, create_endpoint::ProjectForm, get_project, test_project},
        user::{NewUser, Role, create_user},
    };

    use super::{EditProjectState, edit_project_endpoint};

    fn setup() -> (EditProjectState, Session, String, String) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let org = test_organization(&conn);
        let project = test_project(&org.id, &conn);
        let user = create_user(
            NewUser {
                email: "ana@obrador.mx".to_owned(),
                name: "Ana Obrador".to_owned(),
                password_hash: PasswordHash::new_unchecked("$2b$04$notarealhash"),
                role: Role::OrgOwner,
                org_id: Some(org.id.clone()),
            },
            &conn,
        )
        .unwrap();

        (
            EditProjectState {
                db_connection: Arc::new(Mutex::new(conn)),
            },
            Session {
                user_id: user.id,
            },
            org.id,
            project.id,
        )
    }

    fn form() -> ProjectForm {
        ProjectForm {
            name: "Edificio A - Fase 2".to_owned(),
            status: ProjectStatus::Completed,
            location: "Zapopan".to_owned(),
            lat: None,
            lng: None,
            est_completion: date!(2027 - 06 - 30),
            budget: "1750000".parse().unwrap(),
            description: "Ampliación".to_owned(),
        }
    }

    #[tokio::test]
    async fn edits_project_fields() {
        let (state, session, org_id, project_id) = setup();

        let response = edit_project_endpoint(
            State(state.clone()),
            Path(project_id.clone()),
            Extension(session),
            Form(form()),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let connection = state.db_connection.lock().unwrap();
        let project = get_project(&org_id, &project_id, &connection).unwrap();
        assert_eq!(project.name, "Edificio A - Fase 2");
        assert_eq!(project.status, ProjectStatus::Completed);
        assert_eq!(project.geolocation, None);
    }

    #[tokio::test]
    async fn editing_unknown_project_returns_not_found() {
        let (state, session, _org_id, _project_id) = setup();

        let response = edit_project_endpoint(
            State(state),
            Path("no-such-project".to_owned()),
            Extension(session),
            Form(form()),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
