//! The page for editing an existing project.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use maud::html;
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::{Session, current_org_member},
    endpoints,
    html::{PAGE_CONTAINER_STYLE, base},
    ids::ProjectId,
    navigation::NavBar,
    project::{
        core::get_project,
        form::{ProjectFormAction, project_form},
        view::ProjectView,
    },
};

/// The state needed to display the edit project page.
#[derive(Debug, Clone)]
pub struct EditProjectPageState {
    /// The database connection for loading the project.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditProjectPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Display the edit form for one of the organization's projects.
pub async fn get_edit_project_page(
    State(state): State<EditProjectPageState>,
    Path(project_id): Path<ProjectId>,
    Extension(session): Extension<Session>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let member = current_org_member(&session, &connection)?;
    let project = get_project(&member.org_id, &project_id, &connection)?;
    let view = ProjectView::from(&project);

    let nav_bar = NavBar::new(endpoints::PROJECTS_VIEW).into_html();

    let content = html!(
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            h2 class="text-xl font-bold mb-4" { "Edit " (view.name) }

            (project_form(
                ProjectFormAction::Edit {
                    project_id: view.id.clone(),
                },
                Some(&view),
            ))
        }
    );

    Ok(base("Edit Project", &content).into_response())
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Path, State},
        http::StatusCode,
    };
    use rusqlite::Connection;

    use crate::{
        Error,
        auth::{PasswordHash, Session},
        db::initialize,
        organization::test_organization,
        project::test_project,
        user::{NewUser, Role, create_user},
    };

    use super::{EditProjectPageState, get_edit_project_page};

    fn setup() -> (EditProjectPageState, Session, String) {
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
            EditProjectPageState {
                db_connection: Arc::new(Mutex::new(conn)),
            },
            Session {
                user_id: user.id,
            },
            project.id,
        )
    }

    #[tokio::test]
    async fn renders_prefilled_form() {
        let (state, session, project_id) = setup();

        let response = get_edit_project_page(State(state), Path(project_id), Extension(session))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8_lossy(&body);
        assert!(text.contains("Edificio A"));
    }

    #[tokio::test]
    async fn unknown_project_fails_with_not_found() {
        let (state, session, _project_id) = setup();

        let result = get_edit_project_page(
            State(state),
            Path("no-such-project".to_owned()),
            Extension(session),
        )
        .await;

        assert_eq!(result.err(), Some(Error::NotFound));
    }
}
