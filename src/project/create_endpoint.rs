//! Defines the endpoint for creating a new project.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
// Must use axum_extra's Form since that parses an empty string as None instead
// of crashing like axum::Form.
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use rusqlite::Connection;
use serde::Deserialize;
use time::Date;

use crate::{
    AppState,
    auth::{Session, current_org_member},
    endpoints,
    money::Money,
    notification::create_notification,
    project::{
        GeoPoint, NewProject, ProjectStatus,
        core::{create_project, next_project_number},
    },
};

/// The state needed to create a project.
#[derive(Debug, Clone)]
pub struct CreateProjectState {
    /// The database connection for managing projects.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateProjectState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The form data for creating or editing a project.
#[derive(Debug, Deserialize)]
pub struct ProjectForm {
    pub name: String,
    pub status: ProjectStatus,
    pub location: String,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
    pub est_completion: Date,
    /// Parsed as an exact decimal, never a float.
    pub budget: Money,
    pub description: String,
}

impl ProjectForm {
    /// The map pin, present only when both coordinates were submitted.
    pub fn geolocation(&self) -> Option<GeoPoint> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Some(GeoPoint { lat, lng }),
            _ => None,
        }
    }
}

/// A route handler for creating a new project, redirects to the project
/// page on success.
///
/// The project number is read and assigned here, outside any lock: two
/// requests landing together can both observe the same maximum and create
/// projects sharing a number.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn create_project_endpoint(
    State(state): State<CreateProjectState>,
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

    let number = match next_project_number(&member.org_id, &connection) {
        Ok(number) => number,
        Err(error) => return error.into_alert_response(),
    };

    let project = match create_project(
        NewProject {
            org_id: member.org_id.clone(),
            number,
            name: form.name.clone(),
            description: form.description.clone(),
            status: form.status,
            location: form.location.clone(),
            geolocation: form.geolocation(),
            est_completion: form.est_completion,
            budget: form.budget,
        },
        &connection,
    ) {
        Ok(project) => project,
        Err(error) => return error.into_alert_response(),
    };

    if let Err(error) = create_notification(
        &member.org_id,
        &member.user.id,
        &format!("created the project {}", project.name),
        &connection,
    ) {
        tracing::warn!("could not record activity for new project: {error}");
    }

    (
        HxRedirect(endpoints::format_endpoint(
            endpoints::PROJECT_VIEW,
            &project.id,
        )),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}
