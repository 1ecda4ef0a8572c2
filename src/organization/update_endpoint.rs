//! Defines the endpoint for updating the organization profile.

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

use crate::{
    AppState,
    alert::Alert,
    auth::{Session, current_org_member},
    endpoints,
    organization::{OrganizationUpdate, core::update_organization},
    user::Role,
};

/// The state needed to update the organization.
#[derive(Debug, Clone)]
pub struct UpdateOrganizationState {
    /// The database connection for managing the organization.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for UpdateOrganizationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The form data for updating the organization profile.
#[derive(Debug, Deserialize)]
pub struct OrganizationForm {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// A route handler for updating the organization profile.
///
/// Only the organization owner may update the profile.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn update_organization_endpoint(
    State(state): State<UpdateOrganizationState>,
    Extension(session): Extension<Session>,
    Form(form): Form<OrganizationForm>,
) -> Response {
    let connection = state
        .db_connection
        .lock()
        .expect("Could not acquire database lock");

    let member = match current_org_member(&session, &connection) {
        Ok(member) => member,
        Err(error) => return error.into_alert_response(),
    };

    if member.user.role != Role::OrgOwner {
        return owner_only_response();
    }

    let update = OrganizationUpdate {
        name: form.name,
        email: form.email,
        phone: form.phone.filter(|s| !s.is_empty()),
        address: form.address.filter(|s| !s.is_empty()),
        logo_url: form.logo_url.filter(|s| !s.is_empty()),
        description: form.description.filter(|s| !s.is_empty()),
    };

    if let Err(error) = update_organization(&member.org_id, update, &connection) {
        return error.into_alert_response();
    }

    (
        HxRedirect(endpoints::SETTINGS_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}

pub(super) fn owner_only_response() -> Response {
    (
        StatusCode::FORBIDDEN,
        Alert::error(
            "Owner only",
            "Only the organization owner can change these settings.",
        )
        .into_html(),
    )
        .into_response()
}
