//! Defines the endpoint for deleting the organization and all of its data.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use rusqlite::Connection;

use crate::{
    AppState,
    auth::{Session, cookie::invalidate_auth_cookie, current_org_member},
    endpoints,
    organization::{core::delete_organization, update_endpoint::owner_only_response},
    user::Role,
};

/// The state needed to delete the organization.
#[derive(Clone)]
pub struct DeleteOrganizationState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The database connection for managing the organization.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteOrganizationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<DeleteOrganizationState> for Key {
    fn from_ref(state: &DeleteOrganizationState) -> Self {
        state.cookie_key.clone()
    }
}

/// A route handler for deleting the organization.
///
/// The delete cascades to every child record, including the acting user, so
/// the auth cookie is invalidated and the client is sent to the sign-up
/// page.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn delete_organization_endpoint(
    State(state): State<DeleteOrganizationState>,
    Extension(session): Extension<Session>,
    jar: PrivateCookieJar,
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

    if let Err(error) = delete_organization(&member.org_id, &connection) {
        return error.into_alert_response();
    }

    tracing::info!(
        "organization {} deleted by {}",
        member.org_id,
        member.user.email
    );

    (
        invalidate_auth_cookie(jar),
        HxRedirect(endpoints::REGISTER_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}
