//! Defines the page and endpoint for creating a new party.

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
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState,
    auth::{Session, current_org_member},
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_SELECT_STYLE, FORM_TEXT_INPUT_STYLE,
        PAGE_CONTAINER_STYLE, base, text_input,
    },
    navigation::NavBar,
    notification::create_notification,
    party::{NewParty, PartyKind, core::create_party},
};

/// The state needed to create a party.
#[derive(Debug, Clone)]
pub struct CreatePartyState {
    /// The database connection for managing parties.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreatePartyState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Display the new client form.
pub async fn get_new_client_page() -> Response {
    new_client_view().into_response()
}

fn new_client_view() -> Markup {
    let nav_bar = NavBar::new(endpoints::CLIENTS_VIEW).into_html();

    let content = html!(
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            h2 class="text-xl font-bold mb-4" { "New Client" }

            form
                hx-post=(endpoints::PARTIES_API)
                hx-target-error="#alert-container"
                class="space-y-4 max-w-md"
            {
                (text_input("name", "Name", "text", ""))

                div
                {
                    label for="kind" class=(FORM_LABEL_STYLE) { "Kind" }

                    select name="kind" id="kind" class=(FORM_SELECT_STYLE)
                    {
                        option value="CLIENT" selected { "Client" }
                        option value="VENDOR" { "Vendor" }
                    }
                }

                div
                {
                    label for="email" class=(FORM_LABEL_STYLE) { "Email" }
                    input type="email" name="email" id="email" class=(FORM_TEXT_INPUT_STYLE);
                }

                div
                {
                    label for="phone" class=(FORM_LABEL_STYLE) { "Phone" }
                    input type="text" name="phone" id="phone" class=(FORM_TEXT_INPUT_STYLE);
                }

                div
                {
                    label for="address" class=(FORM_LABEL_STYLE) { "Address" }
                    input type="text" name="address" id="address" class=(FORM_TEXT_INPUT_STYLE);
                }

                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Create client" }
            }
        }
    );

    base("New Client", &content)
}

/// The form data for creating a party.
#[derive(Debug, Deserialize)]
pub struct PartyForm {
    pub name: String,
    pub kind: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

/// A route handler for creating a new party, redirects to the clients view
/// on success.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn create_party_endpoint(
    State(state): State<CreatePartyState>,
    Extension(session): Extension<Session>,
    Form(form): Form<PartyForm>,
) -> Response {
    let connection = state
        .db_connection
        .lock()
        .expect("Could not acquire database lock");

    let member = match current_org_member(&session, &connection) {
        Ok(member) => member,
        Err(error) => return error.into_alert_response(),
    };

    let kind = match form.kind.as_str() {
        "VENDOR" => PartyKind::Vendor,
        _ => PartyKind::Client,
    };

    let party = match create_party(
        NewParty {
            org_id: member.org_id.clone(),
            kind,
            name: form.name,
            email: form.email.filter(|s| !s.is_empty()),
            phone: form.phone.filter(|s| !s.is_empty()),
            address: form.address.filter(|s| !s.is_empty()),
        },
        &connection,
    ) {
        Ok(party) => party,
        Err(error) => return error.into_alert_response(),
    };

    if let Err(error) = create_notification(
        &member.org_id,
        &member.user.id,
        &format!("added the {} {}", kind.as_str().to_lowercase(), party.name),
        &connection,
    ) {
        tracing::warn!("could not record activity for new party: {error}");
    }

    (
        HxRedirect(endpoints::CLIENTS_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State, http::StatusCode};
    use axum_extra::extract::Form;
    use axum_htmx::HX_REDIRECT;
    use rusqlite::Connection;

    use crate::{
        auth::{PasswordHash, Session},
        db::initialize,
        notification::notifications_for_org,
        organization::test_organization,
        party::get_clients,
        user::{NewUser, Role, create_user},
    };

    use super::{CreatePartyState, PartyForm, create_party_endpoint, get_new_client_page};

    fn setup() -> (CreatePartyState, Session, String) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let org = test_organization(&conn);
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
            CreatePartyState {
                db_connection: Arc::new(Mutex::new(conn)),
            },
            Session {
                user_id: user.id,
            },
            org.id,
        )
    }

    #[tokio::test]
    async fn new_client_page_renders() {
        let response = get_new_client_page().await;

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn creates_client_and_records_activity() {
        let (state, session, org_id) = setup();

        let response = create_party_endpoint(
            State(state.clone()),
            Extension(session),
            Form(PartyForm {
                name: "Inmobiliaria Sol".to_owned(),
                kind: "CLIENT".to_owned(),
                email: Some("".to_owned()),
                phone: None,
                address: None,
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert!(response.headers().contains_key(HX_REDIRECT));

        let connection = state.db_connection.lock().unwrap();
        let clients = get_clients(&org_id, &connection).unwrap();
        assert_eq!(clients.len(), 1);
        assert_eq!(clients[0].name, "Inmobiliaria Sol");
        assert_eq!(clients[0].email, None);

        let activity = notifications_for_org(&org_id, 10, &connection).unwrap();
        assert_eq!(activity.len(), 1);
        assert!(activity[0].notification.body.contains("Inmobiliaria Sol"));
    }
}
