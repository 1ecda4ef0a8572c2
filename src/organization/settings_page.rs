//! The organization settings page: profile form plus the danger zone.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::{Session, current_org_member},
    endpoints,
    html::{
        BUTTON_DANGER_STYLE, BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        PAGE_CONTAINER_STYLE, base, text_input,
    },
    navigation::NavBar,
    organization::{Organization, get_organization},
};

/// The state needed to display the settings page.
#[derive(Debug, Clone)]
pub struct SettingsPageState {
    /// The database connection for loading the organization.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for SettingsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Display the organization settings page.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn get_settings_page(
    State(state): State<SettingsPageState>,
    Extension(session): Extension<Session>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let member = current_org_member(&session, &connection)?;
    let organization = get_organization(&member.org_id, &connection)?;

    Ok(settings_view(&organization).into_response())
}

fn optional_text_input(name: &str, label: &str, value: Option<&str>) -> Markup {
    html! {
        div
        {
            label for=(name) class=(FORM_LABEL_STYLE) { (label) }

            input
                type="text"
                name=(name)
                id=(name)
                value=(value.unwrap_or(""))
                class=(FORM_TEXT_INPUT_STYLE);
        }
    }
}

fn settings_view(organization: &Organization) -> Markup {
    let nav_bar = NavBar::new(endpoints::SETTINGS_VIEW).into_html();

    let content = html!(
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            h2 class="text-xl font-bold mb-4" { "Organization" }

            form
                hx-put=(endpoints::ORGANIZATION_API)
                hx-target-error="#alert-container"
                class="space-y-4 max-w-md"
            {
                (text_input("name", "Name", "text", &organization.name))
                (text_input("email", "Email", "email", &organization.email))
                (optional_text_input("phone", "Phone", organization.phone.as_deref()))
                (optional_text_input("address", "Address", organization.address.as_deref()))
                (optional_text_input("logo_url", "Logo URL", organization.logo_url.as_deref()))

                div
                {
                    label for="description" class=(FORM_LABEL_STYLE) { "About" }

                    textarea
                        name="description"
                        id="description"
                        rows="4"
                        class=(FORM_TEXT_INPUT_STYLE)
                    {
                        (organization.description.as_deref().unwrap_or(""))
                    }
                }

                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Save" }
            }

            div class="mt-12 max-w-md"
            {
                h3 class="text-lg font-semibold text-red-600 mb-2" { "Danger zone" }

                p class="text-sm text-gray-600 dark:text-gray-400 mb-4"
                {
                    "Deleting the organization removes every project, client,
                    transaction, and attachment. This cannot be undone."
                }

                button
                    hx-delete=(endpoints::ORGANIZATION_API)
                    hx-confirm="Delete this organization and all of its data?"
                    hx-target-error="#alert-container"
                    class=(BUTTON_DANGER_STYLE)
                {
                    "Delete organization"
                }
            }
        }
    );

    base("Settings", &content)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State, http::StatusCode};
    use rusqlite::Connection;
    use scraper::{Html, Selector};

    use crate::{
        auth::{PasswordHash, Session},
        db::initialize,
        organization::test_organization,
        user::{NewUser, Role, create_user},
    };

    use super::{SettingsPageState, get_settings_page};

    #[tokio::test]
    async fn settings_page_shows_organization_profile() {
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

        let state = SettingsPageState {
            db_connection: Arc::new(Mutex::new(conn)),
        };

        let response = get_settings_page(
            State(state),
            Extension(Session {
                user_id: user.id,
            }),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let html = Html::parse_document(&String::from_utf8_lossy(&body));
        let name_input = Selector::parse("input[name='name']").unwrap();
        let value = html
            .select(&name_input)
            .next()
            .unwrap()
            .value()
            .attr("value")
            .unwrap();
        assert_eq!(value, "Constructora Jalisco");
    }
}
