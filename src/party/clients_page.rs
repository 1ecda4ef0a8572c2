//! The page listing an organization's clients.

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
        LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE,
        base,
    },
    navigation::NavBar,
    party::{Party, get_clients},
};

/// The state needed to display the clients page.
#[derive(Debug, Clone)]
pub struct ClientsPageState {
    /// The database connection for loading clients.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ClientsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Display the organization's clients.
pub async fn get_clients_page(
    State(state): State<ClientsPageState>,
    Extension(session): Extension<Session>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let member = current_org_member(&session, &connection)?;
    let clients = get_clients(&member.org_id, &connection)
        .inspect_err(|error| tracing::error!("could not list clients: {error}"))?;

    Ok(clients_view(&clients).into_response())
}

fn clients_view(clients: &[Party]) -> Markup {
    let nav_bar = NavBar::new(endpoints::CLIENTS_VIEW).into_html();

    let content = html!(
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="flex justify-between items-baseline mb-4"
            {
                h2 class="text-xl font-bold" { "Clients" }

                a href=(endpoints::NEW_CLIENT_VIEW) class=(LINK_STYLE) { "New client" }
            }

            @if clients.is_empty() {
                p
                {
                    "No clients yet. Create one to assign it to a project."
                }
            } @else {
                table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
                {
                    thead class=(TABLE_HEADER_STYLE)
                    {
                        tr
                        {
                            th scope="col" class=(TABLE_CELL_STYLE) { "Name" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Email" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Phone" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Address" }
                        }
                    }

                    tbody
                    {
                        @for client in clients {
                            tr class=(TABLE_ROW_STYLE)
                            {
                                td class=(TABLE_CELL_STYLE) { (client.name) }
                                td class=(TABLE_CELL_STYLE) { (client.email.as_deref().unwrap_or("—")) }
                                td class=(TABLE_CELL_STYLE) { (client.phone.as_deref().unwrap_or("—")) }
                                td class=(TABLE_CELL_STYLE) { (client.address.as_deref().unwrap_or("—")) }
                            }
                        }
                    }
                }
            }
        }
    );

    base("Clients", &content)
}
