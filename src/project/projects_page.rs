//! The page listing an organization's projects.

use std::{collections::HashMap, sync::{Arc, Mutex}};

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
        LINK_STYLE, PAGE_CONTAINER_STYLE, STATUS_BADGE_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, format_currency, link,
    },
    navigation::NavBar,
    party::get_clients,
    project::{core::list_projects, view::ProjectView},
};

/// The state needed to display the projects page.
#[derive(Debug, Clone)]
pub struct ProjectsPageState {
    /// The database connection for loading projects.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ProjectsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Display the organization's projects.
pub async fn get_projects_page(
    State(state): State<ProjectsPageState>,
    Extension(session): Extension<Session>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let member = current_org_member(&session, &connection)?;

    let projects = list_projects(&member.org_id, &connection)
        .inspect_err(|error| tracing::error!("could not list projects: {error}"))?;
    let projects: Vec<ProjectView> = projects.iter().map(ProjectView::from).collect();

    let client_names: HashMap<String, String> = get_clients(&member.org_id, &connection)?
        .into_iter()
        .map(|client| (client.id, client.name))
        .collect();

    Ok(projects_view(&projects, &client_names).into_response())
}

fn projects_view(projects: &[ProjectView], client_names: &HashMap<String, String>) -> Markup {
    let nav_bar = NavBar::new(endpoints::PROJECTS_VIEW).into_html();

    let content = html!(
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="flex justify-between items-baseline mb-4"
            {
                h2 class="text-xl font-bold" { "Projects" }

                a href=(endpoints::NEW_PROJECT_VIEW) class=(LINK_STYLE) { "New project" }
            }

            @if projects.is_empty() {
                p
                {
                    "No projects yet. " (link(endpoints::NEW_PROJECT_VIEW, "Create the first one"))
                    " to start tracking income and expenses."
                }
            } @else {
                table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
                {
                    thead class=(TABLE_HEADER_STYLE)
                    {
                        tr
                        {
                            th scope="col" class=(TABLE_CELL_STYLE) { "#" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Name" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Status" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Client" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Budget" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Income" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Expenses" }
                        }
                    }

                    tbody
                    {
                        @for project in projects {
                            tr class=(TABLE_ROW_STYLE)
                            {
                                td class=(TABLE_CELL_STYLE) { (project.number) }
                                td class=(TABLE_CELL_STYLE)
                                {
                                    a
                                        href=(endpoints::format_endpoint(endpoints::PROJECT_VIEW, &project.id))
                                        class=(LINK_STYLE)
                                    {
                                        (project.name)
                                    }
                                }
                                td class=(TABLE_CELL_STYLE)
                                {
                                    span class=(STATUS_BADGE_STYLE) { (project.status.label()) }
                                }
                                td class=(TABLE_CELL_STYLE)
                                {
                                    @match project.client_id.as_ref().and_then(|id| client_names.get(id)) {
                                        Some(name) => { (name) }
                                        None => { "—" }
                                    }
                                }
                                td class=(TABLE_CELL_STYLE) { (format_currency(project.budget)) }
                                td class=(TABLE_CELL_STYLE) { (format_currency(project.total_income)) }
                                td class=(TABLE_CELL_STYLE) { (format_currency(project.total_expense)) }
                            }
                        }
                    }
                }
            }
        }
    );

    base("Projects", &content)
}
