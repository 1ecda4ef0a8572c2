//! The page for creating a new project.

use axum::response::{IntoResponse, Response};
use maud::html;

use crate::{
    endpoints,
    html::{PAGE_CONTAINER_STYLE, base},
    navigation::NavBar,
    project::form::{ProjectFormAction, project_form},
};

/// Display the new project form.
pub async fn get_new_project_page() -> Response {
    let nav_bar = NavBar::new(endpoints::PROJECTS_VIEW).into_html();

    let content = html!(
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            h2 class="text-xl font-bold mb-4" { "New Project" }

            (project_form(ProjectFormAction::Create, None))
        }
    );

    base("New Project", &content).into_response()
}
