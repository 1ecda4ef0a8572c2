//! The project form shared by the create and edit pages.

use maud::{Markup, html};

use crate::{
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_SELECT_STYLE, FORM_TEXT_INPUT_STYLE,
    },
    project::{ProjectStatus, view::ProjectView},
};

/// Which endpoint the form submits to.
pub(super) enum ProjectFormAction {
    Create,
    Edit { project_id: String },
}

fn labeled_input(
    name: &str,
    label: &str,
    input_type: &str,
    value: &str,
    required: bool,
) -> Markup {
    html! {
        div
        {
            label for=(name) class=(FORM_LABEL_STYLE) { (label) }

            input
                type=(input_type)
                name=(name)
                id=(name)
                value=(value)
                step=[(input_type == "number").then_some("any")]
                class=(FORM_TEXT_INPUT_STYLE)
                required[required];
        }
    }
}

fn status_select(selected: ProjectStatus) -> Markup {
    let options = [
        ProjectStatus::Planning,
        ProjectStatus::In_Progress,
        ProjectStatus::Completed,
    ];

    html! {
        div
        {
            label for="status" class=(FORM_LABEL_STYLE) { "Status" }

            select name="status" id="status" class=(FORM_SELECT_STYLE)
            {
                @for status in options {
                    option value=(status.as_str()) selected[status == selected] {
                        (status.label())
                    }
                }
            }
        }
    }
}

/// Render the project form, prefilled from `project` when editing.
pub(super) fn project_form(action: ProjectFormAction, project: Option<&ProjectView>) -> Markup {
    let name = project.map(|p| p.name.as_str()).unwrap_or("");
    let status = project.map(|p| p.status).unwrap_or(ProjectStatus::Planning);
    let location = project.map(|p| p.location.as_str()).unwrap_or("");
    let lat = project
        .and_then(|p| p.geolocation)
        .map(|point| point.lat.to_string())
        .unwrap_or_default();
    let lng = project
        .and_then(|p| p.geolocation)
        .map(|point| point.lng.to_string())
        .unwrap_or_default();
    let est_completion = project
        .map(|p| p.est_completion.to_string())
        .unwrap_or_default();
    let budget = project.map(|p| p.budget.to_string()).unwrap_or_default();
    let description = project.map(|p| p.description.as_str()).unwrap_or("");
    let submit_label = match action {
        ProjectFormAction::Create => "Create project",
        ProjectFormAction::Edit { .. } => "Save changes",
    };

    html! {
        form
            hx-post=[matches!(action, ProjectFormAction::Create)
                .then(|| endpoints::PROJECTS_API)]
            hx-put=[match &action {
                ProjectFormAction::Create => None,
                ProjectFormAction::Edit { project_id } => {
                    Some(endpoints::format_endpoint(endpoints::PROJECT_API, project_id))
                }
            }]
            hx-target-error="#alert-container"
            class="space-y-4 max-w-md"
        {
            (labeled_input("name", "Name", "text", name, true))
            (status_select(status))
            (labeled_input("location", "Location", "text", location, true))

            div class="grid grid-cols-2 gap-4"
            {
                (labeled_input("lat", "Latitude", "number", &lat, false))
                (labeled_input("lng", "Longitude", "number", &lng, false))
            }

            (labeled_input("est_completion", "Estimated completion", "date", &est_completion, true))
            (labeled_input("budget", "Budget", "number", &budget, true))

            div
            {
                label for="description" class=(FORM_LABEL_STYLE) { "Description" }

                textarea
                    name="description"
                    id="description"
                    rows="4"
                    class=(FORM_TEXT_INPUT_STYLE)
                    required
                {
                    (description)
                }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { (submit_label) }
        }
    }
}
