//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/projects/{project_id}', use [format_endpoint].

/// The root route which redirects to the dashboard or log in page.
pub const ROOT: &str = "/";
/// The landing page for logged in users.
pub const DASHBOARD_VIEW: &str = "/dashboard";
/// The page listing an organization's projects.
pub const PROJECTS_VIEW: &str = "/projects";
/// The page for creating a new project.
pub const NEW_PROJECT_VIEW: &str = "/projects/new";
/// The detail page for a single project.
pub const PROJECT_VIEW: &str = "/projects/{project_id}";
/// The page for editing an existing project.
pub const EDIT_PROJECT_VIEW: &str = "/projects/{project_id}/edit";
/// The page listing an organization's clients.
pub const CLIENTS_VIEW: &str = "/clients";
/// The page for creating a new client.
pub const NEW_CLIENT_VIEW: &str = "/clients/new";
/// The organization profile/settings page.
pub const SETTINGS_VIEW: &str = "/settings";
/// The route for getting the log in page.
pub const LOG_IN_VIEW: &str = "/log_in";
/// The route for getting the sign-up page.
pub const REGISTER_VIEW: &str = "/register";
/// The page to display when an internal server error occurs.
pub const INTERNAL_ERROR_VIEW: &str = "/error";
/// The route for static files.
pub const STATIC: &str = "/static";

/// The route to request a cup of coffee (experimental).
pub const COFFEE: &str = "/api/coffee";
/// The route for logging in a user.
pub const LOG_IN_API: &str = "/api/log_in";
/// The route for the client to log out the current user.
pub const LOG_OUT: &str = "/api/log_out";
/// The route for signing up (creates the user and their organization).
pub const USERS: &str = "/api/users";
/// The route to create a project.
pub const PROJECTS_API: &str = "/api/projects";
/// The route to update a project.
pub const PROJECT_API: &str = "/api/projects/{project_id}";
/// The route to assign or remove a project's client.
pub const PROJECT_CLIENT: &str = "/api/projects/{project_id}/client";
/// The route to create a party (client or vendor).
pub const PARTIES_API: &str = "/api/parties";
/// The route to record a transaction.
pub const TRANSACTIONS_API: &str = "/api/transactions";
/// The route to upload a file attached to a transaction.
pub const TRANSACTION_ATTACHMENTS: &str = "/api/transactions/{transaction_id}/attachments";
/// The route to update or delete the organization.
pub const ORGANIZATION_API: &str = "/api/organization";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/projects/{project_id}',
/// '{project_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: &str) -> String {
    let mut param_start = None;
    let mut param_end = None;

    for (i, c) in endpoint_path.chars().enumerate() {
        if c == '{' {
            param_start = Some(i);
        } else if param_start.is_some() && c == '}' {
            param_end = Some(i + 1);
            break;
        }
    }

    let param_start = match param_start {
        Some(start) => start,
        None => return endpoint_path.to_string(),
    };

    let param_end = param_end.unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
