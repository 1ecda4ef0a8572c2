//! Project management: per-organization numbering, CRUD pages and
//! endpoints, client assignment, and the running financial totals.

mod client_assignment;
mod core;
mod create_endpoint;
mod edit_endpoint;
mod edit_page;
mod form;
mod new_project_page;
mod project_page;
mod projects_page;
mod view;

pub use client_assignment::{assign_client_endpoint, remove_client_endpoint};
pub use core::{
    GeoPoint, NewProject, Project, ProjectStatus, ProjectUpdate, ProjectWithTransactions,
    assign_client, create_project, create_project_table, get_project, list_projects,
    map_project_row, next_project_number, org_total_income, projects_with_status, remove_client,
    update_project,
};
pub use create_endpoint::create_project_endpoint;
pub use edit_endpoint::edit_project_endpoint;
pub use edit_page::get_edit_project_page;
pub use new_project_page::get_new_project_page;
pub use project_page::get_project_page;
pub use projects_page::get_projects_page;
pub use view::{ProjectDetailView, ProjectView, TransactionView};

#[cfg(test)]
pub use core::test_project;
