//! Organization management: the tenant root record, its settings page, and
//! the profile update / delete endpoints.

mod core;
mod delete_endpoint;
mod settings_page;
mod update_endpoint;

pub use core::{
    NewOrganization, Organization, OrganizationUpdate, create_organization,
    create_organization_table, get_organization, map_organization_row,
};
pub use delete_endpoint::delete_organization_endpoint;
pub use settings_page::get_settings_page;
pub use update_endpoint::update_organization_endpoint;

#[cfg(test)]
pub use core::test_organization;
