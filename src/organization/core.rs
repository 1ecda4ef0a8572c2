//! Defines the core data model and database queries for organizations.

use rusqlite::{Connection, Row};
use time::OffsetDateTime;

use crate::{
    Error,
    ids::{OrganizationId, new_id},
};

/// The tenant root: every project, party, transaction, and user hangs off
/// an organization.
#[derive(Debug, Clone, PartialEq)]
pub struct Organization {
    pub id: OrganizationId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    /// Branding image for the sidebar and printed documents.
    pub logo_url: Option<String>,
    /// Free-text profile shown on the settings page.
    pub description: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// The fields required to create an organization at signup.
#[derive(Debug, Clone)]
pub struct NewOrganization {
    pub name: String,
    pub email: String,
}

/// The profile fields the owner can edit on the settings page.
#[derive(Debug, Clone)]
pub struct OrganizationUpdate {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub logo_url: Option<String>,
    pub description: Option<String>,
}

pub fn create_organization_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS organization (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL,
                phone TEXT,
                address TEXT,
                logo_url TEXT,
                description TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Create a new organization.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn create_organization(
    new_organization: NewOrganization,
    connection: &Connection,
) -> Result<Organization, Error> {
    let now = OffsetDateTime::now_utc();

    let organization = connection
        .prepare(
            "INSERT INTO organization (id, name, email, phone, address, logo_url, description, created_at, updated_at)
             VALUES (?1, ?2, ?3, NULL, NULL, NULL, NULL, ?4, ?4)
             RETURNING id, name, email, phone, address, logo_url, description, created_at, updated_at",
        )?
        .query_one(
            (new_id(), &new_organization.name, &new_organization.email, now),
            map_organization_row,
        )?;

    Ok(organization)
}

/// Retrieve an organization by its `id`.
///
/// # Errors
/// Returns [Error::NotFound] if `id` does not refer to a valid
/// organization, or [Error::SqlError] for any other SQL error.
pub fn get_organization(
    id: &OrganizationId,
    connection: &Connection,
) -> Result<Organization, Error> {
    let organization = connection
        .prepare(
            "SELECT id, name, email, phone, address, logo_url, description, created_at, updated_at
             FROM organization WHERE id = :id",
        )?
        .query_one(&[(":id", id)], map_organization_row)?;

    Ok(organization)
}

/// Overwrite the organization's profile fields and bump `updated_at`.
///
/// # Errors
/// Returns [Error::NotFound] if `id` does not refer to a valid
/// organization, or [Error::SqlError] for any other SQL error.
pub fn update_organization(
    id: &OrganizationId,
    update: OrganizationUpdate,
    connection: &Connection,
) -> Result<Organization, Error> {
    let organization = connection
        .prepare(
            "UPDATE organization
             SET name = ?1, email = ?2, phone = ?3, address = ?4,
                 logo_url = ?5, description = ?6, updated_at = ?7
             WHERE id = ?8
             RETURNING id, name, email, phone, address, logo_url, description, created_at, updated_at",
        )?
        .query_one(
            (
                &update.name,
                &update.email,
                &update.phone,
                &update.address,
                &update.logo_url,
                &update.description,
                OffsetDateTime::now_utc(),
                id,
            ),
            map_organization_row,
        )?;

    Ok(organization)
}

/// Delete the organization. Foreign keys cascade the delete to users,
/// parties, projects, transactions, attachments, notifications, and
/// invitations.
///
/// # Errors
/// Returns [Error::NotFound] if `id` does not refer to a valid
/// organization, or [Error::SqlError] for any other SQL error.
pub fn delete_organization(id: &OrganizationId, connection: &Connection) -> Result<(), Error> {
    let rows_deleted = connection.execute("DELETE FROM organization WHERE id = ?1", (id,))?;

    if rows_deleted == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Map a database row to an [Organization].
pub fn map_organization_row(row: &Row) -> Result<Organization, rusqlite::Error> {
    Ok(Organization {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        address: row.get(4)?,
        logo_url: row.get(5)?,
        description: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

/// Insert and return an organization for use in other slices' tests.
#[cfg(test)]
pub fn test_organization(connection: &Connection) -> Organization {
    create_organization(
        NewOrganization {
            name: "Constructora Jalisco".to_owned(),
            email: "contacto@jalisco.mx".to_owned(),
        },
        connection,
    )
    .expect("Could not create test organization")
}
