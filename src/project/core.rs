//! Defines the core data model and database queries for projects:
//! per-organization numbering, creation with zeroed totals, partial
//! updates, status queries, and client assignment.

use rusqlite::{
    Connection, Row, ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{
    Error,
    ids::{OrganizationId, PartyId, ProjectId, new_id},
    money::Money,
    party::{PartyKind, map_party_row},
    transaction::{Transaction, project_transactions},
};

/// Where a project is in its lifecycle. The underscore in `In_Progress`
/// matches the value stored in the database and submitted by forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(non_camel_case_types)]
pub enum ProjectStatus {
    Planning,
    In_Progress,
    Completed,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Planning => "Planning",
            ProjectStatus::In_Progress => "In_Progress",
            ProjectStatus::Completed => "Completed",
        }
    }

    /// Human-readable label for tables and badges.
    pub fn label(&self) -> &'static str {
        match self {
            ProjectStatus::Planning => "Planning",
            ProjectStatus::In_Progress => "In progress",
            ProjectStatus::Completed => "Completed",
        }
    }
}

impl ToSql for ProjectStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for ProjectStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "Planning" => Ok(ProjectStatus::Planning),
            "In_Progress" => Ok(ProjectStatus::In_Progress),
            "Completed" => Ok(ProjectStatus::Completed),
            other => Err(FromSqlError::Other(
                format!("unknown project status: {other}").into(),
            )),
        }
    }
}

/// A latitude/longitude pair picked on the map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// A construction job tracked by an organization.
#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    pub id: ProjectId,
    pub org_id: OrganizationId,
    /// Sequential within the organization. Not backed by a uniqueness
    /// constraint; see [next_project_number].
    pub number: i64,
    pub name: String,
    pub description: String,
    pub status: ProjectStatus,
    /// Free-text address.
    pub location: String,
    /// Map coordinates. `None` means no location was picked; both columns
    /// are NULL together, never a zeroed pair.
    pub geolocation: Option<GeoPoint>,
    pub est_completion: Date,
    pub budget: Money,
    /// Running sum of the project's INCOME transactions. Maintained by
    /// [crate::transaction::create_transaction], never recomputed.
    pub total_income: Money,
    /// Running sum of the project's EXPENSE transactions. Maintained by
    /// [crate::transaction::create_transaction], never recomputed.
    pub total_expense: Money,
    pub client_id: Option<PartyId>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// A project with its transactions loaded, as returned by the client
/// assignment operations and the project detail page.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectWithTransactions {
    pub project: Project,
    pub transactions: Vec<Transaction>,
}

/// The fields needed to create a project. Totals are not accepted: every
/// project starts at zero.
#[derive(Debug, Clone)]
pub struct NewProject {
    pub org_id: OrganizationId,
    pub number: i64,
    pub name: String,
    pub description: String,
    pub status: ProjectStatus,
    pub location: String,
    pub geolocation: Option<GeoPoint>,
    pub est_completion: Date,
    pub budget: Money,
}

/// The fields overwritten by a project update. Everything else, the
/// running totals in particular, is left untouched.
#[derive(Debug, Clone)]
pub struct ProjectUpdate {
    pub name: String,
    pub description: String,
    pub status: ProjectStatus,
    pub location: String,
    pub geolocation: Option<GeoPoint>,
    pub est_completion: Date,
    pub budget: Money,
}

pub fn create_project_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    // No UNIQUE constraint on (org_id, number): two concurrent creations
    // can mint the same number. Documented behavior, see the numbering
    // tests.
    connection.execute(
        "CREATE TABLE IF NOT EXISTS project (
                id TEXT PRIMARY KEY,
                org_id TEXT NOT NULL,
                number INTEGER NOT NULL,
                name TEXT NOT NULL,
                description TEXT NOT NULL,
                status TEXT NOT NULL,
                location TEXT NOT NULL,
                lat REAL,
                lng REAL,
                est_completion TEXT NOT NULL,
                budget TEXT NOT NULL,
                total_income TEXT NOT NULL,
                total_expense TEXT NOT NULL,
                client_id TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY(org_id) REFERENCES organization(id) ON UPDATE CASCADE ON DELETE CASCADE,
                FOREIGN KEY(client_id) REFERENCES party(id) ON UPDATE CASCADE ON DELETE SET NULL
                )",
        (),
    )?;

    Ok(())
}

const PROJECT_COLUMNS: &str = "id, org_id, number, name, description, status, location, lat, lng, \
     est_completion, budget, total_income, total_expense, client_id, created_at, updated_at";

/// The next project number for the organization: one greater than the
/// current maximum, or 1 when the organization has no projects (including
/// when the organization id does not exist at all).
///
/// Two interleaved calls can observe the same maximum and return the same
/// number; nothing at this layer prevents the resulting duplicates.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn next_project_number(
    org_id: &OrganizationId,
    connection: &Connection,
) -> Result<i64, Error> {
    let max_number: Option<i64> = connection.query_row(
        "SELECT MAX(number) FROM project WHERE org_id = :org_id",
        &[(":org_id", org_id)],
        |row| row.get(0),
    )?;

    Ok(max_number.map(|number| number + 1).unwrap_or(1))
}

/// Create a new project with `total_income = total_expense = 0`.
///
/// # Errors
/// Returns [Error::SqlError] if `org_id` is invalid or for any other SQL
/// error.
pub fn create_project(new_project: NewProject, connection: &Connection) -> Result<Project, Error> {
    let now = OffsetDateTime::now_utc();

    let project = connection
        .prepare(&format!(
            "INSERT INTO project (id, org_id, number, name, description, status, location,
                                  lat, lng, est_completion, budget,
                                  total_income, total_expense, client_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, '0', '0', NULL, ?12, ?12)
             RETURNING {PROJECT_COLUMNS}"
        ))?
        .query_one(
            (
                new_id(),
                &new_project.org_id,
                new_project.number,
                &new_project.name,
                &new_project.description,
                new_project.status,
                &new_project.location,
                new_project.geolocation.map(|point| point.lat),
                new_project.geolocation.map(|point| point.lng),
                new_project.est_completion,
                new_project.budget,
                now,
            ),
            map_project_row,
        )?;

    Ok(project)
}

/// Overwrite the named fields of the project and bump `updated_at`.
///
/// The running totals and the client assignment are not part of the
/// update; the store's partial-update semantics leave them untouched.
///
/// # Errors
/// Returns [Error::NotFound] if `project_id` does not refer to a valid
/// project, or [Error::SqlError] for any other SQL error.
pub fn update_project(
    project_id: &ProjectId,
    update: ProjectUpdate,
    connection: &Connection,
) -> Result<Project, Error> {
    let project = connection
        .prepare(&format!(
            "UPDATE project
             SET name = ?1, description = ?2, status = ?3, location = ?4,
                 lat = ?5, lng = ?6, est_completion = ?7, budget = ?8, updated_at = ?9
             WHERE id = ?10
             RETURNING {PROJECT_COLUMNS}"
        ))?
        .query_one(
            (
                &update.name,
                &update.description,
                update.status,
                &update.location,
                update.geolocation.map(|point| point.lat),
                update.geolocation.map(|point| point.lng),
                update.est_completion,
                update.budget,
                OffsetDateTime::now_utc(),
                project_id,
            ),
            map_project_row,
        )?;

    Ok(project)
}

/// Retrieve one of the organization's projects by id.
///
/// # Errors
/// Returns [Error::NotFound] if the project does not exist or belongs to a
/// different organization, or [Error::SqlError] for any other SQL error.
pub fn get_project(
    org_id: &OrganizationId,
    project_id: &ProjectId,
    connection: &Connection,
) -> Result<Project, Error> {
    let project = connection
        .prepare(&format!(
            "SELECT {PROJECT_COLUMNS} FROM project WHERE id = :id AND org_id = :org_id"
        ))?
        .query_one(
            rusqlite::named_params! {":id": project_id, ":org_id": org_id},
            map_project_row,
        )?;

    Ok(project)
}

/// List all of the organization's projects, newest number first.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn list_projects(
    org_id: &OrganizationId,
    connection: &Connection,
) -> Result<Vec<Project>, Error> {
    connection
        .prepare(&format!(
            "SELECT {PROJECT_COLUMNS} FROM project WHERE org_id = :org_id ORDER BY number DESC"
        ))?
        .query_map(&[(":org_id", org_id)], map_project_row)?
        .map(|maybe_project| maybe_project.map_err(|error| error.into()))
        .collect()
}

/// List the organization's projects with the given status.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn projects_with_status(
    org_id: &OrganizationId,
    status: ProjectStatus,
    connection: &Connection,
) -> Result<Vec<Project>, Error> {
    connection
        .prepare(&format!(
            "SELECT {PROJECT_COLUMNS} FROM project
             WHERE org_id = :org_id AND status = :status"
        ))?
        .query_map(
            rusqlite::named_params! {":org_id": org_id, ":status": status},
            map_project_row,
        )?
        .map(|maybe_project| maybe_project.map_err(|error| error.into()))
        .collect()
}

/// The sum of `total_income` across all of the organization's projects.
///
/// Summed in exact decimal arithmetic over the fetched rows rather than in
/// SQL, since the totals are stored as decimal text.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn org_total_income(
    org_id: &OrganizationId,
    connection: &Connection,
) -> Result<Money, Error> {
    let totals: Result<Vec<Money>, Error> = connection
        .prepare("SELECT total_income FROM project WHERE org_id = :org_id")?
        .query_map(&[(":org_id", org_id)], |row| row.get(0))?
        .map(|maybe_total| maybe_total.map_err(|error| error.into()))
        .collect();

    Ok(totals?.into_iter().sum())
}

/// Assign a client to the project, overwriting any previous assignment.
///
/// The party must belong to the same organization as the project and must
/// be a client; both are hard invariants checked before any write.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if the project or party does not exist,
/// - [Error::ClientNotInOrganization] if the party belongs to another organization,
/// - [Error::NotAClient] if the party is not a client,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn assign_client(
    project_id: &ProjectId,
    party_id: &PartyId,
    connection: &Connection,
) -> Result<ProjectWithTransactions, Error> {
    let project = get_project_by_id(project_id, connection)?;

    let party = connection
        .prepare(
            "SELECT id, org_id, kind, name, email, phone, address, created_at, updated_at
             FROM party WHERE id = :id",
        )?
        .query_one(&[(":id", party_id)], map_party_row)?;

    if party.org_id != project.org_id {
        return Err(Error::ClientNotInOrganization);
    }

    if party.kind != PartyKind::Client {
        return Err(Error::NotAClient);
    }

    let project = connection
        .prepare(&format!(
            "UPDATE project SET client_id = ?1, updated_at = ?2 WHERE id = ?3
             RETURNING {PROJECT_COLUMNS}"
        ))?
        .query_one(
            (party_id, OffsetDateTime::now_utc(), project_id),
            map_project_row,
        )?;

    with_transactions(project, connection)
}

/// Clear the project's client assignment. Idempotent: removing an already
/// clear assignment succeeds and leaves `client_id` NULL.
///
/// # Errors
/// Returns [Error::NotFound] if the project does not exist, or
/// [Error::SqlError] for any other SQL error.
pub fn remove_client(
    project_id: &ProjectId,
    connection: &Connection,
) -> Result<ProjectWithTransactions, Error> {
    let project = connection
        .prepare(&format!(
            "UPDATE project SET client_id = NULL, updated_at = ?1 WHERE id = ?2
             RETURNING {PROJECT_COLUMNS}"
        ))?
        .query_one((OffsetDateTime::now_utc(), project_id), map_project_row)?;

    with_transactions(project, connection)
}

fn get_project_by_id(project_id: &ProjectId, connection: &Connection) -> Result<Project, Error> {
    let project = connection
        .prepare(&format!("SELECT {PROJECT_COLUMNS} FROM project WHERE id = :id"))?
        .query_one(&[(":id", project_id)], map_project_row)?;

    Ok(project)
}

fn with_transactions(
    project: Project,
    connection: &Connection,
) -> Result<ProjectWithTransactions, Error> {
    let transactions = project_transactions(&project.org_id, &project.id, connection)?;

    Ok(ProjectWithTransactions {
        project,
        transactions,
    })
}

/// Map a database row to a [Project].
pub fn map_project_row(row: &Row) -> Result<Project, rusqlite::Error> {
    let lat: Option<f64> = row.get(7)?;
    let lng: Option<f64> = row.get(8)?;
    let geolocation = match (lat, lng) {
        (Some(lat), Some(lng)) => Some(GeoPoint { lat, lng }),
        _ => None,
    };

    Ok(Project {
        id: row.get(0)?,
        org_id: row.get(1)?,
        number: row.get(2)?,
        name: row.get(3)?,
        description: row.get(4)?,
        status: row.get(5)?,
        location: row.get(6)?,
        geolocation,
        est_completion: row.get(9)?,
        budget: row.get(10)?,
        total_income: row.get(11)?,
        total_expense: row.get(12)?,
        client_id: row.get(13)?,
        created_at: row.get(14)?,
        updated_at: row.get(15)?,
    })
}

/// Insert and return a project for use in other slices' tests.
#[cfg(test)]
pub fn test_project(org_id: &crate::ids::OrganizationId, connection: &Connection) -> Project {
    use time::macros::date;

    let number = next_project_number(org_id, connection).unwrap();

    create_project(
        NewProject {
            org_id: org_id.clone(),
            number,
            name: "Edificio A".to_owned(),
            description: "Edificio comercial de tres plantas".to_owned(),
            status: ProjectStatus::In_Progress,
            location: "Guadalajara".to_owned(),
            geolocation: Some(GeoPoint {
                lat: 20.6597,
                lng: -103.3496,
            }),
            est_completion: date!(2026 - 12 - 31),
            budget: "1500000".parse().unwrap(),
        },
        connection,
    )
    .expect("Could not create test project")
}
