//! Defines the core data model and database queries for parties
//! (clients and vendors).

use rusqlite::{
    Connection, Row, ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use time::OffsetDateTime;

use crate::{
    Error,
    ids::{OrganizationId, PartyId, new_id},
};

/// Whether a party is a customer of the organization or a supplier to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartyKind {
    Client,
    Vendor,
}

impl PartyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PartyKind::Client => "CLIENT",
            PartyKind::Vendor => "VENDOR",
        }
    }
}

impl ToSql for PartyKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for PartyKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "CLIENT" => Ok(PartyKind::Client),
            "VENDOR" => Ok(PartyKind::Vendor),
            other => Err(FromSqlError::Other(
                format!("unknown party kind: {other}").into(),
            )),
        }
    }
}

/// A client or vendor belonging to an organization.
#[derive(Debug, Clone, PartialEq)]
pub struct Party {
    pub id: PartyId,
    pub org_id: OrganizationId,
    pub kind: PartyKind,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// The fields needed to create a party.
#[derive(Debug, Clone)]
pub struct NewParty {
    pub org_id: OrganizationId,
    pub kind: PartyKind,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

pub fn create_party_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS party (
                id TEXT PRIMARY KEY,
                org_id TEXT NOT NULL,
                kind TEXT NOT NULL,
                name TEXT NOT NULL,
                email TEXT,
                phone TEXT,
                address TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY(org_id) REFERENCES organization(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    Ok(())
}

/// Create a new party.
///
/// # Errors
/// Returns [Error::SqlError] if `org_id` is invalid or for any other SQL
/// error.
pub fn create_party(new_party: NewParty, connection: &Connection) -> Result<Party, Error> {
    let now = OffsetDateTime::now_utc();

    let party = connection
        .prepare(
            "INSERT INTO party (id, org_id, kind, name, email, phone, address, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
             RETURNING id, org_id, kind, name, email, phone, address, created_at, updated_at",
        )?
        .query_one(
            (
                new_id(),
                &new_party.org_id,
                new_party.kind,
                &new_party.name,
                &new_party.email,
                &new_party.phone,
                &new_party.address,
                now,
            ),
            map_party_row,
        )?;

    Ok(party)
}

/// Retrieve one of the organization's parties by id.
///
/// # Errors
/// Returns [Error::NotFound] if the party does not exist or belongs to a
/// different organization, or [Error::SqlError] for any other SQL error.
pub fn get_party(
    org_id: &OrganizationId,
    party_id: &PartyId,
    connection: &Connection,
) -> Result<Party, Error> {
    let party = connection
        .prepare(
            "SELECT id, org_id, kind, name, email, phone, address, created_at, updated_at
             FROM party WHERE id = :id AND org_id = :org_id",
        )?
        .query_one(
            rusqlite::named_params! {":id": party_id, ":org_id": org_id},
            map_party_row,
        )?;

    Ok(party)
}

/// List the organization's clients ordered by name.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn get_clients(
    org_id: &OrganizationId,
    connection: &Connection,
) -> Result<Vec<Party>, Error> {
    connection
        .prepare(
            "SELECT id, org_id, kind, name, email, phone, address, created_at, updated_at
             FROM party WHERE org_id = :org_id AND kind = 'CLIENT'
             ORDER BY name ASC",
        )?
        .query_map(&[(":org_id", org_id)], map_party_row)?
        .map(|maybe_party| maybe_party.map_err(|error| error.into()))
        .collect()
}

/// Map a database row to a [Party].
pub fn map_party_row(row: &Row) -> Result<Party, rusqlite::Error> {
    Ok(Party {
        id: row.get(0)?,
        org_id: row.get(1)?,
        kind: row.get(2)?,
        name: row.get(3)?,
        email: row.get(4)?,
        phone: row.get(5)?,
        address: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

/// Insert and return a client for use in other slices' tests.
#[cfg(test)]
pub fn test_client(org_id: &OrganizationId, name: &str, connection: &Connection) -> Party {
    create_party(
        NewParty {
            org_id: org_id.clone(),
            kind: PartyKind::Client,
            name: name.to_owned(),
            email: None,
            phone: None,
            address: None,
        },
        connection,
    )
    .expect("Could not create test client")
}
