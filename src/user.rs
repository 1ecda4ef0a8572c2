//! The user model: authentication identity plus organization membership.

use rusqlite::{
    Connection, Row, ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use time::OffsetDateTime;

use crate::{
    Error,
    auth::PasswordHash,
    ids::{OrganizationId, UserId, new_id},
};

/// A user's role within their organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    OrgOwner,
    OrgUser,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::OrgOwner => "ORG_OWNER",
            Role::OrgUser => "ORG_USER",
        }
    }
}

impl ToSql for Role {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Role {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "ORG_OWNER" => Ok(Role::OrgOwner),
            "ORG_USER" => Ok(Role::OrgUser),
            other => Err(FromSqlError::Other(
                format!("unknown user role: {other}").into(),
            )),
        }
    }
}

/// A registered user.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub password_hash: PasswordHash,
    pub role: Role,
    /// The organization the user belongs to. Always set in practice, but
    /// nullable in the schema so that membership can be severed without
    /// deleting the account.
    pub org_id: Option<OrganizationId>,
    pub created_at: OffsetDateTime,
}

/// The fields needed to create a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub password_hash: PasswordHash,
    pub role: Role,
    pub org_id: Option<OrganizationId>,
}

pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                password_hash TEXT NOT NULL,
                role TEXT NOT NULL,
                org_id TEXT,
                created_at TEXT NOT NULL,
                FOREIGN KEY(org_id) REFERENCES organization(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    Ok(())
}

/// Create a new user in the database.
///
/// # Errors
/// This function will return a:
/// - [Error::DuplicateEmail] if a user with the email already exists,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_user(new_user: NewUser, connection: &Connection) -> Result<User, Error> {
    let user = connection
        .prepare(
            "INSERT INTO user (id, email, name, password_hash, role, org_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             RETURNING id, email, name, password_hash, role, org_id, created_at",
        )?
        .query_one(
            (
                new_id(),
                &new_user.email,
                &new_user.name,
                new_user.password_hash.to_string(),
                new_user.role,
                &new_user.org_id,
                OffsetDateTime::now_utc(),
            ),
            map_user_row,
        )?;

    Ok(user)
}

/// Retrieve a user by their `id`.
///
/// # Errors
/// Returns [Error::NotFound] if `id` does not refer to a valid user, or
/// [Error::SqlError] for any other SQL error.
pub fn get_user(id: &UserId, connection: &Connection) -> Result<User, Error> {
    let user = connection
        .prepare(
            "SELECT id, email, name, password_hash, role, org_id, created_at
             FROM user WHERE id = :id",
        )?
        .query_one(&[(":id", id)], map_user_row)?;

    Ok(user)
}

/// Retrieve a user by their email address.
///
/// # Errors
/// Returns [Error::NotFound] if no user has the email, or
/// [Error::SqlError] for any other SQL error.
pub fn get_user_by_email(email: &str, connection: &Connection) -> Result<User, Error> {
    let user = connection
        .prepare(
            "SELECT id, email, name, password_hash, role, org_id, created_at
             FROM user WHERE email = :email",
        )?
        .query_one(&[(":email", &email)], map_user_row)?;

    Ok(user)
}

/// Map a database row to a [User].
pub fn map_user_row(row: &Row) -> Result<User, rusqlite::Error> {
    let password_hash: String = row.get(3)?;

    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        name: row.get(2)?,
        password_hash: PasswordHash::new_unchecked(&password_hash),
        role: row.get(4)?,
        org_id: row.get(5)?,
        created_at: row.get(6)?,
    })
}
