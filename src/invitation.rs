//! Invitations let an organization claim a user at signup.
//!
//! A pending invitation is keyed by email. When someone signs up with a
//! matching email, the signup flow takes the invitation, attaches the new
//! user to the inviting organization with the invited role, and deletes the
//! invitation instead of creating a fresh organization.

use rusqlite::{
    Connection, Row, ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use time::OffsetDateTime;

use crate::{
    Error,
    ids::{InvitationId, OrganizationId, new_id},
    user::Role,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Revoked,
}

impl InvitationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvitationStatus::Pending => "PENDING",
            InvitationStatus::Accepted => "ACCEPTED",
            InvitationStatus::Revoked => "REVOKED",
        }
    }
}

impl ToSql for InvitationStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for InvitationStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "PENDING" => Ok(InvitationStatus::Pending),
            "ACCEPTED" => Ok(InvitationStatus::Accepted),
            "REVOKED" => Ok(InvitationStatus::Revoked),
            other => Err(FromSqlError::Other(
                format!("unknown invitation status: {other}").into(),
            )),
        }
    }
}

/// An invitation to join an organization.
#[derive(Debug, Clone, PartialEq)]
pub struct Invitation {
    pub id: InvitationId,
    pub org_id: OrganizationId,
    pub email: String,
    pub role: Role,
    pub status: InvitationStatus,
    pub created_at: OffsetDateTime,
}

pub fn create_invitation_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS invitation (
                id TEXT PRIMARY KEY,
                org_id TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                role TEXT NOT NULL,
                status TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY(org_id) REFERENCES organization(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    Ok(())
}

/// Create a pending invitation for `email` to join `org_id` as `role`.
///
/// # Errors
/// Returns [Error::SqlError] if the email is already invited or for any
/// other SQL error.
pub fn create_invitation(
    org_id: &OrganizationId,
    email: &str,
    role: Role,
    connection: &Connection,
) -> Result<Invitation, Error> {
    let invitation = connection
        .prepare(
            "INSERT INTO invitation (id, org_id, email, role, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             RETURNING id, org_id, email, role, status, created_at",
        )?
        .query_one(
            (
                new_id(),
                org_id,
                email,
                role,
                InvitationStatus::Pending,
                OffsetDateTime::now_utc(),
            ),
            map_invitation_row,
        )?;

    Ok(invitation)
}

/// Take the pending invitation for `email`, if there is one.
///
/// The invitation is deleted as part of the take, so a second signup with
/// the same email cannot claim it again.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn take_pending_invitation(
    email: &str,
    connection: &Connection,
) -> Result<Option<Invitation>, Error> {
    let invitation = connection
        .prepare(
            "DELETE FROM invitation WHERE email = :email AND status = 'PENDING'
             RETURNING id, org_id, email, role, status, created_at",
        )?
        .query_row(&[(":email", &email)], map_invitation_row);

    match invitation {
        Ok(invitation) => Ok(Some(invitation)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(error) => Err(error.into()),
    }
}

fn map_invitation_row(row: &Row) -> Result<Invitation, rusqlite::Error> {
    Ok(Invitation {
        id: row.get(0)?,
        org_id: row.get(1)?,
        email: row.get(2)?,
        role: row.get(3)?,
        status: row.get(4)?,
        created_at: row.get(5)?,
    })
}

#[cfg(test)]
mod database_tests {
    use rusqlite::Connection;

    use crate::{db::initialize, organization::test_organization, user::Role};

    use super::{create_invitation, take_pending_invitation};

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    #[test]
    fn take_returns_and_consumes_pending_invitation() {
        let conn = get_test_connection();
        let org = test_organization(&conn);
        let created = create_invitation(&org.id, "bob@builder.mx", Role::OrgUser, &conn).unwrap();

        let taken = take_pending_invitation("bob@builder.mx", &conn).unwrap();

        assert_eq!(taken, Some(created));

        let second_take = take_pending_invitation("bob@builder.mx", &conn).unwrap();
        assert_eq!(second_take, None);
    }

    #[test]
    fn take_returns_none_without_invitation() {
        let conn = get_test_connection();

        let taken = take_pending_invitation("nobody@example.com", &conn).unwrap();

        assert_eq!(taken, None);
    }

    #[test]
    fn duplicate_invitation_email_fails() {
        let conn = get_test_connection();
        let org = test_organization(&conn);
        create_invitation(&org.id, "bob@builder.mx", Role::OrgUser, &conn).unwrap();

        let result = create_invitation(&org.id, "bob@builder.mx", Role::OrgOwner, &conn);

        assert!(result.is_err());
    }
}
