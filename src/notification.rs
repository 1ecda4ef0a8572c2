//! Lightweight activity records shown on the dashboard.
//!
//! Mutating endpoints record a one-line entry of the form
//! "<user name> | <what happened>"; the dashboard lists the most recent
//! entries with the acting user joined.

use rusqlite::{Connection, Row};
use time::OffsetDateTime;

use crate::{
    Error,
    ids::{NotificationId, OrganizationId, UserId, new_id},
};

/// An activity entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub id: NotificationId,
    pub org_id: OrganizationId,
    pub user_id: UserId,
    pub body: String,
    pub created_at: OffsetDateTime,
}

/// An activity entry joined with the acting user's name for display.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationWithUser {
    pub notification: Notification,
    pub user_name: String,
}

pub fn create_notification_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS notification (
                id TEXT PRIMARY KEY,
                org_id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                body TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY(org_id) REFERENCES organization(id) ON UPDATE CASCADE ON DELETE CASCADE,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    Ok(())
}

/// Record an activity entry.
///
/// # Errors
/// Returns [Error::SqlError] if the org or user id is invalid or for any
/// other SQL error.
pub fn create_notification(
    org_id: &OrganizationId,
    user_id: &UserId,
    body: &str,
    connection: &Connection,
) -> Result<Notification, Error> {
    let notification = connection
        .prepare(
            "INSERT INTO notification (id, org_id, user_id, body, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             RETURNING id, org_id, user_id, body, created_at",
        )?
        .query_one(
            (new_id(), org_id, user_id, body, OffsetDateTime::now_utc()),
            map_notification_row,
        )?;

    Ok(notification)
}

/// List an organization's activity entries, newest first, with the acting
/// user's name joined.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn notifications_for_org(
    org_id: &OrganizationId,
    limit: u32,
    connection: &Connection,
) -> Result<Vec<NotificationWithUser>, Error> {
    connection
        .prepare(
            "SELECT n.id, n.org_id, n.user_id, n.body, n.created_at, u.name
             FROM notification n
             INNER JOIN user u ON u.id = n.user_id
             WHERE n.org_id = :org_id
             ORDER BY n.created_at DESC
             LIMIT :limit",
        )?
        .query_map(
            rusqlite::named_params! {":org_id": org_id, ":limit": limit},
            |row| {
                Ok(NotificationWithUser {
                    notification: map_notification_row(row)?,
                    user_name: row.get(5)?,
                })
            },
        )?
        .map(|maybe_notification| maybe_notification.map_err(|error| error.into()))
        .collect()
}

fn map_notification_row(row: &Row) -> Result<Notification, rusqlite::Error> {
    Ok(Notification {
        id: row.get(0)?,
        org_id: row.get(1)?,
        user_id: row.get(2)?,
        body: row.get(3)?,
        created_at: row.get(4)?,
    })
}

#[cfg(test)]
mod database_tests {
    use rusqlite::Connection;

    use crate::{
        auth::PasswordHash,
        db::initialize,
        organization::test_organization,
        user::{NewUser, Role, create_user},
    };

    use super::{create_notification, notifications_for_org};

    fn setup() -> (Connection, String, String) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let org = test_organization(&conn);
        let user = create_user(
            NewUser {
                email: "ana@obrador.mx".to_owned(),
                name: "Ana Obrador".to_owned(),
                password_hash: PasswordHash::new_unchecked("$2b$04$notarealhash"),
                role: Role::OrgOwner,
                org_id: Some(org.id.clone()),
            },
            &conn,
        )
        .unwrap();

        let org_id = org.id;
        let user_id = user.id;
        (conn, org_id, user_id)
    }

    #[test]
    fn lists_newest_first_with_user_name() {
        let (conn, org_id, user_id) = setup();
        create_notification(&org_id, &user_id, "created the project Edificio A", &conn).unwrap();
        create_notification(&org_id, &user_id, "recorded an income of $500", &conn).unwrap();

        let notifications = notifications_for_org(&org_id, 10, &conn).unwrap();

        assert_eq!(notifications.len(), 2);
        assert!(
            notifications[0].notification.created_at >= notifications[1].notification.created_at
        );
        assert_eq!(notifications[0].user_name, "Ana Obrador");
    }

    #[test]
    fn respects_limit() {
        let (conn, org_id, user_id) = setup();
        for i in 0..5 {
            create_notification(&org_id, &user_id, &format!("event {i}"), &conn).unwrap();
        }

        let notifications = notifications_for_org(&org_id, 3, &conn).unwrap();

        assert_eq!(notifications.len(), 3);
    }

    #[test]
    fn scoped_to_organization() {
        let (conn, org_id, user_id) = setup();
        create_notification(&org_id, &user_id, "event", &conn).unwrap();

        let other_org = crate::organization::create_organization(
            crate::organization::NewOrganization {
                name: "Otra".to_owned(),
                email: "otra@example.com".to_owned(),
            },
            &conn,
        )
        .unwrap();

        let notifications = notifications_for_org(&other_org.id, 10, &conn).unwrap();

        assert!(notifications.is_empty());
    }
}
