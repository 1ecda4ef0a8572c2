//! Creates the application's database schema.

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};

use crate::{
    Error, invitation::create_invitation_table, notification::create_notification_table,
    organization::create_organization_table, party::create_party_table,
    project::create_project_table, transaction::attachment::create_media_attachment_table,
    transaction::create_transaction_table, user::create_user_table,
};

/// Create all of the application's tables if they do not exist, inside a
/// single exclusive transaction, and enable foreign key enforcement so
/// that organization deletes cascade.
///
/// # Errors
/// Returns an error if a table cannot be created or there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.pragma_update(None, "foreign_keys", "ON")?;

    let transaction =
        SqlTransaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    // Referenced tables first: everything hangs off organization, and
    // attachments hang off transactions.
    create_organization_table(&transaction)?;
    create_user_table(&transaction)?;
    create_party_table(&transaction)?;
    create_project_table(&transaction)?;
    create_transaction_table(&transaction)?;
    create_media_attachment_table(&transaction)?;
    create_notification_table(&transaction)?;
    create_invitation_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use super::initialize;

    #[test]
    fn initialize_creates_all_tables() {
        let conn = Connection::open_in_memory().unwrap();

        initialize(&conn).unwrap();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN
                 ('organization', 'user', 'party', 'project', 'transaction',
                  'media_attachment', 'notification', 'invitation')",
                [],
                |row| row.get(0),
            )
            .unwrap();

        assert_eq!(count, 8);
    }

    #[test]
    fn initialize_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        initialize(&conn).unwrap();
        initialize(&conn).unwrap();
    }

    #[test]
    fn foreign_keys_are_enforced() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        let result = conn.execute(
            "INSERT INTO party (id, org_id, kind, name, created_at, updated_at)
             VALUES ('p1', 'no-such-org', 'CLIENT', 'X', '2026-01-01', '2026-01-01')",
            (),
        );

        assert!(result.is_err());
    }
}
