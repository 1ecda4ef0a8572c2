//! The attachment records pointing at files in the media store.

use rusqlite::{Connection, Row};
use serde::Serialize;
use time::OffsetDateTime;

use crate::{
    Error,
    ids::{AttachmentId, TransactionId, new_id},
};

/// A file stored in the media store and linked to a transaction. Only the
/// storage key lives here; the bytes stay outside the database.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaAttachment {
    pub id: AttachmentId,
    pub transaction_id: TransactionId,
    pub name: String,
    pub content_type: String,
    pub size: i64,
    pub storage_key: String,
    pub created_at: OffsetDateTime,
}

/// The JSON descriptor returned by the upload endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttachmentDescriptor {
    pub name: String,
    pub content_type: String,
    pub size: i64,
    pub storage_key: String,
}

impl From<&MediaAttachment> for AttachmentDescriptor {
    fn from(attachment: &MediaAttachment) -> Self {
        Self {
            name: attachment.name.clone(),
            content_type: attachment.content_type.clone(),
            size: attachment.size,
            storage_key: attachment.storage_key.clone(),
        }
    }
}

pub fn create_media_attachment_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS media_attachment (
                id TEXT PRIMARY KEY,
                transaction_id TEXT NOT NULL,
                name TEXT NOT NULL,
                content_type TEXT NOT NULL,
                size INTEGER NOT NULL,
                storage_key TEXT NOT NULL UNIQUE,
                created_at TEXT NOT NULL,
                FOREIGN KEY(transaction_id) REFERENCES \"transaction\"(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    Ok(())
}

/// Record an attachment for a transaction.
///
/// # Errors
/// Returns [Error::SqlError] if the transaction id is invalid, the storage
/// key is already recorded, or for any other SQL error.
pub fn create_attachment(
    transaction_id: &TransactionId,
    name: &str,
    content_type: &str,
    size: i64,
    storage_key: &str,
    connection: &Connection,
) -> Result<MediaAttachment, Error> {
    let attachment = connection
        .prepare(
            "INSERT INTO media_attachment (id, transaction_id, name, content_type, size, storage_key, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             RETURNING id, transaction_id, name, content_type, size, storage_key, created_at",
        )?
        .query_one(
            (
                new_id(),
                transaction_id,
                name,
                content_type,
                size,
                storage_key,
                OffsetDateTime::now_utc(),
            ),
            map_attachment_row,
        )?;

    Ok(attachment)
}

/// List a transaction's attachments in upload order.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn attachments_for_transaction(
    transaction_id: &TransactionId,
    connection: &Connection,
) -> Result<Vec<MediaAttachment>, Error> {
    connection
        .prepare(
            "SELECT id, transaction_id, name, content_type, size, storage_key, created_at
             FROM media_attachment WHERE transaction_id = :transaction_id
             ORDER BY created_at ASC",
        )?
        .query_map(&[(":transaction_id", transaction_id)], map_attachment_row)?
        .map(|maybe_attachment| maybe_attachment.map_err(|error| error.into()))
        .collect()
}

fn map_attachment_row(row: &Row) -> Result<MediaAttachment, rusqlite::Error> {
    Ok(MediaAttachment {
        id: row.get(0)?,
        transaction_id: row.get(1)?,
        name: row.get(2)?,
        content_type: row.get(3)?,
        size: row.get(4)?,
        storage_key: row.get(5)?,
        created_at: row.get(6)?,
    })
}

#[cfg(test)]
mod database_tests {
    use rusqlite::Connection;

    use crate::{
        db::initialize,
        organization::test_organization,
        project::test_project,
        transaction::{TransactionKind, create_transaction, test_new_transaction},
    };

    use super::{attachments_for_transaction, create_attachment};

    fn setup() -> (Connection, String) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let org = test_organization(&conn);
        let project = test_project(&org.id, &conn);
        let transaction = create_transaction(
            test_new_transaction(&org.id, &project.id, TransactionKind::Expense, "100"),
            &conn,
        )
        .unwrap();

        let transaction_id = transaction.id;
        (conn, transaction_id)
    }

    #[test]
    fn create_and_list() {
        let (conn, transaction_id) = setup();

        let created = create_attachment(
            &transaction_id,
            "factura.pdf",
            "application/pdf",
            20_480,
            "org/transactions/txn/1-factura.pdf",
            &conn,
        )
        .unwrap();

        let attachments = attachments_for_transaction(&transaction_id, &conn).unwrap();
        assert_eq!(attachments, vec![created]);
    }

    #[test]
    fn duplicate_storage_key_fails() {
        let (conn, transaction_id) = setup();
        create_attachment(
            &transaction_id,
            "factura.pdf",
            "application/pdf",
            20_480,
            "org/transactions/txn/1-factura.pdf",
            &conn,
        )
        .unwrap();

        let result = create_attachment(
            &transaction_id,
            "factura.pdf",
            "application/pdf",
            20_480,
            "org/transactions/txn/1-factura.pdf",
            &conn,
        );

        assert!(result.is_err());
    }

    #[test]
    fn invalid_transaction_id_fails() {
        let (conn, _transaction_id) = setup();

        let result = create_attachment(
            &"no-such-transaction".to_string(),
            "factura.pdf",
            "application/pdf",
            20_480,
            "org/transactions/txn/2-factura.pdf",
            &conn,
        );

        assert!(result.is_err());
    }
}
