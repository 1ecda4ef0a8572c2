//! Defines the core data model and database queries for the transaction
//! ledger.
//!
//! The ledger is append-only: there is no update or delete path, so a
//! project's running totals only ever grow. [create_transaction] is the
//! single multi-step write in the application and runs inside one SQLite
//! transaction so a ledger row can never exist without its amount having
//! been folded into the parent project's totals, and vice versa.

use rusqlite::{
    Connection, Row, ToSql, TransactionBehavior,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{
    Error,
    ids::{OrganizationId, ProjectId, TransactionId, new_id},
    money::Money,
};

/// Whether a transaction is money coming in or going out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "INCOME",
            TransactionKind::Expense => "EXPENSE",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TransactionKind::Income => "Income",
            TransactionKind::Expense => "Expense",
        }
    }
}

impl ToSql for TransactionKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "INCOME" => Ok(TransactionKind::Income),
            "EXPENSE" => Ok(TransactionKind::Expense),
            other => Err(FromSqlError::Other(
                format!("unknown transaction kind: {other}").into(),
            )),
        }
    }
}

/// A single income or expense record tied to a project.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub id: TransactionId,
    pub org_id: OrganizationId,
    pub project_id: ProjectId,
    pub kind: TransactionKind,
    /// Always positive; the direction comes from `kind`.
    pub amount: Money,
    pub currency: String,
    pub exchange_rate: Money,
    pub payment_method: String,
    pub category: String,
    pub invoice_number: Option<String>,
    pub description: Option<String>,
    /// When the money moved, as opposed to when it was recorded.
    pub date: Date,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// The fields needed to record a transaction.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub org_id: OrganizationId,
    pub project_id: ProjectId,
    pub kind: TransactionKind,
    pub amount: Money,
    pub currency: String,
    pub exchange_rate: Money,
    pub payment_method: String,
    pub category: String,
    pub invoice_number: Option<String>,
    pub description: Option<String>,
    pub date: Date,
}

pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id TEXT PRIMARY KEY,
                org_id TEXT NOT NULL,
                project_id TEXT NOT NULL,
                kind TEXT NOT NULL,
                amount TEXT NOT NULL,
                currency TEXT NOT NULL,
                exchange_rate TEXT NOT NULL,
                payment_method TEXT NOT NULL,
                category TEXT NOT NULL,
                invoice_number TEXT,
                description TEXT,
                date TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY(org_id) REFERENCES organization(id) ON UPDATE CASCADE ON DELETE CASCADE,
                FOREIGN KEY(project_id) REFERENCES project(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_org_kind ON \"transaction\"(org_id, kind);",
        (),
    )?;

    Ok(())
}

const TRANSACTION_COLUMNS: &str = "id, org_id, project_id, kind, amount, currency, exchange_rate, \
     payment_method, category, invoice_number, description, date, created_at, updated_at";

/// Record a transaction and fold its amount into the parent project's
/// matching running total.
///
/// Both writes happen inside a single immediate SQLite transaction: either
/// the ledger row and the total update are both committed, or neither is.
///
/// # Errors
/// This function will return a:
/// - [Error::NonPositiveAmount] if the amount is zero or negative,
/// - [Error::NotFound] if the project does not exist in the given organization,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    new_transaction: NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    if !new_transaction.amount.is_positive() {
        return Err(Error::NonPositiveAmount);
    }

    let sql_transaction =
        rusqlite::Transaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    let transaction = {
        let (total_column, current_total) = {
            let column = match new_transaction.kind {
                TransactionKind::Income => "total_income",
                TransactionKind::Expense => "total_expense",
            };

            let total: Money = sql_transaction
                .prepare(&format!(
                    "SELECT {column} FROM project WHERE id = :id AND org_id = :org_id"
                ))?
                .query_one(
                    rusqlite::named_params! {
                        ":id": &new_transaction.project_id,
                        ":org_id": &new_transaction.org_id,
                    },
                    |row| row.get(0),
                )?;

            (column, total)
        };

        let transaction = sql_transaction
            .prepare(&format!(
                "INSERT INTO \"transaction\"
                     (id, org_id, project_id, kind, amount, currency, exchange_rate,
                      payment_method, category, invoice_number, description, date,
                      created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?13)
                 RETURNING {TRANSACTION_COLUMNS}"
            ))?
            .query_one(
                (
                    new_id(),
                    &new_transaction.org_id,
                    &new_transaction.project_id,
                    new_transaction.kind,
                    new_transaction.amount,
                    &new_transaction.currency,
                    new_transaction.exchange_rate,
                    &new_transaction.payment_method,
                    &new_transaction.category,
                    &new_transaction.invoice_number,
                    &new_transaction.description,
                    new_transaction.date,
                    OffsetDateTime::now_utc(),
                ),
                map_transaction_row,
            )?;

        let new_total = current_total + new_transaction.amount;
        sql_transaction.execute(
            &format!("UPDATE project SET {total_column} = ?1, updated_at = ?2 WHERE id = ?3"),
            (
                new_total,
                OffsetDateTime::now_utc(),
                &new_transaction.project_id,
            ),
        )?;

        transaction
    };

    sql_transaction.commit()?;

    Ok(transaction)
}

/// Retrieve one of the organization's transactions by id.
///
/// # Errors
/// Returns [Error::NotFound] if the transaction does not exist in the
/// organization, or [Error::SqlError] for any other SQL error.
pub fn get_transaction(
    org_id: &OrganizationId,
    transaction_id: &TransactionId,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\"
             WHERE id = :id AND org_id = :org_id"
        ))?
        .query_one(
            rusqlite::named_params! {":id": transaction_id, ":org_id": org_id},
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// List a project's transactions, most recent date first.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn project_transactions(
    org_id: &OrganizationId,
    project_id: &ProjectId,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\"
             WHERE org_id = :org_id AND project_id = :project_id
             ORDER BY date DESC, created_at DESC"
        ))?
        .query_map(
            rusqlite::named_params! {":org_id": org_id, ":project_id": project_id},
            map_transaction_row,
        )?
        .map(|maybe_transaction| maybe_transaction.map_err(|error| error.into()))
        .collect()
}

/// List every INCOME transaction in the organization.
///
/// This is the unfiltered fetch the dashboard aggregates over in process;
/// it grows with the full history of the organization.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn org_income_transactions(
    org_id: &OrganizationId,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\"
             WHERE org_id = :org_id AND kind = 'INCOME'"
        ))?
        .query_map(&[(":org_id", org_id)], map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(|error| error.into()))
        .collect()
}

/// Map a database row to a [Transaction].
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        org_id: row.get(1)?,
        project_id: row.get(2)?,
        kind: row.get(3)?,
        amount: row.get(4)?,
        currency: row.get(5)?,
        exchange_rate: row.get(6)?,
        payment_method: row.get(7)?,
        category: row.get(8)?,
        invoice_number: row.get(9)?,
        description: row.get(10)?,
        date: row.get(11)?,
        created_at: row.get(12)?,
        updated_at: row.get(13)?,
    })
}

/// A [NewTransaction] with placeholder details for tests.
#[cfg(test)]
pub fn test_new_transaction(
    org_id: &OrganizationId,
    project_id: &ProjectId,
    kind: TransactionKind,
    amount: &str,
) -> NewTransaction {
    use time::macros::date;

    NewTransaction {
        org_id: org_id.clone(),
        project_id: project_id.clone(),
        kind,
        amount: amount.parse().unwrap(),
        currency: "MXN".to_owned(),
        exchange_rate: "1".parse().unwrap(),
        payment_method: "Transferencia".to_owned(),
        category: "General".to_owned(),
        invoice_number: None,
        description: None,
        date: date!(2026 - 08 - 06),
    }
}

// ============================================================================
// TESTS
// ============================================================================
