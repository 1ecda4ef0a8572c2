//! View-model structs for project data.
//!
//! These are the shapes handed to presentation code: every monetary field
//! has already crossed the [crate::money::Money::to_f64] boundary, so view
//! code only ever sees plain numbers.

use time::Date;

use crate::{
    ids::{PartyId, ProjectId, TransactionId},
    project::{GeoPoint, Project, ProjectStatus, ProjectWithTransactions},
    transaction::{Transaction, TransactionKind},
};

/// A project with money as plain numbers.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectView {
    pub id: ProjectId,
    pub number: i64,
    pub name: String,
    pub description: String,
    pub status: ProjectStatus,
    pub location: String,
    pub geolocation: Option<GeoPoint>,
    pub est_completion: Date,
    pub budget: f64,
    pub total_income: f64,
    pub total_expense: f64,
    pub client_id: Option<PartyId>,
}

impl From<&Project> for ProjectView {
    fn from(project: &Project) -> Self {
        Self {
            id: project.id.clone(),
            number: project.number,
            name: project.name.clone(),
            description: project.description.clone(),
            status: project.status,
            location: project.location.clone(),
            geolocation: project.geolocation,
            est_completion: project.est_completion,
            budget: project.budget.to_f64(),
            total_income: project.total_income.to_f64(),
            total_expense: project.total_expense.to_f64(),
            client_id: project.client_id.clone(),
        }
    }
}

/// A transaction with money as plain numbers.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionView {
    pub id: TransactionId,
    pub kind: TransactionKind,
    pub amount: f64,
    pub currency: String,
    pub exchange_rate: f64,
    pub payment_method: String,
    pub category: String,
    pub invoice_number: Option<String>,
    pub description: Option<String>,
    pub date: Date,
}

impl From<&Transaction> for TransactionView {
    fn from(transaction: &Transaction) -> Self {
        Self {
            id: transaction.id.clone(),
            kind: transaction.kind,
            amount: transaction.amount.to_f64(),
            currency: transaction.currency.clone(),
            exchange_rate: transaction.exchange_rate.to_f64(),
            payment_method: transaction.payment_method.clone(),
            category: transaction.category.clone(),
            invoice_number: transaction.invoice_number.clone(),
            description: transaction.description.clone(),
            date: transaction.date,
        }
    }
}

/// The project detail page's data: the project and its transactions, all
/// past the float boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectDetailView {
    pub project: ProjectView,
    pub transactions: Vec<TransactionView>,
}

impl From<&ProjectWithTransactions> for ProjectDetailView {
    fn from(value: &ProjectWithTransactions) -> Self {
        Self {
            project: ProjectView::from(&value.project),
            transactions: value.transactions.iter().map(TransactionView::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use crate::{
        db::initialize,
        organization::test_organization,
        project::{get_project, test_project},
        transaction::{TransactionKind, create_transaction, test_new_transaction},
    };

    use super::ProjectView;

    #[test]
    fn money_crosses_the_float_boundary_once() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let org = test_organization(&conn);
        let project = test_project(&org.id, &conn);
        create_transaction(
            test_new_transaction(&org.id, &project.id, TransactionKind::Income, "50000.25"),
            &conn,
        )
        .unwrap();

        let project = get_project(&org.id, &project.id, &conn).unwrap();
        let view = ProjectView::from(&project);

        assert_eq!(view.budget, 1_500_000.0);
        assert_eq!(view.total_income, 50_000.25);
        assert_eq!(view.total_expense, 0.0);
    }
}
