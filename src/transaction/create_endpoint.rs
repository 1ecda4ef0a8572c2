//! Defines the endpoint for recording a new income or expense.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
// Must use axum_extra's Form since that parses an empty string as None instead
// of crashing like axum::Form.
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use rusqlite::Connection;
use serde::Deserialize;
use time::Date;

use crate::{
    AppState,
    auth::{Session, current_org_member},
    endpoints,
    html::format_currency,
    ids::ProjectId,
    money::Money,
    notification::create_notification,
    transaction::{NewTransaction, TransactionKind, core::create_transaction},
};

/// The state needed to record a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The form data for recording a transaction.
#[derive(Debug, Deserialize)]
pub struct TransactionForm {
    pub project_id: ProjectId,
    pub kind: TransactionKind,
    /// Parsed as an exact decimal, never a float.
    pub amount: Money,
    pub currency: String,
    #[serde(default)]
    pub exchange_rate: Option<Money>,
    pub payment_method: String,
    pub category: String,
    #[serde(default)]
    pub invoice_number: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// The date when the money moved.
    pub date: Date,
}

/// A route handler for recording a transaction, redirects back to the
/// project page on success.
///
/// The organization comes from the session, not the form, so a ledger row
/// can only ever be recorded against a project the caller can see.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn create_transaction_endpoint(
    State(state): State<CreateTransactionState>,
    Extension(session): Extension<Session>,
    Form(form): Form<TransactionForm>,
) -> Response {
    let connection = state
        .db_connection
        .lock()
        .expect("Could not acquire database lock");

    let member = match current_org_member(&session, &connection) {
        Ok(member) => member,
        Err(error) => return error.into_alert_response(),
    };

    let new_transaction = NewTransaction {
        org_id: member.org_id.clone(),
        project_id: form.project_id.clone(),
        kind: form.kind,
        amount: form.amount,
        currency: form.currency,
        exchange_rate: form.exchange_rate.unwrap_or_else(|| Money::from(1)),
        payment_method: form.payment_method,
        category: form.category,
        invoice_number: form.invoice_number.filter(|s| !s.is_empty()),
        description: form.description.filter(|s| !s.is_empty()),
        date: form.date,
    };

    let transaction = match create_transaction(new_transaction, &connection) {
        Ok(transaction) => transaction,
        Err(error) => return error.into_alert_response(),
    };

    if let Err(error) = create_notification(
        &member.org_id,
        &member.user.id,
        &format!(
            "recorded {} of {}",
            transaction.kind.label().to_lowercase(),
            format_currency(transaction.amount.to_f64()),
        ),
        &connection,
    ) {
        tracing::warn!("could not record activity for new transaction: {error}");
    }

    (
        HxRedirect(endpoints::format_endpoint(
            endpoints::PROJECT_VIEW,
            &form.project_id,
        )),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State, http::StatusCode};
    use axum_extra::extract::Form;
    use axum_htmx::HX_REDIRECT;
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        auth::{PasswordHash, Session},
        db::initialize,
        organization::test_organization,
        project::{get_project, test_project},
        transaction::TransactionKind,
        user::{NewUser, Role, create_user},
    };

    use super::{CreateTransactionState, TransactionForm, create_transaction_endpoint};

    fn setup() -> (CreateTransactionState, Session, String, String) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let org = test_organization(&conn);
        let project = test_project(&org.id, &conn);
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

        (
            CreateTransactionState {
                db_connection: Arc::new(Mutex::new(conn)),
            },
            Session {
                user_id: user.id,
            },
            org.id,
            project.id,
        )
    }

    fn form(project_id: &str, kind: TransactionKind, amount: &str) -> TransactionForm {
        TransactionForm {
            project_id: project_id.to_owned(),
            kind,
            amount: amount.parse().unwrap(),
            currency: "MXN".to_owned(),
            exchange_rate: None,
            payment_method: "Transferencia".to_owned(),
            category: "Anticipo".to_owned(),
            invoice_number: Some("".to_owned()),
            description: None,
            date: date!(2026 - 08 - 06),
        }
    }

    #[tokio::test]
    async fn records_income_and_redirects_to_project() {
        let (state, session, org_id, project_id) = setup();

        let response = create_transaction_endpoint(
            State(state.clone()),
            Extension(session),
            Form(form(&project_id, TransactionKind::Income, "50000")),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(HX_REDIRECT).unwrap(),
            &format!("/projects/{project_id}")
        );

        let connection = state.db_connection.lock().unwrap();
        let project = get_project(&org_id, &project_id, &connection).unwrap();
        assert_eq!(project.total_income, "50000".parse().unwrap());
    }

    #[tokio::test]
    async fn zero_amount_renders_validation_alert() {
        let (state, session, org_id, project_id) = setup();

        let response = create_transaction_endpoint(
            State(state.clone()),
            Extension(session),
            Form(form(&project_id, TransactionKind::Expense, "0")),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let connection = state.db_connection.lock().unwrap();
        let project = get_project(&org_id, &project_id, &connection).unwrap();
        assert_eq!(project.total_expense, crate::money::Money::ZERO);
    }

    #[tokio::test]
    async fn form_kind_parses_from_uppercase() {
        let form: TransactionForm = serde_html_form::from_str(
            "project_id=p1&kind=INCOME&amount=12.50&currency=MXN&payment_method=Efectivo\
             &category=Anticipo&date=2026-08-06",
        )
        .unwrap();

        assert_eq!(form.kind, TransactionKind::Income);
        assert_eq!(form.amount, "12.50".parse().unwrap());
        assert_eq!(form.exchange_rate, None);
    }
}
