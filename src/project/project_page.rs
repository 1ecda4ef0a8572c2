//! The project detail page: totals, client assignment, the transaction
//! ledger, and attachment uploads.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::{Session, current_org_member},
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, CARD_STYLE, FORM_LABEL_STYLE, FORM_SELECT_STYLE,
        FORM_TEXT_INPUT_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, STATUS_BADGE_STYLE,
        TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, format_currency,
    },
    ids::ProjectId,
    navigation::NavBar,
    party::{Party, get_clients, get_party},
    project::{
        core::{get_project, ProjectWithTransactions},
        view::{ProjectDetailView, TransactionView},
    },
    transaction::{MediaAttachment, attachments_for_transaction, project_transactions},
};

/// The state needed to display the project page.
#[derive(Debug, Clone)]
pub struct ProjectPageState {
    /// The database connection for loading the project and its ledger.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ProjectPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Display one of the organization's projects.
pub async fn get_project_page(
    State(state): State<ProjectPageState>,
    Path(project_id): Path<ProjectId>,
    Extension(session): Extension<Session>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let member = current_org_member(&session, &connection)?;

    let project = get_project(&member.org_id, &project_id, &connection)?;
    let transactions = project_transactions(&member.org_id, &project_id, &connection)?;

    let client = match &project.client_id {
        Some(client_id) => Some(get_party(&member.org_id, client_id, &connection)?),
        None => None,
    };
    let clients = get_clients(&member.org_id, &connection)?;

    // One lookup per ledger row; the page re-reads everything on each
    // render just like the rest of the app.
    let attachments: Vec<Vec<MediaAttachment>> = transactions
        .iter()
        .map(|transaction| attachments_for_transaction(&transaction.id, &connection))
        .collect::<Result<_, _>>()?;

    let detail = ProjectDetailView::from(&ProjectWithTransactions {
        project,
        transactions,
    });

    Ok(project_view(&detail, client.as_ref(), &clients, &attachments).into_response())
}

fn project_view(
    detail: &ProjectDetailView,
    client: Option<&Party>,
    clients: &[Party],
    attachments: &[Vec<MediaAttachment>],
) -> Markup {
    let nav_bar = NavBar::new(endpoints::PROJECTS_VIEW).into_html();
    let project = &detail.project;

    let content = html!(
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="flex justify-between items-baseline mb-2"
            {
                h2 class="text-xl font-bold"
                {
                    "#" (project.number) " " (project.name)
                }

                a
                    href=(endpoints::format_endpoint(endpoints::EDIT_PROJECT_VIEW, &project.id))
                    class=(LINK_STYLE)
                {
                    "Edit"
                }
            }

            div class="mb-6 text-sm text-gray-600 dark:text-gray-400"
            {
                span class=(STATUS_BADGE_STYLE) { (project.status.label()) }
                span class="ml-3" { (project.location) }

                @if let Some(point) = project.geolocation {
                    span class="ml-3" { "(" (point.lat) ", " (point.lng) ")" }
                }

                span class="ml-3" { "Est. completion " (project.est_completion) }
            }

            p class="mb-6" { (project.description) }

            // Financial summary
            div class="grid grid-cols-1 sm:grid-cols-3 gap-4 mb-8"
            {
                div class=(CARD_STYLE)
                {
                    h3 class="text-sm text-gray-600 dark:text-gray-400" { "Budget" }
                    p class="text-2xl font-bold" { (format_currency(project.budget)) }
                }

                div class=(CARD_STYLE)
                {
                    h3 class="text-sm text-gray-600 dark:text-gray-400" { "Total income" }
                    p class="text-2xl font-bold text-green-600" {
                        (format_currency(project.total_income))
                    }
                }

                div class=(CARD_STYLE)
                {
                    h3 class="text-sm text-gray-600 dark:text-gray-400" { "Total expenses" }
                    p class="text-2xl font-bold text-red-600" {
                        (format_currency(project.total_expense))
                    }
                }
            }

            (client_section(&project.id, client, clients))

            (ledger_section(&project.id, &detail.transactions, attachments))
        }
    );

    base(&project.name, &content)
}

fn client_section(project_id: &str, client: Option<&Party>, clients: &[Party]) -> Markup {
    let assign_endpoint = endpoints::format_endpoint(endpoints::PROJECT_CLIENT, project_id);

    html!(
        div class="mb-8 max-w-md"
        {
            h3 class="text-lg font-semibold mb-2" { "Client" }

            @match client {
                Some(client) => {
                    div class=(CARD_STYLE)
                    {
                        p class="font-semibold" { (client.name) }

                        @if let Some(email) = &client.email {
                            p class="text-sm" { (email) }
                        }

                        button
                            hx-delete=(assign_endpoint)
                            hx-target-error="#alert-container"
                            class="mt-2 text-sm text-red-600 hover:text-red-500 underline
                                bg-transparent border-none cursor-pointer"
                        {
                            "Remove client"
                        }
                    }
                }
                None => {
                    @if clients.is_empty() {
                        p class="text-sm"
                        {
                            "No clients yet. "
                            a href=(endpoints::NEW_CLIENT_VIEW) class=(LINK_STYLE) { "Create one" }
                            " to assign it here."
                        }
                    } @else {
                        form
                            hx-post=(assign_endpoint)
                            hx-target-error="#alert-container"
                            class="flex gap-2 items-end"
                        {
                            div class="grow"
                            {
                                label for="client_id" class=(FORM_LABEL_STYLE) { "Assign a client" }

                                select name="client_id" id="client_id" class=(FORM_SELECT_STYLE)
                                {
                                    @for client in clients {
                                        option value=(client.id) { (client.name) }
                                    }
                                }
                            }

                            button type="submit" class="px-4 py-2 bg-blue-500 text-white rounded"
                            {
                                "Assign"
                            }
                        }
                    }
                }
            }
        }
    )
}

fn ledger_section(
    project_id: &str,
    transactions: &[TransactionView],
    attachments: &[Vec<MediaAttachment>],
) -> Markup {
    html!(
        div class="mb-8"
        {
            h3 class="text-lg font-semibold mb-2" { "Transactions" }

            @if transactions.is_empty() {
                p class="text-sm mb-4" { "No transactions recorded yet." }
            } @else {
                table class="w-full text-sm text-left text-gray-500 dark:text-gray-400 mb-4"
                {
                    thead class=(TABLE_HEADER_STYLE)
                    {
                        tr
                        {
                            th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Kind" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Amount" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Payment" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Invoice" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Attachments" }
                        }
                    }

                    tbody
                    {
                        @for (transaction, files) in transactions.iter().zip(attachments) {
                            tr class=(TABLE_ROW_STYLE)
                            {
                                td class=(TABLE_CELL_STYLE) { (transaction.date) }
                                td class=(TABLE_CELL_STYLE) { (transaction.kind.label()) }
                                td class=(TABLE_CELL_STYLE) { (transaction.category) }
                                td class=(TABLE_CELL_STYLE) { (format_currency(transaction.amount)) }
                                td class=(TABLE_CELL_STYLE) { (transaction.payment_method) }
                                td class=(TABLE_CELL_STYLE)
                                {
                                    (transaction.invoice_number.as_deref().unwrap_or("—"))
                                }
                                td class=(TABLE_CELL_STYLE)
                                {
                                    @for file in files {
                                        span class="block text-xs" { (file.name) }
                                    }

                                    form
                                        hx-post=(endpoints::format_endpoint(
                                            endpoints::TRANSACTION_ATTACHMENTS,
                                            &transaction.id,
                                        ))
                                        hx-encoding="multipart/form-data"
                                        hx-swap="none"
                                        hx-target-error="#alert-container"
                                        class="mt-1"
                                    {
                                        input type="file" name="file" class="text-xs" required;
                                        button type="submit" class="text-xs underline" { "Upload" }
                                    }
                                }
                            }
                        }
                    }
                }
            }

            (new_transaction_form(project_id))
        }
    )
}

fn new_transaction_form(project_id: &str) -> Markup {
    html!(
        h4 class="text-md font-semibold mb-2" { "Record a transaction" }

        form
            hx-post=(endpoints::TRANSACTIONS_API)
            hx-target-error="#alert-container"
            class="grid grid-cols-1 sm:grid-cols-2 gap-4 max-w-2xl"
        {
            input type="hidden" name="project_id" value=(project_id);

            div
            {
                label for="kind" class=(FORM_LABEL_STYLE) { "Kind" }

                select name="kind" id="kind" class=(FORM_SELECT_STYLE)
                {
                    option value="INCOME" { "Income" }
                    option value="EXPENSE" { "Expense" }
                }
            }

            div
            {
                label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }
                input type="number" name="amount" id="amount" step="0.01" min="0.01"
                    class=(FORM_TEXT_INPUT_STYLE) required;
            }

            div
            {
                label for="date" class=(FORM_LABEL_STYLE) { "Date" }
                input type="date" name="date" id="date" class=(FORM_TEXT_INPUT_STYLE) required;
            }

            div
            {
                label for="category" class=(FORM_LABEL_STYLE) { "Category" }
                input type="text" name="category" id="category" class=(FORM_TEXT_INPUT_STYLE)
                    required;
            }

            div
            {
                label for="payment_method" class=(FORM_LABEL_STYLE) { "Payment method" }
                input type="text" name="payment_method" id="payment_method"
                    class=(FORM_TEXT_INPUT_STYLE) required;
            }

            div
            {
                label for="currency" class=(FORM_LABEL_STYLE) { "Currency" }
                input type="text" name="currency" id="currency" value="MXN"
                    class=(FORM_TEXT_INPUT_STYLE) required;
            }

            div
            {
                label for="invoice_number" class=(FORM_LABEL_STYLE) { "Invoice number" }
                input type="text" name="invoice_number" id="invoice_number"
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="description" class=(FORM_LABEL_STYLE) { "Description" }
                input type="text" name="description" id="description"
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Record" }
        }
    )
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Path, State},
        http::StatusCode,
    };
    use rusqlite::Connection;
    use scraper::{Html, Selector};

    use crate::{
        Error,
        auth::{PasswordHash, Session},
        db::initialize,
        organization::test_organization,
        party::test_client,
        project::{core::assign_client, test_project},
        transaction::{TransactionKind, create_transaction, test_new_transaction},
        user::{NewUser, Role, create_user},
    };

    use super::{ProjectPageState, get_project_page};

    fn setup() -> (Connection, String, String, Session) {
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

        let session = Session {
            user_id: user.id,
        };
        (conn, org.id, project.id, session)
    }

    async fn render(state: ProjectPageState, project_id: String, session: Session) -> Html {
        let response = get_project_page(State(state), Path(project_id), Extension(session))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        Html::parse_document(&String::from_utf8_lossy(&body))
    }

    #[tokio::test]
    async fn shows_running_totals_and_ledger_rows() {
        let (conn, org_id, project_id, session) = setup();
        create_transaction(
            test_new_transaction(&org_id, &project_id, TransactionKind::Income, "50000"),
            &conn,
        )
        .unwrap();
        create_transaction(
            test_new_transaction(&org_id, &project_id, TransactionKind::Expense, "20000"),
            &conn,
        )
        .unwrap();

        let state = ProjectPageState {
            db_connection: Arc::new(Mutex::new(conn)),
        };

        let html = render(state, project_id, session).await;
        let page_text = html.html();

        assert!(page_text.contains("$50,000.00"));
        assert!(page_text.contains("$20,000.00"));

        let rows = Selector::parse("tbody tr").unwrap();
        assert_eq!(html.select(&rows).count(), 2);
    }

    #[tokio::test]
    async fn shows_assigned_client() {
        let (conn, org_id, project_id, session) = setup();
        let client = test_client(&org_id, "Inmobiliaria Sol", &conn);
        assign_client(&project_id, &client.id, &conn).unwrap();

        let state = ProjectPageState {
            db_connection: Arc::new(Mutex::new(conn)),
        };

        let html = render(state, project_id, session).await;

        assert!(html.html().contains("Inmobiliaria Sol"));
        // An assigned client means no assignment dropdown.
        let select = Selector::parse("select[name='client_id']").unwrap();
        assert_eq!(html.select(&select).count(), 0);
    }

    #[tokio::test]
    async fn project_from_other_org_is_not_found() {
        let (conn, _org_id, project_id, _session) = setup();

        let other_org = test_organization(&conn);
        let outsider = create_user(
            NewUser {
                email: "otro@example.com".to_owned(),
                name: "Otro".to_owned(),
                password_hash: PasswordHash::new_unchecked("$2b$04$notarealhash"),
                role: Role::OrgOwner,
                org_id: Some(other_org.id.clone()),
            },
            &conn,
        )
        .unwrap();

        let state = ProjectPageState {
            db_connection: Arc::new(Mutex::new(conn)),
        };

        let result = get_project_page(
            State(state),
            Path(project_id),
            Extension(Session {
                user_id: outsider.id,
            }),
        )
        .await;

        assert_eq!(result.err(), Some(Error::NotFound));
    }
}
