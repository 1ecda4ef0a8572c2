//! The dashboard page handler.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    auth::{Session, current_org_member},
    dashboard::{
        cards::{activity_feed, active_projects_card, monthly_income_card, total_income_card},
        metrics::{count_created_in_month, count_with_status, monthly_income, percentage_change},
    },
    endpoints,
    html::{PAGE_CONTAINER_STYLE, base, link},
    navigation::NavBar,
    notification::{NotificationWithUser, notifications_for_org},
    organization::get_organization,
    project::{ProjectStatus, list_projects, org_total_income},
    timezone::get_local_offset,
    transaction::org_income_transactions,
};

/// How many activity entries the dashboard shows.
const ACTIVITY_FEED_LIMIT: u32 = 8;

/// The state needed for displaying the dashboard page.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// The database connection for loading dashboard data.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "America/Mexico_City".
    pub local_timezone: String,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Display a page with an overview of the organization's finances.
///
/// The metrics are recomputed from the full transaction and project lists
/// on every request.
pub async fn get_dashboard_page(
    State(state): State<DashboardState>,
    Extension(session): Extension<Session>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let member = current_org_member(&session, &connection)?;
    let organization = get_organization(&member.org_id, &connection)?;

    let local_offset = get_local_offset(&state.local_timezone).ok_or_else(|| {
        tracing::error!("Invalid timezone {}", state.local_timezone);
        Error::InvalidTimezoneError(state.local_timezone.clone())
    })?;
    let today = OffsetDateTime::now_utc().to_offset(local_offset).date();

    // Full unfiltered fetches; all aggregation happens in process.
    let income_transactions = org_income_transactions(&member.org_id, &connection)
        .inspect_err(|error| tracing::error!("could not load income transactions: {error}"))?;
    let projects = list_projects(&member.org_id, &connection)
        .inspect_err(|error| tracing::error!("could not load projects: {error}"))?;

    let income = monthly_income(&income_transactions, today);
    let change = percentage_change(income.current, income.previous);

    let in_progress: Vec<_> = projects
        .iter()
        .filter(|project| project.status == ProjectStatus::In_Progress)
        .cloned()
        .collect();
    let created_this_month = count_created_in_month(&in_progress, today);
    let in_progress_count = count_with_status(&projects, ProjectStatus::In_Progress);

    let total_income = org_total_income(&member.org_id, &connection)?;

    let activity = notifications_for_org(&member.org_id, ACTIVITY_FEED_LIMIT, &connection)
        .inspect_err(|error| tracing::error!("could not load activity feed: {error}"))?;

    Ok(dashboard_view(
        &organization.name,
        income.current.to_f64(),
        change,
        created_this_month,
        in_progress_count,
        total_income.to_f64(),
        &activity,
        projects.is_empty(),
    )
    .into_response())
}

#[allow(clippy::too_many_arguments)]
fn dashboard_view(
    organization_name: &str,
    current_month_income: f64,
    change: f64,
    created_this_month: usize,
    in_progress_count: usize,
    total_income: f64,
    activity: &[NotificationWithUser],
    no_projects: bool,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::DASHBOARD_VIEW).into_html();

    let content = html!(
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            h2 class="text-xl font-bold mb-4" { (organization_name) }

            div class="grid grid-cols-1 sm:grid-cols-3 gap-4"
            {
                (monthly_income_card(current_month_income, change))
                (active_projects_card(created_this_month, in_progress_count))
                (total_income_card(total_income))
            }

            @if no_projects {
                p class="mt-6"
                {
                    "Nothing here yet. "
                    (link(endpoints::NEW_PROJECT_VIEW, "Create a project"))
                    " to start recording income and expenses."
                }
            }

            (activity_feed(activity))
        }
    );

    base("Dashboard", &content)
}
