//! The stat cards shown at the top of the dashboard.

use maud::{Markup, html};

use crate::{html::{CARD_STYLE, format_currency}, notification::NotificationWithUser};

const BADGE_UP_STYLE: &str = "inline-flex items-center gap-1 mt-3 px-2.5 py-0.5 w-fit \
    text-xs font-semibold rounded-full bg-green-200 text-green-800";
const BADGE_DOWN_STYLE: &str = "inline-flex items-center gap-1 mt-3 px-2.5 py-0.5 w-fit \
    text-xs font-semibold rounded-full bg-red-200 text-red-800";
const BADGE_FLAT_STYLE: &str = "inline-flex items-center gap-1 mt-3 px-2.5 py-0.5 w-fit \
    text-xs font-semibold rounded-full bg-gray-200 text-gray-800";

/// The monthly income card: this month's income and the change against
/// last month.
///
/// A month without income gets a neutral badge; the percentage (including
/// the `previous == 0` sentinel of 100) is only shown when there is income
/// to report.
pub(super) fn monthly_income_card(current_month_income: f64, percentage_change: f64) -> Markup {
    let (badge_style, arrow) = if current_month_income == 0.0 {
        (BADGE_FLAT_STYLE, "→")
    } else if percentage_change < 0.0 {
        (BADGE_DOWN_STYLE, "↓")
    } else if percentage_change > 0.0 {
        (BADGE_UP_STYLE, "↑")
    } else {
        (BADGE_FLAT_STYLE, "→")
    };

    html!(
        div class=(CARD_STYLE)
        {
            h3 class="text-sm text-gray-600 dark:text-gray-400" { "Monthly Income" }

            p class="text-2xl font-bold truncate" { (format_currency(current_month_income)) }

            span class=(badge_style)
            {
                (arrow) " "
                @if current_month_income == 0.0 {
                    "No income this month"
                } @else {
                    "+" (format!("{:.1}", percentage_change.abs())) "% vs last month"
                }
            }
        }
    )
}

/// The active projects card: projects of the tracked status created this
/// month, plus the in-progress count.
pub(super) fn active_projects_card(created_this_month: usize, in_progress: usize) -> Markup {
    let badge_style = if in_progress > 0 {
        BADGE_UP_STYLE
    } else {
        BADGE_FLAT_STYLE
    };

    html!(
        div class=(CARD_STYLE)
        {
            h3 class="text-sm text-gray-600 dark:text-gray-400" { "Active Projects" }

            p class="text-2xl font-bold truncate" { (created_this_month) }

            span class=(badge_style)
            {
                @if in_progress == 0 {
                    "→ No projects in progress"
                } @else {
                    "↑ " (in_progress) " in progress"
                }
            }
        }
    )
}

/// The all-time income card: the sum of every project's running income
/// total.
pub(super) fn total_income_card(total_income: f64) -> Markup {
    html!(
        div class=(CARD_STYLE)
        {
            h3 class="text-sm text-gray-600 dark:text-gray-400" { "Total Income" }

            p class="text-2xl font-bold truncate" { (format_currency(total_income)) }

            span class=(BADGE_FLAT_STYLE) { "All projects" }
        }
    )
}

/// The recent activity list.
pub(super) fn activity_feed(entries: &[NotificationWithUser]) -> Markup {
    html!(
        div class="mt-8"
        {
            h3 class="text-lg font-semibold mb-2" { "Recent activity" }

            @if entries.is_empty() {
                p class="text-sm text-gray-600 dark:text-gray-400" { "Nothing has happened yet." }
            } @else {
                ul class="space-y-1"
                {
                    @for entry in entries {
                        li class="text-sm"
                        {
                            span class="font-semibold" { (entry.user_name) }
                            " " (entry.notification.body)
                        }
                    }
                }
            }
        }
    )
}
