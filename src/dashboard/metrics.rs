//! Derived dashboard metrics.
//!
//! Everything here is computed in process over the full fetched record
//! lists on every render. There is no caching and no incremental
//! maintenance; cost grows with the organization's history.

use time::{Date, Month};

use crate::{
    money::Money,
    project::{Project, ProjectStatus},
    transaction::Transaction,
};

/// Income totals for the current and previous calendar month.
#[derive(Debug, PartialEq)]
pub(super) struct MonthlyIncome {
    pub(super) current: Money,
    pub(super) previous: Money,
}

/// The calendar month immediately before `(year, month)`, rolling January
/// back to December of the previous year.
fn previous_month(year: i32, month: Month) -> (i32, Month) {
    match month {
        Month::January => (year - 1, Month::December),
        month => (year, month.previous()),
    }
}

/// Sum income amounts into current-month and previous-month buckets
/// relative to `today`. Transactions outside both months are ignored.
pub(super) fn monthly_income(transactions: &[Transaction], today: Date) -> MonthlyIncome {
    let current_year = today.year();
    let current_month = today.month();
    let (previous_year, prev_month) = previous_month(current_year, current_month);

    let mut current = Money::ZERO;
    let mut previous = Money::ZERO;

    for transaction in transactions {
        let date = transaction.date;

        if date.year() == current_year && date.month() == current_month {
            current += transaction.amount;
        } else if date.year() == previous_year && date.month() == prev_month {
            previous += transaction.amount;
        }
    }

    MonthlyIncome { current, previous }
}

/// The month-over-month change as a percentage.
///
/// When the previous month's total is zero the result is exactly 100,
/// whatever the current total. That boundary convention is load-bearing:
/// callers and tests rely on it instead of an infinity or NaN sentinel.
pub(super) fn percentage_change(current: Money, previous: Money) -> f64 {
    if previous.is_zero() {
        return 100.0;
    }

    current.percent_change_from(previous)
}

/// How many of the given projects were created in the current calendar
/// month relative to `today`.
pub(super) fn count_created_in_month(projects: &[Project], today: Date) -> usize {
    projects
        .iter()
        .filter(|project| {
            let created = project.created_at.date();
            created.year() == today.year() && created.month() == today.month()
        })
        .count()
}

/// How many of the given projects have the given status.
pub(super) fn count_with_status(projects: &[Project], status: ProjectStatus) -> usize {
    projects
        .iter()
        .filter(|project| project.status == status)
        .count()
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        db::initialize,
        money::Money,
        organization::test_organization,
        project::{ProjectStatus, test_project},
        transaction::{
            Transaction, TransactionKind, create_transaction, project_transactions,
            test_new_transaction,
        },
    };

    use super::{count_created_in_month, count_with_status, monthly_income, percentage_change};

    fn money(text: &str) -> Money {
        text.parse().unwrap()
    }

    /// Build real ledger rows with the given dates and amounts.
    fn transactions_on(dates_and_amounts: &[(time::Date, &str)]) -> Vec<Transaction> {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let org = test_organization(&conn);
        let project = test_project(&org.id, &conn);

        for (date, amount) in dates_and_amounts {
            let mut new_transaction =
                test_new_transaction(&org.id, &project.id, TransactionKind::Income, amount);
            new_transaction.date = *date;
            create_transaction(new_transaction, &conn).unwrap();
        }

        project_transactions(&org.id, &project.id, &conn).unwrap()
    }

    #[test]
    fn buckets_current_and_previous_month() {
        let transactions = transactions_on(&[
            (date!(2026 - 08 - 03), "500"),
            (date!(2026 - 08 - 28), "250.50"),
            (date!(2026 - 07 - 15), "1000"),
            // Outside both months, ignored.
            (date!(2026 - 06 - 30), "9999"),
            (date!(2025 - 08 - 10), "9999"),
        ]);

        let income = monthly_income(&transactions, date!(2026 - 08 - 06));

        assert_eq!(income.current, money("750.50"));
        assert_eq!(income.previous, money("1000"));
    }

    #[test]
    fn january_rolls_back_to_december() {
        let transactions = transactions_on(&[
            (date!(2026 - 01 - 10), "300"),
            (date!(2025 - 12 - 24), "200"),
            // December of the wrong year must not leak in.
            (date!(2024 - 12 - 24), "7777"),
        ]);

        let income = monthly_income(&transactions, date!(2026 - 01 - 15));

        assert_eq!(income.current, money("300"));
        assert_eq!(income.previous, money("200"));
    }

    #[test]
    fn empty_history_has_zero_totals() {
        let income = monthly_income(&[], date!(2026 - 08 - 06));

        assert_eq!(income.current, Money::ZERO);
        assert_eq!(income.previous, Money::ZERO);
    }

    #[test]
    fn change_is_exactly_one_hundred_when_previous_is_zero() {
        assert_eq!(percentage_change(money("500"), Money::ZERO), 100.0);
        // The convention applies regardless of the current total.
        assert_eq!(percentage_change(Money::ZERO, Money::ZERO), 100.0);
    }

    #[test]
    fn change_is_exactly_zero_for_equal_months() {
        assert_eq!(percentage_change(money("1000"), money("1000")), 0.0);
    }

    #[test]
    fn change_is_signed() {
        assert_eq!(percentage_change(money("150"), money("100")), 50.0);
        assert_eq!(percentage_change(money("50"), money("100")), -50.0);
    }

    #[test]
    fn project_counts() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let org = test_organization(&conn);
        test_project(&org.id, &conn);
        test_project(&org.id, &conn);

        let projects = crate::project::list_projects(&org.id, &conn).unwrap();
        let today = time::OffsetDateTime::now_utc().date();

        assert_eq!(count_created_in_month(&projects, today), 2);
        assert_eq!(count_with_status(&projects, ProjectStatus::In_Progress), 2);
        assert_eq!(count_with_status(&projects, ProjectStatus::Completed), 0);
    }

    #[test]
    fn projects_created_long_ago_are_not_counted_for_the_month() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let org = test_organization(&conn);
        test_project(&org.id, &conn);

        let projects = crate::project::list_projects(&org.id, &conn).unwrap();

        assert_eq!(count_created_in_month(&projects, date!(2020 - 01 - 01)), 0);
    }
}
