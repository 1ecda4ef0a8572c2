//! The fixed-point decimal type used for all monetary columns.
//!
//! Monetary values stay exact from form input to storage: amounts are
//! parsed into [Money] at the edge, stored as TEXT in SQLite, and summed
//! without rounding. The one and only conversion to floating point is
//! [Money::to_f64], called by view code immediately before display or
//! serialization. Nothing else in the crate should touch `f64` money.

use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Sub},
    str::FromStr,
};

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use rust_decimal::{Decimal, prelude::ToPrimitive};
use serde::{Deserialize, Serialize};

/// An exact monetary amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Zero, the starting value of every running total.
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// Wrap an exact decimal amount.
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    /// Whether the amount is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Whether the amount is greater than zero. Ledger entries must be
    /// positive; the sign of a transaction comes from its kind, not the
    /// amount.
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// The serialization boundary: convert to floating point for display
    /// or client consumption. Lossy for extreme magnitudes, exact for any
    /// realistic monetary value.
    pub fn to_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or(0.0)
    }

    /// `(self - previous) / previous * 100` as a float, for dashboard
    /// deltas. Callers are responsible for the `previous == 0` convention.
    pub fn percent_change_from(&self, previous: Money) -> f64 {
        (((self.0 - previous.0) / previous.0) * Decimal::ONE_HUNDRED)
            .to_f64()
            .unwrap_or(0.0)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, |acc, value| acc + value)
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Money {
    type Err = rust_decimal::Error;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        text.parse::<Decimal>().map(Money)
    }
}

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Money(Decimal::from(value))
    }
}

impl ToSql for Money {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0.to_string()))
    }
}

impl FromSql for Money {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_str().and_then(|text| {
            text.parse::<Money>()
                .map_err(|error| FromSqlError::Other(Box::new(error)))
        })
    }
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use super::Money;

    fn money(text: &str) -> Money {
        text.parse().unwrap()
    }

    #[test]
    fn sums_exactly() {
        // The classic float trap: 0.1 + 0.2 != 0.3.
        let total: Money = [money("0.1"), money("0.2")].into_iter().sum();

        assert_eq!(total, money("0.3"));
    }

    #[test]
    fn round_trips_through_sqlite_text() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute("CREATE TABLE t (amount TEXT NOT NULL)", ())
            .unwrap();
        conn.execute("INSERT INTO t (amount) VALUES (?1)", (money("12345.67"),))
            .unwrap();

        let stored: Money = conn
            .query_row("SELECT amount FROM t", [], |row| row.get(0))
            .unwrap();

        assert_eq!(stored, money("12345.67"));
    }

    #[test]
    fn rejects_garbage_column_text() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute("CREATE TABLE t (amount TEXT NOT NULL)", ())
            .unwrap();
        conn.execute("INSERT INTO t (amount) VALUES ('not a number')", ())
            .unwrap();

        let result: Result<Money, _> = conn.query_row("SELECT amount FROM t", [], |row| row.get(0));

        assert!(result.is_err());
    }

    #[test]
    fn positive_check() {
        assert!(money("0.01").is_positive());
        assert!(!Money::ZERO.is_positive());
        assert!(!money("-5").is_positive());
    }

    #[test]
    fn percent_change() {
        assert_eq!(money("150").percent_change_from(money("100")), 50.0);
        assert_eq!(money("1000").percent_change_from(money("1000")), 0.0);
        assert_eq!(money("50").percent_change_from(money("100")), -50.0);
    }

    #[test]
    fn to_f64_at_boundary() {
        assert_eq!(money("50000").to_f64(), 50000.0);
        assert_eq!(money("19.99").to_f64(), 19.99);
    }
}
