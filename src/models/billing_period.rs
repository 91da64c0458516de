use chrono::{Datelike, Months, NaiveDate};
use std::fmt;

use crate::errors::ServiceError;

const MIN_BILLING_YEAR: i32 = 1900;
const MAX_BILLING_YEAR: i32 = 9999;

/// The calendar month an invoice covers.
///
/// Internally anchored on the first day of the month so that ordering and
/// calendar arithmetic come straight from `NaiveDate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BillingPeriod {
    first_day: NaiveDate,
}

impl BillingPeriod {
    /// Builds a period, rejecting months outside 1..=12 and implausible years.
    pub fn new(year: i32, month: u32) -> Result<Self, ServiceError> {
        if !(1..=12).contains(&month) {
            return Err(ServiceError::ValidationError(format!(
                "Invalid billing month: {} (must be between 1 and 12)",
                month
            )));
        }
        if !(MIN_BILLING_YEAR..=MAX_BILLING_YEAR).contains(&year) {
            return Err(ServiceError::ValidationError(format!(
                "Invalid billing year: {}",
                year
            )));
        }
        NaiveDate::from_ymd_opt(year, month, 1)
            .map(|first_day| Self { first_day })
            .ok_or_else(|| {
                ServiceError::ValidationError(format!("Invalid billing period {}-{}", year, month))
            })
    }

    /// The period a given date falls in.
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            first_day: date.with_day(1).unwrap_or(date),
        }
    }

    pub fn year(&self) -> i32 {
        self.first_day.year()
    }

    pub fn month(&self) -> u32 {
        self.first_day.month()
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first_day
    }

    pub fn last_day(&self) -> NaiveDate {
        let next = self
            .first_day
            .checked_add_months(Months::new(1))
            .unwrap_or(NaiveDate::MAX);
        next.pred_opt().unwrap_or(next)
    }
}

impl fmt::Display for BillingPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

/// Whole calendar months from `start` to `end`; a partial trailing month does
/// not count. Negative when `end` precedes `start`.
pub fn whole_months_between(start: NaiveDate, end: NaiveDate) -> i32 {
    let mut months =
        (end.year() - start.year()) * 12 + (end.month() as i32 - start.month() as i32);
    if months > 0 && end.day() < start.day() {
        months -= 1;
    } else if months < 0 && end.day() > start.day() {
        months += 1;
    }
    months
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn rejects_month_thirteen() {
        let err = BillingPeriod::new(2025, 13).unwrap_err();
        assert!(err.to_string().contains("Invalid billing month"));
        assert!(BillingPeriod::new(2025, 0).is_err());
    }

    #[test]
    fn calendar_bounds() {
        let feb_leap = BillingPeriod::new(2024, 2).unwrap();
        assert_eq!(feb_leap.first_day(), date(2024, 2, 1));
        assert_eq!(feb_leap.last_day(), date(2024, 2, 29));

        let dec = BillingPeriod::new(2025, 12).unwrap();
        assert_eq!(dec.last_day(), date(2025, 12, 31));
    }

    #[test]
    fn periods_order_chronologically() {
        let dec_2024 = BillingPeriod::new(2024, 12).unwrap();
        let jan_2025 = BillingPeriod::new(2025, 1).unwrap();
        assert!(dec_2024 < jan_2025);
        assert_eq!(jan_2025.to_string(), "2025-01");
        assert_eq!(BillingPeriod::containing(date(2025, 1, 20)), jan_2025);
    }

    #[rstest]
    #[case(date(2025, 1, 5), date(2025, 4, 1), 2)]
    #[case(date(2025, 1, 1), date(2025, 4, 1), 3)]
    #[case(date(2025, 3, 5), date(2025, 4, 1), 0)]
    #[case(date(2025, 4, 5), date(2025, 4, 1), 0)]
    #[case(date(2025, 6, 5), date(2025, 4, 1), -2)]
    #[case(date(2024, 11, 30), date(2025, 2, 1), 2)]
    fn whole_months(#[case] start: NaiveDate, #[case] end: NaiveDate, #[case] expected: i32) {
        assert_eq!(whole_months_between(start, end), expected);
    }
}
