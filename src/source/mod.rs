//! Where status records come from.
//!
//! A [`RecordSource`] returns every record created inside a [`DateRange`].
//! The only shipped implementation reads a SQLite database.

mod sqlite;

pub use sqlite::SqliteSource;

use chrono::NaiveDate;

use crate::report::error::{ReportError, Result};
use crate::report::record::Record;

/// Date format accepted on input and used in queries.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    from: NaiveDate,
    to: NaiveDate,
}

impl DateRange {
    /// Range from `from` through `to`; fails if `from` is after `to`.
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self> {
        if from > to {
            return Err(ReportError::InvertedRange { from, to });
        }
        Ok(Self { from, to })
    }

    /// Parse two `YYYY-MM-DD` dates.
    pub fn parse(from: &str, to: &str) -> Result<Self> {
        Self::new(parse_date(from)?, parse_date(to)?)
    }

    #[inline]
    pub fn from(&self) -> NaiveDate {
        self.from
    }

    #[inline]
    pub fn to(&self) -> NaiveDate {
        self.to
    }

    /// Month and year of the end date, e.g. `May-2025`.
    pub fn period_label(&self) -> String {
        self.to.format("%b-%Y").to_string()
    }
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| ReportError::InvalidDate {
        value: value.to_string(),
    })
}

/// A store of status records.
pub trait RecordSource {
    /// Every record created on a day inside `range`.
    fn fetch(&self, range: &DateRange) -> Result<Vec<Record>>;
}

impl RecordSource for Vec<Record> {
    /// An in-memory batch ignores the range; it is already the selection.
    fn fetch(&self, _range: &DateRange) -> Result<Vec<Record>> {
        Ok(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_range() {
        let range = DateRange::parse("2025-05-01", " 2025-05-31 ").unwrap();
        assert_eq!(range.from(), NaiveDate::from_ymd_opt(2025, 5, 1).unwrap());
        assert_eq!(range.period_label(), "May-2025");
        assert!(DateRange::parse("2025-05-01", "2025-05-01").is_ok());
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(matches!(
            DateRange::parse("2025-13-01", "2025-12-31"),
            Err(ReportError::InvalidDate { .. })
        ));
        assert!(matches!(
            DateRange::parse("01/05/2025", "2025-12-31"),
            Err(ReportError::InvalidDate { .. })
        ));
        assert!(matches!(
            DateRange::parse("2025-06-01", "2025-05-01"),
            Err(ReportError::InvertedRange { .. })
        ));
    }
}
