//! Review entity - a performance review written for one employee

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use rusqlite::Row;
use serde::Serialize;

use crate::core::directory::EmployeeDirectory;
use crate::core::error::{ReviewError, ValidationError};

/// Earliest year a review may be filed for
pub const MIN_YEAR: i64 = 2000;

/// Shared handle to a review; the identity map hands out clones of these
pub type ReviewRef = Rc<RefCell<Review>>;

/// A performance review
///
/// Every field goes through a validating setter. A rejected value leaves
/// the field as it was.
#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct Review {
    id: Option<i64>,
    year: i64,
    summary: String,
    employee_id: i64,
}

impl Review {
    /// Build a transient (unsaved) review, validating every field
    ///
    /// Looks the employee up in `directory`.
    pub fn new(
        year: i64,
        summary: impl Into<String>,
        employee_id: i64,
        directory: &dyn EmployeeDirectory,
    ) -> Result<Self, ReviewError> {
        let summary = summary.into();
        check_year(year)?;
        check_summary(&summary)?;
        check_employee(employee_id, directory)?;

        Ok(Self {
            id: None,
            year,
            summary,
            employee_id,
        })
    }

    /// Build a review straight from a stored row, without validation
    pub(crate) fn from_row(row: ReviewRow) -> Self {
        Self {
            id: Some(row.id),
            year: row.year,
            summary: row.summary,
            employee_id: row.employee_id,
        }
    }

    /// Wrap in a shared handle
    pub fn into_shared(self) -> ReviewRef {
        Rc::new(RefCell::new(self))
    }

    pub fn id(&self) -> Option<i64> {
        self.id
    }

    pub fn year(&self) -> i64 {
        self.year
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn employee_id(&self) -> i64 {
        self.employee_id
    }

    pub fn set_year(&mut self, year: i64) -> Result<(), ValidationError> {
        check_year(year)?;
        self.year = year;
        Ok(())
    }

    /// Set the summary; stored exactly as given, surrounding whitespace included
    pub fn set_summary(&mut self, summary: impl Into<String>) -> Result<(), ValidationError> {
        let summary = summary.into();
        check_summary(&summary)?;
        self.summary = summary;
        Ok(())
    }

    /// Point the review at another employee
    ///
    /// Queries `directory` on every call. A failed lookup is returned as
    /// [`ReviewError::Storage`].
    pub fn set_employee_id(
        &mut self,
        employee_id: i64,
        directory: &dyn EmployeeDirectory,
    ) -> Result<(), ReviewError> {
        check_employee(employee_id, directory)?;
        self.employee_id = employee_id;
        Ok(())
    }

    pub(crate) fn set_id(&mut self, id: Option<i64>) {
        self.id = id;
    }

    /// Overwrite all fields from a stored row, skipping validation
    pub(crate) fn refresh(&mut self, row: ReviewRow) {
        self.id = Some(row.id);
        self.year = row.year;
        self.summary = row.summary;
        self.employee_id = row.employee_id;
    }
}

impl fmt::Display for Review {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id {
            Some(id) => write!(f, "<Review {}: ", id)?,
            None => write!(f, "<Review unsaved: ")?,
        }
        write!(
            f,
            "{}, {}, Employee ID: {}>",
            self.year, self.summary, self.employee_id
        )
    }
}

/// One row of the `reviews` table, in column order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewRow {
    pub id: i64,
    pub year: i64,
    pub summary: String,
    pub employee_id: i64,
}

impl ReviewRow {
    /// Map a `SELECT * FROM reviews` row
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            year: row.get(1)?,
            summary: row.get(2)?,
            employee_id: row.get(3)?,
        })
    }
}

fn check_year(year: i64) -> Result<(), ValidationError> {
    if year < MIN_YEAR {
        return Err(ValidationError::YearOutOfRange { year });
    }
    Ok(())
}

fn check_summary(summary: &str) -> Result<(), ValidationError> {
    if summary.trim().is_empty() {
        return Err(ValidationError::EmptySummary);
    }
    Ok(())
}

fn check_employee(employee_id: i64, directory: &dyn EmployeeDirectory) -> Result<(), ReviewError> {
    match directory.find_by_id(employee_id)? {
        Some(_) => Ok(()),
        None => Err(ValidationError::UnknownEmployee { id: employee_id }.into()),
    }
}
