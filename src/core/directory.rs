//! Employee lookup used to validate `employee_id` on reviews
//!
//! Reviews never write employees. They only ask whether one exists, through
//! the [`EmployeeDirectory`] trait, so callers can plug in the real
//! `employees` table or an in-memory stand-in.

use std::cell::Cell;
use std::collections::HashMap;

use rusqlite::params;
use serde::Serialize;

use crate::core::db::Database;

/// The employee fields a review cares about
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Employee {
    pub id: i64,
    pub name: String,
    pub job_title: String,
}

/// Lookup of employees by primary key
pub trait EmployeeDirectory {
    /// Return the employee with this id, or `None` if there isn't one
    fn find_by_id(&self, id: i64) -> rusqlite::Result<Option<Employee>>;
}

/// Directory backed by the `employees` table of a [`Database`]
#[derive(Clone)]
pub struct SqlEmployeeDirectory {
    db: Database,
}

impl SqlEmployeeDirectory {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

impl EmployeeDirectory for SqlEmployeeDirectory {
    fn find_by_id(&self, id: i64) -> rusqlite::Result<Option<Employee>> {
        self.db.fetch_one(
            "SELECT id, name, job_title FROM employees WHERE id = ?1",
            params![id],
            |row| {
                Ok(Employee {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    job_title: row.get(2)?,
                })
            },
        )
    }
}

/// Fixed in-memory directory
///
/// Counts lookups so callers can see that every assignment hits the
/// directory.
#[derive(Debug, Default)]
pub struct StaticDirectory {
    employees: HashMap<i64, Employee>,
    lookups: Cell<usize>,
}

impl StaticDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with_employee(mut self, id: i64, name: &str, job_title: &str) -> Self {
        self.employees.insert(
            id,
            Employee {
                id,
                name: name.to_string(),
                job_title: job_title.to_string(),
            },
        );
        self
    }

    /// Number of `find_by_id` calls served so far
    pub fn lookups(&self) -> usize {
        self.lookups.get()
    }
}

impl EmployeeDirectory for StaticDirectory {
    fn find_by_id(&self, id: i64) -> rusqlite::Result<Option<Employee>> {
        self.lookups.set(self.lookups.get() + 1);
        Ok(self.employees.get(&id).cloned())
    }
}
