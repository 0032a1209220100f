//! Review persistence: CRUD against the `reviews` table plus the identity map
//!
//! The store owns the database handle, the employee directory used for
//! validation, and the identity map. Dropping the store drops the map, so a
//! fresh store always starts with an empty cache.

use std::cell::{Ref, RefMut};
use std::rc::Rc;

use rusqlite::params;
use tracing::{debug, info};

use crate::core::db::Database;
use crate::core::directory::EmployeeDirectory;
use crate::core::error::{ReviewError, Result};
use crate::core::identity_map::IdentityMap;
use crate::entities::review::{Review, ReviewRef, ReviewRow};

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS reviews (
        id INTEGER PRIMARY KEY,
        year INTEGER,
        summary TEXT,
        employee_id INTEGER,
        FOREIGN KEY (employee_id) REFERENCES employees(id)
    )
"#;

const DROP_TABLE: &str = "DROP TABLE IF EXISTS reviews";

const INSERT_REVIEW: &str = "INSERT INTO reviews (year, summary, employee_id) VALUES (?1, ?2, ?3)";

const UPDATE_REVIEW: &str =
    "UPDATE reviews SET year = ?1, summary = ?2, employee_id = ?3 WHERE id = ?4";

const DELETE_REVIEW: &str = "DELETE FROM reviews WHERE id = ?1";

/// Persistence for [`Review`] records
pub struct ReviewStore {
    db: Database,
    directory: Box<dyn EmployeeDirectory>,
    cache: IdentityMap,
}

impl ReviewStore {
    pub fn new(db: Database, directory: impl EmployeeDirectory + 'static) -> Self {
        Self {
            db,
            directory: Box::new(directory),
            cache: IdentityMap::new(),
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Directory to pass to [`Review::set_employee_id`]
    pub fn directory(&self) -> &dyn EmployeeDirectory {
        self.directory.as_ref()
    }

    pub fn cache(&self) -> &IdentityMap {
        &self.cache
    }

    /// Create the `reviews` table if it doesn't exist
    pub fn create_table(&self) -> Result<()> {
        self.db.execute_batch(CREATE_TABLE)?;
        info!("created reviews table");
        Ok(())
    }

    /// Drop the `reviews` table if it exists
    ///
    /// Cached instances are left alone; they keep their ids.
    pub fn drop_table(&self) -> Result<()> {
        self.db.execute_batch(DROP_TABLE)?;
        info!("dropped reviews table");
        Ok(())
    }

    /// Build a validated, unsaved review
    pub fn build(&self, year: i64, summary: impl Into<String>, employee_id: i64) -> Result<ReviewRef> {
        Ok(Review::new(year, summary, employee_id, self.directory())?.into_shared())
    }

    /// Insert the review if it has no id, otherwise update its row
    ///
    /// Either way the review becomes the cached instance for its id.
    pub fn save(&mut self, review: &ReviewRef) -> Result<()> {
        let id = {
            let mut r = write_access(review, "saved")?;
            match r.id() {
                None => {
                    self.db.execute(
                        INSERT_REVIEW,
                        params![r.year(), r.summary(), r.employee_id()],
                    )?;
                    let id = self.db.last_insert_rowid();
                    r.set_id(Some(id));
                    debug!(id, "inserted review");
                    id
                }
                Some(id) => {
                    self.write(&r, id)?;
                    id
                }
            }
        };

        self.cache.insert(id, Rc::clone(review));
        Ok(())
    }

    /// Build and save a review in one step
    pub fn create(&mut self, year: i64, summary: impl Into<String>, employee_id: i64) -> Result<ReviewRef> {
        let review = self.build(year, summary, employee_id)?;
        self.save(&review)?;
        Ok(review)
    }

    /// Canonical instance for a stored row
    ///
    /// A cached instance is refreshed in place from the row; otherwise a new
    /// instance is cached. Row values are trusted and skip validation.
    /// Fails with [`ReviewError::Busy`] if the caller still holds a borrow of
    /// the cached instance.
    pub fn instance_from_db(&mut self, row: ReviewRow) -> Result<ReviewRef> {
        if let Some(existing) = self.cache.get(row.id) {
            write_access(&existing, "reloaded")?.refresh(row);
            return Ok(existing);
        }

        let id = row.id;
        let review = Review::from_row(row).into_shared();
        self.cache.insert(id, Rc::clone(&review));
        Ok(review)
    }

    /// Look a review up by id; a missing row is `Ok(None)`
    pub fn find_by_id(&mut self, id: i64) -> Result<Option<ReviewRef>> {
        let row = self.db.fetch_one(
            "SELECT * FROM reviews WHERE id = ?1",
            params![id],
            ReviewRow::from_row,
        )?;
        debug!(id, found = row.is_some(), "looked up review");
        row.map(|row| self.instance_from_db(row)).transpose()
    }

    /// Every stored review, in the order SQLite returns them
    pub fn get_all(&mut self) -> Result<Vec<ReviewRef>> {
        let rows = self
            .db
            .fetch_all("SELECT * FROM reviews", [], ReviewRow::from_row)?;
        debug!(count = rows.len(), "loaded all reviews");
        self.instances_from_db(rows)
    }

    /// Every review written for one employee
    pub fn find_by_employee(&mut self, employee_id: i64) -> Result<Vec<ReviewRef>> {
        let rows = self.db.fetch_all(
            "SELECT * FROM reviews WHERE employee_id = ?1",
            params![employee_id],
            ReviewRow::from_row,
        )?;
        debug!(employee_id, count = rows.len(), "loaded reviews for employee");
        self.instances_from_db(rows)
    }

    /// Write the review's current fields to its row
    ///
    /// The review must already have an id. The cache is not touched.
    pub fn update(&self, review: &ReviewRef) -> Result<()> {
        let r = read_access(review, "updated")?;
        let id = r.id().ok_or(ReviewError::NotPersisted { action: "update" })?;
        self.write(&r, id)
    }

    /// Delete the review's row, evict it from the cache and clear its id
    ///
    /// The instance stays usable; saving it again inserts a new row.
    pub fn delete(&mut self, review: &ReviewRef) -> Result<()> {
        let mut r = write_access(review, "deleted")?;
        let id = r.id().ok_or(ReviewError::NotPersisted { action: "delete" })?;

        self.db.execute(DELETE_REVIEW, params![id])?;
        self.cache.remove(id);
        r.set_id(None);
        debug!(id, "deleted review");
        Ok(())
    }

    fn write(&self, review: &Review, id: i64) -> Result<()> {
        self.db.execute(
            UPDATE_REVIEW,
            params![review.year(), review.summary(), review.employee_id(), id],
        )?;
        debug!(id, "updated review");
        Ok(())
    }

    fn instances_from_db(&mut self, rows: Vec<ReviewRow>) -> Result<Vec<ReviewRef>> {
        rows.into_iter()
            .map(|row| self.instance_from_db(row))
            .collect()
    }
}

fn read_access<'a>(review: &'a ReviewRef, action: &'static str) -> Result<Ref<'a, Review>> {
    review
        .try_borrow()
        .map_err(|_| ReviewError::Busy { action })
}

fn write_access<'a>(review: &'a ReviewRef, action: &'static str) -> Result<RefMut<'a, Review>> {
    review
        .try_borrow_mut()
        .map_err(|_| ReviewError::Busy { action })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::directory::{SqlEmployeeDirectory, StaticDirectory};
    use crate::core::error::ValidationError;

    fn setup() -> ReviewStore {
        let directory = StaticDirectory::new()
            .with_employee(7, "Ada", "Engineer")
            .with_employee(8, "Grace", "Manager");
        let store = ReviewStore::new(Database::open_in_memory().unwrap(), directory);
        store.create_table().unwrap();
        store
    }

    fn stored_year(store: &ReviewStore, id: i64) -> Option<i64> {
        store
            .database()
            .fetch_one("SELECT year FROM reviews WHERE id = ?1", params![id], |row| {
                row.get(0)
            })
            .unwrap()
    }

    #[test]
    fn test_create_assigns_id_and_caches() {
        let mut store = setup();

        let review = store.create(2021, "Needs improvement", 7).unwrap();

        let r = review.borrow();
        assert_eq!(r.id(), Some(1));
        assert_eq!(r.year(), 2021);
        assert_eq!(r.summary(), "Needs improvement");
        assert_eq!(r.employee_id(), 7);
        assert!(Rc::ptr_eq(&store.cache().get(1).unwrap(), &review));
    }

    #[test]
    fn test_create_then_find_is_same_instance() {
        let mut store = setup();
        let created = store.create(2023, "Good work", 7).unwrap();
        let id = created.borrow().id().unwrap();

        let found = store.find_by_id(id).unwrap().unwrap();

        assert!(Rc::ptr_eq(&created, &found));
        assert_eq!(found.borrow().year(), 2023);
        assert_eq!(found.borrow().summary(), "Good work");
        assert_eq!(found.borrow().employee_id(), 7);
    }

    #[test]
    fn test_create_with_invalid_field_writes_nothing() {
        let mut store = setup();

        let err = store.create(1999, "Too early", 7).unwrap_err();
        assert!(matches!(
            err,
            ReviewError::Validation(ValidationError::YearOutOfRange { year: 1999 })
        ));
        assert!(store.get_all().unwrap().is_empty());
        assert!(store.cache().is_empty());
    }

    #[test]
    fn test_repeated_find_returns_same_instance() {
        let mut store = setup();
        store.create(2022, "Steady", 8).unwrap();

        let a = store.find_by_id(1).unwrap().unwrap();
        let b = store.find_by_id(1).unwrap().unwrap();
        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(store.cache().len(), 1);
    }

    #[test]
    fn test_find_missing_is_none() {
        let mut store = setup();
        assert!(store.find_by_id(404).unwrap().is_none());
    }

    #[test]
    fn test_reload_refreshes_held_instance() {
        let mut store = setup();
        let held = store.create(2022, "Steady", 8).unwrap();

        store
            .database()
            .execute(
                "UPDATE reviews SET summary = ?1, year = ?2 WHERE id = ?3",
                params!["Rewritten", 2024, 1],
            )
            .unwrap();
        store.find_by_id(1).unwrap();

        assert_eq!(held.borrow().summary(), "Rewritten");
        assert_eq!(held.borrow().year(), 2024);
    }

    #[test]
    fn test_instance_from_db_builds_uncached_rows() {
        let mut store = setup();
        let row = ReviewRow {
            id: 12,
            year: 2020,
            summary: "Imported".to_string(),
            employee_id: 7,
        };

        let first = store.instance_from_db(row.clone()).unwrap();
        let second = store.instance_from_db(row).unwrap();

        assert_eq!(first.borrow().id(), Some(12));
        assert!(Rc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_save_updates_existing_row() {
        let mut store = setup();
        let review = store.create(2021, "Needs improvement", 7).unwrap();

        review.borrow_mut().set_year(2022).unwrap();
        store.save(&review).unwrap();

        assert_eq!(review.borrow().id(), Some(1));
        assert_eq!(stored_year(&store, 1), Some(2022));
        assert_eq!(store.get_all().unwrap().len(), 1);
    }

    #[test]
    fn test_save_makes_instance_canonical() {
        let mut store = setup();
        let original = store.create(2021, "First", 7).unwrap();

        // A second instance carrying the same id takes over the cache slot.
        let stand_in = Review::from_row(ReviewRow {
            id: 1,
            year: 2025,
            summary: "Replacement".to_string(),
            employee_id: 8,
        })
        .into_shared();
        store.save(&stand_in).unwrap();

        let found = store.find_by_id(1).unwrap().unwrap();
        assert!(Rc::ptr_eq(&found, &stand_in));
        assert!(!Rc::ptr_eq(&found, &original));
        assert_eq!(found.borrow().summary(), "Replacement");
    }

    #[test]
    fn test_rejected_setter_leaves_stored_year() {
        let mut store = setup();
        let review = store.create(2021, "Needs improvement", 7).unwrap();

        assert!(review.borrow_mut().set_year(1999).is_err());
        store.update(&review).unwrap();

        assert_eq!(review.borrow().year(), 2021);
        assert_eq!(stored_year(&store, 1), Some(2021));
    }

    #[test]
    fn test_update_writes_fields_without_touching_cache() {
        let mut store = setup();
        let review = store.create(2021, "Needs improvement", 7).unwrap();

        {
            let mut r = review.borrow_mut();
            r.set_summary("Much better").unwrap();
            r.set_employee_id(8, store.directory()).unwrap();
        }
        store.update(&review).unwrap();

        let row = store
            .database()
            .fetch_one("SELECT * FROM reviews WHERE id = 1", [], ReviewRow::from_row)
            .unwrap()
            .unwrap();
        assert_eq!(row.summary, "Much better");
        assert_eq!(row.employee_id, 8);
        assert_eq!(store.cache().len(), 1);
    }

    #[test]
    fn test_update_and_delete_require_id() {
        let mut store = setup();
        let review = store.build(2021, "Draft", 7).unwrap();

        assert!(matches!(
            store.update(&review),
            Err(ReviewError::NotPersisted { action: "update" })
        ));
        assert!(matches!(
            store.delete(&review),
            Err(ReviewError::NotPersisted { action: "delete" })
        ));
    }

    #[test]
    fn test_delete_removes_row_and_cache_entry() {
        let mut store = setup();
        let review = store.create(2021, "Needs improvement", 7).unwrap();

        store.delete(&review).unwrap();

        assert_eq!(review.borrow().id(), None);
        assert!(!store.cache().contains(1));
        assert!(store.find_by_id(1).unwrap().is_none());
    }

    #[test]
    fn test_deleted_review_can_be_saved_again() {
        let mut store = setup();
        let review = store.create(2021, "Needs improvement", 7).unwrap();
        store.delete(&review).unwrap();

        store.save(&review).unwrap();

        let id = review.borrow().id().unwrap();
        assert_eq!(id, 2);
        assert!(Rc::ptr_eq(&store.find_by_id(id).unwrap().unwrap(), &review));
    }

    #[test]
    fn test_get_all_and_find_by_employee() {
        let mut store = setup();
        let a = store.create(2021, "One", 7).unwrap();
        let b = store.create(2022, "Two", 8).unwrap();
        let c = store.create(2023, "Three", 7).unwrap();

        let all = store.get_all().unwrap();
        assert_eq!(all.len(), 3);
        for (loaded, created) in all.iter().zip([&a, &b, &c]) {
            assert!(Rc::ptr_eq(loaded, created));
        }

        let ada: Vec<i64> = store
            .find_by_employee(7)
            .unwrap()
            .iter()
            .map(|r| r.borrow().year())
            .collect();
        assert_eq!(ada.len(), 2);
        assert!(ada.contains(&2021) && ada.contains(&2023));
    }

    #[test]
    fn test_create_and_drop_table_are_idempotent() {
        let mut store = setup();
        store.create_table().unwrap();
        store.create(2021, "Kept", 7).unwrap();
        store.create_table().unwrap();
        assert_eq!(store.get_all().unwrap().len(), 1);

        store.drop_table().unwrap();
        store.drop_table().unwrap();
        assert!(matches!(store.get_all(), Err(ReviewError::Storage(_))));
    }

    #[test]
    fn test_storage_errors_pass_through() {
        let mut store = ReviewStore::new(
            Database::open_in_memory().unwrap(),
            StaticDirectory::new().with_employee(7, "Ada", "Engineer"),
        );

        // No table yet
        let err = store.create(2021, "Orphan", 7).unwrap_err();
        assert!(matches!(err, ReviewError::Storage(_)));
    }

    #[test]
    fn test_reload_while_borrowed_is_busy() {
        let mut store = setup();
        let review = store.create(2021, "Needs improvement", 7).unwrap();

        let held = review.borrow();
        assert!(matches!(
            store.find_by_id(1),
            Err(ReviewError::Busy { action: "reloaded" })
        ));
        assert!(matches!(
            store.get_all(),
            Err(ReviewError::Busy { action: "reloaded" })
        ));
        assert!(matches!(
            store.find_by_employee(7),
            Err(ReviewError::Busy { action: "reloaded" })
        ));
        drop(held);

        let found = store.find_by_id(1).unwrap().unwrap();
        assert!(Rc::ptr_eq(&found, &review));
    }

    #[test]
    fn test_writes_while_borrowed_are_busy() {
        let mut store = setup();
        let review = store.create(2021, "Needs improvement", 7).unwrap();

        {
            let _reader = review.borrow();
            assert!(matches!(
                store.save(&review),
                Err(ReviewError::Busy { action: "saved" })
            ));
            assert!(matches!(
                store.delete(&review),
                Err(ReviewError::Busy { action: "deleted" })
            ));
            // Reading alongside another reader is fine
            store.update(&review).unwrap();
        }

        {
            let mut writer = review.borrow_mut();
            writer.set_year(2030).unwrap();
            assert!(matches!(
                store.update(&review),
                Err(ReviewError::Busy { action: "updated" })
            ));
        }

        assert_eq!(stored_year(&store, 1), Some(2021));
        assert!(store.cache().contains(1));
        store.update(&review).unwrap();
        assert_eq!(stored_year(&store, 1), Some(2030));
    }

    #[test]
    fn test_removed_employee_does_not_block_writes() {
        let db = Database::open_in_memory().unwrap();
        db.execute_batch(
            "CREATE TABLE employees (id INTEGER PRIMARY KEY, name TEXT, job_title TEXT);
             INSERT INTO employees (id, name, job_title) VALUES (7, 'Ada', 'Engineer');",
        )
        .unwrap();
        let mut store = ReviewStore::new(db.clone(), SqlEmployeeDirectory::new(db));
        store.create_table().unwrap();
        let review = store.create(2021, "Needs improvement", 7).unwrap();

        store
            .database()
            .execute("DELETE FROM employees WHERE id = ?1", params![7])
            .unwrap();

        // References are checked on assignment, not by SQLite on write.
        review.borrow_mut().set_year(2022).unwrap();
        store.update(&review).unwrap();
        assert_eq!(stored_year(&store, 1), Some(2022));

        let err = review
            .borrow_mut()
            .set_employee_id(7, store.directory())
            .unwrap_err();
        assert!(matches!(
            err,
            ReviewError::Validation(ValidationError::UnknownEmployee { id: 7 })
        ));
        assert_eq!(review.borrow().employee_id(), 7);
    }

    #[test]
    fn test_static_directory_writes_without_employees_table() {
        let mut store = setup();

        let review = store.create(2021, "Needs improvement", 7).unwrap();

        assert_eq!(review.borrow().id(), Some(1));
        assert!(store
            .database()
            .fetch_one(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'employees'",
                [],
                |row| row.get::<_, String>(0),
            )
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_sql_directory_shares_database() {
        let db = Database::open_in_memory().unwrap();
        db.execute_batch(
            "CREATE TABLE employees (id INTEGER PRIMARY KEY, name TEXT, job_title TEXT);
             INSERT INTO employees (id, name, job_title) VALUES (7, 'Ada', 'Engineer');",
        )
        .unwrap();
        let mut store = ReviewStore::new(db.clone(), SqlEmployeeDirectory::new(db));
        store.create_table().unwrap();

        let review = store.create(2021, "Needs improvement", 7).unwrap();
        assert_eq!(review.borrow().id(), Some(1));
        assert!(matches!(
            store.create(2021, "Nobody", 9),
            Err(ReviewError::Validation(ValidationError::UnknownEmployee { id: 9 }))
        ));
    }
}
