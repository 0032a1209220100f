//! Identity map: one live review per row id

use std::collections::HashMap;
use std::rc::Rc;

use crate::entities::review::ReviewRef;

/// Maps row ids to the canonical in-memory review for that row
///
/// Entries are only removed by an explicit [`IdentityMap::remove`] on review
/// deletion; nothing is evicted.
#[derive(Debug, Default)]
pub struct IdentityMap {
    entries: HashMap<i64, ReviewRef>,
}

impl IdentityMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// The canonical instance for `id`, if one is loaded
    pub fn get(&self, id: i64) -> Option<ReviewRef> {
        self.entries.get(&id).map(Rc::clone)
    }

    /// Make `review` the canonical instance for `id`, replacing any other
    pub fn insert(&mut self, id: i64, review: ReviewRef) {
        self.entries.insert(id, review);
    }

    pub fn remove(&mut self, id: i64) -> Option<ReviewRef> {
        self.entries.remove(&id)
    }

    pub fn contains(&self, id: i64) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
