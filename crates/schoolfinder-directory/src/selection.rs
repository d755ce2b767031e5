use std::collections::BTreeSet;

use serde::Serialize;

use schoolfinder_core::{School, SchoolId};

/// Maximum number of schools in a side-by-side comparison.
pub const COMPARE_LIMIT: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    #[error("You can only compare up to {limit} schools.")]
    LimitReached { limit: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionChange {
    Added,
    Removed,
}

/// Ordered, bounded set of schools picked for comparison.
#[derive(Debug, Clone, Default)]
pub struct CompareSelection {
    items: Vec<School>,
}

impl CompareSelection {
    /// Remove `school` if selected, otherwise append it. A full selection
    /// rejects the add and stays unchanged.
    pub fn toggle(&mut self, school: &School) -> Result<SelectionChange, SelectionError> {
        if let Some(pos) = self.position(&school.id) {
            self.items.remove(pos);
            return Ok(SelectionChange::Removed);
        }
        if self.items.len() >= COMPARE_LIMIT {
            return Err(SelectionError::LimitReached {
                limit: COMPARE_LIMIT,
            });
        }
        self.items.push(school.clone());
        Ok(SelectionChange::Added)
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn contains(&self, id: &SchoolId) -> bool {
        self.position(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= COMPARE_LIMIT
    }

    pub fn as_slice(&self) -> &[School] {
        &self.items
    }

    fn position(&self, id: &SchoolId) -> Option<usize> {
        self.items.iter().position(|s| &s.id == id)
    }
}

/// Favorite schools keyed by id, listed in the order they were added.
#[derive(Debug, Clone, Default)]
pub struct Favorites {
    items: Vec<School>,
}

impl Favorites {
    /// Returns true if `school` is a favorite afterwards.
    pub fn toggle(&mut self, school: &School) -> bool {
        match self.items.iter().position(|s| s.id == school.id) {
            Some(pos) => {
                self.items.remove(pos);
                false
            }
            None => {
                self.items.push(school.clone());
                true
            }
        }
    }

    pub fn contains(&self, id: &SchoolId) -> bool {
        self.items.iter().any(|s| &s.id == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &School> {
        self.items.iter()
    }
}

/// Side-by-side view of the compare selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonTable {
    pub schools: Vec<School>,
    /// One row per facility offered by any selected school, sorted by name.
    pub facilities: Vec<FacilityRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FacilityRow {
    pub facility: String,
    /// Parallel to `schools`.
    pub present: Vec<bool>,
}

impl ComparisonTable {
    pub fn build(schools: &[School]) -> Self {
        let names: BTreeSet<&str> = schools
            .iter()
            .filter_map(|s| s.facilities.as_ref())
            .flatten()
            .map(String::as_str)
            .collect();

        let facilities = names
            .into_iter()
            .map(|name| FacilityRow {
                facility: name.to_string(),
                present: schools.iter().map(|s| s.has_facility(name)).collect(),
            })
            .collect();

        Self {
            schools: schools.to_vec(),
            facilities,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.schools.is_empty()
    }
}
