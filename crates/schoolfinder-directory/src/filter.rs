//! Record predicates. A record is kept iff it passes every active
//! category; an absent optional field never matches.

use schoolfinder_core::school::COMBINED_TYPE;
use schoolfinder_core::{FilterCriteria, School};

/// Stable filter of `records`. Pure: the same inputs give the same output
/// in the same order.
pub fn apply(records: &[School], criteria: &FilterCriteria) -> Vec<School> {
    if criteria.is_empty() {
        return records.to_vec();
    }
    records
        .iter()
        .filter(|s| matches(s, criteria))
        .cloned()
        .collect()
}

pub fn matches(school: &School, criteria: &FilterCriteria) -> bool {
    price_matches(school, criteria)
        && curriculum_matches(school, criteria)
        && type_matches(school, criteria)
        && facilities_match(school, criteria)
        && location_matches(school, criteria)
}

fn price_matches(school: &School, criteria: &FilterCriteria) -> bool {
    if !criteria.price_active() {
        return true;
    }
    school
        .price()
        .is_some_and(|range| range.overlaps(criteria.min_price, criteria.max_price))
}

/// Match-any.
fn curriculum_matches(school: &School, criteria: &FilterCriteria) -> bool {
    if criteria.curriculum.is_empty() {
        return true;
    }
    school
        .curriculum
        .as_ref()
        .is_some_and(|tags| tags.iter().any(|t| criteria.curriculum.contains(t)))
}

/// Loose match-any: the record's tag contains a wanted value, or the record
/// takes both day and boarding students.
fn type_matches(school: &School, criteria: &FilterCriteria) -> bool {
    if criteria.school_type.is_empty() {
        return true;
    }
    school.school_type.as_deref().is_some_and(|t| {
        t == COMBINED_TYPE || criteria.school_type.iter().any(|v| t.contains(v.as_str()))
    })
}

/// Match-all.
fn facilities_match(school: &School, criteria: &FilterCriteria) -> bool {
    if criteria.facilities.is_empty() {
        return true;
    }
    school
        .facilities
        .as_ref()
        .is_some_and(|have| criteria.facilities.iter().all(|f| have.contains(f)))
}

fn location_matches(school: &School, criteria: &FilterCriteria) -> bool {
    criteria.locations.is_empty() || criteria.locations.contains(&school.address.lga)
}
