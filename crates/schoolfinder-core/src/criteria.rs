use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Independent filter predicates. An empty set or `None` leaves that
/// category inactive.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterCriteria {
    pub min_price: Option<u64>,
    pub max_price: Option<u64>,
    /// Match-any.
    pub curriculum: BTreeSet<String>,
    /// Match-any, loose (substring or combined tag).
    pub school_type: BTreeSet<String>,
    /// Match-all.
    pub facilities: BTreeSet<String>,
    /// Match-any against the address locality.
    pub locations: BTreeSet<String>,
}

impl FilterCriteria {
    pub fn price_active(&self) -> bool {
        self.min_price.is_some() || self.max_price.is_some()
    }

    /// Number of active categories; min and max price count once together.
    pub fn active_count(&self) -> usize {
        [
            self.price_active(),
            !self.curriculum.is_empty(),
            !self.school_type.is_empty(),
            !self.facilities.is_empty(),
            !self.locations.is_empty(),
        ]
        .into_iter()
        .filter(|active| *active)
        .count()
    }

    pub fn is_empty(&self) -> bool {
        self.active_count() == 0
    }

    /// Replace one field.
    pub fn set(&mut self, criterion: Criterion) {
        match criterion {
            Criterion::MinPrice(v) => self.min_price = v,
            Criterion::MaxPrice(v) => self.max_price = v,
            Criterion::Curriculum(v) => self.curriculum = v,
            Criterion::SchoolType(v) => self.school_type = v,
            Criterion::Facilities(v) => self.facilities = v,
            Criterion::Locations(v) => self.locations = v,
        }
    }

    /// Mutable access to a set-valued field. `None` for the price bounds.
    pub fn values_mut(&mut self, field: CriterionField) -> Option<&mut BTreeSet<String>> {
        match field {
            CriterionField::MinPrice | CriterionField::MaxPrice => None,
            CriterionField::Curriculum => Some(&mut self.curriculum),
            CriterionField::SchoolType => Some(&mut self.school_type),
            CriterionField::Facilities => Some(&mut self.facilities),
            CriterionField::Locations => Some(&mut self.locations),
        }
    }
}

/// A replacement value for one field of [`FilterCriteria`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Criterion {
    MinPrice(Option<u64>),
    MaxPrice(Option<u64>),
    Curriculum(BTreeSet<String>),
    SchoolType(BTreeSet<String>),
    Facilities(BTreeSet<String>),
    Locations(BTreeSet<String>),
}

impl Criterion {
    /// Build a set-valued criterion from any list of strings.
    pub fn values<I, S>(field: CriterionField, values: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set: BTreeSet<String> = values.into_iter().map(Into::into).collect();
        match field {
            CriterionField::MinPrice | CriterionField::MaxPrice => None,
            CriterionField::Curriculum => Some(Self::Curriculum(set)),
            CriterionField::SchoolType => Some(Self::SchoolType(set)),
            CriterionField::Facilities => Some(Self::Facilities(set)),
            CriterionField::Locations => Some(Self::Locations(set)),
        }
    }

    pub fn field(&self) -> CriterionField {
        match self {
            Self::MinPrice(_) => CriterionField::MinPrice,
            Self::MaxPrice(_) => CriterionField::MaxPrice,
            Self::Curriculum(_) => CriterionField::Curriculum,
            Self::SchoolType(_) => CriterionField::SchoolType,
            Self::Facilities(_) => CriterionField::Facilities,
            Self::Locations(_) => CriterionField::Locations,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriterionField {
    MinPrice,
    MaxPrice,
    Curriculum,
    SchoolType,
    Facilities,
    Locations,
}

impl std::fmt::Display for CriterionField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::MinPrice => "min_price",
            Self::MaxPrice => "max_price",
            Self::Curriculum => "curriculum",
            Self::SchoolType => "type",
            Self::Facilities => "facilities",
            Self::Locations => "locations",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_inactive() {
        let c = FilterCriteria::default();
        assert!(c.is_empty());
        assert!(!c.price_active());
        assert_eq!(c.active_count(), 0);
    }

    #[test]
    fn price_bounds_count_as_one_category() {
        let mut c = FilterCriteria::default();
        c.set(Criterion::MinPrice(Some(100_000)));
        c.set(Criterion::MaxPrice(Some(500_000)));
        assert_eq!(c.active_count(), 1);
        c.set(Criterion::values(CriterionField::Facilities, ["Library"]).unwrap());
        assert_eq!(c.active_count(), 2);
    }

    #[test]
    fn empty_set_deactivates_category() {
        let mut c = FilterCriteria::default();
        c.set(Criterion::values(CriterionField::Curriculum, ["British"]).unwrap());
        assert!(!c.is_empty());
        c.set(Criterion::Curriculum(BTreeSet::new()));
        assert!(c.is_empty());
    }

    #[test]
    fn price_fields_have_no_value_set() {
        let mut c = FilterCriteria::default();
        assert!(c.values_mut(CriterionField::MinPrice).is_none());
        assert!(Criterion::values(CriterionField::MaxPrice, ["1"]).is_none());
        assert!(c.values_mut(CriterionField::Locations).is_some());
    }

    #[test]
    fn criterion_reports_its_field() {
        let c = Criterion::values(CriterionField::SchoolType, ["Day"]).unwrap();
        assert_eq!(c.field(), CriterionField::SchoolType);
        assert_eq!(c.field().to_string(), "type");
    }
}
