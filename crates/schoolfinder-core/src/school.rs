use serde::{Deserialize, Deserializer, Serialize};

use crate::ids::SchoolId;
use crate::price::PriceRange;

/// Type tag for schools that take both day and boarding students.
/// Always passes a type filter.
pub const COMBINED_TYPE: &str = "Day & Boarding";

/// One school listing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct School {
    pub id: SchoolId,
    pub name: String,
    pub coordinates: Coordinates,
    pub address: Address,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub curriculum: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facilities: Option<Vec<String>>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub school_type: Option<String>,
    #[serde(default)]
    pub verified: bool,
    #[serde(default, deserialize_with = "lenient_rating")]
    pub rating: f64,
    #[serde(default)]
    pub contact_info: ContactInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl School {
    /// Minimal record with every optional field absent.
    pub fn new(id: impl Into<String>, name: impl Into<String>, lga: impl Into<String>) -> Self {
        Self {
            id: SchoolId::from_raw(id),
            name: name.into(),
            coordinates: Coordinates::default(),
            address: Address {
                street: String::new(),
                lga: lga.into(),
                state: "Lagos".into(),
            },
            price_range: None,
            curriculum: None,
            facilities: None,
            school_type: None,
            verified: false,
            rating: 0.0,
            contact_info: ContactInfo::default(),
            image: None,
        }
    }

    /// Parsed price range, if the listing carries one.
    pub fn price(&self) -> Option<PriceRange> {
        self.price_range.as_deref().map(PriceRange::parse)
    }

    pub fn has_facility(&self, facility: &str) -> bool {
        self.facilities
            .as_ref()
            .is_some_and(|f| f.iter().any(|x| x == facility))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    /// Central Lagos, used when there is nothing better to center on.
    pub const LAGOS: Coordinates = Coordinates {
        lat: 6.5244,
        lng: 3.3792,
    };
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default)]
    pub street: String,
    /// Local Government Area; the locality the location filter matches on.
    pub lga: String,
    #[serde(default)]
    pub state: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactInfo {
    #[serde(default)]
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "non_empty")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "non_empty")]
    pub website: Option<String>,
}

/// Ratings show up both as numbers and as numeric strings ("4.2").
fn lenient_rating<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    let rating = match value {
        Some(serde_json::Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(serde_json::Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    };
    Ok(rating.clamp(0.0, 5.0))
}

/// Empty strings are treated the same as a missing value.
fn non_empty<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}
