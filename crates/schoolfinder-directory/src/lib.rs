//! Client-side directory state: page accumulation, filtering, the compare
//! selection and favorites.

pub mod error;
pub mod filter;
pub mod selection;
pub mod state;

pub use error::DirectoryError;
pub use selection::{
    CompareSelection, ComparisonTable, FacilityRow, Favorites, SelectionChange, SelectionError,
    COMPARE_LIMIT,
};
pub use state::{DirectoryState, FetchOutcome, FetchStatus};
