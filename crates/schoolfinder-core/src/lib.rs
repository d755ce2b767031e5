pub mod criteria;
pub mod errors;
pub mod ids;
pub mod paging;
pub mod price;
pub mod school;
pub mod security;
pub mod settings;
pub mod source;
pub mod vocabulary;

pub use criteria::{Criterion, CriterionField, FilterCriteria};
pub use errors::SourceError;
pub use ids::{PageToken, SchoolId, SessionId};
pub use price::PriceRange;
pub use school::School;
pub use source::{Page, PageRequest, RecordSource};
