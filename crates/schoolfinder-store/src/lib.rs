pub mod catalog;
pub mod database;
pub mod error;
pub mod row_helpers;
pub mod schema;
pub mod schools;
pub mod seed;

pub use catalog::CatalogSource;
pub use database::Database;
pub use error::StoreError;
pub use schools::SchoolRepo;
