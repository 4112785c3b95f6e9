//! Survey data model: pointings, catalog, query parameters and summaries.

pub mod query;
pub mod summary;
pub mod types;

pub use query::{angular_separation, CoordinateFilter, QueryParams};
pub use summary::SurveySummary;
pub use types::*;
