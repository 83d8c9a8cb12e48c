mod catalog;
mod filter;
mod location;

pub use catalog::Catalog;
pub use filter::{CategoryFilter, filter_by_category, filter_by_text};
pub use location::{Category, GEOCODED_ID_PREFIX, Location, LocationId, Source};
