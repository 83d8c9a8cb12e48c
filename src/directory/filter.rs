use super::location::{Category, Location};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    pub fn parse(value: &str) -> Option<Self> {
        if value.trim().eq_ignore_ascii_case("all") {
            return Some(Self::All);
        }
        Category::parse(value).map(Self::Only)
    }

    pub fn matches(self, location: &Location) -> bool {
        match self {
            Self::All => true,
            Self::Only(category) => location.category == category,
        }
    }
}

pub fn filter_by_category(all: &[Location], filter: CategoryFilter) -> Vec<Location> {
    all.iter()
        .filter(|location| filter.matches(location))
        .cloned()
        .collect()
}

pub fn filter_by_text(locations: &[Location], query: &str) -> Vec<Location> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return locations.to_vec();
    }

    locations
        .iter()
        .filter(|location| text_matches(location, &query))
        .cloned()
        .collect()
}

pub(crate) fn text_matches(location: &Location, lowered_query: &str) -> bool {
    location.name.to_lowercase().contains(lowered_query)
        || location.kind.to_lowercase().contains(lowered_query)
        || location
            .faculty
            .as_deref()
            .is_some_and(|faculty| faculty.to_lowercase().contains(lowered_query))
}
