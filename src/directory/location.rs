use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geo::Coordinates;

pub const GEOCODED_ID_PREFIX: &str = "geo:";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationId(String);

impl LocationId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn geocoded(provider_id: &str) -> Self {
        Self(format!("{GEOCODED_ID_PREFIX}{provider_id}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_geocoded(&self) -> bool {
        self.0.starts_with(GEOCODED_ID_PREFIX)
    }
}

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Academic,
    Administrative,
    Facility,
    Searched,
}

impl Category {
    pub const ALL: [Self; 4] = [
        Self::Academic,
        Self::Administrative,
        Self::Facility,
        Self::Searched,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Self::Academic => "academic",
            Self::Administrative => "administrative",
            Self::Facility => "facility",
            Self::Searched => "searched",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|category| category.id().eq_ignore_ascii_case(value.trim()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Catalog,
    Geocoded,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    pub category: Category,
    pub kind: String,
    pub faculty: Option<String>,
    pub coordinates: Coordinates,
    pub description: String,
    pub icon_key: String,
    pub source: Source,
    pub image_url: Option<String>,
}

impl Location {
    pub fn geocoded(provider_id: &str, display_name: &str, coordinates: Coordinates) -> Self {
        Self {
            id: LocationId::geocoded(provider_id),
            name: short_name(display_name).to_string(),
            category: Category::Searched,
            kind: "Search result".to_string(),
            faculty: None,
            coordinates,
            description: display_name.to_string(),
            icon_key: "search".to_string(),
            source: Source::Geocoded,
            image_url: None,
        }
    }
}

fn short_name(display_name: &str) -> &str {
    display_name
        .split(',')
        .next()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(display_name)
}
