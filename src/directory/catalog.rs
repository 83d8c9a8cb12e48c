use crate::geo::Coordinates;

use super::filter::filter_by_text;
use super::location::{Category, Location, LocationId, Source};

struct CatalogEntry {
    id: &'static str,
    name: &'static str,
    category: Category,
    kind: &'static str,
    faculty: Option<&'static str>,
    lat: f64,
    lon: f64,
    description: &'static str,
    icon_key: &'static str,
}

const BUILTIN: &[CatalogEntry] = &[
    CatalogEntry {
        id: "1",
        name: "Library",
        category: Category::Facility,
        kind: "Main Library",
        faculty: None,
        lat: 6.3985,
        lon: 5.6142,
        description: "Central university library with reading rooms and e-library.",
        icon_key: "library",
    },
    CatalogEntry {
        id: "2",
        name: "Senate Building",
        category: Category::Administrative,
        kind: "Administrative Office",
        faculty: None,
        lat: 6.4002,
        lon: 5.6125,
        description: "Vice-Chancellor's office, registry and senate chamber.",
        icon_key: "admin",
    },
    CatalogEntry {
        id: "3",
        name: "Faculty of Engineering",
        category: Category::Academic,
        kind: "Faculty Complex",
        faculty: Some("Faculty of Engineering"),
        lat: 6.3958,
        lon: 5.6178,
        description: "Departments of civil, electrical and mechanical engineering.",
        icon_key: "faculty",
    },
    CatalogEntry {
        id: "4",
        name: "Engineering Lecture Theatre",
        category: Category::Academic,
        kind: "Lecture Theatre",
        faculty: Some("Faculty of Engineering"),
        lat: 6.3951,
        lon: 5.6186,
        description: "Large lecture theatre shared by engineering departments.",
        icon_key: "lecture",
    },
    CatalogEntry {
        id: "5",
        name: "Faculty of Physical Sciences",
        category: Category::Academic,
        kind: "Faculty Complex",
        faculty: Some("Faculty of Physical Sciences"),
        lat: 6.3996,
        lon: 5.6161,
        description: "Computer science, mathematics, physics and chemistry.",
        icon_key: "faculty",
    },
    CatalogEntry {
        id: "6",
        name: "Faculty of Arts",
        category: Category::Academic,
        kind: "Faculty Complex",
        faculty: Some("Faculty of Arts"),
        lat: 6.4011,
        lon: 5.6149,
        description: "Languages, history and theatre arts.",
        icon_key: "faculty",
    },
    CatalogEntry {
        id: "7",
        name: "Bursary",
        category: Category::Administrative,
        kind: "Administrative Office",
        faculty: None,
        lat: 6.4006,
        lon: 5.6118,
        description: "Fees, payments and student accounts.",
        icon_key: "admin",
    },
    CatalogEntry {
        id: "8",
        name: "Admissions Office",
        category: Category::Administrative,
        kind: "Administrative Office",
        faculty: None,
        lat: 6.3999,
        lon: 5.6112,
        description: "Admissions, screening and matriculation.",
        icon_key: "admin",
    },
    CatalogEntry {
        id: "9",
        name: "Health Centre",
        category: Category::Facility,
        kind: "Clinic",
        faculty: None,
        lat: 6.3972,
        lon: 5.6103,
        description: "Student health services, open around the clock.",
        icon_key: "health",
    },
    CatalogEntry {
        id: "10",
        name: "Hall 2",
        category: Category::Facility,
        kind: "Hostel",
        faculty: None,
        lat: 6.3934,
        lon: 5.6131,
        description: "Undergraduate hall of residence.",
        icon_key: "hostel",
    },
    CatalogEntry {
        id: "11",
        name: "Sports Complex",
        category: Category::Facility,
        kind: "Stadium",
        faculty: None,
        lat: 6.3921,
        lon: 5.6204,
        description: "Main bowl, courts and swimming pool.",
        icon_key: "sports",
    },
    CatalogEntry {
        id: "12",
        name: "Main Gate",
        category: Category::Facility,
        kind: "Entrance",
        faculty: None,
        lat: 6.4037,
        lon: 5.6089,
        description: "Main campus entrance on the expressway.",
        icon_key: "gate",
    },
];

#[derive(Debug, Clone)]
pub struct Catalog {
    locations: Vec<Location>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Catalog {
    pub fn builtin() -> Self {
        Self::from_locations(BUILTIN.iter().map(CatalogEntry::to_location).collect())
    }

    pub fn from_locations(mut locations: Vec<Location>) -> Self {
        for location in &mut locations {
            location.source = Source::Catalog;
        }
        Self { locations }
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn get(&self, id: &LocationId) -> Option<&Location> {
        self.locations.iter().find(|location| &location.id == id)
    }

    /// Exact id first, then the first text match.
    pub fn find(&self, query: &str) -> Option<&Location> {
        let query = query.trim();
        if query.is_empty() {
            return None;
        }
        if let Some(location) = self.get(&LocationId::new(query)) {
            return Some(location);
        }

        let first = filter_by_text(&self.locations, query).into_iter().next()?;
        self.get(&first.id)
    }
}

impl CatalogEntry {
    fn to_location(&self) -> Location {
        Location {
            id: LocationId::new(self.id),
            name: self.name.to_string(),
            category: self.category,
            kind: self.kind.to_string(),
            faculty: self.faculty.map(str::to_string),
            coordinates: Coordinates::new(self.lat, self.lon),
            description: self.description.to_string(),
            icon_key: self.icon_key.to_string(),
            source: Source::Catalog,
            image_url: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::Catalog;
    use crate::directory::{LocationId, Source};

    #[test]
    fn builtin_ids_are_unique_and_not_namespaced() {
        let catalog = Catalog::builtin();
        let ids: HashSet<_> = catalog.locations().iter().map(|l| &l.id).collect();
        assert_eq!(ids.len(), catalog.len());
        assert!(catalog.locations().iter().all(|l| !l.id.is_geocoded()));
        assert!(catalog.locations().iter().all(|l| l.source == Source::Catalog));
    }

    #[test]
    fn find_prefers_exact_id_then_text() {
        let catalog = Catalog::builtin();
        assert_eq!(
            catalog.find("1").map(|l| l.name.as_str()),
            Some("Library")
        );
        assert_eq!(
            catalog.find("senate").map(|l| l.id.clone()),
            Some(LocationId::new("2"))
        );
        assert!(catalog.find("observatory").is_none());
        assert!(catalog.find("  ").is_none());
    }
}
