use crate::directory::Location;
use crate::geo::Coordinates;

#[derive(Debug, Clone, PartialEq)]
pub struct RouteStep {
    pub instruction: String,
    pub distance_m: f64,
    pub geometry: Vec<Coordinates>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub origin: Coordinates,
    pub destination: Location,
    pub distance_m: f64,
    /// Zero when the provider reported no duration.
    pub duration_s: f64,
    pub steps: Vec<RouteStep>,
    pub geometry: Vec<Coordinates>,
}

impl Route {
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn step(&self, index: usize) -> Option<&RouteStep> {
        self.steps.get(index)
    }

    /// Distance still to walk when standing at the start of step `index`.
    pub fn remaining_distance_m(&self, index: usize) -> f64 {
        self.steps.iter().skip(index).map(|step| step.distance_m).sum()
    }
}
