mod model;
mod planner;
mod provider;

pub use model::{Route, RouteStep};
pub use planner::RoutePlanner;
pub use provider::{
    DirectionsProvider, DirectionsResponse, DirectionsRoute, DirectionsStep, Profile,
};
