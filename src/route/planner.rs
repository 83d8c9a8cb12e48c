use std::sync::Arc;

use tracing::{debug, info};

use crate::directory::Location;
use crate::error::{AppError, AppResult};
use crate::geo::{Coordinates, path_length};

use super::model::{Route, RouteStep};
use super::provider::{DirectionsProvider, DirectionsRoute, Profile};

#[derive(Clone)]
pub struct RoutePlanner {
    provider: Arc<dyn DirectionsProvider>,
    profile: Profile,
}

impl RoutePlanner {
    pub fn new(provider: Arc<dyn DirectionsProvider>) -> Self {
        Self {
            provider,
            profile: Profile::Walking,
        }
    }

    pub async fn plan_route(
        &self,
        origin: Coordinates,
        destination: &Location,
    ) -> AppResult<Option<Route>> {
        debug!(
            %origin,
            destination = %destination.id,
            profile = self.profile.id(),
            "requesting directions"
        );
        let response = self
            .provider
            .route(origin, destination.coordinates, self.profile)
            .await?;

        let Some(raw) = response.routes.into_iter().next() else {
            info!(destination = %destination.id, "provider returned no routes");
            return Ok(None);
        };

        let route = normalize_route(origin, destination, raw)?;
        info!(
            destination = %destination.id,
            distance_m = route.distance_m,
            duration_s = route.duration_s,
            steps = route.steps.len(),
            "route planned"
        );
        Ok(Some(route))
    }
}

fn normalize_route(
    origin: Coordinates,
    destination: &Location,
    raw: DirectionsRoute,
) -> AppResult<Route> {
    if !raw.distance_m.is_finite() || raw.distance_m < 0.0 {
        return Err(AppError::malformed_response(format!(
            "route distance is invalid: {}",
            raw.distance_m
        )));
    }
    let duration_s = if raw.duration_s.is_finite() && raw.duration_s > 0.0 {
        raw.duration_s
    } else {
        0.0
    };

    let mut steps = Vec::with_capacity(raw.steps.len().max(1));
    for (index, step) in raw.steps.into_iter().enumerate() {
        if !step.distance_m.is_finite() || step.distance_m < 0.0 {
            return Err(AppError::malformed_response(format!(
                "step {index} distance is invalid: {}",
                step.distance_m
            )));
        }
        steps.push(RouteStep {
            instruction: step.instruction,
            distance_m: step.distance_m,
            geometry: step.geometry,
        });
    }

    let geometry = if !raw.geometry.is_empty() {
        raw.geometry
    } else if steps.iter().any(|step| !step.geometry.is_empty()) {
        steps
            .iter()
            .flat_map(|step| step.geometry.iter().copied())
            .collect()
    } else {
        vec![origin, destination.coordinates]
    };

    if steps.is_empty() {
        let distance_m = if raw.distance_m > 0.0 {
            raw.distance_m
        } else {
            path_length(&geometry)
        };
        steps.push(RouteStep {
            instruction: format!("Walk to {}", destination.name),
            distance_m,
            geometry: geometry.clone(),
        });
    }

    Ok(Route {
        origin,
        destination: destination.clone(),
        distance_m: raw.distance_m,
        duration_s,
        steps,
        geometry,
    })
}
