use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::geo::Coordinates;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Profile {
    #[default]
    Walking,
}

impl Profile {
    pub fn id(self) -> &'static str {
        match self {
            Self::Walking => "walking",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DirectionsResponse {
    pub routes: Vec<DirectionsRoute>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectionsRoute {
    pub distance_m: f64,
    pub duration_s: f64,
    pub geometry: Vec<Coordinates>,
    pub steps: Vec<DirectionsStep>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectionsStep {
    pub instruction: String,
    pub distance_m: f64,
    #[serde(default)]
    pub geometry: Vec<Coordinates>,
}

#[async_trait]
pub trait DirectionsProvider: Send + Sync {
    async fn route(
        &self,
        origin: Coordinates,
        destination: Coordinates,
        profile: Profile,
    ) -> AppResult<DirectionsResponse>;
}
