use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::geo::Coordinates;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GeocodeResponse {
    pub results: Vec<GeocodeResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeResult {
    pub id: String,
    pub display_name: String,
    /// `[lon, lat]`, the order geocoding services report.
    pub center: [f64; 2],
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(
        &self,
        query: &str,
        proximity: Coordinates,
        limit: usize,
    ) -> AppResult<GeocodeResponse>;
}
