use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

pub const DEFAULT_WALKING_SPEED_M_PER_MIN: f64 = 80.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn from_lon_lat(pair: [f64; 2]) -> Self {
        Self {
            lat: pair[1],
            lon: pair[0],
        }
    }

    pub fn to_lon_lat(self) -> [f64; 2] {
        [self.lon, self.lat]
    }

    pub fn parse(raw: &str) -> AppResult<Self> {
        let Some((lat, lon)) = raw.split_once(',') else {
            return Err(AppError::invalid_argument(format!(
                "expected coordinates as 'lat,lon', got '{raw}'"
            )));
        };

        let lat = parse_component(lat, "latitude")?;
        let lon = parse_component(lon, "longitude")?;
        if !(-90.0..=90.0).contains(&lat) {
            return Err(AppError::invalid_argument(format!(
                "latitude out of range: {lat}"
            )));
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(AppError::invalid_argument(format!(
                "longitude out of range: {lon}"
            )));
        }

        Ok(Self { lat, lon })
    }
}

impl FromStr for Coordinates {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.5},{:.5}", self.lat, self.lon)
    }
}

fn parse_component(raw: &str, label: &str) -> AppResult<f64> {
    let value = raw
        .trim()
        .parse::<f64>()
        .map_err(|_| AppError::invalid_argument(format!("invalid {label}: '{}'", raw.trim())))?;
    if !value.is_finite() {
        return Err(AppError::invalid_argument(format!(
            "{label} must be finite"
        )));
    }
    Ok(value)
}

pub fn distance_meters(a: Coordinates, b: Coordinates) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
}

/// Walking time rounded up to whole minutes, returned in seconds.
pub fn estimate_walk_time_seconds(distance_m: f64, speed_m_per_min: f64) -> u64 {
    if distance_m <= 0.0 || speed_m_per_min <= 0.0 {
        return 0;
    }
    let minutes = (distance_m / speed_m_per_min).ceil() as u64;
    minutes.saturating_mul(60)
}

pub fn path_length(points: &[Coordinates]) -> f64 {
    points
        .windows(2)
        .map(|w| distance_meters(w[0], w[1]))
        .sum()
}

pub fn format_distance(distance_m: f64) -> String {
    if distance_m < 1000.0 {
        format!("{} m", distance_m.round() as u64)
    } else {
        format!("{:.1} km", distance_m / 1000.0)
    }
}
