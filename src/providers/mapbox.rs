use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::ProviderConfig;
use crate::error::{AppError, AppResult};
use crate::geo::Coordinates;
use crate::route::{
    DirectionsProvider, DirectionsResponse, DirectionsRoute, DirectionsStep, Profile,
};
use crate::search::{GeocodeResponse, GeocodeResult, Geocoder};

pub struct MapboxGeocoder {
    client: Client,
    base_url: Url,
    access_token: String,
}

impl MapboxGeocoder {
    pub fn from_config(config: &ProviderConfig) -> AppResult<Self> {
        Ok(Self {
            client: build_client()?,
            base_url: parse_base_url(&config.geocoding_url)?,
            access_token: require_token(config)?,
        })
    }
}

#[async_trait]
impl Geocoder for MapboxGeocoder {
    async fn geocode(
        &self,
        query: &str,
        proximity: Coordinates,
        limit: usize,
    ) -> AppResult<GeocodeResponse> {
        let url = with_segment(&self.base_url, &format!("{query}.json"))?;
        let proximity = format!("{},{}", proximity.lon, proximity.lat);
        let limit = limit.to_string();
        let params = [
            ("access_token", self.access_token.as_str()),
            ("proximity", proximity.as_str()),
            ("limit", limit.as_str()),
        ];

        debug!(query, "geocoding request");
        let (status, body) = fetch(&self.client, url, &params, "geocoding").await?;
        if !status.is_success() {
            return Err(http_failure(status, body, "geocoding"));
        }
        Ok(map_geocoding(decode(&body, "geocoding")?))
    }
}

pub struct MapboxDirections {
    client: Client,
    base_url: Url,
    access_token: String,
}

impl MapboxDirections {
    pub fn from_config(config: &ProviderConfig) -> AppResult<Self> {
        Ok(Self {
            client: build_client()?,
            base_url: parse_base_url(&config.directions_url)?,
            access_token: require_token(config)?,
        })
    }
}

#[async_trait]
impl DirectionsProvider for MapboxDirections {
    async fn route(
        &self,
        origin: Coordinates,
        destination: Coordinates,
        profile: Profile,
    ) -> AppResult<DirectionsResponse> {
        let waypoints = format!(
            "{},{};{},{}",
            origin.lon, origin.lat, destination.lon, destination.lat
        );
        let url = with_segment(&with_segment(&self.base_url, profile.id())?, &waypoints)?;
        let params = [
            ("access_token", self.access_token.as_str()),
            ("steps", "true"),
            ("geometries", "geojson"),
            ("overview", "full"),
        ];

        debug!(%origin, %destination, profile = profile.id(), "directions request");
        let (status, body) = fetch(&self.client, url, &params, "directions").await?;
        if status.is_success() {
            return map_directions(decode(&body, "directions")?);
        }
        // Routing failures such as `InvalidInput` come back as a 4xx with a `code`.
        match serde_json::from_str::<DirectionsBody>(&body) {
            Ok(parsed) if status.is_client_error() => map_directions(parsed),
            _ => Err(http_failure(status, body, "directions")),
        }
    }
}

fn build_client() -> AppResult<Client> {
    Client::builder()
        .build()
        .map_err(|err| AppError::provider("failed to create HTTP client", err))
}

fn parse_base_url(raw: &str) -> AppResult<Url> {
    let url = Url::parse(raw)
        .map_err(|err| AppError::invalid_argument(format!("invalid provider url {raw:?}: {err}")))?;
    if url.cannot_be_a_base() {
        return Err(AppError::invalid_argument(format!(
            "provider url cannot take a path: {raw:?}"
        )));
    }
    Ok(url)
}

fn require_token(config: &ProviderConfig) -> AppResult<String> {
    let token = config.access_token.trim();
    if token.is_empty() {
        return Err(AppError::invalid_argument(
            "access token is not set (provider.access_token or WAYFIND_ACCESS_TOKEN)",
        ));
    }
    Ok(token.to_string())
}

fn with_segment(base: &Url, segment: &str) -> AppResult<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| {
            AppError::invalid_argument(format!("provider url cannot take a path: {base}"))
        })?
        .pop_if_empty()
        .push(segment);
    Ok(url)
}

async fn fetch(
    client: &Client,
    url: Url,
    params: &[(&str, &str)],
    context: &str,
) -> AppResult<(StatusCode, String)> {
    let response = client
        .get(url)
        .query(params)
        .send()
        .await
        .map_err(|err| AppError::provider(format!("{context} request failed"), err))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|err| AppError::provider(format!("{context} response could not be read"), err))?;
    Ok((status, body))
}

fn decode<T: DeserializeOwned>(body: &str, context: &str) -> AppResult<T> {
    serde_json::from_str(body)
        .map_err(|err| AppError::malformed_response(format!("{context}: {err}")))
}

fn http_failure(status: StatusCode, body: String, context: &str) -> AppError {
    AppError::provider(
        format!("{context} returned HTTP {status}"),
        std::io::Error::other(body),
    )
}

#[derive(Debug, Default, Deserialize)]
struct GeocodingBody {
    #[serde(default)]
    features: Vec<GeocodingFeature>,
}

#[derive(Debug, Deserialize)]
struct GeocodingFeature {
    id: String,
    place_name: String,
    center: [f64; 2],
}

fn map_geocoding(body: GeocodingBody) -> GeocodeResponse {
    GeocodeResponse {
        results: body
            .features
            .into_iter()
            .map(|feature| GeocodeResult {
                id: feature.id,
                display_name: feature.place_name,
                center: feature.center,
            })
            .collect(),
    }
}

#[derive(Debug, Deserialize)]
struct DirectionsBody {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    routes: Vec<WireRoute>,
}

#[derive(Debug, Deserialize)]
struct WireRoute {
    distance: f64,
    #[serde(default)]
    duration: f64,
    #[serde(default)]
    geometry: Option<WireGeometry>,
    #[serde(default)]
    legs: Vec<WireLeg>,
}

#[derive(Debug, Deserialize)]
struct WireGeometry {
    coordinates: Vec<[f64; 2]>,
}

#[derive(Debug, Deserialize)]
struct WireLeg {
    #[serde(default)]
    steps: Vec<WireStep>,
}

#[derive(Debug, Deserialize)]
struct WireStep {
    distance: f64,
    maneuver: WireManeuver,
    #[serde(default)]
    geometry: Option<WireGeometry>,
}

#[derive(Debug, Deserialize)]
struct WireManeuver {
    #[serde(default)]
    instruction: String,
}

fn map_directions(body: DirectionsBody) -> AppResult<DirectionsResponse> {
    match body.code.as_str() {
        "Ok" => {}
        "NoRoute" | "NoSegment" => return Ok(DirectionsResponse::default()),
        code => {
            let detail = body.message.unwrap_or_default();
            return Err(AppError::malformed_response(format!(
                "directions answered {code}: {detail}"
            )));
        }
    }

    let routes = body
        .routes
        .into_iter()
        .map(|route| DirectionsRoute {
            distance_m: route.distance,
            duration_s: route.duration,
            geometry: to_coordinates(route.geometry),
            steps: route
                .legs
                .into_iter()
                .flat_map(|leg| leg.steps)
                .map(|step| DirectionsStep {
                    instruction: step.maneuver.instruction,
                    distance_m: step.distance,
                    geometry: to_coordinates(step.geometry),
                })
                .collect(),
        })
        .collect();
    Ok(DirectionsResponse { routes })
}

fn to_coordinates(geometry: Option<WireGeometry>) -> Vec<Coordinates> {
    geometry
        .map(|g| g.coordinates.into_iter().map(Coordinates::from_lon_lat).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::{
        DirectionsBody, GeocodingBody, MapboxDirections, MapboxGeocoder, map_directions,
        map_geocoding, with_segment,
    };
    use crate::config::ProviderConfig;
    use crate::error::AppError;
    use crate::geo::Coordinates;
    use reqwest::Url;

    #[test]
    fn geocoding_features_map_to_results() {
        let body: GeocodingBody = serde_json::from_str(
            r#"{
                "type": "FeatureCollection",
                "features": [
                    {"id": "poi.1", "place_name": "Liberty Stores, Ugbowo, Benin City",
                     "center": [5.6201, 6.4012]},
                    {"id": "poi.2", "place_name": "Ring Road", "center": [5.63, 6.33],
                     "relevance": 0.9}
                ]
            }"#,
        )
        .expect("fixture should parse");

        let response = map_geocoding(body);
        assert_eq!(response.results.len(), 2);
        assert_eq!(response.results[0].id, "poi.1");
        assert_eq!(
            response.results[0].display_name,
            "Liberty Stores, Ugbowo, Benin City"
        );
        assert_eq!(response.results[0].center, [5.6201, 6.4012]);
    }

    #[test]
    fn geocoding_without_features_is_empty() {
        let body: GeocodingBody = serde_json::from_str(r#"{"type": "FeatureCollection"}"#)
            .expect("fixture should parse");
        assert!(map_geocoding(body).results.is_empty());
    }

    #[test]
    fn directions_flatten_leg_steps_in_order() {
        let body: DirectionsBody = serde_json::from_str(
            r#"{
                "code": "Ok",
                "routes": [{
                    "distance": 500.0,
                    "duration": 400.0,
                    "geometry": {"type": "LineString",
                                 "coordinates": [[5.61, 6.40], [5.6142, 6.3985]]},
                    "legs": [{
                        "steps": [
                            {"distance": 200.0, "maneuver": {"instruction": "Head east"}},
                            {"distance": 250.0, "maneuver": {"instruction": "Turn left"},
                             "geometry": {"coordinates": [[5.612, 6.40], [5.613, 6.399]]}},
                            {"distance": 50.0, "maneuver": {"instruction": "You have arrived"}}
                        ]
                    }]
                }]
            }"#,
        )
        .expect("fixture should parse");

        let response = map_directions(body).expect("ok code should map");
        let route = &response.routes[0];
        assert_eq!(route.distance_m, 500.0);
        assert_eq!(route.duration_s, 400.0);
        assert_eq!(route.geometry[0], Coordinates::new(6.40, 5.61));
        let instructions: Vec<_> = route.steps.iter().map(|s| s.instruction.as_str()).collect();
        assert_eq!(instructions, ["Head east", "Turn left", "You have arrived"]);
        assert_eq!(route.steps[1].geometry.len(), 2);
        assert!(route.steps[0].geometry.is_empty());
    }

    #[test]
    fn no_route_code_maps_to_empty_routes() {
        let body: DirectionsBody =
            serde_json::from_str(r#"{"code": "NoRoute", "message": "No route found"}"#)
                .expect("fixture should parse");
        assert!(map_directions(body).expect("no route is not an error").routes.is_empty());
    }

    #[test]
    fn unexpected_code_is_malformed() {
        let body: DirectionsBody =
            serde_json::from_str(r#"{"code": "InvalidInput", "message": "bad coordinate"}"#)
                .expect("fixture should parse");
        assert!(matches!(
            map_directions(body),
            Err(AppError::MalformedResponse(_))
        ));
    }

    #[test]
    fn query_segment_is_percent_encoded() {
        let base = Url::parse("https://api.mapbox.com/geocoding/v5/mapbox.places")
            .expect("base url");
        let url = with_segment(&base, "Main Gate/North.json").expect("segment");
        assert_eq!(
            url.as_str(),
            "https://api.mapbox.com/geocoding/v5/mapbox.places/Main%20Gate%2FNorth.json"
        );
    }

    #[test]
    fn clients_require_an_access_token() {
        let config = ProviderConfig::default();
        assert!(matches!(
            MapboxGeocoder::from_config(&config),
            Err(AppError::InvalidArgument(_))
        ));
        assert!(matches!(
            MapboxDirections::from_config(&config),
            Err(AppError::InvalidArgument(_))
        ));

        let config = ProviderConfig {
            access_token: "pk.test".to_string(),
            ..ProviderConfig::default()
        };
        assert!(MapboxDirections::from_config(&config).is_ok());
    }
}
