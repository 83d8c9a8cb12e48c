mod provider;
mod session;

pub use provider::{GeocodeResponse, GeocodeResult, Geocoder};
pub use session::{SearchEvent, SearchOptions, SearchSession, SearchStatus};
