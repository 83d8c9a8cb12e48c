mod position;
mod progress;
mod session;
mod surface;
mod timer;

#[cfg(test)]
mod tests;

pub use position::{FixedPosition, PositionSource, resolve_origin};
pub use progress::StepProgress;
pub use session::{NavSnapshot, NavStatus, NavigationOptions, NavigationSession, StepOutcome};
pub use surface::RouteSurface;
