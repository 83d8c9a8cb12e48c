use crate::geo::Coordinates;

pub trait PositionSource: Send + Sync {
    fn current_position(&self) -> Option<Coordinates>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FixedPosition(pub Option<Coordinates>);

impl PositionSource for FixedPosition {
    fn current_position(&self) -> Option<Coordinates> {
        self.0
    }
}

/// A manually placed start point wins over the detected position.
pub fn resolve_origin(
    manual_start: Option<Coordinates>,
    device: &dyn PositionSource,
) -> Option<Coordinates> {
    manual_start.or_else(|| device.current_position())
}
