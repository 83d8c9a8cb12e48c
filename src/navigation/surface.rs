use crate::route::Route;

use super::session::NavSnapshot;

/// Called with the session state locked; must not call back into the session.
pub trait RouteSurface: Send + Sync {
    fn show_route(&self, route: &Route);

    fn show_progress(&self, snapshot: &NavSnapshot);

    fn clear(&self);
}
