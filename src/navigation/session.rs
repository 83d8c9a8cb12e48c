use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tracing::{debug, info};

use crate::config::NavigationConfig;
use crate::directory::Location;
use crate::error::{AppError, AppResult};
use crate::geo::{Coordinates, estimate_walk_time_seconds};
use crate::route::{Route, RoutePlanner};

use super::progress::StepProgress;
use super::surface::RouteSurface;
use super::timer::StepTimer;

const MIN_STEP_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NavStatus {
    #[default]
    Idle,
    Navigating,
    /// The user confirmed arrival; a fresh `start` is needed to navigate again.
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Applied,
    Noop,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NavigationOptions {
    pub step_interval: Duration,
    pub walking_speed_m_per_min: f64,
}

impl Default for NavigationOptions {
    fn default() -> Self {
        Self::from_config(&NavigationConfig::default())
    }
}

impl NavigationOptions {
    pub fn from_config(config: &NavigationConfig) -> Self {
        Self {
            step_interval: config.step_interval(),
            walking_speed_m_per_min: config.walking_speed_m_per_min,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NavSnapshot {
    pub status: NavStatus,
    pub step_index: usize,
    pub step_count: usize,
    pub instruction: Option<String>,
    pub step_distance_m: f64,
    pub remaining_distance_m: f64,
    pub remaining_time_s: u64,
    pub timer_armed: bool,
}

pub(crate) type SharedNavState = Arc<Mutex<NavState>>;

pub(crate) struct NavState {
    pub(crate) route: Option<Arc<Route>>,
    pub(crate) progress: StepProgress,
    pub(crate) status: NavStatus,
    pub(crate) timer_epoch: u64,
    pub(crate) timer_armed: bool,
    walking_speed_m_per_min: f64,
}

impl NavState {
    pub(crate) fn snapshot(&self) -> NavSnapshot {
        let index = self.progress.index();
        let Some(route) = self.route.as_deref() else {
            return NavSnapshot {
                status: self.status,
                step_index: 0,
                step_count: 0,
                instruction: None,
                step_distance_m: 0.0,
                remaining_distance_m: 0.0,
                remaining_time_s: 0,
                timer_armed: self.timer_armed,
            };
        };

        let step = route.step(index);
        let remaining_distance_m = route.remaining_distance_m(index);
        NavSnapshot {
            status: self.status,
            step_index: index,
            step_count: route.step_count(),
            instruction: step.map(|s| s.instruction.clone()),
            step_distance_m: step.map_or(0.0, |s| s.distance_m),
            remaining_distance_m,
            remaining_time_s: remaining_time_s(
                route,
                remaining_distance_m,
                self.walking_speed_m_per_min,
            ),
            timer_armed: self.timer_armed,
        }
    }
}

fn remaining_time_s(route: &Route, remaining_distance_m: f64, speed_m_per_min: f64) -> u64 {
    if route.duration_s > 0.0 && route.distance_m > 0.0 {
        let share = (remaining_distance_m / route.distance_m).clamp(0.0, 1.0);
        return (route.duration_s * share).ceil() as u64;
    }
    estimate_walk_time_seconds(remaining_distance_m, speed_m_per_min)
}

pub(crate) fn lock_state(state: &Mutex<NavState>) -> MutexGuard<'_, NavState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct NavigationSession {
    planner: RoutePlanner,
    options: NavigationOptions,
    state: SharedNavState,
    timer: Option<StepTimer>,
    surface: Option<Arc<dyn RouteSurface>>,
}

impl NavigationSession {
    pub fn new(planner: RoutePlanner, mut options: NavigationOptions) -> Self {
        // A zero period would panic inside the timer task.
        options.step_interval = options.step_interval.max(MIN_STEP_INTERVAL);
        let state = NavState {
            route: None,
            progress: StepProgress::default(),
            status: NavStatus::Idle,
            timer_epoch: 0,
            timer_armed: false,
            walking_speed_m_per_min: options.walking_speed_m_per_min,
        };
        Self {
            planner,
            options,
            state: Arc::new(Mutex::new(state)),
            timer: None,
            surface: None,
        }
    }

    pub fn with_surface(mut self, surface: Arc<dyn RouteSurface>) -> Self {
        self.surface = Some(surface);
        self
    }

    pub fn status(&self) -> NavStatus {
        lock_state(&self.state).status
    }

    pub fn route(&self) -> Option<Arc<Route>> {
        lock_state(&self.state).route.clone()
    }

    pub fn current_step_index(&self) -> usize {
        lock_state(&self.state).progress.index()
    }

    pub fn snapshot(&self) -> NavSnapshot {
        lock_state(&self.state).snapshot()
    }

    /// Plans a route and begins guidance.
    ///
    /// Fails with [`AppError::MissingOrigin`] without an origin and with
    /// [`AppError::NoRouteFound`] when the provider has no route. Provider
    /// errors propagate. Any failure leaves the session exactly as it was.
    pub async fn start(
        &mut self,
        origin: Option<Coordinates>,
        destination: &Location,
    ) -> AppResult<()> {
        let Some(origin) = origin else {
            return Err(AppError::MissingOrigin);
        };
        let handle = runtime_handle()?;

        let Some(route) = self.planner.plan_route(origin, destination).await? else {
            return Err(AppError::no_route_found(&destination.name));
        };

        self.teardown(NavStatus::Idle);
        self.install(Arc::new(route), &handle);
        Ok(())
    }

    pub async fn restart(&mut self, origin: Option<Coordinates>) -> AppResult<()> {
        let Some(route) = self.route() else {
            return Err(AppError::NotNavigating);
        };
        self.stop();
        self.start(origin, &route.destination).await
    }

    pub fn stop(&mut self) {
        if self.teardown(NavStatus::Idle) {
            info!("navigation stopped");
        }
    }

    pub fn complete(&mut self) -> AppResult<()> {
        if self.status() != NavStatus::Navigating {
            return Err(AppError::NotNavigating);
        }
        self.teardown(NavStatus::Stopped);
        info!("navigation completed");
        Ok(())
    }

    pub fn next_step(&mut self) -> AppResult<StepOutcome> {
        self.manual_step(StepProgress::advanced)
    }

    pub fn previous_step(&mut self) -> AppResult<StepOutcome> {
        self.manual_step(StepProgress::retreated)
    }

    fn manual_step(
        &mut self,
        transition: fn(StepProgress) -> StepProgress,
    ) -> AppResult<StepOutcome> {
        let handle = runtime_handle()?;
        let outcome = {
            let mut nav = lock_state(&self.state);
            if nav.status != NavStatus::Navigating {
                return Err(AppError::NotNavigating);
            }

            let next = transition(nav.progress);
            // Invalidate the armed tick under the same lock as the manual move.
            nav.timer_epoch = nav.timer_epoch.saturating_add(1);
            if next == nav.progress {
                StepOutcome::Noop
            } else {
                nav.progress = next;
                debug!(step = next.index(), "manual step");
                if let Some(surface) = &self.surface {
                    surface.show_progress(&nav.snapshot());
                }
                StepOutcome::Applied
            }
        };

        self.rearm(&handle);
        Ok(outcome)
    }

    fn install(&mut self, route: Arc<Route>, handle: &Handle) {
        {
            let mut nav = lock_state(&self.state);
            nav.progress = StepProgress::new(route.step_count());
            nav.route = Some(Arc::clone(&route));
            nav.status = NavStatus::Navigating;
            if let Some(surface) = &self.surface {
                surface.show_route(&route);
                surface.show_progress(&nav.snapshot());
            }
        }
        info!(
            destination = %route.destination.id,
            steps = route.step_count(),
            "navigation started"
        );
        self.rearm(handle);
    }

    fn rearm(&mut self, handle: &Handle) {
        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }

        let epoch = {
            let mut nav = lock_state(&self.state);
            nav.timer_epoch = nav.timer_epoch.saturating_add(1);
            nav.timer_armed = nav.status == NavStatus::Navigating && !nav.progress.is_final();
            if !nav.timer_armed {
                return;
            }
            nav.timer_epoch
        };

        self.timer = Some(StepTimer::arm(
            handle,
            self.options.step_interval,
            epoch,
            Arc::clone(&self.state),
            self.surface.clone(),
        ));
    }

    fn teardown(&mut self, status: NavStatus) -> bool {
        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }

        let mut nav = lock_state(&self.state);
        nav.timer_epoch = nav.timer_epoch.saturating_add(1);
        nav.timer_armed = false;
        nav.progress = StepProgress::default();
        nav.status = status;
        let had_route = nav.route.take().is_some();
        if had_route && let Some(surface) = &self.surface {
            surface.clear();
        }
        had_route
    }
}

impl Drop for NavigationSession {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }
    }
}

fn runtime_handle() -> AppResult<Handle> {
    Handle::try_current()
        .map_err(|_| AppError::unsupported("navigation requires a tokio runtime"))
}
