use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::debug;

use super::session::{NavStatus, SharedNavState, lock_state};
use super::surface::RouteSurface;

pub(crate) struct StepTimer {
    epoch: u64,
    task: JoinHandle<()>,
}

impl StepTimer {
    pub(crate) fn arm(
        handle: &Handle,
        period: Duration,
        epoch: u64,
        state: SharedNavState,
        surface: Option<Arc<dyn RouteSurface>>,
    ) -> Self {
        let task = handle.spawn(run(period, epoch, state, surface));
        debug!(epoch, period_ms = period.as_millis() as u64, "step timer armed");
        Self { epoch, task }
    }

    pub(crate) fn cancel(self) {
        debug!(epoch = self.epoch, "step timer cancelled");
        // Drop aborts the task.
    }
}

impl Drop for StepTimer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run(
    period: Duration,
    epoch: u64,
    state: SharedNavState,
    surface: Option<Arc<dyn RouteSurface>>,
) {
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let mut nav = lock_state(&state);
        if nav.timer_epoch != epoch || nav.status != NavStatus::Navigating {
            return;
        }

        nav.progress = nav.progress.advanced();
        let reached_final = nav.progress.is_final();
        if reached_final {
            nav.timer_armed = false;
        }
        debug!(
            epoch,
            step = nav.progress.index(),
            reached_final,
            "auto-advanced step"
        );
        if let Some(surface) = &surface {
            surface.show_progress(&nav.snapshot());
        }

        if reached_final {
            return;
        }
    }
}
