use std::io::{self, Stdout, Write};
use std::sync::{Mutex, PoisonError};

use tracing::warn;

use crate::geo::{estimate_walk_time_seconds, format_distance};
use crate::navigation::{NavSnapshot, RouteSurface};
use crate::route::Route;

pub struct ConsoleSurface<W = Stdout> {
    out: Mutex<W>,
    walking_speed_m_per_min: f64,
}

impl ConsoleSurface<Stdout> {
    pub fn stdout(walking_speed_m_per_min: f64) -> Self {
        Self::new(io::stdout(), walking_speed_m_per_min)
    }
}

impl<W: Write> ConsoleSurface<W> {
    pub fn new(out: W, walking_speed_m_per_min: f64) -> Self {
        Self {
            out: Mutex::new(out),
            walking_speed_m_per_min,
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_line(&self, line: &str) {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        // Raw mode does not translate `\n`.
        if let Err(err) = write!(out, "{line}\r\n").and_then(|()| out.flush()) {
            warn!(error = %err, "failed to write guidance line");
        }
    }
}

impl<W: Write + Send> RouteSurface for ConsoleSurface<W> {
    fn show_route(&self, route: &Route) {
        self.write_line(&format_route_summary(route, self.walking_speed_m_per_min));
    }

    fn show_progress(&self, snapshot: &NavSnapshot) {
        self.write_line(&format_progress(snapshot));
    }

    fn clear(&self) {
        self.write_line("Guidance ended.");
    }
}

pub(crate) fn format_route_summary(route: &Route, walking_speed_m_per_min: f64) -> String {
    let seconds = if route.duration_s > 0.0 {
        route.duration_s.ceil() as u64
    } else {
        estimate_walk_time_seconds(route.distance_m, walking_speed_m_per_min)
    };
    let steps = route.step_count();
    format!(
        "Route to {}: {}, about {}, {} step{}",
        route.destination.name,
        format_distance(route.distance_m),
        format_minutes(seconds),
        steps,
        if steps == 1 { "" } else { "s" }
    )
}

pub(crate) fn format_progress(snapshot: &NavSnapshot) -> String {
    let instruction = snapshot.instruction.as_deref().unwrap_or("Continue");
    let mut line = format!(
        "[{}/{}] {} ({}) - {} left, about {}",
        snapshot.step_index + 1,
        snapshot.step_count,
        instruction,
        format_distance(snapshot.step_distance_m),
        format_distance(snapshot.remaining_distance_m),
        format_minutes(snapshot.remaining_time_s)
    );
    if snapshot.step_index + 1 >= snapshot.step_count {
        line.push_str(" | last step, press q when you arrive");
    }
    line
}

fn format_minutes(seconds: u64) -> String {
    format!("{} min", seconds.div_ceil(60))
}
