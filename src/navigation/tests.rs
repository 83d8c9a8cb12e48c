use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;

use super::{
    NavSnapshot, NavStatus, NavigationOptions, NavigationSession, RouteSurface, StepOutcome,
};
use crate::directory::{Catalog, Location, LocationId};
use crate::error::{AppError, AppResult};
use crate::geo::Coordinates;
use crate::route::{
    DirectionsProvider, DirectionsResponse, DirectionsRoute, DirectionsStep, Profile, Route,
    RoutePlanner,
};

const ORIGIN: Coordinates = Coordinates::new(6.40, 5.61);

enum Answer {
    Routes(Vec<DirectionsRoute>),
    TransportError,
}

struct StubDirections {
    answer: Mutex<Answer>,
    calls: AtomicUsize,
}

impl StubDirections {
    fn new(answer: Answer) -> Arc<Self> {
        Arc::new(Self {
            answer: Mutex::new(answer),
            calls: AtomicUsize::new(0),
        })
    }

    fn set(&self, answer: Answer) {
        *self.answer.lock().expect("answer lock") = answer;
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DirectionsProvider for StubDirections {
    async fn route(
        &self,
        _origin: Coordinates,
        _destination: Coordinates,
        _profile: Profile,
    ) -> AppResult<DirectionsResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &*self.answer.lock().expect("answer lock") {
            Answer::Routes(routes) => Ok(DirectionsResponse {
                routes: routes.clone(),
            }),
            Answer::TransportError => Err(AppError::provider(
                "directions",
                std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset"),
            )),
        }
    }
}

#[derive(Default)]
struct RecordingSurface {
    events: Mutex<Vec<String>>,
}

impl RecordingSurface {
    fn events(&self) -> Vec<String> {
        self.events.lock().expect("events lock").clone()
    }
}

impl RouteSurface for RecordingSurface {
    fn show_route(&self, route: &Route) {
        self.events
            .lock()
            .expect("events lock")
            .push(format!("route:{}", route.steps.len()));
    }

    fn show_progress(&self, snapshot: &NavSnapshot) {
        self.events
            .lock()
            .expect("events lock")
            .push(format!("step:{}", snapshot.step_index));
    }

    fn clear(&self) {
        self.events.lock().expect("events lock").push("clear".to_string());
    }
}

fn route_with_steps(distances: &[f64], duration_s: f64) -> DirectionsRoute {
    DirectionsRoute {
        distance_m: distances.iter().sum(),
        duration_s,
        geometry: vec![ORIGIN, Coordinates::new(6.3985, 5.6142)],
        steps: distances
            .iter()
            .enumerate()
            .map(|(i, distance_m)| DirectionsStep {
                instruction: format!("step {i}"),
                distance_m: *distance_m,
                geometry: Vec::new(),
            })
            .collect(),
    }
}

fn library() -> Location {
    Catalog::builtin()
        .get(&LocationId::new("1"))
        .cloned()
        .expect("library should be in the catalog")
}

fn session_with(provider: Arc<StubDirections>) -> NavigationSession {
    NavigationSession::new(
        RoutePlanner::new(provider),
        NavigationOptions {
            step_interval: Duration::from_secs(10),
            walking_speed_m_per_min: 80.0,
        },
    )
}

fn four_steps() -> Answer {
    Answer::Routes(vec![route_with_steps(&[100.0, 100.0, 100.0, 100.0], 300.0)])
}

#[tokio::test]
async fn start_without_origin_fails_before_planning() {
    let provider = StubDirections::new(four_steps());
    let mut session = session_with(provider.clone());

    let err = session
        .start(None, &library())
        .await
        .expect_err("missing origin should fail");

    assert!(matches!(err, AppError::MissingOrigin));
    assert_eq!(session.status(), NavStatus::Idle);
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn empty_route_list_is_no_route_found_and_stays_idle() {
    let provider = StubDirections::new(Answer::Routes(Vec::new()));
    let mut session = session_with(provider);

    let err = session
        .start(Some(ORIGIN), &library())
        .await
        .expect_err("no route should fail");

    assert!(matches!(err, AppError::NoRouteFound { .. }));
    assert_eq!(session.status(), NavStatus::Idle);
    assert!(session.route().is_none());
    assert!(!session.snapshot().timer_armed);
}

#[tokio::test]
async fn transport_failure_propagates_and_stays_idle() {
    let provider = StubDirections::new(Answer::TransportError);
    let mut session = session_with(provider);

    let err = session
        .start(Some(ORIGIN), &library())
        .await
        .expect_err("transport error should propagate");

    assert!(matches!(err, AppError::Provider { .. }));
    assert_eq!(session.status(), NavStatus::Idle);
}

#[tokio::test]
async fn library_scenario_starts_at_first_step() {
    let provider = StubDirections::new(Answer::Routes(vec![route_with_steps(
        &[200.0, 250.0, 50.0],
        400.0,
    )]));
    let mut session = session_with(provider);

    session
        .start(Some(Coordinates::new(6.40, 5.61)), &library())
        .await
        .expect("start should succeed");

    let route = session.route().expect("route should be set");
    assert_eq!(route.duration_s, 400.0);
    assert_eq!(route.distance_m, 500.0);
    assert_eq!(route.steps.len(), 3);
    assert_eq!(session.current_step_index(), 0);
    assert_eq!(session.status(), NavStatus::Navigating);
    assert!(session.snapshot().timer_armed);
}

#[tokio::test(start_paused = true)]
async fn auto_advance_stops_at_final_step() {
    let provider = StubDirections::new(four_steps());
    let mut session = session_with(provider);
    session
        .start(Some(ORIGIN), &library())
        .await
        .expect("start should succeed");

    sleep(Duration::from_secs(15)).await;
    assert_eq!(session.current_step_index(), 1);

    sleep(Duration::from_secs(20)).await;
    assert_eq!(session.current_step_index(), 3);
    assert!(!session.snapshot().timer_armed);

    sleep(Duration::from_secs(60)).await;
    assert_eq!(session.current_step_index(), 3);
    assert_eq!(session.status(), NavStatus::Navigating);
}

#[tokio::test(start_paused = true)]
async fn manual_step_restarts_the_cadence() {
    let provider = StubDirections::new(four_steps());
    let mut session = session_with(provider);
    session
        .start(Some(ORIGIN), &library())
        .await
        .expect("start should succeed");

    sleep(Duration::from_secs(6)).await;
    assert_eq!(
        session.next_step().expect("next should apply"),
        StepOutcome::Applied
    );
    assert_eq!(session.current_step_index(), 1);

    // The original schedule would have fired at 10 s.
    sleep(Duration::from_secs(5)).await;
    assert_eq!(session.current_step_index(), 1);

    sleep(Duration::from_secs(6)).await;
    assert_eq!(session.current_step_index(), 2);
}

#[tokio::test(start_paused = true)]
async fn next_step_right_after_start_does_not_double_advance() {
    let provider = StubDirections::new(four_steps());
    let mut session = session_with(provider);
    session
        .start(Some(ORIGIN), &library())
        .await
        .expect("start should succeed");

    session.next_step().expect("next should apply");
    sleep(Duration::from_secs(10) - Duration::from_millis(1)).await;
    assert_eq!(session.current_step_index(), 1);

    sleep(Duration::from_millis(2)).await;
    assert_eq!(session.current_step_index(), 2);
}

#[tokio::test]
async fn steps_clamp_at_both_ends() {
    let provider = StubDirections::new(Answer::Routes(vec![route_with_steps(
        &[10.0, 20.0],
        30.0,
    )]));
    let mut session = session_with(provider);
    session
        .start(Some(ORIGIN), &library())
        .await
        .expect("start should succeed");

    assert_eq!(
        session.previous_step().expect("previous is valid"),
        StepOutcome::Noop
    );
    assert_eq!(session.next_step().expect("next is valid"), StepOutcome::Applied);
    assert!(!session.snapshot().timer_armed);
    assert_eq!(session.next_step().expect("next is valid"), StepOutcome::Noop);
    assert_eq!(session.current_step_index(), 1);

    assert_eq!(
        session.previous_step().expect("previous is valid"),
        StepOutcome::Applied
    );
    assert!(session.snapshot().timer_armed);
}

#[tokio::test]
async fn stepping_requires_active_navigation() {
    let provider = StubDirections::new(four_steps());
    let mut session = session_with(provider);

    assert!(matches!(session.next_step(), Err(AppError::NotNavigating)));
    assert!(matches!(session.previous_step(), Err(AppError::NotNavigating)));
    assert!(matches!(session.complete(), Err(AppError::NotNavigating)));
}

#[tokio::test(start_paused = true)]
async fn stop_is_idempotent_and_releases_the_timer() {
    let provider = StubDirections::new(four_steps());
    let mut session = session_with(provider);

    session.stop();
    assert_eq!(session.status(), NavStatus::Idle);

    session
        .start(Some(ORIGIN), &library())
        .await
        .expect("start should succeed");
    sleep(Duration::from_secs(11)).await;
    assert_eq!(session.current_step_index(), 1);

    session.stop();
    session.stop();
    assert_eq!(session.status(), NavStatus::Idle);
    assert!(session.route().is_none());
    assert_eq!(session.current_step_index(), 0);
    assert!(!session.snapshot().timer_armed);

    sleep(Duration::from_secs(60)).await;
    assert_eq!(session.current_step_index(), 0);
    assert_eq!(session.status(), NavStatus::Idle);
}

#[tokio::test(start_paused = true)]
async fn starting_again_replaces_route_and_timer() {
    let provider = StubDirections::new(four_steps());
    let mut session = session_with(provider.clone());
    session
        .start(Some(ORIGIN), &library())
        .await
        .expect("first start should succeed");
    sleep(Duration::from_secs(15)).await;
    assert_eq!(session.current_step_index(), 1);

    provider.set(Answer::Routes(vec![route_with_steps(&[5.0, 5.0, 5.0], 12.0)]));
    session
        .start(Some(ORIGIN), &library())
        .await
        .expect("second start should succeed");
    assert_eq!(session.current_step_index(), 0);
    assert_eq!(session.route().map(|r| r.steps.len()), Some(3));

    // The first timer would have fired at 20 s.
    sleep(Duration::from_secs(6)).await;
    assert_eq!(session.current_step_index(), 0);
    sleep(Duration::from_secs(5)).await;
    assert_eq!(session.current_step_index(), 1);
}

#[tokio::test(start_paused = true)]
async fn failed_start_keeps_current_guidance() {
    let provider = StubDirections::new(four_steps());
    let mut session = session_with(provider.clone());
    session
        .start(Some(ORIGIN), &library())
        .await
        .expect("first start should succeed");

    provider.set(Answer::Routes(Vec::new()));
    let err = session
        .start(Some(ORIGIN), &library())
        .await
        .expect_err("second start should fail");
    assert!(matches!(err, AppError::NoRouteFound { .. }));
    assert_eq!(session.status(), NavStatus::Navigating);

    sleep(Duration::from_secs(11)).await;
    assert_eq!(session.current_step_index(), 1);
}

#[tokio::test]
async fn complete_ends_guidance_until_next_start() {
    let provider = StubDirections::new(four_steps());
    let mut session = session_with(provider);
    session
        .start(Some(ORIGIN), &library())
        .await
        .expect("start should succeed");

    session.complete().expect("complete should succeed");
    assert_eq!(session.status(), NavStatus::Stopped);
    assert!(session.route().is_none());
    assert!(matches!(session.next_step(), Err(AppError::NotNavigating)));

    session
        .start(Some(ORIGIN), &library())
        .await
        .expect("fresh start should succeed");
    assert_eq!(session.status(), NavStatus::Navigating);
}

#[tokio::test]
async fn restart_replans_toward_the_same_destination() {
    let provider = StubDirections::new(four_steps());
    let mut session = session_with(provider.clone());

    assert!(matches!(
        session.restart(Some(ORIGIN)).await,
        Err(AppError::NotNavigating)
    ));

    session
        .start(Some(ORIGIN), &library())
        .await
        .expect("start should succeed");
    session.next_step().expect("next should apply");

    session
        .restart(Some(Coordinates::new(6.399, 5.612)))
        .await
        .expect("restart should succeed");
    assert_eq!(session.current_step_index(), 0);
    assert_eq!(
        session.route().map(|r| r.destination.name.clone()),
        Some("Library".to_string())
    );
    assert_eq!(provider.calls(), 2);
}

#[tokio::test]
async fn single_step_route_never_arms_timer() {
    let provider = StubDirections::new(Answer::Routes(vec![route_with_steps(&[40.0], 30.0)]));
    let mut session = session_with(provider);
    session
        .start(Some(ORIGIN), &library())
        .await
        .expect("start should succeed");

    assert_eq!(session.status(), NavStatus::Navigating);
    assert!(!session.snapshot().timer_armed);
}

#[tokio::test(start_paused = true)]
async fn zero_step_interval_still_advances_to_the_end() {
    let provider = StubDirections::new(four_steps());
    let mut session = NavigationSession::new(
        RoutePlanner::new(provider),
        NavigationOptions {
            step_interval: Duration::ZERO,
            walking_speed_m_per_min: 80.0,
        },
    );
    session
        .start(Some(ORIGIN), &library())
        .await
        .expect("start should succeed");
    assert!(session.snapshot().timer_armed);

    sleep(Duration::from_secs(5)).await;
    assert_eq!(session.current_step_index(), 3);
    assert!(!session.snapshot().timer_armed);
}

#[tokio::test]
async fn snapshot_prorates_remaining_time() {
    let provider = StubDirections::new(Answer::Routes(vec![route_with_steps(
        &[200.0, 250.0, 50.0],
        400.0,
    )]));
    let mut session = session_with(provider);
    session
        .start(Some(ORIGIN), &library())
        .await
        .expect("start should succeed");
    session.next_step().expect("next should apply");

    let snapshot = session.snapshot();
    assert_eq!(snapshot.step_index, 1);
    assert_eq!(snapshot.step_count, 3);
    assert_eq!(snapshot.instruction.as_deref(), Some("step 1"));
    assert_eq!(snapshot.step_distance_m, 250.0);
    assert_eq!(snapshot.remaining_distance_m, 300.0);
    assert_eq!(snapshot.remaining_time_s, 240);
}

#[tokio::test]
async fn snapshot_estimates_time_without_provider_duration() {
    let provider = StubDirections::new(Answer::Routes(vec![route_with_steps(
        &[100.0, 100.0],
        0.0,
    )]));
    let mut session = session_with(provider);
    session
        .start(Some(ORIGIN), &library())
        .await
        .expect("start should succeed");

    assert_eq!(session.snapshot().remaining_time_s, 180);
}

#[tokio::test(start_paused = true)]
async fn surface_receives_route_progress_and_clear() {
    let provider = StubDirections::new(Answer::Routes(vec![route_with_steps(
        &[10.0, 10.0, 10.0],
        20.0,
    )]));
    let surface = Arc::new(RecordingSurface::default());
    let mut session = session_with(provider).with_surface(surface.clone());

    session
        .start(Some(ORIGIN), &library())
        .await
        .expect("start should succeed");
    sleep(Duration::from_secs(11)).await;
    session.next_step().expect("next should apply");
    session.stop();

    assert_eq!(
        surface.events(),
        vec!["route:3", "step:0", "step:1", "step:2", "clear"]
    );
}
