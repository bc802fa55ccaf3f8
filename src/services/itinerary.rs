use crate::config::ItineraryConfig;
use crate::constants::MIN_WAYPOINTS;
use crate::error::{AppError, Result, Stage};
use crate::models::{
    ItinerarySettings, ItinerarySnapshot, ItineraryView, Phase, ResolvedRoute, RouteOptions,
    SolverStrategy, Waypoint,
};
use crate::services::directions::RoutingProvider;
use crate::services::route_resolver::RouteResolver;
use crate::services::solver::Solver;
use crate::services::waypoint_store::WaypointStore;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Coordinates the waypoint store with solving and routing.
///
/// Phases run `Idle -> Computing -> Ready | Failed`. Store mutations never
/// trigger a recompute; they only make the current snapshot stale. At most
/// one compute runs at a time and a second request is rejected with
/// [`AppError::ComputeInProgress`] rather than queued.
///
/// The lock is never held across an await, so store edits and reads stay
/// responsive while a compute is suspended on the solver or the provider.
pub struct ItineraryState {
    solver: Arc<dyn Solver>,
    resolver: RouteResolver,
    config: ItineraryConfig,
    state: Mutex<Inner>,
}

struct Inner {
    store: WaypointStore,
    phase: Phase,
    settings: ItinerarySettings,
    current: Option<Arc<ItinerarySnapshot>>,
    /// Set while a compute owns the pipeline, even if a reset moved the phase on
    in_flight: bool,
    /// Bumped by `reset`; a compute started under an older generation does not commit
    generation: u64,
}

impl Inner {
    fn previous_route(&self) -> Option<Arc<ResolvedRoute>> {
        self.current.as_ref().and_then(|snapshot| snapshot.route.clone())
    }

    fn is_stale(&self) -> bool {
        match (self.phase, &self.current) {
            (Phase::Ready | Phase::Failed, Some(snapshot)) => {
                snapshot.store_revision != self.store.revision()
            }
            _ => false,
        }
    }
}

/// Inputs captured when a compute starts
struct Job {
    waypoints: Vec<Waypoint>,
    settings: ItinerarySettings,
    store_revision: u64,
}

/// Owns the in-flight slot for one compute.
///
/// If the compute future is dropped before committing, the slot is released
/// and the phase it displaced is restored.
struct InFlight<'a> {
    state: &'a Mutex<Inner>,
    generation: u64,
    previous_phase: Phase,
    committed: bool,
}

impl InFlight<'_> {
    fn commit(
        mut self,
        job: Job,
        outcome: Result<ResolvedRoute>,
    ) -> Result<Arc<ItinerarySnapshot>> {
        self.committed = true;
        let mut inner = lock(self.state);
        inner.in_flight = false;

        let superseded = inner.generation != self.generation;
        let (snapshot, error) = match outcome {
            Ok(route) => (
                ItinerarySnapshot::ready(job.waypoints, job.settings, route, job.store_revision),
                None,
            ),
            Err(e) => {
                let previous = if superseded { None } else { inner.previous_route() };
                (
                    ItinerarySnapshot::failed(
                        job.waypoints,
                        job.settings,
                        &e,
                        previous,
                        job.store_revision,
                    ),
                    Some(e),
                )
            }
        };
        let snapshot = Arc::new(snapshot);

        if superseded {
            tracing::info!(
                snapshot = %snapshot.id,
                "Itinerary was reset during compute; result not committed"
            );
        } else {
            inner.phase = snapshot.phase;
            inner.current = Some(snapshot.clone());
        }

        match error {
            Some(e) => Err(e),
            None => Ok(snapshot),
        }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        let mut inner = lock(self.state);
        inner.in_flight = false;
        if inner.generation == self.generation && inner.phase == Phase::Computing {
            inner.phase = self.previous_phase;
        }
        tracing::warn!(
            restored = %inner.phase,
            "Itinerary compute cancelled before completion"
        );
    }
}

fn lock(state: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Delay before retry number `attempt` (1-based)
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
}

impl ItineraryState {
    pub fn new(
        solver: Arc<dyn Solver>,
        provider: Arc<dyn RoutingProvider>,
        config: ItineraryConfig,
    ) -> Self {
        let settings = ItinerarySettings {
            strategy: config.default_strategy,
            options: RouteOptions {
                avoid_highways: config.avoid_highways,
                waypoint_order: config.waypoint_order,
                ..RouteOptions::default()
            },
        };

        ItineraryState {
            solver,
            resolver: RouteResolver::new(provider),
            config,
            state: Mutex::new(Inner {
                store: WaypointStore::new(),
                phase: Phase::Idle,
                settings,
                current: None,
                in_flight: false,
                generation: 0,
            }),
        }
    }

    /// Compute an itinerary for an explicit waypoint list.
    ///
    /// The outcome is committed as the current snapshot unless a `reset`
    /// happened while it ran. Errors are returned after the failed snapshot
    /// is committed; the failed snapshot keeps the previous route.
    pub async fn compute(
        &self,
        strategy: SolverStrategy,
        waypoints: Vec<Waypoint>,
        options: RouteOptions,
    ) -> Result<Arc<ItinerarySnapshot>> {
        let settings = ItinerarySettings { strategy, options };
        let (guard, job) = self.begin(|_| (waypoints, settings))?;
        self.run(guard, job).await
    }

    /// Compute from the store's current contents with the selected settings
    pub async fn compute_current(&self) -> Result<Arc<ItinerarySnapshot>> {
        let (guard, job) = self.begin(|inner| (inner.store.snapshot(), inner.settings))?;
        self.run(guard, job).await
    }

    /// Claim the in-flight slot and move to `Computing`.
    ///
    /// Too few waypoints fails immediately with a committed `Failed`
    /// snapshot and no external calls.
    fn begin<F>(&self, inputs: F) -> Result<(InFlight<'_>, Job)>
    where
        F: FnOnce(&Inner) -> (Vec<Waypoint>, ItinerarySettings),
    {
        let mut inner = self.lock();
        if inner.in_flight {
            tracing::debug!("Rejecting compute: another is in flight");
            return Err(AppError::ComputeInProgress);
        }

        let (waypoints, settings) = inputs(&*inner);
        let store_revision = inner.store.revision();

        if waypoints.len() < MIN_WAYPOINTS {
            let error = AppError::InsufficientWaypoints {
                count: waypoints.len(),
            };
            let snapshot = ItinerarySnapshot::failed(
                waypoints,
                settings,
                &error,
                inner.previous_route(),
                store_revision,
            );
            inner.phase = Phase::Failed;
            inner.current = Some(Arc::new(snapshot));
            tracing::warn!("Compute refused: {}", error);
            return Err(error);
        }

        let previous_phase = inner.phase;
        inner.in_flight = true;
        inner.phase = Phase::Computing;

        tracing::info!(
            waypoints = waypoints.len(),
            strategy = %settings.strategy,
            round_trip = settings.options.round_trip,
            "Computing itinerary for {} waypoints with {}",
            waypoints.len(), settings.strategy
        );

        let guard = InFlight {
            state: &self.state,
            generation: inner.generation,
            previous_phase,
            committed: false,
        };
        Ok((
            guard,
            Job {
                waypoints,
                settings,
                store_revision,
            },
        ))
    }

    async fn run(&self, guard: InFlight<'_>, job: Job) -> Result<Arc<ItinerarySnapshot>> {
        let outcome = self.solve_and_resolve(&job).await;
        if let Err(ref e) = outcome {
            tracing::warn!(
                stage = ?e.stage(),
                kind = ?e.kind(),
                "Itinerary compute failed: {}",
                e
            );
        }

        let result = guard.commit(job, outcome);
        if let Ok(ref snapshot) = result {
            if let Some(ref route) = snapshot.route {
                tracing::info!(
                    snapshot = %snapshot.id,
                    legs = route.legs.len(),
                    "Itinerary ready: {:.2}km, {} min",
                    route.total_distance_km(),
                    route.total_duration_seconds() / 60
                );
            }
        }
        result
    }

    async fn solve_and_resolve(&self, job: &Job) -> Result<ResolvedRoute> {
        let strategy = job.settings.strategy;
        let waypoints = &job.waypoints;
        let options = &job.settings.options;

        let order = self
            .with_retries(Stage::Solving, self.config.solver_timeout, || {
                self.solver.solve(strategy, waypoints)
            })
            .await?;

        tracing::debug!(order = ?&*order, "Solver returned visiting order");

        self.with_retries(Stage::Routing, self.config.routing_timeout, || {
            self.resolver.resolve(waypoints, &order, options)
        })
        .await
    }

    /// Run one stage with a per-attempt timeout, retrying transient failures
    async fn with_retries<T, F, Fut>(&self, stage: Stage, limit: Duration, mut call: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0u32;
        loop {
            let outcome = match tokio::time::timeout(limit, call()).await {
                Ok(outcome) => outcome,
                Err(_) => Err(timeout_error(stage, limit)),
            };

            match outcome {
                Err(e) if e.is_transient() && attempt < self.config.max_retries => {
                    attempt += 1;
                    let delay = backoff_delay(self.config.retry_backoff, attempt);
                    tracing::warn!(
                        stage = %stage,
                        attempt = attempt,
                        max_retries = self.config.max_retries,
                        "Transient {} failure, retrying in {}ms: {}",
                        stage, delay.as_millis(), e
                    );
                    tokio::time::sleep(delay).await;
                }
                other => return other,
            }
        }
    }

    /// Clear the store and return to `Idle`, discarding any route.
    ///
    /// A compute still in flight keeps the slot until it finishes, but its
    /// result is not committed.
    pub fn reset(&self) {
        let mut inner = self.lock();
        inner.store.clear();
        inner.phase = Phase::Idle;
        inner.current = None;
        inner.generation += 1;
        tracing::info!(in_flight = inner.in_flight, "Itinerary reset");
    }

    pub fn append_waypoint(&self, waypoint: Waypoint) -> usize {
        let mut inner = self.lock();
        tracing::debug!(name = %waypoint.name, "Appending waypoint");
        inner.store.append(waypoint)
    }

    pub fn remove_waypoint(&self, index: usize) -> Result<Waypoint> {
        self.lock().store.remove_at(index)
    }

    pub fn clear_waypoints(&self) {
        self.lock().store.clear();
    }

    pub fn waypoints(&self) -> Vec<Waypoint> {
        self.lock().store.snapshot()
    }

    pub fn select_strategy(&self, strategy: SolverStrategy) {
        self.lock().settings.strategy = strategy;
    }

    pub fn set_options(&self, options: RouteOptions) {
        self.lock().settings.options = options;
    }

    pub fn update_settings(&self, settings: ItinerarySettings) {
        self.lock().settings = settings;
    }

    pub fn settings(&self) -> ItinerarySettings {
        self.lock().settings
    }

    pub fn phase(&self) -> Phase {
        self.lock().phase
    }

    /// True when the store changed after the current snapshot was taken
    pub fn is_stale(&self) -> bool {
        self.lock().is_stale()
    }

    pub fn snapshot(&self) -> Option<Arc<ItinerarySnapshot>> {
        self.lock().current.clone()
    }

    /// Phase, staleness, store and snapshot read under one lock
    pub fn view(&self) -> ItineraryView {
        let inner = self.lock();
        ItineraryView {
            phase: inner.phase,
            stale: inner.is_stale(),
            settings: inner.settings,
            waypoints: inner.store.snapshot(),
            snapshot: inner.current.clone(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        lock(&self.state)
    }
}

fn timeout_error(stage: Stage, limit: Duration) -> AppError {
    let message = format!("Timed out after {}ms", limit.as_millis());
    match stage {
        Stage::Solving => AppError::SolverUnavailable(message),
        Stage::Routing => AppError::RoutingUnavailable(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles() {
        let base = Duration::from_millis(100);
        assert_eq!(backoff_delay(base, 1), Duration::from_millis(100));
        assert_eq!(backoff_delay(base, 2), Duration::from_millis(200));
        assert_eq!(backoff_delay(base, 4), Duration::from_millis(800));
        // Saturates rather than overflowing
        assert!(backoff_delay(base, 200) > Duration::from_secs(400_000_000));
        assert_eq!(backoff_delay(Duration::MAX, 3), Duration::MAX);
    }

    #[test]
    fn test_timeout_maps_to_stage_unavailable() {
        let limit = Duration::from_millis(250);
        assert_eq!(
            timeout_error(Stage::Solving, limit),
            AppError::SolverUnavailable("Timed out after 250ms".to_string())
        );
        assert!(timeout_error(Stage::Routing, limit).is_transient());
        assert_eq!(timeout_error(Stage::Routing, limit).stage(), Some(Stage::Routing));
    }

    #[test]
    fn test_staleness_only_after_snapshot() {
        let mut inner = Inner {
            store: WaypointStore::new(),
            phase: Phase::Idle,
            settings: ItinerarySettings::default(),
            current: None,
            in_flight: false,
            generation: 0,
        };
        inner.store.append(Waypoint::new("A", 0.0, 0.0).unwrap());
        assert!(!inner.is_stale());

        let error = AppError::InsufficientWaypoints { count: 1 };
        inner.current = Some(Arc::new(ItinerarySnapshot::failed(
            inner.store.snapshot(),
            inner.settings,
            &error,
            None,
            inner.store.revision(),
        )));
        inner.phase = Phase::Failed;
        assert!(!inner.is_stale());

        inner.store.append(Waypoint::new("B", 0.0, 1.0).unwrap());
        assert!(inner.is_stale());

        // Computing is never reported stale
        inner.phase = Phase::Computing;
        assert!(!inner.is_stale());
    }
}
