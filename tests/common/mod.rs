use async_trait::async_trait;
use itinerary::config::ItineraryConfig;
use itinerary::error::{AppError, Result};
use itinerary::models::{
    Coordinates, RouteLeg, SolverStrategy, VisitOrder, Waypoint, WaypointOrder,
};
use itinerary::services::{
    DirectionsRequest, DirectionsResponse, DirectionsRoute, Geocoder, ItineraryState,
    RoutingProvider, Solver,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

/// Fast timeouts and retries so failure paths finish quickly
#[allow(dead_code)]
pub fn test_config() -> ItineraryConfig {
    ItineraryConfig {
        default_strategy: SolverStrategy::ExactHeldKarp,
        avoid_highways: false,
        waypoint_order: WaypointOrder::Preserve,
        solver_timeout: Duration::from_secs(2),
        routing_timeout: Duration::from_secs(2),
        max_retries: 2,
        retry_backoff: Duration::from_millis(1),
    }
}

#[allow(dead_code)]
pub fn waypoint(name: &str, lat: f64, lng: f64) -> Waypoint {
    Waypoint::new(name, lat, lng).unwrap()
}

/// A(0,0), B(0,1), C(1,1)
#[allow(dead_code)]
pub fn abc() -> Vec<Waypoint> {
    vec![
        waypoint("A", 0.0, 0.0),
        waypoint("B", 0.0, 1.0),
        waypoint("C", 1.0, 1.0),
    ]
}

#[allow(dead_code)]
pub fn create_state(
    solver: Arc<MockSolver>,
    provider: Arc<MockRoutingProvider>,
    config: ItineraryConfig,
) -> Arc<ItineraryState> {
    Arc::new(ItineraryState::new(solver, provider, config))
}

/// Serve `router` on an ephemeral local port and return its base URL
#[allow(dead_code)]
pub async fn spawn_stub(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Scripted solver. Queued outcomes are used first, then the fallback.
///
/// Paths go through the same validation as the real client, so a scripted
/// path can be malformed on purpose.
pub struct MockSolver {
    calls: AtomicUsize,
    strategies: Mutex<Vec<SolverStrategy>>,
    queued: Mutex<VecDeque<Result<Vec<i64>>>>,
    fallback: Mutex<Option<Vec<i64>>>,
    gate: Option<Arc<Notify>>,
    entered: Arc<Notify>,
    delay: Option<Duration>,
}

#[allow(dead_code)]
impl MockSolver {
    /// Answers the identity order for whatever it is given
    pub fn identity() -> Self {
        MockSolver {
            calls: AtomicUsize::new(0),
            strategies: Mutex::new(Vec::new()),
            queued: Mutex::new(VecDeque::new()),
            fallback: Mutex::new(None),
            gate: None,
            entered: Arc::new(Notify::new()),
            delay: None,
        }
    }

    pub fn with_path(path: Vec<i64>) -> Self {
        let solver = Self::identity();
        *solver.fallback.lock().unwrap() = Some(path);
        solver
    }

    /// Outcomes returned, in order, before falling back
    pub fn then(self, outcome: Result<Vec<i64>>) -> Self {
        self.queued.lock().unwrap().push_back(outcome);
        self
    }

    /// Every call waits on `gate` before answering
    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn strategies(&self) -> Vec<SolverStrategy> {
        self.strategies.lock().unwrap().clone()
    }

    /// Resolves once a call has entered `solve`
    pub async fn wait_entered(&self) {
        self.entered.notified().await;
    }
}

#[async_trait]
impl Solver for MockSolver {
    async fn solve(&self, strategy: SolverStrategy, waypoints: &[Waypoint]) -> Result<VisitOrder> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.strategies.lock().unwrap().push(strategy);
        self.entered.notify_one();

        if let Some(ref gate) = self.gate {
            gate.notified().await;
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let queued = self.queued.lock().unwrap().pop_front();
        let path = match queued {
            Some(outcome) => outcome?,
            None => match self.fallback.lock().unwrap().clone() {
                Some(path) => path,
                None => (0..waypoints.len() as i64).collect(),
            },
        };
        VisitOrder::from_path(&path, waypoints.len())
    }
}

/// Routing provider that chains straight legs through the requested points.
pub struct MockRoutingProvider {
    requests: Mutex<Vec<DirectionsRequest>>,
    queued: Mutex<VecDeque<Result<DirectionsResponse>>>,
    reverse_stopovers: bool,
}

#[allow(dead_code)]
impl MockRoutingProvider {
    pub fn new() -> Self {
        MockRoutingProvider {
            requests: Mutex::new(Vec::new()),
            queued: Mutex::new(VecDeque::new()),
            reverse_stopovers: false,
        }
    }

    /// Report stopovers as visited in reverse, as an optimising provider might
    pub fn reversing() -> Self {
        MockRoutingProvider {
            reverse_stopovers: true,
            ..Self::new()
        }
    }

    /// Fail the next unanswered request with `error`
    pub fn fail_next(&self, error: AppError) {
        self.queued.lock().unwrap().push_back(Err(error));
    }

    /// Answer the next unanswered request with `response` verbatim
    pub fn respond_next(&self, response: DirectionsResponse) {
        self.queued.lock().unwrap().push_back(Ok(response));
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<DirectionsRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl RoutingProvider for MockRoutingProvider {
    async fn directions(&self, request: &DirectionsRequest) -> Result<DirectionsResponse> {
        self.requests.lock().unwrap().push(request.clone());

        if let Some(outcome) = self.queued.lock().unwrap().pop_front() {
            return outcome;
        }

        let mut order: Vec<usize> = (0..request.stopovers.len()).collect();
        if self.reverse_stopovers {
            order.reverse();
        }
        let mut points = vec![request.origin];
        points.extend(order.iter().map(|&i| request.stopovers[i]));
        points.push(request.destination);

        Ok(DirectionsResponse {
            routes: vec![DirectionsRoute {
                legs: chain_legs(&points),
                waypoint_order: if self.reverse_stopovers { order } else { Vec::new() },
            }],
        })
    }
}

/// Legs of 1 km and 2 minutes each between consecutive points
#[allow(dead_code)]
pub fn chain_legs(points: &[Coordinates]) -> Vec<RouteLeg> {
    points
        .windows(2)
        .map(|pair| RouteLeg {
            start_address: format!("near {}", pair[0]),
            end_address: format!("near {}", pair[1]),
            start: pair[0],
            end: pair[1],
            distance_meters: 1000,
            duration_seconds: 120,
        })
        .collect()
}

pub struct MockGeocoder {
    result: Result<Option<String>>,
    calls: AtomicUsize,
}

#[allow(dead_code)]
impl MockGeocoder {
    pub fn new(result: Result<Option<String>>) -> Self {
        MockGeocoder {
            result,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Geocoder for MockGeocoder {
    async fn reverse_geocode(&self, _at: Coordinates) -> Result<Option<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }
}
