use itinerary::config::Config;
use itinerary::models::{
    ResolvedRoute, RouteOptions, RouteSummary, SolverStrategy, Waypoint, WaypointOrder,
};
use itinerary::services::{
    DirectionsClient, ItineraryState, RoutingProvider, ShareLinkEncoder, Solver, SolverClient,
};
use std::env;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn print_help() {
    eprintln!(
        "\
Usage: plan [OPTIONS] <WAYPOINTS.json>

Reads a JSON array of {{\"name\", \"lat\", \"lng\"}} objects, computes one
itinerary and prints its summary and share link.

Options:
  --strategy=NAME       held-karp, nearest-neighbor or best-edge
                        (default: ITINERARY_DEFAULT_STRATEGY or held-karp)
  --avoid-highways      Ask the routing provider to avoid highways
  --round-trip          Return to the first stop at the end
  --waypoint-order=NAME preserve or optimize
                        (default: ITINERARY_WAYPOINT_ORDER or preserve)
  --optimize            Same as --waypoint-order=optimize
  --json                Output the snapshot as JSON
  --help                Show this help message"
    );
}

fn print_summary(route: &ResolvedRoute, summary: &RouteSummary, share_url: &str) {
    println!(
        "{} stops, {:.1} km, {}",
        summary.stops, summary.total_distance_km, summary.formatted_duration
    );
    println!("Visit order: {:?}", route.visit_order);
    println!();
    for step in &summary.steps {
        match (step.distance_meters, step.duration_seconds) {
            (Some(meters), Some(seconds)) => println!(
                "{:>3}. {}  ({:.1} km, {} min to next)",
                step.number,
                step.address,
                meters as f64 / 1000.0,
                (seconds + 30) / 60
            ),
            _ => println!("{:>3}. {}", step.number, step.address),
        }
    }
    println!();
    println!("{}", share_url);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing (less verbose for the CLI)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "itinerary=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Parse CLI args
    let args: Vec<String> = env::args().skip(1).collect();

    if args.iter().any(|a| a == "--help") {
        print_help();
        return Ok(());
    }

    let Some(path) = args.iter().find(|a| !a.starts_with("--")) else {
        print_help();
        std::process::exit(2);
    };
    let strategy_arg = args.iter().find_map(|a| a.strip_prefix("--strategy="));
    let order_arg = args.iter().find_map(|a| a.strip_prefix("--waypoint-order="));
    let json_output = args.iter().any(|a| a == "--json");

    let config = Config::from_env().map_err(|e| format!("Config error: {}", e))?;
    let strategy = match strategy_arg {
        Some(name) => name.parse::<SolverStrategy>()?,
        None => config.itinerary.default_strategy,
    };
    let waypoint_order = match order_arg {
        Some(name) => name.parse::<WaypointOrder>()?,
        None if args.iter().any(|a| a == "--optimize") => WaypointOrder::Optimize,
        None => config.itinerary.waypoint_order,
    };
    let options = RouteOptions {
        avoid_highways: args.iter().any(|a| a == "--avoid-highways")
            || config.itinerary.avoid_highways,
        round_trip: args.iter().any(|a| a == "--round-trip"),
        waypoint_order,
    };

    let raw = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path, e))?;
    let parsed: Vec<Waypoint> = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse {}: {}", path, e))?;
    // Run each entry through validation
    let waypoints = parsed
        .into_iter()
        .map(|w| Waypoint::new(w.name, w.lat, w.lng))
        .collect::<Result<Vec<_>, String>>()?;

    // Initialize services
    let solver: Arc<dyn Solver> = Arc::new(SolverClient::with_timeout(
        config.solver_base_url.clone(),
        config.itinerary.solver_timeout,
    ));
    let directions: Arc<dyn RoutingProvider> = Arc::new(DirectionsClient::from_config(&config));
    let state = ItineraryState::new(solver, directions, config.itinerary.clone());
    let share_links = ShareLinkEncoder::new(config.share_maps_host.clone());

    eprintln!(
        "Planning {} waypoints with {}...",
        waypoints.len(),
        strategy
    );

    let snapshot = match state.compute(strategy, waypoints, options).await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            eprintln!("Failed: {}", e);
            std::process::exit(1);
        }
    };

    let Some(route) = snapshot.route.as_ref() else {
        eprintln!("Failed: computed itinerary has no route");
        std::process::exit(1);
    };
    let summary = route.summary();
    let share_url = share_links.encode(route)?;

    if json_output {
        let output = serde_json::json!({
            "snapshot": snapshot,
            "summary": summary,
            "share_url": share_url,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_summary(route, &summary, &share_url);
    }

    Ok(())
}
