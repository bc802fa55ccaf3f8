use axum::Router;
use itinerary::config::Config;
use itinerary::services::{
    DirectionsClient, Geocoder, GeocodingClient, ItineraryState, RoutingProvider,
    ShareLinkEncoder, Solver, SolverClient,
};
use itinerary::AppState;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "itinerary=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().map_err(|e| format!("Failed to load configuration: {}", e))?;

    tracing::info!("Starting itinerary API server");
    tracing::info!(
        solver = %config.solver_base_url,
        strategy = %config.itinerary.default_strategy,
        "Configuration loaded successfully"
    );

    // Initialize external clients
    let solver: Arc<dyn Solver> = Arc::new(SolverClient::with_timeout(
        config.solver_base_url.clone(),
        config.itinerary.solver_timeout,
    ));
    let directions: Arc<dyn RoutingProvider> = Arc::new(DirectionsClient::from_config(&config));
    let geocoder: Arc<dyn Geocoder> = Arc::new(GeocodingClient::from_config(&config));

    // Create application state
    let state = Arc::new(AppState {
        itinerary: Arc::new(ItineraryState::new(
            solver,
            directions,
            config.itinerary.clone(),
        )),
        geocoder,
        share_links: ShareLinkEncoder::new(config.share_maps_host.clone()),
    });

    // Build router with CORS and tracing
    let app = Router::new()
        .nest("/api/v1", itinerary::routes::create_router(state))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = config.server_address();
    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
