use rent_request_service::{
    adapters::{
        http::{HttpListingService, HttpPaymentGateway, build_client},
        postgres::PostgresRentRequestRepository,
    },
    api::{JwtVerifier, handlers::AppState, router::create_router},
    application::rent_request::ServiceDependencies,
    config::AppConfig,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "rent_request_service=debug,tower_http=debug,axum=trace".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env().expect("Invalid configuration");

    tracing::info!(
        listing_service = %config.listing_service_url,
        payment_service = %config.payment_service_url,
        "Configuration loaded"
    );

    // Initialize database connection pool
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
        .expect("Failed to connect to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    // Initialize adapters
    let http_client = build_client(config.upstream_timeout).expect("Failed to build HTTP client");
    let repository = Arc::new(PostgresRentRequestRepository::new(pool));
    let listing_service = Arc::new(HttpListingService::new(
        http_client.clone(),
        config.listing_service_url.clone(),
    ));
    let payment_gateway = Arc::new(HttpPaymentGateway::new(
        http_client,
        config.payment_service_url.clone(),
    ));

    // Create service dependencies
    let service_deps = ServiceDependencies {
        repository,
        listing_service,
        payment_gateway,
        callback_base_url: config.public_base_url.clone(),
    };

    // Create application state
    let app_state = Arc::new(AppState {
        service_deps,
        jwt: JwtVerifier::new(&config.jwt_secret),
    });

    // Create router
    let app = create_router(app_state);

    // Server configuration
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", addr);

    // Start server
    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}
