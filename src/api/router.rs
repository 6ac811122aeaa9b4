use axum::{
    Router,
    routing::{get, post, put},
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::handlers::{
    AppState, cancel_rent_request, confirm_rent_request, create_rent_request, get_rent_request,
    list_owner_requests, list_renter_requests, pay_rent_request, payment_callback,
};

/// Creates the API router with all rent request endpoints
///
/// Command endpoints:
/// - POST /rent-request - Create a rent request (renter)
/// - PUT /rent-request/:id/confirm - Confirm (owner)
/// - PUT /rent-request/:id/pay - Start payment (renter)
/// - PUT /rent-request/:id/cancel - Cancel (renter)
/// - GET /rent-request/callback - Payment result from the payment service (no auth)
///
/// Query endpoints:
/// - GET /rent-request/:id - Rent request details (renter or owner)
/// - GET /rent-request/owner - Requests received as owner
/// - GET /rent-request/renter - Requests made as renter
pub fn create_router(state: Arc<AppState>) -> Router {
    let rent_requests = Router::new()
        .route("/", post(create_rent_request))
        .route("/callback", get(payment_callback))
        .route("/owner", get(list_owner_requests))
        .route("/renter", get(list_renter_requests))
        .route("/:id", get(get_rent_request))
        .route("/:id/confirm", put(confirm_rent_request))
        .route("/:id/pay", put(pay_rent_request))
        .route("/:id/cancel", put(cancel_rent_request));

    Router::new()
        // Health check endpoint
        .route("/health", get(health_check))
        .nest("/rent-request", rent_requests)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
