pub mod listing_service;
pub mod payment_gateway;
pub mod rent_request_repository;

#[allow(unused_imports)]
pub use listing_service::ListingService;
#[allow(unused_imports)]
pub use payment_gateway::PaymentGateway;
#[allow(unused_imports)]
pub use rent_request_repository::RentRequestRepository;
