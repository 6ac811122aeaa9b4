pub mod listing_service;
pub mod payment_gateway;
pub mod rent_request_repository;

pub use listing_service::{ListingDetails, ListingService, ListingServiceError};
pub use payment_gateway::{PaymentGateway, PaymentSessionRequest};
pub use rent_request_repository::{
    PageRequest, RentRequestFilter, RentRequestRepository, StatusTransition,
};
