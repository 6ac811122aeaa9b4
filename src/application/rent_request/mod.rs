mod errors;
mod queries;
mod rent_request_service;

pub use errors::{RentRequestApplicationError, Result};
pub use queries::{
    ListRentRequestsQuery, PAGE_SIZE, build_list_criteria, list_owner_rent_requests,
    list_renter_rent_requests, parse_date_range, parse_page, parse_status_filter,
};
pub use rent_request_service::{
    PaymentCallbackOutcome, ServiceDependencies, cancel_rent_request, confirm_rent_request,
    create_rent_request, get_rent_request, handle_payment_callback, pay_rent_request,
};
