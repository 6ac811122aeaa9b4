pub mod rent_request;
