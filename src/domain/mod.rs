pub mod commands;
pub mod errors;
pub mod rent_request;
pub mod value_objects;

pub use errors::*;
pub use rent_request::{NewRentRequest, PaymentSettlement, Rejection, RentRequest};
pub use value_objects::*;
