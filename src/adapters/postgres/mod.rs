pub mod rent_request_repository;

// パブリックに型を再エクスポート
pub use rent_request_repository::RentRequestRepository as PostgresRentRequestRepository;
