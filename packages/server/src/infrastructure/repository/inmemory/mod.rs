//! インメモリ Repository 実装

pub mod driver;
pub mod ride_request;

pub use driver::InMemoryDriverRepository;
pub use ride_request::InMemoryRideRequestRepository;
