pub mod availability;
pub mod bookings;
pub mod circuit_breaker;
pub mod client_directory;
pub mod lifecycle;
pub mod update_builder;
