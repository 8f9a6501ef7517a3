pub mod advance_repository;
pub mod connection;
pub mod trip_repository;
pub mod vehicle_repository;
pub mod village_repository;

pub use connection::SqliteConnection;
