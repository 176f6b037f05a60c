//! Durable maintenance record storage.
//!
//! The in-memory repository lives next to the domain in
//! `atelier-maintenance`; this module holds the database-backed adapter.

#[cfg(feature = "postgres")]
pub mod postgres;

#[cfg(feature = "postgres")]
pub use postgres::{MAINTENANCE_SCHEMA, PostgresMaintenanceRepository};
