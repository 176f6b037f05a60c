//! `atelier-maintenance`: the global maintenance window.
//!
//! A single on/off switch backed by an append-mostly history of records.
//! The hot path (`MaintenanceState::is_enabled`) is an atomic load; toggles
//! go through a `MaintenanceRepository` and are serialized among themselves.

pub mod error;
pub mod record;
pub mod repository;
pub mod state;

pub use error::MaintenanceError;
pub use record::{MAX_MESSAGE_LEN, MaintenanceRecord, MaintenanceStatus, ToggleMaintenance};
pub use repository::{InMemoryMaintenanceRepository, MaintenanceRepository};
pub use state::MaintenanceState;
