//! Infrastructure layer: persistence adapters and audit sinks.

pub mod audit;
pub mod maintenance_store;
