//! `atelier-core`: shared primitives for the access-gating pipeline.
//!
//! This crate contains **pure** building blocks (no IO, no HTTP, no clocks).

pub mod error;
pub mod username;
pub mod value_object;

pub use error::{DomainError, DomainResult};
pub use username::Username;
pub use value_object::ValueObject;
