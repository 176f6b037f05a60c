//! HTTP API: request gate, authorization table, routing and bootstrap.

pub mod allowlist;
pub mod app;
pub mod authz;
pub mod config;
pub mod context;
pub mod gate;
pub mod middleware;
pub mod pattern;
