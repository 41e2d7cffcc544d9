//! # API Shared
//!
//! Shared definitions for the hospital record APIs.
//!
//! Contains:
//! - Transfer objects (`dto` module) used as the JSON contract
//! - Shared services like `HealthService`
//!
//! Used by `hopital-core` for mapping and by `api-rest` for request/response bodies.

pub mod dto;
pub mod health;

pub use dto::*;
pub use health::{HealthRes, HealthService};
