//! # Hopital Core
//!
//! Core business logic for the hospital records backend.
//!
//! This crate contains pure data operations over the SQLite schema:
//! - Patients, maladies and images with their element collections
//! - The patient/maladie association, stored once in a join table
//! - Search queries and aggregate statistics
//!
//! **No API concerns**: HTTP routing, status codes and request parsing belong in `api-rest`.

pub mod config;
pub mod constants;
pub mod db;
pub mod dossier;
pub mod entities;
pub mod error;
pub mod mapping;
pub mod patch;
pub mod repositories;
pub mod services;
pub mod validation;

pub use config::CoreConfig;
pub use db::Database;
pub use entities::{Image, ImageUpload};
pub use error::{HopitalError, HopitalResult};
pub use services::{ImageService, MaladieService, PatientService};
