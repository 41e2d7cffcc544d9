//! Query layer.
//!
//! One module per aggregate. Functions are thin parameterised statements over a
//! `SqliteConnection`; transaction boundaries belong to the services.

pub(crate) mod helpers;
pub mod images;
pub mod maladies;
pub mod patients;
