//! Service layer.
//!
//! Services own a [`Database`](crate::Database) handle and turn requests into
//! repository calls. Every write that touches more than one table runs inside
//! a single transaction; reads performed after the write reuse that
//! transaction so the returned DTO reflects what was committed.

mod image;
mod maladie;
mod patient;

pub use image::ImageService;
pub use maladie::MaladieService;
pub use patient::PatientService;

use sqlx::SqliteConnection;
use std::collections::BTreeSet;

use crate::repositories::maladies;
use crate::{HopitalError, HopitalResult};

/// Fails with [`HopitalError::MissingMaladies`] unless every id exists.
pub(crate) async fn ensure_maladies_exist(
    conn: &mut SqliteConnection,
    ids: &BTreeSet<i64>,
) -> HopitalResult<()> {
    let found = maladies::existing_ids(conn, ids).await?;
    let missing: Vec<i64> = ids.difference(&found).copied().collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(HopitalError::MissingMaladies(missing))
    }
}
