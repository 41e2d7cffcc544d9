//! Constants used throughout the hospital core crate.
//!
//! Column limits mirror the `CHECK` constraints in `migrations/` so that
//! validation errors are reported before a statement reaches the database.

/// Database used when no explicit URL is configured.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://hopital.db";

/// Largest accepted image upload when no explicit limit is configured (10 MiB).
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// Content type stored when an upload does not declare one.
pub const DEFAULT_IMAGE_CONTENT_TYPE: &str = "application/octet-stream";

/// Maximum length of `maladies.nom`.
pub const MALADIE_NOM_MAX_LEN: usize = 100;

/// Maximum length of `maladies.type`.
pub const MALADIE_TYPE_MAX_LEN: usize = 50;

/// Maximum length of `patients.groupe_sanguin` (fits `AB+`).
pub const GROUPE_SANGUIN_MAX_LEN: usize = 3;

/// Maximum length of patient names and free-text contact fields.
pub const PERSON_TEXT_MAX_LEN: usize = 255;

/// Maximum length of a single symptom or treatment entry.
pub const COLLECTION_ITEM_MAX_LEN: usize = 255;
