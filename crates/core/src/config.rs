//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. The intent is to avoid reading process-wide environment variables
//! during request handling, which can lead to inconsistent behaviour in multi-threaded runtimes
//! and test harnesses.

use crate::constants::{DEFAULT_DATABASE_URL, DEFAULT_MAX_IMAGE_BYTES};
use crate::{HopitalError, HopitalResult};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    database_url: String,
    max_image_bytes: usize,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns `HopitalError::InvalidInput` if the database URL is blank or the
    /// image size limit is zero.
    pub fn new(database_url: String, max_image_bytes: usize) -> HopitalResult<Self> {
        if database_url.trim().is_empty() {
            return Err(HopitalError::InvalidInput(
                "database_url cannot be empty".into(),
            ));
        }
        if max_image_bytes == 0 {
            return Err(HopitalError::InvalidInput(
                "max_image_bytes must be greater than zero".into(),
            ));
        }

        Ok(Self {
            database_url: database_url.trim().to_string(),
            max_image_bytes,
        })
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    pub fn max_image_bytes(&self) -> usize {
        self.max_image_bytes
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
        }
    }
}

/// Resolve the database URL from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns [`DEFAULT_DATABASE_URL`].
pub fn database_url_from_env_value(value: Option<String>) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string())
}

/// Parse the image size limit from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns [`DEFAULT_MAX_IMAGE_BYTES`].
pub fn max_image_bytes_from_env_value(value: Option<String>) -> HopitalResult<usize> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    match value {
        None => Ok(DEFAULT_MAX_IMAGE_BYTES),
        Some(v) => v.parse::<usize>().map_err(|_| {
            HopitalError::InvalidInput(format!(
                "HOPITAL_MAX_IMAGE_BYTES must be a positive integer, got {v:?}"
            ))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_blank_database_url() {
        let err = CoreConfig::new("   ".into(), 10).expect_err("blank url should fail");
        assert!(matches!(err, HopitalError::InvalidInput(_)));
    }

    #[test]
    fn new_rejects_zero_image_limit() {
        assert!(CoreConfig::new("sqlite::memory:".into(), 0).is_err());
    }

    #[test]
    fn database_url_falls_back_to_default() {
        assert_eq!(database_url_from_env_value(None), DEFAULT_DATABASE_URL);
        assert_eq!(database_url_from_env_value(Some(" ".into())), DEFAULT_DATABASE_URL);
        assert_eq!(
            database_url_from_env_value(Some("sqlite://data/h.db".into())),
            "sqlite://data/h.db"
        );
    }

    #[test]
    fn max_image_bytes_parses_or_defaults() {
        assert_eq!(
            max_image_bytes_from_env_value(None).unwrap(),
            DEFAULT_MAX_IMAGE_BYTES
        );
        assert_eq!(max_image_bytes_from_env_value(Some("2048".into())).unwrap(), 2048);
        assert!(max_image_bytes_from_env_value(Some("lots".into())).is_err());
    }
}
