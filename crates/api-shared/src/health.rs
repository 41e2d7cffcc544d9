use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Liveness payload returned by `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Simple health service used by the REST API and the CLI.
///
/// This service provides a standardised way to check the health status of the
/// hospital record system.
#[derive(Clone, Default)]
pub struct HealthService;

impl HealthService {
    /// Static method to check health without creating an instance
    ///
    /// # Returns
    /// A `HealthRes` indicating the service is healthy.
    pub fn check_health() -> HealthRes {
        HealthRes {
            ok: true,
            message: "Hopital is alive".into(),
        }
    }

    /// Health response that also reflects whether the database answered.
    pub fn with_database(database_ok: bool) -> HealthRes {
        if database_ok {
            Self::check_health()
        } else {
            HealthRes {
                ok: false,
                message: "Hopital database is unreachable".into(),
            }
        }
    }
}
