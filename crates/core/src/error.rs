use hopital_types::TextError;

#[derive(Debug, thiserror::Error)]
pub enum HopitalError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid {field}: {source}")]
    InvalidField {
        field: &'static str,
        #[source]
        source: TextError,
    },
    #[error("some maladie IDs do not exist: {0:?}")]
    MissingMaladies(Vec<i64>),
    #[error("{entity} not found with ID: {id}")]
    NotFound { entity: &'static str, id: i64 },
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("stored data is invalid: {0}")]
    InvalidData(String),

    #[error("database error: {0}")]
    Database(sqlx::Error),
    #[error("failed to run database migrations: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("failed to create database directory: {0}")]
    StorageDirCreation(std::io::Error),
}

impl HopitalError {
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound { entity, id }
    }

    /// Wraps a text validation failure with the name of the offending field.
    pub fn field(field: &'static str) -> impl FnOnce(TextError) -> Self {
        move |source| Self::InvalidField { field, source }
    }
}

impl From<sqlx::Error> for HopitalError {
    fn from(err: sqlx::Error) -> Self {
        // Unique indexes (email, telephone, image name) surface as conflicts.
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return Self::Conflict(db_err.message().to_string());
            }
        }
        Self::Database(err)
    }
}

pub type HopitalResult<T> = std::result::Result<T, HopitalError>;
