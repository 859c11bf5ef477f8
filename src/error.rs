use thiserror::Error;

/// Failures surfaced by the project store and its backends.
///
/// `refresh` never returns one of these; it logs and degrades to the
/// seed list instead. Every other operation hands them back unchanged.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Authentication required: {0}")]
    Auth(String),

    #[error("Permission denied: {0}")]
    Permission(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Project not found: {0}")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Local storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("Local storage migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Unexpected backend error: {0}")]
    Unknown(String),
}

impl StoreError {
    /// Short machine-readable class, used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Auth(_) => "auth",
            Self::Permission(_) => "permission",
            Self::Network(_) => "network",
            Self::NotFound(_) => "not_found",
            Self::Validation(_) => "validation",
            Self::Storage(_) | Self::Migration(_) => "storage",
            Self::Unknown(_) => "unknown",
        }
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        match err.status().map(|s| s.as_u16()) {
            Some(401 | 403) => Self::Permission(err.to_string()),
            Some(404) => Self::NotFound(err.to_string()),
            Some(_) => Self::Unknown(err.to_string()),
            None if err.is_decode() => Self::Unknown(err.to_string()),
            None => Self::Network(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Unknown(format!("malformed document: {err}"))
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
