use crate::types::AccountManagerId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid month '{value}': expected YYYY-MM or YYYY-MM-DD")]
    InvalidMonth { value: String },

    #[error("Account manager {id} not found")]
    AccountManagerNotFound { id: AccountManagerId },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type DashResult<T> = Result<T, DashError>;

/// Why a data request was refused.
#[derive(Error, Debug)]
pub enum AccessError {
    #[error("Unauthorized")]
    Unauthenticated,

    #[error("Your account is not linked to an Account Manager")]
    NotLinked,

    #[error("Account Manager {id} not found or inactive")]
    EntityNotFound { id: AccountManagerId },

    #[error("Invalid role '{role}'")]
    Forbidden { role: String },

    #[error("This view is restricted to management")]
    ManagementOnly,

    #[error("Internal server error")]
    Internal(#[from] DashError),
}

impl AccessError {
    /// HTTP-equivalent status for the presentation layer.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Unauthenticated => 401,
            Self::NotLinked => 403,
            Self::EntityNotFound { .. } => 404,
            Self::Forbidden { .. } => 403,
            Self::ManagementOnly => 403,
            Self::Internal(_) => 500,
        }
    }
}

#[derive(Error, Debug)]
pub enum SignInError {
    #[error("Sign in failed: no email provided by identity profile")]
    MissingEmail,

    #[error("Sign in error: {0}")]
    Internal(#[from] DashError),
}
